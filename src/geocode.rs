use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::{Result, RouteError};
use crate::point::{GeoPoint, Stop};

/// Shortest query worth sending to the address search.
pub const MIN_SUGGEST_CHARS: usize = 3;
pub const SUGGEST_LIMIT: usize = 5;

// Spacing between fallback coordinates so unresolved stops don't stack on one marker
const FALLBACK_STEP_DEG: f64 = 0.01;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Place {
    pub title: String,
    pub point: GeoPoint,
}

pub trait Geocoder {
    fn search(&self, query: &str, limit: usize) -> impl Future<Output = Result<Vec<Place>>> + Send;
}

/// First hit for `query`.
pub async fn geocode<G: Geocoder + Sync>(geocoder: &G, query: &str) -> Result<GeoPoint> {
    let places = geocoder.search(query, 1).await?;
    places
        .into_iter()
        .next()
        .map(|place| place.point)
        .ok_or_else(|| RouteError::NoResult(query.to_string()))
}

/// Autocomplete suggestions. Failures are logged and yield no suggestions.
pub async fn suggest<G: Geocoder + Sync>(geocoder: &G, query: &str) -> Vec<Place> {
    let query = query.trim();
    if query.chars().count() < MIN_SUGGEST_CHARS {
        return Vec::new();
    }

    match geocoder.search(query, SUGGEST_LIMIT).await {
        Ok(places) => places,
        Err(e) => {
            tracing::warn!("Address suggestions for {:?} failed: {}", query, e);
            Vec::new()
        }
    }
}

#[derive(Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl NominatimGeocoder {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.nominatim_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Place>> {
        tracing::debug!("Querying Nominatim for {:?}", query);

        let limit = limit.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("q", query), ("format", "json"), ("limit", limit.as_str()), ("addressdetails", "1")])
            .send()
            .await
            .map_err(|e| if e.is_timeout() { RouteError::Timeout(self.timeout) } else { RouteError::Http(e) })?;

        if !response.status().is_success() {
            return Err(RouteError::Status { service: "nominatim", status: response.status().as_u16() });
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        places
            .into_iter()
            .map(|place| -> Result<Place> {
                let latitude = place.lat.parse::<f64>().map_err(|e| RouteError::Decode(format!("lat {:?}: {}", place.lat, e)))?;
                let longitude = place.lon.parse::<f64>().map_err(|e| RouteError::Decode(format!("lon {:?}: {}", place.lon, e)))?;
                Ok(Place {
                    point: GeoPoint::labeled(latitude, longitude, &place.display_name),
                    title: place.display_name,
                })
            })
            .collect()
    }
}

/// Memoizes successful lookups; errors are never cached.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: DashMap<(String, usize), Vec<Place>>,
}

impl<G> CachedGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self { inner, cache: DashMap::new() }
    }

    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }
}

impl<G: Geocoder + Sync> Geocoder for CachedGeocoder<G> {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Place>> {
        let key = (query.trim().to_lowercase(), limit);
        let cached = self.cache.get(&key).map(|hit| hit.value().clone());
        if let Some(places) = cached {
            return Ok(places);
        }

        let places = self.inner.search(query, limit).await?;
        self.cache.insert(key, places.clone());
        Ok(places)
    }
}

/// A stop still described by its address.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AddressTask {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStop {
    pub stop: Stop,
    pub geocoded: bool,
}

pub fn fallback_point(base: &GeoPoint, index: usize) -> GeoPoint {
    let offset = index as f64 * FALLBACK_STEP_DEG;
    GeoPoint::new(base.latitude + offset, base.longitude + offset)
}

/// Geocodes every task concurrently, each bounded by `timeout`.
///
/// A task that fails or times out is placed at `fallback_point(base, index)`
/// so the route can still be planned. Output order matches `tasks`.
pub async fn resolve_stops<G>(geocoder: Arc<G>, tasks: &[AddressTask], base: &GeoPoint, timeout: Duration) -> Vec<ResolvedStop>
where
    G: Geocoder + Send + Sync + 'static,
{
    let mut lookups = JoinSet::new();
    for (index, task) in tasks.iter().enumerate() {
        let geocoder = geocoder.clone();
        let address = task.address.clone();
        lookups.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, geocode(geocoder.as_ref(), &address)).await {
                Ok(result) => result,
                Err(_) => Err(RouteError::Timeout(timeout)),
            };
            (index, outcome)
        });
    }

    let mut points: Vec<Option<GeoPoint>> = vec![None; tasks.len()];
    while let Some(joined) = lookups.join_next().await {
        match joined {
            Ok((index, Ok(point))) => points[index] = Some(point),
            Ok((index, Err(e))) => {
                tracing::warn!("Geocoding {:?} failed, using fallback coordinate: {}", tasks[index].address, e);
            }
            Err(e) => tracing::warn!("Geocoding task aborted: {}", e),
        }
    }

    tasks
        .iter()
        .zip(points)
        .enumerate()
        .map(|(index, (task, point))| {
            let geocoded = point.is_some();
            let mut point = point.unwrap_or_else(|| fallback_point(base, index));
            point.label = task.address.clone();
            ResolvedStop { stop: Stop { point, source_id: task.source_id.clone() }, geocoded }
        })
        .collect()
}
