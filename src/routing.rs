use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::distance::distance;
use crate::error::{Result, RouteError};
use crate::planner::plan_route;
use crate::point::{GeoPoint, Stop};
use crate::solution::RouteResult;

/// Route geometry as decoded `(latitude, longitude)` pairs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    pub fn straight(from: &GeoPoint, to: &GeoPoint) -> Self {
        Self { points: vec![from.lat_lng(), to.lat_lng()] }
    }

    /// GeoJSON stores positions as `[longitude, latitude]`.
    pub fn from_geojson(coordinates: &[[f64; 2]]) -> Self {
        Self { points: coordinates.iter().map(|&[lng, lat]| (lat, lng)).collect() }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    // Consecutive segments share their joint; keep it once
    pub fn extend_joined(&mut self, other: &Polyline) {
        let skip = match (self.points.last(), other.points.first()) {
            (Some(last), Some(first)) if last == first => 1,
            _ => 0,
        };
        self.points.extend(other.points.iter().skip(skip));
    }
}

pub trait RoadRouter {
    fn route(&self, from: &GeoPoint, to: &GeoPoint) -> impl Future<Output = Result<Polyline>> + Send;
}

/// Visiting order suggested by a trip service, plus its geometry if any.
#[derive(Debug, Clone, PartialEq)]
pub struct TripPlan {
    pub order: Vec<usize>,
    pub geometry: Option<Polyline>,
}

pub trait TripService {
    fn trip_order(&self, origin: &GeoPoint, stops: &[Stop]) -> impl Future<Output = Result<TripPlan>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentSource {
    Road,
    Straight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub polyline: Polyline,
    pub source: SegmentSource,
}

/// Fetches road geometry for each consecutive pair of `path` concurrently.
///
/// Every segment is bounded by `timeout` on its own; a failed or slow
/// segment becomes a straight line between its endpoints.
pub async fn route_geometry<R>(router: Arc<R>, path: &[GeoPoint], timeout: Duration) -> Vec<Segment>
where
    R: RoadRouter + Send + Sync + 'static,
{
    let pairs: Vec<(GeoPoint, GeoPoint)> = path.windows(2).map(|pair| (pair[0].clone(), pair[1].clone())).collect();

    let mut requests = JoinSet::new();
    for (index, (from, to)) in pairs.iter().cloned().enumerate() {
        let router = router.clone();
        requests.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, router.route(&from, &to)).await {
                Ok(result) => result,
                Err(_) => Err(RouteError::Timeout(timeout)),
            };
            (index, outcome)
        });
    }

    let mut roads: Vec<Option<Polyline>> = vec![None; pairs.len()];
    while let Some(joined) = requests.join_next().await {
        match joined {
            Ok((index, Ok(polyline))) if polyline.len() >= 2 => roads[index] = Some(polyline),
            Ok((index, Ok(_))) => tracing::warn!("Segment {} came back without geometry, drawing straight line", index),
            Ok((index, Err(e))) => tracing::warn!("Road route for segment {} failed, drawing straight line: {}", index, e),
            Err(e) => tracing::warn!("Road route task aborted: {}", e),
        }
    }

    pairs
        .iter()
        .zip(roads)
        .map(|((from, to), road)| match road {
            Some(polyline) => Segment { polyline, source: SegmentSource::Road },
            None => Segment { polyline: Polyline::straight(from, to), source: SegmentSource::Straight },
        })
        .collect()
}

/// Joins segments into one drawable line.
pub fn join_segments(segments: &[Segment]) -> Polyline {
    let mut line = Polyline::default();
    for segment in segments {
        line.extend_joined(&segment.polyline);
    }
    line
}

fn is_full_order(order: &[usize], n: usize) -> bool {
    let mut seen = vec![false; n];
    order.len() == n && order.iter().all(|&i| i < n && !std::mem::replace(&mut seen[i], true))
}

/// Orders stops with the trip service when it answers with a complete
/// order, and with the nearest-neighbor planner otherwise.
///
/// The distance is always the great-circle total of the chosen order so
/// results from both paths compare.
pub async fn order_with_fallback<T>(service: &T, origin: &GeoPoint, stops: &[Stop]) -> (RouteResult, Option<Polyline>)
where
    T: TripService + Sync,
{
    if !stops.is_empty() {
        match service.trip_order(origin, stops).await {
            Ok(trip) if is_full_order(&trip.order, stops.len()) => {
                let mut result = RouteResult::new();
                let mut current = origin;
                for &index in &trip.order {
                    result.total_distance_km += distance(current, &stops[index].point);
                    current = &stops[index].point;
                }
                result.visit_order = trip.order;
                tracing::info!("Trip service ordered {} stops", stops.len());
                return (result, trip.geometry);
            }
            Ok(trip) => tracing::warn!("Trip service returned an incomplete order {:?}, using nearest neighbor", trip.order),
            Err(e) => tracing::warn!("Trip service failed, using nearest neighbor: {}", e),
        }
    }

    let points: Vec<GeoPoint> = stops.iter().map(|s| s.point.clone()).collect();
    (plan_route(origin, &points), None)
}

/// Drawable segments for a trip service's own geometry. The service plans
/// an open trip, so a closed route gets a straight leg back to `origin`.
pub fn trip_segments(geometry: Polyline, origin: &GeoPoint, closed: bool) -> Vec<Segment> {
    let closing = match geometry.points().last() {
        Some(&last) if closed && last != origin.lat_lng() => Some(Polyline::new(vec![last, origin.lat_lng()])),
        _ => None,
    };

    let mut segments = vec![Segment { polyline: geometry, source: SegmentSource::Road }];
    segments.extend(closing.map(|polyline| Segment { polyline, source: SegmentSource::Straight }));
    segments
}

#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmWaypoint {
    waypoint_index: Option<usize>,
}

#[derive(Deserialize)]
struct OsrmTripResponse {
    code: String,
    #[serde(default)]
    waypoints: Vec<OsrmWaypoint>,
    #[serde(default)]
    trips: Vec<OsrmRoute>,
}

pub struct OsrmRouter {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl OsrmRouter {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            base_url: config.osrm_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T> {
        tracing::debug!("Querying OSRM: {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| if e.is_timeout() { RouteError::Timeout(self.timeout) } else { RouteError::Http(e) })?;

        if !response.status().is_success() {
            return Err(RouteError::Status { service: "osrm", status: response.status().as_u16() });
        }

        Ok(response.json().await?)
    }
}

// OSRM wants `lng,lat` pairs joined by `;`
fn coordinate_list<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> String {
    points
        .into_iter()
        .map(|p| format!("{},{}", p.longitude, p.latitude))
        .collect::<Vec<_>>()
        .join(";")
}

/// Waypoints come back in input order; `waypoint_index` is each one's
/// position along the trip. Index 0 is the origin.
fn trip_order_from_waypoints(waypoints: &[OsrmWaypoint], stop_count: usize) -> Vec<usize> {
    let mut positioned: Vec<(usize, usize)> = waypoints
        .iter()
        .enumerate()
        .filter_map(|(input, wp)| wp.waypoint_index.map(|position| (position, input)))
        .collect();
    positioned.sort_unstable();

    positioned
        .into_iter()
        .filter(|&(_, input)| input >= 1 && input <= stop_count)
        .map(|(_, input)| input - 1)
        .collect()
}

impl RoadRouter for OsrmRouter {
    async fn route(&self, from: &GeoPoint, to: &GeoPoint) -> Result<Polyline> {
        let url = format!(
            "{}/route/v1/driving/{}?overview=full&geometries=geojson",
            self.base_url,
            coordinate_list([from, to])
        );
        let response: OsrmRouteResponse = self.get_json(url).await?;
        if response.code != "Ok" {
            return Err(RouteError::Decode(format!("OSRM route code {}", response.code)));
        }

        response
            .routes
            .first()
            .map(|route| Polyline::from_geojson(&route.geometry.coordinates))
            .ok_or_else(|| RouteError::NoResult(format!("route {:?} -> {:?}", from.lat_lng(), to.lat_lng())))
    }
}

impl TripService for OsrmRouter {
    async fn trip_order(&self, origin: &GeoPoint, stops: &[Stop]) -> Result<TripPlan> {
        let url = format!(
            "{}/trip/v1/driving/{}?source=first&destination=last&roundtrip=false&overview=full&geometries=geojson",
            self.base_url,
            coordinate_list(std::iter::once(origin).chain(stops.iter().map(|s| &s.point)))
        );
        let response: OsrmTripResponse = self.get_json(url).await?;
        if response.code != "Ok" {
            return Err(RouteError::Decode(format!("OSRM trip code {}", response.code)));
        }

        Ok(TripPlan {
            order: trip_order_from_waypoints(&response.waypoints, stops.len()),
            geometry: response.trips.first().map(|trip| Polyline::from_geojson(&trip.geometry.coordinates)),
        })
    }
}
