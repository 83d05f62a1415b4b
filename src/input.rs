use serde::Deserialize;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::geocode::{resolve_stops, AddressTask, Geocoder};
use crate::planner::RouteRequest;
use crate::point::{GeoPoint, Stop};

/// One route as written in a request file. Stops may be given as
/// coordinates, as addresses to geocode, or both.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RouteFile {
    #[serde(default)]
    pub origin: Option<GeoPoint>,
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub addresses: Vec<AddressTask>,
    #[serde(default)]
    pub return_to_origin: bool,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RequestFile {
    Batch { routes: Vec<RouteFile> },
    Single(RouteFile),
}

/// Finds the request file, trying a `.json` suffix when the name as given
/// doesn't exist.
pub fn resolve_path(name: &str) -> Option<PathBuf> {
    let path = PathBuf::from(name);
    if path.is_file() {
        return Some(path);
    }

    let with_extension = PathBuf::from(format!("{}.json", name));
    if with_extension.is_file() {
        return Some(with_extension);
    }

    None
}

pub fn parse_route_files(data: &str) -> Result<Vec<RouteFile>> {
    let routes = match serde_json::from_str::<RequestFile>(data)? {
        RequestFile::Batch { routes } => routes,
        RequestFile::Single(route) => vec![route],
    };
    Ok(routes)
}

pub fn load_route_files(path: &Path) -> Result<Vec<RouteFile>> {
    let data = fs::read_to_string(path)?;
    let routes = parse_route_files(&data)?;
    tracing::debug!("Loaded {} route(s) from {}", routes.len(), path.display());
    Ok(routes)
}

impl RouteFile {
    /// Turns the file entry into a plannable request. Addresses are geocoded
    /// and appended after the coordinate stops; the configured default
    /// origin stands in when the file names none.
    pub async fn into_request<G>(self, geocoder: Arc<G>, config: &Config) -> RouteRequest
    where
        G: Geocoder + Send + Sync + 'static,
    {
        let origin = self.origin.unwrap_or_else(|| config.default_origin());
        let mut stops = self.stops;

        if !self.addresses.is_empty() {
            let resolved = resolve_stops(geocoder, &self.addresses, &config.default_origin(), config.request_timeout()).await;
            let fallbacks = resolved.iter().filter(|r| !r.geocoded).count();
            if fallbacks > 0 {
                tracing::warn!("{} of {} addresses placed at fallback coordinates", fallbacks, resolved.len());
            }
            stops.extend(resolved.into_iter().map(|r| r.stop));
        }

        RouteRequest { origin, stops, return_to_origin: self.return_to_origin }
    }
}
