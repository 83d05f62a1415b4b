use serde::Deserialize;
use std::time::Duration;

use crate::error::Result;
use crate::fare::FareTable;
use crate::point::GeoPoint;

/// Runtime settings, read from `ROUTE_TSP_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,

    #[serde(default = "default_osrm_url")]
    pub osrm_url: String,

    // Nominatim rejects requests without an identifying agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    // Central Jakarta, used when no device location is available
    #[serde(default = "default_latitude")]
    pub default_latitude: f64,

    #[serde(default = "default_longitude")]
    pub default_longitude: f64,

    #[serde(default = "default_fare_base")]
    pub fare_base_idr: u64,

    #[serde(default = "default_fare_per_km")]
    pub fare_per_km_idr: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(envy::prefixed("ROUTE_TSP_").from_env::<Config>()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn default_origin(&self) -> GeoPoint {
        GeoPoint::labeled(self.default_latitude, self.default_longitude, "Start")
    }

    pub fn fare_table(&self) -> FareTable {
        FareTable { base_idr: self.fare_base_idr, per_km_idr: self.fare_per_km_idr }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nominatim_url: default_nominatim_url(),
            osrm_url: default_osrm_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_timeout_secs(),
            default_latitude: default_latitude(),
            default_longitude: default_longitude(),
            fare_base_idr: default_fare_base(),
            fare_per_km_idr: default_fare_per_km(),
        }
    }
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_osrm_url() -> String {
    "https://router.project-osrm.org".to_string()
}

fn default_user_agent() -> String {
    format!("route_tsp/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_latitude() -> f64 {
    -6.2
}

fn default_longitude() -> f64 {
    106.816666
}

fn default_fare_base() -> u64 {
    7000
}

fn default_fare_per_km() -> f64 {
    7000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RouteError;

    #[test]
    fn defaults_fill_missing_variables() {
        let config: Config = envy::prefixed("ROUTE_TSP_")
            .from_iter(vec![("ROUTE_TSP_REQUEST_TIMEOUT_SECS".to_string(), "3".to_string())])
            .unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.osrm_url, "https://router.project-osrm.org");
        assert_eq!(config.default_origin().lat_lng(), (-6.2, 106.816666));
        assert_eq!(config.fare_table(), FareTable::default());
    }

    #[test]
    fn malformed_variable_is_a_config_error() {
        let parsed: std::result::Result<Config, envy::Error> = envy::prefixed("ROUTE_TSP_")
            .from_iter(vec![("ROUTE_TSP_REQUEST_TIMEOUT_SECS".to_string(), "soon".to_string())]);
        let error = RouteError::from(parsed.unwrap_err());
        assert!(matches!(error, RouteError::Config(_)));
        assert!(error.to_string().starts_with("configuration error"));
    }

    #[test]
    fn overrides_are_read() {
        let config: Config = envy::prefixed("ROUTE_TSP_")
            .from_iter(vec![
                ("ROUTE_TSP_OSRM_URL".to_string(), "http://localhost:5000".to_string()),
                ("ROUTE_TSP_DEFAULT_LATITUDE".to_string(), "-6.9175".to_string()),
                ("ROUTE_TSP_FARE_BASE_IDR".to_string(), "9000".to_string()),
            ])
            .unwrap();
        assert_eq!(config.osrm_url, "http://localhost:5000");
        assert_eq!(config.default_latitude, -6.9175);
        assert_eq!(config.fare_base_idr, 9000);
    }
}
