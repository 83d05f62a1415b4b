use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub label: String,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint { latitude, longitude, label: String::new() }
    }

    pub fn labeled(latitude: f64, longitude: f64, label: &str) -> GeoPoint {
        GeoPoint { latitude, longitude, label: label.to_string() }
    }

    // Coordinates are not checked anywhere else; the planner trusts its caller
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn lat_lng(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// A stop to visit, optionally tagged with the task or shipment it came from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Stop {
    #[serde(flatten)]
    pub point: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl Stop {
    pub fn new(point: GeoPoint) -> Stop {
        Stop { point, source_id: None }
    }

    pub fn with_source(point: GeoPoint, source_id: &str) -> Stop {
        Stop { point, source_id: Some(source_id.to_string()) }
    }
}

impl From<GeoPoint> for Stop {
    fn from(point: GeoPoint) -> Stop {
        Stop::new(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validity_checks_both_axes() {
        assert!(GeoPoint::new(-6.2, 106.816666).is_valid());
        assert!(GeoPoint::new(90.0, -180.0).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 180.5).is_valid());
    }

    #[test]
    fn stop_json_is_flat() {
        let stop = Stop::with_source(GeoPoint::labeled(-6.1754, 106.8272, "Monas"), "RESI-001234");
        let json = serde_json::to_value(&stop).unwrap();
        assert_eq!(json["latitude"], -6.1754);
        assert_eq!(json["label"], "Monas");
        assert_eq!(json["source_id"], "RESI-001234");

        let back: Stop = serde_json::from_value(json).unwrap();
        assert_eq!(back, stop);
    }

    #[test]
    fn label_and_source_are_optional_in_json() {
        let stop: Stop = serde_json::from_str(r#"{"latitude": 1.5, "longitude": 2.5}"#).unwrap();
        assert_eq!(stop.point.label, "");
        assert!(stop.source_id.is_none());
    }
}
