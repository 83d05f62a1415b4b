use serde::{Deserialize, Serialize};

use crate::distance::distance;
use crate::point::{GeoPoint, Stop};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub visit_order: Vec<usize>,
    pub total_distance_km: f64,
    #[serde(default)]
    pub returns_to_origin: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Leg {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
}

impl RouteResult {
    pub fn new() -> RouteResult {
        RouteResult { visit_order: Vec::new(), total_distance_km: 0.0, returns_to_origin: false }
    }

    pub fn len(&self) -> usize {
        self.visit_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visit_order.is_empty()
    }

    /// Ordered coordinates to draw: origin, the stops in visit order, and the
    /// origin again when the route is closed.
    pub fn path<'a>(&self, origin: &'a GeoPoint, stops: &'a [Stop]) -> Vec<&'a GeoPoint> {
        let mut path = Vec::with_capacity(self.visit_order.len() + 2);
        path.push(origin);
        path.extend(self.visit_order.iter().map(|&i| &stops[i].point));
        if self.returns_to_origin && !self.visit_order.is_empty() {
            path.push(origin);
        }
        path
    }

    pub fn legs(&self, origin: &GeoPoint, stops: &[Stop]) -> Vec<Leg> {
        let path = self.path(origin, stops);
        path.windows(2)
            .map(|pair| Leg {
                from: pair[0].label.clone(),
                to: pair[1].label.clone(),
                distance_km: distance(pair[0], pair[1]),
            })
            .collect()
    }

    // "Start", then 1..n, with the final stop marked "End"
    pub fn marker_labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(self.visit_order.len() + 1);
        labels.push(String::from("Start"));
        for position in 0..self.visit_order.len() {
            if position == self.visit_order.len() - 1 {
                labels.push(String::from("End"));
            } else {
                labels.push((position + 1).to_string());
            }
        }
        labels
    }

    /// Numbered labels in the shipment list style, e.g. `"2. Bekasi"`.
    pub fn numbered_labels(&self, stops: &[Stop]) -> Vec<String> {
        self.visit_order
            .iter()
            .enumerate()
            .map(|(position, &i)| format!("{}. {}", position + 1, stops[i].point.label))
            .collect()
    }
}

impl Default for RouteResult {
    fn default() -> RouteResult {
        RouteResult::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stops() -> Vec<Stop> {
        vec![
            Stop::new(GeoPoint::labeled(-6.234, 106.994, "Bekasi")),
            Stop::new(GeoPoint::labeled(-6.402, 106.818, "Depok")),
        ]
    }

    #[test]
    fn path_follows_visit_order() {
        let origin = GeoPoint::labeled(-6.2, 106.816666, "Start");
        let stops = stops();
        let result = RouteResult { visit_order: vec![1, 0], total_distance_km: 0.0, returns_to_origin: false };

        let labels: Vec<&str> = result.path(&origin, &stops).iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Start", "Depok", "Bekasi"]);
    }

    #[test]
    fn closed_path_ends_at_origin() {
        let origin = GeoPoint::labeled(-6.2, 106.816666, "Start");
        let stops = stops();
        let result = RouteResult { visit_order: vec![0, 1], total_distance_km: 0.0, returns_to_origin: true };

        let path = result.path(&origin, &stops);
        assert_eq!(path.len(), 4);
        assert_eq!(path[3], &origin);
        assert_eq!(result.legs(&origin, &stops).len(), 3);
    }

    #[test]
    fn marker_labels_mark_the_last_stop() {
        let result = RouteResult { visit_order: vec![2, 0, 1], total_distance_km: 0.0, returns_to_origin: false };
        assert_eq!(result.marker_labels(), vec!["Start", "1", "2", "End"]);

        assert_eq!(RouteResult::new().marker_labels(), vec!["Start"]);
    }

    #[test]
    fn numbered_labels_use_stop_names() {
        let result = RouteResult { visit_order: vec![1, 0], total_distance_km: 0.0, returns_to_origin: false };
        assert_eq!(result.numbered_labels(&stops()), vec!["1. Depok", "2. Bekasi"]);
    }
}
