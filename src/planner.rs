use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::distance::distance;
use crate::point::{GeoPoint, Stop};
use crate::solution::RouteResult;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: GeoPoint,
    #[serde(default)]
    pub stops: Vec<Stop>,
    #[serde(default)]
    pub return_to_origin: bool,
}

impl RouteRequest {
    pub fn new(origin: GeoPoint, stops: Vec<Stop>) -> RouteRequest {
        RouteRequest { origin, stops, return_to_origin: false }
    }

    /// Adds the leg back to the origin when the request asks for a closed route.
    /// A result whose last index isn't one of this request's stops is left as is.
    pub fn close(&self, result: &mut RouteResult) {
        if !self.return_to_origin || result.returns_to_origin {
            return;
        }
        if let Some(&last) = result.visit_order.last() {
            let Some(stop) = self.stops.get(last) else {
                tracing::warn!("Visit order points past {} stops, not closing route", self.stops.len());
                return;
            };
            result.total_distance_km += distance(&stop.point, &self.origin);
        }
        result.returns_to_origin = true;
    }

    pub fn plan(&self) -> RouteResult {
        let points: Vec<GeoPoint> = self.stops.iter().map(|s| s.point.clone()).collect();
        let mut result = plan_route(&self.origin, &points);
        self.close(&mut result);

        tracing::debug!(
            stops = self.stops.len(),
            km = result.total_distance_km,
            "planned route"
        );
        result
    }
}

/// Greedy nearest-neighbor ordering of `stops` starting from `origin`.
///
/// Equidistant candidates resolve to the lowest stop index, so the
/// output is fully determined by the input.
pub fn plan_route(origin: &GeoPoint, stops: &[GeoPoint]) -> RouteResult {
    let mut result = RouteResult::new();
    let mut remaining: Vec<usize> = (0..stops.len()).collect();
    let mut current = origin;

    while !remaining.is_empty() {
        // `remaining` stays sorted and min_by_key keeps the first minimum, i.e. the lowest index
        let Some((slot, nearest)) = remaining
            .iter()
            .enumerate()
            .map(|(slot, &index)| (slot, OrderedFloat(distance(current, &stops[index]))))
            .min_by_key(|&(_, d)| d)
        else {
            break;
        };

        let index = remaining.remove(slot);
        result.visit_order.push(index);
        result.total_distance_km += nearest.into_inner();
        current = &stops[index];
    }

    result
}

/// Plans independent requests in parallel, preserving input order.
pub fn plan_batch(requests: &[RouteRequest]) -> Vec<RouteResult> {
    requests.par_iter().map(RouteRequest::plan).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::EARTH_RADIUS_KM;
    use approx::assert_relative_eq;

    // Points due north of the equator origin, `km` away
    fn north(km: f64) -> GeoPoint {
        GeoPoint::new((km / EARTH_RADIUS_KM).to_degrees(), 0.0)
    }

    fn is_permutation(order: &[usize], n: usize) -> bool {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        sorted == (0..n).collect::<Vec<_>>()
    }

    #[test]
    fn empty_stops() {
        let result = plan_route(&GeoPoint::new(-6.2, 106.8167), &[]);
        assert!(result.visit_order.is_empty());
        assert_eq!(result.total_distance_km, 0.0);
    }

    #[test]
    fn single_stop() {
        let origin = GeoPoint::new(-6.2, 106.8167);
        let stop = GeoPoint::new(-6.9175, 107.6191);
        let result = plan_route(&origin, &[stop.clone()]);
        assert_eq!(result.visit_order, vec![0]);
        assert_eq!(result.total_distance_km, distance(&origin, &stop));
    }

    #[test]
    fn collinear_stops_walk_outwards() {
        let origin = north(0.0);
        let stops = vec![north(10.0), north(5.0), north(15.0)];
        let result = plan_route(&origin, &stops);
        assert_eq!(result.visit_order, vec![1, 0, 2]);
        assert_relative_eq!(result.total_distance_km, 15.0, epsilon = 1e-6);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let origin = GeoPoint::new(0.0, 0.0);
        let stops = vec![GeoPoint::new(0.0, 1.0), GeoPoint::new(0.0, -1.0), GeoPoint::new(1.0, 0.0)];
        let result = plan_route(&origin, &stops);
        assert_eq!(result.visit_order[0], 0);
    }

    #[test]
    fn duplicate_coordinates_are_both_visited() {
        let origin = GeoPoint::new(-6.2, 106.8167);
        let monas = GeoPoint::new(-6.1754, 106.8272);
        let result = plan_route(&origin, &[monas.clone(), monas.clone()]);
        assert_eq!(result.visit_order, vec![0, 1]);
        assert_relative_eq!(result.total_distance_km, distance(&origin, &monas), epsilon = 1e-12);
    }

    #[test]
    fn visit_order_is_a_permutation() {
        let origin = GeoPoint::new(-6.2, 106.816666);
        let stops: Vec<GeoPoint> = (0..25)
            .map(|i| GeoPoint::new(-6.2 + ((i * 7) % 11) as f64 * 0.013, 106.8 + ((i * 5) % 13) as f64 * 0.011))
            .collect();
        let result = plan_route(&origin, &stops);
        assert!(is_permutation(&result.visit_order, stops.len()));
    }

    #[test]
    fn planning_is_deterministic() {
        let origin = GeoPoint::new(-6.2, 106.816666);
        let stops = vec![
            GeoPoint::new(-6.261, 106.810),
            GeoPoint::new(-6.234, 106.994),
            GeoPoint::new(-6.176, 106.629),
            GeoPoint::new(-6.402, 106.818),
        ];
        assert_eq!(plan_route(&origin, &stops), plan_route(&origin, &stops));
    }

    #[test]
    fn total_matches_path_length() {
        let origin = GeoPoint::new(-6.2, 106.816666);
        let stops: Vec<Stop> = vec![
            GeoPoint::new(-6.261, 106.810).into(),
            GeoPoint::new(-6.234, 106.994).into(),
            GeoPoint::new(-6.176, 106.629).into(),
        ];
        let request = RouteRequest::new(origin.clone(), stops.clone());
        let result = request.plan();
        let path = result.path(&origin, &stops);
        assert_relative_eq!(result.total_distance_km, crate::distance::path_length(&path), epsilon = 1e-9);
    }

    #[test]
    fn return_to_origin_adds_closing_leg() {
        let origin = north(0.0);
        let stops: Vec<Stop> = vec![north(10.0).into(), north(5.0).into()];
        let mut request = RouteRequest::new(origin, stops);
        assert_relative_eq!(request.plan().total_distance_km, 10.0, epsilon = 1e-6);

        request.return_to_origin = true;
        let closed = request.plan();
        assert_eq!(closed.visit_order, vec![1, 0]);
        assert!(closed.returns_to_origin);
        assert_relative_eq!(closed.total_distance_km, 20.0, epsilon = 1e-6);
    }

    #[test]
    fn foreign_result_is_not_closed() {
        let mut request = RouteRequest::new(north(0.0), vec![north(5.0).into()]);
        request.return_to_origin = true;
        let mut foreign = RouteResult { visit_order: vec![0, 3], total_distance_km: 7.0, returns_to_origin: false };
        request.close(&mut foreign);
        assert_eq!(foreign.total_distance_km, 7.0);
        assert!(!foreign.returns_to_origin);
    }

    #[test]
    fn closed_route_without_stops_is_zero() {
        let mut request = RouteRequest::new(north(0.0), Vec::new());
        request.return_to_origin = true;
        assert_eq!(request.plan().total_distance_km, 0.0);
    }

    #[test]
    fn batch_preserves_input_order() {
        let requests: Vec<RouteRequest> = (1..=8)
            .map(|n| RouteRequest::new(north(0.0), (1..=n).map(|k| north(k as f64).into()).collect()))
            .collect();
        let results = plan_batch(&requests);
        assert_eq!(results.len(), requests.len());
        for (n, result) in (1..=8).zip(&results) {
            assert_eq!(result.len(), n);
            assert_relative_eq!(result.total_distance_km, n as f64, epsilon = 1e-6);
        }
    }
}
