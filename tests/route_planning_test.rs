use approx::assert_relative_eq;
use route_tsp::distance::path_length;
use route_tsp::fare::estimate_fare;
use route_tsp::input::parse_route_files;
use route_tsp::map_surface::{render_route, GeoJsonSurface};
use route_tsp::{distance, plan_batch, plan_route, GeoPoint, RouteRequest, Stop};

// Shipment origins from the delivery dashboard
fn shipment_cities() -> Vec<Stop> {
    [
        ("Jakarta Selatan", -6.261, 106.810, "INV-0001"),
        ("Bekasi", -6.234, 106.994, "INV-0002"),
        ("Tangerang", -6.176, 106.629, "INV-0003"),
        ("Depok", -6.402, 106.818, "INV-0004"),
        ("Jakarta Barat", -6.176, 106.758, "INV-0005"),
    ]
    .iter()
    .map(|&(name, lat, lng, id)| Stop::with_source(GeoPoint::labeled(lat, lng, name), id))
    .collect()
}

fn jakarta() -> GeoPoint {
    GeoPoint::labeled(-6.2, 106.816666, "Start")
}

#[test]
fn test_known_distances() {
    let jakarta = GeoPoint::new(-6.2, 106.8167);
    let bandung = GeoPoint::new(-6.9175, 107.6191);

    assert_eq!(distance(&jakarta, &jakarta), 0.0);
    let km = distance(&jakarta, &bandung);
    assert!(km > 116.0 && km < 123.0, "Jakarta-Bandung should be ~120 km, got {}", km);
    assert_relative_eq!(km, distance(&bandung, &jakarta), epsilon = 1e-9);
}

#[test]
fn test_shipment_route_visits_every_city_once() {
    let stops = shipment_cities();
    let request = RouteRequest::new(jakarta(), stops.clone());
    let result = request.plan();

    let mut seen = result.visit_order.clone();
    seen.sort_unstable();
    assert_eq!(seen, vec![0, 1, 2, 3, 4]);

    // Jakarta Selatan is the closest city to the center
    assert_eq!(result.visit_order[0], 0);

    let origin = jakarta();
    assert_relative_eq!(result.total_distance_km, path_length(&result.path(&origin, &stops)), epsilon = 1e-9);
}

#[test]
fn test_each_step_takes_the_nearest_remaining_stop() {
    let origin = jakarta();
    let points: Vec<GeoPoint> = shipment_cities().into_iter().map(|s| s.point).collect();
    let result = plan_route(&origin, &points);

    let mut current = &origin;
    for (step, &chosen) in result.visit_order.iter().enumerate() {
        let best = result.visit_order[step..]
            .iter()
            .map(|&i| distance(current, &points[i]))
            .fold(f64::INFINITY, f64::min);
        assert_eq!(distance(current, &points[chosen]), best);
        current = &points[chosen];
    }
}

#[test]
fn test_repeated_planning_is_identical() {
    let requests = vec![RouteRequest::new(jakarta(), shipment_cities()); 4];
    let results = plan_batch(&requests);
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(results[0], requests[0].plan());
}

#[test]
fn test_request_file_to_map() {
    let routes = parse_route_files(
        r#"{
            "origin": {"latitude": -6.2, "longitude": 106.816666, "label": "Depot"},
            "stops": [
                {"latitude": -6.1754, "longitude": 106.8272, "label": "Monas, Jakarta Pusat", "source_id": "RESI-001234"},
                {"latitude": -6.1352, "longitude": 106.8133, "label": "Kota Tua, Jakarta Barat", "source_id": "RESI-001235"},
                {"latitude": -6.2443, "longitude": 106.7983, "label": "Blok M Plaza, Jakarta Selatan", "source_id": "RESI-001236"}
            ],
            "return_to_origin": true
        }"#,
    )
    .unwrap();
    let file = routes.into_iter().next().unwrap();
    let request = RouteRequest {
        origin: file.origin.unwrap(),
        stops: file.stops,
        return_to_origin: file.return_to_origin,
    };
    let result = request.plan();
    assert_eq!(result.len(), 3);
    assert!(result.returns_to_origin);

    let mut surface = GeoJsonSurface::new();
    render_route(&mut surface, &request.origin, &request.stops, &result, None);
    let map = surface.to_geojson();
    let features = map["features"].as_array().unwrap();

    // start + three stops, then the closed line back to the depot
    assert_eq!(features.len(), 5);
    assert_eq!(features[0]["properties"]["label"], "Start");
    assert_eq!(features[3]["properties"]["label"], "End");
    assert_eq!(features[4]["geometry"]["coordinates"].as_array().unwrap().len(), 5);

    assert!(estimate_fare(result.total_distance_km) >= 7000);
}
