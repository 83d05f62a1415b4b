use crate::point::GeoPoint;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers using the haversine formula.
pub fn distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

    // Rounding can push h a hair above 1.0 for antipodal points
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Sum of leg distances along a path of points.
pub fn path_length(path: &[&GeoPoint]) -> f64 {
    path.windows(2).map(|pair| distance(pair[0], pair[1])).sum()
}
