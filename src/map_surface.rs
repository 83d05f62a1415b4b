//! Drawing a planned route onto a map.
//!
//! The planner knows nothing about maps. A `MapSurface` is whatever the
//! platform draws with; `render_route` is the one place that turns a
//! `RouteResult` into markers, a line and a viewport.

use serde_json::{json, Value};

use crate::point::{GeoPoint, Stop};
use crate::routing::{join_segments, Polyline, Segment, SegmentSource};
use crate::solution::RouteResult;

pub const DEFAULT_PADDING_PX: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: (f64, f64),
    pub label: String,
    pub popup: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    pub color: &'static str,
    pub weight: u32,
    pub dash: Option<&'static str>,
}

impl LineStyle {
    pub const ROAD: LineStyle = LineStyle { color: "#2563eb", weight: 5, dash: None };
    pub const STRAIGHT: LineStyle = LineStyle { color: "#10b981", weight: 4, dash: Some("4,6") };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub fn from_points(points: &[(f64, f64)]) -> Option<Bounds> {
        let (&(lat, lng), rest) = points.split_first()?;
        let start = Bounds { south: lat, west: lng, north: lat, east: lng };
        Some(rest.iter().fold(start, |b, &(lat, lng)| Bounds {
            south: b.south.min(lat),
            west: b.west.min(lng),
            north: b.north.max(lat),
            east: b.east.max(lng),
        }))
    }
}

pub trait MapSurface {
    fn set_markers(&mut self, markers: Vec<Marker>);
    fn set_polyline(&mut self, polyline: &Polyline, style: &LineStyle);
    fn fit_to_bounds(&mut self, bounds: Bounds, padding_px: u32);
}

/// Draws `result` on `surface`.
///
/// With `segments` the line follows them, styled as road geometry unless
/// any segment had to fall back to a straight line. Without segments the
/// stops are joined by straight lines.
pub fn render_route<S: MapSurface>(
    surface: &mut S,
    origin: &GeoPoint,
    stops: &[Stop],
    result: &RouteResult,
    segments: Option<&[Segment]>,
) {
    let path = result.path(origin, stops);
    let labels = result.marker_labels();

    let markers = path
        .iter()
        .zip(labels)
        .map(|(point, label)| Marker {
            position: point.lat_lng(),
            popup: (!point.label.is_empty()).then(|| point.label.clone()),
            label,
        })
        .collect();
    surface.set_markers(markers);

    if path.len() < 2 {
        return;
    }

    let (line, style) = match segments {
        Some(segments) if !segments.is_empty() => {
            let all_road = segments.iter().all(|s| s.source == SegmentSource::Road);
            (join_segments(segments), if all_road { LineStyle::ROAD } else { LineStyle::STRAIGHT })
        }
        _ => (Polyline::new(path.iter().map(|p| p.lat_lng()).collect()), LineStyle::STRAIGHT),
    };
    surface.set_polyline(&line, &style);

    if let Some(bounds) = Bounds::from_points(line.points()) {
        surface.fit_to_bounds(bounds, DEFAULT_PADDING_PX);
    }
}

/// Collects a drawing as a GeoJSON `FeatureCollection`.
#[derive(Debug, Default)]
pub struct GeoJsonSurface {
    markers: Vec<Marker>,
    lines: Vec<(Polyline, LineStyle)>,
    viewport: Option<(Bounds, u32)>,
}

impl GeoJsonSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_geojson(&self) -> Value {
        let mut features: Vec<Value> = self
            .markers
            .iter()
            .map(|m| {
                json!({
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [m.position.1, m.position.0] },
                    "properties": { "label": m.label, "popup": m.popup },
                })
            })
            .collect();

        features.extend(self.lines.iter().map(|(line, style)| {
            let coordinates: Vec<[f64; 2]> = line.points().iter().map(|&(lat, lng)| [lng, lat]).collect();
            json!({
                "type": "Feature",
                "geometry": { "type": "LineString", "coordinates": coordinates },
                "properties": { "stroke": style.color, "stroke-width": style.weight, "dash": style.dash },
            })
        }));

        let mut collection = json!({ "type": "FeatureCollection", "features": features });
        if let Some((b, padding)) = self.viewport {
            collection["bbox"] = json!([b.west, b.south, b.east, b.north]);
            collection["padding"] = json!(padding);
        }
        collection
    }
}

impl MapSurface for GeoJsonSurface {
    fn set_markers(&mut self, markers: Vec<Marker>) {
        self.markers = markers;
    }

    // A map shows one route line at a time; drawing again replaces it
    fn set_polyline(&mut self, polyline: &Polyline, style: &LineStyle) {
        self.lines = vec![(polyline.clone(), style.clone())];
    }

    fn fit_to_bounds(&mut self, bounds: Bounds, padding_px: u32) {
        self.viewport = Some((bounds, padding_px));
    }
}
