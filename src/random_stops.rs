use rand::Rng;

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Result, RouteError};
use crate::planner::RouteRequest;
use crate::point::{GeoPoint, Stop};

pub const MAX_STOPS: u32 = 10_000;

/// Scatters stops uniformly in a square around a center point.
pub struct RandomStopGenerator {
    center: GeoPoint,
    spread_deg: f64,
}

impl RandomStopGenerator {
    pub fn new(center: GeoPoint, spread_deg: f64) -> RandomStopGenerator {
        RandomStopGenerator { center, spread_deg: spread_deg.abs() }
    }

    /// Rejects counts outside `1..=MAX_STOPS` rather than silently trimming.
    pub fn generate(&self, count: u32) -> Result<RouteRequest> {
        if count == 0 || count > MAX_STOPS {
            return Err(RouteError::StopCount { requested: count, max: MAX_STOPS });
        }

        let mut rng = rand::thread_rng();
        let stops = (0..count)
            .map(|i| {
                let (d_lat, d_lng) = if self.spread_deg > 0.0 {
                    (rng.gen_range(-self.spread_deg..self.spread_deg), rng.gen_range(-self.spread_deg..self.spread_deg))
                } else {
                    (0.0, 0.0)
                };
                let point = GeoPoint {
                    latitude: round(self.center.latitude + d_lat).clamp(-90.0, 90.0),
                    longitude: round(self.center.longitude + d_lng).clamp(-180.0, 180.0),
                    label: format!("Stop {}", i + 1),
                };
                Stop::with_source(point, &format!("RESI-{:06}", i + 1))
            })
            .collect();

        Ok(RouteRequest::new(self.center.clone(), stops))
    }

    pub fn write_to_file(request: &RouteRequest, path: &Path) -> Result<()> {
        let json_string = serde_json::to_string_pretty(request)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;
        tracing::info!("Wrote {} stops to {}", request.stops.len(), path.display());
        Ok(())
    }
}

// Four decimals is roughly 11 m, plenty for a street address
fn round(degrees: f64) -> f64 {
    (degrees * 10_000.0).round() / 10_000.0
}
