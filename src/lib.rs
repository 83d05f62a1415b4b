//! Courier waypoint ordering.
//!
//! `planner::plan_route` is the core: a greedy nearest-neighbor walk over
//! great-circle distances. Everything else feeds it coordinates (geocoding)
//! or draws what it returns (road geometry, map surfaces).

pub mod cli;
pub mod config;
pub mod distance;
pub mod error;
pub mod fare;
pub mod geocode;
pub mod input;
pub mod map_surface;
pub mod planner;
pub mod point;
pub mod random_stops;
pub mod routing;
pub mod solution;

pub use distance::distance;
pub use error::{Result, RouteError};
pub use planner::{plan_batch, plan_route, RouteRequest};
pub use point::{GeoPoint, Stop};
pub use solution::RouteResult;
