use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "route_tsp")]
#[command(about = "Order courier stops with a nearest-neighbor route", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Usage,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Usage {
    /// Generate random stops around the default origin
    Generate {
        /// Number of stops to generate
        count: u32,
        /// Where to write the request file
        #[arg(short, long, default_value = "stops.json")]
        output: PathBuf,
        /// Half-width of the scatter square, in degrees
        #[arg(long, default_value_t = 0.1)]
        spread: f64,
    },
    /// Plan the visiting order for a request (or batch) file
    Plan {
        /// Request file; `.json` is appended if the name doesn't exist
        file: String,
        /// Close the route with a leg back to the origin
        #[arg(long)]
        return_to_origin: bool,
        /// Ask OSRM for the visiting order before falling back to nearest neighbor
        #[arg(long)]
        trip: bool,
        /// Fetch road-following geometry for each leg
        #[arg(long)]
        roads: bool,
        /// Write the drawn route as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// Look up address suggestions
    Geocode {
        query: String,
    },
    /// Great-circle distance and fare between two coordinates
    Distance {
        #[arg(allow_negative_numbers = true)]
        from_lat: f64,
        #[arg(allow_negative_numbers = true)]
        from_lng: f64,
        #[arg(allow_negative_numbers = true)]
        to_lat: f64,
        #[arg(allow_negative_numbers = true)]
        to_lng: f64,
    },
}
