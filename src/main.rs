use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use route_tsp::cli::{Cli, Usage};
use route_tsp::config::Config;
use route_tsp::fare::{format_rupiah, FareTable};
use route_tsp::geocode::{suggest, CachedGeocoder, NominatimGeocoder};
use route_tsp::input::{load_route_files, resolve_path};
use route_tsp::map_surface::{render_route, GeoJsonSurface};
use route_tsp::random_stops::RandomStopGenerator;
use route_tsp::routing::{order_with_fallback, route_geometry, trip_segments, OsrmRouter, Segment, SegmentSource};
use route_tsp::solution::Leg;
use route_tsp::{distance, plan_batch, GeoPoint, RouteRequest, RouteResult, Stop};

#[derive(Serialize)]
struct PlanSummary<'a> {
    #[serde(flatten)]
    result: &'a RouteResult,
    fare_idr: u64,
    fare: String,
    ordered_stops: Vec<&'a Stop>,
    legs: Vec<Leg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    straight_segments: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "route_tsp=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenv::dotenv().ok();
    let config = Config::from_env().context("Failed to load configuration")?;
    let cli = Cli::parse();

    match cli.command {
        Usage::Generate { count, output, spread } => generate(&config, count, &output, spread),
        Usage::Plan { file, return_to_origin, trip, roads, geojson } => {
            plan(&config, &file, return_to_origin, trip, roads, geojson.as_deref()).await
        }
        Usage::Geocode { query } => geocode(&config, &query).await,
        Usage::Distance { from_lat, from_lng, to_lat, to_lng } => {
            let km = distance(&GeoPoint::new(from_lat, from_lng), &GeoPoint::new(to_lat, to_lng));
            let fare = config.fare_table().estimate(km);
            println!("{:.3} km, fare {}", km, format_rupiah(fare));
            Ok(())
        }
    }
}

fn generate(config: &Config, count: u32, output: &Path, spread: f64) -> Result<()> {
    let request = RandomStopGenerator::new(config.default_origin(), spread).generate(count)?;
    RandomStopGenerator::write_to_file(&request, output).with_context(|| format!("Couldn't write {}", output.display()))?;
    Ok(())
}

async fn plan(
    config: &Config,
    file: &str,
    return_to_origin: bool,
    trip: bool,
    roads: bool,
    geojson: Option<&Path>,
) -> Result<()> {
    let path = resolve_path(file).ok_or_else(|| anyhow!("File not found: {}", file))?;
    let route_files = load_route_files(&path).with_context(|| format!("Couldn't read {}", path.display()))?;

    let geocoder = Arc::new(CachedGeocoder::new(NominatimGeocoder::new(config)?));
    let mut requests: Vec<RouteRequest> = Vec::with_capacity(route_files.len());
    for route_file in route_files {
        let mut request = route_file.into_request(geocoder.clone(), config).await;
        request.return_to_origin |= return_to_origin;
        requests.push(request);
    }

    let router = Arc::new(OsrmRouter::new(config)?);
    let start = Instant::now();

    // Trip geometry per route, drawn when road segments weren't asked for
    let mut trip_lines: Vec<Option<Vec<Segment>>> = vec![None; requests.len()];
    let results: Vec<RouteResult> = if trip {
        let mut results = Vec::with_capacity(requests.len());
        for (request, line) in requests.iter().zip(trip_lines.iter_mut()) {
            let (mut result, geometry) = order_with_fallback(router.as_ref(), &request.origin, &request.stops).await;
            request.close(&mut result);
            *line = geometry.map(|g| trip_segments(g, &request.origin, result.returns_to_origin));
            results.push(result);
        }
        results
    } else {
        plan_batch(&requests)
    };

    info!("Planned {} route(s) in {:?}", results.len(), start.elapsed());

    let fares = config.fare_table();
    let mut summaries = Vec::with_capacity(results.len());
    for (index, ((request, result), trip_line)) in requests.iter().zip(&results).zip(trip_lines).enumerate() {
        let segments = if roads {
            let path: Vec<GeoPoint> = result.path(&request.origin, &request.stops).into_iter().cloned().collect();
            Some(route_geometry(router.clone(), &path, config.request_timeout()).await)
        } else {
            trip_line
        };

        if let Some(target) = geojson {
            let target = numbered_path(target, index, requests.len());
            write_geojson(&target, request, result, segments.as_deref())?;
        }

        summaries.push(summarize(request, result, &fares, segments.as_deref()));
    }

    println!("{}", serde_json::to_string_pretty(&summaries)?);
    Ok(())
}

fn summarize<'a>(request: &'a RouteRequest, result: &'a RouteResult, fares: &FareTable, segments: Option<&[Segment]>) -> PlanSummary<'a> {
    let fare_idr = fares.estimate(result.total_distance_km);
    PlanSummary {
        result,
        fare_idr,
        fare: format_rupiah(fare_idr),
        ordered_stops: result.visit_order.iter().map(|&i| &request.stops[i]).collect(),
        legs: result.legs(&request.origin, &request.stops),
        straight_segments: segments.map(|s| s.iter().filter(|seg| seg.source == SegmentSource::Straight).count()),
    }
}

// Batches write one map per route: `map.geojson`, `map-2.geojson`, ...
fn numbered_path(target: &Path, index: usize, total: usize) -> PathBuf {
    if total <= 1 || index == 0 {
        return target.to_path_buf();
    }
    let stem = target.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let extension = target.extension().map(|e| e.to_string_lossy().to_string()).unwrap_or_else(|| "geojson".to_string());
    target.with_file_name(format!("{}-{}.{}", stem, index + 1, extension))
}

fn write_geojson(target: &Path, request: &RouteRequest, result: &RouteResult, segments: Option<&[Segment]>) -> Result<()> {
    let mut surface = GeoJsonSurface::new();
    render_route(&mut surface, &request.origin, &request.stops, result, segments);
    let json = serde_json::to_string_pretty(&surface.to_geojson())?;
    std::fs::write(target, json).with_context(|| format!("Couldn't write {}", target.display()))?;
    info!("Wrote map to {}", target.display());
    Ok(())
}

async fn geocode(config: &Config, query: &str) -> Result<()> {
    let geocoder = NominatimGeocoder::new(config)?;
    let places = suggest(&geocoder, query).await;
    if places.is_empty() {
        println!("No matches for {:?}", query);
    }
    for place in places {
        println!("{:.6}, {:.6}  {}", place.point.latitude, place.point.longitude, place.title);
    }
    Ok(())
}
