//! Agent configuration and route-file loading.
//!
//! CLI flags win over environment variables, which win over defaults.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use drone_core::{LatLng, Route};

/// Waypoint drone simulator agent
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Args {
    /// Ground station WebSocket URL (env: DRONE_URL)
    #[arg(long)]
    pub url: Option<String>,

    /// Route file: JSON array of [lat, lng] pairs or {lat, lng} records
    /// (env: DRONE_ROUTE)
    #[arg(long)]
    pub route: Option<PathBuf>,

    /// Cruise speed in meters per second (env: DRONE_SPEED)
    #[arg(long)]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub url: String,
    pub route_path: PathBuf,
    pub speed_mps: f64,
}

impl Config {
    pub fn resolve(args: Args) -> Self {
        Self {
            url: args
                .url
                .or_else(|| env::var("DRONE_URL").ok())
                .unwrap_or_else(|| "ws://localhost:8080".to_string()),
            route_path: args
                .route
                .or_else(|| env::var("DRONE_ROUTE").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("route.json")),
            speed_mps: args
                .speed
                .or_else(|| env::var("DRONE_SPEED").ok().and_then(|s| s.parse().ok()))
                .unwrap_or(18.0),
        }
    }
}

/// Parse route JSON: an array of positions in either accepted form.
pub fn parse_route(json: &str) -> Result<Route> {
    let points: Vec<LatLng> =
        serde_json::from_str(json).context("route file is not a JSON array of positions")?;
    Route::new(points).context("route file rejected")
}

pub fn load_route(path: &Path) -> Result<Route> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading route file {}", path.display()))?;
    parse_route(&raw)
}
