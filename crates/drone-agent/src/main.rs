//! Waypoint drone simulator agent.
//!
//! Loads the route and speed, connects the ground link, registers the
//! drone, and pumps inbound commands into the movement state machine.

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drone_core::Drone;
use drone_link::GroundLink;

use crate::config::{Args, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("drone_agent=debug".parse()?)
                .add_directive("drone_core=debug".parse()?)
                .add_directive("drone_link=debug".parse()?),
        )
        .init();

    let config = Config::resolve(Args::parse());
    let route = config::load_route(&config.route_path)?;
    tracing::info!(
        waypoints = route.len(),
        speed_mps = config.speed_mps,
        "route loaded"
    );

    let mut link = GroundLink::connect(&config.url)
        .await
        .with_context(|| format!("connecting to ground station at {}", config.url))?;

    let drone = Drone::new(route, config.speed_mps, Arc::new(link.sink()))?;
    tracing::info!(drone_id = %drone.id(), home = drone.home().index, "drone ready");

    if drone.register() {
        link.register(drone.registration());
    }

    let mut commands = link
        .take_commands()
        .context("command stream unavailable")?;
    while let Some(command) = commands.recv().await {
        drone.on_command(command);
    }

    tracing::info!("ground link closed, shutting down");
    Ok(())
}
