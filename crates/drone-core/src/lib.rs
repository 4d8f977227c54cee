//! Core logic for the waypoint drone simulator.
//!
//! Geodesic math, the per-leg locator, and the tick-driven movement state
//! machine. Network transport and process startup live in the sibling
//! crates; this crate only talks to them through [`TelemetrySink`] and
//! [`CommandKind`].

pub mod drone;
pub mod error;
pub mod geo;
pub mod locator;
pub mod models;

pub use drone::{Drone, TelemetrySink};
pub use error::DroneError;
pub use geo::EARTH_RADIUS_M;
pub use locator::{Locator, TICK_INTERVAL};
pub use models::{
    CommandKind, DroneStatus, LatLng, Registration, Route, TelemetryUpdate, Waypoint,
};
