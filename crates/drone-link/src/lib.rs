//! Ground-station link for the waypoint drone simulator.
//!
//! A WebSocket client carrying the one-time registration, per-tick
//! telemetry updates, and inbound commands for a single drone.

pub mod backoff;
pub mod client;
pub mod protocol;

pub use client::{GroundLink, LinkSink};
pub use protocol::{Inbound, Outbound};
