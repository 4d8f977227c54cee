//! Wire protocol between the drone and the ground station.
//!
//! JSON text frames tagged by `type`. Outbound carries the one-time
//! registration and per-tick telemetry updates; inbound carries commands.
//! Frames that do not parse are dropped by the link with a warning.

use drone_core::{CommandKind, Registration, TelemetryUpdate};
use serde::{Deserialize, Serialize};

/// Frames the drone sends to the ground station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outbound {
    Register { drone: Registration },
    Update { update: TelemetryUpdate },
}

/// Frames the ground station sends to the drone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Inbound {
    Command { command: CommandKind },
}
