//! Error types for the drone core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DroneError {
    /// A route needs at least two waypoints to form a leg.
    #[error("route needs at least two waypoints, got {0}")]
    RouteTooShort(usize),

    /// Speed must be a positive, finite number of meters per second.
    #[error("invalid speed: {0} m/s")]
    InvalidSpeed(f64),

    /// Movement interrupted by a stop command. This is the move loop's
    /// normal exit path and never escapes the public API.
    #[error("movement halted by stop command")]
    Halted,
}
