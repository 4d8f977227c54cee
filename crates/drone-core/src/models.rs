//! Data model: positions, waypoints, routes, statuses, wire payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DroneError;

/// A position in decimal degrees.
///
/// Route files and messages carry positions in two shapes: a `[lat, lng]`
/// pair or a `{"lat": .., "lng": ..}` record. Both deserialize into this
/// one canonical type; serialization always emits the record form.
/// Equality is exact, which the state machine relies on to detect arrival
/// at a leg's snapped destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "LatLngRepr")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LatLngRepr {
    Pair([f64; 2]),
    Record { lat: f64, lng: f64 },
}

impl From<LatLngRepr> for LatLng {
    fn from(repr: LatLngRepr) -> Self {
        match repr {
            LatLngRepr::Pair([lat, lng]) => Self { lat, lng },
            LatLngRepr::Record { lat, lng } => Self { lat, lng },
        }
    }
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A route position tagged with its index in the route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub index: usize,
    pub position: LatLng,
}

/// An ordered, cyclic sequence of waypoints.
///
/// Always at least two entries; after the last waypoint the route wraps
/// back to index 0.
#[derive(Debug, Clone)]
pub struct Route {
    waypoints: Vec<Waypoint>,
}

impl Route {
    pub fn new(points: Vec<LatLng>) -> Result<Self, DroneError> {
        if points.len() < 2 {
            return Err(DroneError::RouteTooShort(points.len()));
        }
        let waypoints = points
            .into_iter()
            .enumerate()
            .map(|(index, position)| Waypoint { index, position })
            .collect();
        Ok(Self { waypoints })
    }

    #[allow(clippy::len_without_is_empty)] // a route is never empty
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn waypoint(&self, index: usize) -> Waypoint {
        self.waypoints[index]
    }

    /// Cyclic successor of a waypoint index.
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.waypoints.len()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DroneStatus {
    #[default]
    Stopped,
    Moving,
}

/// Commands the ground station can issue.
///
/// Closed set; the wire layer drops any frame that does not parse into one
/// of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    Move,
    Stop,
    Abort,
}

/// Position/status report sent to the ground station after every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryUpdate {
    pub drone_id: Uuid,
    pub location: LatLng,
    pub last_waypoint: usize,
    pub next_waypoint: usize,
    pub status: DroneStatus,
    pub timestamp: DateTime<Utc>,
}

/// One-time announcement of the drone to the ground station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub drone_id: Uuid,
    pub location: LatLng,
    pub last_waypoint: usize,
    pub next_waypoint: usize,
    pub speed_mps: f64,
    pub status: DroneStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latlng_parses_pair_and_record_forms() {
        let pair: LatLng = serde_json::from_str("[37.7833, -122.4167]").unwrap();
        let record: LatLng =
            serde_json::from_str(r#"{"lat": 37.7833, "lng": -122.4167}"#).unwrap();

        assert_eq!(pair, record);
        assert_eq!(pair, LatLng::new(37.7833, -122.4167));
    }

    #[test]
    fn latlng_serializes_as_record() {
        let json = serde_json::to_value(LatLng::new(1.5, -2.5)).unwrap();
        assert_eq!(json, serde_json::json!({"lat": 1.5, "lng": -2.5}));
    }

    #[test]
    fn route_rejects_fewer_than_two_waypoints() {
        assert!(matches!(
            Route::new(vec![]),
            Err(DroneError::RouteTooShort(0))
        ));
        assert!(matches!(
            Route::new(vec![LatLng::new(0.0, 0.0)]),
            Err(DroneError::RouteTooShort(1))
        ));
    }

    #[test]
    fn route_indices_wrap_cyclically() {
        let route = Route::new(vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(1.0, 1.0),
            LatLng::new(2.0, 2.0),
        ])
        .unwrap();

        assert_eq!(route.len(), 3);
        assert_eq!(route.next_index(0), 1);
        assert_eq!(route.next_index(2), 0);
        assert_eq!(route.waypoint(1).index, 1);
    }

    #[test]
    fn command_kind_uses_upper_case_tags() {
        assert_eq!(
            serde_json::to_string(&CommandKind::Abort).unwrap(),
            "\"ABORT\""
        );
        let cmd: CommandKind = serde_json::from_str("\"STOP\"").unwrap();
        assert_eq!(cmd, CommandKind::Stop);
    }
}
