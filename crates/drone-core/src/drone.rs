//! The drone movement state machine.
//!
//! A `Drone` owns a cyclic waypoint route, a navigation record, and the
//! tick-driven move loop. Commands arrive asynchronously and only ever
//! touch flags or the navigation record; the loop samples them at tick
//! checkpoints, so a command never preempts an in-flight tick wait.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use rand::Rng;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::DroneError;
use crate::locator::Locator;
use crate::models::{
    CommandKind, DroneStatus, LatLng, Registration, Route, TelemetryUpdate, Waypoint,
};

/// Receives telemetry updates after every tick.
///
/// Publishing is fire-and-forget: implementations must not block and the
/// drone never waits for an acknowledgment.
pub trait TelemetrySink: Send + Sync {
    fn publish(&self, update: TelemetryUpdate);
}

/// The fields the tick loop owns. One mutex, never held across an await.
#[derive(Debug, Clone)]
struct NavState {
    location: LatLng,
    last_waypoint: usize,
    next_waypoint: usize,
    status: DroneStatus,
}

/// Cheap clonable handle to the one drone this process simulates.
#[derive(Clone)]
pub struct Drone {
    inner: Arc<Inner>,
}

struct Inner {
    id: Uuid,
    route: Route,
    home_index: usize,
    speed_mps: f64,
    nav: Mutex<NavState>,
    /// Set by `stop()`, consumed at the next tick checkpoint.
    stop_requested: AtomicBool,
    /// True while a move loop task is alive; makes MOVE a no-op trigger.
    move_active: AtomicBool,
    /// One-way registration latch.
    registered: AtomicBool,
    sink: Arc<dyn TelemetrySink>,
}

impl Drone {
    /// Create a drone parked at a randomly drawn home waypoint.
    pub fn new(
        route: Route,
        speed_mps: f64,
        sink: Arc<dyn TelemetrySink>,
    ) -> Result<Drone, DroneError> {
        let home_index = rand::rng().random_range(0..route.len() - 1);
        Self::with_home(route, speed_mps, home_index, sink)
    }

    /// Create a drone parked at a specific home waypoint.
    pub fn with_home(
        route: Route,
        speed_mps: f64,
        home_index: usize,
        sink: Arc<dyn TelemetrySink>,
    ) -> Result<Drone, DroneError> {
        if !speed_mps.is_finite() || speed_mps <= 0.0 {
            return Err(DroneError::InvalidSpeed(speed_mps));
        }

        let home = route.waypoint(home_index);
        let nav = NavState {
            location: home.position,
            last_waypoint: home_index,
            next_waypoint: route.next_index(home_index),
            status: DroneStatus::Stopped,
        };

        Ok(Drone {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                route,
                home_index,
                speed_mps,
                nav: Mutex::new(nav),
                stop_requested: AtomicBool::new(false),
                move_active: AtomicBool::new(false),
                registered: AtomicBool::new(false),
                sink,
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn route(&self) -> &Route {
        &self.inner.route
    }

    pub fn home(&self) -> Waypoint {
        self.inner.route.waypoint(self.inner.home_index)
    }

    pub fn speed_mps(&self) -> f64 {
        self.inner.speed_mps
    }

    pub fn status(&self) -> DroneStatus {
        self.nav().status
    }

    /// Current telemetry view of the drone.
    pub fn snapshot(&self) -> TelemetryUpdate {
        let nav = self.nav();
        self.update_from(&nav)
    }

    /// Registration payload announcing this drone to the ground station.
    pub fn registration(&self) -> Registration {
        let nav = self.nav();
        Registration {
            drone_id: self.inner.id,
            location: nav.location,
            last_waypoint: nav.last_waypoint,
            next_waypoint: nav.next_waypoint,
            speed_mps: self.inner.speed_mps,
            status: nav.status,
        }
    }

    /// Latch the one-time registration.
    ///
    /// Returns true only for the call that performed the false -> true
    /// transition; every later call is a no-op.
    pub fn register(&self) -> bool {
        self.inner
            .registered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_registered(&self) -> bool {
        self.inner.registered.load(Ordering::Acquire)
    }

    /// Dispatch a command from the ground station.
    pub fn on_command(&self, command: CommandKind) {
        tracing::info!(drone_id = %self.inner.id, ?command, "command received");
        match command {
            CommandKind::Move => {
                self.start_move();
            }
            CommandKind::Stop => self.stop(),
            CommandKind::Abort => self.abort(),
        }
    }

    /// Begin (or keep) moving toward the next waypoint.
    ///
    /// Returns a handle to the newly spawned move loop, or `None` when a
    /// loop is already running and this call was a no-op trigger.
    pub fn start_move(&self) -> Option<JoinHandle<()>> {
        if self
            .inner
            .move_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        // A fresh MOVE supersedes a stop that no loop was left to observe.
        self.inner.stop_requested.store(false, Ordering::Release);

        let drone = self.clone();
        Some(tokio::spawn(async move { drone.run_move_loop().await }))
    }

    /// Request a halt. Sampled at the next tick checkpoint; never preempts
    /// an in-flight tick wait.
    pub fn stop(&self) {
        self.inner.stop_requested.store(true, Ordering::Release);
    }

    /// Return to the home waypoint by the most direct great-circle route,
    /// then resume the normal cycle from there.
    pub fn abort(&self) {
        {
            let mut nav = self.nav();
            nav.next_waypoint = self.inner.home_index;
            nav.last_waypoint =
                (self.inner.home_index + self.inner.route.len() - 1) % self.inner.route.len();
        }
        tracing::info!(drone_id = %self.inner.id, home = self.inner.home_index, "returning to home waypoint");
        self.start_move();
    }

    async fn run_move_loop(&self) {
        loop {
            match self.step_leg().await {
                Ok(()) => {}
                Err(DroneError::Halted) => {
                    tracing::info!(drone_id = %self.inner.id, "move loop halted");
                    break;
                }
                // Nothing else can come out of a tick; if it ever does,
                // it is a programming error and must not be retried.
                Err(err) => panic!("move loop failed: {err}"),
            }
        }
        self.inner.move_active.store(false, Ordering::Release);
    }

    /// One move-loop iteration: a single locator tick against the current
    /// leg, then the command checkpoint and the telemetry publish.
    async fn step_leg(&self) -> Result<(), DroneError> {
        let (current, target) = {
            let nav = self.nav();
            (nav.location, self.inner.route.waypoint(nav.next_waypoint))
        };

        let mut locator = Locator::new(current, target.position, self.inner.speed_mps);
        let location = locator.next().await;

        // Checkpoint: a stop wins over the tick that just completed, so
        // the position the tick produced is discarded.
        if self.inner.stop_requested.swap(false, Ordering::AcqRel) {
            let update = {
                let mut nav = self.nav();
                nav.status = DroneStatus::Stopped;
                self.update_from(&nav)
            };
            self.inner.sink.publish(update);
            return Err(DroneError::Halted);
        }

        let (update, arrived) = {
            let mut nav = self.nav();
            nav.location = location;
            nav.status = DroneStatus::Moving;
            // Arrival is exact value equality with the snapped leg end.
            let arrived = location == target.position;
            if arrived {
                nav.last_waypoint = nav.next_waypoint;
                nav.next_waypoint = self.inner.route.next_index(nav.next_waypoint);
            }
            (self.update_from(&nav), arrived)
        };

        if arrived {
            tracing::info!(drone_id = %self.inner.id, waypoint = target.index, "reached waypoint");
        } else {
            tracing::trace!(
                drone_id = %self.inner.id,
                lat = location.lat,
                lng = location.lng,
                "tick"
            );
        }
        self.inner.sink.publish(update);
        Ok(())
    }

    fn update_from(&self, nav: &NavState) -> TelemetryUpdate {
        TelemetryUpdate {
            drone_id: self.inner.id,
            location: nav.location,
            last_waypoint: nav.last_waypoint,
            next_waypoint: nav.next_waypoint,
            status: nav.status,
            timestamp: Utc::now(),
        }
    }

    fn nav(&self) -> MutexGuard<'_, NavState> {
        self.inner.nav.lock().expect("navigation state poisoned")
    }
}
