//! Generic [`FleetProvider`] trait for motion and sensor backends.

use async_trait::async_trait;
use pyrescout_types::{ControlError, Frame, MotionError, SensorError, Vec3, Waypoint};

/// A motion & sensor backend serving a named fleet of agents.
///
/// Motion operations are asynchronous on the backend side; awaiting the
/// returned future blocks the calling loop until the backend reports the
/// motion finished or failed, mirroring a `.join()` on a completion handle.
///
/// Implementations must tolerate concurrent calls for different agents; the
/// runtime never issues two concurrent commands for the same agent.
#[async_trait]
pub trait FleetProvider: Send + Sync {
    /// Grant or revoke control authority over `agent`.  Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] if the backend rejects the request, e.g. the
    /// agent is unknown.
    async fn enable_control(&self, agent: &str, on: bool) -> Result<(), ControlError>;

    /// Arm or disarm `agent`.  Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError`] if the backend rejects the request.
    async fn arm(&self, agent: &str, on: bool) -> Result<(), ControlError>;

    /// Take off and climb to hover.  Resolves when the agent is airborne.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError`] if the motion is rejected or fails mid-way.
    /// The agent must be under control authority and armed first.
    async fn takeoff(&self, agent: &str) -> Result<(), MotionError>;

    /// Fly to `waypoint` at its transit speed.  Resolves on arrival.
    ///
    /// # Errors
    ///
    /// Returns [`MotionError`] for unreachable targets or aborted transits.
    /// The search loop treats this as non-fatal and retries with a fresh
    /// waypoint.
    async fn move_to(&self, agent: &str, waypoint: &Waypoint) -> Result<(), MotionError>;

    /// Descend and land.  Resolves once the agent is on the ground.
    async fn land(&self, agent: &str) -> Result<(), MotionError>;

    /// Capture the next available frame from the agent's forward camera.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError`] when no frame is available.  Non-fatal until
    /// the runtime's consecutive-failure bound is exceeded.
    async fn capture(&self, agent: &str) -> Result<Frame, SensorError>;

    /// The agent's current observed position, used for evidence tagging.
    async fn position(&self, agent: &str) -> Result<Vec3, SensorError>;
}
