//! In-process simulated fleet for CI and headless runs.
//!
//! [`SimProvider`] keeps per-agent kinematic state behind a mutex, records
//! every command it receives, and returns blank frames tagged with the
//! agent's current position.  It lets the full pyrescout stack run end to
//! end without the external simulation backend.
//!
//! # Example
//!
//! ```rust
//! use pyrescout_hal::sim::SimProvider;
//!
//! let provider = SimProvider::new().with_agent("Scout0").with_agent("Scout1");
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use pyrescout_types::{ControlError, Frame, MotionError, SensorError, Vec3, Waypoint};
use tracing::debug;

use crate::provider::FleetProvider;

/// Dimensions of the blank frames the simulated camera produces.
const SIM_FRAME_WIDTH: u32 = 8;
const SIM_FRAME_HEIGHT: u32 = 8;

/// Recorded state of one simulated agent.
#[derive(Debug, Clone, Default)]
pub struct SimAgentState {
    pub controlled: bool,
    pub armed: bool,
    pub airborne: bool,
    pub position: Vec3,
    /// Counters for teardown assertions in tests.
    pub takeoff_calls: u32,
    pub land_calls: u32,
    pub disarm_calls: u32,
    pub release_calls: u32,
    pub moves: Vec<Waypoint>,
    pub captures: u32,
}

/// Simulated motion & sensor provider.
///
/// Motion commands resolve instantly; captures always succeed with a blank
/// RGB frame.  Invariant enforcement matches the real backend: motion is
/// rejected unless the agent is controlled, armed, and (for `move_to`)
/// airborne.
#[derive(Default)]
pub struct SimProvider {
    agents: Mutex<HashMap<String, SimAgentState>>,
}

impl SimProvider {
    /// Create an empty simulated fleet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a simulated agent parked at the origin.
    pub fn with_agent(self, name: impl Into<String>) -> Self {
        self.agents
            .lock()
            .expect("sim provider lock poisoned")
            .insert(name.into(), SimAgentState::default());
        self
    }

    /// Snapshot of one agent's recorded state, for test assertions.
    pub fn state(&self, agent: &str) -> Option<SimAgentState> {
        self.agents
            .lock()
            .expect("sim provider lock poisoned")
            .get(agent)
            .cloned()
    }

    fn with_state<T>(&self, agent: &str, f: impl FnOnce(&mut SimAgentState) -> T) -> Option<T> {
        self.agents
            .lock()
            .expect("sim provider lock poisoned")
            .get_mut(agent)
            .map(f)
    }

    fn unknown(agent: &str) -> ControlError {
        ControlError::UnknownAgent {
            agent: agent.to_string(),
        }
    }

    fn unknown_motion(agent: &str) -> MotionError {
        MotionError::Aborted {
            agent: agent.to_string(),
            reason: "unknown agent".to_string(),
        }
    }
}

#[async_trait]
impl FleetProvider for SimProvider {
    async fn enable_control(&self, agent: &str, on: bool) -> Result<(), ControlError> {
        self.with_state(agent, |s| {
            s.controlled = on;
            if !on {
                s.release_calls += 1;
            }
        })
        .ok_or_else(|| Self::unknown(agent))
    }

    async fn arm(&self, agent: &str, on: bool) -> Result<(), ControlError> {
        self.with_state(agent, |s| {
            s.armed = on;
            if !on {
                s.disarm_calls += 1;
            }
        })
        .ok_or_else(|| Self::unknown(agent))
    }

    async fn takeoff(&self, agent: &str) -> Result<(), MotionError> {
        self.with_state(agent, |s| {
            if !s.controlled || !s.armed {
                return Err(MotionError::Aborted {
                    agent: agent.to_string(),
                    reason: "takeoff requires control authority and an armed agent".to_string(),
                });
            }
            s.airborne = true;
            s.takeoff_calls += 1;
            s.position.z = -2.0;
            Ok(())
        })
        .unwrap_or_else(|| Err(Self::unknown_motion(agent)))
    }

    async fn move_to(&self, agent: &str, waypoint: &Waypoint) -> Result<(), MotionError> {
        debug!(agent, target = %waypoint.position, speed = waypoint.speed, "sim move");
        self.with_state(agent, |s| {
            if !s.controlled || !s.armed || !s.airborne {
                return Err(MotionError::Aborted {
                    agent: agent.to_string(),
                    reason: "move_to requires an airborne, armed, controlled agent".to_string(),
                });
            }
            s.position = waypoint.position;
            s.moves.push(*waypoint);
            Ok(())
        })
        .unwrap_or_else(|| Err(Self::unknown_motion(agent)))
    }

    async fn land(&self, agent: &str) -> Result<(), MotionError> {
        self.with_state(agent, |s| {
            s.airborne = false;
            s.land_calls += 1;
            s.position.z = 0.0;
        })
        .ok_or_else(|| Self::unknown_motion(agent))
    }

    async fn capture(&self, agent: &str) -> Result<Frame, SensorError> {
        self.with_state(agent, |s| {
            s.captures += 1;
            Frame {
                agent: agent.to_string(),
                timestamp: Utc::now(),
                position: s.position,
                width: SIM_FRAME_WIDTH,
                height: SIM_FRAME_HEIGHT,
                data: vec![0u8; (SIM_FRAME_WIDTH * SIM_FRAME_HEIGHT * 3) as usize],
            }
        })
        .ok_or_else(|| SensorError::Fault {
            agent: agent.to_string(),
            details: "unknown agent".to_string(),
        })
    }

    async fn position(&self, agent: &str) -> Result<Vec3, SensorError> {
        self.with_state(agent, |s| s.position)
            .ok_or_else(|| SensorError::Fault {
                agent: agent.to_string(),
                details: "unknown agent".to_string(),
            })
    }
}
