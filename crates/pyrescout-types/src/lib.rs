use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A position or displacement in the simulator's world frame, metres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "x={:.2}, y={:.2}, z={:.2}", self.x, self.y, self.z)
    }
}

/// One motion target for an agent: a world-frame position plus the transit
/// speed at which to approach it.  Generated per search iteration and never
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub position: Vec3,
    /// Transit speed in m/s.
    pub speed: f32,
}

/// A captured sensor image plus its capture metadata.
///
/// The pixel buffer is tightly packed RGB8, so `data.len()` must equal
/// `width * height * 3`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Name of the agent that captured this frame.
    pub agent: String,
    /// Wall-clock capture time (UTC).
    pub timestamp: DateTime<Utc>,
    /// The agent's observed position at capture time.  Evidence filenames
    /// for positive detections encode this position, not the position at
    /// detection-report time.
    pub position: Vec3,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Expected pixel-buffer length for this frame's dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }
}

/// An axis-aligned region of interest within a frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One scored region produced by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredRegion {
    pub confidence: f32,
    pub region: Region,
}

/// Detector output for one frame: zero or more scored regions.  Immutable
/// once produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub regions: Vec<ScoredRegion>,
}

impl DetectionResult {
    /// A result with no regions (always negative).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The fire/no-fire decision: positive when ANY region's confidence is
    /// strictly greater than `threshold`.  A score exactly equal to the
    /// threshold is negative.
    pub fn is_positive(&self, threshold: f32) -> bool {
        self.regions.iter().any(|r| r.confidence > threshold)
    }

    /// Maximum confidence across all regions, or `None` when empty.
    pub fn max_confidence(&self) -> Option<f32> {
        self.regions
            .iter()
            .map(|r| r.confidence)
            .fold(None, |best, c| match best {
                Some(b) if b >= c => Some(b),
                _ => Some(c),
            })
    }
}

/// Lifecycle phase of one agent, from fleet initialisation to release.
///
/// `Detected`, `Interrupted`, and `Failed` are the terminal search states;
/// every one of them flows through `Landed` and `Released` during teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentPhase {
    Idle,
    Controlled,
    Armed,
    Airborne,
    Searching,
    Detected,
    Interrupted,
    Failed,
    Landed,
    Released,
}

impl AgentPhase {
    /// `true` for the three states that end a search loop.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AgentPhase::Detected | AgentPhase::Interrupted | AgentPhase::Failed
        )
    }
}

impl std::fmt::Display for AgentPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentPhase::Idle => "idle",
            AgentPhase::Controlled => "controlled",
            AgentPhase::Armed => "armed",
            AgentPhase::Airborne => "airborne",
            AgentPhase::Searching => "searching",
            AgentPhase::Detected => "detected",
            AgentPhase::Interrupted => "interrupted",
            AgentPhase::Failed => "failed",
            AgentPhase::Landed => "landed",
            AgentPhase::Released => "released",
        };
        f.write_str(s)
    }
}

/// A setup request (enable control, arm) was rejected by the provider.
/// Fatal to the affected agent only.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ControlError {
    #[error("agent '{agent}' is not known to the provider")]
    UnknownAgent { agent: String },

    #[error("provider rejected {request} for agent '{agent}': {reason}")]
    Rejected {
        agent: String,
        request: String,
        reason: String,
    },
}

/// A motion command (takeoff, move, land) failed to complete.  Non-fatal
/// during search: the loop retries with a fresh waypoint.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MotionError {
    #[error("target ({target}) unreachable for agent '{agent}'")]
    Unreachable { agent: String, target: Vec3 },

    #[error("motion aborted for agent '{agent}': {reason}")]
    Aborted { agent: String, reason: String },
}

/// A frame capture or position read failed.  Non-fatal until the configured
/// consecutive-failure bound is exceeded.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorError {
    #[error("no frame available from agent '{agent}'")]
    NoFrame { agent: String },

    #[error("sensor fault on agent '{agent}': {details}")]
    Fault { agent: String, details: String },
}
