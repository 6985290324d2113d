//! Search configuration: waypoint sampling bounds and loop tuning.

use pyrescout_perception::DEFAULT_CONFIDENCE_THRESHOLD;
use pyrescout_types::{Vec3, Waypoint};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding region waypoints are drawn from, world frame,
/// metres.  Each `(min, max)` pair is sampled independently and uniformly.
///
/// The box is configuration, never derived from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchBounds {
    pub x: (f32, f32),
    pub y: (f32, f32),
    pub z: (f32, f32),
}

impl Default for SearchBounds {
    fn default() -> Self {
        // Scan volume over the default scenario: a strip north of the spawn
        // point, from near ground level up to 20 m (NED, so negative z is up).
        Self {
            x: (-10.0, 10.0),
            y: (-100.0, -10.0),
            z: (-20.0, 5.0),
        }
    }
}

impl SearchBounds {
    /// Draw one position uniformly at random, each axis independent.
    pub fn sample(&self, rng: &mut impl Rng) -> Vec3 {
        Vec3 {
            x: rng.gen_range(self.x.0..=self.x.1),
            y: rng.gen_range(self.y.0..=self.y.1),
            z: rng.gen_range(self.z.0..=self.z.1),
        }
    }
}

/// Tuning for one agent search loop.  Shared read-only across the fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Waypoint sampling region.
    #[serde(default)]
    pub bounds: SearchBounds,
    /// Transit speed for every sampled waypoint, m/s.
    #[serde(default = "default_transit_speed")]
    pub transit_speed: f32,
    /// Fire/no-fire confidence threshold; strictly-greater comparison.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Consecutive capture failures tolerated before the agent is marked
    /// failed and excluded from further search.
    #[serde(default = "default_max_sensor_failures")]
    pub max_sensor_failures: u32,
}

fn default_transit_speed() -> f32 {
    40.0
}
fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}
fn default_max_sensor_failures() -> u32 {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            bounds: SearchBounds::default(),
            transit_speed: default_transit_speed(),
            confidence_threshold: default_confidence_threshold(),
            max_sensor_failures: default_max_sensor_failures(),
        }
    }
}

impl SearchConfig {
    /// Draw the next waypoint for an iteration.
    pub fn sample_waypoint(&self) -> Waypoint {
        let mut rng = rand::thread_rng();
        Waypoint {
            position: self.bounds.sample(&mut rng),
            speed: self.transit_speed,
        }
    }
}
