//! Model-free detector stand-ins for tests and headless runs.

use async_trait::async_trait;
use pyrescout_types::{DetectionResult, Frame, Region, ScoredRegion, Vec3};
use tracing::debug;

use crate::detector::{Detector, DetectorError};

/// A detector that never sees anything.  Every frame is negative.
#[derive(Debug, Default)]
pub struct NullDetector;

#[async_trait]
impl Detector for NullDetector {
    async fn infer(&self, _frame: &Frame) -> Result<DetectionResult, DetectorError> {
        Ok(DetectionResult::empty())
    }
}

/// A detector that reports a single high-confidence region whenever the
/// frame was captured within `radius` metres of a configured fire location.
///
/// Because [`Frame`] carries the capture position, this gives sim runs a
/// deterministic fire the fleet can actually find.
#[derive(Debug, Clone)]
pub struct HotspotDetector {
    pub center: Vec3,
    pub radius: f32,
    pub confidence: f32,
}

impl HotspotDetector {
    pub fn new(center: Vec3, radius: f32, confidence: f32) -> Self {
        Self {
            center,
            radius,
            confidence,
        }
    }
}

#[async_trait]
impl Detector for HotspotDetector {
    async fn infer(&self, frame: &Frame) -> Result<DetectionResult, DetectorError> {
        let distance = frame.position.distance(&self.center);
        if distance > self.radius {
            return Ok(DetectionResult::empty());
        }
        debug!(agent = %frame.agent, distance, "hotspot within range");
        // One centred box covering a quarter of the frame.
        Ok(DetectionResult {
            regions: vec![ScoredRegion {
                confidence: self.confidence,
                region: Region {
                    x: frame.width / 4,
                    y: frame.height / 4,
                    width: frame.width / 2,
                    height: frame.height / 2,
                },
            }],
        })
    }
}
