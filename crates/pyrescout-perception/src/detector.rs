//! [`Detector`] trait – model inference over captured frames.

use async_trait::async_trait;
use pyrescout_types::{DetectionResult, Frame};
use thiserror::Error;

/// Default confidence threshold for the fire/no-fire decision.
///
/// A region is only counted when its confidence is strictly greater than the
/// threshold; a score exactly equal to it is negative.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.6;

/// Errors raised by a detector backend.
#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("inference failed: {0}")]
    Inference(String),
}

/// A vision model that scores regions of interest in one frame.
///
/// Pure from the runtime's perspective: inference never mutates the frame,
/// and the same frame always yields an equivalent result.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Run inference on `frame` and return all scored regions.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError`] when the backend cannot produce a result.
    /// The search loop treats this as a degraded capture: the frame is still
    /// recorded (as a negative) and the search continues.
    async fn infer(&self, frame: &Frame) -> Result<DetectionResult, DetectorError>;
}
