//! `pyrescout-perception` – the detector seam.
//!
//! Wraps whatever vision model spots the target condition behind the
//! [`Detector`][detector::Detector] trait.  The decision rule itself lives on
//! [`DetectionResult`][pyrescout_types::DetectionResult]: a frame is positive
//! when any scored region's confidence is strictly greater than the
//! configured threshold ([`DEFAULT_CONFIDENCE_THRESHOLD`] = 0.6 by default).
//!
//! [`NullDetector`][sim::NullDetector] and
//! [`HotspotDetector`][sim::HotspotDetector] are model-free stand-ins for
//! tests and headless demo runs.

pub mod detector;
pub mod sim;

pub use detector::{DEFAULT_CONFIDENCE_THRESHOLD, Detector, DetectorError};
pub use sim::{HotspotDetector, NullDetector};
