//! Evidence store.
//!
//! Persists every captured frame as a PNG, split into a negative and a
//! positive collection.  The filename convention is an external contract:
//! downstream tooling parses agent name, timestamp, and (for positives) the
//! capture position out of the name.
//!
//! # Storage layout
//!
//! Under the configured root:
//!
//! | directory          | contents                                          |
//! |--------------------|---------------------------------------------------|
//! | `no_fire_detected` | `{agent}_{YYYY-MM-DD_HH-MM-SS}.png`               |
//! | `fire_detected`    | `{agent}_{ts}_x{x:.2}_y{y:.2}_z{z:.2}.png`        |
//!
//! Writes go through a temp file plus rename so concurrent agents never
//! observe a half-written record.
//!
//! # Example
//!
//! ```rust,no_run
//! use pyrescout_evidence::{EvidenceStore, FsEvidenceStore};
//!
//! let store = FsEvidenceStore::new("./evidence", 0.6).unwrap();
//! // store.record(&frame, &result)?;
//! ```

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use pyrescout_types::{DetectionResult, Frame, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Collection directory for frames with no detection.
pub const NEGATIVE_DIR: &str = "no_fire_detected";
/// Collection directory for frames with at least one above-threshold region.
pub const POSITIVE_DIR: &str = "fire_detected";

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise while persisting evidence.  Never fatal to a search
/// loop: the detection decision is made before the write.
#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding error: {0}")]
    Encode(#[from] png::EncodingError),

    #[error("frame buffer length {actual} does not match dimensions (expected {expected})")]
    BadFrame { expected: usize, actual: usize },
}

// ─────────────────────────────────────────────────────────────────────────────
// Record model
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome class of one persisted frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Classification {
    Negative,
    /// At least one region scored strictly above the threshold; `score` is
    /// the maximum confidence across regions.
    Positive { score: f32 },
}

impl Classification {
    pub fn is_positive(&self) -> bool {
        matches!(self, Classification::Positive { .. })
    }
}

/// The persisted outcome of one capture.  Every captured frame yields exactly
/// one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: Uuid,
    pub agent: String,
    pub timestamp: DateTime<Utc>,
    /// Agent position at capture time.
    pub position: Vec3,
    pub classification: Classification,
    /// Where the frame was written (or would be, for in-memory stores).
    pub path: PathBuf,
}

// ─────────────────────────────────────────────────────────────────────────────
// Filename convention (external contract)
// ─────────────────────────────────────────────────────────────────────────────

/// Timestamp token used in every evidence filename.
pub fn timestamp_token(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Filename for a negative record: `{agent}_{timestamp}.png`.
pub fn negative_filename(agent: &str, timestamp: &DateTime<Utc>) -> String {
    format!("{agent}_{}.png", timestamp_token(timestamp))
}

/// Filename for a positive record:
/// `{agent}_{timestamp}_x{x:.2}_y{y:.2}_z{z:.2}.png`.
///
/// Token order and the two-decimal precision are parsed by downstream
/// tooling; do not change them.
pub fn positive_filename(agent: &str, timestamp: &DateTime<Utc>, position: &Vec3) -> String {
    format!(
        "{agent}_{}_x{:.2}_y{:.2}_z{:.2}.png",
        timestamp_token(timestamp),
        position.x,
        position.y,
        position.z,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Store trait
// ─────────────────────────────────────────────────────────────────────────────

/// Durable storage for captured frames and their classification.
pub trait EvidenceStore: Send + Sync {
    /// Persist `frame` together with its detection outcome.
    ///
    /// Always writes, whether or not the result is positive.
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError`] when the write fails.  Callers log the error
    /// and continue; the detection decision has already been made.
    fn record(&self, frame: &Frame, result: &DetectionResult)
    -> Result<EvidenceRecord, EvidenceError>;
}

fn classify(result: &DetectionResult, threshold: f32) -> Classification {
    if result.is_positive(threshold) {
        // Detection is any-above-threshold; the record keeps the maximum
        // confidence for reporting.
        Classification::Positive {
            score: result.max_confidence().unwrap_or(threshold),
        }
    } else {
        Classification::Negative
    }
}

fn record_for(frame: &Frame, classification: Classification, path: PathBuf) -> EvidenceRecord {
    EvidenceRecord {
        id: Uuid::new_v4(),
        agent: frame.agent.clone(),
        timestamp: frame.timestamp,
        position: frame.position,
        classification,
        path,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Filesystem store
// ─────────────────────────────────────────────────────────────────────────────

/// Filesystem-backed evidence store.
///
/// Safe for concurrent use by multiple agent loops: record names are unique
/// per agent and timestamp, and each file lands via temp-write plus rename.
pub struct FsEvidenceStore {
    negative_dir: PathBuf,
    positive_dir: PathBuf,
    threshold: f32,
}

impl FsEvidenceStore {
    /// Create the store rooted at `root`, creating both collection
    /// directories if needed.
    pub fn new(root: impl Into<PathBuf>, threshold: f32) -> Result<Self, EvidenceError> {
        let root = root.into();
        let negative_dir = root.join(NEGATIVE_DIR);
        let positive_dir = root.join(POSITIVE_DIR);
        fs::create_dir_all(&negative_dir)?;
        fs::create_dir_all(&positive_dir)?;
        Ok(Self {
            negative_dir,
            positive_dir,
            threshold,
        })
    }

    fn write_png(path: &Path, frame: &Frame) -> Result<(), EvidenceError> {
        let expected = frame.expected_len();
        if frame.data.len() != expected {
            return Err(EvidenceError::BadFrame {
                expected,
                actual: frame.data.len(),
            });
        }
        // Stage under a temp name so a concurrent reader never sees a
        // partial file, then rename into place.
        let tmp = path.with_extension("png.tmp");
        {
            let file = fs::File::create(&tmp)?;
            let mut encoder = png::Encoder::new(BufWriter::new(file), frame.width, frame.height);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&frame.data)?;
            writer.finish()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl EvidenceStore for FsEvidenceStore {
    fn record(
        &self,
        frame: &Frame,
        result: &DetectionResult,
    ) -> Result<EvidenceRecord, EvidenceError> {
        let classification = classify(result, self.threshold);
        let path = match classification {
            Classification::Negative => self
                .negative_dir
                .join(negative_filename(&frame.agent, &frame.timestamp)),
            Classification::Positive { .. } => self.positive_dir.join(positive_filename(
                &frame.agent,
                &frame.timestamp,
                &frame.position,
            )),
        };
        Self::write_png(&path, frame)?;
        debug!(agent = %frame.agent, path = %path.display(), "evidence recorded");
        Ok(record_for(frame, classification, path))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-memory store (tests, headless assertions)
// ─────────────────────────────────────────────────────────────────────────────

/// An evidence store that keeps records in memory instead of touching disk.
/// The `path` field of each record reflects where the filesystem store would
/// have written it.
pub struct MemoryEvidenceStore {
    threshold: f32,
    records: Mutex<Vec<EvidenceRecord>>,
}

impl MemoryEvidenceStore {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything recorded so far.
    pub fn records(&self) -> Vec<EvidenceRecord> {
        self.records
            .lock()
            .expect("evidence store lock poisoned")
            .clone()
    }
}

impl EvidenceStore for MemoryEvidenceStore {
    fn record(
        &self,
        frame: &Frame,
        result: &DetectionResult,
    ) -> Result<EvidenceRecord, EvidenceError> {
        let classification = classify(result, self.threshold);
        let name = match classification {
            Classification::Negative => {
                PathBuf::from(NEGATIVE_DIR).join(negative_filename(&frame.agent, &frame.timestamp))
            }
            Classification::Positive { .. } => PathBuf::from(POSITIVE_DIR).join(
                positive_filename(&frame.agent, &frame.timestamp, &frame.position),
            ),
        };
        let record = record_for(frame, classification, name);
        self.records
            .lock()
            .expect("evidence store lock poisoned")
            .push(record.clone());
        Ok(record)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
