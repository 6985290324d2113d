//! Deterministic fakes for the provider, detector, and store seams.
//!
//! Test-only: scripted failure sequences and call counting let the scenario
//! tests in [`search`][crate::search] and [`orchestrator`][crate::orchestrator]
//! run without a live simulator.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use pyrescout_evidence::{EvidenceError, EvidenceRecord, EvidenceStore};
use pyrescout_hal::FleetProvider;
use pyrescout_perception::{Detector, DetectorError};
use pyrescout_types::{
    ControlError, DetectionResult, Frame, MotionError, Region, ScoredRegion, SensorError, Vec3,
    Waypoint,
};

use crate::cancel::CancelToken;

// ─────────────────────────────────────────────────────────────────────────────
// Provider fake
// ─────────────────────────────────────────────────────────────────────────────

/// Per-method invocation counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallCounts {
    pub takeoff: u32,
    pub moves: u32,
    pub captures: u32,
    pub land: u32,
    pub disarm: u32,
    pub release: u32,
}

/// Single-agent provider fake with scriptable move and capture failures.
pub struct FakeProvider {
    agent: String,
    position: Mutex<Vec3>,
    reject_setup: AtomicBool,
    move_failures: Mutex<u32>,
    capture_script: Mutex<VecDeque<Result<(), SensorError>>>,
    calls: Mutex<CallCounts>,
}

impl FakeProvider {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            position: Mutex::new(Vec3::ZERO),
            reject_setup: AtomicBool::new(false),
            move_failures: Mutex::new(0),
            capture_script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(CallCounts::default()),
        }
    }

    pub fn set_position(&self, position: Vec3) {
        *self.position.lock().unwrap() = position;
    }

    /// Make `enable_control(_, true)` fail, aborting setup.
    pub fn reject_setup(&self) {
        self.reject_setup.store(true, Ordering::SeqCst);
    }

    /// Fail the next `n` move commands.
    pub fn script_move_failures(&self, n: u32) {
        *self.move_failures.lock().unwrap() = n;
    }

    /// Fail the next `n` captures; later captures succeed.
    pub fn script_capture_failures(&self, n: u32) {
        let mut script = self.capture_script.lock().unwrap();
        for _ in 0..n {
            script.push_back(Err(SensorError::NoFrame {
                agent: self.agent.clone(),
            }));
        }
    }

    /// Explicit capture outcome sequence; `Ok(())` produces a frame at the
    /// current position.  Once exhausted, captures succeed.
    pub fn script_capture_results(&self, results: Vec<Result<(), SensorError>>) {
        self.capture_script.lock().unwrap().extend(results);
    }

    pub fn calls(&self) -> CallCounts {
        *self.calls.lock().unwrap()
    }

    fn frame(&self) -> Frame {
        Frame {
            agent: self.agent.clone(),
            timestamp: Utc::now(),
            position: *self.position.lock().unwrap(),
            width: 4,
            height: 4,
            data: vec![0u8; 4 * 4 * 3],
        }
    }
}

#[async_trait]
impl FleetProvider for FakeProvider {
    async fn enable_control(&self, agent: &str, on: bool) -> Result<(), ControlError> {
        if on && self.reject_setup.load(Ordering::SeqCst) {
            return Err(ControlError::Rejected {
                agent: agent.to_string(),
                request: "enable_control".to_string(),
                reason: "scripted rejection".to_string(),
            });
        }
        if !on {
            self.calls.lock().unwrap().release += 1;
        }
        Ok(())
    }

    async fn arm(&self, _agent: &str, on: bool) -> Result<(), ControlError> {
        if !on {
            self.calls.lock().unwrap().disarm += 1;
        }
        Ok(())
    }

    async fn takeoff(&self, _agent: &str) -> Result<(), MotionError> {
        self.calls.lock().unwrap().takeoff += 1;
        Ok(())
    }

    async fn move_to(&self, agent: &str, waypoint: &Waypoint) -> Result<(), MotionError> {
        self.calls.lock().unwrap().moves += 1;
        let mut failures = self.move_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(MotionError::Unreachable {
                agent: agent.to_string(),
                target: waypoint.position,
            });
        }
        *self.position.lock().unwrap() = waypoint.position;
        Ok(())
    }

    async fn land(&self, _agent: &str) -> Result<(), MotionError> {
        self.calls.lock().unwrap().land += 1;
        Ok(())
    }

    async fn capture(&self, _agent: &str) -> Result<Frame, SensorError> {
        self.calls.lock().unwrap().captures += 1;
        match self.capture_script.lock().unwrap().pop_front() {
            Some(Err(e)) => Err(e),
            _ => Ok(self.frame()),
        }
    }

    async fn position(&self, _agent: &str) -> Result<Vec3, SensorError> {
        Ok(*self.position.lock().unwrap())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Detector fakes
// ─────────────────────────────────────────────────────────────────────────────

fn result_with(confidence: f32) -> DetectionResult {
    DetectionResult {
        regions: vec![ScoredRegion {
            confidence,
            region: Region {
                x: 0,
                y: 0,
                width: 2,
                height: 2,
            },
        }],
    }
}

/// Detector that plays back a queue of results, then returns negatives.
/// Optionally arms a cancel token once the queue is drained.
pub struct ScriptedDetector {
    script: Mutex<VecDeque<DetectionResult>>,
    cancel_when_drained: Option<CancelToken>,
}

impl ScriptedDetector {
    pub fn negative() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            cancel_when_drained: None,
        }
    }

    pub fn with_scores(scores: &[f32]) -> Self {
        Self {
            script: Mutex::new(scores.iter().map(|&s| result_with(s)).collect()),
            cancel_when_drained: None,
        }
    }

    pub fn with_scores_then_cancel(scores: &[f32], cancel: CancelToken) -> Self {
        Self {
            script: Mutex::new(scores.iter().map(|&s| result_with(s)).collect()),
            cancel_when_drained: Some(cancel),
        }
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn infer(&self, _frame: &Frame) -> Result<DetectionResult, DetectorError> {
        let mut script = self.script.lock().unwrap();
        let result = script.pop_front().unwrap_or_default();
        if script.is_empty()
            && let Some(cancel) = &self.cancel_when_drained
        {
            cancel.cancel();
        }
        Ok(result)
    }
}

/// Always-negative detector that arms the cancel token on its n-th
/// invocation, so a loop exits at the following iteration boundary.
pub struct CancellingDetector {
    cancel: CancelToken,
    cancel_on_call: usize,
    count: AtomicUsize,
}

impl CancellingDetector {
    /// Cancel on the first inference.
    pub fn new(cancel: CancelToken) -> Self {
        Self::after(cancel, 1)
    }

    /// Cancel on the `n`-th inference (1-based).
    pub fn after(cancel: CancelToken, n: usize) -> Self {
        Self {
            cancel,
            cancel_on_call: n,
            count: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Detector for CancellingDetector {
    async fn infer(&self, _frame: &Frame) -> Result<DetectionResult, DetectorError> {
        let calls = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if calls >= self.cancel_on_call {
            self.cancel.cancel();
        }
        Ok(DetectionResult::empty())
    }
}

/// Detector whose agent task panics, for orchestrator fault-path tests.
pub struct PanickingDetector;

#[async_trait]
impl Detector for PanickingDetector {
    async fn infer(&self, _frame: &Frame) -> Result<DetectionResult, DetectorError> {
        panic!("injected detector fault");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store fake
// ─────────────────────────────────────────────────────────────────────────────

/// Store whose every write fails, for decision-independence tests.
pub struct FailingStore;

impl EvidenceStore for FailingStore {
    fn record(
        &self,
        _frame: &Frame,
        _result: &DetectionResult,
    ) -> Result<EvidenceRecord, EvidenceError> {
        Err(EvidenceError::Io(std::io::Error::other("disk unavailable")))
    }
}
