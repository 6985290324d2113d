//! [`SearchLoop`] – the per-agent search state machine.
//!
//! Drives one agent through
//! `Idle → Controlled → Armed → Airborne → Searching` and then iterates:
//!
//! 1. Check the shared [`CancelToken`] (iteration boundary only).
//! 2. Sample a waypoint uniformly from the configured bounds.
//! 3. Fly there; a [`MotionError`] is logged and the iteration restarts with
//!    a fresh waypoint, without capturing.
//! 4. Capture a frame; consecutive [`SensorError`]s beyond the configured
//!    bound fail the agent.
//! 5. Run the detector and record evidence unconditionally — every captured
//!    frame yields exactly one record, and a store failure never aborts the
//!    loop.
//! 6. Any region strictly above the confidence threshold ends the search in
//!    `Detected`.
//!
//! Whatever terminal state is reached — `Detected`, `Interrupted`, `Failed`,
//! or a rejected setup — teardown lands (if the agent ever got airborne),
//! disarms, and releases control, continuing past individual errors so the
//! agent is never left armed.

use std::sync::Arc;

use pyrescout_evidence::EvidenceStore;
use pyrescout_hal::FleetProvider;
use pyrescout_perception::Detector;
use pyrescout_types::{AgentPhase, ControlError, DetectionResult, MotionError, Vec3};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::SearchConfig;

/// How one agent's search ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The detector scored a region strictly above the threshold.
    Detected {
        /// Maximum confidence across the triggering frame's regions.
        score: f32,
        /// Agent position at capture time.
        position: Vec3,
    },
    /// The shared cancel token was armed.
    Interrupted,
    /// Too many consecutive sensor failures.
    Failed,
    /// The provider rejected a setup step; the agent never searched.
    Rejected,
}

/// A setup step the provider refused.  Fatal to this agent only.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error(transparent)]
    Motion(#[from] MotionError),
}

/// One agent's search state machine.  Construct, then [`run`][Self::run] to
/// completion; the loop owns no global state beyond its injected handles.
pub struct SearchLoop {
    agent: String,
    provider: Arc<dyn FleetProvider>,
    detector: Arc<dyn Detector>,
    store: Arc<dyn EvidenceStore>,
    config: SearchConfig,
    cancel: CancelToken,
    phase: AgentPhase,
}

impl SearchLoop {
    pub fn new(
        agent: impl Into<String>,
        provider: Arc<dyn FleetProvider>,
        detector: Arc<dyn Detector>,
        store: Arc<dyn EvidenceStore>,
        config: SearchConfig,
        cancel: CancelToken,
    ) -> Self {
        Self {
            agent: agent.into(),
            provider,
            detector,
            store,
            config,
            cancel,
            phase: AgentPhase::Idle,
        }
    }

    /// Current lifecycle phase, for observability.
    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    /// Drive the agent to a terminal state and tear it down.
    ///
    /// Teardown runs on every exit path, including setup rejection.
    pub async fn run(mut self) -> SearchOutcome {
        let outcome = match self.setup().await {
            Ok(()) => self.search().await,
            Err(e) => {
                warn!(agent = %self.agent, error = %e, "setup rejected; aborting this agent");
                SearchOutcome::Rejected
            }
        };
        self.teardown().await;
        outcome
    }

    // ── Setup: Idle → Controlled → Armed → Airborne ───────────────────────────

    async fn setup(&mut self) -> Result<(), SetupError> {
        self.provider.enable_control(&self.agent, true).await?;
        self.transition(AgentPhase::Controlled);
        self.provider.arm(&self.agent, true).await?;
        self.transition(AgentPhase::Armed);
        self.provider.takeoff(&self.agent).await?;
        self.transition(AgentPhase::Airborne);
        Ok(())
    }

    // ── Searching ─────────────────────────────────────────────────────────────

    async fn search(&mut self) -> SearchOutcome {
        self.transition(AgentPhase::Searching);
        info!(agent = %self.agent, "searching for fire");

        let mut consecutive_sensor_failures: u32 = 0;

        loop {
            // Interrupt is advisory and only honoured here, at the iteration
            // boundary: an armed token never cancels an in-flight capture or
            // its record step.
            if self.cancel.is_cancelled() {
                self.transition(AgentPhase::Interrupted);
                return SearchOutcome::Interrupted;
            }

            let waypoint = self.config.sample_waypoint();
            debug!(agent = %self.agent, target = %waypoint.position, "moving to waypoint");

            if let Err(e) = self.provider.move_to(&self.agent, &waypoint).await {
                // Non-fatal: resample next iteration, no capture for the
                // failed move.
                warn!(agent = %self.agent, error = %e, "motion failed; sampling a new waypoint");
                continue;
            }

            let frame = match self.provider.capture(&self.agent).await {
                Ok(frame) => {
                    consecutive_sensor_failures = 0;
                    frame
                }
                Err(e) => {
                    consecutive_sensor_failures += 1;
                    warn!(
                        agent = %self.agent,
                        error = %e,
                        consecutive_sensor_failures,
                        "frame capture failed"
                    );
                    if consecutive_sensor_failures > self.config.max_sensor_failures {
                        self.transition(AgentPhase::Failed);
                        return SearchOutcome::Failed;
                    }
                    continue;
                }
            };

            let result = match self.detector.infer(&frame).await {
                Ok(result) => result,
                Err(e) => {
                    // Degraded capture: keep the one-record-per-frame
                    // invariant by recording a negative.
                    warn!(agent = %self.agent, error = %e, "inference failed; recording frame as negative");
                    DetectionResult::empty()
                }
            };

            // The decision is made before the write so a store failure can
            // never change it.
            let positive = result.is_positive(self.config.confidence_threshold);
            if let Err(e) = self.store.record(&frame, &result) {
                warn!(agent = %self.agent, error = %e, "evidence write failed");
            }

            if positive {
                let score = result
                    .max_confidence()
                    .unwrap_or(self.config.confidence_threshold);
                info!(
                    agent = %self.agent,
                    score,
                    position = %frame.position,
                    "fire detected"
                );
                self.transition(AgentPhase::Detected);
                return SearchOutcome::Detected {
                    score,
                    position: frame.position,
                };
            }
        }
    }

    // ── Teardown ──────────────────────────────────────────────────────────────

    async fn teardown(&mut self) {
        let reached_airborne = !matches!(
            self.phase,
            AgentPhase::Idle | AgentPhase::Controlled | AgentPhase::Armed
        );
        teardown_best_effort(self.provider.as_ref(), &self.agent, reached_airborne).await;
        if reached_airborne {
            self.transition(AgentPhase::Landed);
        }
        self.transition(AgentPhase::Released);
    }

    fn transition(&mut self, next: AgentPhase) {
        debug!(agent = %self.agent, from = %self.phase, to = %next, "phase transition");
        self.phase = next;
    }
}

/// Land (when the agent ever got airborne), disarm, and release control,
/// logging and continuing past any individual failure.  Used by the search
/// loop on every exit path and by the orchestrator after a faulted agent
/// task.
pub async fn teardown_best_effort(provider: &dyn FleetProvider, agent: &str, land_first: bool) {
    if land_first {
        if let Err(e) = provider.land(agent).await {
            warn!(agent, error = %e, "land failed during teardown");
        }
    }
    if let Err(e) = provider.arm(agent, false).await {
        warn!(agent, error = %e, "disarm failed during teardown");
    }
    if let Err(e) = provider.enable_control(agent, false).await {
        warn!(agent, error = %e, "control release failed during teardown");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{CancellingDetector, FakeProvider, ScriptedDetector};
    use pyrescout_evidence::{Classification, MemoryEvidenceStore};
    use pyrescout_types::SensorError;

    fn small_config() -> SearchConfig {
        SearchConfig {
            max_sensor_failures: 2,
            ..SearchConfig::default()
        }
    }

    fn build_loop(
        provider: Arc<FakeProvider>,
        detector: Arc<dyn Detector>,
        store: Arc<MemoryEvidenceStore>,
        cancel: CancelToken,
    ) -> SearchLoop {
        SearchLoop::new(
            "A",
            provider,
            detector,
            store,
            small_config(),
            cancel,
        )
    }

    #[tokio::test]
    async fn detection_ends_search_with_positive_record_and_teardown() {
        let provider = Arc::new(FakeProvider::new("A"));
        provider.set_position(Vec3::new(4.0, -30.0, -12.0));
        let detector = Arc::new(ScriptedDetector::with_scores(&[0.75]));
        let store = Arc::new(MemoryEvidenceStore::new(0.6));
        let cancel = CancelToken::new();

        let outcome = build_loop(provider.clone(), detector, store.clone(), cancel)
            .run()
            .await;

        match outcome {
            SearchOutcome::Detected { score, position } => {
                assert_eq!(score, 0.75);
                assert_eq!(position, Vec3::new(4.0, -30.0, -12.0));
            }
            other => panic!("expected Detected, got {other:?}"),
        }

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].agent, "A");
        assert_eq!(
            records[0].classification,
            Classification::Positive { score: 0.75 }
        );
        assert_eq!(records[0].position, Vec3::new(4.0, -30.0, -12.0));

        let calls = provider.calls();
        assert_eq!(calls.land, 1, "landed exactly once");
        assert_eq!(calls.disarm, 1, "disarmed exactly once");
        assert_eq!(calls.release, 1);
    }

    #[tokio::test]
    async fn motion_error_resamples_without_capturing() {
        let provider = Arc::new(FakeProvider::new("A"));
        provider.script_move_failures(1);
        let cancel = CancelToken::new();
        // Negative result, then arm the token so the loop exits at the next
        // iteration boundary.
        let detector = Arc::new(CancellingDetector::new(cancel.clone()));
        let store = Arc::new(MemoryEvidenceStore::new(0.6));

        let outcome = build_loop(provider.clone(), detector, store.clone(), cancel)
            .run()
            .await;

        assert_eq!(outcome, SearchOutcome::Interrupted);
        let calls = provider.calls();
        assert_eq!(calls.moves, 2, "failed move plus the successful retry");
        assert_eq!(calls.captures, 1, "no capture for the failed move");
        assert_eq!(store.records().len(), 1);
        assert_eq!(calls.land, 1);
        assert_eq!(calls.disarm, 1);
    }

    #[tokio::test]
    async fn interrupt_after_record_is_seen_before_next_waypoint() {
        let provider = Arc::new(FakeProvider::new("A"));
        let cancel = CancelToken::new();
        let detector = Arc::new(CancellingDetector::new(cancel.clone()));
        let store = Arc::new(MemoryEvidenceStore::new(0.6));

        let outcome = build_loop(provider.clone(), detector, store.clone(), cancel)
            .run()
            .await;

        assert_eq!(outcome, SearchOutcome::Interrupted);
        // The iteration in flight when the token was armed still completed
        // its record step; no further waypoint was sampled.
        assert_eq!(store.records().len(), 1);
        let calls = provider.calls();
        assert_eq!(calls.moves, 1);
        assert_eq!(calls.land, 1);
        assert_eq!(calls.disarm, 1);
    }

    #[tokio::test]
    async fn consecutive_sensor_failures_fail_the_agent() {
        let provider = Arc::new(FakeProvider::new("A"));
        // max_sensor_failures = 2, so three consecutive failures exceed it.
        provider.script_capture_failures(3);
        let detector = Arc::new(ScriptedDetector::negative());
        let store = Arc::new(MemoryEvidenceStore::new(0.6));

        let outcome = build_loop(
            provider.clone(),
            detector,
            store.clone(),
            CancelToken::new(),
        )
        .run()
        .await;

        assert_eq!(outcome, SearchOutcome::Failed);
        assert!(store.records().len() == 0, "no frame was ever captured");
        let calls = provider.calls();
        assert_eq!(calls.land, 1, "failed agent is still landed");
        assert_eq!(calls.disarm, 1);
    }

    #[tokio::test]
    async fn sensor_failure_counter_resets_on_success() {
        let provider = Arc::new(FakeProvider::new("A"));
        let cancel = CancelToken::new();
        // Two failures (at the bound, not over it), one success that resets
        // the counter, then two more failures; the loop must survive all of
        // them and exit via the token instead of `Failed`.
        provider.script_capture_results(vec![
            Err(SensorError::NoFrame {
                agent: "A".to_string(),
            }),
            Err(SensorError::NoFrame {
                agent: "A".to_string(),
            }),
            Ok(()),
            Err(SensorError::NoFrame {
                agent: "A".to_string(),
            }),
            Err(SensorError::NoFrame {
                agent: "A".to_string(),
            }),
        ]);
        let detector = Arc::new(CancellingDetector::after(cancel.clone(), 2));
        let store = Arc::new(MemoryEvidenceStore::new(0.6));

        let outcome = build_loop(provider.clone(), detector, store.clone(), cancel.clone())
            .run()
            .await;

        // Four failures in total would exceed the bound of two if the
        // counter never reset; the success in the middle resets it, so both
        // failure runs stay at the bound and the loop exits via the token.
        assert_eq!(outcome, SearchOutcome::Interrupted);
        assert_eq!(store.records().len(), 2);
    }

    #[tokio::test]
    async fn score_equal_to_threshold_does_not_detect() {
        let provider = Arc::new(FakeProvider::new("A"));
        let cancel = CancelToken::new();
        let detector = Arc::new(ScriptedDetector::with_scores_then_cancel(
            &[0.6],
            cancel.clone(),
        ));
        let store = Arc::new(MemoryEvidenceStore::new(0.6));

        let outcome = build_loop(provider.clone(), detector, store.clone(), cancel)
            .run()
            .await;

        assert_eq!(outcome, SearchOutcome::Interrupted, "0.6 vs 0.6 is negative");
        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].classification, Classification::Negative);
    }

    #[tokio::test]
    async fn setup_rejection_aborts_without_landing() {
        let provider = Arc::new(FakeProvider::new("A"));
        provider.reject_setup();
        let detector = Arc::new(ScriptedDetector::negative());
        let store = Arc::new(MemoryEvidenceStore::new(0.6));

        let outcome = build_loop(
            provider.clone(),
            detector,
            store.clone(),
            CancelToken::new(),
        )
        .run()
        .await;

        assert_eq!(outcome, SearchOutcome::Rejected);
        let calls = provider.calls();
        assert_eq!(calls.land, 0, "never airborne, nothing to land");
        // Disarm and release are idempotent and still attempted.
        assert_eq!(calls.disarm, 1);
        assert_eq!(calls.release, 1);
        assert!(store.records().is_empty());
    }

    #[tokio::test]
    async fn store_failure_does_not_change_the_detection_decision() {
        let provider = Arc::new(FakeProvider::new("A"));
        let detector = Arc::new(ScriptedDetector::with_scores(&[0.9]));
        let store = Arc::new(crate::testutil::FailingStore);

        let outcome = build_loop_with_store(
            provider.clone(),
            detector,
            store,
            CancelToken::new(),
        )
        .run()
        .await;

        assert!(
            matches!(outcome, SearchOutcome::Detected { score, .. } if score == 0.9),
            "got {outcome:?}"
        );
        assert_eq!(provider.calls().land, 1);
    }

    fn build_loop_with_store(
        provider: Arc<FakeProvider>,
        detector: Arc<dyn Detector>,
        store: Arc<dyn EvidenceStore>,
        cancel: CancelToken,
    ) -> SearchLoop {
        SearchLoop::new("A", provider, detector, store, small_config(), cancel)
    }
}
