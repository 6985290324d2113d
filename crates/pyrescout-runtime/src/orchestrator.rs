//! [`FleetOrchestrator`] – owns the agent set and guarantees teardown.
//!
//! Spawns one tokio task per agent, each running a [`SearchLoop`] to its
//! terminal state, then collects every outcome.  The central correctness
//! property lives here: every agent that got airborne is landed and disarmed
//! before [`run`][FleetOrchestrator::run] returns, even when an agent task
//! panics — the orchestrator performs the best-effort teardown itself for a
//! faulted task, since the loop's own teardown never ran.
//!
//! All collaborators are injected at construction; the orchestrator holds no
//! process-wide state.

use std::collections::HashMap;
use std::sync::Arc;

use pyrescout_evidence::EvidenceStore;
use pyrescout_hal::FleetProvider;
use pyrescout_perception::Detector;
use tracing::{error, info};

use crate::cancel::CancelToken;
use crate::config::SearchConfig;
use crate::search::{SearchLoop, SearchOutcome, teardown_best_effort};

/// Top-level coordinator for one fleet search run.
pub struct FleetOrchestrator {
    agents: Vec<String>,
    provider: Arc<dyn FleetProvider>,
    detector: Arc<dyn Detector>,
    store: Arc<dyn EvidenceStore>,
    config: SearchConfig,
    cancel: CancelToken,
}

impl FleetOrchestrator {
    pub fn new(
        agents: Vec<String>,
        provider: Arc<dyn FleetProvider>,
        detector: Arc<dyn Detector>,
        store: Arc<dyn EvidenceStore>,
        config: SearchConfig,
        cancel: CancelToken,
    ) -> Self {
        Self {
            agents,
            provider,
            detector,
            store,
            config,
            cancel,
        }
    }

    /// A handle to the shared interrupt flag, for wiring to an operator
    /// signal handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run every agent's search loop concurrently to completion and return
    /// each agent's terminal outcome.
    pub async fn run(self) -> HashMap<String, SearchOutcome> {
        info!(fleet_size = self.agents.len(), "starting fleet search");

        let mut handles = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let search = SearchLoop::new(
                agent.clone(),
                Arc::clone(&self.provider),
                Arc::clone(&self.detector),
                Arc::clone(&self.store),
                self.config.clone(),
                self.cancel.clone(),
            );
            handles.push((agent.clone(), tokio::spawn(search.run())));
        }

        let mut outcomes = HashMap::with_capacity(handles.len());
        for (agent, handle) in handles {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    // The loop's own teardown never ran; do it here so the
                    // agent is not left armed.
                    error!(agent, error = %join_err, "agent task faulted; forcing teardown");
                    teardown_best_effort(self.provider.as_ref(), &agent, true).await;
                    SearchOutcome::Failed
                }
            };
            info!(agent, ?outcome, "agent finished");
            outcomes.insert(agent, outcome);
        }

        info!("fleet search complete; all agents released");
        outcomes
    }
}
