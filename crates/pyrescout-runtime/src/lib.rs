//! `pyrescout-runtime` – fleet search execution engine.
//!
//! # Modules
//!
//! - [`search`] – [`SearchLoop`][search::SearchLoop]: the per-agent state
//!   machine driving waypoint sampling, motion, capture, inference, and
//!   evidence recording until detection, interrupt, or failure.
//! - [`orchestrator`] – [`FleetOrchestrator`][orchestrator::FleetOrchestrator]:
//!   owns the agent set, runs one search task per agent, and guarantees every
//!   airborne agent is landed and disarmed before returning.
//! - [`cancel`] – [`CancelToken`][cancel::CancelToken]: the shared advisory
//!   interrupt flag, checked only at iteration boundaries.
//! - [`config`] – [`SearchConfig`][config::SearchConfig] and
//!   [`SearchBounds`][config::SearchBounds]: waypoint sampling region, transit
//!   speed, confidence threshold, and the sensor-failure bound.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: tracing
//!   subscriber setup with optional OTLP span export.
//!
//! All collaborators (provider, detector, store, configuration, cancel flag)
//! are injected; the runtime holds no process-wide singletons.

pub mod cancel;
pub mod config;
pub mod orchestrator;
pub mod search;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testutil;

pub use cancel::CancelToken;
pub use config::{SearchBounds, SearchConfig};
pub use orchestrator::FleetOrchestrator;
pub use search::{SearchLoop, SearchOutcome, teardown_best_effort};
pub use telemetry::{TracerProviderGuard, init_tracing};
