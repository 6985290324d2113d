//! `pyrescout-hal` – the motion & sensor provider seam.
//!
//! The search runtime never talks to a simulator directly; it goes through
//! the [`FleetProvider`][provider::FleetProvider] trait.  A production
//! deployment implements the trait against the external simulation backend,
//! while [`SimProvider`][sim::SimProvider] gives headless tests and CI an
//! in-process stand-in with the same seven operations.

pub mod provider;
pub mod sim;

pub use provider::FleetProvider;
pub use sim::SimProvider;
