//! Scenario, determinism and integration tests.
//!
//! - `determinism.rs`: frame-size independence and seeded spawn replay
//! - `integration.rs`: end-to-end launches through [`crate::simulation::Simulation`]
//! - `helpers.rs`: shared targets, launch requests and tracing setup

pub mod helpers;
