//! # Salvo Core
//!
//! Deterministic guided-projectile cluster simulation.
//!
//! Missiles are launched in clusters that share a target, a guidance
//! configuration and a time-to-hit deadline. Each missile flies an unguided
//! ejection phase, then homes onto its target under proportional navigation,
//! and finally arrives or is terminated.
//!
//! ## Architecture
//!
//! - **[`Simulation`](simulation::Simulation)**: top-level scheduler; refreshes
//!   targets at a fixed cadence and steps every active cluster
//! - **[`Cluster`](cluster::Cluster)**: owns its missiles, converts frame time
//!   into fixed simulation steps
//! - **[`Missile`](missile::Missile)**: per-missile phase state machine
//! - **[`Driver`](drivers::Driver)**: guidance strategy (ejection, proportional
//!   navigation) selected per phase by [`Parameters`](params::Parameters)
//! - **[`Target`](target::Target)**: host-implemented motion and hit test
//!
//! Everything runs on the caller's thread inside
//! [`Simulation::update_simulation`](simulation::Simulation::update_simulation).
//!
//! ## Usage
//!
//! ```
//! use std::rc::Rc;
//! use glam::Vec3;
//! use salvo_core::prelude::*;
//!
//! let mut sim = Simulation::default();
//! let target = TrackedTarget::new(Vec3::new(0.0, 0.0, 60.0), 1.0).shared();
//! let params = Rc::new(Parameters {
//!     ejection_velocity: 20.0,
//!     ..Parameters::default()
//! });
//!
//! sim.launch_cluster(LaunchRequest::new(target, params, 3, 2.0))?;
//!
//! for _ in 0..240 {
//!     sim.update_simulation(1.0 / 60.0);
//! }
//!
//! // Every missile arrived and its cluster was cleaned up.
//! assert_eq!(sim.cluster_count(), 0);
//! # Ok::<(), salvo_core::error::LaunchError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cluster;
pub mod drivers;
pub mod error;
pub mod missile;
pub mod params;
pub mod simulation;
pub mod spawn;
pub mod target;

/// The types most hosts need.
pub mod prelude {
    pub use crate::cluster::{ClusterId, LaunchRequest};
    pub use crate::drivers::DriverKind;
    pub use crate::error::LaunchError;
    pub use crate::missile::{MissileId, MissileState};
    pub use crate::params::{Parameters, SimulationConfig};
    pub use crate::simulation::Simulation;
    pub use crate::spawn::{RingSpawnField, SpawnLayout, SphereSpawnField};
    pub use crate::target::{SharedTarget, Target, TrackedTarget};
}

#[cfg(test)]
mod tests;
