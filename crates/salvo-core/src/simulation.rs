//! Top-level scheduler owning every active cluster.
//!
//! [`Simulation::update_simulation`] is the single per-frame entry point. Each
//! call runs three phases in order:
//!
//! 1. **TARGETS**: the frame time (scaled by `time_scale`) feeds a fixed-interval
//!    accumulator, and every distinct target referenced by an active cluster is
//!    refreshed once per whole interval it holds.
//! 2. **CLUSTERS**: every active cluster drains its own fixed-step accumulator.
//! 3. **CLEANUP**: clusters whose missiles are all terminated are removed in one
//!    batch after the pass, never while iterating.
//!
//! # Determinism
//!
//! There is no hidden state besides the accumulators: the same launches fed
//! the same total frame time in frames of any size produce the same missile
//! trajectories, as long as target refreshes fall on the same steps.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use glam::Vec3;
//! use salvo_core::prelude::*;
//!
//! let mut sim = Simulation::default();
//! let target = TrackedTarget::new(Vec3::new(0.0, 0.0, 100.0), 1.0).shared();
//! let params = Rc::new(Parameters::default());
//!
//! let id = sim
//!     .launch_cluster(LaunchRequest::new(target, params, 2, 5.0))
//!     .unwrap();
//!
//! // Advance exactly the pursuit activation time.
//! for _ in 0..14 {
//!     sim.update_simulation(0.025);
//! }
//!
//! let cluster = sim.cluster(id).unwrap();
//! assert!(cluster.missiles().iter().all(|m| m.state() == MissileState::Pursuit));
//! ```

use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::cluster::{Cluster, ClusterId, LaunchRequest};
use crate::error::{ConfigError, LaunchError};
use crate::missile::{Missile, MissileId};
use crate::params::{drain_fixed_steps, Drain, SimulationConfig, MAX_STEPS_PER_FRAME};
use crate::target::SharedTarget;

// =============================================================================
// Simulation
// =============================================================================

/// Owns the active clusters and the set of distinct targets they reference.
///
/// Clusters are kept in launch order. Targets are deduplicated by identity, so
/// a target shared by several clusters is refreshed once per interval.
///
/// Targets are borrowed mutably during the refresh phase of
/// [`Simulation::update_simulation`] and immutably while clusters step; the
/// host must not hold a `RefCell` borrow of a target across that call.
pub struct Simulation {
    config: SimulationConfig,
    clusters: Vec<Cluster>,
    targets: Vec<SharedTarget>,
    target_accumulator: f32,
    next_cluster_id: u64,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("clusters", &self.clusters)
            .field("targets", &format!("[{} targets]", self.targets.len()))
            .field("target_accumulator", &self.target_accumulator)
            .field("next_cluster_id", &self.next_cluster_id)
            .finish()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            config: SimulationConfig::default(),
            clusters: Vec::new(),
            targets: Vec::new(),
            target_accumulator: 0.0,
            next_cluster_id: 1,
        }
    }
}

impl Simulation {
    /// Creates an empty simulation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `config` fails validation.
    ///
    /// # Example
    ///
    /// ```
    /// use salvo_core::params::SimulationConfig;
    /// use salvo_core::simulation::Simulation;
    ///
    /// let sim = Simulation::new(SimulationConfig {
    ///     time_scale: 2.0,
    ///     ..SimulationConfig::default()
    /// })
    /// .unwrap();
    /// assert_eq!(sim.cluster_count(), 0);
    /// assert_eq!(sim.time_scale(), 2.0);
    /// ```
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Launches a cluster and returns its id.
    ///
    /// The cluster's missiles exist (in `Ejection`, with primed drivers) as soon
    /// as this returns; they first move on the next update.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError`] if the request is rejected. A rejected launch
    /// does not consume a cluster id.
    pub fn launch_cluster(&mut self, request: LaunchRequest) -> Result<ClusterId, LaunchError> {
        let id = ClusterId::new(self.next_cluster_id);
        let cluster = Cluster::launch(id, request)?;
        self.next_cluster_id += 1;

        debug!(
            cluster = %id,
            missiles = cluster.missiles().len(),
            time_to_hit = cluster.time_to_hit(),
            "cluster launched"
        );

        if !self.targets.iter().any(|t| same_target(t, cluster.target())) {
            self.targets.push(Rc::clone(cluster.target()));
        }
        self.clusters.push(cluster);
        Ok(id)
    }

    /// Advances the whole simulation by one host frame.
    ///
    /// Negative frame times count as zero. Each phase drains at most
    /// [`MAX_STEPS_PER_FRAME`] fixed steps per call.
    pub fn update_simulation(&mut self, frame_dt: f32) {
        let dt = frame_dt.max(0.0) * self.config.time_scale;
        // inf * 0 when paused
        let dt = if dt.is_nan() { 0.0 } else { dt };

        // Phase 1: target refresh at a fixed cadence
        let interval = self.config.target_update_interval;
        self.target_accumulator += dt;
        let Drain { steps, dropped } = drain_fixed_steps(&mut self.target_accumulator, interval);
        if dropped > 0.0 {
            warn!(
                dropped_seconds = dropped,
                max_steps = MAX_STEPS_PER_FRAME,
                "frame exceeds target refresh budget, dropping time"
            );
        }
        for _ in 0..steps {
            for target in &self.targets {
                target.borrow_mut().update(interval);
            }
        }

        // Phase 2: clusters
        for cluster in &mut self.clusters {
            cluster.update_simulation(dt);
        }

        // Phase 3: batched removal of finished clusters
        let before = self.clusters.len();
        self.clusters.retain(|cluster| {
            if cluster.is_terminated() {
                debug!(
                    cluster = %cluster.id(),
                    time_since_launch = cluster.time_since_launch(),
                    "cluster terminated, removing"
                );
                false
            } else {
                true
            }
        });
        if self.clusters.len() != before {
            self.rebuild_targets();
        }
    }

    /// Terminates one missile. Its cluster keeps it, in `Terminated`, until the
    /// whole cluster is removed.
    ///
    /// Returns `false` if no such missile is active.
    pub fn remove_missile(&mut self, id: MissileId) -> bool {
        let Some(cluster) = self.cluster_mut(id.cluster()) else {
            return false;
        };
        match cluster.missile_mut(id.index()) {
            Some(missile) => {
                missile.terminate();
                true
            }
            None => false,
        }
    }

    /// Terminates and removes a cluster immediately.
    ///
    /// Returns `false` if no such cluster is active. Other clusters, including
    /// those sharing its target, are unaffected.
    pub fn remove_cluster(&mut self, id: ClusterId) -> bool {
        let Ok(index) = self.clusters.binary_search_by_key(&id, Cluster::id) else {
            return false;
        };
        let mut cluster = self.clusters.remove(index);
        cluster.terminate_all();
        debug!(cluster = %id, "cluster removed");
        self.rebuild_targets();
        true
    }

    /// Terminates and removes every cluster.
    pub fn remove_all(&mut self) {
        for cluster in &mut self.clusters {
            cluster.terminate_all();
        }
        debug!(clusters = self.clusters.len(), "all clusters removed");
        self.clusters.clear();
        self.targets.clear();
    }

    fn rebuild_targets(&mut self) {
        let mut targets: Vec<SharedTarget> = Vec::with_capacity(self.targets.len());
        for cluster in &self.clusters {
            if !targets.iter().any(|t| same_target(t, cluster.target())) {
                targets.push(Rc::clone(cluster.target()));
            }
        }
        self.targets = targets;
    }

    fn cluster_mut(&mut self, id: ClusterId) -> Option<&mut Cluster> {
        let index = self.clusters.binary_search_by_key(&id, Cluster::id).ok()?;
        self.clusters.get_mut(index)
    }

    /// The active cluster with `id`.
    #[must_use]
    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        let index = self.clusters.binary_search_by_key(&id, Cluster::id).ok()?;
        self.clusters.get(index)
    }

    /// The missile with `id`, if its cluster is still active.
    #[must_use]
    pub fn missile(&self, id: MissileId) -> Option<&Missile> {
        self.cluster(id.cluster())?.missile(id.index())
    }

    /// Active clusters in launch order.
    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> + '_ {
        self.clusters.iter()
    }

    /// Number of active clusters.
    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Number of missiles across active clusters, terminated ones included.
    #[must_use]
    pub fn missile_count(&self) -> usize {
        self.clusters.iter().map(|c| c.missiles().len()).sum()
    }

    /// Number of distinct targets referenced by active clusters.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Current configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Multiplier applied to every frame time.
    #[must_use]
    pub fn time_scale(&self) -> f32 {
        self.config.time_scale
    }

    /// Sets the time scale. Negative and non-finite values pause the
    /// simulation.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }
}

/// Identity comparison of shared targets, ignoring vtable pointers.
fn same_target(a: &SharedTarget, b: &SharedTarget) -> bool {
    std::ptr::eq(Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>())
}

// =============================================================================
// Tests
// =============================================================================
