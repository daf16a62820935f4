//! A group of missiles launched together.
//!
//! A [`Cluster`] owns its missiles by value and shares one target, one set of
//! [`Parameters`] and one time-to-hit deadline between them. It converts the
//! variable frame time it is fed into fixed simulation steps, so guidance
//! behaves the same whatever the host's frame rate.
//!
//! Clusters are created through
//! [`Simulation::launch_cluster`](crate::simulation::Simulation::launch_cluster)
//! from a [`LaunchRequest`].
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use glam::Vec3;
//! use salvo_core::cluster::{Cluster, ClusterId, LaunchRequest};
//! use salvo_core::params::Parameters;
//! use salvo_core::target::TrackedTarget;
//!
//! let target = TrackedTarget::new(Vec3::new(0.0, 0.0, 100.0), 1.0).shared();
//! let request = LaunchRequest::new(target, Rc::new(Parameters::default()), 4, 5.0);
//! let mut cluster = Cluster::launch(ClusterId::new(1), request).unwrap();
//!
//! // Two fixed 25 ms steps fit into 60 ms; the rest stays buffered.
//! assert_eq!(cluster.update_simulation(0.06), 2);
//! assert!((cluster.time_since_launch() - 0.05).abs() < 1e-6);
//! ```

use std::fmt;
use std::rc::Rc;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::LaunchError;
use crate::missile::{AtTargetFn, Kinematics, Missile, MissileId, StepContext};
use crate::params::{drain_fixed_steps, Drain, Parameters, MAX_STEPS_PER_FRAME};
use crate::spawn::SpawnLayout;
use crate::target::SharedTarget;

// =============================================================================
// Cluster Id
// =============================================================================

/// Unique identifier for a cluster.
///
/// Assigned by the [`Simulation`](crate::simulation::Simulation) in launch
/// order and never reused, so ids also order clusters by launch time.
///
/// # Example
///
/// ```
/// use salvo_core::cluster::ClusterId;
///
/// let first = ClusterId::new(1);
/// let second = ClusterId::new(2);
///
/// assert!(first < second);
/// assert_eq!(second.as_u64(), 2);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterId(u64);

impl ClusterId {
    /// Creates a `ClusterId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClusterId({})", self.0)
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ClusterId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<ClusterId> for u64 {
    fn from(id: ClusterId) -> Self {
        id.0
    }
}

// =============================================================================
// Launch Request
// =============================================================================

/// Everything needed to launch a cluster.
///
/// Built with [`LaunchRequest::new`] and refined with the `with_*` methods.
pub struct LaunchRequest {
    /// Launcher transform. Spawn offsets are transformed as points, spawn
    /// directions as vectors.
    pub origin: Mat4,
    /// Launcher velocity, inherited by every missile.
    pub origin_velocity: Vec3,
    /// Number of missiles. Must be at least one.
    pub missile_count: usize,
    /// Target shared by every missile of the cluster.
    pub target: SharedTarget,
    /// Seconds until the missiles should reach the target.
    pub time_to_hit: f32,
    /// Guidance configuration.
    pub parameters: Rc<Parameters>,
    /// Spawn placement.
    pub spawn: SpawnLayout,
    /// Arrival notification.
    pub at_target: Option<AtTargetFn>,
}

impl LaunchRequest {
    /// A launch from the world origin, at rest, with every missile at the
    /// origin ejected along `+Z`.
    #[must_use]
    pub fn new(
        target: SharedTarget,
        parameters: Rc<Parameters>,
        missile_count: usize,
        time_to_hit: f32,
    ) -> Self {
        Self {
            origin: Mat4::IDENTITY,
            origin_velocity: Vec3::ZERO,
            missile_count,
            target,
            time_to_hit,
            parameters,
            spawn: SpawnLayout::Origin,
            at_target: None,
        }
    }

    /// Sets the launcher transform and velocity.
    #[must_use]
    pub fn with_origin(mut self, origin: Mat4, origin_velocity: Vec3) -> Self {
        self.origin = origin;
        self.origin_velocity = origin_velocity;
        self
    }

    /// Sets the spawn layout.
    #[must_use]
    pub fn with_spawn(mut self, spawn: SpawnLayout) -> Self {
        self.spawn = spawn;
        self
    }

    /// Sets the arrival callback.
    #[must_use]
    pub fn on_at_target(mut self, callback: impl FnMut(&Missile) + 'static) -> Self {
        self.at_target = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for LaunchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaunchRequest")
            .field("origin", &self.origin)
            .field("origin_velocity", &self.origin_velocity)
            .field("missile_count", &self.missile_count)
            .field("time_to_hit", &self.time_to_hit)
            .field("parameters", &self.parameters)
            .field("spawn", &self.spawn)
            .field("at_target", &self.at_target.is_some())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Cluster
// =============================================================================

/// Missiles sharing a target, parameters and a hit deadline.
pub struct Cluster {
    id: ClusterId,
    missiles: Vec<Missile>,
    target: SharedTarget,
    parameters: Rc<Parameters>,
    time_to_hit: f32,
    time_since_launch: f32,
    accumulator: f32,
    is_terminated: bool,
    at_target: Option<AtTargetFn>,
}

impl Cluster {
    /// Builds the cluster's missiles from `request`.
    ///
    /// Every missile starts in `Ejection` at its transformed spawn offset,
    /// moving at `origin_velocity + direction * ejection_velocity`.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError`] for an empty cluster, an invalid time to hit,
    /// invalid parameters, or spawn data that does not match the missile count.
    pub fn launch(id: ClusterId, request: LaunchRequest) -> Result<Self, LaunchError> {
        let LaunchRequest {
            origin,
            origin_velocity,
            missile_count,
            target,
            time_to_hit,
            parameters,
            spawn,
            at_target,
        } = request;

        if missile_count == 0 {
            return Err(LaunchError::EmptyCluster);
        }
        if !(time_to_hit.is_finite() && time_to_hit >= 0.0) {
            return Err(LaunchError::InvalidTimeToHit(time_to_hit));
        }
        parameters.validate()?;
        let points = spawn.into_points(missile_count)?;

        let forward = origin.transform_vector3(Vec3::Z).try_normalize().unwrap_or(Vec3::Z);
        let ctx = StepContext {
            target: &*target,
            parameters: &parameters,
            time_to_hit,
            at_target: None,
        };
        let missiles: Vec<Missile> = points
            .iter()
            .enumerate()
            .map(|(index, point)| {
                let position = origin.transform_point3(point.offset);
                let direction = origin
                    .transform_vector3(point.direction)
                    .try_normalize()
                    .unwrap_or(forward);
                let velocity = origin_velocity + direction * parameters.ejection_velocity;
                Missile::launch(
                    MissileId::new(id, index),
                    Kinematics::new(position, velocity),
                    &ctx,
                )
            })
            .collect();

        Ok(Self {
            id,
            missiles,
            target,
            parameters,
            time_to_hit,
            time_since_launch: 0.0,
            accumulator: 0.0,
            is_terminated: false,
            at_target,
        })
    }

    /// Feeds `frame_dt` seconds into the accumulator and runs every whole
    /// simulation step it now holds. Returns the number of steps run.
    ///
    /// Negative or NaN frame times count as zero. At most
    /// [`MAX_STEPS_PER_FRAME`] steps run per call; time beyond that is dropped
    /// with a warning.
    pub fn update_simulation(&mut self, frame_dt: f32) -> usize {
        self.accumulator += frame_dt.max(0.0);

        let step = self.parameters.simulation_step;
        let Drain { steps, dropped } = drain_fixed_steps(&mut self.accumulator, step);
        if dropped > 0.0 {
            warn!(
                cluster = %self.id,
                dropped_seconds = dropped,
                max_steps = MAX_STEPS_PER_FRAME,
                "frame exceeds step budget, dropping time"
            );
        }
        for _ in 0..steps {
            self.simulate_step(step);
        }

        if steps > 0 {
            trace!(cluster = %self.id, steps, "drained fixed steps");
        }
        self.is_terminated = self.missiles.iter().all(Missile::is_terminated);
        steps
    }

    fn simulate_step(&mut self, step: f32) {
        // The target is borrowed per query, never across the at-target
        // callback, so the callback may mutate it.
        let mut ctx = StepContext {
            target: &*self.target,
            parameters: &self.parameters,
            time_to_hit: self.time_to_hit,
            at_target: self.at_target.as_mut(),
        };
        for missile in self.missiles.iter_mut().filter(|m| !m.is_terminated()) {
            missile.update_execution(step, &mut ctx);
        }

        self.time_to_hit -= step;
        self.time_since_launch += step;
        self.is_terminated = self.missiles.iter().all(Missile::is_terminated);
    }

    /// Terminates every missile immediately.
    pub fn terminate_all(&mut self) {
        for missile in &mut self.missiles {
            missile.terminate();
        }
        self.is_terminated = true;
    }

    pub(crate) fn missile_mut(&mut self, index: usize) -> Option<&mut Missile> {
        self.missiles.get_mut(index)
    }

    /// Identifier of this cluster.
    #[must_use]
    pub fn id(&self) -> ClusterId {
        self.id
    }

    /// All missiles, in spawn order. Terminated missiles stay in place.
    #[must_use]
    pub fn missiles(&self) -> &[Missile] {
        &self.missiles
    }

    /// Missile at `index`, if in range.
    #[must_use]
    pub fn missile(&self, index: usize) -> Option<&Missile> {
        self.missiles.get(index)
    }

    /// Seconds left until the hit deadline. Goes negative once it passes.
    #[must_use]
    pub fn time_to_hit(&self) -> f32 {
        self.time_to_hit
    }

    /// Simulated seconds since launch.
    #[must_use]
    pub fn time_since_launch(&self) -> f32 {
        self.time_since_launch
    }

    /// `true` once every missile is terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.is_terminated
    }

    /// Shared guidance configuration.
    #[must_use]
    pub fn parameters(&self) -> &Rc<Parameters> {
        &self.parameters
    }

    /// Shared target.
    #[must_use]
    pub fn target(&self) -> &SharedTarget {
        &self.target
    }
}

impl fmt::Debug for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cluster")
            .field("id", &self.id)
            .field("missiles", &self.missiles.len())
            .field("time_to_hit", &self.time_to_hit)
            .field("time_since_launch", &self.time_since_launch)
            .field("is_terminated", &self.is_terminated)
            .finish_non_exhaustive()
    }
}
