//! A single guided projectile and its phase state machine.
//!
//! Missiles live inside a [`Cluster`](crate::cluster::Cluster) and are only
//! ever stepped by it. Instead of pointing back at their cluster, they carry a
//! [`MissileId`] and receive the shared cluster data (target, parameters, time
//! to hit, at-target callback) through a [`StepContext`] for each step.
//!
//! # Phases
//!
//! ```text
//! Ejection ──activation time──▶ Pursuit ──hit / deadline──▶ AtTarget ──▶ Terminated
//!     │                            │                           │            ▲
//!     └────────────────────────────┴──────── terminate() ──────┴────────────┘
//! ```
//!
//! `Intercepted` is reserved for hosts modelling counter-fire. Nothing in this
//! crate enters it; a missile found in it is held in place until terminated.
//!
//! # Step order
//!
//! 1. Build the ejection driver if the missile has none yet.
//! 2. Integrate `position += velocity * dt` with the velocity set last step.
//! 3. Evaluate phase transitions.
//! 4. Let the active driver set the velocity for the next step.
//! 5. Advance `time_since_launch`.

use std::cell::RefCell;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cluster::ClusterId;
use crate::drivers::{Driver, DriverOutcome, GuidanceInput};
use crate::params::{Parameters, TIME_EPSILON};
use crate::target::{HitLocation, HitProbe, Target};

/// Callback invoked when a missile reaches its target.
///
/// Runs synchronously inside the step, with the missile already in
/// [`MissileState::AtTarget`] and its hit location recorded. No borrow of the
/// cluster's target is held while it runs, so it may damage, move or respawn
/// that target; missiles stepped after it in the same step see the change.
pub type AtTargetFn = Box<dyn FnMut(&Missile)>;

// =============================================================================
// Identifiers and State
// =============================================================================

/// Handle of a missile: its cluster plus its index inside the cluster.
///
/// Indices are stable for the life of the cluster; missiles are never removed
/// from a cluster individually.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MissileId {
    cluster: ClusterId,
    index: usize,
}

impl MissileId {
    /// Creates a handle for missile `index` of `cluster`.
    #[must_use]
    pub const fn new(cluster: ClusterId, index: usize) -> Self {
        Self { cluster, index }
    }

    /// The owning cluster.
    #[must_use]
    pub const fn cluster(self) -> ClusterId {
        self.cluster
    }

    /// Index inside the owning cluster.
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl fmt::Debug for MissileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MissileId({}:{})", self.cluster, self.index)
    }
}

impl fmt::Display for MissileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cluster, self.index)
    }
}

/// Flight phase of a missile.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MissileState {
    /// Unguided flight on the launch impulse.
    Ejection,
    /// Homing under the pursuit driver.
    Pursuit,
    /// Arrived. Held here until terminated.
    AtTarget,
    /// Reserved for external interception. Held until terminated.
    Intercepted,
    /// Finished. Never stepped again.
    Terminated,
}

/// Position and velocity of a missile.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// World-space position.
    pub position: Vec3,
    /// World-space velocity.
    pub velocity: Vec3,
}

impl Kinematics {
    /// Creates kinematics from a position and a velocity.
    #[must_use]
    pub const fn new(position: Vec3, velocity: Vec3) -> Self {
        Self { position, velocity }
    }
}

// =============================================================================
// Step Context
// =============================================================================

/// Cluster-owned data a missile reads during one step.
pub(crate) struct StepContext<'a> {
    pub target: &'a RefCell<dyn Target>,
    pub parameters: &'a Parameters,
    pub time_to_hit: f32,
    pub at_target: Option<&'a mut AtTargetFn>,
}

impl StepContext<'_> {
    fn guidance(&self) -> GuidanceInput<'_> {
        let target = self.target.borrow();
        GuidanceInput {
            target_position: target.position(),
            target_velocity: target.velocity(),
            target_acceleration: target.acceleration(),
            time_to_hit: self.time_to_hit,
            parameters: self.parameters,
        }
    }
}

// =============================================================================
// Missile
// =============================================================================

/// A single projectile.
#[derive(Debug)]
pub struct Missile {
    id: MissileId,
    body: Kinematics,
    state: MissileState,
    time_since_launch: f32,
    driver: Option<Driver>,
    hit_location: Option<HitLocation>,
    impact_velocity: Option<Vec3>,
}

impl Missile {
    fn new(id: MissileId, body: Kinematics) -> Self {
        Self {
            id,
            body,
            state: MissileState::Ejection,
            time_since_launch: 0.0,
            driver: None,
            hit_location: None,
            impact_velocity: None,
        }
    }

    /// Creates a missile in `Ejection` and primes its ejection driver with a
    /// zero-length step.
    pub(crate) fn launch(id: MissileId, body: Kinematics, ctx: &StepContext<'_>) -> Self {
        let mut missile = Self::new(id, body);
        let mut driver = ctx.parameters.ejection_driver.create(&missile);
        driver.step(&mut missile.body, &ctx.guidance(), 0.0);
        missile.driver = Some(driver);
        missile
    }

    #[cfg(test)]
    pub(crate) fn detached(body: Kinematics) -> Self {
        Self::new(MissileId::new(ClusterId::new(0), 0), body)
    }

    /// Handle of this missile.
    #[must_use]
    pub fn id(&self) -> MissileId {
        self.id
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    /// Velocity that will be integrated on the next step.
    #[must_use]
    pub fn velocity(&self) -> Vec3 {
        self.body.velocity
    }

    /// Position and velocity together.
    #[must_use]
    pub fn kinematics(&self) -> Kinematics {
        self.body
    }

    /// Current phase.
    #[must_use]
    pub fn state(&self) -> MissileState {
        self.state
    }

    /// Simulated time since launch, in seconds.
    #[must_use]
    pub fn time_since_launch(&self) -> f32 {
        self.time_since_launch
    }

    /// The active driver, if any.
    #[must_use]
    pub fn driver(&self) -> Option<&Driver> {
        self.driver.as_ref()
    }

    /// Where the target was struck, once the missile is `AtTarget`.
    #[must_use]
    pub fn hit_location(&self) -> Option<HitLocation> {
        self.hit_location
    }

    /// Velocity at the moment of arrival, before it was zeroed.
    #[must_use]
    pub fn impact_velocity(&self) -> Option<Vec3> {
        self.impact_velocity
    }

    /// `true` once the missile has been terminated.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.state == MissileState::Terminated
    }

    /// Ends the missile immediately, from any phase.
    pub fn terminate(&mut self) {
        self.driver = None;
        self.state = MissileState::Terminated;
    }

    /// Advances the missile by `dt` seconds.
    ///
    /// A no-op for terminated and intercepted missiles.
    pub(crate) fn update_execution(&mut self, dt: f32, ctx: &mut StepContext<'_>) {
        if matches!(
            self.state,
            MissileState::Terminated | MissileState::Intercepted
        ) {
            return;
        }

        let params = ctx.parameters;
        if self.driver.is_none() && self.state == MissileState::Ejection {
            self.driver = Some(params.ejection_driver.create(self));
        }

        self.body.position += self.body.velocity * dt;

        if self.state == MissileState::Ejection
            && self.time_since_launch + dt + TIME_EPSILON >= params.pursuit_activation_time
        {
            self.state = MissileState::Pursuit;
            self.driver = Some(params.pursuit_driver.create(self));
            if params.debugging_aid {
                debug!(
                    missile = %self.id,
                    time_since_launch = self.time_since_launch + dt,
                    "ejection -> pursuit"
                );
            }
        }

        if self.state == MissileState::Pursuit {
            self.check_arrival(dt, ctx);
        }

        if self.state == MissileState::AtTarget && params.terminate_when_at_target {
            self.state = MissileState::Terminated;
            if params.debugging_aid {
                debug!(missile = %self.id, "at target -> terminated");
            }
        }

        if let Some(driver) = self.driver.as_mut() {
            let outcome = driver.step(&mut self.body, &ctx.guidance(), dt);
            if outcome == DriverOutcome::DegenerateLineOfSight && params.debugging_aid {
                debug!(
                    missile = %self.id,
                    position = ?self.body.position,
                    "line of sight undefined, guidance skipped"
                );
            }
        }

        self.time_since_launch += dt;
    }

    /// `Pursuit -> AtTarget` on a hit, or on an expired deadline when hit-time
    /// correction is on.
    fn check_arrival(&mut self, dt: f32, ctx: &mut StepContext<'_>) {
        let params = ctx.parameters;
        let target_cell = ctx.target;
        let target = target_cell.borrow();

        let hit = if params.pursuit_hit_time_correction && ctx.time_to_hit <= 0.0 {
            let to_target = target.position() - self.body.position;
            let closure = if dt > 0.0 {
                target.velocity() + to_target / dt
            } else {
                target.velocity()
            };
            self.body.velocity = closure;
            if params.debugging_aid {
                debug!(
                    missile = %self.id,
                    time_to_hit = ctx.time_to_hit,
                    distance = to_target.length(),
                    "hit time reached, forcing hit"
                );
            }
            Some(HitLocation {
                point: target.position(),
                normal: (-to_target).try_normalize().unwrap_or(Vec3::Z),
            })
        } else {
            target.hit_test(&HitProbe {
                position: self.body.position,
                velocity: self.body.velocity,
                step: dt,
                at_target_distance: params.at_target_distance,
            })
        };
        drop(target);

        let Some(location) = hit else {
            return;
        };

        self.state = MissileState::AtTarget;
        self.hit_location = Some(location);
        self.impact_velocity = Some(self.body.velocity);
        self.body.velocity = Vec3::ZERO;
        self.driver = None;

        if params.debugging_aid {
            debug!(
                missile = %self.id,
                time_since_launch = self.time_since_launch + dt,
                time_to_hit = ctx.time_to_hit,
                point = ?location.point,
                "pursuit -> at target"
            );
        }

        if let Some(callback) = ctx.at_target.as_deref_mut() {
            callback(self);
        }
    }
}
