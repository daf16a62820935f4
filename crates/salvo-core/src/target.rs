//! The target capability consumed by the simulation.
//!
//! Targets are owned by the host. Clusters hold them through [`SharedTarget`]
//! and only ever read from them while stepping missiles; the scheduler is the
//! one caller of [`Target::update`], which it drives at a fixed cadence so that
//! finite-difference velocity estimates stay stable regardless of frame rate.
//!
//! [`TrackedTarget`] covers the common case of a world object the host moves
//! around between frames, hit-tested as a bounding sphere.
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use salvo_core::target::{Target, TrackedTarget};
//!
//! let mut target = TrackedTarget::new(Vec3::ZERO, 2.0);
//! target.set_position(Vec3::new(0.0, 0.0, 1.0));
//! target.update(0.1);
//!
//! assert!((target.velocity().z - 10.0).abs() < 1e-4);
//! assert_eq!(target.acceleration(), Vec3::ZERO);
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// A target shared between the host and any number of clusters.
///
/// The simulation borrows it immutably while stepping a cluster and mutably
/// only inside [`Simulation::update_simulation`](crate::simulation::Simulation::update_simulation)
/// for the fixed-cadence refresh.
pub type SharedTarget = Rc<RefCell<dyn Target>>;

/// Motion snapshot and hit test of something missiles home onto.
pub trait Target {
    /// Reference point missiles steer toward.
    fn position(&self) -> Vec3;

    /// Velocity estimate from the most recent [`Target::update`].
    fn velocity(&self) -> Vec3;

    /// Acceleration estimate, consumed by augmented proportional navigation.
    fn acceleration(&self) -> Vec3;

    /// Predictive hit test for a missile about to be stepped.
    ///
    /// Pure query. Returns the surface location that will be struck, if any.
    fn hit_test(&self, probe: &HitProbe) -> Option<HitLocation>;

    /// Refreshes the motion estimates. Called with the scheduler's fixed
    /// target update interval, possibly several times per frame.
    fn update(&mut self, dt: f32);
}

/// What a [`Target`] needs to know about a missile to hit-test it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitProbe {
    /// Missile position after this step's integration.
    pub position: Vec3,
    /// Missile velocity that will be applied over the next step.
    pub velocity: Vec3,
    /// Length of one simulation step, in seconds.
    pub step: f32,
    /// Arrival tolerance from the cluster's parameters.
    pub at_target_distance: f32,
}

/// Where a missile struck its target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitLocation {
    /// World-space impact point.
    pub point: Vec3,
    /// Outward surface normal at the impact point.
    pub normal: Vec3,
}

// =============================================================================
// Sphere Hit Test
// =============================================================================

/// Hit-tests a probe against a bounding sphere moving at `target_velocity`.
///
/// A hit is reported when either:
/// - the probe is already within `at_target_distance` of `center`, or
/// - a ray cast from the probe along its velocity relative to the target,
///   bounded by one step of travel plus `radius`, meets the sphere surface
///   before the predicted end-of-step position or within `at_target_distance`
///   of it.
///
/// A probe already inside the sphere is reported as a hit at its own position.
#[must_use]
pub fn sphere_hit_test(
    center: Vec3,
    radius: f32,
    target_velocity: Vec3,
    probe: &HitProbe,
) -> Option<HitLocation> {
    let offset = probe.position - center;
    let distance_sq = offset.length_squared();

    if distance_sq <= probe.at_target_distance * probe.at_target_distance
        || distance_sq <= radius * radius
    {
        return Some(HitLocation {
            point: probe.position,
            normal: offset.try_normalize().unwrap_or(Vec3::Z),
        });
    }

    let relative = probe.velocity - target_velocity;
    let speed = relative.length();
    if speed <= f32::EPSILON || probe.step <= 0.0 {
        return None;
    }
    let dir = relative / speed;
    let travel = speed * probe.step;

    // Nearest ray/sphere intersection in front of the probe. The probe is
    // outside the sphere here, so both roots share a sign.
    let b = offset.dot(dir);
    let c = distance_sq - radius * radius;
    let discriminant = b * b - c;
    if b > 0.0 || discriminant < 0.0 {
        return None;
    }
    let t = -b - discriminant.sqrt();
    if t > travel + radius {
        return None;
    }

    let point = probe.position + dir * t;
    let predicted = probe.position + dir * travel;
    if t <= travel || point.distance_squared(predicted) <= probe.at_target_distance.powi(2) {
        Some(HitLocation {
            point,
            normal: (point - center).try_normalize().unwrap_or(-dir),
        })
    } else {
        None
    }
}

// =============================================================================
// Tracked Target
// =============================================================================

/// A host-positioned target with finite-difference velocity.
///
/// The host calls [`TrackedTarget::set_position`] as its world object moves.
/// Each [`Target::update`] turns the displacement since the previous update
/// into a velocity. Acceleration is always zero: differencing an already
/// differenced velocity at this cadence is mostly noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedTarget {
    position: Vec3,
    prev_position: Vec3,
    velocity: Vec3,
    radius: f32,
}

impl TrackedTarget {
    /// Creates a stationary target with a bounding sphere of `radius`.
    #[must_use]
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            prev_position: position,
            velocity: Vec3::ZERO,
            radius: radius.max(0.0),
        }
    }

    /// Wraps the target for sharing with clusters.
    #[must_use]
    pub fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    /// Moves the target. The velocity estimate follows on the next update.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Bounding sphere radius.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Target for TrackedTarget {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn acceleration(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn hit_test(&self, probe: &HitProbe) -> Option<HitLocation> {
        sphere_hit_test(self.position, self.radius, self.velocity, probe)
    }

    fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.velocity = (self.position - self.prev_position) / dt;
        self.prev_position = self.position;
    }
}
