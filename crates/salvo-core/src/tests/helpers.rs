//! Test helpers for building targets, launches and simulations.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;

use crate::cluster::{ClusterId, LaunchRequest};
use crate::missile::{Missile, MissileId};
use crate::params::Parameters;
use crate::simulation::Simulation;
use crate::target::{sphere_hit_test, HitLocation, HitProbe, Target, TrackedTarget};

// =============================================================================
// Tracing
// =============================================================================

/// Installs a test-writer subscriber so `debug!` paths run under `cargo test`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Targets
// =============================================================================

/// A stationary tracked target with a 1 m bounding sphere.
pub fn stationary_target(position: Vec3) -> Rc<RefCell<TrackedTarget>> {
    TrackedTarget::new(position, 1.0).shared()
}

/// A target that counts its refreshes and never moves.
#[derive(Debug)]
pub struct CountingTarget {
    pub position: Vec3,
    pub updates: usize,
    pub last_dt: f32,
}

impl CountingTarget {
    pub fn shared(position: Vec3) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            position,
            updates: 0,
            last_dt: 0.0,
        }))
    }
}

impl Target for CountingTarget {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn acceleration(&self) -> Vec3 {
        Vec3::ZERO
    }

    fn hit_test(&self, probe: &HitProbe) -> Option<HitLocation> {
        sphere_hit_test(self.position, 1.0, Vec3::ZERO, probe)
    }

    fn update(&mut self, dt: f32) {
        self.updates += 1;
        self.last_dt = dt;
    }
}

/// A target flying a fixed course with a constant acceleration, advanced by
/// its own refreshes.
#[derive(Debug)]
pub struct CruisingTarget {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub radius: f32,
}

impl CruisingTarget {
    pub fn shared(position: Vec3, velocity: Vec3) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            position,
            velocity,
            acceleration: Vec3::ZERO,
            radius: 1.0,
        }))
    }
}

impl Target for CruisingTarget {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    fn hit_test(&self, probe: &HitProbe) -> Option<HitLocation> {
        sphere_hit_test(self.position, self.radius, self.velocity, probe)
    }

    fn update(&mut self, dt: f32) {
        self.position += self.velocity * dt + self.acceleration * (0.5 * dt * dt);
        self.velocity += self.acceleration * dt;
    }
}

// =============================================================================
// Launches
// =============================================================================

/// A default-parameter launch of `count` missiles from the origin, 5 s to hit.
pub fn request<T: Target + 'static>(target: &Rc<RefCell<T>>, count: usize) -> LaunchRequest {
    request_with(target, count, Parameters::default(), 5.0)
}

/// A launch of `count` missiles from the origin with explicit parameters.
pub fn request_with<T: Target + 'static>(
    target: &Rc<RefCell<T>>,
    count: usize,
    parameters: Parameters,
    time_to_hit: f32,
) -> LaunchRequest {
    LaunchRequest::new(target.clone(), Rc::new(parameters), count, time_to_hit)
}

/// Launches and unwraps.
pub fn launch(sim: &mut Simulation, request: LaunchRequest) -> ClusterId {
    sim.launch_cluster(request).expect("launch rejected")
}

/// Looks up a missile that must still be active.
pub fn missile(sim: &Simulation, cluster: ClusterId, index: usize) -> &Missile {
    sim.missile(MissileId::new(cluster, index))
        .expect("missile should be active")
}

/// Feeds `frames` into the simulation.
pub fn run_frames(sim: &mut Simulation, frames: &[f32]) {
    for &dt in frames {
        sim.update_simulation(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cruising_target_integrates_motion() {
        let target = CruisingTarget::shared(Vec3::ZERO, Vec3::X * 10.0);
        target.borrow_mut().acceleration = Vec3::Y * 2.0;
        target.borrow_mut().update(1.0);

        let t = target.borrow();
        assert!((t.position - Vec3::new(10.0, 1.0, 0.0)).length() < 1e-5);
        assert!((t.velocity - Vec3::new(10.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn counting_target_counts() {
        let target = CountingTarget::shared(Vec3::ZERO);
        target.borrow_mut().update(0.1);
        target.borrow_mut().update(0.2);
        assert_eq!(target.borrow().updates, 2);
        assert!((target.borrow().last_dt - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn launch_helper_uses_defaults() {
        let mut sim = Simulation::default();
        let target = stationary_target(Vec3::Z * 100.0);
        let id = launch(&mut sim, request(&target, 2));
        assert_eq!(missile(&sim, id, 1).velocity(), Vec3::Z * 10.0);
    }
}
