//! Ejection phase drivers.

use glam::Vec3;

use super::DriverOutcome;
use crate::missile::Kinematics;
use crate::params::Parameters;

/// Inert ejection driver.
///
/// The launch impulse (`ejection_velocity` along the spawn direction) is the
/// entire ejection phase. The driver only exists so that every missile has a
/// valid driver from launch onward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EjectionDriver {
    _private: (),
}

impl EjectionDriver {
    /// Creates the driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn step(&mut self, dt: f32) -> DriverOutcome {
        if dt <= 0.0 {
            return DriverOutcome::NoTimeStep;
        }
        DriverOutcome::Applied
    }
}

/// Ejection driver that keeps pushing along the launch direction.
///
/// Applies `ejection_acceleration` along the direction the missile was moving
/// when the driver was built.
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedEjectionDriver {
    direction: Vec3,
}

impl BoostedEjectionDriver {
    /// Creates a driver boosting along `launch_velocity` (`+Z` if it is zero).
    #[must_use]
    pub fn new(launch_velocity: Vec3) -> Self {
        Self {
            direction: launch_velocity.try_normalize().unwrap_or(Vec3::Z),
        }
    }

    /// Unit direction of the boost.
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub(crate) fn step(
        &mut self,
        body: &mut Kinematics,
        parameters: &Parameters,
        dt: f32,
    ) -> DriverOutcome {
        if dt <= 0.0 {
            return DriverOutcome::NoTimeStep;
        }
        body.velocity += self.direction * parameters.ejection_acceleration * dt;
        DriverOutcome::Applied
    }
}
