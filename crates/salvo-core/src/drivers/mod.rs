//! Guidance strategies that adjust a missile's velocity each step.
//!
//! A missile carries at most one active [`Driver`]. The state machine in
//! [`crate::missile`] swaps drivers on phase changes; which concrete driver is
//! built for each phase is chosen by the [`DriverKind`] values stored in
//! [`Parameters`]. Dispatch is a closed enum rather than a trait object so the
//! choice stays plain, serializable configuration.
//!
//! Drivers run *after* position integration and the phase transitions of a
//! step: they set the velocity used by the next step.
//!
//! # Available drivers
//!
//! | Kind | Phase | Effect |
//! |------|-------|--------|
//! | [`DriverKind::Ejection`] | ejection | none; launch velocity carries it |
//! | [`DriverKind::BoostedEjection`] | ejection | constant thrust along the launch axis |
//! | [`DriverKind::ProportionalNavigation`] | pursuit | PN steering plus throttle |

mod ejection;
mod pursuit;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::missile::{Kinematics, Missile};
use crate::params::Parameters;

pub use ejection::{BoostedEjectionDriver, EjectionDriver};
pub use pursuit::{correction_acceleration, PursuitDriver};

/// Driver factory selection, stored in [`Parameters`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriverKind {
    /// Inert ejection: the launch impulse is the whole effect.
    Ejection,
    /// Ejection with a constant boost along the launch direction.
    BoostedEjection,
    /// Proportional navigation pursuit.
    ProportionalNavigation,
}

impl DriverKind {
    /// Builds a fresh driver of this kind for `missile`.
    #[must_use]
    pub fn create(self, missile: &Missile) -> Driver {
        match self {
            Self::Ejection => Driver::Ejection(EjectionDriver::new()),
            Self::BoostedEjection => {
                Driver::BoostedEjection(BoostedEjectionDriver::new(missile.velocity()))
            }
            Self::ProportionalNavigation => Driver::ProportionalNavigation(PursuitDriver::new()),
        }
    }
}

/// Everything a driver reads besides the missile's own kinematics.
#[derive(Debug, Clone, Copy)]
pub struct GuidanceInput<'a> {
    /// Target reference point.
    pub target_position: Vec3,
    /// Target velocity estimate.
    pub target_velocity: Vec3,
    /// Target acceleration estimate.
    pub target_acceleration: Vec3,
    /// Time left until the cluster's imposed hit deadline.
    pub time_to_hit: f32,
    /// The owning cluster's parameters.
    pub parameters: &'a Parameters,
}

/// Result of a single driver step.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DriverOutcome {
    /// The driver ran (possibly leaving the velocity unchanged).
    Applied,
    /// The step was skipped because `dt` was not positive.
    NoTimeStep,
    /// The step was skipped because the missile sits on the target reference
    /// point and the line of sight is undefined.
    DegenerateLineOfSight,
}

/// An active guidance strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Driver {
    /// See [`EjectionDriver`].
    Ejection(EjectionDriver),
    /// See [`BoostedEjectionDriver`].
    BoostedEjection(BoostedEjectionDriver),
    /// See [`PursuitDriver`].
    ProportionalNavigation(PursuitDriver),
}

impl Driver {
    /// Adjusts `body.velocity` for one step of length `dt`.
    ///
    /// Never fails: degenerate inputs leave the body untouched and report why.
    pub fn step(
        &mut self,
        body: &mut Kinematics,
        input: &GuidanceInput<'_>,
        dt: f32,
    ) -> DriverOutcome {
        match self {
            Self::Ejection(driver) => driver.step(dt),
            Self::BoostedEjection(driver) => driver.step(body, input.parameters, dt),
            Self::ProportionalNavigation(driver) => driver.step(body, input, dt),
        }
    }

    /// The kind this driver was built from.
    #[must_use]
    pub fn kind(&self) -> DriverKind {
        match self {
            Self::Ejection(_) => DriverKind::Ejection,
            Self::BoostedEjection(_) => DriverKind::BoostedEjection,
            Self::ProportionalNavigation(_) => DriverKind::ProportionalNavigation,
        }
    }

    /// Line-of-sight rate from the last pursuit step, if this is a pursuit driver.
    #[must_use]
    pub fn los_rate(&self) -> Option<Vec3> {
        match self {
            Self::ProportionalNavigation(driver) => Some(driver.los_rate()),
            _ => None,
        }
    }

    /// Lateral acceleration commanded by the last pursuit step, if this is a
    /// pursuit driver.
    #[must_use]
    pub fn last_latax(&self) -> Option<Vec3> {
        match self {
            Self::ProportionalNavigation(driver) => Some(driver.last_latax()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_created_driver() {
        let missile = Missile::detached(Kinematics::new(Vec3::ZERO, Vec3::Z * 10.0));
        for kind in [
            DriverKind::Ejection,
            DriverKind::BoostedEjection,
            DriverKind::ProportionalNavigation,
        ] {
            assert_eq!(kind.create(&missile).kind(), kind);
        }
    }

    #[test]
    fn diagnostics_only_on_pursuit() {
        let missile = Missile::detached(Kinematics::new(Vec3::ZERO, Vec3::Z));
        let ejection = DriverKind::Ejection.create(&missile);
        assert_eq!(ejection.los_rate(), None);
        assert_eq!(ejection.last_latax(), None);

        let pursuit = DriverKind::ProportionalNavigation.create(&missile);
        assert_eq!(pursuit.los_rate(), Some(Vec3::ZERO));
        assert_eq!(pursuit.last_latax(), Some(Vec3::ZERO));
    }

    #[test]
    fn kind_serializes_by_name() {
        let json = serde_json::to_string(&DriverKind::ProportionalNavigation).unwrap();
        assert_eq!(json, "\"ProportionalNavigation\"");
    }
}
