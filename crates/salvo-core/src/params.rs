//! Configuration for clusters and the top-level scheduler.
//!
//! [`Parameters`] is shared, immutable configuration for one or more clusters:
//! guidance gains, phase thresholds, throttle limits and the driver strategies
//! to construct for each flight phase. It is plain data, so it serializes and
//! compares like any other configuration value.
//!
//! [`SimulationConfig`] configures the [`Simulation`](crate::simulation::Simulation)
//! itself: the global time scale and the fixed cadence at which targets refresh
//! their motion estimates.
//!
//! # Example
//!
//! ```
//! use salvo_core::drivers::DriverKind;
//! use salvo_core::params::Parameters;
//!
//! let params = Parameters {
//!     pursuit_navigation_gain: 4.0,
//!     pursuit_hit_time_correction: true,
//!     ..Parameters::default()
//! };
//!
//! assert!(params.validate().is_ok());
//! assert_eq!(params.pursuit_driver, DriverKind::ProportionalNavigation);
//! ```

use serde::{Deserialize, Serialize};

use crate::drivers::DriverKind;
use crate::error::{ConfigError, ParametersError};

/// Default fixed simulation step, in seconds (40 Hz).
pub const DEFAULT_SIMULATION_STEP: f32 = 0.025;

/// Default interval between target motion refreshes, in seconds.
pub const DEFAULT_TARGET_UPDATE_INTERVAL: f32 = 0.1;

/// Tolerance, in seconds, for fixed-step accumulator draining and phase
/// activation times. Absorbs f32 rounding so that frame sequences with equal
/// totals drain the same number of steps.
pub const TIME_EPSILON: f32 = 1e-5;

/// Most fixed steps (or target refreshes) a single frame may drain. Frame time
/// beyond this budget is dropped rather than simulated.
pub const MAX_STEPS_PER_FRAME: usize = 1024;

/// Whole steps taken out of a fixed-step accumulator.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Drain {
    pub steps: usize,
    /// Seconds discarded because the frame exceeded [`MAX_STEPS_PER_FRAME`].
    pub dropped: f32,
}

/// Removes every whole `step` held by `accumulator` and reports how many.
///
/// The count is computed up front, so huge or infinite accumulators cannot
/// stall the caller. Past [`MAX_STEPS_PER_FRAME`] the accumulator is emptied
/// and the excess reported as dropped. A NaN accumulator is reset to zero.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn drain_fixed_steps(accumulator: &mut f32, step: f32) -> Drain {
    if accumulator.is_nan() {
        *accumulator = 0.0;
    }

    let whole = ((*accumulator + TIME_EPSILON) / step).floor();
    if whole.is_nan() || whole < 1.0 {
        return Drain { steps: 0, dropped: 0.0 };
    }

    if whole > MAX_STEPS_PER_FRAME as f32 {
        let dropped = *accumulator - MAX_STEPS_PER_FRAME as f32 * step;
        *accumulator = 0.0;
        return Drain {
            steps: MAX_STEPS_PER_FRAME,
            dropped,
        };
    }

    let steps = whole as usize;
    *accumulator -= steps as f32 * step;
    Drain { steps, dropped: 0.0 }
}

// =============================================================================
// Parameters
// =============================================================================

/// Guidance and lifecycle configuration shared by the missiles of a cluster.
///
/// A cluster holds its parameters behind an `Rc` for its whole life; the
/// simulation never mutates them. Hosts that want different behavior launch
/// new clusters with new parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Fixed integration step in seconds. Frame time is drained in exactly
    /// this increment.
    pub simulation_step: f32,

    /// Speed imparted along the spawn direction at launch.
    pub ejection_velocity: f32,
    /// Acceleration along the launch direction applied by
    /// [`DriverKind::BoostedEjection`]. Ignored by the inert ejection driver.
    pub ejection_acceleration: f32,

    /// Time since launch at which a missile leaves ejection and starts homing.
    pub pursuit_activation_time: f32,
    /// Navigation gain `N` of the proportional navigation law (typically 3).
    pub pursuit_navigation_gain: f32,
    /// Compensate for target acceleration perpendicular to the line of sight.
    pub pursuit_augmented_pn: bool,
    /// Throttle so that the missile closes exactly at the cluster's time to hit.
    pub pursuit_hit_time_correction: bool,
    /// Speed the free-pursuit throttle accelerates toward.
    pub pursuit_max_velocity: f32,
    /// Acceleration limit of the free-pursuit throttle, and the magnitude of
    /// the pure-pursuit fallback steering command.
    pub pursuit_max_acc: f32,

    /// Distance from the target at which a missile counts as arrived.
    pub at_target_distance: f32,
    /// Terminate missiles immediately on arrival instead of holding them in
    /// `AtTarget` until the host terminates them.
    pub terminate_when_at_target: bool,
    /// Emit `debug` level tracing events for phase changes and forced hits.
    pub debugging_aid: bool,

    /// Driver constructed for the ejection phase.
    pub ejection_driver: DriverKind,
    /// Driver constructed when pursuit activates.
    pub pursuit_driver: DriverKind,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            simulation_step: DEFAULT_SIMULATION_STEP,
            ejection_velocity: 10.0,
            ejection_acceleration: 0.0,
            pursuit_activation_time: 0.35,
            pursuit_navigation_gain: 3.0,
            pursuit_augmented_pn: false,
            pursuit_hit_time_correction: false,
            pursuit_max_velocity: 500.0,
            pursuit_max_acc: 500.0,
            at_target_distance: 1.0,
            terminate_when_at_target: true,
            debugging_aid: false,
            ejection_driver: DriverKind::Ejection,
            pursuit_driver: DriverKind::ProportionalNavigation,
        }
    }
}

impl Parameters {
    /// Checks that every numeric field is usable by the stepping code.
    ///
    /// # Errors
    ///
    /// Returns [`ParametersError`] for a non-positive simulation step, a
    /// non-finite navigation gain, or any negative or non-finite limit.
    pub fn validate(&self) -> Result<(), ParametersError> {
        if !(self.simulation_step.is_finite() && self.simulation_step > 0.0) {
            return Err(ParametersError::InvalidSimulationStep(self.simulation_step));
        }
        if !self.pursuit_navigation_gain.is_finite() {
            return Err(ParametersError::InvalidNavigationGain(
                self.pursuit_navigation_gain,
            ));
        }

        let non_negative = [
            ("ejection_velocity", self.ejection_velocity),
            ("ejection_acceleration", self.ejection_acceleration),
            ("pursuit_activation_time", self.pursuit_activation_time),
            ("pursuit_max_velocity", self.pursuit_max_velocity),
            ("pursuit_max_acc", self.pursuit_max_acc),
            ("at_target_distance", self.at_target_distance),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ParametersError::InvalidValue { name, value });
            }
        }

        Ok(())
    }
}

// =============================================================================
// Simulation Config
// =============================================================================

/// Configuration for the top-level [`Simulation`](crate::simulation::Simulation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Multiplier applied to every frame delta (1.0 = real time, 0.0 = paused).
    pub time_scale: f32,
    /// Fixed cadence of `Target::update`, independent of the missile step.
    pub target_update_interval: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            target_update_interval: DEFAULT_TARGET_UPDATE_INTERVAL,
        }
    }
}

impl SimulationConfig {
    /// Checks the time scale and target refresh interval.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a non-positive refresh interval or a
    /// negative time scale.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_update_interval.is_finite() && self.target_update_interval > 0.0) {
            return Err(ConfigError::InvalidTargetUpdateInterval(
                self.target_update_interval,
            ));
        }
        if !(self.time_scale.is_finite() && self.time_scale >= 0.0) {
            return Err(ConfigError::InvalidTimeScale(self.time_scale));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod parameters_tests {
        use super::*;

        #[test]
        fn defaults_are_valid() {
            let params = Parameters::default();
            assert!(params.validate().is_ok());
            assert!((params.simulation_step - 0.025).abs() < f32::EPSILON);
            assert!((params.pursuit_navigation_gain - 3.0).abs() < f32::EPSILON);
            assert!(params.terminate_when_at_target);
            assert!(!params.pursuit_hit_time_correction);
        }

        #[test]
        fn rejects_non_positive_step() {
            let params = Parameters {
                simulation_step: 0.0,
                ..Parameters::default()
            };
            assert_eq!(
                params.validate(),
                Err(ParametersError::InvalidSimulationStep(0.0))
            );

            let params = Parameters {
                simulation_step: f32::NAN,
                ..Parameters::default()
            };
            assert!(params.validate().is_err());
        }

        #[test]
        fn rejects_negative_limits() {
            let params = Parameters {
                pursuit_max_acc: -5.0,
                ..Parameters::default()
            };
            assert_eq!(
                params.validate(),
                Err(ParametersError::InvalidValue {
                    name: "pursuit_max_acc",
                    value: -5.0
                })
            );
        }

        #[test]
        fn rejects_infinite_gain() {
            let params = Parameters {
                pursuit_navigation_gain: f32::INFINITY,
                ..Parameters::default()
            };
            assert!(matches!(
                params.validate(),
                Err(ParametersError::InvalidNavigationGain(_))
            ));
        }

        #[test]
        fn json_round_trip_keeps_driver_selection() {
            let params = Parameters {
                ejection_driver: DriverKind::BoostedEjection,
                pursuit_augmented_pn: true,
                ..Parameters::default()
            };
            let json = serde_json::to_string(&params).unwrap();
            let back: Parameters = serde_json::from_str(&json).unwrap();
            assert_eq!(params, back);
        }

        #[test]
        fn missing_fields_fall_back_to_defaults() {
            let params: Parameters =
                serde_json::from_str(r#"{ "pursuit_navigation_gain": 5.0 }"#).unwrap();
            assert!((params.pursuit_navigation_gain - 5.0).abs() < f32::EPSILON);
            assert_eq!(params.simulation_step, DEFAULT_SIMULATION_STEP);
        }
    }

    mod drain_tests {
        use super::*;

        #[test]
        fn drains_whole_steps_and_keeps_remainder() {
            let mut acc = 0.06;
            let drain = drain_fixed_steps(&mut acc, 0.025);
            assert_eq!(drain, Drain { steps: 2, dropped: 0.0 });
            assert!((acc - 0.01).abs() < 1e-6);
        }

        #[test]
        fn tolerance_absorbs_rounding() {
            let mut acc = 0.025 - 1e-7;
            assert_eq!(drain_fixed_steps(&mut acc, 0.025).steps, 1);
            assert!(acc.abs() < TIME_EPSILON);
        }

        #[test]
        fn huge_accumulator_is_capped() {
            // 0.025 is below the f32 spacing at 1e6, so subtracting it step by
            // step would never make progress.
            let mut acc = 1.0e6_f32;
            let drain = drain_fixed_steps(&mut acc, 0.025);
            assert_eq!(drain.steps, MAX_STEPS_PER_FRAME);
            assert!(drain.dropped > 999_000.0);
            assert_eq!(acc, 0.0);
        }

        #[test]
        fn infinite_and_nan_accumulators_recover() {
            let mut acc = f32::INFINITY;
            assert_eq!(drain_fixed_steps(&mut acc, 0.025).steps, MAX_STEPS_PER_FRAME);
            assert_eq!(acc, 0.0);

            let mut acc = f32::NAN;
            assert_eq!(drain_fixed_steps(&mut acc, 0.025).steps, 0);
            assert_eq!(acc, 0.0);
        }
    }

    mod config_tests {
        use super::*;

        #[test]
        fn default_config_is_valid() {
            assert!(SimulationConfig::default().validate().is_ok());
        }

        #[test]
        fn rejects_zero_interval() {
            let config = SimulationConfig {
                target_update_interval: 0.0,
                ..SimulationConfig::default()
            };
            assert_eq!(
                config.validate(),
                Err(ConfigError::InvalidTargetUpdateInterval(0.0))
            );
        }

        #[test]
        fn rejects_negative_time_scale() {
            let config = SimulationConfig {
                time_scale: -1.0,
                ..SimulationConfig::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::InvalidTimeScale(-1.0)));
        }
    }
}
