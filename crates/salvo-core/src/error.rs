//! Error types for the launch and configuration boundaries.
//!
//! Stepping never fails: degenerate numeric cases are handled with early
//! returns. Errors only surface where a host hands configuration to the
//! simulation, before any state is created.

use thiserror::Error;

/// A [`Parameters`](crate::params::Parameters) value that cannot drive a cluster.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParametersError {
    /// The fixed simulation step is zero, negative, or not finite.
    #[error("simulation step must be positive and finite, got {0}")]
    InvalidSimulationStep(f32),

    /// A quantity that must be non-negative is negative or not finite.
    #[error("{name} must be non-negative and finite, got {value}")]
    InvalidValue {
        /// Name of the offending field.
        name: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// The navigation gain is not finite.
    #[error("navigation gain must be finite, got {0}")]
    InvalidNavigationGain(f32),
}

/// Reasons a cluster launch is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LaunchError {
    /// A cluster needs at least one missile.
    #[error("cluster must contain at least one missile")]
    EmptyCluster,

    /// Explicit spawn data does not line up with the missile count.
    #[error("{source_name} provided {actual} entries for {expected} missiles")]
    SpawnCountMismatch {
        /// Which spawn input was short or long.
        source_name: &'static str,
        /// The missile count of the launch.
        expected: usize,
        /// The number of entries provided.
        actual: usize,
    },

    /// The time-to-hit deadline is negative or not finite.
    #[error("time to hit must be non-negative and finite, got {0}")]
    InvalidTimeToHit(f32),

    /// The shared parameters failed validation.
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] ParametersError),
}

/// A [`SimulationConfig`](crate::params::SimulationConfig) the scheduler cannot run with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The target refresh interval is zero, negative, or not finite.
    #[error("target update interval must be positive and finite, got {0}")]
    InvalidTargetUpdateInterval(f32),

    /// The time scale is negative or not finite.
    #[error("time scale must be non-negative and finite, got {0}")]
    InvalidTimeScale(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_error_converts_into_launch_error() {
        let err: LaunchError = ParametersError::InvalidSimulationStep(0.0).into();
        assert_eq!(
            err,
            LaunchError::InvalidParameters(ParametersError::InvalidSimulationStep(0.0))
        );
    }

    #[test]
    fn messages_name_the_problem() {
        let err = LaunchError::SpawnCountMismatch {
            source_name: "spawn offsets",
            expected: 4,
            actual: 3,
        };
        assert_eq!(err.to_string(), "spawn offsets provided 3 entries for 4 missiles");

        let err = ParametersError::InvalidValue {
            name: "pursuit_max_acc",
            value: -1.0,
        };
        assert_eq!(
            err.to_string(),
            "pursuit_max_acc must be non-negative and finite, got -1"
        );
    }
}
