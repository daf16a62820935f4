//! Proportional navigation pursuit.
//!
//! Each step has two parts:
//!
//! 1. **Steering.** The line-of-sight rate `ω = (R × Vr) / |R|²` is turned
//!    into a lateral acceleration `N · (Vr × ω)`, where `R` is the vector to
//!    the target and `Vr` the target's velocity relative to the missile. When
//!    that command vanishes (no relative motion across or along the line of
//!    sight) the driver falls back to pure pursuit at `pursuit_max_acc`.
//!    Augmented PN adds `N/2` times the target acceleration perpendicular to
//!    the line of sight. Steering never increases speed: if it would, the
//!    velocity is rescaled back to its previous magnitude.
//! 2. **Throttle.** With hit-time correction, a constant closing acceleration
//!    is chosen so the remaining range closes exactly at the cluster's time to
//!    hit. Without it, speed moves toward `pursuit_max_velocity` by at most
//!    `pursuit_max_acc · dt`.

use glam::Vec3;

use super::{DriverOutcome, GuidanceInput};
use crate::missile::Kinematics;

/// Proportional navigation driver.
///
/// Stateless apart from the diagnostics of its most recent step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PursuitDriver {
    los_rate: Vec3,
    last_latax: Vec3,
}

impl PursuitDriver {
    /// Creates a driver with zeroed diagnostics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Line-of-sight angular velocity from the most recent step.
    #[must_use]
    pub fn los_rate(&self) -> Vec3 {
        self.los_rate
    }

    /// Lateral acceleration commanded by the most recent step.
    #[must_use]
    pub fn last_latax(&self) -> Vec3 {
        self.last_latax
    }

    pub(crate) fn step(
        &mut self,
        body: &mut Kinematics,
        input: &GuidanceInput<'_>,
        dt: f32,
    ) -> DriverOutcome {
        if dt <= 0.0 {
            return DriverOutcome::NoTimeStep;
        }

        let params = input.parameters;
        let relative_position = input.target_position - body.position;
        let relative_velocity = input.target_velocity - body.velocity;

        let range_sq = relative_position.length_squared();
        if range_sq <= f32::EPSILON {
            return DriverOutcome::DegenerateLineOfSight;
        }
        let range = range_sq.sqrt();
        let los = relative_position / range;
        let gain = params.pursuit_navigation_gain;

        let los_rate = relative_position.cross(relative_velocity) / range_sq;
        let turn = relative_velocity.cross(los_rate);
        let mut latax = if turn == Vec3::ZERO {
            los * params.pursuit_max_acc
        } else {
            turn * gain
        };

        if params.pursuit_augmented_pn {
            let target_acc = input.target_acceleration;
            let lateral = target_acc - los * target_acc.dot(los);
            latax += lateral * (0.5 * gain);
        }

        body.velocity = apply_lateral_acceleration(body.velocity, latax, dt);
        self.los_rate = los_rate;
        self.last_latax = latax;

        if params.pursuit_hit_time_correction {
            // The closing speed is taken before steering, matching the range
            // measured above.
            if input.time_to_hit > 0.0 {
                let closing_speed = -relative_velocity.dot(los);
                let correction = correction_acceleration(range, closing_speed, input.time_to_hit);
                body.velocity += los * (correction * dt);
            }
        } else {
            body.velocity = throttle(
                body.velocity,
                los,
                params.pursuit_max_velocity,
                params.pursuit_max_acc * dt,
            );
        }

        DriverOutcome::Applied
    }
}

/// Constant acceleration along the line of sight that closes `distance` in
/// exactly `time_to_hit` seconds, starting at `closing_speed`.
///
/// Solves `distance = v0·t + a·t²/2` for `a`. Returns zero when `time_to_hit`
/// is not positive.
///
/// # Example
///
/// ```
/// use salvo_core::drivers::correction_acceleration;
///
/// // 100 m at 10 m/s in 5 s needs 4 m/s² of extra closing acceleration.
/// assert!((correction_acceleration(100.0, 10.0, 5.0) - 4.0).abs() < 1e-6);
/// ```
#[must_use]
pub fn correction_acceleration(distance: f32, closing_speed: f32, time_to_hit: f32) -> f32 {
    if time_to_hit <= 0.0 {
        return 0.0;
    }
    2.0 * (distance - closing_speed * time_to_hit) / (time_to_hit * time_to_hit)
}

/// `velocity + latax·dt`, never faster than `velocity`.
pub(crate) fn apply_lateral_acceleration(velocity: Vec3, latax: Vec3, dt: f32) -> Vec3 {
    let speed_before = velocity.length();
    let steered = velocity + latax * dt;
    let speed_after = steered.length();
    if speed_after > speed_before {
        steered * (speed_before / speed_after)
    } else {
        steered
    }
}

/// Moves speed toward `max_velocity` by at most `max_delta`, keeping the
/// heading. A stationary missile is pointed along `los`.
fn throttle(velocity: Vec3, los: Vec3, max_velocity: f32, max_delta: f32) -> Vec3 {
    let speed = velocity.length();
    let new_speed = if speed < max_velocity {
        (speed + max_delta).min(max_velocity)
    } else {
        (speed - max_delta).max(max_velocity)
    };

    if speed > f32::EPSILON {
        velocity * (new_speed / speed)
    } else {
        los * new_speed
    }
}
