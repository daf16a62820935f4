//! Where missiles appear at launch and which way they are ejected.
//!
//! Spawn data is expressed in the launch origin's local frame: offsets are
//! points, directions are vectors, and `+Z` is "forward". The cluster
//! transforms them into world space with the origin matrix.
//!
//! Randomized layouts take an explicit seed so that a launch can be replayed
//! exactly.
//!
//! # Example
//!
//! ```
//! use salvo_core::spawn::{SpawnField, SphereSpawnField};
//!
//! let mut a = SphereSpawnField::new(2.0, 0.3, 7);
//! let mut b = SphereSpawnField::new(2.0, 0.3, 7);
//! assert_eq!(a.generate(8), b.generate(8));
//! ```

use std::f32::consts::TAU;
use std::fmt;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::LaunchError;

/// Local spawn offset and ejection direction of one missile.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Offset from the launch origin, in the origin's local frame.
    pub offset: Vec3,
    /// Ejection direction in the origin's local frame. Need not be normalized.
    pub direction: Vec3,
}

impl Default for SpawnPoint {
    fn default() -> Self {
        Self {
            offset: Vec3::ZERO,
            direction: Vec3::Z,
        }
    }
}

/// A generator of spawn points for a whole cluster.
pub trait SpawnField {
    /// Produces exactly `count` spawn points.
    fn generate(&mut self, count: usize) -> Vec<SpawnPoint>;
}

/// How a launch places its missiles.
#[derive(Default)]
pub enum SpawnLayout {
    /// Every missile at the origin, ejected along local `+Z`.
    #[default]
    Origin,
    /// Per-missile data. Each list, when present, must have one entry per
    /// missile; missing offsets default to the origin and missing directions
    /// to `+Z`.
    Explicit {
        /// Local offsets.
        offsets: Option<Vec<Vec3>>,
        /// Local ejection directions.
        directions: Option<Vec<Vec3>>,
    },
    /// Points produced by a generator.
    Field(Box<dyn SpawnField>),
}

impl fmt::Debug for SpawnLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => f.write_str("Origin"),
            Self::Explicit {
                offsets,
                directions,
            } => f
                .debug_struct("Explicit")
                .field("offsets", offsets)
                .field("directions", directions)
                .finish(),
            Self::Field(_) => f.write_str("Field(..)"),
        }
    }
}

impl SpawnLayout {
    /// Wraps a generator.
    #[must_use]
    pub fn field(field: impl SpawnField + 'static) -> Self {
        Self::Field(Box::new(field))
    }

    /// Resolves the layout into one spawn point per missile.
    pub(crate) fn into_points(self, count: usize) -> Result<Vec<SpawnPoint>, LaunchError> {
        match self {
            Self::Origin => Ok(vec![SpawnPoint::default(); count]),
            Self::Explicit {
                offsets,
                directions,
            } => {
                check_len("spawn offsets", offsets.as_deref(), count)?;
                check_len("spawn directions", directions.as_deref(), count)?;
                Ok((0..count)
                    .map(|i| SpawnPoint {
                        offset: offsets.as_ref().map_or(Vec3::ZERO, |o| o[i]),
                        direction: directions.as_ref().map_or(Vec3::Z, |d| d[i]),
                    })
                    .collect())
            }
            Self::Field(mut field) => {
                let points = field.generate(count);
                check_len("spawn field", Some(points.as_slice()), count)?;
                Ok(points)
            }
        }
    }
}

fn check_len<T>(
    source_name: &'static str,
    items: Option<&[T]>,
    expected: usize,
) -> Result<(), LaunchError> {
    match items {
        Some(items) if items.len() != expected => Err(LaunchError::SpawnCountMismatch {
            source_name,
            expected,
            actual: items.len(),
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Generators
// =============================================================================

/// Seeded random layout: offsets uniform inside a sphere, directions scattered
/// around `+Z`.
///
/// `spread` scales a random unit-ball jitter added to `+Z` before
/// normalization: 0 ejects every missile straight ahead, 1 gives a wide fan.
#[derive(Debug, Clone)]
pub struct SphereSpawnField {
    radius: f32,
    spread: f32,
    seed: u64,
    rng: ChaCha8Rng,
}

impl SphereSpawnField {
    /// Creates a field with its own generator seeded from `seed`.
    #[must_use]
    pub fn new(radius: f32, spread: f32, seed: u64) -> Self {
        Self {
            radius: radius.max(0.0),
            spread: spread.max(0.0),
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// The seed this field was created with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn unit_ball(&mut self) -> Vec3 {
        loop {
            let p = Vec3::new(
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
                self.rng.gen_range(-1.0..=1.0),
            );
            if p.length_squared() <= 1.0 {
                return p;
            }
        }
    }
}

impl SpawnField for SphereSpawnField {
    fn generate(&mut self, count: usize) -> Vec<SpawnPoint> {
        (0..count)
            .map(|_| {
                let offset = self.unit_ball() * self.radius;
                let jitter = self.unit_ball() * self.spread;
                SpawnPoint {
                    offset,
                    direction: (Vec3::Z + jitter).try_normalize().unwrap_or(Vec3::Z),
                }
            })
            .collect()
    }
}

/// Evenly spaced ring in the local XY plane, tilted outward by `spread`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingSpawnField {
    /// Ring radius.
    pub radius: f32,
    /// Outward tilt of the ejection directions (0 = straight ahead).
    pub spread: f32,
}

impl RingSpawnField {
    /// Creates a ring layout.
    #[must_use]
    pub fn new(radius: f32, spread: f32) -> Self {
        Self { radius, spread }
    }
}

impl SpawnField for RingSpawnField {
    #[allow(clippy::cast_precision_loss)]
    fn generate(&mut self, count: usize) -> Vec<SpawnPoint> {
        (0..count)
            .map(|i| {
                let angle = TAU * i as f32 / count as f32;
                let outward = Vec3::new(angle.cos(), angle.sin(), 0.0);
                SpawnPoint {
                    offset: outward * self.radius,
                    direction: (Vec3::Z + outward * self.spread)
                        .try_normalize()
                        .unwrap_or(Vec3::Z),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod layout_tests {
        use super::*;

        #[test]
        fn origin_layout() {
            let points = SpawnLayout::Origin.into_points(3).unwrap();
            assert_eq!(points, vec![SpawnPoint::default(); 3]);
        }

        #[test]
        fn explicit_layout_fills_missing_lists() {
            let layout = SpawnLayout::Explicit {
                offsets: Some(vec![Vec3::X, Vec3::Y]),
                directions: None,
            };
            let points = layout.into_points(2).unwrap();
            assert_eq!(points[0].offset, Vec3::X);
            assert_eq!(points[1].offset, Vec3::Y);
            assert!(points.iter().all(|p| p.direction == Vec3::Z));
        }

        #[test]
        fn explicit_length_mismatch_is_rejected() {
            let layout = SpawnLayout::Explicit {
                offsets: None,
                directions: Some(vec![Vec3::X]),
            };
            assert_eq!(
                layout.into_points(2),
                Err(LaunchError::SpawnCountMismatch {
                    source_name: "spawn directions",
                    expected: 2,
                    actual: 1,
                })
            );
        }

        #[test]
        fn short_field_is_rejected() {
            struct Stingy;
            impl SpawnField for Stingy {
                fn generate(&mut self, _count: usize) -> Vec<SpawnPoint> {
                    vec![SpawnPoint::default()]
                }
            }

            let result = SpawnLayout::field(Stingy).into_points(4);
            assert!(matches!(
                result,
                Err(LaunchError::SpawnCountMismatch {
                    source_name: "spawn field",
                    expected: 4,
                    actual: 1,
                })
            ));
        }

        #[test]
        fn debug_hides_generator() {
            let layout = SpawnLayout::field(RingSpawnField::new(1.0, 0.0));
            assert_eq!(format!("{layout:?}"), "Field(..)");
        }
    }

    mod sphere_field_tests {
        use super::*;

        #[test]
        fn same_seed_same_layout() {
            let a = SphereSpawnField::new(5.0, 0.5, 42).generate(16);
            let b = SphereSpawnField::new(5.0, 0.5, 42).generate(16);
            assert_eq!(a, b);
        }

        #[test]
        fn different_seed_different_layout() {
            let a = SphereSpawnField::new(5.0, 0.5, 42).generate(16);
            let b = SphereSpawnField::new(5.0, 0.5, 43).generate(16);
            assert_ne!(a, b);
        }

        #[test]
        fn offsets_stay_inside_radius() {
            let points = SphereSpawnField::new(3.0, 1.0, 9).generate(200);
            assert!(points.iter().all(|p| p.offset.length() <= 3.0 + 1e-4));
            assert!(points
                .iter()
                .all(|p| (p.direction.length() - 1.0).abs() < 1e-4));
        }

        #[test]
        fn zero_spread_points_forward() {
            let points = SphereSpawnField::new(3.0, 0.0, 1).generate(10);
            assert!(points.iter().all(|p| p.direction == Vec3::Z));
        }

        #[test]
        fn reports_seed() {
            assert_eq!(SphereSpawnField::new(1.0, 0.0, 77).seed(), 77);
        }
    }

    mod ring_field_tests {
        use super::*;

        #[test]
        fn evenly_spaced_on_ring() {
            let points = RingSpawnField::new(2.0, 0.0).generate(4);
            let expected = [Vec3::X, Vec3::Y, Vec3::NEG_X, Vec3::NEG_Y];
            for (point, expected) in points.iter().zip(expected) {
                assert!((point.offset - expected * 2.0).length() < 1e-5);
                assert_eq!(point.direction, Vec3::Z);
            }
        }

        #[test]
        fn spread_tilts_outward() {
            let points = RingSpawnField::new(1.0, 1.0).generate(2);
            assert!(points[0].direction.x > 0.0);
            assert!(points[0].direction.z > 0.0);
            assert!(points[1].direction.x < 0.0);
        }
    }
}
