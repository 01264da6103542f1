//! Pairwise Newtonian gravitation, the right-hand side of the N-body ODE.

use solar_core::constants::G;
use solar_core::vector::{self, Vector3};

use crate::DynamicsError;

/// Default minimum separation (m) below which two distinct bodies are treated as coincident.
pub const DEFAULT_MIN_SEPARATION_M: f64 = 1.0;

/// First-order ODE right-hand side for state' = (velocity, acceleration).
#[derive(Debug, Clone, PartialEq)]
pub struct Derivative {
    /// The input velocities, unchanged.
    pub velocities: Vec<Vector3>,
    /// Accumulated gravitational acceleration per body (m/s²).
    pub accelerations: Vec<Vector3>,
}

/// Direct-summation Newtonian gravity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityField {
    pub g: f64,
    pub min_separation_m: f64,
}

impl Default for GravityField {
    fn default() -> Self {
        Self {
            g: G,
            min_separation_m: DEFAULT_MIN_SEPARATION_M,
        }
    }
}

impl GravityField {
    pub fn with_min_separation(min_separation_m: f64) -> Self {
        Self {
            min_separation_m,
            ..Self::default()
        }
    }

    /// Evaluate accelerations for every body and pass the velocities through.
    ///
    /// Self pairs never enter the sum. Distinct bodies closer than `min_separation_m` are a
    /// [`DynamicsError::DegenerateGeometry`], and any non-finite acceleration is reported as
    /// [`DynamicsError::NonFiniteState`].
    pub fn derivative(
        &self,
        positions: &[Vector3],
        velocities: &[Vector3],
        masses: &[f64],
    ) -> Result<Derivative, DynamicsError> {
        let n = positions.len();
        if velocities.len() != n || masses.len() != n {
            return Err(DynamicsError::MismatchedLengths {
                ids: n,
                positions: n,
                velocities: velocities.len(),
                masses: masses.len(),
            });
        }

        let mut accelerations = vec![vector::ZERO; n];

        // Each unordered pair once, equal and opposite contributions.
        for i in 0..n {
            for j in (i + 1)..n {
                let d = vector::sub(&positions[j], &positions[i]);
                let r2 = vector::norm_squared(&d);
                let r = r2.sqrt();
                if r <= self.min_separation_m {
                    return Err(DynamicsError::DegenerateGeometry {
                        first: i,
                        second: j,
                        separation: r,
                    });
                }

                let coef = self.g / (r2 * r);
                accelerations[i] = vector::add_scaled(&accelerations[i], &d, coef * masses[j]);
                accelerations[j] = vector::add_scaled(&accelerations[j], &d, -coef * masses[i]);
            }
        }

        if let Some(index) = accelerations.iter().position(|a| !vector::is_finite(a)) {
            return Err(DynamicsError::NonFiniteState { index });
        }

        Ok(Derivative {
            velocities: velocities.to_vec(),
            accelerations,
        })
    }
}
