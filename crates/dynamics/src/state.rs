//! Structure-of-arrays body system state.

use std::collections::HashSet;

use solar_core::constants::G;
use solar_core::vector::{self, Vector3};

use crate::DynamicsError;

/// Owned description of a single body, used to seed a [`BodySystem`].
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub id: String,
    pub position: Vector3,
    pub velocity: Vector3,
    pub mass: f64,
}

impl Body {
    pub fn new(id: impl Into<String>, position: Vector3, velocity: Vector3, mass: f64) -> Self {
        Self {
            id: id.into(),
            position,
            velocity,
            mass,
        }
    }
}

/// Borrowed per-body view derived on demand from the parallel arrays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView<'a> {
    pub index: usize,
    pub id: &'a str,
    pub position: Vector3,
    pub velocity: Vector3,
    pub mass: f64,
}

/// Ordered body identities plus index-aligned positions (m), velocities (m/s), and masses (kg).
///
/// The arrays are only reachable through accessors so the length and mass invariants checked
/// at construction hold for the lifetime of the value.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySystem {
    ids: Vec<String>,
    positions: Vec<Vector3>,
    velocities: Vec<Vector3>,
    masses: Vec<f64>,
}

impl BodySystem {
    /// Build a system from parallel arrays, validating lengths, masses, and id uniqueness.
    pub fn new(
        ids: Vec<String>,
        positions: Vec<Vector3>,
        velocities: Vec<Vector3>,
        masses: Vec<f64>,
    ) -> Result<Self, DynamicsError> {
        let n = ids.len();
        if positions.len() != n || velocities.len() != n || masses.len() != n {
            return Err(DynamicsError::MismatchedLengths {
                ids: n,
                positions: positions.len(),
                velocities: velocities.len(),
                masses: masses.len(),
            });
        }

        let mut seen = HashSet::with_capacity(n);
        for (id, mass) in ids.iter().zip(&masses) {
            if !(mass.is_finite() && *mass > 0.0) {
                return Err(DynamicsError::InvalidMass {
                    id: id.clone(),
                    mass: *mass,
                });
            }
            if !seen.insert(id.as_str()) {
                return Err(DynamicsError::DuplicateId(id.clone()));
            }
        }

        for (index, (p, v)) in positions.iter().zip(&velocities).enumerate() {
            if !vector::is_finite(p) || !vector::is_finite(v) {
                return Err(DynamicsError::NonFiniteState { index });
            }
        }

        Ok(Self {
            ids,
            positions,
            velocities,
            masses,
        })
    }

    /// Build a system from owned body descriptions, preserving their order.
    pub fn from_bodies<I>(bodies: I) -> Result<Self, DynamicsError>
    where
        I: IntoIterator<Item = Body>,
    {
        let mut ids = Vec::new();
        let mut positions = Vec::new();
        let mut velocities = Vec::new();
        let mut masses = Vec::new();
        for body in bodies {
            ids.push(body.id);
            positions.push(body.position);
            velocities.push(body.velocity);
            masses.push(body.mass);
        }
        Self::new(ids, positions, velocities, masses)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn positions(&self) -> &[Vector3] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Vector3] {
        &self.velocities
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Index of the body with the given id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|candidate| candidate == id)
    }

    /// View of the body at `index`.
    pub fn body(&self, index: usize) -> Option<BodyView<'_>> {
        Some(BodyView {
            index,
            id: self.ids.get(index)?,
            position: self.positions[index],
            velocity: self.velocities[index],
            mass: self.masses[index],
        })
    }

    /// View of the body with the given id.
    pub fn get(&self, id: &str) -> Option<BodyView<'_>> {
        self.index_of(id).and_then(|index| self.body(index))
    }

    /// Iterate views over every body in order.
    pub fn iter(&self) -> impl Iterator<Item = BodyView<'_>> + '_ {
        (0..self.len()).filter_map(move |index| self.body(index))
    }

    /// Overwrite the velocity of one body, e.g. for an impulsive burn.
    pub fn set_velocity(&mut self, index: usize, velocity: Vector3) -> Result<(), DynamicsError> {
        if !vector::is_finite(&velocity) {
            return Err(DynamicsError::NonFiniteState { index });
        }
        let len = self.len();
        let slot = self
            .velocities
            .get_mut(index)
            .ok_or(DynamicsError::UnknownIndex { index, len })?;
        *slot = velocity;
        Ok(())
    }

    /// Add position and velocity increments in place. Lengths are guaranteed by the caller.
    pub(crate) fn apply_increments(&mut self, dp: &[Vector3], dv: &[Vector3]) {
        for (p, d) in self.positions.iter_mut().zip(dp) {
            *p = vector::add(p, d);
        }
        for (v, d) in self.velocities.iter_mut().zip(dv) {
            *v = vector::add(v, d);
        }
    }

    /// Total linear momentum Σ mᵢ·vᵢ (kg·m/s).
    pub fn total_momentum(&self) -> Vector3 {
        self.velocities
            .iter()
            .zip(&self.masses)
            .fold(vector::ZERO, |acc, (v, m)| vector::add_scaled(&acc, v, *m))
    }

    /// Total mechanical energy: kinetic plus pairwise Newtonian potential (J).
    pub fn total_energy(&self) -> f64 {
        let kinetic: f64 = self
            .velocities
            .iter()
            .zip(&self.masses)
            .map(|(v, m)| 0.5 * m * vector::norm_squared(v))
            .sum();

        let mut potential = 0.0;
        for i in 0..self.len() {
            for j in (i + 1)..self.len() {
                let r = vector::norm(&vector::sub(&self.positions[j], &self.positions[i]));
                potential -= G * self.masses[i] * self.masses[j] / r;
            }
        }

        kinetic + potential
    }
}
