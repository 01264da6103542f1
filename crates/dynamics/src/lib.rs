//! N-body dynamics: structure-of-arrays body state, pairwise Newtonian gravity, and a
//! Butcher-tableau driven embedded Runge–Kutta stepper with adaptive and fixed-step modes.

pub mod diagnostics;
pub mod gravity;
pub mod integrator;
pub mod state;
pub mod tableau;

pub use diagnostics::{StepDiagnostics, StepSample};
pub use gravity::{Derivative, GravityField};
pub use integrator::{EmbeddedRk, IntegrationError, IntegratorSettings, StepOutcome};
pub use state::{Body, BodySystem, BodyView};
pub use tableau::ButcherTableau;

use thiserror::Error;

/// Errors raised while building or evaluating a body system.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DynamicsError {
    #[error(
        "state arrays disagree in length: {ids} ids, {positions} positions, {velocities} velocities, {masses} masses"
    )]
    MismatchedLengths {
        ids: usize,
        positions: usize,
        velocities: usize,
        masses: usize,
    },
    #[error("body `{id}` has a non-positive or non-finite mass ({mass} kg)")]
    InvalidMass { id: String, mass: f64 },
    #[error("duplicate body id `{0}`")]
    DuplicateId(String),
    #[error("degenerate geometry: bodies {first} and {second} are {separation} m apart")]
    DegenerateGeometry {
        first: usize,
        second: usize,
        separation: f64,
    },
    #[error("non-finite state encountered for body {index}")]
    NonFiniteState { index: usize },
    #[error("body index {index} is out of range for {len} bodies")]
    UnknownIndex { index: usize, len: usize },
}
