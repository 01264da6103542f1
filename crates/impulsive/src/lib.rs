//! Impulsive transfer utilities: the Lambert boundary-value solve and a Hohmann reference estimate.

pub mod lambert;
pub mod transfers;

pub use lambert::{BateLambert, LambertRequest, LambertSolution, LambertSolver, LambertSolverError};
pub use transfers::{HohmannResult, hohmann};
