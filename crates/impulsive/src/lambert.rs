use lambert_bate::get_velocities;
use log::debug;
use solar_core::units::{convert3, kms_to_ms, m_to_km};
use solar_core::vector::{self, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LambertSolverError {
    #[error("lambert solver failed: {0}")]
    Failure(String),
    #[error("invalid lambert input: {0}")]
    InvalidInput(String),
    #[error("lambert solver returned a non-finite velocity")]
    NonFinite,
}

/// Boundary-value problem in SI units: reach `r2_m` from `r1_m` in `time_of_flight_s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertRequest {
    pub mu_m3_s2: f64,
    pub r1_m: Vector3,
    pub r2_m: Vector3,
    pub time_of_flight_s: f64,
    pub prograde: bool,
    /// Branch selector for multi-revolution arcs. Zero-revolution solvers ignore it.
    pub low_path: bool,
    pub max_iterations: u32,
    pub tolerance: f64,
}

impl LambertRequest {
    /// Prograde, zero-revolution request with the default iteration budget.
    pub fn new(mu_m3_s2: f64, r1_m: Vector3, r2_m: Vector3, time_of_flight_s: f64) -> Self {
        Self {
            mu_m3_s2,
            r1_m,
            r2_m,
            time_of_flight_s,
            prograde: true,
            low_path: true,
            max_iterations: 500,
            tolerance: 1e-8,
        }
    }

    /// Whether the transfer sweeps less than 180°, given the requested direction of motion.
    pub fn is_short_way(&self) -> bool {
        let z = vector::cross(&self.r1_m, &self.r2_m)[2];
        self.prograde == (z >= 0.0)
    }
}

/// Departure and arrival velocities (m/s) on the transfer arc.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertSolution {
    pub departure_velocity: Vector3,
    pub arrival_velocity: Vector3,
}

/// Anything able to solve [`LambertRequest`]s.
pub trait LambertSolver {
    fn solve(&self, request: &LambertRequest) -> Result<LambertSolution, LambertSolverError>;
}

/// Universal-variable solver from the `lambert-bate` crate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BateLambert;

impl LambertSolver for BateLambert {
    fn solve(&self, request: &LambertRequest) -> Result<LambertSolution, LambertSolverError> {
        validate(request)?;

        let r1_km = convert3(&request.r1_m, m_to_km);
        let r2_km = convert3(&request.r2_m, m_to_km);
        let mu_km3_s2 = request.mu_m3_s2 * 1e-9;
        let short = request.is_short_way();
        let max_iterations = request
            .max_iterations
            .try_into()
            .map_err(|_| LambertSolverError::InvalidInput("iteration budget out of range".into()))?;

        let (v1_km_s, v2_km_s) = get_velocities(
            r1_km,
            r2_km,
            request.time_of_flight_s,
            mu_km3_s2,
            short,
            request.tolerance,
            max_iterations,
        )
        .map_err(|e| LambertSolverError::Failure(format!("{e:?}")))?;

        let departure_velocity = convert3(&v1_km_s, kms_to_ms);
        let arrival_velocity = convert3(&v2_km_s, kms_to_ms);
        if !vector::is_finite(&departure_velocity) || !vector::is_finite(&arrival_velocity) {
            return Err(LambertSolverError::NonFinite);
        }
        debug!(
            "lambert tof={:.0} s short={short}: |v1|={:.1} m/s |v2|={:.1} m/s",
            request.time_of_flight_s,
            vector::norm(&departure_velocity),
            vector::norm(&arrival_velocity)
        );

        Ok(LambertSolution {
            departure_velocity,
            arrival_velocity,
        })
    }
}

fn validate(request: &LambertRequest) -> Result<(), LambertSolverError> {
    if !(request.time_of_flight_s.is_finite() && request.time_of_flight_s > 0.0) {
        return Err(LambertSolverError::InvalidInput(format!(
            "time of flight must be positive, got {}",
            request.time_of_flight_s
        )));
    }
    if !(request.mu_m3_s2.is_finite() && request.mu_m3_s2 > 0.0) {
        return Err(LambertSolverError::InvalidInput(format!(
            "gravitational parameter must be positive, got {}",
            request.mu_m3_s2
        )));
    }
    let r1 = vector::norm(&request.r1_m);
    let r2 = vector::norm(&request.r2_m);
    if !(r1.is_finite() && r2.is_finite() && r1 > 0.0 && r2 > 0.0) {
        return Err(LambertSolverError::InvalidInput(
            "endpoints must be finite and away from the central body".into(),
        ));
    }
    Ok(())
}
