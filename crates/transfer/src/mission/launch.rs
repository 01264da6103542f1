//! Launch planning: turn the live body state and a target trace into a Lambert transfer.

use log::info;
use solar_core::constants::G;
use solar_core::time::{days_to_seconds, seconds_to_days};
use solar_core::vector::{self, Vector3};
use solar_dynamics::{BodySystem, BodyView};
use solar_ephemeris::{EphemerisTrace, Interpolation, interpolate};
use solar_impulsive::{LambertRequest, LambertSolver, hohmann};

use super::MissionError;

/// Solver knobs forwarded into every [`LambertRequest`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertOptions {
    pub prograde: bool,
    pub max_iterations: u32,
    pub tolerance: f64,
}

impl Default for LambertOptions {
    fn default() -> Self {
        Self {
            prograde: true,
            max_iterations: 500,
            tolerance: 1e-8,
        }
    }
}

/// What to fly: from `origin_id` to `target_id` about `central_id`, departing at
/// `departure_epoch` (unix s) and nominally arriving `duration_days` later.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub origin_id: String,
    pub target_id: String,
    pub central_id: String,
    pub departure_epoch: f64,
    pub duration_days: f64,
}

/// A solved transfer. Velocities are relative to the central body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSolution {
    pub departure_epoch: f64,
    pub departure_velocity: Vector3,
    pub arrival_velocity: Vector3,
    /// Time of flight actually solved for (s), after periodic wrapping of the arrival epoch.
    pub corrected_duration_s: f64,
    /// Interpolated target position at arrival, relative to the central body.
    pub target_position: Vector3,
    /// Interpolated target velocity at arrival, relative to the central body.
    pub target_velocity: Vector3,
    pub interpolation: Interpolation,
}

/// Bodies a launch reads from the live system.
pub(crate) struct LaunchBodies<'a> {
    pub origin: BodyView<'a>,
    pub central: BodyView<'a>,
}

pub(crate) fn find_bodies<'a>(
    request: &TransferRequest,
    system: &'a BodySystem,
) -> Result<LaunchBodies<'a>, MissionError> {
    let lookup = |id: &str| {
        system
            .get(id)
            .ok_or_else(|| MissionError::UnknownBody(id.to_string()))
    };
    let origin = lookup(&request.origin_id)?;
    lookup(&request.target_id)?;
    let central = lookup(&request.central_id)?;
    Ok(LaunchBodies { origin, central })
}

/// Solve the transfer described by `request` against the current `system`.
///
/// `trace` must already be expressed relative to the central body. The arrival epoch is
/// interpolated with periodic wrap, and the Lambert time of flight is the corrected duration
/// that wrap produces, not the nominal one.
pub fn plan_transfer(
    request: &TransferRequest,
    system: &BodySystem,
    trace: &EphemerisTrace,
    period_s: Option<f64>,
    solver: &dyn LambertSolver,
    options: &LambertOptions,
) -> Result<TransferSolution, MissionError> {
    let bodies = find_bodies(request, system)?;
    let nominal_arrival = request.departure_epoch + days_to_seconds(request.duration_days);
    let interpolation = interpolate(trace, nominal_arrival, request.departure_epoch, period_s)?;

    let corrected = interpolation.corrected_duration;
    if !(corrected.is_finite() && corrected > 0.0) {
        return Err(MissionError::InvalidDuration {
            requested_days: request.duration_days,
            corrected_seconds: corrected,
        });
    }

    let r1 = vector::sub(&bodies.origin.position, &bodies.central.position);
    let mu = G * bodies.central.mass;
    let lambert = LambertRequest {
        mu_m3_s2: mu,
        r1_m: r1,
        r2_m: interpolation.position,
        time_of_flight_s: corrected,
        prograde: options.prograde,
        low_path: true,
        max_iterations: options.max_iterations,
        tolerance: options.tolerance,
    };
    let solution = solver.solve(&lambert)?;

    info!(
        "transfer {} -> {}: tof {:.2} d (requested {:.2} d, {} wraps), departure dv {:.1} m/s",
        request.origin_id,
        request.target_id,
        seconds_to_days(corrected),
        request.duration_days,
        interpolation.wraps,
        vector::norm(&vector::sub(
            &solution.departure_velocity,
            &vector::sub(&bodies.origin.velocity, &bodies.central.velocity)
        )),
    );
    if let Some(reference) = hohmann(vector::norm(&r1), vector::norm(&interpolation.position), mu) {
        info!(
            "hohmann reference: tof {:.2} d, dv {:.1} m/s",
            seconds_to_days(reference.tof_seconds),
            reference.dv_total_m_s
        );
    }

    Ok(TransferSolution {
        departure_epoch: request.departure_epoch,
        departure_velocity: solution.departure_velocity,
        arrival_velocity: solution.arrival_velocity,
        corrected_duration_s: corrected,
        target_position: interpolation.position,
        target_velocity: interpolation.velocity,
        interpolation,
    })
}
