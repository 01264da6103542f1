//! Mission state machine: waits for an arm signal and the launch epoch, solves the transfer
//! against the live system, then flies the probe in its own reduced system.

pub mod launch;
pub mod probe;

use std::fmt;

use log::{info, warn};
use solar_config::MissionConfig;
use solar_core::time::{days_to_seconds, seconds_to_days};
use solar_core::vector::{self, Vector3};
use solar_dynamics::{BodySystem, DynamicsError, EmbeddedRk, IntegrationError};
use solar_ephemeris::datetime::parse_timestamp;
use solar_ephemeris::{EphemerisError, EphemerisTrace};
use solar_export::{ExportError, RecordSink, StateRecord};
use solar_impulsive::{HohmannResult, LambertSolver, LambertSolverError, hohmann};

use self::launch::{LambertOptions, TransferRequest, TransferSolution, find_bodies, plan_transfer};
use self::probe::Probe;

/// Lifecycle of a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionState {
    Idle,
    /// Armed, waiting for the launch epoch.
    Pending,
    Launched,
    /// Rendezvous burn applied, coasting.
    Braked,
    Complete,
}

impl fmt::Display for MissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MissionState::Idle => "idle",
            MissionState::Pending => "pending",
            MissionState::Launched => "launched",
            MissionState::Braked => "braked",
            MissionState::Complete => "complete",
        };
        f.write_str(label)
    }
}

/// Top-level mission error.
#[derive(Debug, thiserror::Error)]
pub enum MissionError {
    #[error("body `{0}` is not part of the simulated system")]
    UnknownBody(String),
    #[error("ephemeris lookup failed: {0}")]
    Ephemeris(#[from] EphemerisError),
    #[error("transfer solver failed: {0}")]
    TransferSolverFailure(#[from] LambertSolverError),
    #[error(
        "transfer of {requested_days} days resolves to a non-positive time of flight ({corrected_seconds} s)"
    )]
    InvalidDuration {
        requested_days: f64,
        corrected_seconds: f64,
    },
    #[error("probe state error: {0}")]
    Dynamics(#[from] DynamicsError),
    #[error("probe propagation failed: {0}")]
    Integration(#[from] IntegrationError),
    #[error("record sink failed: {0}")]
    Export(#[from] ExportError),
}

/// Static description of the mission.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionSettings {
    pub origin: String,
    pub target: String,
    pub central: String,
    pub probe_id: String,
    pub proxy_id: String,
    /// Earliest launch time (unix s).
    pub launch_epoch: f64,
    pub duration_days: f64,
    pub probe_mass_kg: f64,
    pub auto_brake: bool,
    /// Coast after the rendezvous burn before completing (s).
    pub coast_seconds: f64,
    pub lambert: LambertOptions,
}

impl TryFrom<&MissionConfig> for MissionSettings {
    type Error = MissionError;

    fn try_from(config: &MissionConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            origin: config.origin.clone(),
            target: config.target.clone(),
            central: config.central.clone(),
            probe_id: config.probe_id.clone(),
            proxy_id: config.proxy_id.clone(),
            launch_epoch: parse_timestamp(&config.launch_date)?,
            duration_days: config.duration_days,
            probe_mass_kg: config.probe_mass_kg,
            auto_brake: config.auto_brake,
            coast_seconds: days_to_seconds(config.coast_days),
            lambert: LambertOptions {
                prograde: config.lambert.prograde,
                max_iterations: config.lambert.max_iterations,
                tolerance: config.lambert.tolerance,
            },
        })
    }
}

/// Emitted by a successful launch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchReport {
    pub solution: TransferSolution,
    /// A previous probe was replaced and its records truncated.
    pub relaunch: bool,
}

/// Owns the mission state, the target trace, the solver, and the probe once launched.
pub struct MissionPlanner {
    settings: MissionSettings,
    trace: EphemerisTrace,
    period_s: Option<f64>,
    solver: Box<dyn LambertSolver>,
    state: MissionState,
    armed: bool,
    probe: Option<Probe>,
    transfer: Option<TransferSolution>,
}

impl fmt::Debug for MissionPlanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MissionPlanner")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("armed", &self.armed)
            .field("transfer", &self.transfer)
            .finish_non_exhaustive()
    }
}

impl MissionPlanner {
    /// `trace` is the target's history relative to the central body; `period_s` enables wrap.
    pub fn new(
        settings: MissionSettings,
        trace: EphemerisTrace,
        period_s: Option<f64>,
        solver: Box<dyn LambertSolver>,
    ) -> Self {
        Self {
            settings,
            trace,
            period_s,
            solver,
            state: MissionState::Idle,
            armed: false,
            probe: None,
            transfer: None,
        }
    }

    pub fn settings(&self) -> &MissionSettings {
        &self.settings
    }

    pub fn state(&self) -> MissionState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn probe(&self) -> Option<&Probe> {
        self.probe.as_ref()
    }

    pub fn transfer(&self) -> Option<&TransferSolution> {
        self.transfer.as_ref()
    }

    /// Raise the external arm signal.
    pub fn arm(&mut self) {
        self.armed = true;
        if self.state == MissionState::Idle {
            self.state = MissionState::Pending;
        }
    }

    pub fn disarm(&mut self) {
        self.armed = false;
        if self.state == MissionState::Pending {
            self.state = MissionState::Idle;
        }
    }

    /// Launch if armed and `now` has reached the launch epoch.
    ///
    /// The arm signal is consumed by any attempt. On failure the previous probe, if any, keeps
    /// flying and a pending mission drops back to idle; `system` is never modified.
    pub fn poll_launch(
        &mut self,
        now: f64,
        system: &BodySystem,
        sink: &mut dyn RecordSink,
    ) -> Result<Option<LaunchReport>, MissionError> {
        if !self.armed || now < self.settings.launch_epoch {
            return Ok(None);
        }
        self.armed = false;

        match self.try_launch(now, system, sink) {
            Ok(report) => {
                self.state = MissionState::Launched;
                info!(
                    "launched `{}` towards {} (corrected tof {:.2} d{})",
                    self.settings.probe_id,
                    self.settings.target,
                    seconds_to_days(report.solution.corrected_duration_s),
                    if report.relaunch { ", relaunch" } else { "" }
                );
                Ok(Some(report))
            }
            Err(err) => {
                if self.state == MissionState::Pending {
                    self.state = MissionState::Idle;
                }
                warn!("launch aborted: {err}");
                Err(err)
            }
        }
    }

    fn try_launch(
        &mut self,
        now: f64,
        system: &BodySystem,
        sink: &mut dyn RecordSink,
    ) -> Result<LaunchReport, MissionError> {
        let request = self.request(now);
        let solution = plan_transfer(
            &request,
            system,
            &self.trace,
            self.period_s,
            self.solver.as_ref(),
            &self.settings.lambert,
        )?;

        let bodies = find_bodies(&request, system)?;
        let probe = Probe::launch(
            &self.settings.proxy_id,
            &self.settings.probe_id,
            &bodies.central,
            bodies.origin.position,
            solution.departure_velocity,
            self.settings.probe_mass_kg,
        )?;

        let relaunch = self.probe.is_some();
        if relaunch {
            sink.reset(&self.settings.probe_id)?;
        }
        self.probe = Some(probe);
        self.transfer = Some(solution);
        Ok(LaunchReport { solution, relaunch })
    }

    fn request(&self, now: f64) -> TransferRequest {
        TransferRequest {
            origin_id: self.settings.origin.clone(),
            target_id: self.settings.target.clone(),
            central_id: self.settings.central.clone(),
            departure_epoch: now,
            duration_days: self.settings.duration_days,
        }
    }

    /// Advance the probe by `dt` (the step the primary system accepted).
    ///
    /// Arrival is judged on the corrected transfer duration. With `auto_brake` the rendezvous
    /// burn fires first and the probe coasts for the configured time before completing. The
    /// probe's pre-step state is recorded only once the step has been taken.
    pub fn propagate(
        &mut self,
        dt: f64,
        integrator: &EmbeddedRk,
        date_label: &str,
        sink: &mut dyn RecordSink,
    ) -> Result<MissionState, MissionError> {
        if !matches!(self.state, MissionState::Launched | MissionState::Braked) {
            return Ok(self.state);
        }
        let (Some(probe), Some(transfer)) = (self.probe.as_ref(), self.transfer.as_ref()) else {
            return Ok(self.state);
        };

        let duration = transfer.corrected_duration_s;
        let elapsed = probe.mission_time();
        if self.state == MissionState::Launched && elapsed >= duration {
            if self.settings.auto_brake {
                self.apply_braking_impulse()?;
            } else {
                self.complete();
            }
            return Ok(self.state);
        }
        if self.state == MissionState::Braked && elapsed >= duration + self.settings.coast_seconds {
            self.complete();
            return Ok(self.state);
        }

        let Some(probe) = self.probe.as_mut() else {
            return Ok(self.state);
        };
        let record = probe.probe().map(|view| (view.position, view.velocity));
        probe.advance(integrator, dt)?;
        if let Some((position, velocity)) = record {
            sink.write(&StateRecord {
                body_id: &self.settings.probe_id,
                date: date_label,
                position,
                velocity,
            })?;
        }
        Ok(self.state)
    }

    /// Match the probe to the target's interpolated arrival velocity. Returns the applied Δv, or
    /// `None` when there is no probe in flight or the burn was already made.
    pub fn apply_braking_impulse(&mut self) -> Result<Option<Vector3>, MissionError> {
        if !matches!(self.state, MissionState::Launched | MissionState::Braked) {
            return Ok(None);
        }
        let (Some(probe), Some(transfer)) = (self.probe.as_mut(), self.transfer.as_ref()) else {
            return Ok(None);
        };
        let delta_v = probe.rendezvous(transfer.target_velocity)?;
        if let Some(dv) = delta_v {
            self.state = MissionState::Braked;
            info!(
                "rendezvous burn for `{}`: {:.1} m/s",
                self.settings.probe_id,
                vector::norm(&dv)
            );
        }
        Ok(delta_v)
    }

    fn complete(&mut self) {
        self.state = MissionState::Complete;
        let elapsed = self.probe.as_ref().map_or(0.0, Probe::mission_time);
        info!(
            "mission `{}` complete after {:.2} d",
            self.settings.probe_id,
            seconds_to_days(elapsed)
        );
    }

    /// Hohmann estimate between the origin's and target's current distances from the central body.
    pub fn hohmann_reference(&self, system: &BodySystem) -> Result<Option<HohmannResult>, MissionError> {
        let request = self.request(0.0);
        let bodies = find_bodies(&request, system)?;
        let target = system
            .get(&self.settings.target)
            .ok_or_else(|| MissionError::UnknownBody(self.settings.target.clone()))?;
        let r1 = vector::norm(&vector::sub(&bodies.origin.position, &bodies.central.position));
        let r2 = vector::norm(&vector::sub(&target.position, &bodies.central.position));
        Ok(hohmann(r1, r2, solar_core::constants::G * bodies.central.mass))
    }
}
