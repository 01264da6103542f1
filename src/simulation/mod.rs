//! Tick-driven simulation loop.
//!
//! Each [`Simulation::tick`] advances the primary system adaptively. Once the step is accepted it
//! polls the mission for launch, hands the pre-step bodies to the record sink, flies the probe
//! with the accepted step, and finally moves the clock by that same step.

mod clock;
mod setup;

pub use clock::SimClock;
pub use setup::bodies_from_config;

use log::{debug, warn};
use solar_config::ConfigError;
use solar_dynamics::{BodySystem, DynamicsError, EmbeddedRk, IntegrationError, StepDiagnostics};
use solar_export::{ExportError, RecordSink, StateRecord};
use solar_importer::ImportError;
use solar_transfer::{MissionError, MissionPlanner, MissionState};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),
    #[error("record sink failed: {0}")]
    Export(#[from] ExportError),
    #[error("invalid body set: {0}")]
    Dynamics(#[from] DynamicsError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("import failed: {0}")]
    Import(#[from] ImportError),
    #[error("mission setup failed: {0}")]
    Mission(#[from] MissionError),
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Step accepted for the primary system (s).
    pub dt: f64,
    pub error: f64,
    pub attempts: u32,
    pub simulated_seconds: f64,
    pub mission_state: Option<MissionState>,
    /// A probe was launched during this tick.
    pub launched: bool,
    /// Mission failure raised during this tick; the primary system still advanced.
    pub mission_fault: Option<String>,
}

/// Primary body system, its integrator, the clock, and an optional mission.
#[derive(Debug)]
pub struct Simulation {
    clock: SimClock,
    system: BodySystem,
    integrator: EmbeddedRk,
    next_dt: f64,
    mission: Option<MissionPlanner>,
    diagnostics: StepDiagnostics,
    ticks: u64,
}

impl Simulation {
    pub fn new(system: BodySystem, integrator: EmbeddedRk, clock: SimClock, initial_dt: f64) -> Self {
        Self {
            clock,
            system,
            integrator,
            next_dt: initial_dt,
            mission: None,
            diagnostics: StepDiagnostics::new(),
            ticks: 0,
        }
    }

    pub fn with_mission(mut self, mission: MissionPlanner) -> Self {
        self.mission = Some(mission);
        self
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    pub fn system(&self) -> &BodySystem {
        &self.system
    }

    pub fn integrator(&self) -> &EmbeddedRk {
        &self.integrator
    }

    pub fn mission(&self) -> Option<&MissionPlanner> {
        self.mission.as_ref()
    }

    pub fn mission_mut(&mut self) -> Option<&mut MissionPlanner> {
        self.mission.as_mut()
    }

    pub fn diagnostics(&self) -> &StepDiagnostics {
        &self.diagnostics
    }

    /// Trial step the next tick will start from.
    pub fn next_dt(&self) -> f64 {
        self.next_dt
    }

    /// Ticks that advanced the primary system.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick.
    ///
    /// If the primary step fails to converge the tick is abandoned: no records are written, the
    /// mission is not polled, and the next tick starts from the last step the controller proposed.
    /// Records and the launch poll use the state the step started from.
    pub fn tick(&mut self, sink: &mut dyn RecordSink) -> Result<TickReport, SimulationError> {
        let now = self.clock.now_unix();
        let label = self.clock.date_label();
        let start = self.system.clone();

        let outcome =
            match self
                .integrator
                .step_adaptive(&mut self.system, self.next_dt, Some(&mut self.diagnostics))
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    if let IntegrationError::NumericNonConvergence { dt, .. } = &err {
                        if dt.is_finite() && *dt > 0.0 {
                            self.next_dt = *dt;
                        }
                    }
                    warn!("tick at {label} abandoned: {err}");
                    return Err(err.into());
                }
            };
        self.clock.advance(outcome.dt);
        self.next_dt = outcome.next_dt;
        self.ticks += 1;
        debug!(
            "tick {}: dt={:.2} s error={:e} attempts={}",
            self.ticks, outcome.dt, outcome.error, outcome.attempts
        );

        let mut launched = false;
        let mut mission_fault = None;
        if let Some(mission) = self.mission.as_mut() {
            match mission.poll_launch(now, &start, sink) {
                Ok(report) => launched = report.is_some(),
                Err(err) => mission_fault = Some(err.to_string()),
            }
        }

        for body in start.iter() {
            sink.write(&StateRecord {
                body_id: body.id,
                date: &label,
                position: body.position,
                velocity: body.velocity,
            })?;
        }

        if let Some(mission) = self.mission.as_mut() {
            if let Err(err) = mission.propagate(outcome.dt, &self.integrator, &label, sink) {
                warn!("mission fault at {label}: {err}");
                mission_fault.get_or_insert(err.to_string());
            }
        }

        Ok(TickReport {
            dt: outcome.dt,
            error: outcome.error,
            attempts: outcome.attempts,
            simulated_seconds: self.clock.simulated_seconds,
            mission_state: self.mission.as_ref().map(MissionPlanner::state),
            launched,
            mission_fault,
        })
    }
}
