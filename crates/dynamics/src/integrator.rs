//! Tableau-driven explicit Runge–Kutta stepper with adaptive and fixed-step modes.

use log::{debug, warn};
use solar_core::vector::{self, Vector3};
use thiserror::Error;

use crate::diagnostics::StepDiagnostics;
use crate::gravity::GravityField;
use crate::state::BodySystem;
use crate::tableau::{ButcherTableau, DORMAND_PRINCE_54};
use crate::DynamicsError;

/// Largest step growth applied when the error estimate vanishes.
pub const MAX_GROWTH: f64 = 5.0;

/// Step-size control parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorSettings {
    pub tolerance: f64,
    pub safety: f64,
    pub max_retries: u32,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            safety: 0.9,
            max_retries: 32,
        }
    }
}

/// Result of an accepted adaptive step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Step actually committed to the state (s).
    pub dt: f64,
    /// Error estimate of the committed step.
    pub error: f64,
    /// Number of trials, including the accepted one.
    pub attempts: u32,
    /// Recommended trial step for the next call (s).
    pub next_dt: f64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IntegrationError {
    #[error(
        "step did not converge after {attempts} attempts (error {error:e} > tolerance {tolerance:e}, last proposed dt {dt} s)"
    )]
    NumericNonConvergence {
        attempts: u32,
        error: f64,
        tolerance: f64,
        /// Step proposed after the final rejected trial.
        dt: f64,
    },
    #[error("tableau `{0}` has no embedded solution and cannot drive adaptive steps")]
    NotEmbedded(&'static str),
    #[error("invalid step size: {0}")]
    InvalidStep(f64),
    #[error("dynamics error: {0}")]
    Dynamics(#[from] DynamicsError),
}

/// Scaled stage increments `dt * f(stage state)`, split into position and velocity blocks.
struct Stage {
    dp: Vec<Vector3>,
    dv: Vec<Vector3>,
}

/// Explicit Runge–Kutta integrator over a [`BodySystem`] under a [`GravityField`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmbeddedRk {
    pub tableau: &'static ButcherTableau,
    pub field: GravityField,
    pub settings: IntegratorSettings,
}

impl Default for EmbeddedRk {
    fn default() -> Self {
        Self::new(&DORMAND_PRINCE_54, GravityField::default(), IntegratorSettings::default())
    }
}

impl EmbeddedRk {
    pub fn new(
        tableau: &'static ButcherTableau,
        field: GravityField,
        settings: IntegratorSettings,
    ) -> Self {
        Self {
            tableau,
            field,
            settings,
        }
    }

    /// Try `dt`, shrinking it until the embedded error estimate meets the tolerance.
    ///
    /// The state is only written when a trial is accepted. Accepted steps are recorded in
    /// `diagnostics` when one is supplied.
    pub fn step_adaptive(
        &self,
        system: &mut BodySystem,
        dt: f64,
        mut diagnostics: Option<&mut StepDiagnostics>,
    ) -> Result<StepOutcome, IntegrationError> {
        let b_star = self
            .tableau
            .b_star
            .ok_or(IntegrationError::NotEmbedded(self.tableau.name))?;
        let tolerance = self.settings.tolerance;
        let max_retries = self.settings.max_retries.max(1);

        let mut trial = dt;
        let mut last_error = f64::NAN;
        for attempt in 1..=max_retries {
            check_step(trial)?;
            let stages = self.stages(system, trial)?;
            let (dp, dv) = combine(&stages, self.tableau.b);
            let (dp_star, dv_star) = combine(&stages, b_star);
            let error = error_norm(&dp, &dp_star, &dv, &dv_star);
            let next_dt = self.propose(trial, error);

            if error <= tolerance {
                system.apply_increments(&dp, &dv);
                if let Some(diag) = diagnostics.as_deref_mut() {
                    diag.record(trial, error);
                }
                return Ok(StepOutcome {
                    dt: trial,
                    error,
                    attempts: attempt,
                    next_dt,
                });
            }

            debug!(
                "rejected dt={trial:.3} s (error {error:e} > {tolerance:e}), retrying with {next_dt:.3} s"
            );
            if let Some(diag) = diagnostics.as_deref_mut() {
                diag.record_rejection();
            }
            last_error = error;
            trial = next_dt;
        }

        warn!("step control gave up after {max_retries} attempts, last error {last_error:e}");
        Err(IntegrationError::NumericNonConvergence {
            attempts: max_retries,
            error: last_error,
            tolerance,
            dt: trial,
        })
    }

    /// Advance by exactly `dt` using the propagated weights. Returns `dt`.
    pub fn step_fixed(&self, system: &mut BodySystem, dt: f64) -> Result<f64, IntegrationError> {
        check_step(dt)?;
        let stages = self.stages(system, dt)?;
        let (dp, dv) = combine(&stages, self.tableau.b);
        system.apply_increments(&dp, &dv);
        Ok(dt)
    }

    /// `safety * dt * (tol / error)^(1 / (order + 1))`, growth capped when the error vanishes.
    pub fn propose(&self, dt: f64, error: f64) -> f64 {
        if error <= 0.0 {
            return dt * MAX_GROWTH;
        }
        let exponent = 1.0 / (f64::from(self.tableau.order) + 1.0);
        self.settings.safety * dt * (self.settings.tolerance / error).powf(exponent)
    }

    fn stages(&self, system: &BodySystem, dt: f64) -> Result<Vec<Stage>, DynamicsError> {
        let base_p = system.positions();
        let base_v = system.velocities();
        let masses = system.masses();
        let mut stages: Vec<Stage> = Vec::with_capacity(self.tableau.stages);

        for s in 0..self.tableau.stages {
            let row = self.tableau.a_row(s);
            let mut p = base_p.to_vec();
            let mut v = base_v.to_vec();
            for (coef, prev) in row.iter().zip(&stages) {
                if *coef == 0.0 {
                    continue;
                }
                accumulate(&mut p, &prev.dp, *coef);
                accumulate(&mut v, &prev.dv, *coef);
            }

            let derivative = self.field.derivative(&p, &v, masses)?;
            stages.push(Stage {
                dp: scaled(&derivative.velocities, dt),
                dv: scaled(&derivative.accelerations, dt),
            });
        }

        Ok(stages)
    }
}

fn check_step(dt: f64) -> Result<(), IntegrationError> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(IntegrationError::InvalidStep(dt))
    }
}

fn scaled(values: &[Vector3], s: f64) -> Vec<Vector3> {
    values.iter().map(|v| vector::scale(v, s)).collect()
}

fn accumulate(target: &mut [Vector3], increments: &[Vector3], coef: f64) {
    for (t, d) in target.iter_mut().zip(increments) {
        *t = vector::add_scaled(t, d, coef);
    }
}

fn combine(stages: &[Stage], weights: &[f64]) -> (Vec<Vector3>, Vec<Vector3>) {
    let n = stages.first().map_or(0, |s| s.dp.len());
    let mut dp = vec![vector::ZERO; n];
    let mut dv = vec![vector::ZERO; n];
    for (w, stage) in weights.iter().zip(stages) {
        if *w == 0.0 {
            continue;
        }
        accumulate(&mut dp, &stage.dp, *w);
        accumulate(&mut dv, &stage.dv, *w);
    }
    (dp, dv)
}

/// Frobenius norm of the position and velocity differences taken together.
fn error_norm(dp: &[Vector3], dp_star: &[Vector3], dv: &[Vector3], dv_star: &[Vector3]) -> f64 {
    let block = |a: &[Vector3], b: &[Vector3]| -> f64 {
        a.iter()
            .zip(b)
            .map(|(x, y)| vector::norm_squared(&vector::sub(x, y)))
            .sum::<f64>()
    };
    (block(dp, dp_star) + block(dv, dv_star)).sqrt()
}
