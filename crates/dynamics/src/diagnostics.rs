use serde::Serialize;

/// One accepted step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepSample {
    pub dt: f64,
    pub error: f64,
}

/// Caller-owned record of accepted steps and rejected trials.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepDiagnostics {
    pub steps: Vec<StepSample>,
    pub rejections: usize,
}

impl StepDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, dt: f64, error: f64) {
        self.steps.push(StepSample { dt, error });
    }

    pub fn record_rejection(&mut self) {
        self.rejections += 1;
    }

    pub fn accepted(&self) -> usize {
        self.steps.len()
    }

    pub fn min_dt(&self) -> Option<f64> {
        self.steps.iter().map(|s| s.dt).reduce(f64::min)
    }

    pub fn max_dt(&self) -> Option<f64> {
        self.steps.iter().map(|s| s.dt).reduce(f64::max)
    }

    pub fn mean_dt(&self) -> Option<f64> {
        if self.steps.is_empty() {
            return None;
        }
        Some(self.steps.iter().map(|s| s.dt).sum::<f64>() / self.steps.len() as f64)
    }

    pub fn max_error(&self) -> Option<f64> {
        self.steps.iter().map(|s| s.error).reduce(f64::max)
    }
}
