use std::collections::HashMap;

use solar_core::time::days_to_seconds;

/// Built-in sidereal periods in days.
const DEFAULT_PERIODS_DAYS: [(&str, f64); 2] = [("EARTH", 365.0), ("MARS", 686.980)];

/// Case-insensitive orbital period lookup used to wrap targets beyond a trace's span.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitalPeriods {
    days: HashMap<String, f64>,
}

impl Default for OrbitalPeriods {
    fn default() -> Self {
        let days = DEFAULT_PERIODS_DAYS
            .iter()
            .map(|(body, days)| (body.to_string(), *days))
            .collect();
        Self { days }
    }
}

impl OrbitalPeriods {
    /// An empty table, without the built-in entries.
    pub fn empty() -> Self {
        Self {
            days: HashMap::new(),
        }
    }

    /// Add or replace the period of `body`.
    pub fn insert(&mut self, body: &str, days: f64) {
        self.days.insert(body.to_ascii_uppercase(), days);
    }

    pub fn period_days(&self, body: &str) -> Option<f64> {
        self.days.get(&body.to_ascii_uppercase()).copied()
    }

    pub fn period_seconds(&self, body: &str) -> Option<f64> {
        self.period_days(body).map(days_to_seconds)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
