use chrono::{DateTime, Utc};
use solar_core::constants::SECONDS_PER_YEAR;
use solar_core::time::seconds_to_days;
use solar_ephemeris::datetime::{LABEL_FORMAT, format_timestamp};

/// Simulated time: a unix start instant plus the seconds integrated so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimClock {
    pub start_unix: f64,
    pub simulated_seconds: f64,
}

impl SimClock {
    pub fn new(start_unix: f64) -> Self {
        Self {
            start_unix,
            simulated_seconds: 0.0,
        }
    }

    pub fn now_unix(&self) -> f64 {
        self.start_unix + self.simulated_seconds
    }

    pub fn now(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp(self.now_unix().floor() as i64, 0)
    }

    /// Current instant formatted as `Friday December 20 2024 00:00:00`.
    pub fn date_label(&self) -> String {
        match self.now() {
            Some(now) => now.format(LABEL_FORMAT).to_string(),
            None => format_timestamp(self.now_unix()),
        }
    }

    pub fn advance(&mut self, dt: f64) {
        self.simulated_seconds += dt;
    }

    pub fn simulated_days(&self) -> f64 {
        seconds_to_days(self.simulated_seconds)
    }

    pub fn simulated_years(&self) -> f64 {
        self.simulated_seconds / SECONDS_PER_YEAR
    }
}
