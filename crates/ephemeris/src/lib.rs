//! Discretely sampled ephemeris traces and the interpolation that reconciles them with the
//! continuous simulation clock.

pub mod datetime;
pub mod interpolate;
pub mod periods;
pub mod trace;

pub use interpolate::{Interpolation, RangeStatus, interpolate};
pub use periods::OrbitalPeriods;
pub use trace::{EphemerisSample, EphemerisTrace};

use thiserror::Error;

/// Errors surfaced while building or querying ephemeris traces.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("ephemeris trace `{0}` has no samples")]
    RangeExhausted(String),
    #[error("trace `{body}` timestamps must strictly increase (sample {index}: {timestamp})")]
    NonMonotonic {
        body: String,
        index: usize,
        timestamp: f64,
    },
    #[error("trace `{body}` has a non-finite value at sample {index}")]
    NonFinite { body: String, index: usize },
    #[error("traces `{body}` and `{reference}` are not sampled on the same timestamps")]
    MisalignedTraces { body: String, reference: String },
    #[error("invalid target timestamp {0}")]
    InvalidTimestamp(f64),
    #[error("unrecognised date-time `{0}`")]
    InvalidDate(String),
}
