//! Periodic-wrap linear interpolation of an [`EphemerisTrace`].

use log::warn;
use solar_core::vector::{self, Vector3};

use crate::EphemerisError;
use crate::trace::EphemerisTrace;

/// How the (possibly wrapped) target related to the sampled range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeStatus {
    /// Bracketed by two samples.
    InRange,
    /// Outside the sampled range; held at the nearest sample.
    Clamped,
    /// Only one sample exists; it is returned as is.
    Exhausted,
}

/// Interpolated state together with the bookkeeping that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolation {
    /// Timestamp originally asked for.
    pub requested_timestamp: f64,
    /// Timestamp after periodic wrapping; the one actually interpolated.
    pub target_timestamp: f64,
    pub position: Vector3,
    pub velocity: Vector3,
    pub floor_index: usize,
    pub ceil_index: usize,
    pub floor_timestamp: f64,
    pub ceil_timestamp: f64,
    pub alpha: f64,
    /// Signed count of periods added to the requested timestamp.
    pub wraps: i64,
    /// `target_timestamp - reference_epoch`.
    pub corrected_duration: f64,
    pub status: RangeStatus,
}

/// Interpolate `trace` at `target_timestamp`.
///
/// With a positive finite `period`, a target beyond the last sample is pulled back by whole
/// periods and one before the first sample is pushed forward. The bracket is the first sample at
/// or after the target and its predecessor, and the returned state is the linear blend between
/// them. `corrected_duration` is measured from `reference_epoch` to the wrapped target and is the
/// time of flight downstream consumers must use.
pub fn interpolate(
    trace: &EphemerisTrace,
    target_timestamp: f64,
    reference_epoch: f64,
    period: Option<f64>,
) -> Result<Interpolation, EphemerisError> {
    if !target_timestamp.is_finite() {
        return Err(EphemerisError::InvalidTimestamp(target_timestamp));
    }
    if !reference_epoch.is_finite() {
        return Err(EphemerisError::InvalidTimestamp(reference_epoch));
    }
    let samples = trace.samples();
    let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
        return Err(EphemerisError::RangeExhausted(trace.body().to_string()));
    };
    let (first_t, last_t) = (first.timestamp, last.timestamp);

    let mut target = target_timestamp;
    let mut wraps: i64 = 0;
    if let Some(period) = period.filter(|p| p.is_finite() && *p > 0.0) {
        if target > last_t {
            let k = ((target - last_t) / period).ceil();
            target -= k * period;
            wraps -= k as i64;
            while target > last_t {
                target -= period;
                wraps -= 1;
            }
        }
        if target < first_t {
            let k = ((first_t - target) / period).ceil();
            target += k * period;
            wraps += k as i64;
            while target < first_t {
                target += period;
                wraps += 1;
            }
        }
    }

    let idx = samples.partition_point(|s| s.timestamp < target);
    let floor_index = idx.saturating_sub(1);
    let ceil_index = idx.min(samples.len() - 1);
    let floor = &samples[floor_index];
    let ceil = &samples[ceil_index];

    let alpha = if ceil.timestamp == floor.timestamp {
        0.0
    } else {
        ((target - floor.timestamp) / (ceil.timestamp - floor.timestamp)).clamp(0.0, 1.0)
    };

    let status = if samples.len() == 1 {
        RangeStatus::Exhausted
    } else if target < first_t || target > last_t {
        RangeStatus::Clamped
    } else {
        RangeStatus::InRange
    };
    if status != RangeStatus::InRange {
        warn!(
            "trace `{}` does not cover t={target} (range {first_t}..={last_t}): {status:?}",
            trace.body()
        );
    }

    Ok(Interpolation {
        requested_timestamp: target_timestamp,
        target_timestamp: target,
        position: vector::lerp(&floor.position, &ceil.position, alpha),
        velocity: vector::lerp(&floor.velocity, &ceil.velocity, alpha),
        floor_index,
        ceil_index,
        floor_timestamp: floor.timestamp,
        ceil_timestamp: ceil.timestamp,
        alpha,
        wraps,
        corrected_duration: target - reference_epoch,
        status,
    })
}
