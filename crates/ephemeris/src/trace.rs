use log::debug;
use solar_core::vector::{self, Vector3};

use crate::EphemerisError;

/// One sampled state: unix timestamp (s), position (m), velocity (m/s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EphemerisSample {
    pub timestamp: f64,
    pub position: Vector3,
    pub velocity: Vector3,
}

impl EphemerisSample {
    pub fn new(timestamp: f64, position: Vector3, velocity: Vector3) -> Self {
        Self {
            timestamp,
            position,
            velocity,
        }
    }
}

/// Strictly time-ascending sampled history of a single body.
#[derive(Debug, Clone, PartialEq)]
pub struct EphemerisTrace {
    body: String,
    samples: Vec<EphemerisSample>,
}

impl EphemerisTrace {
    /// Validate ordering and finiteness. An empty trace is allowed here and rejected at query time.
    pub fn new(
        body: impl Into<String>,
        samples: Vec<EphemerisSample>,
    ) -> Result<Self, EphemerisError> {
        let body = body.into();
        for (index, sample) in samples.iter().enumerate() {
            if !sample.timestamp.is_finite()
                || !vector::is_finite(&sample.position)
                || !vector::is_finite(&sample.velocity)
            {
                return Err(EphemerisError::NonFinite {
                    body: body.clone(),
                    index,
                });
            }
            if index > 0 && sample.timestamp <= samples[index - 1].timestamp {
                return Err(EphemerisError::NonMonotonic {
                    body: body.clone(),
                    index,
                    timestamp: sample.timestamp,
                });
            }
        }
        debug!("trace `{body}` holds {} samples", samples.len());
        Ok(Self { body, samples })
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn samples(&self) -> &[EphemerisSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<f64> {
        self.samples.first().map(|s| s.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.samples.last().map(|s| s.timestamp)
    }

    /// Re-express this trace relative to `reference`, sample by sample.
    ///
    /// Used to make a barycentric target trace heliocentric by subtracting the Sun trace. Both
    /// traces must share their timestamps.
    pub fn relative_to(&self, reference: &EphemerisTrace) -> Result<Self, EphemerisError> {
        let aligned = self.samples.len() == reference.samples.len()
            && self
                .samples
                .iter()
                .zip(&reference.samples)
                .all(|(a, b)| a.timestamp == b.timestamp);
        if !aligned {
            return Err(EphemerisError::MisalignedTraces {
                body: self.body.clone(),
                reference: reference.body.clone(),
            });
        }

        let samples = self
            .samples
            .iter()
            .zip(&reference.samples)
            .map(|(a, b)| {
                EphemerisSample::new(
                    a.timestamp,
                    vector::sub(&a.position, &b.position),
                    vector::sub(&a.velocity, &b.velocity),
                )
            })
            .collect();
        Ok(Self {
            body: self.body.clone(),
            samples,
        })
    }
}
