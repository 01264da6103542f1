//! Core units, constants, and shared primitives for the solar transfer simulator workspace.

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Newtonian gravitational constant (m³ kg⁻¹ s⁻²).
    pub const G: f64 = 6.674_30e-11;
    /// Kilometres per astronomical unit.
    pub const AU_KM: f64 = 149_597_870.7;
    /// Metres per astronomical unit.
    pub const AU_M: f64 = AU_KM * 1_000.0;
    /// Seconds per day.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    /// Seconds per Julian year, used for progress reporting only.
    pub const SECONDS_PER_YEAR: f64 = 3.154e7;
}

/// Basic unit conversion helpers.
pub mod units {
    /// Convert kilometres to metres.
    #[inline]
    pub fn km_to_m(v: f64) -> f64 {
        v * 1_000.0
    }

    /// Convert metres to kilometres.
    #[inline]
    pub fn m_to_km(v: f64) -> f64 {
        v / 1_000.0
    }

    /// Convert metres per second to kilometres per second.
    #[inline]
    pub fn ms_to_kms(v: f64) -> f64 {
        v / 1_000.0
    }

    /// Convert kilometres per second to metres per second.
    #[inline]
    pub fn kms_to_ms(v: f64) -> f64 {
        v * 1_000.0
    }

    /// Apply a scalar conversion to every component of a vector.
    #[inline]
    pub fn convert3(v: &[f64; 3], f: impl Fn(f64) -> f64) -> [f64; 3] {
        [f(v[0]), f(v[1]), f(v[2])]
    }
}

/// Lightweight time utilities shared across crates.
pub mod time {
    use super::constants::SECONDS_PER_DAY;

    /// Convert days to seconds.
    #[inline]
    pub fn days_to_seconds(days: f64) -> f64 {
        days * SECONDS_PER_DAY
    }

    /// Convert seconds to days.
    #[inline]
    pub fn seconds_to_days(seconds: f64) -> f64 {
        seconds / SECONDS_PER_DAY
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in metres or m/s depending on context.
    pub type Vector3 = [f64; 3];

    /// The zero vector.
    pub const ZERO: Vector3 = [0.0; 3];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        norm_squared(v).sqrt()
    }

    /// Squared Euclidean norm.
    #[inline]
    pub fn norm_squared(v: &Vector3) -> f64 {
        dot(v, v)
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Cross product `a × b`.
    #[inline]
    pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// `a + b * s`, the accumulate step used throughout the integrator.
    #[inline]
    pub fn add_scaled(a: &Vector3, b: &Vector3, s: f64) -> Vector3 {
        [a[0] + b[0] * s, a[1] + b[1] * s, a[2] + b[2] * s]
    }

    /// Linear blend `(1 - alpha) * a + alpha * b`.
    #[inline]
    pub fn lerp(a: &Vector3, b: &Vector3, alpha: f64) -> Vector3 {
        add(&scale(a, 1.0 - alpha), &scale(b, alpha))
    }

    /// True when every component is finite.
    #[inline]
    pub fn is_finite(v: &Vector3) -> bool {
        v.iter().all(|c| c.is_finite())
    }
}
