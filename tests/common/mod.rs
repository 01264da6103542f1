#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use solar_transfer_sim::dynamics::{Body, BodySystem};
use solar_transfer_sim::ephemeris::datetime::format_timestamp;
use solar_transfer_sim::ephemeris::{EphemerisSample, EphemerisTrace};
use solar_transfer_sim::physics::constants::{AU_M, G, SECONDS_PER_DAY};

pub const M_SUN: f64 = 1.989e30;
pub const M_EARTH: f64 = 5.972e24;
pub const M_MARS: f64 = 6.417e23;
pub const MARS_RADIUS_AU: f64 = 1.524;
/// 2025-01-01T00:00:00Z.
pub const START_UNIX: f64 = 1_735_689_600.0;
/// Mars phase at launch so that it sits ~135° ahead of Earth's launch point after 185 days.
pub const MARS_PHASE_DEG: f64 = 38.1;

pub fn mu_sun() -> f64 {
    G * M_SUN
}

/// Circular heliocentric state at `radius_m` and `angle_deg` in the ecliptic plane.
pub fn circular(radius_m: f64, angle_deg: f64) -> ([f64; 3], [f64; 3]) {
    let theta = angle_deg.to_radians();
    let speed = (mu_sun() / radius_m).sqrt();
    (
        [radius_m * theta.cos(), radius_m * theta.sin(), 0.0],
        [-speed * theta.sin(), speed * theta.cos(), 0.0],
    )
}

pub fn mars_angle_deg(days_since_start: f64) -> f64 {
    let r = MARS_RADIUS_AU * AU_M;
    let omega = (mu_sun() / r.powi(3)).sqrt();
    MARS_PHASE_DEG + (omega * days_since_start * SECONDS_PER_DAY).to_degrees()
}

pub fn sun_earth_mars() -> BodySystem {
    let (earth_p, earth_v) = circular(AU_M, 0.0);
    let (mars_p, mars_v) = circular(MARS_RADIUS_AU * AU_M, MARS_PHASE_DEG);
    BodySystem::from_bodies([
        Body::new("SUN", [0.0; 3], [0.0; 3], M_SUN),
        Body::new("EARTH", earth_p, earth_v, M_EARTH),
        Body::new("MARS", mars_p, mars_v, M_MARS),
    ])
    .expect("valid system")
}

/// Heliocentric Mars samples, one per day, for days `first..=last` relative to [`START_UNIX`].
pub fn mars_samples(first_day: i64, last_day: i64) -> Vec<EphemerisSample> {
    (first_day..=last_day)
        .map(|day| {
            let (p, v) = circular(MARS_RADIUS_AU * AU_M, mars_angle_deg(day as f64));
            EphemerisSample::new(START_UNIX + day as f64 * SECONDS_PER_DAY, p, v)
        })
        .collect()
}

pub fn mars_trace(first_day: i64, last_day: i64) -> EphemerisTrace {
    EphemerisTrace::new("MARS", mars_samples(first_day, last_day)).expect("valid trace")
}

/// Write samples in the record/trace CSV layout.
pub fn write_trace_csv(path: &Path, samples: &[EphemerisSample]) {
    let mut file = File::create(path).expect("trace create");
    writeln!(file, "Date-time,px (m),py (m),pz (m),vx (m/s),vy (m/s),vz (m/s)").unwrap();
    for s in samples {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            format_timestamp(s.timestamp),
            s.position[0],
            s.position[1],
            s.position[2],
            s.velocity[0],
            s.velocity[1],
            s.velocity[2]
        )
        .unwrap();
    }
}

pub fn norm(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn sub(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}
