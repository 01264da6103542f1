//! Analytic Hohmann estimate in the coplanar, circular limit.
//!
//! Used as a reference point for the time of flight chosen for a Lambert transfer.

use std::f64::consts::PI;

/// Result for a Hohmann transfer between circular, coplanar orbits of radii r1 and r2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HohmannResult {
    pub dv1_m_s: f64,      // signed: negative for inward (retro) burn
    pub dv2_m_s: f64,      // signed: negative for retro capture when arriving inward
    pub dv_total_m_s: f64, // |dv1| + |dv2|
    pub tof_seconds: f64,
}

/// Classical Hohmann transfer from radius `r1_m` to `r2_m` about a body with parameter
/// `mu_m3_s2`. Returns `None` for non-positive inputs.
pub fn hohmann(r1_m: f64, r2_m: f64, mu_m3_s2: f64) -> Option<HohmannResult> {
    if !(r1_m > 0.0 && r2_m > 0.0 && mu_m3_s2 > 0.0) {
        return None;
    }

    let v1 = (mu_m3_s2 / r1_m).sqrt();
    let v2 = (mu_m3_s2 / r2_m).sqrt();
    let a_t = 0.5 * (r1_m + r2_m);
    let tof = PI * (a_t.powi(3) / mu_m3_s2).sqrt();

    // Transfer periapsis speed (at r1) and apoapsis speed (at r2)
    let v_t1 = (mu_m3_s2 * (2.0 / r1_m - 1.0 / a_t)).sqrt();
    let v_t2 = (mu_m3_s2 * (2.0 / r2_m - 1.0 / a_t)).sqrt();

    let dv1 = v_t1 - v1;
    let dv2 = v2 - v_t2;

    Some(HohmannResult {
        dv1_m_s: dv1,
        dv2_m_s: dv2,
        dv_total_m_s: dv1.abs() + dv2.abs(),
        tof_seconds: tof,
    })
}
