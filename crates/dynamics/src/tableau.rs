//! Butcher tableaus for the explicit Runge–Kutta family used by [`crate::EmbeddedRk`].
//!
//! The `a` matrix is stored flattened, lower triangular, row by row: stage `i` (0-based) reads
//! its `i` coefficients starting at `i * (i - 1) / 2`.

/// Coefficients of an explicit (optionally embedded) Runge–Kutta method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ButcherTableau {
    pub name: &'static str,
    pub stages: usize,
    /// Order of the propagated solution, drives the step-size exponent `1 / (order + 1)`.
    pub order: u8,
    pub c: &'static [f64],
    pub a: &'static [f64],
    /// Weights of the propagated solution.
    pub b: &'static [f64],
    /// Weights of the embedded comparison solution, if any.
    pub b_star: Option<&'static [f64]>,
}

impl ButcherTableau {
    /// Coefficients feeding stage `stage` from the previous stages.
    pub fn a_row(&self, stage: usize) -> &'static [f64] {
        let start = stage * stage.saturating_sub(1) / 2;
        &self.a[start..start + stage]
    }
}

/// Dormand–Prince 5(4). Stage 7 sits at the solution point: the 5th-order weights leave it out
/// while the 4th-order weights use it.
pub const DORMAND_PRINCE_54: ButcherTableau = ButcherTableau {
    name: "dormand_prince",
    stages: 7,
    order: 5,
    c: &[0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0],
    a: &[
        1.0 / 5.0,
        3.0 / 40.0,
        9.0 / 40.0,
        44.0 / 45.0,
        -56.0 / 15.0,
        32.0 / 9.0,
        19372.0 / 6561.0,
        -25360.0 / 2187.0,
        64448.0 / 6561.0,
        -212.0 / 729.0,
        9017.0 / 3168.0,
        -355.0 / 33.0,
        46732.0 / 5247.0,
        49.0 / 176.0,
        -5103.0 / 18656.0,
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
    ],
    b: &[
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
        0.0,
    ],
    b_star: Some(&[
        5179.0 / 57600.0,
        0.0,
        7571.0 / 16695.0,
        393.0 / 640.0,
        -92097.0 / 339200.0,
        187.0 / 2100.0,
        1.0 / 40.0,
    ]),
};

/// Runge–Kutta–Fehlberg 4(5), propagating the 4th-order solution.
pub const FEHLBERG_45: ButcherTableau = ButcherTableau {
    name: "fehlberg",
    stages: 6,
    order: 4,
    c: &[0.0, 1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 1.0 / 2.0],
    a: &[
        1.0 / 4.0,
        3.0 / 32.0,
        9.0 / 32.0,
        1932.0 / 2197.0,
        -7200.0 / 2197.0,
        7296.0 / 2197.0,
        439.0 / 216.0,
        -8.0,
        3680.0 / 513.0,
        -845.0 / 4104.0,
        -8.0 / 27.0,
        2.0,
        -3544.0 / 2565.0,
        1859.0 / 4104.0,
        -11.0 / 40.0,
    ],
    b: &[
        25.0 / 216.0,
        0.0,
        1408.0 / 2565.0,
        2197.0 / 4104.0,
        -1.0 / 5.0,
        0.0,
    ],
    b_star: Some(&[
        16.0 / 135.0,
        0.0,
        6656.0 / 12825.0,
        28561.0 / 56430.0,
        -9.0 / 50.0,
        2.0 / 55.0,
    ]),
};

/// Butcher's six-stage fifth-order method. Fixed step only.
pub const BUTCHER_RK5: ButcherTableau = ButcherTableau {
    name: "butcher",
    stages: 6,
    order: 5,
    c: &[0.0, 1.0 / 4.0, 1.0 / 4.0, 1.0 / 2.0, 3.0 / 4.0, 1.0],
    a: &[
        1.0 / 4.0,
        1.0 / 8.0,
        1.0 / 8.0,
        0.0,
        -1.0 / 2.0,
        1.0,
        3.0 / 16.0,
        0.0,
        0.0,
        9.0 / 16.0,
        -3.0 / 7.0,
        2.0 / 7.0,
        12.0 / 7.0,
        -12.0 / 7.0,
        8.0 / 7.0,
    ],
    b: &[
        7.0 / 90.0,
        0.0,
        32.0 / 90.0,
        12.0 / 90.0,
        32.0 / 90.0,
        7.0 / 90.0,
    ],
    b_star: None,
};

/// The classic fourth-order Runge–Kutta method. Fixed step only.
pub const CLASSIC_RK4: ButcherTableau = ButcherTableau {
    name: "rk4",
    stages: 4,
    order: 4,
    c: &[0.0, 1.0 / 2.0, 1.0 / 2.0, 1.0],
    a: &[1.0 / 2.0, 0.0, 1.0 / 2.0, 0.0, 0.0, 1.0],
    b: &[1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
    b_star: None,
};

/// Every tableau shipped with the crate.
pub const ALL: [&ButcherTableau; 4] = [&DORMAND_PRINCE_54, &FEHLBERG_45, &BUTCHER_RK5, &CLASSIC_RK4];
