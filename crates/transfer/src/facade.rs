//! Re-exported APIs for consumers of the transfer crate.

pub use crate::mission::launch::{
    LambertOptions, TransferRequest, TransferSolution, plan_transfer,
};
pub use crate::mission::probe::Probe;
pub use crate::mission::{
    LaunchReport, MissionError, MissionPlanner, MissionSettings, MissionState,
};
pub use solar_impulsive::{BateLambert, LambertSolver};
