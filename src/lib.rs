//! N-body gravitational simulation with Lambert-planned probe transfers.
//!
//! The physics, ephemeris, and mission logic live in the workspace crates re-exported below.
//! This crate adds the [`simulation`] driver that ties them together tick by tick, so that a
//! headless CLI or any other front-end can share it.

pub mod simulation;

pub use solar_config as config;
pub use solar_core as physics;
pub use solar_dynamics as dynamics;
pub use solar_ephemeris as ephemeris;
pub use solar_export as export;
pub use solar_impulsive as impulsive;
pub use solar_importer as importer;
pub use solar_transfer as transfer;

/// Returns the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
