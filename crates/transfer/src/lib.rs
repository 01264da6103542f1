//! Transfer façade crate: the mission state machine plus the supporting impulsive crate.

pub mod mission;

pub use facade::*;
pub use solar_impulsive as impulsive;

mod facade;
