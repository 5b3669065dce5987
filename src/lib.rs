//! Offline simulation of an inverter tracking a recorded load profile.
//!
//! The inverter output moves toward the load at a rate set by a
//! user-supplied gain expression in the grid dependency ratio.

/// TOML scenario files and validation.
pub mod config;
pub mod error;
/// Load CSV import and trajectory export.
pub mod io;
/// Gain evaluation, the recurrence engine and its supporting types.
pub mod sim;

pub use error::{Result, SimError};
pub use sim::engine::simulate;
pub use sim::gain::evaluate_gain;
