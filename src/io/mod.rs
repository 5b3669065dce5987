/// CSV and JSON export of the simulated trajectory.
pub mod export;
pub mod import;

pub use import::InputConfig;
