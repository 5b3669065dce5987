pub mod engine;
/// Gain expression parsing and evaluation.
pub mod gain;
pub mod kpi;
/// One-decimal floor truncation and per-step ratio helpers.
pub mod truncate;
pub mod types;
/// Time-of-day window applied before simulating.
pub mod window;
