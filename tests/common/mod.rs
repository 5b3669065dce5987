//! Shared test fixtures for integration tests.

use inverter_sim::sim::types::LoadRecord;

/// Load records with sequential timestamps starting at 08:00:00.
pub fn loads(values: &[f64]) -> Vec<LoadRecord> {
    values
        .iter()
        .enumerate()
        .map(|(i, &kw)| {
            LoadRecord::new(
                (1_714_550_400 + i).to_string(),
                format!("2024-05-01 08:{:02}:{:02}", i / 60, i % 60),
                "1",
                "meter",
                kw,
            )
        })
        .collect()
}

/// Smooth daily-like profile (kW) with a few idle samples mixed in.
pub fn sinusoid_profile(steps: usize) -> Vec<f64> {
    (0..steps)
        .map(|i| {
            if i % 37 == 36 {
                0.0
            } else {
                50.0 + 30.0 * (i as f64 / 10.0).sin()
            }
        })
        .collect()
}

/// Small meter export covering 08:00:00 to 08:00:05.
pub const SAMPLE_CSV: &str = "\
timestamp,utc_time,address,type,load
1714550400,2024-05-01 08:00:00,1,meter,100.0
1714550401,2024-05-01 08:00:01,1,meter,90.0
1714550402,2024-05-01 08:00:02,1,meter,80.0
1714550403,2024-05-01 08:00:03,1,meter,bad
1714550404,2024-05-01 08:00:04,1,meter,70.0
1714550405,2024-05-01 08:00:05,1,meter,60.0
";
