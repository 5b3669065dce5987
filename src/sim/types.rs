//! Core simulation types: load samples, run parameters and per-step output.

use std::fmt;

use serde::Serialize;

use super::window::TimeWindow;
use crate::error::Result;

/// One recorded load sample.
///
/// Only `load_kw` is interpreted by the engine; the text fields are carried
/// through to the output unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadRecord {
    /// Opaque source timestamp.
    pub timestamp: String,
    /// Wall-clock time, read only by the time window.
    pub utc_time: String,
    pub device_address: String,
    pub device_type: String,
    /// Total demand (kW). Zero and negative values are tolerated.
    pub load_kw: f64,
}

impl LoadRecord {
    pub fn new(
        timestamp: impl Into<String>,
        utc_time: impl Into<String>,
        device_address: impl Into<String>,
        device_type: impl Into<String>,
        load_kw: f64,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            utc_time: utc_time.into(),
            device_address: device_address.into(),
            device_type: device_type.into(),
            load_kw,
        }
    }
}

/// Explicit parameters of one simulation run.
///
/// # Examples
///
/// ```
/// use inverter_sim::sim::types::SimParams;
///
/// let params = SimParams::new(10.0, Some("0.01*λ^2"));
/// assert_eq!(params.initial_inverter_power_kw, 10.0);
/// assert!(params.time_window.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimParams {
    /// Inverter output before the first entry clamp (kW, >= 0).
    pub initial_inverter_power_kw: f64,
    /// Gain expression in the dependency ratio; `None` means the default gain.
    pub gain_expression: Option<String>,
    /// Records outside this window are dropped before simulating.
    pub time_window: Option<TimeWindow>,
}

impl SimParams {
    pub fn new(initial_inverter_power_kw: f64, gain_expression: Option<&str>) -> Self {
        Self {
            initial_inverter_power_kw,
            gain_expression: gain_expression.map(str::to_string),
            time_window: None,
        }
    }

    pub fn with_time_window(mut self, window: TimeWindow) -> Self {
        self.time_window = Some(window);
        self
    }

    /// Applies the time window, if any, to `records`.
    ///
    /// # Errors
    ///
    /// Propagates [`TimeWindow::filter`] failures.
    pub fn select(&self, records: Vec<LoadRecord>) -> Result<Vec<LoadRecord>> {
        match &self.time_window {
            Some(window) => window.filter(records),
            None => Ok(records),
        }
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self::new(10.0, Some("0.01"))
    }
}

/// Complete record of one simulation step.
///
/// Every power and ratio field is already truncated to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    pub timestamp: String,
    pub utc_time: String,
    pub device_address: String,
    pub device_type: String,
    pub load_kw: f64,
    /// Inverter output after the entry clamp (kW).
    pub inverter_output_kw: f64,
    /// Inverter output as a share of load (%), `0` for non-positive loads.
    pub inverter_output_percent: f64,
    /// Increment carried into the next step (kW).
    pub adjustment_kw: f64,
    /// Gap a maximally responsive inverter would close: `load - inverter` (kW).
    pub aggressive_adjustment_kw: f64,
    /// `adjustment / aggressive`, or the 999.9 sentinel.
    pub adjustment_ratio: f64,
    /// Power drawn from the grid: `load - inverter` (kW).
    pub grid_draw_kw: f64,
    /// Grid dependency ratio λ fed to the gain expression.
    pub dependency_ratio: f64,
    /// Gain used for this step, not truncated.
    pub gain: f64,
    /// Whether the gain expression fell back to the default this step.
    pub gain_fallback: bool,
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | load={:>7.1} kW  inv={:>7.1} kW ({:>5.1}%) | grid={:>7.1} kW  λ={:.1} \
             k={}{} | adj={:>6.1} kW  aggr={:>7.1} kW  ratio={:.1}",
            self.utc_time,
            self.load_kw,
            self.inverter_output_kw,
            self.inverter_output_percent,
            self.grid_draw_kw,
            self.dependency_ratio,
            self.gain,
            if self.gain_fallback { " (default)" } else { "" },
            self.adjustment_kw,
            self.aggressive_adjustment_kw,
            self.adjustment_ratio,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_match_dashboard_defaults() {
        let params = SimParams::default();
        assert_eq!(params.initial_inverter_power_kw, 10.0);
        assert_eq!(params.gain_expression.as_deref(), Some("0.01"));
        assert!(params.time_window.is_none());
    }

    #[test]
    fn select_without_window_keeps_everything() {
        let records = vec![
            LoadRecord::new("0", "not even a time", "1", "meter", 5.0),
            LoadRecord::new("1", "08:00:00", "1", "meter", 6.0),
        ];
        let selected = SimParams::default().select(records.clone()).unwrap();
        assert_eq!(selected, records);
    }

    #[test]
    fn select_with_window_filters() {
        let window = TimeWindow::parse("08:00:00", "08:00:00").unwrap();
        let params = SimParams::default().with_time_window(window);
        let records = vec![
            LoadRecord::new("0", "08:00:00", "1", "meter", 5.0),
            LoadRecord::new("1", "08:00:01", "1", "meter", 6.0),
        ];
        let selected = params.select(records).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].load_kw, 5.0);
    }

    #[test]
    fn output_record_display_does_not_panic() {
        let r = OutputRecord {
            timestamp: "1714550400".into(),
            utc_time: "2024-05-01 08:00:00".into(),
            device_address: "1".into(),
            device_type: "meter".into(),
            load_kw: 100.0,
            inverter_output_kw: 10.0,
            inverter_output_percent: 10.0,
            adjustment_kw: 0.8,
            aggressive_adjustment_kw: 90.0,
            adjustment_ratio: 0.0,
            grid_draw_kw: 90.0,
            dependency_ratio: 0.9,
            gain: 0.01,
            gain_fallback: true,
        };
        let s = format!("{r}");
        assert!(s.contains("(default)"));
        assert!(s.contains("2024-05-01 08:00:00"));
    }
}
