//! Post-hoc summary of a simulation run.

use std::fmt;

use serde::Serialize;

use super::types::OutputRecord;

/// Aggregate indicators derived from a complete simulation run.
///
/// Computed post-hoc from the output records so the report always agrees
/// with the exported trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    /// Number of simulated steps.
    pub points: usize,
    /// Mean inverter share of load (%).
    pub mean_inverter_percent: f64,
    /// Highest inverter share of load (%).
    pub max_inverter_percent: f64,
    /// Sum of all per-step adjustments (kW).
    pub total_adjustment_kw: f64,
    /// Inverter output emitted on the last step (kW).
    pub final_inverter_output_kw: f64,
    /// Highest grid draw (kW).
    pub peak_grid_draw_kw: f64,
    /// Steps on which the gain expression fell back to the default.
    pub gain_fallback_steps: usize,
}

impl SummaryReport {
    /// Computes the report from the complete output trajectory.
    pub fn from_results(results: &[OutputRecord]) -> Self {
        let Some(last) = results.last() else {
            return Self {
                points: 0,
                mean_inverter_percent: 0.0,
                max_inverter_percent: 0.0,
                total_adjustment_kw: 0.0,
                final_inverter_output_kw: 0.0,
                peak_grid_draw_kw: 0.0,
                gain_fallback_steps: 0,
            };
        };

        let mut percent_sum = 0.0_f64;
        let mut max_percent = f64::MIN;
        let mut adjustment_sum = 0.0_f64;
        let mut peak_grid = f64::MIN;
        let mut fallbacks = 0_usize;

        for r in results {
            percent_sum += r.inverter_output_percent;
            max_percent = max_percent.max(r.inverter_output_percent);
            adjustment_sum += r.adjustment_kw;
            peak_grid = peak_grid.max(r.grid_draw_kw);
            if r.gain_fallback {
                fallbacks += 1;
            }
        }

        Self {
            points: results.len(),
            mean_inverter_percent: percent_sum / results.len() as f64,
            max_inverter_percent: max_percent,
            total_adjustment_kw: adjustment_sum,
            final_inverter_output_kw: last.inverter_output_kw,
            peak_grid_draw_kw: peak_grid,
            gain_fallback_steps: fallbacks,
        }
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Summary ---")?;
        writeln!(f, "Data points:           {}", self.points)?;
        writeln!(f, "Mean inverter share:   {:.1}%", self.mean_inverter_percent)?;
        writeln!(f, "Max inverter share:    {:.1}%", self.max_inverter_percent)?;
        writeln!(f, "Total adjustment:      {:.1} kW", self.total_adjustment_kw)?;
        writeln!(f, "Final inverter output: {:.1} kW", self.final_inverter_output_kw)?;
        writeln!(f, "Peak grid draw:        {:.1} kW", self.peak_grid_draw_kw)?;
        write!(f, "Default-gain steps:    {}", self.gain_fallback_steps)
    }
}
