//! Inverter power recurrence engine.
//!
//! Walks the load sequence once, carrying the inverter output from step to
//! step. Each step clamps the carried output into `[0, load]`, derives the
//! grid draw and dependency ratio, asks the gain expression for a gain and
//! computes the adjustment applied before the next step.

use tracing::{debug, trace, warn};

use super::gain::GainExpression;
use super::truncate::{adjustment_ratio, dependency_ratio, inverter_percent, truncate};
use super::types::{LoadRecord, OutputRecord, SimParams};
use crate::error::{Result, SimError};

/// Duration of one step (s).
pub const STEP_SECONDS: f64 = 1.0;

/// Inverter output carried between steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    /// Current inverter output (kW).
    pub inverter_output_kw: f64,
}

impl SimulationState {
    pub fn new(initial_inverter_power_kw: f64) -> Self {
        Self {
            inverter_output_kw: initial_inverter_power_kw,
        }
    }

    /// Entry clamp: `truncate(min(max(output, 0), load))`.
    pub fn clamp_to(&mut self, load_kw: f64) {
        self.inverter_output_kw = truncate(self.inverter_output_kw.max(0.0).min(load_kw));
    }

    /// Adds `adjustment_kw`, then cuts the result down to the next load if it
    /// would overshoot it.
    pub fn carry(&mut self, adjustment_kw: f64, next_load_kw: Option<f64>) {
        self.inverter_output_kw += adjustment_kw;
        if let Some(next_load_kw) = next_load_kw {
            if self.inverter_output_kw > next_load_kw {
                self.inverter_output_kw = truncate(next_load_kw);
            }
        }
    }
}

/// Simulation engine owning the run parameters and the classified gain
/// expression.
pub struct Engine {
    params: SimParams,
    gain: GainExpression,
}

impl Engine {
    pub fn new(params: SimParams) -> Self {
        let gain = GainExpression::parse(params.gain_expression.as_deref());
        Self { params, gain }
    }

    /// Executes one step and advances `state` for the next one.
    ///
    /// # Arguments
    ///
    /// * `state` - Inverter output carried from the previous step
    /// * `record` - Load sample for this step
    /// * `next_load_kw` - Load of the following step, `None` on the last one
    ///
    /// # Returns
    ///
    /// The `OutputRecord` for this step, built from the post-clamp output.
    pub fn step(
        &self,
        state: &mut SimulationState,
        record: &LoadRecord,
        next_load_kw: Option<f64>,
    ) -> OutputRecord {
        let load_kw = record.load_kw;

        // 1. Entry clamp
        state.clamp_to(load_kw);
        let inverter_kw = state.inverter_output_kw;

        // 2-4. Grid draw, dependency ratio and gain
        let grid_kw = truncate(load_kw - inverter_kw);
        let ratio = dependency_ratio(grid_kw, load_kw);
        let gain = self.gain.gain(ratio);

        // 5-7. Adjustment and its comparison with closing the whole gap
        let adjustment_kw = truncate(gain.value * ratio.powi(2) * load_kw * STEP_SECONDS);
        let aggressive_kw = truncate(load_kw - inverter_kw);

        let result = OutputRecord {
            timestamp: record.timestamp.clone(),
            utc_time: record.utc_time.clone(),
            device_address: record.device_address.clone(),
            device_type: record.device_type.clone(),
            load_kw: truncate(load_kw),
            inverter_output_kw: inverter_kw,
            inverter_output_percent: inverter_percent(inverter_kw, load_kw),
            adjustment_kw,
            aggressive_adjustment_kw: aggressive_kw,
            adjustment_ratio: adjustment_ratio(adjustment_kw, aggressive_kw),
            grid_draw_kw: grid_kw,
            dependency_ratio: ratio,
            gain: gain.value,
            gain_fallback: gain.fallback,
        };

        // 9-10. Carry forward with lookahead clamp
        state.carry(adjustment_kw, next_load_kw);
        trace!(
            load_kw,
            inverter_kw,
            ratio,
            gain = gain.value,
            adjustment_kw,
            carried_kw = state.inverter_output_kw,
            "step"
        );

        result
    }

    /// Runs every step over `loads` and returns one record per sample.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::EmptyInput`] if `loads` is empty.
    pub fn run(&self, loads: &[LoadRecord]) -> Result<Vec<OutputRecord>> {
        if loads.is_empty() {
            return Err(SimError::EmptyInput);
        }

        let mut state = SimulationState::new(self.params.initial_inverter_power_kw);
        let mut results = Vec::with_capacity(loads.len());
        for (i, record) in loads.iter().enumerate() {
            let next_load_kw = loads.get(i + 1).map(|next| next.load_kw);
            results.push(self.step(&mut state, record, next_load_kw));
        }

        let fallback_steps = results.iter().filter(|r| r.gain_fallback).count();
        if fallback_steps > 0 {
            warn!(
                fallback_steps,
                steps = results.len(),
                expression = ?self.params.gain_expression,
                "gain expression could not be evaluated, default gain used"
            );
        }
        debug!(
            steps = results.len(),
            final_inverter_kw = state.inverter_output_kw,
            "simulation finished"
        );

        Ok(results)
    }

    /// Returns the run parameters.
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Returns the classified gain expression.
    pub fn gain_expression(&self) -> &GainExpression {
        &self.gain
    }
}

/// Simulates the inverter output over `loads`.
///
/// # Errors
///
/// Returns [`SimError::EmptyInput`] if `loads` is empty. Unusable gain
/// expressions never fail the run.
///
/// # Examples
///
/// ```
/// use inverter_sim::simulate;
/// use inverter_sim::sim::types::LoadRecord;
///
/// let loads: Vec<LoadRecord> = [100.0, 90.0, 80.0]
///     .iter()
///     .map(|&kw| LoadRecord::new("", "", "", "", kw))
///     .collect();
/// let out = simulate(&loads, 10.0, Some("0.01")).unwrap();
/// assert_eq!(out[1].inverter_output_kw, 10.8);
/// assert_eq!(out[1].grid_draw_kw, 79.2);
/// ```
pub fn simulate(
    loads: &[LoadRecord],
    initial_inverter_power_kw: f64,
    gain_expression: Option<&str>,
) -> Result<Vec<OutputRecord>> {
    Engine::new(SimParams::new(initial_inverter_power_kw, gain_expression)).run(loads)
}
