//! One-decimal floor truncation and the pure per-step formulas built on it.

/// Value reported when the aggressive adjustment is zero but the inverter
/// would still move up.
pub const UNBOUNDED_RATIO: f64 = 999.9;

/// Truncates `value` to one decimal place by flooring: `floor(value * 10) / 10`.
///
/// Never rounds to nearest, so every derived quantity is biased downward.
///
/// # Examples
///
/// ```
/// use inverter_sim::sim::truncate::truncate;
///
/// assert_eq!(truncate(0.37), 0.3);
/// assert_eq!(truncate(79.29), 79.2);
/// assert_eq!(truncate(-0.05), -0.1);
/// ```
pub fn truncate(value: f64) -> f64 {
    (value * 10.0).floor() / 10.0
}

/// Share of `load_kw` drawn from the grid, truncated; `0.0` for non-positive loads.
pub fn dependency_ratio(grid_kw: f64, load_kw: f64) -> f64 {
    if load_kw > 0.0 {
        truncate(grid_kw / load_kw)
    } else {
        0.0
    }
}

/// Inverter output as a percentage of load, truncated; `0.0` for non-positive loads.
pub fn inverter_percent(inverter_kw: f64, load_kw: f64) -> f64 {
    if load_kw > 0.0 {
        truncate(inverter_kw / load_kw * 100.0)
    } else {
        0.0
    }
}

/// Ratio of the applied adjustment to the aggressive (gap-closing) adjustment.
///
/// A zero denominator yields [`UNBOUNDED_RATIO`] when the adjustment is
/// positive and `0.0` otherwise.
pub fn adjustment_ratio(adjustment_kw: f64, aggressive_kw: f64) -> f64 {
    if aggressive_kw == 0.0 {
        if adjustment_kw > 0.0 {
            UNBOUNDED_RATIO
        } else {
            0.0
        }
    } else {
        truncate(adjustment_kw / aggressive_kw)
    }
}
