//! Wall-clock time window used to select the records fed to the engine.

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;
use tracing::debug;

use super::types::LoadRecord;
use crate::error::{Result, SimError};

/// Date-time layouts accepted in the UTC time column, tried in order.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Inclusive `[start, end]` window of times of day, compared to the second.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use inverter_sim::sim::window::TimeWindow;
///
/// let window = TimeWindow::parse("08:00:00", "08:10:00").unwrap();
/// assert!(window.contains(NaiveTime::from_hms_opt(8, 10, 0).unwrap()));
/// assert!(!window.contains(NaiveTime::from_hms_opt(8, 10, 1).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Builds a window from two `HH:MM:SS` strings.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidTime`] if either bound is malformed.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_clock(start)?, parse_clock(end)?))
    }

    /// Whether `time` falls inside the window; fractional seconds are ignored.
    pub fn contains(&self, time: NaiveTime) -> bool {
        let time = time.with_nanosecond(0).unwrap_or(time);
        self.start <= time && time <= self.end
    }

    /// Keeps the records whose `utc_time` lies inside the window, in order.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidRecordTime`] for the first record whose
    /// time cannot be read. Rows are numbered from zero.
    pub fn filter(&self, records: Vec<LoadRecord>) -> Result<Vec<LoadRecord>> {
        let total = records.len();
        let mut kept = Vec::with_capacity(total);
        for (row, record) in records.into_iter().enumerate() {
            let time = time_of_day(&record.utc_time).ok_or_else(|| SimError::InvalidRecordTime {
                row,
                value: record.utc_time.clone(),
            })?;
            if self.contains(time) {
                kept.push(record);
            }
        }
        debug!(total, kept = kept.len(), start = %self.start, end = %self.end, "applied time window");
        Ok(kept)
    }
}

/// Parses an `H:M:S` bound; each part is a plain integer.
pub fn parse_clock(value: &str) -> Result<NaiveTime> {
    let invalid = || SimError::InvalidTime {
        value: value.to_string(),
    };
    let parts: Vec<&str> = value.trim().split(':').collect();
    let [hours, minutes, seconds] = parts.as_slice() else {
        return Err(invalid());
    };
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    let seconds: u32 = seconds.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hours, minutes, seconds).ok_or_else(invalid)
}

/// Extracts the time of day from a date-time or bare time string.
pub fn time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|dt| dt.time())
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.time()))
        .or_else(|| NaiveTime::parse_from_str(value, TIME_FORMAT).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn record(utc_time: &str, load_kw: f64) -> LoadRecord {
        LoadRecord::new("0", utc_time, "1", "meter", load_kw)
    }

    #[test]
    fn parses_padded_and_unpadded_bounds() {
        assert_eq!(parse_clock("08:00:00").unwrap(), hms(8, 0, 0));
        assert_eq!(parse_clock("8:5:7").unwrap(), hms(8, 5, 7));
    }

    #[test]
    fn rejects_malformed_bounds() {
        for bad in ["", "08:00", "08:00:00:00", "aa:bb:cc", "25:00:00", "08:61:00"] {
            assert!(
                matches!(parse_clock(bad), Err(SimError::InvalidTime { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn window_is_inclusive_at_both_ends() {
        let window = TimeWindow::parse("08:00:00", "08:10:00").unwrap();
        assert!(window.contains(hms(8, 0, 0)));
        assert!(window.contains(hms(8, 10, 0)));
        assert!(!window.contains(hms(7, 59, 59)));
        assert!(!window.contains(hms(8, 10, 1)));
    }

    #[test]
    fn fractional_seconds_are_ignored() {
        let window = TimeWindow::parse("08:00:00", "08:10:00").unwrap();
        let time = NaiveTime::from_hms_milli_opt(8, 10, 0, 500).unwrap();
        assert!(window.contains(time));
    }

    #[test]
    fn reads_common_time_layouts() {
        assert_eq!(time_of_day("2024-05-01 08:00:03"), Some(hms(8, 0, 3)));
        assert_eq!(time_of_day("2024/05/01 08:00:03"), Some(hms(8, 0, 3)));
        assert_eq!(time_of_day("2024-05-01T08:00:03"), Some(hms(8, 0, 3)));
        assert_eq!(time_of_day("2024-05-01T08:00:03Z"), Some(hms(8, 0, 3)));
        assert_eq!(time_of_day("08:00:03"), Some(hms(8, 0, 3)));
        assert_eq!(time_of_day("not a time"), None);
    }

    #[test]
    fn filter_keeps_order_and_drops_outside() {
        let window = TimeWindow::parse("08:00:01", "08:00:02").unwrap();
        let records = vec![
            record("2024-05-01 08:00:00", 1.0),
            record("2024-05-01 08:00:01", 2.0),
            record("2024-05-01 08:00:02", 3.0),
            record("2024-05-01 08:00:03", 4.0),
        ];
        let kept = window.filter(records).unwrap();
        let loads: Vec<f64> = kept.iter().map(|r| r.load_kw).collect();
        assert_eq!(loads, vec![2.0, 3.0]);
    }

    #[test]
    fn filter_reports_unreadable_row() {
        let window = TimeWindow::parse("08:00:00", "09:00:00").unwrap();
        let records = vec![record("08:00:00", 1.0), record("garbage", 2.0)];
        match window.filter(records) {
            Err(SimError::InvalidRecordTime { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "garbage");
            }
            other => panic!("expected InvalidRecordTime, got {other:?}"),
        }
    }

    #[test]
    fn filter_may_return_nothing() {
        let window = TimeWindow::parse("10:00:00", "11:00:00").unwrap();
        let kept = window.filter(vec![record("08:00:00", 1.0)]).unwrap();
        assert!(kept.is_empty());
    }
}
