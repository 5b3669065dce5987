//! CSV and JSON export of the simulated trajectory.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::OutputRecord;

/// Column header for CSV trajectory export.
const HEADER: &str = "timestamp,utc_time,device_address,device_type,load_kw,\
                      inverter_output_kw,inverter_output_percent,adjustment_kw,\
                      aggressive_adjustment_kw,adjustment_ratio,grid_draw_kw,\
                      dependency_ratio,gain,gain_fallback";

/// Exports simulation results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[OutputRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes simulation results as CSV to any writer.
///
/// # Arguments
///
/// * `results` - Complete simulation output
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[OutputRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        wtr.write_record(&[
            r.timestamp.clone(),
            r.utc_time.clone(),
            r.device_address.clone(),
            r.device_type.clone(),
            format!("{:.1}", r.load_kw),
            format!("{:.1}", r.inverter_output_kw),
            format!("{:.1}", r.inverter_output_percent),
            format!("{:.1}", r.adjustment_kw),
            format!("{:.1}", r.aggressive_adjustment_kw),
            format!("{:.1}", r.adjustment_ratio),
            format!("{:.1}", r.grid_draw_kw),
            format!("{:.1}", r.dependency_ratio),
            r.gain.to_string(),
            r.gain_fallback.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports simulation results as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an `io::Error` if file creation, serialization or writing fails.
pub fn export_json(results: &[OutputRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_json(results, buf)
}

/// Writes simulation results as a pretty-printed JSON array to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if serialization or writing fails.
pub fn write_json(results: &[OutputRecord], mut writer: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, results)?;
    writeln!(writer)?;
    writer.flush()
}
