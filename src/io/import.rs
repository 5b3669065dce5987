//! CSV import of recorded load samples.
//!
//! Columns are read by position: timestamp, UTC time, device address,
//! device type, load (kW). Further columns are ignored.

use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::sim::types::LoadRecord;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const LOAD_COLUMN: usize = 4;

/// Layout of the input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputConfig {
    /// Whether the first row is a header to skip.
    pub has_headers: bool,
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            has_headers: true,
            delimiter: b',',
        }
    }
}

/// Reads load samples from the CSV file at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the CSV reader fails.
pub fn read_loads(path: &Path, config: &InputConfig) -> Result<Vec<LoadRecord>> {
    let bytes = fs::read(path)?;
    parse_loads(bytes.as_slice(), config)
}

/// Reads load samples from any reader.
///
/// A leading UTF-8 byte-order mark is dropped and text columns are decoded
/// lossily. Rows with fewer than five columns or a load that is not a
/// finite number are skipped.
///
/// # Errors
///
/// Returns an error if reading fails.
pub fn parse_loads(mut reader: impl Read, config: &InputConfig) -> Result<Vec<LoadRecord>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let data = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(config.has_headers)
        .delimiter(config.delimiter)
        .flexible(true)
        .from_reader(data);

    let mut records = Vec::new();
    let mut skipped = 0_usize;
    for raw in rdr.byte_records() {
        let raw = raw?;
        match parse_row(&raw) {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                warn!(line = ?raw.position().map(csv::Position::line), "skipping malformed row");
            }
        }
    }

    info!(rows = records.len(), skipped, "read load samples");
    Ok(records)
}

fn parse_row(raw: &csv::ByteRecord) -> Option<LoadRecord> {
    if raw.len() <= LOAD_COLUMN {
        return None;
    }
    let text = |i: usize| String::from_utf8_lossy(&raw[i]).trim().to_string();
    let load_kw = text(LOAD_COLUMN)
        .parse::<f64>()
        .ok()
        .filter(|kw| kw.is_finite())?;

    Some(LoadRecord::new(text(0), text(1), text(2), text(3), load_kw))
}
