use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Replays a recorded load profile through the inverter recurrence.
#[derive(Debug, Parser)]
#[command(name = "inverter-sim", version, about)]
pub struct Args {
    /// Load CSV (timestamp, UTC time, device address, device type, load kW)
    pub input: PathBuf,

    /// Load scenario from TOML config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the initial inverter output (kW)
    #[arg(long, value_name = "KW", allow_negative_numbers = true)]
    pub initial_power: Option<f64>,

    /// Override the gain expression, e.g. "0.01*lambda^2"
    #[arg(long, value_name = "EXPR", allow_hyphen_values = true)]
    pub gain: Option<String>,

    /// Window start (HH:MM:SS); requires --end
    #[arg(long, value_name = "HH:MM:SS", requires = "end")]
    pub start: Option<String>,

    /// Window end (HH:MM:SS); requires --start
    #[arg(long, value_name = "HH:MM:SS", requires = "start")]
    pub end: Option<String>,

    /// Treat the first CSV row as data
    #[arg(long)]
    pub no_headers: bool,

    /// CSV field delimiter
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Write the trajectory to this file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Format of --output
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Print one line per simulated step
    #[arg(long)]
    pub steps: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}
