//! Inverter simulator entry point: CLI wiring and config-driven engine construction.

mod cli;

use std::process;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use inverter_sim::config::{ScenarioConfig, WindowConfig};
use inverter_sim::io::export::{export_csv, export_json};
use inverter_sim::io::import::read_loads;
use inverter_sim::sim::engine::Engine;
use inverter_sim::sim::kpi::SummaryReport;

use cli::{Args, OutputFormat};

/// Loads the scenario and applies command-line overrides on top of it.
fn build_scenario(args: &Args) -> ScenarioConfig {
    // --config takes priority over the baseline default
    let mut scenario = match &args.config {
        Some(path) => ScenarioConfig::from_toml_file(path).unwrap_or_else(|e| {
            eprintln!("{e}");
            process::exit(1);
        }),
        None => ScenarioConfig::baseline(),
    };

    if let Some(kw) = args.initial_power {
        scenario.simulation.initial_inverter_power_kw = kw;
    }
    if let Some(expr) = &args.gain {
        scenario.simulation.gain_expression = Some(expr.clone());
    }
    if let (Some(start), Some(end)) = (&args.start, &args.end) {
        scenario.window = Some(WindowConfig {
            start: start.clone(),
            end: end.clone(),
        });
    }
    if args.no_headers {
        scenario.input.has_headers = false;
    }
    if let Some(delimiter) = args.delimiter {
        scenario.input.delimiter = delimiter;
    }

    scenario
}

fn run(args: &Args, scenario: &ScenarioConfig) -> Result<(), String> {
    let params = scenario.to_params().map_err(|e| e.to_string())?;
    let records = read_loads(&args.input, &scenario.input_config())
        .map_err(|e| format!("error: cannot read \"{}\": {e}", args.input.display()))?;
    let records = params.select(records).map_err(|e| format!("error: {e}"))?;

    let engine = Engine::new(params);
    let results = engine.run(&records).map_err(|e| format!("error: {e}"))?;

    // Print per-step results
    if args.steps {
        for r in &results {
            println!("{r}");
        }
        println!();
    }

    println!("{}", SummaryReport::from_results(&results));

    if let Some(path) = &args.output {
        let written = match args.format {
            OutputFormat::Csv => export_csv(&results, path),
            OutputFormat::Json => export_json(&results, path),
        };
        written.map_err(|e| format!("error: failed to write \"{}\": {e}", path.display()))?;
        info!(path = %path.display(), rows = results.len(), "trajectory written");
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let scenario = build_scenario(&args);

    // Validate
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    if let Err(message) = run(&args, &scenario) {
        eprintln!("{message}");
        process::exit(1);
    }
}
