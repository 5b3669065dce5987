//! End-to-end runs: CSV import, time window, simulation, summary and export.

mod common;

use std::fs;

use inverter_sim::config::ScenarioConfig;
use inverter_sim::io::export::{export_csv, export_json};
use inverter_sim::io::import::{parse_loads, read_loads};
use inverter_sim::sim::engine::Engine;
use inverter_sim::sim::kpi::SummaryReport;
use inverter_sim::{SimError, simulate};

#[test]
fn sample_file_runs_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("loads.csv");
    fs::write(&input, common::SAMPLE_CSV).unwrap();

    let scenario = ScenarioConfig::baseline();
    let records = read_loads(&input, &scenario.input_config()).unwrap();
    // the "bad" row is skipped
    assert_eq!(records.len(), 5);

    let params = scenario.to_params().unwrap();
    let records = params.select(records).unwrap();
    let results = Engine::new(params).run(&records).unwrap();
    assert_eq!(results[1].inverter_output_kw, 10.8);
    assert_eq!(results[1].grid_draw_kw, 79.2);

    let output = dir.path().join("out.csv");
    export_csv(&results, &output).unwrap();
    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("timestamp,utc_time,device_address"));
    assert!(lines[2].starts_with("1714550401,2024-05-01 08:00:01,1,meter,90.0,10.8,"));
}

#[test]
fn scenario_window_selects_contiguous_records() {
    let toml = r#"
[simulation]
initial_inverter_power_kw = 10.0
gain_expression = "0.01"

[window]
start = "08:00:01"
end = "08:00:04"
"#;
    let scenario = ScenarioConfig::from_toml_str(toml).unwrap();
    assert!(scenario.validate().is_empty());

    let records = parse_loads(common::SAMPLE_CSV.as_bytes(), &scenario.input_config()).unwrap();
    let params = scenario.to_params().unwrap();
    let selected = params.select(records).unwrap();
    let times: Vec<&str> = selected.iter().map(|r| r.utc_time.as_str()).collect();
    assert_eq!(
        times,
        vec![
            "2024-05-01 08:00:01",
            "2024-05-01 08:00:02",
            "2024-05-01 08:00:04"
        ]
    );

    // the window's first record is the engine's first step
    let results = Engine::new(params).run(&selected).unwrap();
    assert_eq!(results[0].load_kw, 90.0);
    assert_eq!(results[0].inverter_output_kw, 10.0);
}

#[test]
fn window_without_matches_is_empty_input() {
    let mut scenario = ScenarioConfig::baseline();
    scenario.window = Some(inverter_sim::config::WindowConfig {
        start: "23:00:00".to_string(),
        end: "23:59:59".to_string(),
    });
    let records = parse_loads(common::SAMPLE_CSV.as_bytes(), &scenario.input_config()).unwrap();
    let params = scenario.to_params().unwrap();
    let selected = params.select(records).unwrap();
    assert!(selected.is_empty());
    assert!(matches!(
        Engine::new(params).run(&selected),
        Err(SimError::EmptyInput)
    ));
}

#[test]
fn unreadable_record_time_fails_the_window() {
    let data = "h0,h1,h2,h3,h4\n0,whenever,1,meter,5.0\n";
    let records = parse_loads(data.as_bytes(), &Default::default()).unwrap();
    let mut scenario = ScenarioConfig::baseline();
    scenario.window = Some(inverter_sim::config::WindowConfig {
        start: "08:00:00".to_string(),
        end: "09:00:00".to_string(),
    });
    let params = scenario.to_params().unwrap();
    assert!(matches!(
        params.select(records),
        Err(SimError::InvalidRecordTime { row: 0, .. })
    ));
}

#[test]
fn json_export_round_trips_through_serde_json() {
    let dir = tempfile::tempdir().unwrap();
    let results = simulate(&common::loads(&[100.0, 90.0, 80.0]), 10.0, Some("0.01")).unwrap();
    let output = dir.path().join("out.json");
    export_json(&results, &output).unwrap();

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["inverter_output_kw"], 10.8);
    assert_eq!(rows[2]["grid_draw_kw"], 68.7);
}

#[test]
fn summary_reflects_trajectory() {
    let results = simulate(&common::loads(&[100.0, 90.0, 80.0]), 10.0, Some("0.01")).unwrap();
    let report = SummaryReport::from_results(&results);
    assert_eq!(report.points, 3);
    assert_eq!(report.max_inverter_percent, 14.1);
    assert_eq!(report.final_inverter_output_kw, 11.3);
    assert_eq!(report.peak_grid_draw_kw, 90.0);
    assert!((report.total_adjustment_kw - 1.8).abs() < 1e-9);
    assert!((report.mean_inverter_percent - 12.033_333_333).abs() < 1e-6);
    assert_eq!(report.gain_fallback_steps, 0);
}
