// Entry point and high-level CLI flow.
//
// - Option [1] loads a CSV and indexes it spatially/temporally, printing
//   diagnostics.
// - Option [2] aggregates the indexed data at chosen granularities, scores
//   consistency, and exports the result as CSV and JSON.
// - After aggregating, the user can choose to go back to the selection menu
//   or exit.

use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;

use staggr::{
    aggregate, evaluate_consistency, loader, output, util, AggFunction, AggSpec, Dataset,
    IndexOptions, SpatialGranularity, TemporalGranularity,
};

// Simple in-memory app state so we only load/index the file once but can
// aggregate it multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Dataset>,
}

/// Read a single line of input after printing a prompt.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Read a line and fall back to a default when the input is empty.
fn read_line_or(prompt: &str, default: &str) -> String {
    let input = read_line(&format!("{} [{}]: ", prompt, default));
    if input.is_empty() {
        default.to_string()
    } else {
        input
    }
}

fn read_columns(prompt: &str) -> Vec<String> {
    read_line(prompt)
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Ask the user whether to go back to the selection menu after aggregating.
fn prompt_back_to_menu() -> bool {
    loop {
        let resp = read_line("Back to Selection (Y/N): ").to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load a CSV file and index it.
fn handle_load() {
    let path = read_line_or("CSV file path", "data.csv");
    let options = IndexOptions {
        spatial_columns: read_columns("Spatial columns (comma-separated): "),
        temporal_columns: read_columns("Temporal columns (comma-separated): "),
        ..IndexOptions::default()
    };

    match loader::read_csv_indexed(&path, &options) {
        Ok((outcome, report)) => {
            println!(
                "Indexed {} rows ({} skipped due to parse errors).",
                util::format_int((report.total_rows - report.parse_errors) as i64),
                util::format_int(report.parse_errors as i64)
            );
            for notice in &outcome.notices {
                println!("Note: {}", notice);
            }
            println!();
            let mut state = APP_STATE.lock().unwrap();
            state.data = Some(outcome.into_value());
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

/// Handle option [2]: aggregate the indexed data, score it, and export.
fn handle_aggregate() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some(data) = data else {
        println!("Error: No data indexed. Please load a file first (option 1).\n");
        return;
    };

    let spatial = match SpatialGranularity::parse(&read_line_or("Spatial granularity", "grid")) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("{}\n", e);
            return;
        }
    };
    let temporal = match TemporalGranularity::parse(&read_line_or("Temporal granularity", "year")) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("{}\n", e);
            return;
        }
    };

    // Optional per-column overrides entered as "column=function" pairs.
    let mut spec = AggSpec::new();
    for pair in read_columns("Aggregations, e.g. value=sum (blank for defaults): ") {
        let Some((column, func)) = pair.split_once('=') else {
            eprintln!("Expected column=function, got '{}'\n", pair);
            return;
        };
        match AggFunction::parse(func.trim()) {
            Ok(f) => {
                spec.insert(column.trim().to_string(), f);
            }
            Err(e) => {
                eprintln!("{}\n", e);
                return;
            }
        }
    }
    let spec = if spec.is_empty() { None } else { Some(&spec) };

    println!("\nAggregating...");
    let outcome = match aggregate(&data, spatial, temporal, spec) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Aggregation failed: {}\n", e);
            return;
        }
    };
    for notice in &outcome.notices {
        println!("Note: {}", notice);
    }
    let result = outcome.into_value();

    println!("{}\n", output::preview(&result, 10));

    println!("Consistency:");
    for (metric, score) in evaluate_consistency(&result, None) {
        println!("  {}: {}", metric, util::format_number(score, 4));
    }
    println!();

    if let Err(e) = output::write_csv("aggregated.csv", &result) {
        eprintln!("Write error: {}", e);
    }
    if let Err(e) = output::write_json("aggregated.json", &result) {
        eprintln!("Write error: {}", e);
    }
    println!("(Full table exported to aggregated.csv and aggregated.json)\n");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    loop {
        println!("[1] Load and index a CSV file");
        println!("[2] Aggregate and score\n");
        match read_line("Enter choice: ").as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!();
                handle_aggregate();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
