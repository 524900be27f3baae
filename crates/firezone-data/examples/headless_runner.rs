//! Headless runner: loads a scenario, runs it, prints every room's history
//! and the usual hazard times, then reruns it to verify determinism.
//!
//! Run with: `cargo run --package firezone-data --example headless_runner [scenario]`
//!
//! Set `RUST_LOG=firezone_core=debug` for per-run tracing output.

use std::path::PathBuf;

use firezone_core::room::LIMIT_VISIBILITY;
use firezone_data::load_scenario;
use tracing_subscriber::EnvFilter;

/// Gas temperature (K) treated as untenable.
const CRITICAL_TEMPERATURE: f64 = 343.0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/scenarios/three_rooms.ron"))
        });

    // Run 1
    let mut scenario = load_scenario(&path)
        .unwrap_or_else(|e| panic!("failed to load '{}': {e}", path.display()));
    let config = scenario.run;
    let summary = scenario
        .graph
        .run(&config)
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    println!("=== {} ===", scenario.name);
    println!(
        "source = {}, steps = {}, dt = {} s, back edges = {}, extra passes = {}",
        summary.source,
        summary.steps,
        summary.time_step,
        summary.back_edges.len(),
        summary.convergence_passes
    );

    for series in scenario.graph.time_series(summary.time_step) {
        println!("\n--- {} ({}) ---", scenario.label(series.room), series.room);
        println!(
            "{:>8} {:>12} {:>12} {:>10} {:>12} {:>10}",
            "t, s", "burned, kg", "rho, kg/m3", "T, K", "smoke, 1/m", "vis, m"
        );
        for sample in &series.samples {
            let s = sample.state;
            println!(
                "{:>8.1} {:>12.4} {:>12.4} {:>10.2} {:>12.5} {:>10.3}",
                sample.time,
                s.burned_mass,
                s.gas_density,
                s.gas_temperature,
                s.smoke_extinction_coefficient,
                s.visibility
            );
        }

        if let Some(peak) = series.peak_gas_temperature() {
            println!(
                "    peak temperature {:.2} K at {:.1} s",
                peak.state.gas_temperature, peak.time
            );
        }
        match series.first_time_visibility_below(LIMIT_VISIBILITY) {
            Some(t) => println!("    visibility below {LIMIT_VISIBILITY} m at {t:.1} s"),
            None => println!("    visibility stays above {LIMIT_VISIBILITY} m"),
        }
        match series.first_time_temperature_above(CRITICAL_TEMPERATURE) {
            Some(t) => println!("    temperature above {CRITICAL_TEMPERATURE} K at {t:.1} s"),
            None => println!("    temperature stays below {CRITICAL_TEMPERATURE} K"),
        }
    }

    // Run 2: determinism check
    let mut rerun = load_scenario(&path)
        .unwrap_or_else(|e| panic!("failed to load '{}' (run 2): {e}", path.display()));
    rerun
        .graph
        .run(&config)
        .unwrap_or_else(|e| panic!("run 2 failed: {e}"));

    if rerun.graph.rooms() == scenario.graph.rooms() {
        println!("\nDeterminism: PASS (histories match)");
    } else {
        println!("\nDeterminism: FAIL! histories differ between runs");
        std::process::exit(1);
    }
}
