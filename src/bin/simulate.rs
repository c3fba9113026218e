//! Write a synthetic sensor file for the service to read.
//!
//! Usage: `simulate [minutes] [output] [seed]`
//! (defaults: 600, `data/data_simulada.csv`, 42). The series starts 300
//! minutes before now so the latest rows sit in the near future.

use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{Duration, DurationRound, Utc};

use ecofloor_sensorflow::simulator::{generate, write_csv, SimulationConfig};

fn main() -> Result<()> {
    // ---
    tracing_subscriber::fmt().compact().init();

    let mut args = std::env::args().skip(1);
    let minutes: usize = match args.next() {
        Some(v) => v.parse().map_err(|e| anyhow!("Invalid minutes '{}': {}", v, e))?,
        None => 600,
    };
    let output = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/data_simulada.csv"));
    let seed: u64 = match args.next() {
        Some(v) => v.parse().map_err(|e| anyhow!("Invalid seed '{}': {}", v, e))?,
        None => 42,
    };

    let start = Utc::now().duration_trunc(Duration::minutes(1))? - Duration::minutes(300);
    let mut config = SimulationConfig::new(start, minutes);
    config.seed = seed;

    let readings = generate(&config);

    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let file = File::create(&output).with_context(|| format!("creating {}", output.display()))?;
    write_csv(&readings, file)?;

    tracing::info!(
        "Wrote {} readings ({} minutes, floors {:?}) to {}",
        readings.len(),
        minutes,
        config.floors,
        output.display()
    );
    Ok(())
}
