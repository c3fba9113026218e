//! Flat-file reader for simulated sensor data.
//!
//! Expects a header row with at least the columns in [`REQUIRED_COLUMNS`];
//! column order does not matter and extra columns are ignored.
//!
//! Rows with a missing value (an empty required cell, or `NaN` in a numeric
//! column) are skipped. Any other unparseable cell is an `InvalidRecord`.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::models::Reading;

// ---

pub const REQUIRED_COLUMNS: [&str; 6] = [
    "timestamp",
    "edificio",
    "piso",
    "temp_C",
    "humedad_pct",
    "energia_kW",
];

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Load every reading from a CSV file.
pub fn load_readings(path: &Path) -> Result<Vec<Reading>> {
    // ---
    info!("Loading readings from {}", path.display());
    let reader = csv::Reader::from_path(path)?;
    read_from(reader)
}

/// Parse readings from any CSV source.
pub fn read_readings<R: Read>(source: R) -> Result<Vec<Reading>> {
    read_from(csv::Reader::from_reader(source))
}

fn read_from<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<Reading>> {
    // ---
    let headers = reader.headers()?.clone();

    let mut idx = [0usize; 6];
    for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))?;
    }
    let [ts_i, building_i, floor_i, temp_i, hum_i, energy_i] = idx;

    let mut readings = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let field = |i: usize| record.get(i).unwrap_or("").trim();

        if idx.iter().any(|&i| field(i).is_empty()) {
            debug!("Line {}: empty cell, row skipped", line);
            skipped += 1;
            continue;
        }

        let invalid = |reason: String| PipelineError::InvalidRecord { line, reason };
        let number = |i: usize, name: &str| {
            field(i)
                .parse::<f64>()
                .map_err(|e| invalid(format!("{name} '{}': {e}", field(i))))
        };

        let timestamp = parse_timestamp(field(ts_i))
            .ok_or_else(|| invalid(format!("timestamp '{}' is not a date-time", field(ts_i))))?;
        let floor = field(floor_i)
            .parse::<i64>()
            .map_err(|e| invalid(format!("piso '{}': {e}", field(floor_i))))?;

        let reading = Reading {
            timestamp,
            building: field(building_i).to_string(),
            floor,
            temp_c: number(temp_i, "temp_C")?,
            humidity_pct: number(hum_i, "humedad_pct")?,
            energy_kw: number(energy_i, "energia_kW")?,
        };
        if [reading.temp_c, reading.humidity_pct, reading.energy_kw]
            .iter()
            .any(|v| v.is_nan())
        {
            debug!("Line {}: NaN value, row skipped", line);
            skipped += 1;
            continue;
        }
        readings.push(reading);
    }

    if skipped > 0 {
        info!("Skipped {} rows with missing values", skipped);
    }
    debug!("Parsed {} readings", readings.len());
    Ok(readings)
}

/// Parse a timestamp; naive values are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    // ---
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
