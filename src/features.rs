//! Lag and rolling-mean feature builder.
//!
//! Readings are grouped by floor and ordered by timestamp. Within each floor,
//! `lagK` is the value observed K samples earlier and `rolling15` is the mean
//! of the last (up to) 15 samples ending at the current one. Rows are emitted
//! only once every lag is defined, so a floor needs at least 31 samples before
//! it contributes anything.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::loader::REQUIRED_COLUMNS;
use crate::models::{FeatureRow, Features, Reading, Variable, LAGS, ROLLING_WINDOW};

// ---

/// Longest lag; a floor needs more samples than this to produce rows.
pub const MAX_LAG: usize = LAGS[LAGS.len() - 1];

/// Feature rows keyed by floor, each floor in chronological order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    floors: BTreeMap<i64, Vec<FeatureRow>>,
}

/// Build the feature table from readings in any order.
pub fn build_features(readings: &[Reading]) -> FeatureTable {
    // ---
    let mut by_floor: BTreeMap<i64, Vec<&Reading>> = BTreeMap::new();
    for r in readings {
        by_floor.entry(r.floor).or_default().push(r);
    }

    let mut floors = BTreeMap::new();
    for (floor, mut series) in by_floor {
        // Stable: equal timestamps keep their input order.
        series.sort_by_key(|r| r.timestamp);

        if series.len() <= MAX_LAG {
            debug!(
                "Floor {} has {} samples, needs {}; dropped",
                floor,
                series.len(),
                MAX_LAG + 1
            );
            continue;
        }

        let rows = floor_features(&series);
        debug!("Floor {}: {} feature rows", floor, rows.len());
        floors.insert(floor, rows);
    }

    FeatureTable { floors }
}

fn floor_features(series: &[&Reading]) -> Vec<FeatureRow> {
    // ---
    let column = |v: Variable| -> Vec<f64> { series.iter().map(|r| v.of(r)).collect() };
    let temp = column(Variable::Temperature);
    let hum = column(Variable::Humidity);
    let energy = column(Variable::Energy);

    (MAX_LAG..series.len())
        .map(|i| FeatureRow {
            reading: series[i].clone(),
            temp_c: features_at(&temp, i),
            humidity_pct: features_at(&hum, i),
            energy_kw: features_at(&energy, i),
        })
        .collect()
}

/// Features of `values[i]`; requires `i >= MAX_LAG`.
fn features_at(values: &[f64], i: usize) -> Features {
    // ---
    let [lag1, lag5, lag15, lag30] = LAGS.map(|k| values[i - k]);
    Features {
        lag1,
        lag5,
        lag15,
        lag30,
        rolling15: rolling_mean(values, i),
    }
}

/// Mean of the `min(ROLLING_WINDOW, i + 1)` values ending at `i`.
fn rolling_mean(values: &[f64], i: usize) -> f64 {
    // ---
    let start = (i + 1).saturating_sub(ROLLING_WINDOW);
    let window = &values[start..=i];
    window.iter().sum::<f64>() / window.len() as f64
}

impl FeatureTable {
    // ---
    /// Floors with at least one complete row, ascending.
    pub fn floors(&self) -> Vec<i64> {
        self.floors.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.floors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.floors.values().map(Vec::len).sum()
    }

    /// All rows, floor by floor, each floor chronological.
    pub fn rows(&self) -> impl Iterator<Item = &FeatureRow> {
        self.floors.values().flatten()
    }

    pub fn floor_rows(&self, floor: i64) -> Result<&[FeatureRow]> {
        // ---
        self.floors
            .get(&floor)
            .map(Vec::as_slice)
            .ok_or(PipelineError::InvalidFloorSelection(floor))
    }

    /// The last `limit` rows of `floor`, oldest first.
    pub fn recent(&self, floor: i64, limit: usize) -> Result<&[FeatureRow]> {
        // ---
        let rows = self.floor_rows(floor)?;
        Ok(&rows[rows.len().saturating_sub(limit)..])
    }

    /// Most recent row of a floor.
    pub fn latest(&self, floor: i64) -> Result<&FeatureRow> {
        // ---
        self.floor_rows(floor)?
            .last()
            .ok_or(PipelineError::InvalidFloorSelection(floor))
    }

    /// Input columns followed by the 15 derived columns.
    pub fn column_names() -> Vec<String> {
        // ---
        let mut names: Vec<String> = REQUIRED_COLUMNS.iter().map(|s| s.to_string()).collect();
        for v in Variable::ALL {
            names.extend(v.feature_columns());
        }
        names
    }

    /// Render the table as CSV. Identical tables render to identical bytes.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        // ---
        let mut w = csv::Writer::from_writer(Vec::new());
        w.write_record(Self::column_names())?;

        for row in self.rows() {
            let r = &row.reading;
            let mut record = vec![
                r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
                r.building.clone(),
                r.floor.to_string(),
                r.temp_c.to_string(),
                r.humidity_pct.to_string(),
                r.energy_kw.to_string(),
            ];
            for v in Variable::ALL {
                record.extend(row.features(v).values().iter().map(f64::to_string));
            }
            w.write_record(&record)?;
        }

        w.into_inner()
            .map_err(|e| PipelineError::Io(e.into_error()))
    }
}
