//! Caller-driven composition of the pipeline stages.
//!
//! `load_table` only loads the file and builds features; `run` and
//! `floor_report` also train the models from scratch. Nothing is cached
//! between calls. A file whose floors are all too short yields an empty
//! table, never an error.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::alerts;
use crate::error::Result;
use crate::features::{build_features, FeatureTable};
use crate::loader::load_readings;
use crate::models::{Alert, Forecast, Level, Variable};
use crate::predictor::{train_models, TrainedModels, TrainingConfig};

// ---

/// Feature table and the models trained on it, for one invocation.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub table: FeatureTable,
    pub models: TrainedModels,
}

/// Predicted value of one variable and its severity.
#[derive(Debug, Clone, Serialize)]
pub struct VariableStatus {
    pub variable: Variable,
    pub value: f64,
    #[serde(rename = "nivel")]
    pub level: Level,
}

/// Everything shown for one floor.
#[derive(Debug, Clone, Serialize)]
pub struct FloorReport {
    #[serde(rename = "piso")]
    pub floor: i64,
    pub timestamp: DateTime<Utc>,
    pub forecast: Forecast,
    pub status: Vec<VariableStatus>,
    pub recommendations: Vec<String>,
    pub alerts: Vec<Alert>,
    pub urgent_alerts: usize,
    pub holdout_mae: BTreeMap<Variable, Option<f64>>,
}

/// Load the file at `path` and build its feature table. No training.
pub fn load_table(path: &Path) -> Result<FeatureTable> {
    // ---
    let readings = load_readings(path)?;
    let table = build_features(&readings);
    info!(
        "Built {} feature rows for floors {:?}",
        table.len(),
        table.floors()
    );
    Ok(table)
}

/// Load, build features and train from the file at `path`.
///
/// Fails with `InsufficientTrainingData` when no floor has a complete row;
/// callers that only need floors or rows should use [`load_table`].
pub fn run(path: &Path, config: &TrainingConfig) -> Result<Snapshot> {
    // ---
    Snapshot::train(load_table(path)?, config)
}

/// Report for one floor. The floor is checked before any model is trained.
pub fn floor_report(path: &Path, floor: i64, config: &TrainingConfig) -> Result<FloorReport> {
    // ---
    let table = load_table(path)?;
    table.latest(floor)?;
    Snapshot::train(table, config)?.report(floor)
}

impl Snapshot {
    // ---
    pub fn train(table: FeatureTable, config: &TrainingConfig) -> Result<Snapshot> {
        // ---
        let models = train_models(&table, config)?;
        Ok(Snapshot { table, models })
    }

    pub fn floors(&self) -> Vec<i64> {
        self.table.floors()
    }

    pub fn report(&self, floor: i64) -> Result<FloorReport> {
        // ---
        let latest = self.table.latest(floor)?;
        let forecast = self.models.predict(latest);
        let timestamp = latest.reading.timestamp;

        let status = forecast
            .predictions()
            .into_iter()
            .map(|p| VariableStatus {
                variable: p.target,
                value: p.value,
                level: alerts::classify(p.target, p.value),
            })
            .collect();

        let alerts = alerts::alerts_for(floor, timestamp, &forecast);
        let urgent_alerts = alerts.iter().filter(|a| a.is_urgent()).count();

        Ok(FloorReport {
            floor,
            timestamp,
            forecast,
            status,
            recommendations: alerts::recommendations(floor, &forecast),
            alerts,
            urgent_alerts,
            holdout_mae: self.models.holdout_mae(),
        })
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::error::PipelineError;
    use crate::forest::ForestConfig;
    use crate::simulator::{generate, write_csv, SimulationConfig};
    use chrono::TimeZone;
    use tempfile::NamedTempFile;

    fn data_file(minutes: usize) -> NamedTempFile {
        // ---
        let start = Utc.with_ymd_and_hms(2025, 10, 18, 10, 0, 0).unwrap();
        let readings = generate(&SimulationConfig::new(start, minutes));
        let file = NamedTempFile::new().unwrap();
        write_csv(&readings, file.reopen().unwrap()).unwrap();
        file
    }

    fn quick_config() -> TrainingConfig {
        // ---
        TrainingConfig {
            forest: ForestConfig {
                n_trees: 8,
                max_depth: 5,
                ..ForestConfig::default()
            },
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_run_and_report() {
        // ---
        let file = data_file(45);
        let snapshot = run(file.path(), &quick_config()).unwrap();
        assert_eq!(snapshot.floors(), vec![1, 2, 3]);

        let report = snapshot.report(3).unwrap();
        assert_eq!(report.floor, 3);
        assert_eq!(
            report.timestamp,
            Utc.with_ymd_and_hms(2025, 10, 18, 10, 44, 0).unwrap()
        );
        assert_eq!(report.status.len(), 3);
        assert_eq!(report.holdout_mae.len(), 3);
        assert!(!report.recommendations.is_empty());
        assert_eq!(
            report.urgent_alerts,
            report.alerts.iter().filter(|a| a.level >= Level::Media).count()
        );
        // Simulated energy draw is several kW on every floor.
        assert!(report
            .alerts
            .iter()
            .any(|a| a.variable == Variable::Energy && a.level == Level::Critica));
    }

    #[test]
    fn test_recent_rows_are_bounded() {
        // ---
        let file = data_file(45);
        let table = load_table(file.path()).unwrap();

        let recent = table.recent(1, 10).unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(
            recent.last().unwrap().reading.timestamp,
            Utc.with_ymd_and_hms(2025, 10, 18, 10, 44, 0).unwrap()
        );
        // 15 complete rows per floor.
        assert_eq!(table.recent(1, 100).unwrap().len(), 15);
    }

    #[test]
    fn test_short_history_is_not_an_error() {
        // ---
        let file = data_file(20);
        let table = load_table(file.path()).unwrap();
        assert!(table.is_empty());
        assert!(table.floors().is_empty());

        // A floor that is missing from the table is reported as such,
        // not as a training failure.
        assert!(matches!(
            floor_report(file.path(), 1, &quick_config()),
            Err(PipelineError::InvalidFloorSelection(1))
        ));
        assert!(matches!(
            run(file.path(), &quick_config()),
            Err(PipelineError::InsufficientTrainingData)
        ));
    }

    #[test]
    fn test_floor_report_matches_snapshot() {
        // ---
        let file = data_file(40);
        let direct = floor_report(file.path(), 2, &quick_config()).unwrap();
        let via_run = run(file.path(), &quick_config()).unwrap().report(2).unwrap();
        assert_eq!(direct.forecast, via_run.forecast);
        assert_eq!(direct.alerts, via_run.alerts);
    }

    #[test]
    fn test_unknown_floor() {
        // ---
        let file = data_file(40);
        let snapshot = run(file.path(), &quick_config()).unwrap();
        assert!(matches!(
            snapshot.report(5),
            Err(PipelineError::InvalidFloorSelection(5))
        ));
    }
}
