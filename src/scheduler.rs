//! Periodic re-run of the pipeline.
//!
//! Each tick loads the file again, retrains and logs the alert summary for
//! every floor. Nothing is carried from one tick to the next.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::{pipeline, Config, Result, Snapshot};

// ---

/// Per-floor outcome of one scheduled run.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorSummary {
    pub floor: i64,
    pub alerts: usize,
    pub urgent: usize,
}

/// Run the pipeline once and summarise the alerts of every floor.
///
/// A file with no complete floor yet gives an empty summary.
pub fn run_once(config: &Config) -> Result<Vec<FloorSummary>> {
    // ---
    let table = pipeline::load_table(&config.data_path)?;
    if table.is_empty() {
        info!("No floor has enough history yet; nothing to forecast");
        return Ok(Vec::new());
    }
    let snapshot = Snapshot::train(table, &config.training)?;
    snapshot
        .floors()
        .into_iter()
        .map(|floor| -> Result<FloorSummary> {
            let report = snapshot.report(floor)?;
            Ok(FloorSummary {
                floor,
                alerts: report.alerts.len(),
                urgent: report.urgent_alerts,
            })
        })
        .collect()
}

/// Spawn the refresh loop; `None` when `refresh_secs` is 0.
pub fn spawn(config: Config) -> Option<JoinHandle<()>> {
    // ---
    if config.refresh_secs == 0 {
        info!("Scheduler disabled (REFRESH_SECS=0)");
        return None;
    }

    let period = Duration::from_secs(config.refresh_secs);
    info!("Scheduler refreshing every {:?}", period);

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let cfg = config.clone();
            match tokio::task::spawn_blocking(move || run_once(&cfg)).await {
                Ok(Ok(summaries)) => {
                    for s in summaries {
                        if s.urgent > 0 {
                            warn!(
                                "Floor {}: {} media/crítica alert(s) of {}",
                                s.floor, s.urgent, s.alerts
                            );
                        } else {
                            info!("Floor {}: {} alert(s)", s.floor, s.alerts);
                        }
                    }
                }
                Ok(Err(e)) => error!("Scheduled pipeline run failed: {}", e),
                Err(e) => error!("Scheduled pipeline task panicked: {}", e),
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::forest::ForestConfig;
    use crate::predictor::TrainingConfig;
    use crate::simulator::{generate, write_csv, SimulationConfig};
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn config_for(file: &NamedTempFile, refresh_secs: u64) -> Config {
        // ---
        Config {
            data_path: file.path().to_path_buf(),
            refresh_secs,
            training: TrainingConfig {
                forest: ForestConfig {
                    n_trees: 5,
                    max_depth: 4,
                    ..ForestConfig::default()
                },
                ..TrainingConfig::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_run_once_summarises_each_floor() {
        // ---
        let start = Utc.with_ymd_and_hms(2025, 10, 18, 12, 0, 0).unwrap();
        let file = NamedTempFile::new().unwrap();
        write_csv(&generate(&SimulationConfig::new(start, 40)), file.reopen().unwrap()).unwrap();

        let summaries = run_once(&config_for(&file, 0)).unwrap();
        assert_eq!(
            summaries.iter().map(|s| s.floor).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        for s in summaries {
            assert!(s.urgent <= s.alerts);
            assert!(s.alerts >= 1);
        }
    }

    #[test]
    fn test_run_once_with_short_history_is_empty() {
        // ---
        let start = Utc.with_ymd_and_hms(2025, 10, 18, 12, 0, 0).unwrap();
        let file = NamedTempFile::new().unwrap();
        write_csv(&generate(&SimulationConfig::new(start, 20)), file.reopen().unwrap()).unwrap();

        assert!(run_once(&config_for(&file, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_run_once_reports_missing_file() {
        // ---
        let config = Config {
            data_path: "/nonexistent/ecofloor.csv".into(),
            ..Config::default()
        };
        assert!(run_once(&config).is_err());
    }

    #[tokio::test]
    async fn test_disabled_scheduler_spawns_nothing() {
        // ---
        let file = NamedTempFile::new().unwrap();
        assert!(spawn(config_for(&file, 0)).is_none());

        let handle = spawn(config_for(&file, 3600)).unwrap();
        handle.abort();
    }
}
