//! Configuration loader for the `ecofloor-sensorflow` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). By consolidating configuration logic here, we
//! avoid scattering `env::var` calls throughout the codebase.
use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::forest::ForestConfig;
use crate::predictor::{FeatureSelection, TrainingConfig};

/// Parse an optional numeric environment variable with a default value.
macro_rules! parse_env {
    ($var_name:expr, $ty:ty, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// CSV file produced by the generator.
    pub data_path: PathBuf,

    /// Address the HTTP server binds to.
    pub bind_addr: String,

    /// Model training parameters.
    pub training: TrainingConfig,

    /// Seconds between scheduled pipeline runs; 0 disables the scheduler.
    pub refresh_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/data_simulada.csv"),
            bind_addr: "0.0.0.0:8080".to_string(),
            training: TrainingConfig::default(),
            refresh_secs: 60,
        }
    }
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `SENSOR_DATA_PATH` – input CSV (default: `data/data_simulada.csv`)
/// - `BIND_ADDR` – listen address (default: `0.0.0.0:8080`)
/// - `FOREST_TREES` – trees per model (default: 100)
/// - `FOREST_MAX_DEPTH` – maximum tree depth (default: 10)
/// - `FOREST_SEED` – seed for bootstrap and holdout split (default: 42)
/// - `HOLDOUT_PERCENT` – rows held out for MAE (default: 20)
/// - `FEATURE_SELECTION` – `all_lagged` or `cross_target` (default: `all_lagged`)
/// - `REFRESH_SECS` – scheduler period, 0 disables (default: 60)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let defaults = Config::default();
    let forest_defaults = ForestConfig::default();

    let data_path = env::var("SENSOR_DATA_PATH")
        .map(PathBuf::from)
        .unwrap_or(defaults.data_path);
    let bind_addr = env::var("BIND_ADDR").unwrap_or(defaults.bind_addr);

    let n_trees = parse_env!("FOREST_TREES", usize, forest_defaults.n_trees);
    let max_depth = parse_env!("FOREST_MAX_DEPTH", usize, forest_defaults.max_depth);
    let seed = parse_env!("FOREST_SEED", u64, forest_defaults.seed);
    let holdout_percent = parse_env!("HOLDOUT_PERCENT", u32, defaults.training.holdout_percent);
    let selection = parse_env!("FEATURE_SELECTION", FeatureSelection, FeatureSelection::default());
    let refresh_secs = parse_env!("REFRESH_SECS", u64, defaults.refresh_secs);

    if n_trees == 0 {
        return Err(anyhow!("FOREST_TREES must be at least 1"));
    }
    if holdout_percent >= 100 {
        return Err(anyhow!("HOLDOUT_PERCENT must be below 100, got {}", holdout_percent));
    }

    Ok(Config {
        data_path,
        bind_addr,
        training: TrainingConfig {
            forest: ForestConfig {
                n_trees,
                max_depth,
                seed,
                ..forest_defaults
            },
            holdout_percent,
            selection,
        },
        refresh_secs,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        let forest = &self.training.forest;

        tracing::info!("Configuration loaded:");
        tracing::info!("  SENSOR_DATA_PATH  : {}", self.data_path.display());
        tracing::info!("  BIND_ADDR         : {}", self.bind_addr);
        tracing::info!("  FOREST_TREES      : {}", forest.n_trees);
        tracing::info!("  FOREST_MAX_DEPTH  : {}", forest.max_depth);
        tracing::info!("  FOREST_SEED       : {}", forest.seed);
        tracing::info!("  HOLDOUT_PERCENT   : {}", self.training.holdout_percent);
        tracing::info!("  FEATURE_SELECTION : {:?}", self.training.selection);
        tracing::info!("  REFRESH_SECS      : {}", self.refresh_secs);
    }
}
