//! Per-floor forecasting and threshold alerts for simulated building sensors.
//!
//! The pipeline is a one-way chain of stateless stages:
//! - `loader` reads the flat CSV file into [`Reading`]s
//! - `features` builds per-floor lag and rolling-mean rows
//! - `predictor` fits one random forest per target and forecasts a floor
//! - `alerts` maps predictions to severity levels, recommendations and
//!   explanations
//!
//! `pipeline` composes the stages for one invocation, `routes` serves the
//! result over HTTP and `scheduler` re-runs everything on a fixed period.
//!
//! Modules reach each other through the re-exports below (EMBP), so the HTTP
//! layer never imports stage internals directly.

pub mod alerts;
pub mod config;
pub mod error;
pub mod features;
pub mod forest;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod predictor;
pub mod routes;
pub mod scheduler;
pub mod simulator;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use features::{build_features, FeatureTable};
pub use models::{Alert, FeatureRow, Forecast, Level, Prediction, Reading, Variable};
pub use pipeline::{FloorReport, Snapshot};
pub use predictor::{train_models, FeatureSelection, TrainedModels, TrainingConfig};
