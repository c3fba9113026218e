//! Per-target model training and single-step forecasting.
//!
//! One random forest is fitted per target variable. Inputs are lag/rolling
//! columns only; the current-minute readings are never inputs. The column
//! set is enumerated explicitly by [`FeatureSelection`].

use std::collections::BTreeMap;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::features::FeatureTable;
use crate::forest::{mean_absolute_error, ForestConfig, RandomForest};
use crate::models::{FeatureRow, Forecast, Variable};

// ---

/// Which derived columns feed each target's model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSelection {
    /// Every lag and rolling column of all three variables (15 inputs).
    #[default]
    AllLagged,
    /// Lag and rolling columns of the two other variables only (10 inputs).
    CrossTarget,
}

impl FeatureSelection {
    /// Variables whose derived columns are inputs for `target`.
    pub fn sources(self, target: Variable) -> Vec<Variable> {
        // ---
        match self {
            FeatureSelection::AllLagged => Variable::ALL.to_vec(),
            FeatureSelection::CrossTarget => {
                Variable::ALL.into_iter().filter(|&v| v != target).collect()
            }
        }
    }

    pub fn column_names(self, target: Variable) -> Vec<String> {
        // ---
        self.sources(target)
            .into_iter()
            .flat_map(Variable::feature_columns)
            .collect()
    }

    /// Model input vector for `target` from one feature row.
    pub fn vector(self, target: Variable, row: &FeatureRow) -> Vec<f64> {
        // ---
        self.sources(target)
            .into_iter()
            .flat_map(|v| row.features(v).values())
            .collect()
    }
}

impl FromStr for FeatureSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // ---
        match s {
            "all_lagged" => Ok(FeatureSelection::AllLagged),
            "cross_target" => Ok(FeatureSelection::CrossTarget),
            other => Err(format!(
                "unknown feature selection '{other}' (expected all_lagged or cross_target)"
            )),
        }
    }
}

/// Training parameters shared by the three targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub forest: ForestConfig,
    /// Percentage of rows held out for evaluation.
    pub holdout_percent: u32,
    pub selection: FeatureSelection,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::default(),
            holdout_percent: 20,
            selection: FeatureSelection::AllLagged,
        }
    }
}

/// A fitted model and its holdout score.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub forest: RandomForest,
    pub columns: Vec<String>,
    pub train_rows: usize,
    pub holdout_rows: usize,
    /// Mean absolute error on the holdout rows; `None` when none were held out.
    pub holdout_mae: Option<f64>,
}

/// Fitted models keyed by target. Immutable once trained.
#[derive(Debug, Clone)]
pub struct TrainedModels {
    models: BTreeMap<Variable, FittedModel>,
    selection: FeatureSelection,
}

/// Split `n` row indices into (train, holdout) with a seeded shuffle.
///
/// The holdout gets `ceil(n * percent / 100)` rows but never all of them.
pub fn holdout_split(n: usize, percent: u32, seed: u64) -> (Vec<usize>, Vec<usize>) {
    // ---
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let wanted = (n * percent.min(100) as usize).div_ceil(100);
    let holdout_len = wanted.min(n.saturating_sub(1));
    let train = indices.split_off(holdout_len);
    (train, indices)
}

/// Fit one model per target over the whole feature table.
pub fn train_models(table: &FeatureTable, config: &TrainingConfig) -> Result<TrainedModels> {
    // ---
    let rows: Vec<&FeatureRow> = table.rows().collect();
    let (train_idx, test_idx) = holdout_split(rows.len(), config.holdout_percent, config.forest.seed);

    let mut models = BTreeMap::new();
    for target in Variable::ALL {
        let design = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
            idx.iter()
                .map(|&i| (config.selection.vector(target, rows[i]), rows[i].observed(target)))
                .unzip()
        };
        let (x_train, y_train) = design(&train_idx);
        let (x_test, y_test) = design(&test_idx);

        let forest = RandomForest::fit(&x_train, &y_train, &config.forest)?;
        let holdout_mae = mean_absolute_error(&y_test, &forest.predict_many(&x_test));

        match holdout_mae {
            Some(mae) => info!("Model trained for {}: MAE = {:.3}", target, mae),
            None => info!("Model trained for {}: no holdout rows", target),
        }
        debug!(
            "{}: {} train rows, {} holdout rows, {} inputs",
            target,
            x_train.len(),
            x_test.len(),
            forest.n_features()
        );

        models.insert(
            target,
            FittedModel {
                forest,
                columns: config.selection.column_names(target),
                train_rows: x_train.len(),
                holdout_rows: x_test.len(),
                holdout_mae,
            },
        );
    }

    Ok(TrainedModels {
        models,
        selection: config.selection,
    })
}

impl TrainedModels {
    // ---
    pub fn model(&self, target: Variable) -> Option<&FittedModel> {
        self.models.get(&target)
    }

    pub fn selection(&self) -> FeatureSelection {
        self.selection
    }

    /// Apply every model to one feature row.
    pub fn predict(&self, row: &FeatureRow) -> Forecast {
        // ---
        let value = |target: Variable| {
            self.models
                .get(&target)
                .map(|m| m.forest.predict(&self.selection.vector(target, row)))
                .unwrap_or(f64::NAN)
        };
        Forecast {
            temp_c: value(Variable::Temperature),
            humidity_pct: value(Variable::Humidity),
            energy_kw: value(Variable::Energy),
        }
    }

    /// Forecast from the most recent row of `floor`.
    pub fn forecast_floor(&self, table: &FeatureTable, floor: i64) -> Result<Forecast> {
        // ---
        let latest = table.latest(floor)?;
        Ok(self.predict(latest))
    }

    pub fn holdout_mae(&self) -> BTreeMap<Variable, Option<f64>> {
        // ---
        self.models
            .iter()
            .map(|(&target, m)| (target, m.holdout_mae))
            .collect()
    }
}
