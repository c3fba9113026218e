//! Data models for the building sensor pipeline.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

// ---

/// Lag offsets, in same-floor samples, computed for every variable.
pub const LAGS: [usize; 4] = [1, 5, 15, 30];

/// Trailing window of the rolling mean.
pub const ROLLING_WINDOW: usize = 15;

/// Sensor variable measured on every floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Variable {
    // ---
    #[serde(rename = "temp_C")]
    Temperature,
    #[serde(rename = "humedad_pct")]
    Humidity,
    #[serde(rename = "energia_kW")]
    Energy,
}

impl Variable {
    // ---
    pub const ALL: [Variable; 3] = [Variable::Temperature, Variable::Humidity, Variable::Energy];

    /// Column name in the input file.
    pub fn column(self) -> &'static str {
        // ---
        match self {
            Variable::Temperature => "temp_C",
            Variable::Humidity => "humedad_pct",
            Variable::Energy => "energia_kW",
        }
    }

    /// Names of the derived columns, in the order `Features::values` yields them.
    pub fn feature_columns(self) -> Vec<String> {
        // ---
        let col = self.column();
        let mut names: Vec<String> = LAGS.iter().map(|k| format!("{col}_lag{k}")).collect();
        names.push(format!("{col}_rolling{ROLLING_WINDOW}"));
        names
    }

    pub fn of(self, reading: &Reading) -> f64 {
        // ---
        match self {
            Variable::Temperature => reading.temp_c,
            Variable::Humidity => reading.humidity_pct,
            Variable::Energy => reading.energy_kw,
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One row of the input file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    // ---
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "edificio")]
    pub building: String,
    #[serde(rename = "piso")]
    pub floor: i64,
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    #[serde(rename = "humedad_pct")]
    pub humidity_pct: f64,
    #[serde(rename = "energia_kW")]
    pub energy_kw: f64,
}

/// Lag and rolling features of a single variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Features {
    // ---
    pub lag1: f64,
    pub lag5: f64,
    pub lag15: f64,
    pub lag30: f64,
    pub rolling15: f64,
}

impl Features {
    pub fn values(&self) -> [f64; 5] {
        [self.lag1, self.lag5, self.lag15, self.lag30, self.rolling15]
    }
}

/// A reading with every lag defined, plus its derived features.
///
/// Serializes flat, one key per column, like a row of the feature CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    // ---
    pub reading: Reading,
    pub temp_c: Features,
    pub humidity_pct: Features,
    pub energy_kw: Features,
}

impl Serialize for FeatureRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // ---
        let r = &self.reading;
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("timestamp", &r.timestamp)?;
        map.serialize_entry("edificio", &r.building)?;
        map.serialize_entry("piso", &r.floor)?;
        for v in Variable::ALL {
            map.serialize_entry(v.column(), &v.of(r))?;
        }
        for v in Variable::ALL {
            for (name, value) in v.feature_columns().iter().zip(self.features(v).values()) {
                map.serialize_entry(name, &value)?;
            }
        }
        map.end()
    }
}

impl FeatureRow {
    // ---
    pub fn features(&self, variable: Variable) -> &Features {
        // ---
        match variable {
            Variable::Temperature => &self.temp_c,
            Variable::Humidity => &self.humidity_pct,
            Variable::Energy => &self.energy_kw,
        }
    }

    pub fn observed(&self, variable: Variable) -> f64 {
        variable.of(&self.reading)
    }
}

/// Point estimate for one target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub target: Variable,
    pub value: f64,
}

/// One prediction per target for a single floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecast {
    // ---
    pub temp_c: f64,
    pub humidity_pct: f64,
    pub energy_kw: f64,
}

impl Forecast {
    // ---
    pub fn get(&self, variable: Variable) -> f64 {
        // ---
        match variable {
            Variable::Temperature => self.temp_c,
            Variable::Humidity => self.humidity_pct,
            Variable::Energy => self.energy_kw,
        }
    }

    pub fn predictions(&self) -> Vec<Prediction> {
        // ---
        Variable::ALL
            .iter()
            .map(|&target| Prediction {
                target,
                value: self.get(target),
            })
            .collect()
    }
}

/// Severity band of a predicted value, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    // ---
    Normal,
    Informativa,
    Media,
    #[serde(rename = "Crítica")]
    Critica,
}

impl Level {
    // ---
    pub fn as_str(self) -> &'static str {
        // ---
        match self {
            Level::Normal => "Normal",
            Level::Informativa => "Informativa",
            Level::Media => "Media",
            Level::Critica => "Crítica",
        }
    }

    /// Parse a level name; accepts the unaccented spelling of "Crítica".
    pub fn parse(s: &str) -> Option<Level> {
        // ---
        match s {
            "Normal" => Some(Level::Normal),
            "Informativa" => Some(Level::Informativa),
            "Media" => Some(Level::Media),
            "Crítica" | "Critica" => Some(Level::Critica),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert raised for a non-normal predicted value. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    // ---
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "piso")]
    pub floor: i64,
    pub variable: Variable,
    #[serde(rename = "nivel")]
    pub level: Level,
    #[serde(rename = "recomendacion")]
    pub recommendation: &'static str,
    #[serde(rename = "explicacion")]
    pub explanation: &'static str,
}

impl Alert {
    /// Media and Crítica alerts need attention now.
    pub fn is_urgent(&self) -> bool {
        self.level >= Level::Media
    }
}
