//! Synthetic sensor data for demos and tests.
//!
//! One reading per floor per minute: a diurnal temperature cycle with
//! Gaussian noise, humidity inversely tied to temperature, and an energy
//! draw with a slow oscillation plus rare load spikes.

use std::f64::consts::PI;
use std::io::Write;

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::error::{PipelineError, Result};
use crate::loader::REQUIRED_COLUMNS;
use crate::models::Reading;

// ---

/// Chance of a load spike on any given reading.
const SPIKE_PROBABILITY: f64 = 0.02;

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub start: DateTime<Utc>,
    pub minutes: usize,
    pub building: String,
    pub floors: Vec<i64>,
    pub seed: u64,
}

impl SimulationConfig {
    pub fn new(start: DateTime<Utc>, minutes: usize) -> Self {
        // ---
        Self {
            start,
            minutes,
            building: "A".to_string(),
            floors: vec![1, 2, 3],
            seed: 42,
        }
    }
}

fn base_temperature(floor: i64) -> f64 {
    // ---
    match floor {
        1 => 24.0,
        2 => 25.5,
        3 => 26.5,
        f => 24.0 + (f - 1) as f64 * 1.25,
    }
}

fn base_energy(floor: i64) -> f64 {
    // ---
    match floor {
        1 => 3.5,
        2 => 5.5,
        3 => 7.0,
        f => 3.5 + (f - 1) as f64 * 1.75,
    }
}

/// Zero-mean normal sample with standard deviation `sd`.
fn gaussian(rng: &mut StdRng, sd: f64) -> f64 {
    sd * rng.sample::<f64, _>(StandardNormal)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Generate readings minute by minute, floors in configured order.
pub fn generate(config: &SimulationConfig) -> Vec<Reading> {
    // ---
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut readings = Vec::with_capacity(config.minutes * config.floors.len());
    for m in 0..config.minutes {
        let timestamp = config.start + Duration::minutes(m as i64);
        let minute_of_day = (timestamp.hour() * 60 + timestamp.minute()) as f64;
        let diurnal = 2.0 * (minute_of_day / 1440.0 * 2.0 * PI).sin();

        for &floor in &config.floors {
            let temp = base_temperature(floor)
                + diurnal
                + gaussian(&mut rng, 0.3)
                + 0.05 * (floor - 1) as f64;
            let humidity = (60.0 - (temp - 22.0) * 2.0 + gaussian(&mut rng, 1.0)).max(30.0);

            let spike = if rng.gen_bool(SPIKE_PROBABILITY) {
                rng.gen_range(1.0..3.0)
            } else {
                0.0
            };
            let energy = base_energy(floor)
                + 0.5 * (minute_of_day / 30.0).sin()
                + spike
                + gaussian(&mut rng, 0.2);

            readings.push(Reading {
                timestamp,
                building: config.building.clone(),
                floor,
                temp_c: round2(temp),
                humidity_pct: round2(humidity),
                energy_kw: round2(energy.max(0.1)),
            });
        }
    }
    readings
}

/// Write readings in the loader's CSV layout.
pub fn write_csv<W: Write>(readings: &[Reading], out: W) -> Result<()> {
    // ---
    let mut w = csv::Writer::from_writer(out);
    w.write_record(REQUIRED_COLUMNS)?;
    for r in readings {
        w.write_record([
            r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            r.building.clone(),
            r.floor.to_string(),
            format!("{:.2}", r.temp_c),
            format!("{:.2}", r.humidity_pct),
            format!("{:.2}", r.energy_kw),
        ])?;
    }
    w.flush().map_err(PipelineError::Io)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::loader::read_readings;
    use chrono::TimeZone;

    fn config(minutes: usize) -> SimulationConfig {
        SimulationConfig::new(Utc.with_ymd_and_hms(2025, 10, 18, 6, 0, 0).unwrap(), minutes)
    }

    #[test]
    fn test_one_reading_per_floor_per_minute() {
        // ---
        let readings = generate(&config(40));
        assert_eq!(readings.len(), 120);
        assert_eq!(readings[0].floor, 1);
        assert_eq!(readings[2].floor, 3);
        assert_eq!(readings[3].timestamp - readings[0].timestamp, Duration::minutes(1));
    }

    #[test]
    fn test_values_are_plausible() {
        // ---
        for r in generate(&config(300)) {
            assert!((18.0..35.0).contains(&r.temp_c), "{r:?}");
            assert!(r.humidity_pct >= 30.0, "{r:?}");
            assert!(r.energy_kw >= 0.1, "{r:?}");
        }
    }

    #[test]
    fn test_same_seed_same_series() {
        // ---
        assert_eq!(generate(&config(50)), generate(&config(50)));

        let mut other = config(50);
        other.seed = 7;
        assert_ne!(generate(&config(50)), generate(&other));
    }

    #[test]
    fn test_written_csv_loads_back() {
        // ---
        let readings = generate(&config(35));
        let mut buf = Vec::new();
        write_csv(&readings, &mut buf).unwrap();

        let loaded = read_readings(buf.as_slice()).unwrap();
        assert_eq!(loaded, readings);
    }
}
