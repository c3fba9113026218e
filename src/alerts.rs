//! Threshold classification of predicted values into alerts.
//!
//! Bands are checked from most to least severe and the first match wins:
//!
//! | Variable      | Crítica        | Media          | Informativa    | Normal |
//! |---------------|----------------|----------------|----------------|--------|
//! | `temp_C`      | >= 29.5        | [28, 29.5)     | [26, 28)       | < 26   |
//! | `humedad_pct` | > 80 or < 20   | > 75 or < 22   | > 70 or < 25   | else   |
//! | `energia_kW`  | > 1.4          | > 1.2          | > 1.0          | else   |
//!
//! Every real number maps to exactly one level. NaN compares false against
//! every bound and lands in Normal.

use chrono::{DateTime, Utc};

use crate::models::{Alert, Forecast, Level, Variable};

// ---

pub const TEMP_CRITICAL: f64 = 29.5;
pub const TEMP_MEDIUM: f64 = 28.0;
pub const TEMP_INFO: f64 = 26.0;

pub const HUMIDITY_CRITICAL: (f64, f64) = (20.0, 80.0);
pub const HUMIDITY_MEDIUM: (f64, f64) = (22.0, 75.0);
pub const HUMIDITY_INFO: (f64, f64) = (25.0, 70.0);

pub const ENERGY_CRITICAL: f64 = 1.4;
pub const ENERGY_MEDIUM: f64 = 1.2;
pub const ENERGY_INFO: f64 = 1.0;

/// Severity of a predicted value.
pub fn classify(variable: Variable, value: f64) -> Level {
    // ---
    let outside = |(low, high): (f64, f64)| value > high || value < low;

    match variable {
        Variable::Temperature => {
            if value >= TEMP_CRITICAL {
                Level::Critica
            } else if value >= TEMP_MEDIUM {
                Level::Media
            } else if value >= TEMP_INFO {
                Level::Informativa
            } else {
                Level::Normal
            }
        }
        Variable::Humidity => {
            if outside(HUMIDITY_CRITICAL) {
                Level::Critica
            } else if outside(HUMIDITY_MEDIUM) {
                Level::Media
            } else if outside(HUMIDITY_INFO) {
                Level::Informativa
            } else {
                Level::Normal
            }
        }
        Variable::Energy => {
            if value > ENERGY_CRITICAL {
                Level::Critica
            } else if value > ENERGY_MEDIUM {
                Level::Media
            } else if value > ENERGY_INFO {
                Level::Informativa
            } else {
                Level::Normal
            }
        }
    }
}

/// Action to take for an alert; `None` when the level is Normal.
pub fn recommendation(variable: Variable, level: Level) -> Option<&'static str> {
    // ---
    let text = match (variable, level) {
        (_, Level::Normal) => return None,
        (Variable::Temperature, Level::Critica) => "Ajustar setpoint a 24 °C y aumentar ventilación",
        (Variable::Temperature, Level::Media) => {
            "Reducir carga térmica o revisar sistema de climatización"
        }
        (Variable::Temperature, Level::Informativa) => "Monitorear evolución de la temperatura",
        (Variable::Humidity, Level::Critica) => {
            "Ajustar sistema de humidificación/deshumidificación"
        }
        (Variable::Humidity, Level::Media) => "Revisar calibración del sistema de ventilación",
        (Variable::Humidity, Level::Informativa) => "Observar la tendencia en las próximas horas",
        (Variable::Energy, Level::Critica) => "Redistribuir carga eléctrica y revisar equipos",
        (Variable::Energy, Level::Media) => "Evaluar horarios y picos de uso energético",
        (Variable::Energy, Level::Informativa) => {
            "Monitorear demanda eléctrica en la próxima hora"
        }
    };
    Some(text)
}

/// Probable cause of an alert on `variable`, given the whole forecast.
///
/// Temperature looks at energy as well: a hot floor that is also drawing a
/// lot of power gets the combined explanation.
pub fn explanation(variable: Variable, forecast: &Forecast) -> &'static str {
    // ---
    let temp = forecast.temp_c;
    let hum = forecast.humidity_pct;
    let energy = forecast.energy_kw;

    match variable {
        Variable::Temperature if temp >= TEMP_CRITICAL && energy > ENERGY_MEDIUM => {
            "Alta carga térmica combinada con alto consumo energético."
        }
        Variable::Temperature if temp >= TEMP_MEDIUM => {
            "Incremento sostenido de temperatura en el último periodo."
        }
        Variable::Temperature => "Variación leve de temperatura detectada.",

        Variable::Humidity if hum > HUMIDITY_CRITICAL.1 => {
            "Exceso de humedad posiblemente por baja ventilación."
        }
        Variable::Humidity if hum < HUMIDITY_CRITICAL.0 => {
            "Ambiente demasiado seco, revisar sellado y flujo de aire."
        }
        Variable::Humidity => "Pequeña desviación respecto al rango óptimo.",

        Variable::Energy if energy > ENERGY_CRITICAL => {
            "Demanda energética crítica posiblemente por sobreuso de equipos."
        }
        Variable::Energy if energy > ENERGY_MEDIUM => "Consumo elevado fuera del promedio reciente.",
        Variable::Energy => "Aumento leve en el consumo energético.",
    }
}

/// Alerts for one floor's forecast: temperature, humidity, energy order,
/// Normal values omitted.
pub fn alerts_for(floor: i64, timestamp: DateTime<Utc>, forecast: &Forecast) -> Vec<Alert> {
    // ---
    Variable::ALL
        .into_iter()
        .filter_map(|variable| {
            let level = classify(variable, forecast.get(variable));
            let recommendation = recommendation(variable, level)?;
            Some(Alert {
                timestamp,
                floor,
                variable,
                level,
                recommendation,
                explanation: explanation(variable, forecast),
            })
        })
        .collect()
}

/// Floor-level advisory sentences shown next to the forecast.
pub fn recommendations(floor: i64, forecast: &Forecast) -> Vec<String> {
    // ---
    let mut out = Vec::new();

    match classify(Variable::Temperature, forecast.temp_c) {
        Level::Critica => out.push(format!(
            "Temperatura crítica detectada en el Piso {floor}. Ajustar el setpoint a 24 °C y aumentar el flujo de aire acondicionado."
        )),
        Level::Media => out.push(format!(
            "Temperatura media en el Piso {floor}. Se sugiere reducir carga térmica o revisar los equipos de climatización."
        )),
        Level::Informativa => out.push(format!(
            "Temperatura informativa en el Piso {floor}. Supervisar la tendencia durante los próximos 30 min."
        )),
        Level::Normal => {}
    }

    match classify(Variable::Humidity, forecast.humidity_pct) {
        Level::Critica => out.push(format!(
            "Humedad crítica en el Piso {floor}. Ajustar humidificadores/deshumidificadores y verificar ventilación."
        )),
        Level::Media => out.push(format!(
            "Humedad media en el Piso {floor}. Revisar filtros y calibración del sistema de ventilación."
        )),
        Level::Informativa => out.push(format!(
            "Humedad fuera del rango óptimo en el Piso {floor}. Observar si se mantiene la tendencia."
        )),
        Level::Normal => {}
    }

    match classify(Variable::Energy, forecast.energy_kw) {
        Level::Critica => out.push(format!(
            "Consumo energético crítico en el Piso {floor}. Redistribuir carga hacia pisos con menor demanda y revisar equipos."
        )),
        Level::Media => out.push(
            "Consumo energético medio. Evaluar horarios de funcionamiento y reducir picos de carga."
                .to_string(),
        ),
        Level::Informativa => out.push(
            "Consumo energético informativo. Monitorear durante la próxima hora para evitar sobrecarga."
                .to_string(),
        ),
        Level::Normal => {}
    }

    if out.is_empty() {
        out.push(format!(
            "Piso {floor} en condiciones estables. Mantener parámetros actuales y continuar monitoreo."
        ));
    }
    out
}

/// Keep only alerts of `level`; `None` keeps everything.
pub fn filter_by_level(alerts: Vec<Alert>, level: Option<Level>) -> Vec<Alert> {
    // ---
    match level {
        Some(level) => alerts.into_iter().filter(|a| a.level == level).collect(),
        None => alerts,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn forecast(temp_c: f64, humidity_pct: f64, energy_kw: f64) -> Forecast {
        Forecast {
            temp_c,
            humidity_pct,
            energy_kw,
        }
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 18, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_temperature_bands() {
        // ---
        assert_eq!(classify(Variable::Temperature, 29.5), Level::Critica);
        assert_eq!(classify(Variable::Temperature, 29.4999), Level::Media);
        assert_eq!(classify(Variable::Temperature, 28.0), Level::Media);
        assert_eq!(classify(Variable::Temperature, 27.99), Level::Informativa);
        assert_eq!(classify(Variable::Temperature, 26.0), Level::Informativa);
        assert_eq!(classify(Variable::Temperature, 25.99), Level::Normal);
        assert_eq!(classify(Variable::Temperature, -40.0), Level::Normal);
    }

    #[test]
    fn test_humidity_bands() {
        // ---
        assert_eq!(classify(Variable::Humidity, 81.0), Level::Critica);
        assert_eq!(classify(Variable::Humidity, 19.9), Level::Critica);
        assert_eq!(classify(Variable::Humidity, 80.0), Level::Media);
        assert_eq!(classify(Variable::Humidity, 20.0), Level::Media);
        assert_eq!(classify(Variable::Humidity, 75.0), Level::Informativa);
        assert_eq!(classify(Variable::Humidity, 24.0), Level::Informativa);
        assert_eq!(classify(Variable::Humidity, 70.0), Level::Normal);
        assert_eq!(classify(Variable::Humidity, 25.0), Level::Normal);
        assert_eq!(classify(Variable::Humidity, 50.0), Level::Normal);
    }

    #[test]
    fn test_energy_bands() {
        // ---
        assert_eq!(classify(Variable::Energy, 1.5), Level::Critica);
        assert_eq!(classify(Variable::Energy, 1.4), Level::Media);
        assert_eq!(classify(Variable::Energy, 1.2), Level::Informativa);
        assert_eq!(classify(Variable::Energy, 1.01), Level::Informativa);
        assert_eq!(classify(Variable::Energy, 1.0), Level::Normal);
        assert_eq!(classify(Variable::Energy, 0.0), Level::Normal);
    }

    #[test]
    fn test_classifier_is_total() {
        // ---
        for v in Variable::ALL {
            for value in [f64::NEG_INFINITY, -1e9, 0.0, 1e9, f64::INFINITY, f64::NAN] {
                let _ = classify(v, value);
            }
        }
        assert_eq!(classify(Variable::Energy, f64::NAN), Level::Normal);
    }

    #[test]
    fn test_hot_and_loaded_floor() {
        // ---
        let f = forecast(30.0, 50.0, 1.5);
        let alerts = alerts_for(3, ts(), &f);

        assert_eq!(alerts.len(), 2);
        let temp = &alerts[0];
        assert_eq!(temp.variable, Variable::Temperature);
        assert_eq!(temp.level, Level::Critica);
        assert_eq!(temp.floor, 3);
        assert_eq!(
            temp.explanation,
            "Alta carga térmica combinada con alto consumo energético."
        );
        assert_eq!(
            temp.recommendation,
            "Ajustar setpoint a 24 °C y aumentar ventilación"
        );

        let energy = &alerts[1];
        assert_eq!(energy.variable, Variable::Energy);
        assert_eq!(energy.level, Level::Critica);
        assert_eq!(
            energy.explanation,
            "Demanda energética crítica posiblemente por sobreuso de equipos."
        );
    }

    #[test]
    fn test_alert_table_recommendations() {
        // ---
        let table = [
            (Variable::Temperature, Level::Critica, "Ajustar setpoint a 24 °C y aumentar ventilación"),
            (Variable::Temperature, Level::Media, "Reducir carga térmica o revisar sistema de climatización"),
            (Variable::Temperature, Level::Informativa, "Monitorear evolución de la temperatura"),
            (Variable::Humidity, Level::Critica, "Ajustar sistema de humidificación/deshumidificación"),
            (Variable::Humidity, Level::Media, "Revisar calibración del sistema de ventilación"),
            (Variable::Humidity, Level::Informativa, "Observar la tendencia en las próximas horas"),
            (Variable::Energy, Level::Critica, "Redistribuir carga eléctrica y revisar equipos"),
            (Variable::Energy, Level::Media, "Evaluar horarios y picos de uso energético"),
            (Variable::Energy, Level::Informativa, "Monitorear demanda eléctrica en la próxima hora"),
        ];
        for (variable, level, text) in table {
            assert_eq!(recommendation(variable, level), Some(text), "{variable} {level}");
        }
        for v in Variable::ALL {
            assert_eq!(recommendation(v, Level::Normal), None);
        }

        // Temperature alone at 30 °C carries the alert-table text.
        let alerts = alerts_for(1, ts(), &forecast(30.0, 50.0, 0.5));
        assert_eq!(alerts.len(), 1);
        assert_eq!(
            alerts[0].recommendation,
            "Ajustar setpoint a 24 °C y aumentar ventilación"
        );
    }

    #[test]
    fn test_temperature_explanation_needs_both_conditions() {
        // ---
        // Critical temperature with modest energy is only a sustained rise.
        assert_eq!(
            explanation(Variable::Temperature, &forecast(30.0, 50.0, 1.2)),
            "Incremento sostenido de temperatura en el último periodo."
        );
        // High energy with medium temperature is not the combined cause.
        assert_eq!(
            explanation(Variable::Temperature, &forecast(29.0, 50.0, 1.6)),
            "Incremento sostenido de temperatura en el último periodo."
        );
        assert_eq!(
            explanation(Variable::Temperature, &forecast(26.5, 50.0, 1.6)),
            "Variación leve de temperatura detectada."
        );
    }

    #[test]
    fn test_humidity_and_energy_explanations() {
        // ---
        assert_eq!(
            explanation(Variable::Humidity, &forecast(22.0, 85.0, 0.5)),
            "Exceso de humedad posiblemente por baja ventilación."
        );
        assert_eq!(
            explanation(Variable::Humidity, &forecast(22.0, 15.0, 0.5)),
            "Ambiente demasiado seco, revisar sellado y flujo de aire."
        );
        assert_eq!(
            explanation(Variable::Humidity, &forecast(22.0, 73.0, 0.5)),
            "Pequeña desviación respecto al rango óptimo."
        );
        assert_eq!(
            explanation(Variable::Energy, &forecast(22.0, 50.0, 1.3)),
            "Consumo elevado fuera del promedio reciente."
        );
        assert_eq!(
            explanation(Variable::Energy, &forecast(22.0, 50.0, 1.1)),
            "Aumento leve en el consumo energético."
        );
    }

    #[test]
    fn test_normal_forecast_has_no_alerts() {
        // ---
        let f = forecast(23.0, 50.0, 0.8);
        assert!(alerts_for(1, ts(), &f).is_empty());

        let recs = recommendations(1, &f);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].starts_with("Piso 1 en condiciones estables"));
    }

    #[test]
    fn test_recommendations_per_variable() {
        // ---
        let recs = recommendations(2, &forecast(28.5, 90.0, 1.1));
        assert_eq!(recs.len(), 3);
        assert!(recs[0].starts_with("Temperatura media en el Piso 2"));
        assert!(recs[1].starts_with("Humedad crítica en el Piso 2"));
        assert!(recs[2].starts_with("Consumo energético informativo"));
    }

    #[test]
    fn test_filter_and_urgency() {
        // ---
        let alerts = alerts_for(1, ts(), &forecast(28.5, 72.0, 1.6));
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts.iter().filter(|a| a.is_urgent()).count(), 2);

        let media = filter_by_level(alerts.clone(), Some(Level::Media));
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].variable, Variable::Temperature);

        assert_eq!(filter_by_level(alerts.clone(), None), alerts);
        assert!(filter_by_level(alerts, Some(Level::Normal)).is_empty());
    }
}
