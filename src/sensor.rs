//! Environmental readings as delivered by the polling backend, plus a seeded
//! simulator standing in for real sensors.
//!
//! Every parameter is a named field of [`EnvironmentalReading`], so a missing
//! parameter fails at decode time instead of surfacing later as a hole in the table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rng::Rng;
use crate::trend::{RiskReading, clamp_probability};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterStatus {
    Normal,
    High,
}

impl ParameterStatus {
    pub fn for_value(value: f32, threshold: f32) -> Self {
        if value > threshold {
            ParameterStatus::High
        } else {
            ParameterStatus::Normal
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterKind {
    Rainfall,
    CumulativeRainfall,
    Temperature,
    TemperatureRange,
    Vibration,
    PorePressure,
    Humidity,
}

impl ParameterKind {
    pub const ALL: [ParameterKind; 7] = [
        ParameterKind::Rainfall,
        ParameterKind::CumulativeRainfall,
        ParameterKind::Temperature,
        ParameterKind::TemperatureRange,
        ParameterKind::Vibration,
        ParameterKind::PorePressure,
        ParameterKind::Humidity,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ParameterKind::Rainfall => "Rainfall",
            ParameterKind::CumulativeRainfall => "Cumulative Rainfall (24h)",
            ParameterKind::Temperature => "Temperature",
            ParameterKind::TemperatureRange => "Temperature Range",
            ParameterKind::Vibration => "Vibration",
            ParameterKind::PorePressure => "Pore Pressure",
            ParameterKind::Humidity => "Humidity",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            ParameterKind::Rainfall | ParameterKind::CumulativeRainfall => "mm",
            ParameterKind::Temperature | ParameterKind::TemperatureRange => "°C",
            ParameterKind::Vibration => "mm/s",
            ParameterKind::PorePressure => "kPa",
            ParameterKind::Humidity => "%",
        }
    }

    pub fn threshold(self) -> f32 {
        match self {
            ParameterKind::Rainfall => 50.0,
            ParameterKind::CumulativeRainfall => 100.0,
            ParameterKind::Temperature => 28.0,
            ParameterKind::TemperatureRange => 10.0,
            ParameterKind::Vibration => 7.0,
            ParameterKind::PorePressure => 80.0,
            ParameterKind::Humidity => 70.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub value: f32,
    pub unit: String,
    pub threshold: f32,
    pub status: ParameterStatus,
    pub last_updated: DateTime<Utc>,
}

impl Parameter {
    pub fn measured(kind: ParameterKind, value: f32, at: DateTime<Utc>) -> Self {
        let value = round2(value);
        Self {
            value,
            unit: kind.unit().to_string(),
            threshold: kind.threshold(),
            status: ParameterStatus::for_value(value, kind.threshold()),
            last_updated: at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalReading {
    pub rainfall: Parameter,
    pub cumulative_rainfall: Parameter,
    pub temperature: Parameter,
    pub temperature_range: Parameter,
    pub vibration: Parameter,
    pub pore_pressure: Parameter,
    pub humidity: Parameter,
    pub risk_probability: f32,
}

/// One row of the environmental data table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableRow {
    pub kind: ParameterKind,
    pub parameter: &'static str,
    #[serde(flatten)]
    pub data: Parameter,
}

impl EnvironmentalReading {
    pub fn parameter(&self, kind: ParameterKind) -> &Parameter {
        match kind {
            ParameterKind::Rainfall => &self.rainfall,
            ParameterKind::CumulativeRainfall => &self.cumulative_rainfall,
            ParameterKind::Temperature => &self.temperature,
            ParameterKind::TemperatureRange => &self.temperature_range,
            ParameterKind::Vibration => &self.vibration,
            ParameterKind::PorePressure => &self.pore_pressure,
            ParameterKind::Humidity => &self.humidity,
        }
    }

    pub fn rows(&self) -> Vec<TableRow> {
        ParameterKind::ALL
            .iter()
            .map(|&kind| TableRow {
                kind,
                parameter: kind.label(),
                data: self.parameter(kind).clone(),
            })
            .collect()
    }

    /// Risk probability normalised into [0, 1]. Values above 1 are read as
    /// percentages.
    pub fn probability(&self) -> f32 {
        let p = self.risk_probability;
        clamp_probability(if p > 1.0 { p / 100.0 } else { p })
    }

    pub fn risk_reading(&self, at: DateTime<Utc>) -> RiskReading {
        RiskReading {
            probability: self.probability(),
            timestamp: at,
        }
    }
}

#[inline]
fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Anything that can produce the next periodic reading.
pub trait ReadingSource: Send {
    fn next_reading(&mut self, at: DateTime<Utc>) -> EnvironmentalReading;
}

/// Seeded stand-in for the sensor backend.
#[derive(Clone, Debug)]
pub struct Simulator {
    rng: Rng,
}

impl Simulator {
    pub fn new(seed: u64) -> Self {
        Self { rng: Rng::new(seed) }
    }
}

/// Additive rule score over the raw drivers, capped at 1.
pub fn rule_score(
    temperature: f32,
    vibration: f32,
    air_quality: f32,
    rainfall: f32,
    soil_moisture: f32,
    wind_speed: f32,
) -> f32 {
    let mut score: f32 = 0.0;
    if vibration > 7.0 {
        score += 0.3;
    }
    if rainfall > 70.0 {
        score += 0.2;
    }
    if soil_moisture < 20.0 {
        score += 0.2;
    }
    if air_quality > 300.0 {
        score += 0.1;
    }
    if temperature > 35.0 {
        score += 0.1;
    }
    if wind_speed > 20.0 {
        score += 0.1;
    }
    round2(score.min(1.0))
}

impl ReadingSource for Simulator {
    fn next_reading(&mut self, at: DateTime<Utc>) -> EnvironmentalReading {
        let rng = &mut self.rng;
        let temperature = rng.range_f32(15.0, 30.0);
        let humidity = rng.range_f32(40.0, 90.0);
        let vibration = rng.range_f32(0.0, 10.0);
        let air_quality = rng.range_f32(100.0, 500.0);
        let rainfall = rng.range_f32(0.0, 100.0);
        let soil_moisture = rng.range_f32(5.0, 40.0);
        let wind_speed = rng.range_f32(0.0, 20.0);
        let cumulative = rainfall + rng.range_f32(0.0, 50.0);
        let temperature_range = rng.range_f32(5.0, 15.0);
        let pore_pressure = rng.range_f32(0.0, 100.0);

        let m = |kind, value| Parameter::measured(kind, value, at);
        EnvironmentalReading {
            rainfall: m(ParameterKind::Rainfall, rainfall),
            cumulative_rainfall: m(ParameterKind::CumulativeRainfall, cumulative),
            temperature: m(ParameterKind::Temperature, temperature),
            temperature_range: m(ParameterKind::TemperatureRange, temperature_range),
            vibration: m(ParameterKind::Vibration, vibration),
            pore_pressure: m(ParameterKind::PorePressure, pore_pressure),
            humidity: m(ParameterKind::Humidity, humidity),
            risk_probability: rule_score(
                temperature,
                vibration,
                air_quality,
                rainfall,
                soil_moisture,
                wind_speed,
            ),
        }
    }
}
