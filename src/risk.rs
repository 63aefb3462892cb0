//! Risk Aggregator: reduces a risk grid to the overlay panel summary.

use serde::Serialize;

use crate::terrain::RiskGrid;

/// Spatial risk level from the grid mean. Distinct from the per-sample
/// trend categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

impl RiskLevel {
    /// Descending thresholds, first match wins. Everything at or below 0.4 is Low.
    pub fn from_mean(mean: f32) -> RiskLevel {
        if mean > 0.8 {
            RiskLevel::Extreme
        } else if mean > 0.6 {
            RiskLevel::High
        } else if mean > 0.4 {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Extreme => "Extreme",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RiskSummary {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub level: RiskLevel,
}

pub fn summarize(risk: &RiskGrid) -> RiskSummary {
    let values = risk.values();
    let (min, max) = risk.grid().min_max();
    // Accumulate in f64 so large grids do not drift.
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    let mean = (sum / values.len() as f64) as f32;
    RiskSummary {
        min,
        max,
        mean,
        level: RiskLevel::from_mean(mean),
    }
}

/// Summary for an optional overlay; absent stays absent.
pub fn summarize_opt(risk: Option<&RiskGrid>) -> Option<RiskSummary> {
    risk.map(summarize)
}
