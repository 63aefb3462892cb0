//! Trend Tracker: bounded FIFO window of timestamped risk samples feeding the
//! rolling chart.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default window length.
pub const CAPACITY: usize = 24;

/// Chart reference lines (Moderate, High, Very High).
pub const REFERENCE_LINES: [f32; 3] = [0.3, 0.5, 0.7];

/// Category of a single instantaneous probability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendCategory {
    Low,
    Medium,
    High,
}

impl TrendCategory {
    pub fn classify(probability: f32) -> TrendCategory {
        if probability > 0.7 {
            TrendCategory::High
        } else if probability > 0.4 {
            TrendCategory::Medium
        } else {
            TrendCategory::Low
        }
    }
}

/// Colour band of a chart point. Lower bounds are inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartBand {
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl ChartBand {
    pub fn classify(probability: f32) -> ChartBand {
        if probability >= 0.7 {
            ChartBand::VeryHigh
        } else if probability >= 0.5 {
            ChartBand::High
        } else if probability >= 0.3 {
            ChartBand::Moderate
        } else {
            ChartBand::Low
        }
    }

    pub fn legend(self) -> &'static str {
        match self {
            ChartBand::Low => "Low (<30%)",
            ChartBand::Moderate => "Moderate (30%-49%)",
            ChartBand::High => "High (50%-69%)",
            ChartBand::VeryHigh => "Very High (>=70%)",
        }
    }
}

/// A periodic reading before it enters the window.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct RiskReading {
    pub probability: f32,
    pub timestamp: DateTime<Utc>,
}

impl RiskReading {
    pub fn now(probability: f32) -> Self {
        Self {
            probability,
            timestamp: Utc::now(),
        }
    }
}

/// Clamp a probability into [0, 1]; NaN becomes 0.
pub fn clamp_probability(p: f32) -> f32 {
    if p.is_nan() {
        warn!("NaN probability replaced with 0");
        0.0
    } else if !(0.0..=1.0).contains(&p) {
        warn!(probability = p, "probability clamped into [0, 1]");
        p.clamp(0.0, 1.0)
    } else {
        p
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendSample {
    timestamp: DateTime<Utc>,
    probability: f32,
    category: TrendCategory,
    band: ChartBand,
}

impl TrendSample {
    pub fn new(reading: RiskReading) -> Self {
        let probability = clamp_probability(reading.probability);
        Self {
            timestamp: reading.timestamp,
            probability,
            category: TrendCategory::classify(probability),
            band: ChartBand::classify(probability),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn probability(&self) -> f32 {
        self.probability
    }

    pub fn category(&self) -> TrendCategory {
        self.category
    }

    pub fn band(&self) -> ChartBand {
        self.band
    }

    /// Axis label, `HH:MM`.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M").to_string()
    }
}

/// Insertion-ordered, oldest evicted first, never longer than its capacity.
#[derive(Clone, Debug, Serialize)]
pub struct TrendWindow {
    samples: VecDeque<TrendSample>,
    capacity: usize,
}

impl Default for TrendWindow {
    fn default() -> Self {
        Self::with_capacity(CAPACITY)
    }
}

impl TrendWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Push to the back, then evict from the front down to capacity.
    pub fn append(&mut self, reading: RiskReading) -> &TrendWindow {
        self.samples.push_back(TrendSample::new(reading));
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrendSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&TrendSample> {
        self.samples.back()
    }

    pub fn to_vec(&self) -> Vec<TrendSample> {
        self.samples.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_still_holds_latest() {
        let mut w = TrendWindow::with_capacity(0);
        w.append(RiskReading::now(0.1));
        w.append(RiskReading::now(0.2));
        assert_eq!(w.len(), 1);
        assert_eq!(w.latest().map(|s| s.probability()), Some(0.2));
    }
}
