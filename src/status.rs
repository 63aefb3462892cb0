//! Status card for the most recent reading.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::trend::clamp_probability;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    Default,
    Secondary,
    Destructive,
}

impl Badge {
    pub fn for_probability(p: f32) -> Badge {
        if p >= 0.7 {
            Badge::Destructive
        } else if p >= 0.5 {
            Badge::Secondary
        } else {
            Badge::Default
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusCard {
    pub probability: f32,
    pub label: &'static str,
    pub badge: Badge,
    pub percent: String,
    pub timestamp: Option<DateTime<Utc>>,
}

pub fn status_label(p: f32) -> &'static str {
    if p > 0.7 {
        "Very High Risk"
    } else if p > 0.4 {
        "Moderate Risk"
    } else {
        "Low Risk"
    }
}

impl StatusCard {
    pub fn from_reading(probability: f32, timestamp: DateTime<Utc>) -> Self {
        let p = clamp_probability(probability);
        Self {
            probability: p,
            label: status_label(p),
            badge: Badge::for_probability(p),
            percent: format!("{:.1}%", p * 100.0),
            timestamp: Some(timestamp),
        }
    }

    /// Placeholder shown before the first reading arrives.
    pub fn unknown() -> Self {
        Self {
            probability: 0.0,
            label: "Unknown",
            badge: Badge::Default,
            percent: "0.0%".into(),
            timestamp: None,
        }
    }
}
