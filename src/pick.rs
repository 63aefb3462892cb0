//! Picking Resolver: maps a surface hit back to its source grid cell.

use serde::{Deserialize, Serialize};

use crate::risk::RiskLevel;
use crate::terrain::{ElevationGrid, RiskGrid};

/// Pointer hit reported by the renderer. `u` runs left to right; `v` runs
/// bottom to top, so the row index comes from `1 - v`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct PickEvent {
    pub u: f32,
    pub v: f32,
    #[serde(rename = "worldPoint")]
    pub world_point: [f32; 3],
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PickResult {
    #[serde(rename = "cellX")]
    pub cell_x: usize,
    #[serde(rename = "cellY")]
    pub cell_y: usize,
    #[serde(rename = "worldPoint")]
    pub world_point: [f32; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<f32>,
}

/// Cell index along one axis: `floor(t * (n - 1))` clamped into `[0, n - 1]`.
/// NaN lands on 0.
#[inline]
fn cell_index(t: f32, n: usize) -> usize {
    let last = n - 1;
    let raw = (t * last as f32).floor();
    if raw.is_nan() || raw <= 0.0 {
        0
    } else {
        (raw as usize).min(last)
    }
}

pub fn resolve_pick(
    u: f32,
    v: f32,
    world_point: [f32; 3],
    grid: &ElevationGrid,
    risk: Option<&RiskGrid>,
) -> PickResult {
    let n = grid.size();
    let cell_x = cell_index(u, n);
    let cell_y = cell_index(1.0 - v, n);
    PickResult {
        cell_x,
        cell_y,
        world_point,
        // An overlay of another size has no cell here.
        risk: risk
            .filter(|r| r.size() == n)
            .map(|r| r.get(cell_x, cell_y)),
    }
}

pub fn resolve_event(event: &PickEvent, grid: &ElevationGrid, risk: Option<&RiskGrid>) -> PickResult {
    resolve_pick(event.u, event.v, event.world_point, grid, risk)
}

/// Popup border colour for a single cell's risk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Green,
    Yellow,
    Red,
}

impl Tone {
    pub fn for_risk(risk: f32) -> Tone {
        if risk > 0.8 {
            Tone::Red
        } else if risk > 0.6 {
            Tone::Yellow
        } else {
            Tone::Green
        }
    }

    /// Overlay panel colour for an aggregate level.
    pub fn for_level(level: RiskLevel) -> Tone {
        match level {
            RiskLevel::Extreme => Tone::Red,
            RiskLevel::High => Tone::Yellow,
            RiskLevel::Moderate | RiskLevel::Low => Tone::Green,
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            Tone::Green => "#22bb22",
            Tone::Yellow => "#ffee00",
            Tone::Red => "#ff2222",
        }
    }
}

/// Popup content for a pick that carries a risk value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Popup {
    pub pick: PickResult,
    pub risk: f32,
    pub tone: Tone,
}

impl Popup {
    pub fn title(&self) -> String {
        format!("Risk at ({}, {})", self.pick.cell_x, self.pick.cell_y)
    }

    pub fn value_text(&self) -> String {
        format!("{:.2}", self.risk)
    }
}

/// At most one open popup. A new interaction replaces it; dismissal clears it.
#[derive(Clone, Debug, Default)]
pub struct PopupState {
    open: Option<Popup>,
}

impl PopupState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a pick. Without a risk value the popup is closed rather than
    /// shown with a made-up number.
    pub fn interact(&mut self, pick: PickResult) -> Option<&Popup> {
        self.open = pick.risk.map(|risk| Popup {
            pick,
            risk,
            tone: Tone::for_risk(risk),
        });
        self.open.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.open = None;
    }

    pub fn current(&self) -> Option<&Popup> {
        self.open.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_index_clamps() {
        assert_eq!(cell_index(1.0, 4), 3);
        assert_eq!(cell_index(1.5, 4), 3);
        assert_eq!(cell_index(-0.2, 4), 0);
        assert_eq!(cell_index(f32::NAN, 4), 0);
        assert_eq!(cell_index(0.5, 5), 2);
    }
}
