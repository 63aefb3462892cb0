//! Grid Model: validates a raw DEM payload into a square elevation grid and an
//! optional risk grid aligned with it.
//!
//! Elevation problems are fatal. Risk problems only degrade the result to an
//! elevation-only terrain, recorded in [`Terrain::degraded`].

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{LoadError, Result};
use crate::grid::Grid;

/// Smallest side length that still spans at least one quad.
pub const MIN_SIZE: usize = 2;

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

/// Square, finite elevation grid. Each constructed grid gets a fresh version
/// number; clones share it because they share content.
#[derive(Clone, Debug)]
pub struct ElevationGrid {
    grid: Grid<f32>,
    version: u64,
}

impl ElevationGrid {
    /// Build from a flat row-major buffer of side `n`.
    pub fn new(n: usize, values: Vec<f32>) -> Result<Self> {
        if n < MIN_SIZE {
            return Err(LoadError::malformed(format!(
                "side length {n} is below the minimum of {MIN_SIZE}"
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(LoadError::malformed(format!(
                "non-finite elevation at cell ({}, {})",
                i % n,
                i / n
            )));
        }
        let grid = Grid::from_vec(n, n, values).ok_or_else(|| {
            LoadError::malformed(format!("expected {} values for side {n}", n * n))
        })?;
        Ok(Self {
            grid,
            version: NEXT_VERSION.fetch_add(1, Ordering::Relaxed),
        })
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.grid.w
    }

    /// Identity used for mesh cache invalidation.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.grid.get(x, y)
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.grid.data
    }

    pub fn grid(&self) -> &Grid<f32> {
        &self.grid
    }
}

/// Per-cell rockfall probability, same side length as its elevation grid,
/// every value within [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct RiskGrid {
    grid: Grid<f32>,
}

impl RiskGrid {
    /// Build from a flat buffer, clamping out-of-range values into [0, 1].
    /// Returns the grid and how many values were clamped, or None when `n`
    /// is below [`MIN_SIZE`], the buffer length is wrong or a value is NaN.
    pub fn new(n: usize, mut values: Vec<f32>) -> Option<(Self, usize)> {
        if n < MIN_SIZE || values.iter().any(|v| v.is_nan()) {
            return None;
        }
        let mut clamped = 0;
        for v in values.iter_mut() {
            if !(0.0..=1.0).contains(v) {
                *v = v.clamp(0.0, 1.0);
                clamped += 1;
            }
        }
        let grid = Grid::from_vec(n, n, values)?;
        Some((Self { grid }, clamped))
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.grid.w
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.grid.get(x, y)
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.grid.data
    }

    pub fn grid(&self) -> &Grid<f32> {
        &self.grid
    }
}

/// Why the risk overlay is missing or was altered. Never fatal.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DegradedInput {
    MissingRisk,
    MalformedRisk { reason: String },
    MismatchedRisk { expected: usize, rows: usize },
    ClampedRisk { cells: usize },
}

#[derive(Clone, Debug)]
pub struct Terrain {
    pub elevation: ElevationGrid,
    pub risk: Option<RiskGrid>,
    pub degraded: Option<DegradedInput>,
}

impl Terrain {
    #[inline]
    pub fn size(&self) -> usize {
        self.elevation.size()
    }
}

/// Raw JSON body: `{"dem": [[..], ..], "risk": [[..], ..]}`.
/// Fields are kept untyped so shape errors become validation results
/// instead of opaque decode failures.
#[derive(Debug, Default, Deserialize)]
pub struct TerrainPayload {
    #[serde(default)]
    pub dem: Option<Value>,
    #[serde(default)]
    pub risk: Option<Value>,
}

/// Load from nested rows. `dem` must be square; a `risk` grid with any other
/// shape is dropped.
pub fn load(dem: &[Vec<f32>], risk: Option<&[Vec<f32>]>) -> Result<Terrain> {
    match risk {
        None => assemble(dem, RiskSource::Absent),
        Some(rows) => assemble(dem, RiskSource::Rows(rows)),
    }
}

/// Load from a decoded payload. A missing or non-array `dem` is a validation
/// failure; a missing or malformed `risk` only degrades.
pub fn load_payload(payload: &TerrainPayload) -> Result<Terrain> {
    let dem = match &payload.dem {
        None | Some(Value::Null) => return Err(LoadError::malformed("missing `dem` field")),
        Some(v) => numeric_rows(v).map_err(LoadError::malformed)?,
    };

    match &payload.risk {
        None | Some(Value::Null) => assemble(&dem, RiskSource::Absent),
        Some(v) => match numeric_rows(v) {
            Ok(rows) => assemble(&dem, RiskSource::Rows(&rows)),
            Err(reason) => assemble(&dem, RiskSource::Malformed(reason)),
        },
    }
}

enum RiskSource<'a> {
    Absent,
    Rows(&'a [Vec<f32>]),
    Malformed(String),
}

fn assemble(dem: &[Vec<f32>], risk: RiskSource<'_>) -> Result<Terrain> {
    let n = square_side(dem).map_err(LoadError::malformed)?;
    let elevation = ElevationGrid::new(n, dem.concat())?;

    let (risk, degraded) = match risk {
        RiskSource::Absent => (None, Some(DegradedInput::MissingRisk)),
        RiskSource::Rows(rows) => align_risk(n, rows),
        RiskSource::Malformed(reason) => (None, Some(DegradedInput::MalformedRisk { reason })),
    };

    if let Some(d) = &degraded {
        warn!(?d, "risk overlay degraded");
    }
    info!(
        size = n,
        version = elevation.version(),
        has_risk = risk.is_some(),
        "terrain loaded"
    );

    Ok(Terrain {
        elevation,
        risk,
        degraded,
    })
}

pub fn load_json(src: &str) -> Result<Terrain> {
    let payload: TerrainPayload = serde_json::from_str(src)?;
    load_payload(&payload)
}

pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Terrain> {
    let src = std::fs::read_to_string(path)?;
    load_json(&src)
}

fn square_side(rows: &[Vec<f32>]) -> std::result::Result<usize, String> {
    let n = rows.len();
    if n < MIN_SIZE {
        return Err(format!("grid has {n} rows, need at least {MIN_SIZE}"));
    }
    match rows.iter().position(|r| r.len() != n) {
        Some(y) => Err(format!(
            "row {y} has {} values, expected {n}",
            rows[y].len()
        )),
        None => Ok(n),
    }
}

fn align_risk(n: usize, rows: &[Vec<f32>]) -> (Option<RiskGrid>, Option<DegradedInput>) {
    let aligned = rows.len() == n && rows.iter().all(|r| r.len() == n);
    if !aligned {
        return (
            None,
            Some(DegradedInput::MismatchedRisk {
                expected: n,
                rows: rows.len(),
            }),
        );
    }
    match RiskGrid::new(n, rows.concat()) {
        None => (
            None,
            Some(DegradedInput::MalformedRisk {
                reason: "risk grid contains NaN".into(),
            }),
        ),
        Some((grid, 0)) => (Some(grid), None),
        Some((grid, cells)) => (Some(grid), Some(DegradedInput::ClampedRisk { cells })),
    }
}

fn numeric_rows(value: &Value) -> std::result::Result<Vec<Vec<f32>>, String> {
    let outer = value
        .as_array()
        .ok_or_else(|| "expected an array of rows".to_string())?;
    outer
        .iter()
        .enumerate()
        .map(|(y, row)| {
            let row = row
                .as_array()
                .ok_or_else(|| format!("row {y} is not an array"))?;
            row.iter()
                .enumerate()
                .map(|(x, cell)| {
                    cell.as_f64()
                        .map(|v| v as f32)
                        .ok_or_else(|| format!("cell ({x}, {y}) is not a number"))
                })
                .collect()
        })
        .collect()
}
