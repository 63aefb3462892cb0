pub mod api;
pub mod config;
pub mod error;
pub mod grid;
pub mod mesh;
pub mod monitor;
pub mod pick;
pub mod render;
pub mod risk;
pub mod rng;
pub mod sensor;
pub mod status;
pub mod terrain;
pub mod trend;

use std::sync::Arc;
use std::time::Instant;

use mesh::{Mesh, MeshCache};
use pick::{PickEvent, PickResult, Popup, PopupState};
use risk::RiskSummary;
use terrain::Terrain;

/// Everything derived from one terrain for offline output.
pub struct Report {
    pub size: usize,
    pub mesh: Mesh,
    pub summary: Option<RiskSummary>,
    pub elevation_rgba: Vec<u8>,
    pub risk_rgba: Option<Vec<u8>>,
}

pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

pub fn process(terrain: &Terrain) -> (Report, Vec<Timing>) {
    let mut timings = Vec::new();
    let total_start = Instant::now();

    // 1. Geometry
    let t = Instant::now();
    let mesh = mesh::build_mesh(&terrain.elevation);
    timings.push(Timing {
        name: "mesh",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 2. Risk overlay summary
    let t = Instant::now();
    let summary = risk::summarize_opt(terrain.risk.as_ref());
    timings.push(Timing {
        name: "summary",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    // 3. Previews
    let t = Instant::now();
    let elevation_rgba = render::render_elevation(terrain.elevation.grid());
    let risk_rgba = terrain.risk.as_ref().map(|r| render::render_risk(r.grid()));
    timings.push(Timing {
        name: "render",
        ms: t.elapsed().as_secs_f64() * 1000.0,
    });

    timings.push(Timing {
        name: "TOTAL",
        ms: total_start.elapsed().as_secs_f64() * 1000.0,
    });

    let report = Report {
        size: terrain.size(),
        mesh,
        summary,
        elevation_rgba,
        risk_rgba,
    };

    (report, timings)
}

/// Interactive view state for one operator: current terrain, its cached mesh
/// and the open popup. All calls are synchronous.
#[derive(Default)]
pub struct Session {
    terrain: Option<Terrain>,
    meshes: MeshCache,
    popup: PopupState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the terrain. Any open popup refers to the old grid and is closed.
    pub fn load(&mut self, terrain: Terrain) -> &Terrain {
        self.popup.dismiss();
        self.terrain.insert(terrain)
    }

    pub fn terrain(&self) -> Option<&Terrain> {
        self.terrain.as_ref()
    }

    /// Mesh for the current terrain, rebuilt only when the grid changed.
    pub fn mesh(&mut self) -> Option<Arc<Mesh>> {
        let terrain = self.terrain.as_ref()?;
        Some(self.meshes.get_or_build(&terrain.elevation))
    }

    pub fn mesh_builds(&self) -> u64 {
        self.meshes.builds()
    }

    pub fn summary(&self) -> Option<RiskSummary> {
        self.terrain
            .as_ref()
            .and_then(|t| risk::summarize_opt(t.risk.as_ref()))
    }

    /// Resolve a pointer hit and update the popup. None when no terrain is loaded.
    pub fn pick(&mut self, event: &PickEvent) -> Option<PickResult> {
        let terrain = self.terrain.as_ref()?;
        let result = pick::resolve_event(event, &terrain.elevation, terrain.risk.as_ref());
        self.popup.interact(result);
        Some(result)
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.current()
    }

    pub fn dismiss(&mut self) {
        self.popup.dismiss();
    }
}
