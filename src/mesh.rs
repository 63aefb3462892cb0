//! Mesh Builder: turns an elevation grid into a displaced, colour-banded
//! surface plus a matching grid-line wireframe.
//!
//! The lattice follows a plane geometry laid flat on XZ: vertex `(ix, iy)`
//! sits at `x = ix * seg - 250`, `z = iy * seg - 250`, with
//! `seg = 500 / (N - 1)`, and is lifted to `y = elevation * 50`.
//! Returned geometry is immutable; a new grid means a new mesh.

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::terrain::ElevationGrid;

/// Side of the square world extent, independent of grid resolution.
pub const WORLD_SIZE: f32 = 500.0;
/// World units per elevation unit.
pub const ELEVATION_SCALE: f32 = 50.0;

// Lower bounds (inclusive) of the normalized-elevation bands.
pub const BAND_MID: f32 = 0.33;
pub const BAND_HIGH: f32 = 0.66;
pub const BAND_PEAK: f32 = 0.90;

const BLUE: [u8; 3] = [0x1e, 0x90, 0xff];
const GREEN: [u8; 3] = [0x22, 0xbb, 0x22];
const YELLOW: [u8; 3] = [0xff, 0xee, 0x00];
const RED: [u8; 3] = [0xff, 0x22, 0x22];

/// Elevation colour band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    Low,
    Mid,
    High,
    Peak,
}

/// Band used for every vertex of a flat grid, where `t` is undefined.
pub const FLAT_BAND: Band = Band::Mid;

impl Band {
    /// Classify a normalized elevation `t`. Lower bounds are inclusive.
    #[inline]
    pub fn classify(t: f32) -> Band {
        if t < BAND_MID {
            Band::Low
        } else if t < BAND_HIGH {
            Band::Mid
        } else if t < BAND_PEAK {
            Band::High
        } else {
            Band::Peak
        }
    }

    /// Band for an elevation given the grid's global range.
    #[inline]
    pub fn for_elevation(elev: f32, min: f32, max: f32) -> Band {
        match normalized(elev, min, max) {
            Some(t) => Band::classify(t),
            None => FLAT_BAND,
        }
    }

    pub fn rgb8(self) -> [u8; 3] {
        match self {
            Band::Low => BLUE,
            Band::Mid => GREEN,
            Band::High => YELLOW,
            Band::Peak => RED,
        }
    }

    /// Colour with channels in [0, 1].
    pub fn rgb(self) -> [f32; 3] {
        let [r, g, b] = self.rgb8();
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    }
}

/// `(elev - min) / (max - min)`, or None for a flat range.
#[inline]
pub fn normalized(elev: f32, min: f32, max: f32) -> Option<f32> {
    let range = max - min;
    if range > 0.0 {
        Some((elev - min) / range)
    } else {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Wireframe vertex: position only.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WireVertex {
    pub position: [f32; 3],
}

#[derive(Clone, Debug, Serialize)]
pub struct Surface {
    vertices: Vec<MeshVertex>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    indices: Vec<u32>,
}

impl Surface {
    pub fn vertices(&self) -> &[MeshVertex] {
        &self.vertices
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn uvs(&self) -> &[[f32; 2]] {
        &self.uvs
    }

    /// Triangle list, two triangles per quad.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Wireframe {
    vertices: Vec<WireVertex>,
    edges: Vec<[u32; 2]>,
}

impl Wireframe {
    pub fn vertices(&self) -> &[WireVertex] {
        &self.vertices
    }

    /// Grid-line segments along rows and columns.
    pub fn edges(&self) -> &[[u32; 2]] {
        &self.edges
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Mesh {
    size: usize,
    version: u64,
    surface: Surface,
    wireframe: Wireframe,
}

impl Mesh {
    pub fn size(&self) -> usize {
        self.size
    }

    /// Version of the elevation grid this mesh was built from.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn wireframe(&self) -> &Wireframe {
        &self.wireframe
    }
}

/// World-space position of lattice vertex `(ix, iy)` at elevation `elev`.
#[inline]
pub fn lattice_position(ix: usize, iy: usize, n: usize, elev: f32) -> [f32; 3] {
    let seg = WORLD_SIZE / (n - 1) as f32;
    let half = WORLD_SIZE / 2.0;
    [
        ix as f32 * seg - half,
        elev * ELEVATION_SCALE,
        iy as f32 * seg - half,
    ]
}

/// Build the surface and wireframe for `grid`. O(N²).
pub fn build_mesh(grid: &ElevationGrid) -> Mesh {
    let n = grid.size();
    let (min, max) = grid.grid().min_max();
    let values = grid.values();

    let positions: Vec<[f32; 3]> = values
        .par_iter()
        .enumerate()
        .map(|(i, &elev)| lattice_position(i % n, i / n, n, elev))
        .collect();

    let vertices: Vec<MeshVertex> = positions
        .par_iter()
        .zip(values.par_iter())
        .map(|(&position, &elev)| MeshVertex {
            position,
            color: Band::for_elevation(elev, min, max).rgb(),
        })
        .collect();

    let last = (n - 1) as f32;
    let uvs: Vec<[f32; 2]> = (0..n * n)
        .map(|i| [(i % n) as f32 / last, 1.0 - (i / n) as f32 / last])
        .collect();

    let indices = triangle_indices(n);
    let normals = vertex_normals(&positions, &indices);

    let wireframe = Wireframe {
        vertices: positions
            .iter()
            .map(|&position| WireVertex { position })
            .collect(),
        edges: grid_edges(n),
    };

    info!(size = n, version = grid.version(), "mesh built");

    Mesh {
        size: n,
        version: grid.version(),
        surface: Surface {
            vertices,
            normals,
            uvs,
            indices,
        },
        wireframe,
    }
}

fn triangle_indices(n: usize) -> Vec<u32> {
    let mut out = Vec::with_capacity((n - 1) * (n - 1) * 6);
    for iy in 0..n - 1 {
        for ix in 0..n - 1 {
            let a = (ix + n * iy) as u32;
            let b = (ix + n * (iy + 1)) as u32;
            let c = (ix + 1 + n * (iy + 1)) as u32;
            let d = (ix + 1 + n * iy) as u32;
            out.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    out
}

fn grid_edges(n: usize) -> Vec<[u32; 2]> {
    let mut out = Vec::with_capacity(2 * n * (n - 1));
    for iy in 0..n {
        for ix in 0..n {
            let i = (iy * n + ix) as u32;
            if ix + 1 < n {
                out.push([i, i + 1]);
            }
            if iy + 1 < n {
                out.push([i, i + n as u32]);
            }
        }
    }
    out
}

#[inline]
fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Area-weighted normals from the displaced positions.
fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![[0.0f32; 3]; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let cb = sub(positions[c], positions[b]);
        let ab = sub(positions[a], positions[b]);
        let face = cross(cb, ab);
        for &v in &[a, b, c] {
            acc[v][0] += face[0];
            acc[v][1] += face[1];
            acc[v][2] += face[2];
        }
    }
    acc.into_iter()
        .map(|[x, y, z]| {
            let len = (x * x + y * y + z * z).sqrt();
            if len > 0.0 {
                [x / len, y / len, z / len]
            } else {
                [0.0, 1.0, 0.0]
            }
        })
        .collect()
}

/// Holds the mesh for the most recent grid version. Asking again for the
/// same version returns the shared mesh without rebuilding.
#[derive(Debug, Default)]
pub struct MeshCache {
    current: Option<Arc<Mesh>>,
    builds: u64,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_build(&mut self, grid: &ElevationGrid) -> Arc<Mesh> {
        if let Some(mesh) = &self.current {
            if mesh.version == grid.version() {
                debug!(version = mesh.version, "mesh cache hit");
                return Arc::clone(mesh);
            }
        }
        let mesh = Arc::new(build_mesh(grid));
        self.builds += 1;
        self.current = Some(Arc::clone(&mesh));
        mesh
    }

    /// Number of builds performed so far.
    pub fn builds(&self) -> u64 {
        self.builds
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }
}
