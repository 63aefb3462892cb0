//! HTTP surface for the dashboard frontend.

use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::error;

use crate::Session;
use crate::config::Params;
use crate::error::LoadError;
use crate::mesh::Mesh;
use crate::monitor::{Monitor, TrendSnapshot};
use crate::pick::{PickEvent, PickResult, Popup, Tone};
use crate::render;
use crate::risk::RiskSummary;
use crate::sensor::{Simulator, TableRow};
use crate::status::StatusCard;
use crate::terrain::{self, DegradedInput, Terrain, TerrainPayload};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("no terrain loaded")]
    NoTerrain,

    #[error("render error: {0}")]
    Render(#[from] image::ImageError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Load(e) if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NoTerrain => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Shared server state. The session is plain single-owner state; the mutex
/// only serialises concurrent HTTP requests onto it.
pub struct AppState {
    session: Mutex<Session>,
    monitor: Monitor,
}

impl AppState {
    /// Must be called inside a tokio runtime (starts the trend monitor).
    pub fn new(params: &Params) -> Self {
        let monitor = Monitor::spawn(
            Simulator::new(params.sensor_seed),
            params.poll_interval(),
            params.trend_capacity,
        );
        Self {
            session: Mutex::new(Session::new()),
            monitor,
        }
    }

    pub fn with_terrain(self, terrain: Terrain) -> Result<Self> {
        self.session()?.load(terrain);
        Ok(self)
    }

    fn session(&self) -> Result<MutexGuard<'_, Session>> {
        self.session
            .lock()
            .map_err(|_| ApiError::Internal("session lock poisoned".into()))
    }

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }
}

#[derive(Serialize)]
struct Layer {
    name: String,
    data_url: String,
}

#[derive(Serialize)]
struct SummaryView {
    #[serde(flatten)]
    summary: RiskSummary,
    tone: Tone,
}

impl From<RiskSummary> for SummaryView {
    fn from(summary: RiskSummary) -> Self {
        Self {
            tone: Tone::for_level(summary.level),
            summary,
        }
    }
}

#[derive(Serialize)]
struct TerrainInfo {
    size: usize,
    version: u64,
    degraded: Option<DegradedInput>,
    summary: Option<SummaryView>,
    mesh_builds: u64,
}

#[derive(Serialize)]
struct LoadResponse {
    #[serde(flatten)]
    info: TerrainInfo,
    mesh: Arc<Mesh>,
    layers: Vec<Layer>,
}

#[derive(Serialize)]
struct PickResponse {
    pick: PickResult,
    popup: Option<Popup>,
}

#[derive(Serialize)]
struct StatusResponse {
    status: StatusCard,
    parameters: Vec<TableRow>,
}

fn terrain_info(session: &Session) -> Result<TerrainInfo> {
    let terrain = session.terrain().ok_or(ApiError::NoTerrain)?;
    Ok(TerrainInfo {
        size: terrain.size(),
        version: terrain.elevation.version(),
        degraded: terrain.degraded.clone(),
        summary: session.summary().map(SummaryView::from),
        mesh_builds: session.mesh_builds(),
    })
}

fn layers(terrain: &Terrain) -> Result<Vec<Layer>> {
    let n = terrain.size();
    let mut out = vec![Layer {
        name: "elevation".into(),
        data_url: render::png_data_url(
            &render::render_elevation(terrain.elevation.grid()),
            n,
            n,
        )?,
    }];
    if let Some(risk) = &terrain.risk {
        out.push(Layer {
            name: "risk".into(),
            data_url: render::png_data_url(&render::render_risk(risk.grid()), n, n)?,
        });
    }
    Ok(out)
}

async fn load_terrain(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TerrainPayload>,
) -> Result<Json<LoadResponse>> {
    let response = tokio::task::spawn_blocking(move || -> Result<LoadResponse> {
        let terrain = terrain::load_payload(&payload)?;
        let layers = layers(&terrain)?;
        let mut session = state.session()?;
        session.load(terrain);
        let mesh = session.mesh().ok_or(ApiError::NoTerrain)?;
        Ok(LoadResponse {
            info: terrain_info(&session)?,
            mesh,
            layers,
        })
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(response))
}

async fn get_terrain(State(state): State<Arc<AppState>>) -> Result<Json<TerrainInfo>> {
    let session = state.session()?;
    Ok(Json(terrain_info(&session)?))
}

async fn get_mesh(State(state): State<Arc<AppState>>) -> Result<Json<Arc<Mesh>>> {
    let mut session = state.session()?;
    let mesh = session.mesh().ok_or(ApiError::NoTerrain)?;
    Ok(Json(mesh))
}

async fn pick(
    State(state): State<Arc<AppState>>,
    Json(event): Json<PickEvent>,
) -> Result<Json<PickResponse>> {
    let mut session = state.session()?;
    let pick = session.pick(&event).ok_or(ApiError::NoTerrain)?;
    Ok(Json(PickResponse {
        pick,
        popup: session.popup().copied(),
    }))
}

async fn dismiss(State(state): State<Arc<AppState>>) -> Result<StatusCode> {
    state.session()?.dismiss();
    Ok(StatusCode::NO_CONTENT)
}

async fn trend(State(state): State<Arc<AppState>>) -> Json<Arc<TrendSnapshot>> {
    Json(state.monitor.snapshot())
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snapshot = state.monitor.snapshot();
    Json(StatusResponse {
        status: snapshot.status.clone(),
        parameters: snapshot
            .environment
            .as_ref()
            .map(|e| e.rows())
            .unwrap_or_default(),
    })
}

/// API routes only, without static files or middleware.
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/terrain", post(load_terrain).get(get_terrain))
        .route("/api/mesh", get(get_mesh))
        .route("/api/pick", post(pick).delete(dismiss))
        .route("/api/trend", get(trend))
        .route("/api/status", get(status))
        .with_state(state)
}

pub fn router(state: Arc<AppState>, params: &Params) -> Router {
    routes(state)
        .fallback_service(ServeDir::new(&params.frontend_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
