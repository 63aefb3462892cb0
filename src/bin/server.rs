use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use rockview::api::{self, AppState};
use rockview::config::Params;
use rockview::terrain;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rockview=info,server=info,tower_http=info".into()),
        )
        .init();

    let params = Params::parse();
    let mut state = AppState::new(&params);

    if let Some(path) = &params.terrain_path {
        match terrain::load_file(path) {
            Ok(t) => state = state.with_terrain(t)?,
            Err(e) => warn!(path = %path.display(), error = %e, "initial terrain not loaded"),
        }
    }

    let app = api::router(Arc::new(state), &params);

    info!("rockview server at http://{}", params.bind);
    let listener = tokio::net::TcpListener::bind(params.bind)
        .await
        .with_context(|| format!("binding {}", params.bind))?;
    axum::serve(listener, app).await?;
    Ok(())
}

