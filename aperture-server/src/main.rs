//! Aperture Server - REST API for image-annotation matching
//!
//! Exposes aperture-core functionality via HTTP endpoints:
//! - POST /match - Match a query frame, optionally ingesting a new annotation
//! - GET  /frame - Latest match-overlay frame as JPEG
//! - GET/POST /admin/gps-filter - Read or toggle GPS proximity filtering
//! - GET  /health - Health check

use aperture_server::{create_router, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("aperture_server=info,aperture_core=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!(
        data_dir = %config.data_dir.display(),
        gps_filter = config.gps_filter_enabled,
        "starting aperture-server"
    );

    let state = match AppState::build(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize application state");
            std::process::exit(1);
        }
    };

    let app = create_router(state, &config);

    let addr = config.socket_addr();
    tracing::info!(%addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
