//! PDFExtract Server
//!
//! A small backend service that extracts text from uploaded PDFs with
//! Gemini Vision and keeps the extraction history in SQLite.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdfextract_server::config::{mask_key, Settings};
use pdfextract_server::db;
use pdfextract_server::routes;
use pdfextract_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdfextract_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let settings = Settings::from_env();

    tracing::info!("Starting {} v{}", settings.project_name, env!("CARGO_PKG_VERSION"));
    if settings.gemini_api_key.is_empty() {
        tracing::warn!("GEMINI_API_KEY is missing or empty; uploads will fail until a key is set");
    } else {
        tracing::info!("GEMINI_API_KEY found: {}", mask_key(&settings.gemini_api_key));
    }

    // Initialize database
    let db_pool = db::create_pool(&settings.database_url).await?;
    tracing::info!("Database initialized at {}", settings.database_url);

    let port = settings.server_port;
    let api_prefix = settings.api_v1_prefix.clone();
    let app_state = AppState::new(settings, db_pool, PathBuf::from(".env"));

    let app = routes::app(app_state, &api_prefix);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("PDFExtract Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}
