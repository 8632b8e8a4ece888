//! SchemaForge API - schema designer backend
//!
//! Serves the project/table/column editing surface, integrity validation and
//! DDL export over HTTP. Project graphs live in memory.

use schemaforge::config::Settings;
use schemaforge::routes::create_router;
use schemaforge::state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting SchemaForge API...");

    let settings = Settings::load()?;
    info!(
        "Configuration loaded (DDL engine {}, charset {})",
        settings.export.engine, settings.export.charset
    );

    let state = Arc::new(AppState::new(&settings));
    let app = create_router(state, &settings);

    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("Server listening on http://{}", addr);
    info!("API Endpoints:");
    info!("   GET    /api/rules                                      - Integrity rule catalog");
    info!("   POST   /api/projects                                   - Create project");
    info!("   PUT    /api/projects/{{id}}/schema                       - Load schema document");
    info!("   PUT    /api/projects/{{id}}/tables/{{table_id}}/columns    - Reconcile columns");
    info!("   GET    /api/projects/{{id}}/validate                     - Validate schema");
    info!("   GET    /api/projects/{{id}}/export                       - Export DDL");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,schemaforge=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
