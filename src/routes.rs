//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod export;
mod project;
mod relationship;
mod table;

use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    let cors = build_cors_layer(settings);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    Router::new()
        .route("/health", get(health_check))
        .route("/api/rules", get(export::list_rules))

        // Projects
        .route("/api/projects", post(project::create_project).get(project::list_projects))
        .route("/api/projects/import", post(project::import_project))
        .route(
            "/api/projects/{id}",
            get(project::get_project).delete(project::delete_project),
        )
        .route(
            "/api/projects/{id}/schema",
            put(project::put_schema).get(project::get_schema),
        )

        // Tables, columns and indexes
        .route("/api/projects/{id}/tables", post(table::create_table))
        .route(
            "/api/projects/{id}/tables/{table_id}",
            axum::routing::patch(table::update_table).delete(table::delete_table),
        )
        .route(
            "/api/projects/{id}/tables/{table_id}/columns",
            get(table::get_columns).put(table::reconcile_columns),
        )
        .route(
            "/api/projects/{id}/tables/{table_id}/indexes",
            get(table::list_indexes).post(table::create_index),
        )
        .route(
            "/api/projects/{id}/tables/{table_id}/indexes/{index_id}",
            put(table::update_index).delete(table::delete_index),
        )

        // Relationships
        .route(
            "/api/projects/{id}/relationships",
            post(relationship::create_relationship),
        )
        .route(
            "/api/projects/{id}/relationships/{rel_id}",
            axum::routing::delete(relationship::delete_relationship),
        )

        // Validation and export
        .route("/api/projects/{id}/validate", get(export::validate_project))
        .route("/api/projects/{id}/export", get(export::export_project))

        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    }
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
