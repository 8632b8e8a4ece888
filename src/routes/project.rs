//! Project route handlers
//!
//! Project lifecycle plus whole-schema load and read-back.

use crate::error::{validation_error, ApiResult};
use crate::models::{CreateProjectRequest, ProjectDetail, ProjectListResponse, SuccessResponse};
use crate::schema::{ProjectId, ProjectSummary, SchemaDocument};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};
use validator::Validate;

/// Create a new, empty project
pub async fn create_project(
    State(state): State<SharedState>,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<ProjectSummary>>)> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let project = state.store.create_project(payload.name, payload.description).await;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Project created successfully.", project)),
    ))
}

/// Create a project from a snapshot document
pub async fn import_project(
    State(state): State<SharedState>,
    Json(document): Json<SchemaDocument>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<ProjectSummary>>)> {
    debug!("Importing project '{}' with {} tables", document.name, document.tables.len());

    let project = state.store.import_project(document).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Project imported successfully.", project)),
    ))
}

/// List all projects
pub async fn list_projects(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<ProjectListResponse>>> {
    let projects = state.store.list_projects().await;

    Ok(Json(SuccessResponse::with_data(
        "Projects fetched successfully.",
        ProjectListResponse { projects },
    )))
}

/// Get a project with its tables and relationships
pub async fn get_project(
    State(state): State<SharedState>,
    Path(project_id): Path<ProjectId>,
) -> ApiResult<Json<SuccessResponse<ProjectDetail>>> {
    let detail = state.store.read(project_id, |schema| ProjectDetail::from(schema)).await?;

    Ok(Json(SuccessResponse::with_data("Project fetched successfully.", detail)))
}

pub async fn delete_project(
    State(state): State<SharedState>,
    Path(project_id): Path<ProjectId>,
) -> ApiResult<Json<SuccessResponse<()>>> {
    state.store.delete_project(project_id).await?;

    Ok(Json(SuccessResponse::message_only(format!(
        "Project {} deleted successfully.",
        project_id
    ))))
}

/// Replace the whole schema of a project with a snapshot document
pub async fn put_schema(
    State(state): State<SharedState>,
    Path(project_id): Path<ProjectId>,
    Json(document): Json<SchemaDocument>,
) -> ApiResult<Json<SuccessResponse<ProjectSummary>>> {
    let summary = state.store.load_document(project_id, document).await?;

    info!("Schema of project {} replaced", project_id);

    Ok(Json(SuccessResponse::with_data("Schema loaded successfully.", summary)))
}

/// Read the whole schema back as a snapshot document
pub async fn get_schema(
    State(state): State<SharedState>,
    Path(project_id): Path<ProjectId>,
) -> ApiResult<Json<SuccessResponse<SchemaDocument>>> {
    let document = state.store.document(project_id).await?;

    Ok(Json(SuccessResponse::with_data("Schema fetched successfully.", document)))
}
