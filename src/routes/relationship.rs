//! Relationship route handlers

use crate::error::{validation_error, ApiResult, AppError};
use crate::models::{RelationshipCreatedResponse, SuccessResponse};
use crate::schema::{ProjectId, Relationship, RelationshipDraft, RelationshipId};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

/// Create a relationship between two tables.
///
/// Type and uniqueness problems are not rejected here; they show up in
/// validation and as disabled constraints in the export.
pub async fn create_relationship(
    State(state): State<SharedState>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<RelationshipDraft>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<RelationshipCreatedResponse>>)> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let created = state
        .store
        .write(project_id, |schema| {
            let id = schema.create_relationship(payload)?;
            let relationship = schema.relationship(id).cloned().ok_or_else(|| {
                AppError::Internal(format!("Relationship {} vanished after insert", id))
            })?;
            Ok(RelationshipCreatedResponse { id, relationship })
        })
        .await?;

    info!(
        "Relationship {} created in project {}: table {} -> table {}",
        created.id,
        project_id,
        created.relationship.end_table_id,
        created.relationship.start_table_id
    );

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Relationship created successfully.", created)),
    ))
}

pub async fn delete_relationship(
    State(state): State<SharedState>,
    Path((project_id, relationship_id)): Path<(ProjectId, RelationshipId)>,
) -> ApiResult<Json<SuccessResponse<Relationship>>> {
    let removed = state
        .store
        .write(project_id, |schema| schema.delete_relationship(relationship_id))
        .await?;

    info!("Relationship {} deleted from project {}", relationship_id, project_id);

    Ok(Json(SuccessResponse::with_data(
        "Relationship deleted successfully.",
        removed,
    )))
}
