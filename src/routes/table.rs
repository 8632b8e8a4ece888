//! Table, column and index route handlers
//!
//! Column lists are reconciled wholesale: the editor sends the desired state
//! of every column and the reconciler works out the inserts, updates and
//! deletes. Indexes are replaced wholesale the same way.

use crate::error::{not_found_error, validation_error, ApiResult, AppError};
use crate::models::{
    ColumnListResponse, CreateTableRequest, IndexCreatedResponse, IndexListResponse,
    ReconcileColumnsRequest, ReconcileColumnsResponse, SuccessResponse, TableDeletedResponse,
    TableDetail, UpdateTableRequest,
};
use crate::reconcile::{self, IndexDraft};
use crate::schema::{Index, IndexId, ProjectId, ProjectSchema, TableId};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};
use validator::Validate;

fn table_detail(schema: &ProjectSchema, table_id: TableId) -> Result<TableDetail, AppError> {
    let table = schema.require_table(table_id)?.clone();
    let columns = schema.columns_of(table_id).into_iter().cloned().collect();

    Ok(TableDetail {
        table,
        columns,
        indexes: indexes_by_name(schema, table_id),
    })
}

fn indexes_by_name(schema: &ProjectSchema, table_id: TableId) -> Vec<Index> {
    let mut indexes: Vec<Index> = schema.indexes_of(table_id).into_iter().cloned().collect();
    indexes.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    indexes
}

/// Index lookup scoped to the table named in the path
fn require_index_of(schema: &ProjectSchema, table_id: TableId, index_id: IndexId) -> Result<(), AppError> {
    schema.require_table(table_id)?;
    match schema.index(index_id) {
        Some(index) if index.table_id == table_id => Ok(()),
        _ => Err(not_found_error(format!(
            "Index {} not found on table {}",
            index_id, table_id
        ))),
    }
}

/// Create a table, optionally with its initial columns
pub async fn create_table(
    State(state): State<SharedState>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<CreateTableRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<TableDetail>>)> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let detail = state
        .store
        .write(project_id, |schema| {
            let table_id = schema.create_table(payload.name, payload.notes)?;
            if !payload.columns.is_empty() {
                reconcile::reconcile_columns(schema, table_id, &payload.columns)?;
            }
            table_detail(schema, table_id)
        })
        .await?;

    info!(
        "Table '{}' created in project {} with {} columns",
        detail.table.name,
        project_id,
        detail.columns.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Table created successfully.", detail)),
    ))
}

/// Rename a table and/or change its notes
pub async fn update_table(
    State(state): State<SharedState>,
    Path((project_id, table_id)): Path<(ProjectId, TableId)>,
    Json(payload): Json<UpdateTableRequest>,
) -> ApiResult<Json<SuccessResponse<TableDetail>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let detail = state
        .store
        .write(project_id, |schema| {
            if let Some(name) = payload.name {
                schema.rename_table(table_id, name)?;
            }
            if let Some(notes) = payload.notes {
                let notes = Some(notes).filter(|n| !n.trim().is_empty());
                schema.update_table_notes(table_id, notes)?;
            }
            table_detail(schema, table_id)
        })
        .await?;

    Ok(Json(SuccessResponse::with_data("Table updated successfully.", detail)))
}

/// Delete a table with its columns, indexes and relationships
pub async fn delete_table(
    State(state): State<SharedState>,
    Path((project_id, table_id)): Path<(ProjectId, TableId)>,
) -> ApiResult<Json<SuccessResponse<TableDeletedResponse>>> {
    let removed = state
        .store
        .write(project_id, |schema| schema.delete_table(table_id))
        .await?;

    info!(
        "Table {} deleted from project {} ({} columns, {} indexes, {} relationships)",
        table_id, project_id, removed.columns, removed.indexes, removed.relationships
    );

    Ok(Json(SuccessResponse::with_data(
        "Table deleted successfully.",
        TableDeletedResponse { table_id, removed },
    )))
}

/// Get the columns of a table in creation order
pub async fn get_columns(
    State(state): State<SharedState>,
    Path((project_id, table_id)): Path<(ProjectId, TableId)>,
) -> ApiResult<Json<SuccessResponse<ColumnListResponse>>> {
    let columns = state
        .store
        .read(project_id, |schema| {
            schema.require_table(table_id)?;
            Ok::<_, AppError>(schema.columns_of(table_id).into_iter().cloned().collect::<Vec<_>>())
        })
        .await??;

    Ok(Json(SuccessResponse::with_data(
        "Columns fetched successfully.",
        ColumnListResponse { columns },
    )))
}

/// Reconcile the columns of a table against the desired list
pub async fn reconcile_columns(
    State(state): State<SharedState>,
    Path((project_id, table_id)): Path<(ProjectId, TableId)>,
    Json(payload): Json<ReconcileColumnsRequest>,
) -> ApiResult<Json<SuccessResponse<ReconcileColumnsResponse>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    debug!(
        "Reconciling {} columns for table {} in project {}",
        payload.columns.len(),
        table_id,
        project_id
    );

    let response = state
        .store
        .write(project_id, |schema| {
            let changes = reconcile::reconcile_columns(schema, table_id, &payload.columns)?;
            Ok(ReconcileColumnsResponse {
                table_id,
                changes,
                columns: schema.columns_of(table_id).into_iter().cloned().collect(),
            })
        })
        .await?;

    info!(
        "Columns of table {} reconciled: {} inserted, {} updated, {} deleted",
        table_id,
        response.changes.inserted.len(),
        response.changes.updated.len(),
        response.changes.deleted.len()
    );

    Ok(Json(SuccessResponse::with_data(
        "Columns saved successfully.",
        response,
    )))
}

/// List the indexes of a table by name
pub async fn list_indexes(
    State(state): State<SharedState>,
    Path((project_id, table_id)): Path<(ProjectId, TableId)>,
) -> ApiResult<Json<SuccessResponse<IndexListResponse>>> {
    let indexes = state
        .store
        .read(project_id, |schema| {
            schema.require_table(table_id)?;
            Ok::<_, AppError>(indexes_by_name(schema, table_id))
        })
        .await??;

    Ok(Json(SuccessResponse::with_data(
        "Indexes fetched successfully.",
        IndexListResponse { indexes },
    )))
}

pub async fn create_index(
    State(state): State<SharedState>,
    Path((project_id, table_id)): Path<(ProjectId, TableId)>,
    Json(payload): Json<IndexDraft>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<IndexCreatedResponse>>)> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let created = state
        .store
        .write(project_id, |schema| {
            let id = reconcile::create_index(schema, table_id, &payload)?;
            let index = schema
                .index(id)
                .cloned()
                .ok_or_else(|| AppError::Internal(format!("Index {} vanished after insert", id)))?;
            Ok(IndexCreatedResponse { id, index })
        })
        .await?;

    info!("Index '{}' created on table {}", created.index.name, table_id);

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data("Index created successfully.", created)),
    ))
}

/// Replace an index's name, uniqueness and column list
pub async fn update_index(
    State(state): State<SharedState>,
    Path((project_id, table_id, index_id)): Path<(ProjectId, TableId, IndexId)>,
    Json(payload): Json<IndexDraft>,
) -> ApiResult<Json<SuccessResponse<Index>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let index = state
        .store
        .write(project_id, |schema| {
            require_index_of(schema, table_id, index_id)?;
            reconcile::replace_index(schema, index_id, &payload)?;
            schema
                .index(index_id)
                .cloned()
                .ok_or_else(|| not_found_error(format!("Index {} not found", index_id)))
        })
        .await?;

    Ok(Json(SuccessResponse::with_data("Index updated successfully.", index)))
}

pub async fn delete_index(
    State(state): State<SharedState>,
    Path((project_id, table_id, index_id)): Path<(ProjectId, TableId, IndexId)>,
) -> ApiResult<Json<SuccessResponse<Index>>> {
    let index = state
        .store
        .write(project_id, |schema| {
            require_index_of(schema, table_id, index_id)?;
            schema.delete_index(index_id)
        })
        .await?;

    info!("Index '{}' deleted from table {}", index.name, table_id);

    Ok(Json(SuccessResponse::with_data("Index deleted successfully.", index)))
}
