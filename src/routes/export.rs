//! Validation and DDL export route handlers
//!
//! Both run against an owned snapshot, so a slow export never holds the
//! project lock while it renders.

use crate::error::ApiResult;
use crate::integrity::ValidationReport;
use crate::models::{ExportResponse, RuleListResponse, SuccessResponse};
use crate::schema::ProjectId;
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{debug, warn};

/// List the integrity rule catalog
pub async fn list_rules(
    State(state): State<SharedState>,
) -> ApiResult<Json<SuccessResponse<RuleListResponse>>> {
    let rules = state.validator.list_rules().to_vec();

    Ok(Json(SuccessResponse::with_data(
        "Rules fetched successfully.",
        RuleListResponse { rules },
    )))
}

/// Validate a project
pub async fn validate_project(
    State(state): State<SharedState>,
    Path(project_id): Path<ProjectId>,
) -> ApiResult<Json<SuccessResponse<ValidationReport>>> {
    let snapshot = state.store.snapshot(project_id).await?;
    let report = state.validator.validate(&snapshot);

    debug!(
        "Validated project {}: {} errors, {} warnings",
        project_id,
        report.errors.len(),
        report.warnings.len()
    );

    let message = if report.is_valid {
        "Schema is valid."
    } else {
        "Schema has errors."
    };

    Ok(Json(SuccessResponse::with_data(message, report)))
}

/// Compile a project to DDL, returning the validation report alongside
pub async fn export_project(
    State(state): State<SharedState>,
    Path(project_id): Path<ProjectId>,
) -> ApiResult<Json<SuccessResponse<ExportResponse>>> {
    let snapshot = state.store.snapshot(project_id).await?;
    let validation = state.validator.validate(&snapshot);
    let ddl = state.compiler.compile(&snapshot);

    if !validation.is_valid {
        warn!(
            "Exporting project {} with {} validation errors",
            project_id,
            validation.errors.len()
        );
    }

    Ok(Json(SuccessResponse::with_data(
        "Schema exported successfully.",
        ExportResponse { ddl, validation },
    )))
}
