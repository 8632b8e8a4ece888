//! Table, column and index models

use crate::reconcile::{ColumnChangeSummary, ColumnDraft};
use crate::schema::{Column, Index, IndexId, Table, TableId, TableRemoval};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to create a new table. Blank names are accepted; validation reports them.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
    #[validate(length(max = 100, message = "Table name must be at most 100 characters"))]
    pub name: String,

    #[serde(default)]
    pub notes: Option<String>,

    /// Optional initial columns, reconciled right after creation
    #[serde(default)]
    #[validate(nested)]
    pub columns: Vec<ColumnDraft>,
}

/// Partial table update
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTableRequest {
    #[validate(length(max = 100, message = "Table name must be at most 100 characters"))]
    pub name: Option<String>,

    /// An empty string clears the notes
    pub notes: Option<String>,
}

/// Desired state of all columns of a table
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileColumnsRequest {
    #[validate(nested)]
    pub columns: Vec<ColumnDraft>,
}

/// Table with its columns (creation order) and indexes (by name)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDetail {
    #[serde(flatten)]
    pub table: Table,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
}

/// Response to a column reconciliation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileColumnsResponse {
    pub table_id: TableId,
    pub changes: ColumnChangeSummary,
    pub columns: Vec<Column>,
}

/// Response containing list of columns
#[derive(Debug, Serialize)]
pub struct ColumnListResponse {
    pub columns: Vec<Column>,
}

/// Response containing list of indexes
#[derive(Debug, Serialize)]
pub struct IndexListResponse {
    pub indexes: Vec<Index>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexCreatedResponse {
    pub id: IndexId,
    pub index: Index,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDeletedResponse {
    pub table_id: TableId,
    pub removed: TableRemoval,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_table_name_passes_request_validation() {
        let request: CreateTableRequest = serde_json::from_str(r#"{"name": ""}"#).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_long_data_type_is_rejected() {
        let request: ReconcileColumnsRequest = serde_json::from_value(serde_json::json!({
            "columns": [{"name": "id", "dataType": "x".repeat(51)}]
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_long_default_is_rejected() {
        let request: ReconcileColumnsRequest = serde_json::from_value(serde_json::json!({
            "columns": [{"name": "note", "dataType": "varchar", "defaultValue": "d".repeat(256)}]
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }
}
