//! Index reconciliation
//!
//! Indexes are replaced wholesale: the new column list, in the order given,
//! supersedes every existing association of the index.

use crate::error::{not_found_error, reference_error, AppError};
use crate::schema::{ColumnId, IndexColumn, IndexId, ProjectSchema, TableId};
use serde::Deserialize;
use std::collections::HashSet;
use validator::Validate;

/// Desired state of one index
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IndexDraft {
    #[validate(length(max = 100, message = "Index name must be at most 100 characters"))]
    pub name: String,
    #[serde(default)]
    pub is_unique: bool,
    /// Columns in index order
    #[serde(default)]
    pub column_ids: Vec<ColumnId>,
}

/// A checked index definition, ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct IndexReplacement {
    pub table_id: TableId,
    pub name: String,
    pub is_unique: bool,
    pub columns: Vec<IndexColumn>,
}

/// Check an index draft against a table and number its columns.
///
/// Every column must belong to the table and appear once. An empty column
/// list is accepted here; the integrity validator reports it.
pub fn plan_index(
    schema: &ProjectSchema,
    table_id: TableId,
    draft: &IndexDraft,
) -> Result<IndexReplacement, AppError> {
    schema.require_table(table_id)?;

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(draft.column_ids.len());
    for (order, column_id) in draft.column_ids.iter().copied().enumerate() {
        match schema.column(column_id) {
            Some(column) if column.table_id == table_id => {}
            _ => {
                return Err(reference_error(format!(
                    "Column {} does not belong to table {}",
                    column_id, table_id
                )))
            }
        }
        if !seen.insert(column_id) {
            return Err(reference_error(format!(
                "Column {} is listed more than once in index '{}'",
                column_id, draft.name
            )));
        }
        let order = i32::try_from(order)
            .map_err(|_| reference_error(format!("Index '{}' has too many columns", draft.name)))?;
        columns.push(IndexColumn { column_id, order });
    }

    Ok(IndexReplacement {
        table_id,
        name: draft.name.clone(),
        is_unique: draft.is_unique,
        columns,
    })
}

pub fn create_index(
    schema: &mut ProjectSchema,
    table_id: TableId,
    draft: &IndexDraft,
) -> Result<IndexId, AppError> {
    let replacement = plan_index(schema, table_id, draft)?;
    schema.create_index(replacement)
}

/// Total replace of an existing index
pub fn replace_index(
    schema: &mut ProjectSchema,
    index_id: IndexId,
    draft: &IndexDraft,
) -> Result<(), AppError> {
    let table_id = schema
        .index(index_id)
        .map(|index| index.table_id)
        .ok_or_else(|| not_found_error(format!("Index {} not found", index_id)))?;
    let replacement = plan_index(schema, table_id, draft)?;
    schema.replace_index(index_id, replacement)
}
