//! Column reconciliation

use crate::error::{reference_error, AppError};
use crate::schema::{Column, ColumnId, ProjectSchema, TableId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use validator::Validate;

fn default_nullable() -> bool {
    true
}

/// Desired state of one column, as sent by the editor.
///
/// A descriptor with an `id` updates that stored column; one without is a new column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ColumnId>,

    #[validate(length(max = 100, message = "Column name must be at most 100 characters"))]
    pub name: String,

    #[validate(length(max = 50, message = "Data type must be at most 50 characters"))]
    pub data_type: String,

    #[serde(default)]
    pub is_primary_key: bool,

    #[serde(default)]
    pub is_unique: bool,

    #[serde(default = "default_nullable")]
    pub is_nullable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255, message = "Default value must be at most 255 characters"))]
    pub default_value: Option<String>,
}

impl ColumnDraft {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            data_type: data_type.into(),
            is_primary_key: false,
            is_unique: false,
            is_nullable: true,
            default_value: None,
        }
    }

    pub fn with_id(mut self, id: ColumnId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Read a stored column back as a draft carrying its identity
    pub fn from_column(column: &Column) -> Self {
        Self {
            id: Some(column.id),
            name: column.name.clone(),
            data_type: column.data_type.clone(),
            is_primary_key: column.is_primary_key,
            is_unique: column.is_unique,
            is_nullable: column.is_nullable,
            default_value: column.default_value.clone(),
        }
    }

    /// True when every mutable field already equals the stored column
    pub fn matches(&self, column: &Column) -> bool {
        self.name == column.name
            && self.data_type == column.data_type
            && self.is_primary_key == column.is_primary_key
            && self.is_unique == column.is_unique
            && self.is_nullable == column.is_nullable
            && self.default_value == column.default_value
    }

    pub fn apply_to(&self, column: &mut Column) {
        column.name = self.name.clone();
        column.data_type = self.data_type.clone();
        column.is_primary_key = self.is_primary_key;
        column.is_unique = self.is_unique;
        column.is_nullable = self.is_nullable;
        column.default_value = self.default_value.clone();
    }

    pub fn to_column(&self, id: ColumnId, table_id: TableId, position: i64) -> Column {
        Column {
            id,
            table_id,
            name: self.name.clone(),
            data_type: self.data_type.clone(),
            is_primary_key: self.is_primary_key,
            is_unique: self.is_unique,
            is_nullable: self.is_nullable,
            default_value: self.default_value.clone(),
            position,
        }
    }
}

/// An existing column whose fields change
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnUpdate {
    pub id: ColumnId,
    pub draft: ColumnDraft,
}

/// Everything needed to move a table from its stored columns to the desired ones
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnChangeSet {
    pub table_id: TableId,
    pub deletes: Vec<ColumnId>,
    pub updates: Vec<ColumnUpdate>,
    pub inserts: Vec<ColumnDraft>,
    /// Descriptors that matched their stored column exactly
    pub unchanged: usize,
}

impl ColumnChangeSet {
    pub fn is_empty(&self) -> bool {
        self.deletes.is_empty() && self.updates.is_empty() && self.inserts.is_empty()
    }
}

/// Outcome of an applied reconciliation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnChangeSummary {
    pub inserted: Vec<ColumnId>,
    pub updated: Vec<ColumnId>,
    pub deleted: Vec<ColumnId>,
    pub unchanged: usize,
}

/// Diff the stored columns of a table against the desired descriptors.
///
/// Stored columns whose identity is absent from `desired` are deleted,
/// identified descriptors overwrite their column when something differs, and
/// descriptors without identity become inserts (in the given order).
pub fn plan_columns(
    table_id: TableId,
    current: &[&Column],
    desired: &[ColumnDraft],
) -> Result<ColumnChangeSet, AppError> {
    let stored: HashMap<ColumnId, &Column> = current
        .iter()
        .filter(|c| c.table_id == table_id)
        .map(|c| (c.id, *c))
        .collect();

    let mut requested = HashSet::new();
    let mut updates = Vec::new();
    let mut inserts = Vec::new();
    let mut unchanged = 0;

    for draft in desired {
        match draft.id {
            Some(id) => {
                let column = stored.get(&id).ok_or_else(|| {
                    reference_error(format!("Column {} does not belong to table {}", id, table_id))
                })?;
                if !requested.insert(id) {
                    return Err(reference_error(format!(
                        "Column {} appears more than once in the request",
                        id
                    )));
                }
                if draft.matches(column) {
                    unchanged += 1;
                } else {
                    updates.push(ColumnUpdate {
                        id,
                        draft: draft.clone(),
                    });
                }
            }
            None => inserts.push(draft.clone()),
        }
    }

    // Keep deletions in stored (creation) order so plans are deterministic.
    let deletes = current
        .iter()
        .filter(|c| c.table_id == table_id && !requested.contains(&c.id))
        .map(|c| c.id)
        .collect();

    Ok(ColumnChangeSet {
        table_id,
        deletes,
        updates,
        inserts,
        unchanged,
    })
}

/// Plan and apply a column reconciliation against a project graph
pub fn reconcile_columns(
    schema: &mut ProjectSchema,
    table_id: TableId,
    desired: &[ColumnDraft],
) -> Result<ColumnChangeSummary, AppError> {
    schema.require_table(table_id)?;
    let plan = plan_columns(table_id, &schema.columns_of(table_id), desired)?;

    debug!(
        "Reconciling table {}: {} inserts, {} updates, {} deletes, {} unchanged",
        table_id,
        plan.inserts.len(),
        plan.updates.len(),
        plan.deletes.len(),
        plan.unchanged
    );

    let inserted = schema.apply_column_changes(&plan)?;

    Ok(ColumnChangeSummary {
        inserted,
        updated: plan.updates.iter().map(|u| u.id).collect(),
        deleted: plan.deletes,
        unchanged: plan.unchanged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ProjectId;
    use pretty_assertions::assert_eq;

    fn table_with_a_and_b() -> (ProjectSchema, TableId, ColumnId, ColumnId) {
        let mut schema = ProjectSchema::new(ProjectId(1), "demo");
        let table = schema.create_table("t", None).unwrap();
        let summary = reconcile_columns(
            &mut schema,
            table,
            &[ColumnDraft::new("a", "integer"), ColumnDraft::new("b", "text")],
        )
        .unwrap();
        (schema, table, summary.inserted[0], summary.inserted[1])
    }

    #[test]
    fn test_keep_one_drop_one_add_one() {
        let (mut schema, table, a, b) = table_with_a_and_b();

        let summary = reconcile_columns(
            &mut schema,
            table,
            &[
                ColumnDraft::new("a", "integer").with_id(a),
                ColumnDraft::new("c", "boolean"),
            ],
        )
        .unwrap();

        assert_eq!(summary.deleted, vec![b]);
        assert_eq!(summary.updated, Vec::<ColumnId>::new());
        assert_eq!(summary.unchanged, 1);
        assert_eq!(summary.inserted.len(), 1);

        let new_id = summary.inserted[0];
        assert!(new_id != a && new_id != b);

        let names: Vec<&str> = schema
            .columns_of(table)
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
        assert!(schema.column(b).is_none());
    }

    #[test]
    fn test_reconciling_the_read_back_state_changes_nothing() {
        let mut schema = ProjectSchema::new(ProjectId(1), "demo");
        let table = schema.create_table("users", None).unwrap();
        let desired = vec![
            ColumnDraft::new("id", "integer").primary_key().not_null(),
            ColumnDraft::new("email", "varchar").unique().not_null(),
            ColumnDraft::new("status", "varchar").default_value("active"),
        ];
        reconcile_columns(&mut schema, table, &desired).unwrap();

        let read_back: Vec<ColumnDraft> = schema
            .columns_of(table)
            .into_iter()
            .map(ColumnDraft::from_column)
            .collect();
        let plan = plan_columns(table, &schema.columns_of(table), &read_back).unwrap();

        assert!(plan.is_empty());
        assert_eq!(plan.unchanged, 3);
    }

    #[test]
    fn test_update_overwrites_mutable_fields() {
        let (mut schema, table, a, b) = table_with_a_and_b();

        let summary = reconcile_columns(
            &mut schema,
            table,
            &[
                ColumnDraft::new("a_renamed", "bigint").with_id(a).primary_key().not_null(),
                ColumnDraft::new("b", "text").with_id(b),
            ],
        )
        .unwrap();

        assert_eq!(summary.updated, vec![a]);
        let column = schema.column(a).unwrap();
        assert_eq!(column.name, "a_renamed");
        assert_eq!(column.data_type, "bigint");
        assert!(column.is_primary_key);
        assert!(!column.is_nullable);
    }

    #[test]
    fn test_inserted_columns_sort_after_existing_ones() {
        let (mut schema, table, a, b) = table_with_a_and_b();

        reconcile_columns(
            &mut schema,
            table,
            &[
                ColumnDraft::new("z_first_in_request", "text"),
                ColumnDraft::new("b", "text").with_id(b),
                ColumnDraft::new("a", "integer").with_id(a),
            ],
        )
        .unwrap();

        let names: Vec<&str> = schema
            .columns_of(table)
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "z_first_in_request"]);
    }

    #[test]
    fn test_foreign_identity_fails_without_writing() {
        let (mut schema, table, a, _b) = table_with_a_and_b();
        let other = schema.create_table("other", None).unwrap();
        let foreign = reconcile_columns(&mut schema, other, &[ColumnDraft::new("x", "text")])
            .unwrap()
            .inserted[0];
        let before = schema.to_document();

        let result = reconcile_columns(
            &mut schema,
            table,
            &[
                ColumnDraft::new("a", "integer").with_id(a),
                ColumnDraft::new("stolen", "text").with_id(foreign),
                ColumnDraft::new("fresh", "text"),
            ],
        );

        assert!(matches!(result, Err(AppError::Reference(_))));
        assert_eq!(schema.to_document(), before);
    }

    #[test]
    fn test_repeated_identity_is_a_reference_error() {
        let (schema, table, a, _b) = table_with_a_and_b();

        let result = plan_columns(
            table,
            &schema.columns_of(table),
            &[
                ColumnDraft::new("a", "integer").with_id(a),
                ColumnDraft::new("a2", "integer").with_id(a),
            ],
        );

        assert!(matches!(result, Err(AppError::Reference(_))));
    }

    #[test]
    fn test_draft_defaults_when_deserialized() {
        let draft: ColumnDraft =
            serde_json::from_str(r#"{"name": "note", "dataType": "text"}"#).unwrap();

        assert_eq!(draft, ColumnDraft::new("note", "text"));
        assert!(draft.validate().is_ok());
    }
}
