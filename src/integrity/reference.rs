//! Relationship inspection
//!
//! Resolves a relationship's first column pair and decides whether it can be
//! emitted as a foreign key. The validator and the DDL compiler both go
//! through here, so they always agree on which relationships are bad.

use crate::schema::{Column, ColumnId, ProjectSchema, Relationship, Table};

/// Why a resolved relationship cannot become a live constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceProblem {
    /// Start and end column types differ (case-insensitively)
    TypeMismatch,
    /// Start column is not primary key, unique, or sole column of a unique index
    NotReferenceable,
}

/// Both sides of a relationship's first pair, looked up in the graph
#[derive(Debug, Clone, Copy)]
pub struct ResolvedReference<'a> {
    pub relationship: &'a Relationship,
    /// Referenced (parent) side
    pub start_table: &'a Table,
    pub start_column: &'a Column,
    /// Referencing (child) side
    pub end_table: &'a Table,
    pub end_column: &'a Column,
}

impl ResolvedReference<'_> {
    /// Stored constraint name, or `fk_<end_table>_<start_table>`
    pub fn constraint_name(&self) -> String {
        self.relationship
            .explicit_constraint_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("fk_{}_{}", self.end_table.name, self.start_table.name))
    }
}

#[derive(Debug, Clone)]
pub enum RelationshipInspection<'a> {
    /// No column pairs at all
    NoColumns,
    /// First pair points at a column (or its table) missing from the graph
    Dangling { column_id: ColumnId },
    Resolved {
        reference: ResolvedReference<'a>,
        problems: Vec<ReferenceProblem>,
    },
}

/// Case-insensitive data type comparison
pub fn types_match(left: &str, right: &str) -> bool {
    left.to_lowercase() == right.to_lowercase()
}

/// Whether a column can be the target of a foreign key on its own
pub fn is_unique_referenceable(schema: &ProjectSchema, column: &Column) -> bool {
    if column.is_primary_key || column.is_unique {
        return true;
    }
    schema.indexes_of(column.table_id).into_iter().any(|index| {
        index.is_unique && index.columns.len() == 1 && index.columns[0].column_id == column.id
    })
}

/// Inspect the first column pair of a relationship
pub fn inspect_relationship<'a>(
    schema: &'a ProjectSchema,
    relationship: &'a Relationship,
) -> RelationshipInspection<'a> {
    let Some(pair) = relationship.first_pair() else {
        return RelationshipInspection::NoColumns;
    };

    let start = resolve(schema, pair.start_column_id);
    let end = resolve(schema, pair.end_column_id);
    let ((start_table, start_column), (end_table, end_column)) = match (start, end) {
        (Some(start), Some(end)) => (start, end),
        (None, _) => {
            return RelationshipInspection::Dangling {
                column_id: pair.start_column_id,
            }
        }
        (_, None) => {
            return RelationshipInspection::Dangling {
                column_id: pair.end_column_id,
            }
        }
    };

    let mut problems = Vec::new();
    if !types_match(&start_column.data_type, &end_column.data_type) {
        problems.push(ReferenceProblem::TypeMismatch);
    }
    if !is_unique_referenceable(schema, start_column) {
        problems.push(ReferenceProblem::NotReferenceable);
    }

    RelationshipInspection::Resolved {
        reference: ResolvedReference {
            relationship,
            start_table,
            start_column,
            end_table,
            end_column,
        },
        problems,
    }
}

fn resolve(schema: &ProjectSchema, column_id: ColumnId) -> Option<(&Table, &Column)> {
    let column = schema.column(column_id)?;
    let table = schema.table(column.table_id)?;
    Some((table, column))
}
