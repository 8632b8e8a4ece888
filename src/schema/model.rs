//! Schema entities
//!
//! Plain data: tables, columns, indexes and relationships. Entities refer to
//! each other by identity only; the owning [`ProjectSchema`](super::ProjectSchema)
//! resolves those references on demand.

use super::ids::{ColumnId, IndexId, ProjectId, RelationshipId, TableId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A table in the designer schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: TableId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A column owned by a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: ColumnId,
    pub table_id: TableId,
    pub name: String,
    /// Canonical type tag, e.g. `integer`, `varchar`, `timestamp`
    pub data_type: String,
    pub is_primary_key: bool,
    pub is_unique: bool,
    pub is_nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Creation order. The only ordering key used when columns are listed or emitted.
    pub position: i64,
}

/// One column slot of an index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexColumn {
    pub column_id: ColumnId,
    pub order: i32,
}

/// A (possibly unique) index on a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub id: IndexId,
    pub table_id: TableId,
    pub name: String,
    pub is_unique: bool,
    pub columns: Vec<IndexColumn>,
}

impl Index {
    /// Column ids sorted by their explicit order
    pub fn ordered_column_ids(&self) -> Vec<ColumnId> {
        let mut slots = self.columns.clone();
        slots.sort_by_key(|slot| slot.order);
        slots.into_iter().map(|slot| slot.column_id).collect()
    }

    pub fn contains_column(&self, column_id: ColumnId) -> bool {
        self.columns.iter().any(|slot| slot.column_id == column_id)
    }
}

/// Side of a table box a relationship line attaches to. Rendering only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortSide {
    Left,
    Right,
}

fn default_start_side() -> PortSide {
    PortSide::Right
}

fn default_end_side() -> PortSide {
    PortSide::Left
}

/// A start/end column pair of a relationship.
///
/// `start` is the referenced (parent) column, `end` the referencing (foreign key) column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipColumn {
    pub start_column_id: ColumnId,
    pub end_column_id: ColumnId,
    #[serde(default = "default_start_side")]
    pub start_port_side: PortSide,
    #[serde(default = "default_end_side")]
    pub end_port_side: PortSide,
}

impl RelationshipColumn {
    pub fn new(start_column_id: ColumnId, end_column_id: ColumnId) -> Self {
        Self {
            start_column_id,
            end_column_id,
            start_port_side: default_start_side(),
            end_port_side: default_end_side(),
        }
    }
}

/// A foreign key between two tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: RelationshipId,
    pub project_id: ProjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
    /// Referenced (parent) table
    pub start_table_id: TableId,
    /// Referencing (child) table
    pub end_table_id: TableId,
    pub columns: Vec<RelationshipColumn>,
}

impl Relationship {
    /// The pair validation and DDL generation look at.
    ///
    /// Composite relationships are stored in full, but only their first pair
    /// takes part in checks and emitted constraints.
    pub fn first_pair(&self) -> Option<&RelationshipColumn> {
        self.columns.first()
    }

    /// Stored constraint name, ignoring blank values
    pub fn explicit_constraint_name(&self) -> Option<&str> {
        self.constraint_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn touches_table(&self, table_id: TableId) -> bool {
        self.start_table_id == table_id || self.end_table_id == table_id
    }

    pub fn uses_column(&self, column_id: ColumnId) -> bool {
        self.columns
            .iter()
            .any(|pair| pair.start_column_id == column_id || pair.end_column_id == column_id)
    }
}

/// Request shape for a new relationship
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDraft {
    #[validate(length(max = 100, message = "Constraint name must be at most 100 characters"))]
    pub constraint_name: Option<String>,
    pub start_table_id: TableId,
    pub end_table_id: TableId,
    #[validate(length(min = 1, message = "At least one column pair is required"))]
    pub columns: Vec<RelationshipColumn>,
}
