//! Snapshot documents
//!
//! The nested shape in which a project's schema is loaded from and handed
//! back to the persistence layer (or produced by reverse engineering a live
//! database). Loading checks the structural invariants the arena relies on.

use super::ids::{ColumnId, IndexId, ProjectId, RelationshipId, TableId};
use super::model::{Column, Index, IndexColumn, Relationship, RelationshipColumn, Table};
use super::project::{sequence_exhausted, ProjectSchema};
use crate::error::{reference_error, AppError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub tables: Vec<TableDocument>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDocument {
    pub id: TableId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDocument>,
    #[serde(default)]
    pub indexes: Vec<IndexDocument>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDocument {
    pub id: ColumnId,
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default = "default_nullable")]
    pub is_nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Creation position; assigned in document order when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDocument {
    pub id: IndexId,
    pub name: String,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub columns: Vec<IndexColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipDocument {
    pub id: RelationshipId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_name: Option<String>,
    pub start_table_id: TableId,
    pub end_table_id: TableId,
    #[serde(default)]
    pub columns: Vec<RelationshipColumn>,
}

fn ensure_unique<T: std::hash::Hash + Eq + std::fmt::Display>(
    seen: &mut HashSet<T>,
    id: T,
    kind: &str,
) -> Result<(), AppError> {
    let label = id.to_string();
    if seen.insert(id) {
        Ok(())
    } else {
        Err(reference_error(format!("Duplicate {} id {}", kind, label)))
    }
}

impl ProjectSchema {
    /// Build a graph from a snapshot document.
    ///
    /// Fails with a reference error when identities repeat, when an index
    /// lists a column of another table, or when a relationship pair does not
    /// connect its start and end tables.
    pub fn from_document(id: ProjectId, document: SchemaDocument) -> Result<Self, AppError> {
        let mut schema = ProjectSchema::new(id, document.name);
        schema.set_description(document.description);

        let mut table_ids = HashSet::new();
        let mut column_ids = HashSet::new();
        let mut index_ids = HashSet::new();
        let mut relationship_ids = HashSet::new();

        let explicit_max_position = document
            .tables
            .iter()
            .flat_map(|t| t.columns.iter())
            .filter_map(|c| c.position)
            .max()
            .unwrap_or(0);
        let mut next_position = explicit_max_position;
        let mut highest = explicit_max_position;

        for table in &document.tables {
            ensure_unique(&mut table_ids, table.id, "table")?;
            highest = highest.max(table.id.get());
            schema.tables.insert(
                table.id,
                Table {
                    id: table.id,
                    name: table.name.clone(),
                    notes: table.notes.clone(),
                },
            );

            for column in &table.columns {
                ensure_unique(&mut column_ids, column.id, "column")?;
                highest = highest.max(column.id.get());
                let position = match column.position {
                    Some(position) => position,
                    None => {
                        next_position = next_position.checked_add(1).ok_or_else(sequence_exhausted)?;
                        next_position
                    }
                };
                highest = highest.max(position);
                schema.columns.insert(
                    column.id,
                    Column {
                        id: column.id,
                        table_id: table.id,
                        name: column.name.clone(),
                        data_type: column.data_type.clone(),
                        is_primary_key: column.is_primary_key,
                        is_unique: column.is_unique,
                        is_nullable: column.is_nullable,
                        default_value: column.default_value.clone(),
                        position,
                    },
                );
            }
        }

        // Indexes reference columns, so they are attached once every column is known.
        for table in &document.tables {
            for index in &table.indexes {
                ensure_unique(&mut index_ids, index.id, "index")?;
                highest = highest.max(index.id.get());
                for slot in &index.columns {
                    schema.check_column_owner(slot.column_id, table.id).map_err(|e| {
                        reference_error(format!("Index '{}': {}", index.name, strip_prefix(&e)))
                    })?;
                }
                schema.indexes.insert(
                    index.id,
                    Index {
                        id: index.id,
                        table_id: table.id,
                        name: index.name.clone(),
                        is_unique: index.is_unique,
                        columns: index.columns.clone(),
                    },
                );
            }
        }

        for relationship in document.relationships {
            ensure_unique(&mut relationship_ids, relationship.id, "relationship")?;
            highest = highest.max(relationship.id.get());
            for table_id in [relationship.start_table_id, relationship.end_table_id] {
                if !schema.tables.contains_key(&table_id) {
                    return Err(reference_error(format!(
                        "Relationship {} references missing table {}",
                        relationship.id, table_id
                    )));
                }
            }
            for pair in &relationship.columns {
                schema
                    .check_column_owner(pair.start_column_id, relationship.start_table_id)
                    .and_then(|_| schema.check_column_owner(pair.end_column_id, relationship.end_table_id))
                    .map_err(|e| {
                        reference_error(format!(
                            "Relationship {}: {}",
                            relationship.id,
                            strip_prefix(&e)
                        ))
                    })?;
            }
            schema.relationships.insert(
                relationship.id,
                Relationship {
                    id: relationship.id,
                    project_id: id,
                    constraint_name: relationship.constraint_name,
                    start_table_id: relationship.start_table_id,
                    end_table_id: relationship.end_table_id,
                    columns: relationship.columns,
                },
            );
        }

        schema.sequence = highest;
        Ok(schema)
    }

    /// Nested snapshot of the current graph
    pub fn to_document(&self) -> SchemaDocument {
        let tables = self
            .tables()
            .map(|table| TableDocument {
                id: table.id,
                name: table.name.clone(),
                notes: table.notes.clone(),
                columns: self
                    .columns_of(table.id)
                    .into_iter()
                    .map(|c| ColumnDocument {
                        id: c.id,
                        name: c.name.clone(),
                        data_type: c.data_type.clone(),
                        is_primary_key: c.is_primary_key,
                        is_unique: c.is_unique,
                        is_nullable: c.is_nullable,
                        default_value: c.default_value.clone(),
                        position: Some(c.position),
                    })
                    .collect(),
                indexes: self
                    .indexes_of(table.id)
                    .into_iter()
                    .map(|i| IndexDocument {
                        id: i.id,
                        name: i.name.clone(),
                        is_unique: i.is_unique,
                        columns: i.columns.clone(),
                    })
                    .collect(),
            })
            .collect();

        let relationships = self
            .relationships()
            .map(|r| RelationshipDocument {
                id: r.id,
                constraint_name: r.constraint_name.clone(),
                start_table_id: r.start_table_id,
                end_table_id: r.end_table_id,
                columns: r.columns.clone(),
            })
            .collect();

        SchemaDocument {
            name: self.name().to_string(),
            description: self.description().map(str::to_string),
            tables,
            relationships,
        }
    }
}

fn strip_prefix(error: &AppError) -> String {
    match error {
        AppError::Reference(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_json() -> &'static str {
        r#"{
            "name": "shop",
            "tables": [
                {
                    "id": 1,
                    "name": "users",
                    "columns": [
                        {"id": 10, "name": "id", "dataType": "integer", "isPrimaryKey": true, "isNullable": false},
                        {"id": 11, "name": "email", "dataType": "varchar", "isUnique": true, "isNullable": false}
                    ],
                    "indexes": [
                        {"id": 20, "name": "idx_email", "isUnique": true, "columns": [{"columnId": 11, "order": 0}]}
                    ]
                },
                {
                    "id": 2,
                    "name": "orders",
                    "columns": [
                        {"id": 12, "name": "id", "dataType": "integer", "isPrimaryKey": true},
                        {"id": 13, "name": "user_id", "dataType": "integer"}
                    ]
                }
            ],
            "relationships": [
                {"id": 30, "startTableId": 1, "endTableId": 2,
                 "columns": [{"startColumnId": 10, "endColumnId": 13}]}
            ]
        }"#
    }

    #[test]
    fn test_load_assigns_positions_and_sequence() {
        let document: SchemaDocument = serde_json::from_str(sample_json()).unwrap();
        let schema = ProjectSchema::from_document(ProjectId(5), document).unwrap();

        let users: Vec<&str> = schema
            .columns_of(TableId(1))
            .into_iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(users, vec!["id", "email"]);
        assert!(schema.column(ColumnId(13)).unwrap().is_nullable);
        assert_eq!(schema.relationship(RelationshipId(30)).unwrap().project_id, ProjectId(5));
        assert_eq!(schema.sequence, 30);
    }

    #[test]
    fn test_document_survives_a_load_and_read_back() {
        let document: SchemaDocument = serde_json::from_str(sample_json()).unwrap();
        let schema = ProjectSchema::from_document(ProjectId(5), document).unwrap();
        let exported = schema.to_document();
        let reloaded = ProjectSchema::from_document(ProjectId(5), exported.clone()).unwrap();

        assert_eq!(reloaded.to_document(), exported);
    }

    #[test]
    fn test_index_on_foreign_column_is_rejected() {
        let mut document: SchemaDocument = serde_json::from_str(sample_json()).unwrap();
        document.tables[0].indexes[0].columns[0].column_id = ColumnId(13);

        let result = ProjectSchema::from_document(ProjectId(5), document);
        assert!(matches!(result, Err(AppError::Reference(_))));
    }

    #[test]
    fn test_reversed_relationship_pair_is_rejected() {
        let mut document: SchemaDocument = serde_json::from_str(sample_json()).unwrap();
        document.relationships[0].columns[0] = RelationshipColumn::new(ColumnId(13), ColumnId(10));

        let result = ProjectSchema::from_document(ProjectId(5), document);
        assert!(matches!(result, Err(AppError::Reference(_))));
    }

    #[test]
    fn test_exhausted_id_space_fails_without_changes() {
        let document: SchemaDocument = serde_json::from_str(
            r#"{"name": "full", "tables": [
                {"id": 9223372036854775807, "name": "last", "columns": []}
            ]}"#,
        )
        .unwrap();
        let mut schema = ProjectSchema::from_document(ProjectId(1), document).unwrap();
        assert_eq!(schema.sequence, i64::MAX);

        let result = schema.create_table("more", None);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(schema.summary().table_count, 1);
        assert_eq!(schema.sequence, i64::MAX);
    }

    #[test]
    fn test_missing_position_after_largest_position_is_rejected() {
        let document: SchemaDocument = serde_json::from_str(
            r#"{"name": "full", "tables": [
                {"id": 1, "name": "t", "columns": [
                    {"id": 2, "name": "a", "dataType": "int", "position": 9223372036854775807},
                    {"id": 3, "name": "b", "dataType": "int"}
                ]}
            ]}"#,
        )
        .unwrap();

        let result = ProjectSchema::from_document(ProjectId(1), document);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_duplicate_column_id_is_rejected() {
        let mut document: SchemaDocument = serde_json::from_str(sample_json()).unwrap();
        document.tables[1].columns[0].id = ColumnId(10);

        let result = ProjectSchema::from_document(ProjectId(5), document);
        assert!(matches!(result, Err(AppError::Reference(_))));
    }
}
