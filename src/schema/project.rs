//! Project schema graph
//!
//! An arena of tables, columns, indexes and relationships keyed by identity.
//! Cross references are stored as ids and resolved by lookup, so the graph has
//! no cycles to maintain. Every mutation checks its inputs before touching the
//! maps; a failed call leaves the graph exactly as it was.

use super::ids::{ColumnId, IndexId, ProjectId, RelationshipId, TableId};
use super::model::{Column, Index, Relationship, RelationshipDraft, Table};
use crate::error::{not_found_error, reference_error, AppError};
use crate::reconcile::{ColumnChangeSet, IndexReplacement};
use indexmap::IndexMap;
use serde::Serialize;

/// The full designer schema of one project
#[derive(Debug, Clone)]
pub struct ProjectSchema {
    id: ProjectId,
    name: String,
    description: Option<String>,
    pub(super) tables: IndexMap<TableId, Table>,
    pub(super) columns: IndexMap<ColumnId, Column>,
    pub(super) indexes: IndexMap<IndexId, Index>,
    pub(super) relationships: IndexMap<RelationshipId, Relationship>,
    /// Last identity handed out; also the source of column creation positions
    pub(super) sequence: i64,
}

/// What a cascading table delete removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRemoval {
    pub columns: usize,
    pub indexes: usize,
    pub relationships: usize,
}

/// Lightweight listing entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub table_count: usize,
    pub column_count: usize,
    pub index_count: usize,
    pub relationship_count: usize,
}

impl ProjectSchema {
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            tables: IndexMap::new(),
            columns: IndexMap::new(),
            indexes: IndexMap::new(),
            relationships: IndexMap::new(),
            sequence: 0,
        }
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Free-text description; blank text clears it
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description.filter(|d| !d.trim().is_empty());
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            table_count: self.tables.len(),
            column_count: self.columns.len(),
            index_count: self.indexes.len(),
            relationship_count: self.relationships.len(),
        }
    }

    /// Hand out the next identity. Fails instead of wrapping once the id space is used up.
    pub(crate) fn next_sequence(&mut self) -> Result<i64, AppError> {
        self.sequence = self.sequence.checked_add(1).ok_or_else(sequence_exhausted)?;
        Ok(self.sequence)
    }

    // ----- lookups -----

    /// Tables in declaration order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Relationships in declaration order
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.values()
    }

    pub fn table(&self, id: TableId) -> Option<&Table> {
        self.tables.get(&id)
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(&id)
    }

    pub fn index(&self, id: IndexId) -> Option<&Index> {
        self.indexes.get(&id)
    }

    pub fn relationship(&self, id: RelationshipId) -> Option<&Relationship> {
        self.relationships.get(&id)
    }

    pub fn require_table(&self, id: TableId) -> Result<&Table, AppError> {
        self.table(id)
            .ok_or_else(|| not_found_error(format!("Table {} not found in project {}", id, self.id)))
    }

    /// Columns of a table ordered by creation position
    pub fn columns_of(&self, table_id: TableId) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self
            .columns
            .values()
            .filter(|c| c.table_id == table_id)
            .collect();
        columns.sort_by_key(|c| (c.position, c.id));
        columns
    }

    /// Indexes of a table in declaration order
    pub fn indexes_of(&self, table_id: TableId) -> Vec<&Index> {
        self.indexes
            .values()
            .filter(|i| i.table_id == table_id)
            .collect()
    }

    /// Relationships where the table is the referenced side
    pub fn relationships_starting_at(&self, table_id: TableId) -> Vec<&Relationship> {
        self.relationships
            .values()
            .filter(|r| r.start_table_id == table_id)
            .collect()
    }

    /// Relationships where the table is the referencing side
    pub fn relationships_ending_at(&self, table_id: TableId) -> Vec<&Relationship> {
        self.relationships
            .values()
            .filter(|r| r.end_table_id == table_id)
            .collect()
    }

    /// Owning table of a column, if both exist
    pub fn table_of_column(&self, column_id: ColumnId) -> Option<&Table> {
        self.column(column_id).and_then(|c| self.table(c.table_id))
    }

    // ----- tables -----

    pub fn create_table(&mut self, name: impl Into<String>, notes: Option<String>) -> Result<TableId, AppError> {
        let id = TableId(self.next_sequence()?);
        self.tables.insert(
            id,
            Table {
                id,
                name: name.into(),
                notes,
            },
        );
        Ok(id)
    }

    pub fn rename_table(&mut self, id: TableId, name: impl Into<String>) -> Result<(), AppError> {
        let project = self.id;
        let table = self
            .tables
            .get_mut(&id)
            .ok_or_else(|| not_found_error(format!("Table {} not found in project {}", id, project)))?;
        table.name = name.into();
        Ok(())
    }

    pub fn update_table_notes(&mut self, id: TableId, notes: Option<String>) -> Result<(), AppError> {
        let project = self.id;
        let table = self
            .tables
            .get_mut(&id)
            .ok_or_else(|| not_found_error(format!("Table {} not found in project {}", id, project)))?;
        table.notes = notes;
        Ok(())
    }

    /// Delete a table together with its columns, its indexes and every
    /// relationship it participates in.
    pub fn delete_table(&mut self, id: TableId) -> Result<TableRemoval, AppError> {
        self.require_table(id)?;

        let columns_before = self.columns.len();
        let indexes_before = self.indexes.len();
        let relationships_before = self.relationships.len();

        self.relationships.retain(|_, r| !r.touches_table(id));
        self.indexes.retain(|_, i| i.table_id != id);
        self.columns.retain(|_, c| c.table_id != id);
        self.tables.shift_remove(&id);

        Ok(TableRemoval {
            columns: columns_before - self.columns.len(),
            indexes: indexes_before - self.indexes.len(),
            relationships: relationships_before - self.relationships.len(),
        })
    }

    // ----- columns -----

    /// Apply a reconciliation plan. Returns the identities of inserted columns
    /// in insertion order.
    ///
    /// Deleting a column also drops it from the table's indexes and drops every
    /// relationship pair using it; relationships left without pairs go too.
    pub fn apply_column_changes(&mut self, plan: &ColumnChangeSet) -> Result<Vec<ColumnId>, AppError> {
        self.require_table(plan.table_id)?;

        let needed = i64::try_from(plan.inserts.len()).map_err(|_| sequence_exhausted())?;
        if self.sequence.checked_add(needed).is_none() {
            return Err(sequence_exhausted());
        }

        let touched = plan
            .deletes
            .iter()
            .copied()
            .chain(plan.updates.iter().map(|u| u.id));
        for column_id in touched {
            match self.columns.get(&column_id) {
                Some(column) if column.table_id == plan.table_id => {}
                _ => {
                    return Err(reference_error(format!(
                        "Column {} does not belong to table {}",
                        column_id, plan.table_id
                    )))
                }
            }
        }

        for column_id in &plan.deletes {
            self.columns.shift_remove(column_id);
            for index in self.indexes.values_mut() {
                index.columns.retain(|slot| slot.column_id != *column_id);
            }
            for relationship in self.relationships.values_mut() {
                relationship.columns.retain(|pair| {
                    pair.start_column_id != *column_id && pair.end_column_id != *column_id
                });
            }
        }
        if !plan.deletes.is_empty() {
            self.relationships.retain(|_, r| !r.columns.is_empty());
        }

        for update in &plan.updates {
            if let Some(column) = self.columns.get_mut(&update.id) {
                update.draft.apply_to(column);
            }
        }

        let mut inserted = Vec::with_capacity(plan.inserts.len());
        for draft in &plan.inserts {
            let seq = self.next_sequence()?;
            let id = ColumnId(seq);
            self.columns.insert(id, draft.to_column(id, plan.table_id, seq));
            inserted.push(id);
        }

        Ok(inserted)
    }

    // ----- indexes -----

    pub fn create_index(&mut self, replacement: IndexReplacement) -> Result<IndexId, AppError> {
        self.check_index_columns(&replacement)?;
        let id = IndexId(self.next_sequence()?);
        self.indexes.insert(
            id,
            Index {
                id,
                table_id: replacement.table_id,
                name: replacement.name,
                is_unique: replacement.is_unique,
                columns: replacement.columns,
            },
        );
        Ok(id)
    }

    /// Replace name, uniqueness and the whole column list of an index
    pub fn replace_index(&mut self, id: IndexId, replacement: IndexReplacement) -> Result<(), AppError> {
        let current = self
            .indexes
            .get(&id)
            .ok_or_else(|| not_found_error(format!("Index {} not found", id)))?;
        if current.table_id != replacement.table_id {
            return Err(reference_error(format!(
                "Index {} belongs to table {}, not table {}",
                id, current.table_id, replacement.table_id
            )));
        }
        self.check_index_columns(&replacement)?;

        if let Some(index) = self.indexes.get_mut(&id) {
            index.name = replacement.name;
            index.is_unique = replacement.is_unique;
            index.columns = replacement.columns;
        }
        Ok(())
    }

    pub fn delete_index(&mut self, id: IndexId) -> Result<Index, AppError> {
        self.indexes
            .shift_remove(&id)
            .ok_or_else(|| not_found_error(format!("Index {} not found", id)))
    }

    fn check_index_columns(&self, replacement: &IndexReplacement) -> Result<(), AppError> {
        self.require_table(replacement.table_id)?;
        for slot in &replacement.columns {
            match self.columns.get(&slot.column_id) {
                Some(column) if column.table_id == replacement.table_id => {}
                _ => {
                    return Err(reference_error(format!(
                        "Column {} does not belong to table {}",
                        slot.column_id, replacement.table_id
                    )))
                }
            }
        }
        Ok(())
    }

    // ----- relationships -----

    pub fn create_relationship(&mut self, draft: RelationshipDraft) -> Result<RelationshipId, AppError> {
        self.require_table(draft.start_table_id)?;
        self.require_table(draft.end_table_id)?;

        for pair in &draft.columns {
            self.check_column_owner(pair.start_column_id, draft.start_table_id)?;
            self.check_column_owner(pair.end_column_id, draft.end_table_id)?;
        }

        let id = RelationshipId(self.next_sequence()?);
        self.relationships.insert(
            id,
            Relationship {
                id,
                project_id: self.id,
                constraint_name: draft.constraint_name,
                start_table_id: draft.start_table_id,
                end_table_id: draft.end_table_id,
                columns: draft.columns,
            },
        );
        Ok(id)
    }

    pub fn delete_relationship(&mut self, id: RelationshipId) -> Result<Relationship, AppError> {
        self.relationships
            .shift_remove(&id)
            .ok_or_else(|| not_found_error(format!("Relationship {} not found", id)))
    }

    pub(super) fn check_column_owner(&self, column_id: ColumnId, table_id: TableId) -> Result<(), AppError> {
        match self.columns.get(&column_id) {
            Some(column) if column.table_id == table_id => Ok(()),
            Some(column) => Err(reference_error(format!(
                "Column {} belongs to table {}, not table {}",
                column_id, column.table_id, table_id
            ))),
            None => Err(reference_error(format!("Column {} does not exist", column_id))),
        }
    }
}

pub(super) fn sequence_exhausted() -> AppError {
    AppError::BadRequest("No identities left in this project".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{reconcile_columns, ColumnDraft, IndexDraft, plan_index};
    use crate::schema::model::RelationshipColumn;

    fn users_and_orders() -> (ProjectSchema, TableId, TableId) {
        let mut schema = ProjectSchema::new(ProjectId(1), "shop");
        let users = schema.create_table("users", None).unwrap();
        let orders = schema.create_table("orders", None).unwrap();
        reconcile_columns(
            &mut schema,
            users,
            &[ColumnDraft::new("id", "integer").primary_key().not_null()],
        )
        .unwrap();
        reconcile_columns(
            &mut schema,
            orders,
            &[
                ColumnDraft::new("id", "integer").primary_key().not_null(),
                ColumnDraft::new("user_id", "integer").not_null(),
            ],
        )
        .unwrap();
        (schema, users, orders)
    }

    fn column_id(schema: &ProjectSchema, table: TableId, name: &str) -> ColumnId {
        schema
            .columns_of(table)
            .into_iter()
            .find(|c| c.name == name)
            .map(|c| c.id)
            .unwrap()
    }

    fn link(schema: &mut ProjectSchema, users: TableId, orders: TableId) -> RelationshipId {
        let pair = RelationshipColumn::new(
            column_id(schema, users, "id"),
            column_id(schema, orders, "user_id"),
        );
        schema
            .create_relationship(RelationshipDraft {
                constraint_name: None,
                start_table_id: users,
                end_table_id: orders,
                columns: vec![pair],
            })
            .unwrap()
    }

    #[test]
    fn test_tables_keep_declaration_order() {
        let (schema, users, orders) = users_and_orders();
        let ids: Vec<TableId> = schema.tables().map(|t| t.id).collect();
        assert_eq!(ids, vec![users, orders]);
    }

    #[test]
    fn test_delete_table_cascades_to_everything_it_owns() {
        let (mut schema, users, orders) = users_and_orders();
        let rel = link(&mut schema, users, orders);
        let draft = IndexDraft {
            name: "idx_user".to_string(),
            is_unique: false,
            column_ids: vec![column_id(&schema, orders, "user_id")],
        };
        let replacement = plan_index(&schema, orders, &draft).unwrap();
        schema.create_index(replacement).unwrap();

        let removal = schema.delete_table(users).unwrap();

        assert_eq!(
            removal,
            TableRemoval { columns: 1, indexes: 0, relationships: 1 }
        );
        assert!(schema.relationship(rel).is_none());
        assert!(schema.relationships_ending_at(orders).is_empty());
        assert_eq!(schema.columns_of(users).len(), 0);
        assert_eq!(schema.indexes_of(orders).len(), 1);
    }

    #[test]
    fn test_back_references_are_resolved_by_lookup() {
        let (mut schema, users, orders) = users_and_orders();
        let rel = link(&mut schema, users, orders);

        assert_eq!(schema.relationships_starting_at(users)[0].id, rel);
        assert_eq!(schema.relationships_ending_at(orders)[0].id, rel);
        assert!(schema.relationships_starting_at(orders).is_empty());
    }

    #[test]
    fn test_relationship_rejects_column_from_wrong_table() {
        let (mut schema, users, orders) = users_and_orders();
        let pair = RelationshipColumn::new(
            column_id(&schema, orders, "id"),
            column_id(&schema, orders, "user_id"),
        );
        let result = schema.create_relationship(RelationshipDraft {
            constraint_name: None,
            start_table_id: users,
            end_table_id: orders,
            columns: vec![pair],
        });

        assert!(matches!(result, Err(AppError::Reference(_))));
        assert_eq!(schema.relationships().count(), 0);
    }

    #[test]
    fn test_deleting_a_column_drops_relationships_left_without_pairs() {
        let (mut schema, users, orders) = users_and_orders();
        let rel = link(&mut schema, users, orders);
        let id_col = column_id(&schema, orders, "id");

        reconcile_columns(
            &mut schema,
            orders,
            &[ColumnDraft::new("id", "integer").primary_key().not_null().with_id(id_col)],
        )
        .unwrap();

        assert!(schema.relationship(rel).is_none());
    }

    #[test]
    fn test_deleting_a_column_removes_it_from_indexes() {
        let (mut schema, _users, orders) = users_and_orders();
        let user_id = column_id(&schema, orders, "user_id");
        let id_col = column_id(&schema, orders, "id");
        let draft = IndexDraft {
            name: "idx_user".to_string(),
            is_unique: false,
            column_ids: vec![user_id],
        };
        let index_id = schema
            .create_index(plan_index(&schema, orders, &draft).unwrap())
            .unwrap();

        reconcile_columns(
            &mut schema,
            orders,
            &[ColumnDraft::new("id", "integer").primary_key().not_null().with_id(id_col)],
        )
        .unwrap();

        assert!(schema.index(index_id).unwrap().columns.is_empty());
    }

    #[test]
    fn test_rename_missing_table_is_not_found() {
        let mut schema = ProjectSchema::new(ProjectId(1), "empty");
        let result = schema.rename_table(TableId(99), "ghost");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
