//! Schema Store
//!
//! In-memory persistence for project graphs. Each project sits behind its own
//! write lock; a mutation runs against a working copy and is committed only
//! when it succeeds, so a failed request never leaves a partial change behind.

use crate::error::{not_found_error, AppError};
use crate::schema::{ProjectId, ProjectSchema, ProjectSummary, SchemaDocument};
use indexmap::IndexMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

type ProjectHandle = Arc<RwLock<ProjectSchema>>;

/// Store for all project graphs
pub struct SchemaStore {
    /// Project ID -> graph, in creation order
    projects: RwLock<IndexMap<ProjectId, ProjectHandle>>,
    next_id: AtomicI64,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(IndexMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Create an empty project
    pub async fn create_project(&self, name: impl Into<String>, description: Option<String>) -> ProjectSummary {
        let id = ProjectId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let mut schema = ProjectSchema::new(id, name);
        schema.set_description(description);
        let summary = schema.summary();

        self.projects
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(schema)));

        info!("Created project {} '{}'", id, summary.name);
        summary
    }

    /// Create a project and load a document into it in one step
    pub async fn import_project(&self, document: SchemaDocument) -> Result<ProjectSummary, AppError> {
        let id = ProjectId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let schema = ProjectSchema::from_document(id, document)?;
        let summary = schema.summary();

        self.projects
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(schema)));

        info!(
            "Imported project {} '{}': {} tables, {} relationships",
            id, summary.name, summary.table_count, summary.relationship_count
        );
        Ok(summary)
    }

    pub async fn list_projects(&self) -> Vec<ProjectSummary> {
        let handles: Vec<ProjectHandle> = self.projects.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            summaries.push(handle.read().await.summary());
        }
        summaries
    }

    pub async fn delete_project(&self, id: ProjectId) -> Result<(), AppError> {
        self.projects
            .write()
            .await
            .shift_remove(&id)
            .ok_or_else(|| project_not_found(id))?;

        info!("Deleted project {}", id);
        Ok(())
    }

    /// Run a read-only computation against the current graph
    pub async fn read<F, R>(&self, id: ProjectId, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&ProjectSchema) -> R,
    {
        let handle = self.handle(id).await?;
        let schema = handle.read().await;
        Ok(f(&schema))
    }

    /// Owned copy of the current graph
    pub async fn snapshot(&self, id: ProjectId) -> Result<ProjectSchema, AppError> {
        self.read(id, ProjectSchema::clone).await
    }

    /// Apply a mutation atomically.
    ///
    /// Writers of the same project are serialized by its lock. The mutation
    /// sees a working copy; the copy replaces the stored graph only on `Ok`.
    pub async fn write<F, R>(&self, id: ProjectId, f: F) -> Result<R, AppError>
    where
        F: FnOnce(&mut ProjectSchema) -> Result<R, AppError>,
    {
        let handle = self.handle(id).await?;
        let mut schema = handle.write().await;

        let mut working = schema.clone();
        let result = f(&mut working);
        match &result {
            Ok(_) => {
                *schema = working;
                debug!("Committed change to project {}", id);
            }
            Err(e) => debug!("Discarded change to project {}: {}", id, e),
        }
        result
    }

    /// Replace a project's graph with a loaded document, keeping its identity
    pub async fn load_document(&self, id: ProjectId, document: SchemaDocument) -> Result<ProjectSummary, AppError> {
        let loaded = ProjectSchema::from_document(id, document)?;
        let summary = loaded.summary();

        let handle = self.handle(id).await?;
        *handle.write().await = loaded;

        info!(
            "Loaded document into project {}: {} tables, {} columns, {} relationships",
            id, summary.table_count, summary.column_count, summary.relationship_count
        );
        Ok(summary)
    }

    pub async fn document(&self, id: ProjectId) -> Result<SchemaDocument, AppError> {
        self.read(id, ProjectSchema::to_document).await
    }

    async fn handle(&self, id: ProjectId) -> Result<ProjectHandle, AppError> {
        self.projects
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| project_not_found(id))
    }
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new()
    }
}

fn project_not_found(id: ProjectId) -> AppError {
    not_found_error(format!("Project {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::reference_error;
    use crate::reconcile::{reconcile_columns, ColumnDraft};
    use crate::schema::{ColumnId, TableId};

    #[tokio::test]
    async fn test_create_and_list_projects() {
        let store = SchemaStore::new();
        let a = store.create_project("alpha", None).await;
        let b = store.create_project("beta", None).await;

        let names: Vec<String> = store.list_projects().await.into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_description_is_kept_and_blank_is_dropped() {
        let store = SchemaStore::new();
        let described = store
            .create_project("billing", Some("Invoices and payments".to_string()))
            .await;
        let blank = store.create_project("misc", Some("   ".to_string())).await;

        assert_eq!(described.description.as_deref(), Some("Invoices and payments"));
        assert_eq!(blank.description, None);

        let document = store.document(described.id).await.unwrap();
        assert_eq!(document.description.as_deref(), Some("Invoices and payments"));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_graph_untouched() {
        let store = SchemaStore::new();
        let project = store.create_project("shop", None).await;

        let table: TableId = store
            .write(project.id, |schema| schema.create_table("users", None))
            .await
            .unwrap();

        let result: Result<(), AppError> = store
            .write(project.id, |schema| {
                schema.rename_table(table, "customers")?;
                Err(reference_error("abort"))
            })
            .await;
        assert!(matches!(result, Err(AppError::Reference(_))));

        let name = store
            .read(project.id, |schema| schema.table(table).map(|t| t.name.clone()))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("users"));
    }

    #[tokio::test]
    async fn test_foreign_column_in_reconcile_writes_nothing() {
        let store = SchemaStore::new();
        let project = store.create_project("shop", None).await;

        let (users, orders) = store
            .write(project.id, |schema| {
                let users = schema.create_table("users", None)?;
                let orders = schema.create_table("orders", None)?;
                reconcile_columns(schema, users, &[ColumnDraft::new("id", "integer")])?;
                Ok((users, orders))
            })
            .await
            .unwrap();

        let foreign: ColumnId = store
            .read(project.id, |schema| schema.columns_of(users)[0].id)
            .await
            .unwrap();

        let result = store
            .write(project.id, |schema| {
                reconcile_columns(
                    schema,
                    orders,
                    &[
                        ColumnDraft::new("total", "numeric"),
                        ColumnDraft::new("id", "integer").with_id(foreign),
                    ],
                )
            })
            .await;
        assert!(matches!(result, Err(AppError::Reference(_))));

        let order_columns = store
            .read(project.id, |schema| schema.columns_of(orders).len())
            .await
            .unwrap();
        assert_eq!(order_columns, 0);
    }

    #[tokio::test]
    async fn test_concurrent_writes_are_serialized() {
        let store = Arc::new(SchemaStore::new());
        let project = store.create_project("busy", None).await;

        let mut tasks = Vec::new();
        for n in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .write(project.id, move |schema| schema.create_table(format!("t{}", n), None))
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let summary = store.read(project.id, ProjectSchema::summary).await.unwrap();
        assert_eq!(summary.table_count, 16);
    }

    #[tokio::test]
    async fn test_document_load_and_read_back() {
        let store = SchemaStore::new();
        let project = store.create_project("docs", None).await;
        let document: SchemaDocument = serde_json::from_str(
            r#"{"name": "docs", "tables": [
                {"id": 1, "name": "users", "columns": [
                    {"id": 2, "name": "id", "dataType": "integer", "isPrimaryKey": true}
                ]}
            ]}"#,
        )
        .unwrap();

        let summary = store.load_document(project.id, document).await.unwrap();
        assert_eq!(summary.id, project.id);
        assert_eq!(summary.column_count, 1);

        let read_back = store.document(project.id).await.unwrap();
        assert_eq!(read_back.tables[0].name, "users");
    }

    #[tokio::test]
    async fn test_unknown_project_is_not_found() {
        let store = SchemaStore::new();
        assert!(matches!(
            store.delete_project(ProjectId(42)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.snapshot(ProjectId(42)).await,
            Err(AppError::NotFound(_))
        ));
    }
}
