//! Project models

use crate::schema::{ProjectSchema, ProjectSummary, Relationship, Table};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to create a new project
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Project name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "Project description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// Table entry of a project overview
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOverview {
    #[serde(flatten)]
    pub table: Table,
    pub column_count: usize,
    pub index_count: usize,
}

/// Project with its tables and relationships (columns are fetched per table)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub summary: ProjectSummary,
    pub tables: Vec<TableOverview>,
    pub relationships: Vec<Relationship>,
}

impl From<&ProjectSchema> for ProjectDetail {
    fn from(schema: &ProjectSchema) -> Self {
        let tables = schema
            .tables()
            .map(|table| TableOverview {
                table: table.clone(),
                column_count: schema.columns_of(table.id).len(),
                index_count: schema.indexes_of(table.id).len(),
            })
            .collect();

        Self {
            summary: schema.summary(),
            tables,
            relationships: schema.relationships().cloned().collect(),
        }
    }
}

/// Response containing list of projects
#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectSummary>,
}
