//! Schema Model
//!
//! The relational design a user edits: tables, columns, indexes and the
//! relationships between them, held per project in an identity-keyed arena.

pub mod defaults;
pub mod document;
pub mod ids;
pub mod model;
pub mod project;

pub use document::{ColumnDocument, IndexDocument, RelationshipDocument, SchemaDocument, TableDocument};
pub use ids::{ColumnId, IndexId, ProjectId, RelationshipId, TableId};
pub use model::{
    Column, Index, IndexColumn, PortSide, Relationship, RelationshipColumn, RelationshipDraft, Table,
};
pub use project::{ProjectSchema, ProjectSummary, TableRemoval};
