//! SchemaForge - relational schema modelling core
//!
//! Holds a designer's tables, columns, indexes and relationships per project
//! and provides three operations over them:
//! - Reconcile: apply the editor's desired column/index state as a minimal diff
//! - Validate: report structural and referential problems
//! - Compile: render the schema to a MySQL-flavoured DDL script

pub mod config;
pub mod ddl;
pub mod error;
pub mod integrity;
pub mod models;
pub mod reconcile;
pub mod routes;
pub mod schema;
pub mod state;
pub mod store;
