//! Column/Index Reconciler
//!
//! Turns the editor's "desired state" of a table's columns (or of one index)
//! into the exact set of inserts, updates and deletes against the stored
//! graph. Planning is pure; applying a plan either succeeds completely or
//! leaves the graph untouched.

pub mod columns;
pub mod indexes;

pub use columns::{plan_columns, reconcile_columns, ColumnChangeSet, ColumnChangeSummary, ColumnDraft, ColumnUpdate};
pub use indexes::{create_index, plan_index, replace_index, IndexDraft, IndexReplacement};
