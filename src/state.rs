//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::config::Settings;
use crate::ddl::{DdlCompiler, Dialect};
use crate::integrity::IntegrityValidator;
use crate::store::SchemaStore;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Project graphs
    pub store: SchemaStore,

    /// Stateless; shared by the validate and export routes
    pub validator: IntegrityValidator,

    pub compiler: DdlCompiler,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            store: SchemaStore::new(),
            validator: IntegrityValidator::new(),
            compiler: DdlCompiler::new(Dialect::from(&settings.export)),
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
