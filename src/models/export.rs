//! Validation and export models

use crate::ddl::CompiledScript;
use crate::integrity::{Rule, ValidationReport};
use serde::Serialize;

/// Compiled script together with the validation report of the same snapshot.
/// The caller decides whether to use the script when the report has errors.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub ddl: CompiledScript,
    pub validation: ValidationReport,
}

#[derive(Debug, Serialize)]
pub struct RuleListResponse {
    pub rules: Vec<Rule>,
}
