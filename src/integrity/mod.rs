//! Integrity Validator
//!
//! Structural and referential checks over a project snapshot:
//! - Rule catalog with fixed ids and severities
//! - Shared relationship inspection (also used by the DDL compiler)
//! - The validator producing ordered errors and warnings

pub mod reference;
pub mod rules;
pub mod validator;

pub use reference::{inspect_relationship, is_unique_referenceable, ReferenceProblem, RelationshipInspection, ResolvedReference};
pub use rules::{Finding, Rule, RuleCode, RuleKind, Severity};
pub use validator::{IntegrityValidator, ValidationReport};
