//! Integrity rule catalog
//!
//! Every check the validator performs has a fixed id, a kind and a severity.
//! The catalog is listed over the API so editors can explain findings.

use serde::{Deserialize, Serialize};

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory; export may proceed after confirmation
    Warning,
    /// Blocks export
    Error,
}

/// What class of inconsistency a rule detects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Structural,
    Referential,
    Advisory,
}

/// Identifies one integrity rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCode {
    BlankTableName,
    DuplicateTableName,
    TableWithoutColumns,
    BlankColumnName,
    DuplicateColumnName,
    MissingPrimaryKey,
    StaticPrimaryKeyDefault,
    EmptyIndex,
    ForeignKeyTypeMismatch,
    UnreferenceableTarget,
    DanglingRelationshipColumn,
}

impl RuleCode {
    pub const ALL: [RuleCode; 11] = [
        RuleCode::BlankTableName,
        RuleCode::DuplicateTableName,
        RuleCode::TableWithoutColumns,
        RuleCode::BlankColumnName,
        RuleCode::DuplicateColumnName,
        RuleCode::MissingPrimaryKey,
        RuleCode::StaticPrimaryKeyDefault,
        RuleCode::EmptyIndex,
        RuleCode::ForeignKeyTypeMismatch,
        RuleCode::UnreferenceableTarget,
        RuleCode::DanglingRelationshipColumn,
    ];

    pub fn id(self) -> &'static str {
        match self {
            RuleCode::BlankTableName => "V001",
            RuleCode::DuplicateTableName => "V002",
            RuleCode::TableWithoutColumns => "V003",
            RuleCode::BlankColumnName => "V004",
            RuleCode::DuplicateColumnName => "V005",
            RuleCode::MissingPrimaryKey => "V006",
            RuleCode::StaticPrimaryKeyDefault => "V007",
            RuleCode::EmptyIndex => "V008",
            RuleCode::ForeignKeyTypeMismatch => "V009",
            RuleCode::UnreferenceableTarget => "V010",
            RuleCode::DanglingRelationshipColumn => "V011",
        }
    }

    pub fn kind(self) -> RuleKind {
        match self {
            RuleCode::BlankTableName
            | RuleCode::DuplicateTableName
            | RuleCode::TableWithoutColumns
            | RuleCode::BlankColumnName
            | RuleCode::DuplicateColumnName
            | RuleCode::EmptyIndex => RuleKind::Structural,
            RuleCode::ForeignKeyTypeMismatch
            | RuleCode::UnreferenceableTarget
            | RuleCode::DanglingRelationshipColumn => RuleKind::Referential,
            RuleCode::MissingPrimaryKey | RuleCode::StaticPrimaryKeyDefault => RuleKind::Advisory,
        }
    }

    pub fn severity(self) -> Severity {
        match self.kind() {
            RuleKind::Advisory => Severity::Warning,
            RuleKind::Structural | RuleKind::Referential => Severity::Error,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RuleCode::BlankTableName => "Blank Table Name",
            RuleCode::DuplicateTableName => "Duplicate Table Name",
            RuleCode::TableWithoutColumns => "Table Without Columns",
            RuleCode::BlankColumnName => "Blank Column Name",
            RuleCode::DuplicateColumnName => "Duplicate Column Name",
            RuleCode::MissingPrimaryKey => "Missing Primary Key",
            RuleCode::StaticPrimaryKeyDefault => "Static Primary Key Default",
            RuleCode::EmptyIndex => "Empty Index",
            RuleCode::ForeignKeyTypeMismatch => "Foreign Key Type Mismatch",
            RuleCode::UnreferenceableTarget => "Unreferenceable Foreign Key Target",
            RuleCode::DanglingRelationshipColumn => "Dangling Relationship Column",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RuleCode::BlankTableName => "Every table needs a non-blank name",
            RuleCode::DuplicateTableName => "Table names must be unique within a project",
            RuleCode::TableWithoutColumns => "A table must have at least one column",
            RuleCode::BlankColumnName => "Every column needs a non-blank name",
            RuleCode::DuplicateColumnName => "Column names must be unique within a table",
            RuleCode::MissingPrimaryKey => "Warn when a table has no primary key column",
            RuleCode::StaticPrimaryKeyDefault => {
                "Warn when a primary key column has a literal default, which collides on the second insert"
            }
            RuleCode::EmptyIndex => "An index must cover at least one column",
            RuleCode::ForeignKeyTypeMismatch => {
                "Referenced and referencing columns must have the same data type"
            }
            RuleCode::UnreferenceableTarget => {
                "A referenced column must be a primary key, unique, or the only column of a unique index"
            }
            RuleCode::DanglingRelationshipColumn => {
                "A relationship must point at columns that exist"
            }
        }
    }
}

/// Catalog entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub kind: RuleKind,
    pub severity: Severity,
}

impl From<RuleCode> for Rule {
    fn from(code: RuleCode) -> Self {
        Self {
            id: code.id(),
            name: code.name(),
            description: code.description(),
            kind: code.kind(),
            severity: code.severity(),
        }
    }
}

/// One problem found in a schema
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub rule_id: &'static str,
    pub kind: RuleKind,
    pub severity: Severity,
    pub message: String,
    /// Dotted path of the offending object, e.g. `orders.user_id`
    pub object: String,
}

impl Finding {
    pub fn new(code: RuleCode, object: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule_id: code.id(),
            kind: code.kind(),
            severity: code.severity(),
            message: message.into(),
            object: object.into(),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rule_ids_are_unique() {
        let ids: HashSet<&str> = RuleCode::ALL.iter().map(|c| c.id()).collect();
        assert_eq!(ids.len(), RuleCode::ALL.len());
    }

    #[test]
    fn test_only_advisory_rules_are_warnings() {
        for code in RuleCode::ALL {
            let expected = if code.kind() == RuleKind::Advisory {
                Severity::Warning
            } else {
                Severity::Error
            };
            assert_eq!(code.severity(), expected, "{}", code.id());
        }
    }
}
