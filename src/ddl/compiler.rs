//! DDL Compiler
//!
//! Renders a project snapshot into one SQL script: every table first, then
//! every foreign key as an `ALTER TABLE`, so tables never need to be ordered
//! by dependency. Anything that cannot be rendered as a valid statement turns
//! into a `-- WARNING:` comment block instead of aborting the script.

use super::dialect::Dialect;
use crate::integrity::{inspect_relationship, ReferenceProblem, RelationshipInspection, ResolvedReference};
use crate::schema::{Column, ColumnId, Index, ProjectSchema, Relationship, Table, TableId};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::debug;

/// Outcome of rendering one statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Emitted(String),
    /// Not emitted; `disabled` holds the statement that would have been
    /// generated, if one could be formed
    Skipped {
        reason: String,
        disabled: Option<String>,
    },
}

impl Rendered {
    pub fn is_emitted(&self) -> bool {
        matches!(self, Rendered::Emitted(_))
    }

    /// SQL text: the statement itself, or a comment block. Every physical
    /// line of a comment block starts with `--`, whatever the names and
    /// types inside the reason contain.
    pub fn to_sql(&self) -> String {
        match self {
            Rendered::Emitted(sql) => sql.clone(),
            Rendered::Skipped { reason, disabled } => {
                let mut lines: Vec<String> = physical_lines(reason)
                    .enumerate()
                    .map(|(n, line)| {
                        if n == 0 {
                            format!("-- WARNING: {}", line)
                        } else {
                            format!("-- {}", line)
                        }
                    })
                    .collect();
                if lines.is_empty() {
                    lines.push("-- WARNING:".to_string());
                }
                if let Some(sql) = disabled {
                    lines.extend(physical_lines(sql).map(|line| format!("-- {}", line)));
                }
                lines.join("\n")
            }
        }
    }
}

/// Split on every line terminator a SQL client honours, dropping empty pieces
fn physical_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\r', '\n']).filter(|line| !line.is_empty())
}

/// A table statement plus warnings about indexes left out of it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSection {
    pub table_id: TableId,
    pub statement: Rendered,
    pub skipped_indexes: Vec<Rendered>,
}

/// The compiled script and what went into it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledScript {
    pub dialect: &'static str,
    pub script: String,
    /// SHA-256 of `script`, hex encoded
    pub checksum: String,
    pub tables_emitted: usize,
    pub tables_skipped: usize,
    pub indexes_skipped: usize,
    pub foreign_keys_emitted: usize,
    pub foreign_keys_skipped: usize,
}

pub struct DdlCompiler {
    dialect: Dialect,
}

impl DdlCompiler {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Compile a whole project. Never fails; problems become comments.
    pub fn compile(&self, schema: &ProjectSchema) -> CompiledScript {
        let sections: Vec<TableSection> = schema
            .tables()
            .map(|table| self.render_table(schema, table))
            .collect();

        let created: HashSet<TableId> = sections
            .iter()
            .filter(|s| s.statement.is_emitted())
            .map(|s| s.table_id)
            .collect();

        let foreign_keys: Vec<Rendered> = schema
            .relationships()
            .map(|relationship| self.render_foreign_key(schema, relationship, &created))
            .collect();

        let mut script = format!("{}\n\n", self.dialect.header_comment());

        let table_chunks: Vec<String> = sections
            .iter()
            .flat_map(|s| std::iter::once(&s.statement).chain(s.skipped_indexes.iter()))
            .map(Rendered::to_sql)
            .collect();
        if !table_chunks.is_empty() {
            script.push_str(&table_chunks.join("\n\n"));
            script.push_str("\n\n");
        }

        script.push_str("-- Foreign keys\n");
        for rendered in &foreign_keys {
            script.push_str(&rendered.to_sql());
            script.push('\n');
        }

        let tables_emitted = created.len();
        let foreign_keys_emitted = foreign_keys.iter().filter(|r| r.is_emitted()).count();
        let compiled = CompiledScript {
            dialect: self.dialect.name,
            checksum: checksum(&script),
            script,
            tables_emitted,
            tables_skipped: sections.len() - tables_emitted,
            indexes_skipped: sections.iter().map(|s| s.skipped_indexes.len()).sum(),
            foreign_keys_emitted,
            foreign_keys_skipped: foreign_keys.len() - foreign_keys_emitted,
        };

        debug!(
            "Compiled project {}: {} tables ({} skipped), {} foreign keys ({} skipped)",
            schema.id(),
            compiled.tables_emitted,
            compiled.tables_skipped,
            compiled.foreign_keys_emitted,
            compiled.foreign_keys_skipped
        );

        compiled
    }

    /// Render one `CREATE TABLE` statement
    pub fn render_table(&self, schema: &ProjectSchema, table: &Table) -> TableSection {
        let skip = |reason: String| TableSection {
            table_id: table.id,
            statement: Rendered::Skipped {
                reason,
                disabled: None,
            },
            skipped_indexes: Vec::new(),
        };

        if table.name.trim().is_empty() {
            return skip(format!("table #{} has no name and was not created.", table.id));
        }

        let columns = schema.columns_of(table.id);
        if columns.is_empty() {
            return skip(format!(
                "table {} has no columns and was not created.",
                self.dialect.quote_identifier(&table.name)
            ));
        }
        if columns.iter().any(|c| c.name.trim().is_empty()) {
            return skip(format!(
                "table {} has a column without a name and was not created.",
                self.dialect.quote_identifier(&table.name)
            ));
        }

        if let Some(column) = columns
            .iter()
            .find(|c| self.dialect.render_type(&c.data_type).is_none())
        {
            return skip(format!(
                "column {} of table {} has type {:?}, which cannot be rendered; the table was not created.",
                self.dialect.quote_identifier(&column.name),
                self.dialect.quote_identifier(&table.name),
                column.data_type
            ));
        }

        let mut lines: Vec<String> = columns.iter().map(|c| self.column_line(c)).collect();

        let primary_key: Vec<ColumnId> = columns
            .iter()
            .filter(|c| c.is_primary_key)
            .map(|c| c.id)
            .collect();
        if !primary_key.is_empty() {
            lines.push(format!(
                "  PRIMARY KEY ({})",
                self.column_list(schema, &primary_key)
            ));
        }

        let mut skipped_indexes = Vec::new();
        for index in schema.indexes_of(table.id) {
            let column_ids = self.resolvable_index_columns(schema, table, index);
            if column_ids.is_empty() {
                skipped_indexes.push(Rendered::Skipped {
                    reason: format!(
                        "index {} on {} has no columns and was skipped.",
                        self.dialect.quote_identifier(&index.name),
                        self.dialect.quote_identifier(&table.name)
                    ),
                    disabled: None,
                });
                continue;
            }
            if column_ids == primary_key {
                continue;
            }

            let kind = if index.is_unique { "UNIQUE INDEX" } else { "INDEX" };
            let name = if index.name.trim().is_empty() {
                String::new()
            } else {
                format!(" {}", self.dialect.quote_identifier(&index.name))
            };
            lines.push(format!(
                "  {}{} ({})",
                kind,
                name,
                self.column_list(schema, &column_ids)
            ));
        }

        let statement = format!(
            "CREATE TABLE {} (\n{}\n) ENGINE={} DEFAULT CHARSET={};",
            self.dialect.quote_identifier(&table.name),
            lines.join(",\n"),
            self.dialect.engine,
            self.dialect.charset
        );

        TableSection {
            table_id: table.id,
            statement: Rendered::Emitted(statement),
            skipped_indexes,
        }
    }

    /// Render one foreign key. `created` holds the tables whose `CREATE TABLE`
    /// was emitted; constraints touching any other table are skipped.
    pub fn render_foreign_key(
        &self,
        schema: &ProjectSchema,
        relationship: &Relationship,
        created: &HashSet<TableId>,
    ) -> Rendered {
        let (reference, problems) = match inspect_relationship(schema, relationship) {
            RelationshipInspection::NoColumns => {
                return Rendered::Skipped {
                    reason: format!(
                        "relationship {} has no columns; no foreign key generated.",
                        relationship.id
                    ),
                    disabled: None,
                }
            }
            RelationshipInspection::Dangling { column_id } => {
                return Rendered::Skipped {
                    reason: format!(
                        "relationship {} references missing column {}; no foreign key generated.",
                        relationship.id, column_id
                    ),
                    disabled: None,
                }
            }
            RelationshipInspection::Resolved { reference, problems } => (reference, problems),
        };

        let statement = self.alter_table_sql(&reference);

        let mut reasons: Vec<String> = problems
            .iter()
            .map(|problem| self.describe_problem(&reference, *problem))
            .collect();
        for table in [reference.end_table, reference.start_table] {
            if !created.contains(&table.id) {
                reasons.push(format!("table #{} was not created", table.id));
            }
        }

        if reasons.is_empty() {
            Rendered::Emitted(statement)
        } else {
            Rendered::Skipped {
                reason: format!("Cannot create foreign key: {}.", reasons.join("; ")),
                disabled: Some(statement),
            }
        }
    }

    fn alter_table_sql(&self, reference: &ResolvedReference<'_>) -> String {
        let q = |name: &str| self.dialect.quote_identifier(name);
        format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({});",
            q(&reference.end_table.name),
            q(&reference.constraint_name()),
            q(&reference.end_column.name),
            q(&reference.start_table.name),
            q(&reference.start_column.name)
        )
    }

    fn describe_problem(&self, reference: &ResolvedReference<'_>, problem: ReferenceProblem) -> String {
        let q = |name: &str| self.dialect.quote_identifier(name);
        match problem {
            ReferenceProblem::TypeMismatch => format!(
                "{}.{} ({}) does not match the type of {}.{} ({})",
                q(&reference.end_table.name),
                q(&reference.end_column.name),
                reference.end_column.data_type,
                q(&reference.start_table.name),
                q(&reference.start_column.name),
                reference.start_column.data_type
            ),
            ReferenceProblem::NotReferenceable => format!(
                "target column {}.{} is neither UNIQUE nor PRIMARY KEY",
                q(&reference.start_table.name),
                q(&reference.start_column.name)
            ),
        }
    }

    fn column_line(&self, column: &Column) -> String {
        let mut line = format!(
            "  {} {}",
            self.dialect.quote_identifier(&column.name),
            self.dialect.map_type(&column.data_type)
        );

        line.push_str(if column.is_nullable { " NULL" } else { " NOT NULL" });

        if column.is_unique && !column.is_primary_key {
            line.push_str(" UNIQUE");
        }

        if let Some(default) = &column.default_value {
            line.push_str(&format!(" DEFAULT {}", self.dialect.default_literal(default)));
        }

        line
    }

    /// Index columns in index order, restricted to columns of the table
    fn resolvable_index_columns(&self, schema: &ProjectSchema, table: &Table, index: &Index) -> Vec<ColumnId> {
        index
            .ordered_column_ids()
            .into_iter()
            .filter(|id| schema.column(*id).is_some_and(|c| c.table_id == table.id))
            .collect()
    }

    fn column_list(&self, schema: &ProjectSchema, ids: &[ColumnId]) -> String {
        ids.iter()
            .filter_map(|id| schema.column(*id))
            .map(|c| self.dialect.quote_identifier(&c.name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for DdlCompiler {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

fn checksum(script: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(script.as_bytes());
    format!("{:x}", hasher.finalize())
}
