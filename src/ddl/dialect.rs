//! Target dialect
//!
//! Type mapping, identifier quoting and literal encoding for the one DDL
//! dialect the compiler targets (MySQL-flavoured). Type mapping is a table,
//! not a chain of conditionals: adding a type means adding a rule.

use crate::config::ExportConfig;
use crate::schema::defaults::is_numeric_literal;
use once_cell::sync::Lazy;
use regex::Regex;

/// Shape of a type tag that may be passed through verbatim:
/// words, then an optional numeric argument list (`decimal(10, 2)`).
static PASSTHROUGH_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_ ]*(\([0-9]+( *, *[0-9]+)*\))?( [A-Za-z ]+)?$")
        .expect("passthrough type pattern")
});

/// How a rule recognises a type tag (matched against the lowercased tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMatch {
    Contains(&'static str),
    Exact(&'static str),
}

impl TypeMatch {
    fn matches(self, tag: &str) -> bool {
        match self {
            TypeMatch::Contains(needle) => tag.contains(needle),
            TypeMatch::Exact(name) => tag == name,
        }
    }
}

/// One entry of the type mapping table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeRule {
    pub matcher: TypeMatch,
    pub sql: &'static str,
}

impl TypeRule {
    pub const fn contains(needle: &'static str, sql: &'static str) -> Self {
        Self {
            matcher: TypeMatch::Contains(needle),
            sql,
        }
    }

    pub const fn exact(name: &'static str, sql: &'static str) -> Self {
        Self {
            matcher: TypeMatch::Exact(name),
            sql,
        }
    }
}

/// First match wins; unmatched tags pass through uppercased.
pub const MYSQL_TYPE_RULES: &[TypeRule] = &[
    TypeRule::contains("varchar", "VARCHAR(255)"),
    TypeRule::contains("integer", "INT"),
    TypeRule::contains("timestamp", "DATETIME"),
];

#[derive(Debug, Clone)]
pub struct Dialect {
    pub name: &'static str,
    pub engine: String,
    pub charset: String,
    pub header: String,
    type_rules: Vec<TypeRule>,
}

impl Dialect {
    pub fn mysql() -> Self {
        let defaults = ExportConfig::default();
        Self {
            name: "mysql",
            engine: defaults.engine,
            charset: defaults.charset,
            header: defaults.header,
            type_rules: MYSQL_TYPE_RULES.to_vec(),
        }
    }

    /// Append a mapping rule; it is consulted after the existing ones
    pub fn with_type_rule(mut self, rule: TypeRule) -> Self {
        self.type_rules.push(rule);
        self
    }

    pub fn type_rules(&self) -> &[TypeRule] {
        &self.type_rules
    }

    /// Map a canonical type tag to this dialect's SQL type
    pub fn map_type(&self, tag: &str) -> String {
        self.render_type(tag)
            .unwrap_or_else(|| tag.trim().to_uppercase())
    }

    /// Like [`Dialect::map_type`], but `None` when an unmapped tag is not
    /// a plain type name and would change the statement it is placed in.
    pub fn render_type(&self, tag: &str) -> Option<String> {
        let lowered = tag.trim().to_lowercase();
        if let Some(rule) = self.type_rules.iter().find(|rule| rule.matcher.matches(&lowered)) {
            return Some(rule.sql.to_string());
        }
        let trimmed = tag.trim();
        PASSTHROUGH_TYPE
            .is_match(trimmed)
            .then(|| trimmed.to_uppercase())
    }

    /// Backtick-quote an identifier, doubling embedded backticks
    pub fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    /// Encode a raw default: numeric-looking values unquoted, everything else
    /// single-quoted with embedded quotes doubled
    pub fn default_literal(&self, raw: &str) -> String {
        if is_numeric_literal(raw) {
            raw.to_string()
        } else {
            format!("'{}'", raw.replace('\'', "''"))
        }
    }

    /// Header as SQL comment lines; every line of a multi-line header is commented
    pub fn header_comment(&self) -> String {
        let lines: Vec<String> = self
            .header
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| {
                if line.starts_with("--") {
                    line.to_string()
                } else {
                    format!("-- {}", line)
                }
            })
            .collect();

        if lines.is_empty() {
            "--".to_string()
        } else {
            lines.join("\n")
        }
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::mysql()
    }
}

impl From<&ExportConfig> for Dialect {
    fn from(config: &ExportConfig) -> Self {
        Self {
            engine: config.engine.clone(),
            charset: config.charset.clone(),
            header: config.header.clone(),
            ..Self::mysql()
        }
    }
}
