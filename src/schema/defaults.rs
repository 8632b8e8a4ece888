//! Default-value classification
//!
//! Raw default strings are never parsed. Two small predicates decide how a
//! default is treated; both are heuristics and are kept here so a real
//! expression parser can replace them in one place.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+(\.[0-9]+)?$").expect("numeric literal pattern"));

/// A default containing an opening parenthesis is taken to be a function
/// call or expression (`UUID()`, `nextval('seq')`), anything else a literal.
pub fn is_expression_default(raw: &str) -> bool {
    raw.contains('(')
}

/// Non-blank default that is not an expression.
pub fn is_static_default(raw: &str) -> bool {
    !raw.trim().is_empty() && !is_expression_default(raw)
}

/// Literal that can be emitted unquoted: optional sign, ASCII digits, optional fraction.
pub fn is_numeric_literal(raw: &str) -> bool {
    NUMERIC_LITERAL.is_match(raw)
}
