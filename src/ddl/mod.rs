//! DDL Compiler
//!
//! Turns a project snapshot into a MySQL-flavoured creation script.

pub mod compiler;
pub mod dialect;

pub use compiler::{CompiledScript, DdlCompiler, Rendered, TableSection};
pub use dialect::{Dialect, TypeMatch, TypeRule, MYSQL_TYPE_RULES};
