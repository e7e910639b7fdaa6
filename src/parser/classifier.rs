//! Regex-based schema object classification
//!
//! Each statement is matched against a fixed list of `CREATE <KEYWORD> <name>`
//! patterns. The patterns search the whole statement, so a procedure whose
//! body contains `CREATE TABLE dbo.X` is classified as a table: the list order
//! decides, not the position of the match.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::{SchemaObject, SchemaObjectType};

/// Schema assumed when a name carries no `schema.` qualifier
pub const DEFAULT_SCHEMA: &str = "dbo";

/// Optionally bracketed, optionally schema-qualified object name
const QUALIFIED_NAME: &str = r"(?:\[?(?P<schema>\w+)\]?\.)?\[?(?P<name>\w+)\]?";

/// Patterns in match priority order. First match wins.
static CREATE_PATTERNS: LazyLock<Vec<(SchemaObjectType, Regex)>> = LazyLock::new(|| {
    let qualified = |keyword: &str| {
        Regex::new(&format!(r"(?i)CREATE\s+{}\s+{}", keyword, QUALIFIED_NAME)).unwrap()
    };
    vec![
        (
            SchemaObjectType::Schema,
            Regex::new(r"(?i)CREATE\s+SCHEMA\s+\[?(?P<name>\w+)\]?").unwrap(),
        ),
        (SchemaObjectType::Table, qualified("TABLE")),
        (SchemaObjectType::View, qualified("VIEW")),
        (SchemaObjectType::StoredProcedure, qualified("(?:PROC|PROCEDURE)")),
        (SchemaObjectType::Function, qualified("FUNCTION")),
    ]
});

/// Classify a statement, defaulting unqualified names to `dbo`.
pub fn classify_statement(sql: &str, file_path: Option<&Path>) -> Option<SchemaObject> {
    classify_statement_in_schema(sql, file_path, DEFAULT_SCHEMA)
}

/// Classify a statement into a [`SchemaObject`].
///
/// Returns `None` for anything that is not a recognized `CREATE` (ALTER, DROP,
/// INSERT, GRANT, CREATE INDEX, ...). Never fails.
pub fn classify_statement_in_schema(
    sql: &str,
    file_path: Option<&Path>,
    default_schema: &str,
) -> Option<SchemaObject> {
    let trimmed = sql.trim();

    CREATE_PATTERNS.iter().find_map(|(object_type, pattern)| {
        let caps = pattern.captures(trimmed)?;
        let name = caps.name("name")?.as_str();
        let schema = caps
            .name("schema")
            .map(|m| m.as_str())
            .unwrap_or(default_schema);

        let object = SchemaObject::new(name, *object_type, schema, sql);
        Some(match file_path {
            Some(path) => object.with_file_path(path),
            None => object,
        })
    })
}
