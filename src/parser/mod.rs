//! SQL statement splitting and schema object classification

mod classifier;
mod source;
mod splitter;

pub use classifier::{classify_statement, classify_statement_in_schema, DEFAULT_SCHEMA};
pub use source::{
    find_sql_files, parse_sql, parse_sql_file, parse_sql_files, read_sql_file, ParsedSql,
    SkippedStatement,
};
pub use splitter::{split_statements, strip_comments};
