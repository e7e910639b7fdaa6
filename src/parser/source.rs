//! Reading SQL sources into classified objects

use std::path::{Path, PathBuf};

use anyhow::Result;
use encoding_rs::WINDOWS_1252;
use tracing::{debug, warn};

use super::classifier::classify_statement_in_schema;
use super::splitter::split_statements;
use crate::error::DeployError;
use crate::model::SchemaObject;
use crate::util::{has_extension_ci, statement_preview};

/// A statement that matched no `CREATE` pattern
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStatement {
    pub file_path: Option<PathBuf>,
    /// First line of the statement
    pub preview: String,
}

impl SkippedStatement {
    pub fn warning(&self) -> String {
        match &self.file_path {
            Some(path) => format!(
                "Skipped unrecognized statement in {}: {}",
                path.display(),
                self.preview
            ),
            None => format!("Skipped unrecognized statement: {}", self.preview),
        }
    }
}

/// Objects and skipped statements collected from one or more sources
#[derive(Debug, Clone, Default)]
pub struct ParsedSql {
    pub objects: Vec<SchemaObject>,
    pub skipped: Vec<SkippedStatement>,
}

impl ParsedSql {
    pub fn extend(&mut self, other: ParsedSql) {
        self.objects.extend(other.objects);
        self.skipped.extend(other.skipped);
    }

    /// One warning per skipped statement, in source order
    pub fn warnings(&self) -> Vec<String> {
        self.skipped.iter().map(SkippedStatement::warning).collect()
    }
}

/// Split and classify SQL text. Unrecognized statements land in `skipped`.
pub fn parse_sql(content: &str, file_path: Option<&Path>, default_schema: &str) -> ParsedSql {
    let mut parsed = ParsedSql::default();

    for statement in split_statements(content) {
        match classify_statement_in_schema(&statement, file_path, default_schema) {
            Some(object) => {
                debug!(
                    object_type = %object.object_type,
                    name = %object.qualified_name(),
                    "classified statement"
                );
                parsed.objects.push(object);
            }
            None => {
                let preview = statement_preview(&statement);
                debug!(statement = %preview, "skipping unrecognized statement");
                parsed.skipped.push(SkippedStatement {
                    file_path: file_path.map(Path::to_path_buf),
                    preview,
                });
            }
        }
    }

    parsed
}

/// Parse a single SQL file
pub fn parse_sql_file(path: &Path, default_schema: &str) -> Result<ParsedSql> {
    let content = read_sql_file(path)?;
    Ok(parse_sql(&content, Some(path), default_schema))
}

/// Parse several SQL files in order.
///
/// A file that cannot be read is logged and reported as a warning string;
/// the remaining files are still parsed.
pub fn parse_sql_files(files: &[PathBuf], default_schema: &str) -> (ParsedSql, Vec<String>) {
    let mut parsed = ParsedSql::default();
    let mut failures = Vec::new();

    for file in files {
        match parse_sql_file(file, default_schema) {
            Ok(file_parsed) => parsed.extend(file_parsed),
            Err(e) => {
                warn!(path = %file.display(), error = %e, "failed to parse SQL file");
                failures.push(format!("Failed to parse SQL file {}: {:#}", file.display(), e));
            }
        }
    }

    (parsed, failures)
}

/// Read a SQL file, stripping a UTF-8 BOM and falling back to Windows-1252
pub fn read_sql_file(path: &Path) -> Result<String, DeployError> {
    let bytes = std::fs::read(path).map_err(|e| DeployError::SqlFileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let content = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            // Common for SQL files saved by older Windows tooling
            let bytes = e.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                return Err(DeployError::SqlFileRead {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        "File contains invalid characters",
                    ),
                });
            }
            decoded.into_owned()
        }
    };

    Ok(match content.strip_prefix('\u{FEFF}') {
        Some(stripped) => stripped.to_string(),
        None => content,
    })
}

/// All `.sql` files under `dir`, recursively, in sorted order
pub fn find_sql_files(dir: &Path) -> Result<Vec<PathBuf>, DeployError> {
    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| DeployError::DirectoryWalk {
            path: dir.to_path_buf(),
            source: e,
        })?;
        if entry.file_type().is_file() && has_extension_ci(entry.path(), "sql") {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
