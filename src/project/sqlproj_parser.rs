//! Parser for .sqlproj files

use std::path::{Path, PathBuf};

use anyhow::Result;
use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::DeployError;
use crate::parser::DEFAULT_SCHEMA;
use crate::util::has_extension_ci;

/// The parts of a SQL project needed for schema deployment
#[derive(Debug, Clone)]
pub struct SqlProject {
    /// Project name (file stem of the .sqlproj)
    pub name: String,
    pub project_dir: PathBuf,
    /// `DefaultSchema` property, `dbo` when absent
    pub default_schema: String,
    /// SQL files to deploy, in project order
    pub sql_files: Vec<PathBuf>,
}

/// Parse a .sqlproj file
pub fn parse_sqlproj(path: &Path) -> Result<SqlProject> {
    let content = std::fs::read_to_string(path).map_err(|e| DeployError::ProjectRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let doc = Document::parse(&content).map_err(|e| DeployError::ProjectParse {
        path: path.to_path_buf(),
        source: e,
    })?;

    let project_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Database")
        .to_string();

    let root = doc.root_element();
    let default_schema =
        find_property_value(&root, "DefaultSchema").unwrap_or_else(|| DEFAULT_SCHEMA.to_string());
    let sql_files = find_sql_files(&root, &project_dir);

    debug!(project = %name, files = sql_files.len(), "parsed SQL project");

    Ok(SqlProject {
        name,
        project_dir,
        default_schema,
        sql_files,
    })
}

fn find_property_value(root: &Node, property_name: &str) -> Option<String> {
    root.descendants()
        .find(|node| node.tag_name().name() == property_name)
        .and_then(|node| node.text())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// `Build Include` items (globs expanded), minus `Build Remove` patterns.
/// SDK-style projects without Build items include every .sql file outside
/// bin/ and obj/.
fn find_sql_files(root: &Node, project_dir: &Path) -> Vec<PathBuf> {
    let mut include_patterns = Vec::new();
    let mut remove_patterns = Vec::new();

    for node in root.descendants().filter(|n| n.tag_name().name() == "Build") {
        if let Some(include) = node.attribute("Include") {
            include_patterns.push(include.replace('\\', "/"));
        }
        if let Some(remove) = node.attribute("Remove") {
            remove_patterns.push(remove.replace('\\', "/"));
        }
    }

    let mut sql_files = Vec::new();

    if include_patterns.is_empty() {
        sql_files = default_sql_files(project_dir);
    } else {
        for pattern in &include_patterns {
            if pattern.contains('*') {
                sql_files.extend(expand_glob(project_dir, pattern));
            } else {
                let sql_path = project_dir.join(pattern);
                if has_extension_ci(&sql_path, "sql") && sql_path.exists() {
                    sql_files.push(sql_path);
                }
            }
        }
    }

    if !remove_patterns.is_empty() {
        sql_files.retain(|file| !is_removed(file, project_dir, &remove_patterns));
    }

    sql_files
}

fn expand_glob(project_dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let glob_pattern = project_dir.join(pattern);
    match glob::glob(&glob_pattern.to_string_lossy()) {
        Ok(paths) => paths
            .filter_map(|p| p.ok())
            .filter(|p| has_extension_ci(p, "sql"))
            .collect(),
        Err(e) => {
            debug!(pattern, error = %e, "ignoring invalid Build glob");
            Vec::new()
        }
    }
}

fn is_removed(file: &Path, project_dir: &Path, remove_patterns: &[String]) -> bool {
    remove_patterns.iter().any(|pattern| {
        let full = project_dir.join(pattern);
        if pattern.contains('*') {
            glob::Pattern::new(&full.to_string_lossy())
                .map(|matcher| matcher.matches_path(file))
                .unwrap_or(false)
        } else {
            file == full
        }
    })
}

fn default_sql_files(project_dir: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(project_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            !(e.file_type().is_dir()
                && e.depth() > 0
                && (name.eq_ignore_ascii_case("bin") || name.eq_ignore_ascii_case("obj")))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension_ci(e.path(), "sql"))
        .map(|e| e.into_path())
        .collect()
}
