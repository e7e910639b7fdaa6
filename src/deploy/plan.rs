//! Turning a deployment source into an ordered list of objects

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use super::orderer::order_for_deployment;
use crate::model::SchemaObject;
use crate::parser::{find_sql_files, parse_sql_file, parse_sql_files};
use crate::project::parse_sqlproj;
use crate::util::has_extension_ci;

/// Where schema objects are read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum DeploymentSource {
    /// A single SQL script
    Script(PathBuf),
    /// Every `.sql` file below a directory
    Directory(PathBuf),
    /// The `Build` items of a `.sqlproj`
    Project(PathBuf),
}

impl DeploymentSource {
    /// Directory, `.sqlproj`, or otherwise a script
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            DeploymentSource::Directory(path)
        } else if has_extension_ci(&path, "sqlproj") {
            DeploymentSource::Project(path)
        } else {
            DeploymentSource::Script(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            DeploymentSource::Script(p)
            | DeploymentSource::Directory(p)
            | DeploymentSource::Project(p) => p,
        }
    }

    /// Used in progress logs and the "no schema objects found" error
    pub fn label(&self) -> &'static str {
        match self {
            DeploymentSource::Script(_) => "script",
            DeploymentSource::Directory(_) => "directory",
            DeploymentSource::Project(_) => "SQL project",
        }
    }
}

impl fmt::Display for DeploymentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label(), self.path().display())
    }
}

/// Ordered objects ready for the executor
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeploymentPlan {
    pub objects: Vec<SchemaObject>,
    /// Skipped statements and unreadable files
    pub warnings: Vec<String>,
}

/// Read, classify and order the objects of `source`.
///
/// `default_schema` applies to scripts and directories; a project uses its
/// own `DefaultSchema`.
pub fn build_plan(source: &DeploymentSource, default_schema: &str) -> Result<DeploymentPlan> {
    info!("Processing SQL {}", source);

    let (parsed, mut warnings) = match source {
        DeploymentSource::Script(path) => (parse_sql_file(path, default_schema)?, Vec::new()),
        DeploymentSource::Directory(path) => {
            let files = find_sql_files(path)?;
            parse_sql_files(&files, default_schema)
        }
        DeploymentSource::Project(path) => {
            let project = parse_sqlproj(path)?;
            info!(
                project = %project.name,
                files = project.sql_files.len(),
                "Parsed SQL project"
            );
            parse_sql_files(&project.sql_files, &project.default_schema)
        }
    };

    info!(
        objects = parsed.objects.len(),
        skipped = parsed.skipped.len(),
        "Classified statements"
    );

    warnings.extend(parsed.warnings());
    Ok(DeploymentPlan {
        objects: order_for_deployment(parsed.objects),
        warnings,
    })
}
