//! Schema deployment for a whole workspace repository
//!
//! SQL projects are deployed when the repository has any; otherwise every
//! directory holding `.sql` files is. Target warehouses come from the
//! repository's `*.Warehouse` items.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use super::deployer::WarehouseDeployer;
use super::plan::DeploymentSource;
use crate::error::DeployError;
use crate::model::DeploymentResult;
use crate::util::has_extension_ci;
use crate::workspace::{analyze_repository, FabricItemType};

/// Files below `repo` with extension `ext`, sorted, `.git*` directories skipped
fn files_with_extension(repo: &Path, ext: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(repo)
        .into_iter()
        .filter_entry(|e| {
            !(e.depth() > 0
                && e.file_type().is_dir()
                && e.file_name().to_string_lossy().starts_with(".git"))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_extension_ci(e.path(), ext))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

pub fn find_sql_projects(repo: &Path) -> Vec<PathBuf> {
    let projects = files_with_extension(repo, "sqlproj");
    info!(count = projects.len(), "Found SQL projects");
    projects
}

/// Outermost directories containing `.sql` files.
///
/// A directory is deployed recursively, so one nested below another listed
/// directory is left out.
pub fn find_sql_directories(repo: &Path) -> Vec<PathBuf> {
    let parents: BTreeSet<PathBuf> = files_with_extension(repo, "sql")
        .into_iter()
        .filter_map(|f| f.parent().map(Path::to_path_buf))
        .collect();

    let mut directories: Vec<PathBuf> = Vec::new();
    for dir in parents {
        if !directories.iter().any(|outer| dir.starts_with(outer)) {
            directories.push(dir);
        }
    }
    info!(count = directories.len(), "Found directories with SQL files");
    directories
}

/// Names of the `<name>.Warehouse` items in `repo`, in path order
pub fn warehouse_names(repo: &Path) -> Result<Vec<String>, DeployError> {
    let analysis = analyze_repository(repo)?;
    let mut names: Vec<String> = Vec::new();
    for item in analysis
        .items
        .iter()
        .filter(|i| i.item_type == FabricItemType::Warehouse)
    {
        let Some(name) = item.path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        if !names.contains(&name) {
            names.push(name);
        }
    }
    info!(count = names.len(), "Found Warehouse items");
    Ok(names)
}

/// SQL projects, or the SQL directories when there are none
pub fn repository_sources(repo: &Path) -> Vec<DeploymentSource> {
    let projects = find_sql_projects(repo);
    if !projects.is_empty() {
        return projects.into_iter().map(DeploymentSource::Project).collect();
    }
    find_sql_directories(repo)
        .into_iter()
        .map(DeploymentSource::Directory)
        .collect()
}

/// Outcome of deploying one repository source
#[derive(Debug, Clone, Serialize)]
pub struct SourceDeployment {
    pub source: DeploymentSource,
    pub result: DeploymentResult,
}

/// Per-source results of a repository deployment to one warehouse
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryDeployment {
    pub warehouse: Option<String>,
    /// Every source deployed and no repository-level error
    pub success: bool,
    pub sources: Vec<SourceDeployment>,
    /// Failures that belong to no single source
    pub errors: Vec<String>,
}

impl RepositoryDeployment {
    /// A deployment that never reached its sources
    pub fn failed(warehouse: Option<String>, message: impl Into<String>) -> Self {
        Self {
            warehouse,
            success: false,
            sources: Vec::new(),
            errors: vec![message.into()],
        }
    }

    /// All source results folded into one, errors and warnings in source order
    pub fn total(&self) -> DeploymentResult {
        let mut total = DeploymentResult {
            success: self.success,
            errors: self.errors.clone(),
            ..DeploymentResult::default()
        };
        for SourceDeployment { result, .. } in &self.sources {
            total.objects_deployed += result.objects_deployed;
            total.objects_failed += result.objects_failed;
            total.execution_time += result.execution_time;
            total.errors.extend(result.errors.iter().cloned());
            total.warnings.extend(result.warnings.iter().cloned());
        }
        total
    }
}

impl WarehouseDeployer {
    /// Deploy every source in `repo` over this deployer's connection, then
    /// disconnect.
    ///
    /// A failing source does not stop the ones after it.
    pub fn deploy_repository(&mut self, repo: &Path, dry_run: bool) -> RepositoryDeployment {
        let mut deployment = RepositoryDeployment {
            warehouse: self.warehouse_name().map(str::to_string),
            ..Default::default()
        };

        let sources = repository_sources(repo);
        if sources.is_empty() {
            let message = format!("No SQL projects or SQL files found in {}", repo.display());
            warn!("{}", message);
            deployment.errors.push(message);
        }

        for source in sources {
            info!(source = %source, "Deploying {}", source.label());
            let result = self.deploy_source(&source, dry_run);
            if result.success {
                info!(objects_deployed = result.objects_deployed, "Deployed {}", source);
            } else {
                error!(errors = ?result.errors, "Failed to deploy {}", source);
            }
            deployment.sources.push(SourceDeployment { source, result });
        }

        self.disconnect();
        deployment.success =
            deployment.errors.is_empty() && deployment.sources.iter().all(|s| s.result.success);
        deployment
    }
}
