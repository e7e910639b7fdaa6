//! fabric-warehouse-deploy: schema deployment for Microsoft Fabric Warehouses
//!
//! SQL scripts, directories and SQL projects are split into statements,
//! classified into schema objects, ordered by object type and executed one by
//! one over a single connection. SQL projects can alternatively be built into
//! a DACPAC and published with SqlPackage. A whole workspace repository can be
//! deployed to its Warehouse items in one run.

pub mod config;
pub mod deploy;
pub mod error;
pub mod model;
pub mod parser;
pub mod project;
mod util;
pub mod workspace;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

pub use config::DeploySettings;
pub use deploy::{
    DeploymentPlan, DeploymentSource, RepositoryDeployment, SqlPackageDeployer,
    WarehouseDeployer,
};
pub use error::DeployError;
pub use model::{DeploymentResult, SchemaObject, SchemaObjectType};

/// Options for a direct deployment run
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Script, directory or .sqlproj to deploy
    pub source: PathBuf,
    pub settings: DeploySettings,
    /// Log what would run without connecting
    pub dry_run: bool,
}

/// Deploy a source to the configured warehouse.
///
/// The source is read before connecting, so unreadable or empty sources are
/// reported through the returned [`DeploymentResult`]. A connection failure
/// is an error.
pub fn deploy(options: DeployOptions) -> Result<DeploymentResult> {
    let source = DeploymentSource::from_path(&options.source);
    let plan = match deploy::build_plan(&source, &options.settings.default_schema) {
        Ok(plan) => plan,
        Err(e) => return Ok(DeploymentResult::failure(format!("{:#}", e))),
    };
    if plan.objects.is_empty() {
        let message = format!("No schema objects found in {}", source.label());
        warn!("{}", message);
        return Ok(DeploymentResult::failure(message).with_warnings(plan.warnings));
    }

    let mut deployer = WarehouseDeployer::new(options.settings);
    if !options.dry_run {
        deployer
            .connect()
            .context("Failed to connect to Fabric Warehouse")?;
        info!("Connected to Fabric Warehouse");
    }

    let result = deployer.execute_plan(plan, options.dry_run);
    deployer.disconnect();
    Ok(result)
}

/// Seconds between readiness checks while waiting for a warehouse
pub const READY_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Options for deploying every SQL source in a workspace repository
#[derive(Debug, Clone)]
pub struct RepositoryDeployOptions {
    pub repo: PathBuf,
    /// A configured warehouse overrides the repository's Warehouse items
    pub settings: DeploySettings,
    pub dry_run: bool,
    /// Keep retrying the connection this long before giving up on a warehouse
    pub wait: Option<Duration>,
}

/// Deploy the repository's SQL projects (or SQL directories) to each target
/// warehouse, one connection per warehouse.
///
/// Targets are the configured warehouse, else the repository's
/// `*.Warehouse` items. A warehouse that cannot be reached gets a failed
/// [`RepositoryDeployment`] and the next one is still deployed.
pub fn deploy_repository(options: RepositoryDeployOptions) -> Result<Vec<RepositoryDeployment>> {
    let targets: Vec<Option<String>> = match &options.settings.warehouse_name {
        Some(name) => vec![Some(name.clone())],
        None => {
            let names = deploy::warehouse_names(&options.repo)
                .context("Failed to analyze repository")?;
            if names.is_empty() && options.settings.connection_string.is_some() {
                vec![None]
            } else {
                names.into_iter().map(Some).collect()
            }
        }
    };
    if targets.is_empty() {
        warn!("No warehouses found for schema deployment");
    }

    let mut deployments = Vec::with_capacity(targets.len());
    for warehouse in targets {
        let settings = DeploySettings {
            warehouse_name: warehouse.clone(),
            ..options.settings.clone()
        };
        let mut deployer = WarehouseDeployer::new(settings);

        if !options.dry_run {
            let ready = match options.wait {
                Some(timeout) => deployer.wait_until_ready(timeout, READY_POLL_INTERVAL),
                None => deployer.connect(),
            };
            if let Err(e) = ready {
                deployments.push(RepositoryDeployment::failed(warehouse, e.to_string()));
                continue;
            }
        }

        info!(warehouse = ?warehouse, "Deploying repository schemas");
        deployments.push(deployer.deploy_repository(&options.repo, options.dry_run));
    }
    Ok(deployments)
}

/// Read, classify and order a source without connecting
pub fn plan(source: PathBuf, default_schema: &str) -> Result<DeploymentPlan> {
    deploy::build_plan(&DeploymentSource::from_path(source), default_schema)
}
