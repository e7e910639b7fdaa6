//! Warehouse schema deployer: one connection, many deployment runs

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use super::connection::{SqlConnection, TdsConnection};
use super::executor::execute_objects;
use super::orderer::order_for_deployment;
use super::plan::{build_plan, DeploymentPlan, DeploymentSource};
use crate::config::DeploySettings;
use crate::error::DeployError;
use crate::model::{DeploymentResult, SchemaObject};

/// Deploys schema objects to a Fabric Warehouse over a single connection.
///
/// The connection is opened by [`WarehouseDeployer::connect`] and released by
/// [`WarehouseDeployer::disconnect`], or on drop.
pub struct WarehouseDeployer {
    settings: DeploySettings,
    connection: Option<Box<dyn SqlConnection>>,
}

impl WarehouseDeployer {
    pub fn new(settings: DeploySettings) -> Self {
        Self {
            settings,
            connection: None,
        }
    }

    /// Use an already open connection
    pub fn with_connection(settings: DeploySettings, connection: Box<dyn SqlConnection>) -> Self {
        Self {
            settings,
            connection: Some(connection),
        }
    }

    pub fn warehouse_name(&self) -> Option<&str> {
        self.settings.warehouse_name.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Open a TDS connection to the configured warehouse
    pub fn connect(&mut self) -> Result<(), DeployError> {
        let connection_string = self.settings.direct_connection_string()?;
        let auth = self.settings.connection_auth()?;
        let warehouse = self
            .warehouse_name()
            .unwrap_or("<connection string>")
            .to_string();

        match TdsConnection::connect(&warehouse, &connection_string, &auth) {
            Ok(connection) => {
                self.connection = Some(Box::new(connection));
                Ok(())
            }
            Err(e) => {
                error!(%warehouse, error = %e, "Failed to connect to warehouse");
                Err(e)
            }
        }
    }

    /// Retry [`connect`](Self::connect) every `interval` until it succeeds or
    /// `timeout` has passed.
    ///
    /// Missing settings fail at once.
    pub fn wait_until_ready(
        &mut self,
        timeout: Duration,
        interval: Duration,
    ) -> Result<(), DeployError> {
        let warehouse = self
            .warehouse_name()
            .unwrap_or("<connection string>")
            .to_string();
        info!(%warehouse, timeout_secs = timeout.as_secs(), "Waiting for warehouse to be ready");

        let start = Instant::now();
        loop {
            match self.connect() {
                Ok(()) => {
                    info!(%warehouse, "Warehouse is ready");
                    return Ok(());
                }
                Err(e @ DeployError::MissingSetting { .. }) => return Err(e),
                Err(e) if start.elapsed() + interval > timeout => {
                    return Err(DeployError::WarehouseNotReady {
                        warehouse,
                        seconds: timeout.as_secs(),
                        message: e.to_string(),
                    })
                }
                Err(_) => {
                    info!(elapsed_secs = start.elapsed().as_secs(), "Still waiting for warehouse");
                    std::thread::sleep(interval);
                }
            }
        }
    }

    pub fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            match connection.close() {
                Ok(()) => info!("Disconnected from warehouse"),
                Err(e) => warn!(error = %e, "Error while closing warehouse connection"),
            }
        }
    }

    /// Order then execute `objects`
    pub fn deploy_schema_objects(
        &mut self,
        objects: Vec<SchemaObject>,
        dry_run: bool,
    ) -> DeploymentResult {
        let ordered = order_for_deployment(objects);
        execute_objects(&ordered, self.connection.as_deref_mut(), dry_run)
    }

    pub fn deploy_script(&mut self, path: &Path, dry_run: bool) -> DeploymentResult {
        self.deploy_source(&DeploymentSource::Script(path.to_path_buf()), dry_run)
    }

    pub fn deploy_directory(&mut self, path: &Path, dry_run: bool) -> DeploymentResult {
        self.deploy_source(&DeploymentSource::Directory(path.to_path_buf()), dry_run)
    }

    pub fn deploy_from_sqlproj(&mut self, path: &Path, dry_run: bool) -> DeploymentResult {
        self.deploy_source(&DeploymentSource::Project(path.to_path_buf()), dry_run)
    }

    /// Plan and execute one source.
    ///
    /// Read failures and sources without any recognized object fail the run
    /// before the connection is touched.
    pub fn deploy_source(&mut self, source: &DeploymentSource, dry_run: bool) -> DeploymentResult {
        let plan = match build_plan(source, &self.settings.default_schema) {
            Ok(plan) => plan,
            Err(e) => {
                error!(source = %source, error = %e, "Failed to read deployment source");
                return DeploymentResult::failure(format!("{:#}", e));
            }
        };

        if plan.objects.is_empty() {
            let message = format!("No schema objects found in {}", source.label());
            warn!("{}", message);
            return DeploymentResult::failure(message).with_warnings(plan.warnings);
        }

        self.execute_plan(plan, dry_run)
    }

    /// Execute an already ordered plan
    pub fn execute_plan(&mut self, plan: DeploymentPlan, dry_run: bool) -> DeploymentResult {
        execute_objects(&plan.objects, self.connection.as_deref_mut(), dry_run)
            .with_warnings(plan.warnings)
    }
}

impl Drop for WarehouseDeployer {
    fn drop(&mut self) {
        self.disconnect();
    }
}
