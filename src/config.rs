//! Deployment settings
//!
//! Settings come from an optional file (TOML, YAML or JSON, picked by
//! extension), then `FABRIC_*` environment variables, then command-line
//! overrides applied by the binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::deploy::WarehouseAuth;
use crate::error::DeployError;
use crate::parser::DEFAULT_SCHEMA;

/// Host suffix of Fabric Warehouse SQL endpoints
pub const FABRIC_SQL_HOST_SUFFIX: &str = "datawarehouse.fabric.microsoft.com";

/// Prefix of environment variables read by [`DeploySettings::load`]
pub const ENV_PREFIX: &str = "FABRIC";

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DeploySettings {
    pub warehouse_name: Option<String>,
    pub workspace_id: Option<String>,
    /// SQL endpoint host; derived from the warehouse or workspace when unset
    pub server: Option<String>,
    /// Full connection string; overrides every other connection setting
    pub connection_string: Option<String>,
    pub access_token: Option<String>,
    pub sql_user: Option<String>,
    pub sql_password: Option<String>,
    pub default_schema: String,
    pub sqlpackage_path: Option<PathBuf>,
    /// `dotnet` executable used to build DACPACs; `dotnet` from PATH when unset
    pub dotnet_path: Option<PathBuf>,
    pub build_timeout_secs: u64,
    pub publish_timeout_secs: u64,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            warehouse_name: None,
            workspace_id: None,
            server: None,
            connection_string: None,
            access_token: None,
            sql_user: None,
            sql_password: None,
            default_schema: DEFAULT_SCHEMA.to_string(),
            sqlpackage_path: None,
            dotnet_path: None,
            build_timeout_secs: 60,
            publish_timeout_secs: 120,
        }
    }
}

impl std::fmt::Debug for DeploySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("DeploySettings")
            .field("warehouse_name", &self.warehouse_name)
            .field("workspace_id", &self.workspace_id)
            .field("server", &self.server)
            .field("connection_string", &redact(&self.connection_string))
            .field("access_token", &redact(&self.access_token))
            .field("sql_user", &self.sql_user)
            .field("sql_password", &redact(&self.sql_password))
            .field("default_schema", &self.default_schema)
            .field("sqlpackage_path", &self.sqlpackage_path)
            .field("dotnet_path", &self.dotnet_path)
            .field("build_timeout_secs", &self.build_timeout_secs)
            .field("publish_timeout_secs", &self.publish_timeout_secs)
            .finish()
    }
}

impl DeploySettings {
    /// Load from an optional settings file plus `FABRIC_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, DeployError> {
        Self::load_with_env(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load with an explicit environment source (tests inject a fixed map)
    pub fn load_with_env(
        path: Option<&Path>,
        environment: config::Environment,
    ) -> Result<Self, DeployError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        }
        let settings = builder
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn require_warehouse(&self) -> Result<&str, DeployError> {
        self.warehouse_name
            .as_deref()
            .ok_or(DeployError::MissingSetting {
                key: "warehouse_name",
                env: "WAREHOUSE_NAME",
            })
    }

    /// Connection string for the direct SQL path.
    ///
    /// Without an explicit server the endpoint is derived from the warehouse
    /// name.
    pub fn direct_connection_string(&self) -> Result<String, DeployError> {
        if let Some(explicit) = &self.connection_string {
            return Ok(explicit.clone());
        }
        let warehouse = self.require_warehouse()?;
        let server = self
            .server
            .clone()
            .unwrap_or_else(|| format!("{}.{}", warehouse, FABRIC_SQL_HOST_SUFFIX));
        Ok(build_connection_string(&server, warehouse))
    }

    /// Connection string handed to SqlPackage.
    ///
    /// Without an explicit server the endpoint is derived from the workspace
    /// id, which does not resolve for every warehouse.
    pub fn sqlpackage_connection_string(&self) -> Result<String, DeployError> {
        if let Some(explicit) = &self.connection_string {
            return Ok(explicit.clone());
        }
        let warehouse = self.require_warehouse()?;
        let server = match (&self.server, &self.workspace_id) {
            (Some(server), _) => server.clone(),
            (None, Some(workspace_id)) => {
                tracing::warn!("Using workspace ID as server name - may not work for all warehouses");
                format!("{}.{}", workspace_id, FABRIC_SQL_HOST_SUFFIX)
            }
            (None, None) => {
                return Err(DeployError::MissingSetting {
                    key: "workspace_id",
                    env: "WORKSPACE_ID",
                })
            }
        };
        Ok(build_connection_string(&server, warehouse))
    }

    /// Access token wins over SQL credentials
    pub fn auth(&self) -> WarehouseAuth {
        match (&self.access_token, &self.sql_user, &self.sql_password) {
            (Some(token), _, _) => WarehouseAuth::AccessToken(token.clone()),
            (None, Some(user), Some(password)) => WarehouseAuth::SqlServer {
                user: user.clone(),
                password: password.clone(),
            },
            _ => WarehouseAuth::ConnectionString,
        }
    }

    /// Authentication for a direct connection.
    ///
    /// A derived connection string carries no credentials, so it needs an
    /// access token or SQL credentials alongside it.
    pub fn connection_auth(&self) -> Result<WarehouseAuth, DeployError> {
        match self.auth() {
            WarehouseAuth::ConnectionString if self.connection_string.is_none() => {
                Err(DeployError::MissingSetting {
                    key: "access_token",
                    env: "ACCESS_TOKEN",
                })
            }
            auth => Ok(auth),
        }
    }

    pub fn dotnet_program(&self) -> &Path {
        self.dotnet_path.as_deref().unwrap_or(Path::new("dotnet"))
    }

    pub fn build_timeout(&self) -> Duration {
        Duration::from_secs(self.build_timeout_secs)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }
}

fn build_connection_string(server: &str, database: &str) -> String {
    format!(
        "Server={};Database={};Authentication=Active Directory Default;Encrypt=True;TrustServerCertificate=False;",
        server, database
    )
}
