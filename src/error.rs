//! Error types for fabric-warehouse-deploy

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur outside of a per-object deployment result
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Failed to read project file: {path}")]
    ProjectRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse project file: {path}")]
    ProjectParse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Failed to read SQL file: {path}")]
    SqlFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory: {path}")]
    DirectoryWalk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to connect to warehouse {warehouse}: {message}")]
    Connection { warehouse: String, message: String },

    /// Driver-reported failure; the message is the driver's own text.
    #[error("{message}")]
    Sql { message: String },

    #[error("No database connection available")]
    NotConnected,

    #[error("{tool} not found: {hint}")]
    ToolNotFound { tool: String, hint: String },

    #[error("Failed to execute {tool}: {source}")]
    ToolLaunch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed (exit code: {code})")]
    ToolFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    #[error("{tool} timed out after {seconds} seconds")]
    ToolTimeout { tool: String, seconds: u64 },

    #[error("Warehouse {warehouse} not ready after {seconds} seconds: {message}")]
    WarehouseNotReady {
        warehouse: String,
        seconds: u64,
        message: String,
    },

    #[error("DACPAC file not found after build of {project}")]
    DacpacNotFound { project: PathBuf },

    #[error("Missing setting `{key}` (set it in the config file, FABRIC_{env} or on the command line)")]
    MissingSetting { key: &'static str, env: &'static str },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<tiberius::error::Error> for DeployError {
    fn from(err: tiberius::error::Error) -> Self {
        DeployError::Sql {
            message: err.to_string(),
        }
    }
}
