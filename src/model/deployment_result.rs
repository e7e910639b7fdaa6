//! Aggregate outcome of a deployment run

use std::path::PathBuf;

use serde::Serialize;

/// Result of one deployment call (script, directory, project or DACPAC)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentResult {
    pub success: bool,
    pub objects_deployed: usize,
    pub objects_failed: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Wall-clock seconds
    pub execution_time: f64,
    /// DACPAC that was published or scripted (DACPAC path only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dacpac_path: Option<PathBuf>,
    /// SqlPackage output, or the generated script path for dry runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_report: Option<String>,
}

impl Default for DeploymentResult {
    fn default() -> Self {
        Self {
            success: true,
            objects_deployed: 0,
            objects_failed: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            execution_time: 0.0,
            dacpac_path: None,
            deployment_report: None,
        }
    }
}

impl DeploymentResult {
    /// A failed run carrying a single error and zero counts
    pub fn failure(message: impl Into<String>) -> Self {
        Self::failure_with(vec![message.into()])
    }

    pub fn failure_with(errors: Vec<String>) -> Self {
        Self {
            success: false,
            errors,
            ..Self::default()
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.splice(0..0, warnings);
        self
    }
}
