//! DACPAC deployment through the external `dotnet` and `SqlPackage` tools
//!
//! `dotnet build` turns a `.sqlproj` into a `.dacpac`; SqlPackage then
//! publishes it (or, for dry runs, writes the deployment script). Both run as
//! child processes under a timeout and are killed when it expires.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{error, info, warn};

use crate::config::DeploySettings;
use crate::error::DeployError;
use crate::model::DeploymentResult;
use crate::util::{contains_ci, has_extension_ci};

const SQLPACKAGE: &str = "SqlPackage";

/// Well-known Windows install locations, checked after PATH
const WINDOWS_SQLPACKAGE_PATHS: &[&str] = &[
    r"C:\Program Files\Microsoft SQL Server\160\DAC\bin\SqlPackage.exe",
    r"C:\Program Files\Microsoft SQL Server\150\DAC\bin\SqlPackage.exe",
    r"C:\Program Files\Microsoft SQL Server\140\DAC\bin\SqlPackage.exe",
    r"C:\Program Files\Microsoft SQL Server\SqlPackage\SqlPackage.exe",
];

/// Azure Data Studio bundles SqlPackage inside its SQL projects extension
const ADS_SQLPACKAGE_GLOB: &str =
    ".azuredatastudio/extensions/microsoft.sql-database-projects-*/BuildDirectory/SqlPackage.exe";

const INSTALL_HINT: &str = "install SQL Server Data Tools, Azure Data Studio with the SQL \
    Database Projects extension, or `dotnet tool install -g microsoft.sqlpackage`";

/// Locate SqlPackage: configured path, PATH, dotnet global tools, then
/// well-known install directories.
pub fn find_sqlpackage(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.exists() || responds_to_version(path) {
            return Some(path.to_path_buf());
        }
        warn!(path = %path.display(), "Configured SqlPackage path not usable");
    }

    if responds_to_version(Path::new("sqlpackage")) {
        info!("Found SqlPackage in PATH");
        return Some(PathBuf::from("sqlpackage"));
    }

    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from);

    if let Some(home) = &home {
        let dotnet_tool = home.join(".dotnet").join("tools").join("sqlpackage");
        if responds_to_version(&dotnet_tool) {
            return Some(dotnet_tool);
        }
    }

    if let Some(found) = WINDOWS_SQLPACKAGE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
    {
        info!(path = %found.display(), "Found SqlPackage");
        return Some(found);
    }

    let home = home?;
    let pattern = home.join(ADS_SQLPACKAGE_GLOB);
    let found = glob::glob(&pattern.to_string_lossy())
        .ok()?
        .filter_map(|p| p.ok())
        .next()?;
    info!(path = %found.display(), "Found SqlPackage");
    Some(found)
}

fn responds_to_version(program: &Path) -> bool {
    std::process::Command::new(program)
        .arg("/version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Run `command`, killing it if it outlives `timeout`
pub fn run_with_timeout(
    mut command: Command,
    tool: &str,
    timeout: Duration,
) -> Result<Output, DeployError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    command.kill_on_drop(true);

    runtime.block_on(async {
        match tokio::time::timeout(timeout, command.output()).await {
            Ok(output) => output.map_err(|e| DeployError::ToolLaunch {
                tool: tool.to_string(),
                source: e,
            }),
            Err(_) => Err(DeployError::ToolTimeout {
                tool: tool.to_string(),
                seconds: timeout.as_secs(),
            }),
        }
    })
}

/// Count object operations reported in SqlPackage publish output
pub fn count_deployed_objects(output: &str) -> usize {
    const ACTIONS: [&str; 3] = ["creating", "altering", "updating"];
    const OBJECT_KINDS: [&str; 4] = ["table", "view", "procedure", "function"];

    output
        .lines()
        .filter(|line| ACTIONS.iter().any(|a| contains_ci(line, a)))
        .filter(|line| OBJECT_KINDS.iter().any(|k| contains_ci(line, k)))
        .count()
}

/// `<dir>/<stem>_deployment.sql` for a source file
pub fn script_path_for(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("deployment");
    source
        .parent()
        .unwrap_or(Path::new("."))
        .join(format!("{}_deployment.sql", stem))
}

/// SqlPackage arguments: `/Action:Script` when a script path is given,
/// `/Action:Publish` otherwise
pub fn sqlpackage_arguments(
    source: &Path,
    connection_string: &str,
    access_token: Option<&str>,
    script_path: Option<&Path>,
) -> Vec<String> {
    let action = if script_path.is_some() { "Script" } else { "Publish" };
    let mut args = vec![
        format!("/Action:{}", action),
        format!("/SourceFile:{}", source.display()),
        format!("/TargetConnectionString:{}", connection_string),
    ];
    if let Some(token) = access_token {
        args.push(format!("/AccessToken:{}", token));
    }
    if let Some(script_path) = script_path {
        args.push(format!("/OutputPath:{}", script_path.display()));
    }
    args.push("/p:IgnorePermissions=true".to_string());
    args.push("/p:IgnoreRoleMembership=true".to_string());
    args
}

/// Result error lines for a failed build or deployment step
fn error_lines(e: &DeployError) -> Vec<String> {
    match e {
        DeployError::ToolFailed { stderr, .. } => vec![e.to_string(), stderr.clone()],
        _ => vec![e.to_string()],
    }
}

/// Builds and deploys DACPACs with SqlPackage
#[derive(Debug)]
pub struct SqlPackageDeployer {
    settings: DeploySettings,
    sqlpackage_path: PathBuf,
}

impl SqlPackageDeployer {
    /// Locate SqlPackage and create a deployer, failing when it is missing
    pub fn new(settings: DeploySettings) -> Result<Self, DeployError> {
        let sqlpackage_path = find_sqlpackage(settings.sqlpackage_path.as_deref()).ok_or_else(|| {
            error!("SqlPackage not found");
            DeployError::ToolNotFound {
                tool: SQLPACKAGE.to_string(),
                hint: INSTALL_HINT.to_string(),
            }
        })?;
        Ok(Self::with_sqlpackage_path(settings, sqlpackage_path))
    }

    pub fn with_sqlpackage_path(settings: DeploySettings, sqlpackage_path: PathBuf) -> Self {
        Self {
            settings,
            sqlpackage_path,
        }
    }

    /// Build `sqlproj` into `output_dir` with `dotnet build`
    pub fn build_dacpac(&self, sqlproj: &Path, output_dir: &Path) -> Result<PathBuf, DeployError> {
        let project = sqlproj.canonicalize().map_err(|e| DeployError::ProjectRead {
            path: sqlproj.to_path_buf(),
            source: e,
        })?;
        let project_dir = project.parent().unwrap_or(Path::new(".")).to_path_buf();
        let stem = project
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Database")
            .to_string();

        std::fs::create_dir_all(output_dir)?;
        let output_dir = output_dir.canonicalize()?;

        let mut command = Command::new(self.settings.dotnet_program());
        command
            .arg("build")
            .arg(&project)
            .args(["--configuration", "Release", "--output"])
            .arg(&output_dir)
            .args(["--verbosity", "minimal"])
            .current_dir(&project_dir);

        info!("Building DACPAC: {}", sqlproj.display());
        let output = run_with_timeout(command, "dotnet build", self.settings.build_timeout())?;

        if !output.status.success() {
            let e = DeployError::ToolFailed {
                tool: "dotnet build".to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            };
            error!("DACPAC build failed: {}", e);
            return Err(e);
        }

        let dacpac_name = format!("{}.dacpac", stem);
        let candidates = [
            output_dir.join(&dacpac_name),
            output_dir.join("bin").join("Release").join(&dacpac_name),
            project_dir.join("bin").join("Release").join(&dacpac_name),
        ];
        match candidates.into_iter().find(|p| p.exists()) {
            Some(dacpac) => {
                info!("DACPAC build successful: {}", dacpac.display());
                Ok(dacpac)
            }
            None => {
                warn!("DACPAC not found after build");
                Err(DeployError::DacpacNotFound {
                    project: sqlproj.to_path_buf(),
                })
            }
        }
    }

    /// Publish a DACPAC (or SQL project) file, or script it for a dry run.
    ///
    /// The dry-run script is written next to `source`.
    pub fn deploy_dacpac(&self, source: &Path, dry_run: bool) -> DeploymentResult {
        let script_path = dry_run.then(|| script_path_for(source));
        self.run_sqlpackage(source, script_path.as_deref())
    }

    /// Build `sqlproj` and deploy the resulting DACPAC.
    ///
    /// Without `output_dir` the DACPAC is built in a temporary directory that
    /// is removed afterwards; a dry-run script is then written next to the
    /// `.sqlproj`.
    pub fn deploy_from_sqlproj(
        &self,
        sqlproj: &Path,
        output_dir: Option<&Path>,
        dry_run: bool,
    ) -> DeploymentResult {
        info!("Processing SQL project: {}", sqlproj.display());

        let temp_dir = match output_dir {
            Some(_) => None,
            None => match tempfile::Builder::new().prefix("fabric_dacpac_").tempdir() {
                Ok(dir) => Some(dir),
                Err(e) => {
                    return DeploymentResult::failure(format!(
                        "Failed to create temporary directory: {}",
                        e
                    ))
                }
            },
        };
        let build_dir = match (&temp_dir, output_dir) {
            (Some(temp), _) => temp.path().to_path_buf(),
            (None, dir) => dir.unwrap_or(Path::new(".")).to_path_buf(),
        };

        let dacpac = match self.build_dacpac(sqlproj, &build_dir) {
            Ok(path) => path,
            Err(e) => return DeploymentResult::failure_with(error_lines(&e)),
        };

        let script_path = dry_run.then(|| script_path_for(sqlproj));
        let mut result = self.run_sqlpackage(&dacpac, script_path.as_deref());

        if let Some(temp) = temp_dir {
            result.dacpac_path = None;
            if let Err(e) = temp.close() {
                warn!(error = %e, "Could not clean up DACPAC directory");
            }
        }
        result
    }

    fn run_sqlpackage(&self, source: &Path, script_path: Option<&Path>) -> DeploymentResult {
        let connection_string = match self.settings.sqlpackage_connection_string() {
            Ok(c) => c,
            Err(e) => return DeploymentResult::failure(e.to_string()),
        };

        let source_type = if has_extension_ci(source, "sqlproj") {
            "SQL Project"
        } else {
            "DACPAC"
        };
        match script_path {
            Some(script) => info!(
                source = %source.display(),
                script = %script.display(),
                "[DRY RUN] Generating {} deployment script",
                source_type
            ),
            None => info!(
                warehouse = ?self.settings.warehouse_name,
                "Deploying {} {}",
                source_type,
                source.display()
            ),
        }

        let mut command = Command::new(&self.sqlpackage_path);
        command.args(sqlpackage_arguments(
            source,
            &connection_string,
            self.settings.access_token.as_deref(),
            script_path,
        ));

        let start = Instant::now();
        let output = run_with_timeout(command, SQLPACKAGE, self.settings.publish_timeout())
            .map_err(|e| match e {
                DeployError::ToolTimeout { seconds, .. } => DeployError::ToolTimeout {
                    tool: format!("{} deployment", SQLPACKAGE),
                    seconds,
                },
                e => e,
            });
        let execution_time = start.elapsed().as_secs_f64();

        let mut result = match output {
            Ok(output) if output.status.success() => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                match script_path {
                    Some(script) => {
                        info!("Deployment script generated successfully");
                        DeploymentResult {
                            deployment_report: Some(script.display().to_string()),
                            ..DeploymentResult::default()
                        }
                    }
                    None => {
                        let objects_deployed = count_deployed_objects(&stdout);
                        info!(objects_deployed, "DACPAC deployment successful");
                        DeploymentResult {
                            objects_deployed,
                            deployment_report: Some(stdout),
                            ..DeploymentResult::default()
                        }
                    }
                }
            }
            Ok(output) => {
                let e = DeployError::ToolFailed {
                    tool: SQLPACKAGE.to_string(),
                    code: output.status.code().unwrap_or(-1),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
                error!("DACPAC deployment failed: {}", e);
                DeploymentResult::failure_with(error_lines(&e))
            }
            Err(e) => {
                error!("{}", e);
                DeploymentResult::failure(e.to_string())
            }
        };

        result.dacpac_path = Some(source.to_path_buf());
        result.execution_time = execution_time;
        result
    }
}
