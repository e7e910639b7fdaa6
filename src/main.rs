use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use fabric_warehouse_deploy::workspace::{
    analyze_repository, validate_item_type, FabricItemType, ItemTypeSupport, NOT_SUPPORTED,
};
use fabric_warehouse_deploy::{
    deploy, deploy_repository, plan, DeployOptions, DeploySettings, DeploymentResult,
    RepositoryDeployOptions, RepositoryDeployment, SqlPackageDeployer,
};

#[derive(Parser)]
#[command(name = "fabric-warehouse-deploy")]
#[command(author, version, about = "Deploy database schema objects to Microsoft Fabric Warehouses")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Target warehouse name
    #[arg(long, global = true)]
    warehouse: Option<String>,

    /// Fabric workspace id
    #[arg(long, global = true)]
    workspace_id: Option<String>,

    /// SQL endpoint host
    #[arg(long, global = true)]
    server: Option<String>,

    /// Full connection string, overriding warehouse and server
    #[arg(long, global = true)]
    connection_string: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a SQL script, directory or .sqlproj statement by statement
    Deploy {
        /// Script, directory or .sqlproj file
        #[arg(short, long)]
        source: PathBuf,

        /// Log what would be deployed without connecting
        #[arg(long)]
        dry_run: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the ordered objects a deployment would execute
    Plan {
        #[arg(short, long)]
        source: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// Build a .sqlproj into a DACPAC and publish it with SqlPackage
    Dacpac {
        /// Path to the .sqlproj file
        #[arg(short, long)]
        project: PathBuf,

        /// Generate a deployment script instead of publishing
        #[arg(long)]
        dry_run: bool,

        /// Keep the built DACPAC in this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// Deploy every SQL project (or SQL directory) in a workspace repository
    /// to its Warehouse items
    DeployRepo {
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        #[arg(long)]
        dry_run: bool,

        /// Retry connecting for up to this many seconds per warehouse
        #[arg(long)]
        wait_secs: Option<u64>,

        #[arg(long)]
        json: bool,
    },

    /// List the Fabric items in a workspace repository
    Analyze {
        #[arg(short, long, default_value = ".")]
        repo: PathBuf,

        #[arg(long)]
        json: bool,
    },

    /// List supported Fabric item types, or check one
    ItemTypes {
        /// Item type name to check
        name: Option<String>,
    },
}

fn init_logging(verbose: bool, format: LogFormat) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.with_target(false).init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_settings(cli: &Cli) -> Result<DeploySettings> {
    let mut settings = DeploySettings::load(cli.config.as_deref())?;
    if let Some(warehouse) = &cli.warehouse {
        settings.warehouse_name = Some(warehouse.clone());
    }
    if let Some(workspace_id) = &cli.workspace_id {
        settings.workspace_id = Some(workspace_id.clone());
    }
    if let Some(server) = &cli.server {
        settings.server = Some(server.clone());
    }
    if let Some(connection_string) = &cli.connection_string {
        settings.connection_string = Some(connection_string.clone());
    }
    Ok(settings)
}

fn print_result(result: &DeploymentResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let status = if result.success { "succeeded" } else { "failed" };
    println!("Deployment {}", status);
    println!("  Objects deployed: {}", result.objects_deployed);
    println!("  Objects failed:   {}", result.objects_failed);
    println!("  Execution time:   {:.2}s", result.execution_time);
    if let Some(dacpac) = &result.dacpac_path {
        println!("  DACPAC:           {}", dacpac.display());
    }
    for warning in &result.warnings {
        println!("  warning: {}", warning);
    }
    for error in &result.errors {
        println!("  error: {}", error);
    }
    Ok(())
}

fn print_repository(deployments: &[RepositoryDeployment], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(deployments)?);
        return Ok(());
    }

    if deployments.is_empty() {
        println!("No warehouses found for schema deployment");
    }
    for deployment in deployments {
        let warehouse = deployment.warehouse.as_deref().unwrap_or("<connection string>");
        let status = if deployment.success { "succeeded" } else { "failed" };
        println!("Warehouse {}: {}", warehouse, status);
        for error in &deployment.errors {
            println!("  error: {}", error);
        }
        for source in &deployment.sources {
            let result = &source.result;
            println!(
                "  {} {}: {} deployed, {} failed",
                source.source.label(),
                source.source.path().display(),
                result.objects_deployed,
                result.objects_failed
            );
            for error in &result.errors {
                println!("    error: {}", error);
            }
        }
    }
    Ok(())
}

fn exit_code(result: &DeploymentResult) -> ExitCode {
    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn run_plan(source: PathBuf, settings: &DeploySettings, json: bool) -> Result<()> {
    let plan = plan(source, &settings.default_schema)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("{} objects to deploy:", plan.objects.len());
    for object in &plan.objects {
        println!(
            "  {:>3}. {:<16} {}",
            object.deployment_order,
            object.object_type.as_str(),
            object.qualified_name()
        );
    }
    for warning in &plan.warnings {
        println!("  warning: {}", warning);
    }
    Ok(())
}

fn run_analyze(repo: &Path, json: bool) -> Result<()> {
    let analysis = analyze_repository(repo)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!("Discovered {} Fabric items", analysis.total_items);
    for item_type in &analysis.item_types {
        println!("  {}: {}", item_type, analysis.count_of(*item_type));
    }
    Ok(())
}

fn run_item_types(name: Option<String>) -> ExitCode {
    match name {
        Some(name) => match validate_item_type(&name) {
            ItemTypeSupport::Supported(t) => {
                println!("{} is supported (extension {})", t, t.extension());
                ExitCode::SUCCESS
            }
            ItemTypeSupport::NotSupported => {
                println!("{} is not supported for deployment", name);
                ExitCode::FAILURE
            }
            ItemTypeSupport::Unknown => {
                println!("{} is not a known Fabric item type", name);
                ExitCode::FAILURE
            }
        },
        None => {
            println!("Supported item types:");
            for t in FabricItemType::ALL {
                println!("  {}", t);
            }
            println!("Not supported:");
            for name in NOT_SUPPORTED {
                println!("  {}", name);
            }
            ExitCode::SUCCESS
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let code = match &cli.command {
        Commands::Deploy {
            source,
            dry_run,
            json,
        } => {
            let result = deploy(DeployOptions {
                source: source.clone(),
                settings: load_settings(cli)?,
                dry_run: *dry_run,
            })?;
            print_result(&result, *json)?;
            exit_code(&result)
        }
        Commands::Plan { source, json } => {
            run_plan(source.clone(), &load_settings(cli)?, *json)?;
            ExitCode::SUCCESS
        }
        Commands::Dacpac {
            project,
            dry_run,
            output_dir,
            json,
        } => {
            let deployer = SqlPackageDeployer::new(load_settings(cli)?)?;
            let result = deployer.deploy_from_sqlproj(project, output_dir.as_deref(), *dry_run);
            print_result(&result, *json)?;
            exit_code(&result)
        }
        Commands::DeployRepo {
            repo,
            dry_run,
            wait_secs,
            json,
        } => {
            let deployments = deploy_repository(RepositoryDeployOptions {
                repo: repo.clone(),
                settings: load_settings(cli)?,
                dry_run: *dry_run,
                wait: wait_secs.map(Duration::from_secs),
            })?;
            print_repository(&deployments, *json)?;
            if deployments.iter().all(|d| d.success) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Analyze { repo, json } => {
            run_analyze(repo, *json)?;
            ExitCode::SUCCESS
        }
        Commands::ItemTypes { name } => run_item_types(name.clone()),
    };

    Ok(code)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);
    run(&cli)
}
