//! Ordering and executing schema objects against a warehouse, one source or a
//! whole repository at a time

mod connection;
mod deployer;
mod executor;
mod orderer;
mod plan;
mod repository;
mod sqlpackage;

pub use connection::{SqlConnection, TdsConnection, WarehouseAuth};
pub use deployer::WarehouseDeployer;
pub use executor::execute_objects;
pub use orderer::{order_for_deployment, type_priority, TYPE_PRIORITY, UNRANKED_PRIORITY};
pub use plan::{build_plan, DeploymentPlan, DeploymentSource};
pub use repository::{
    find_sql_directories, find_sql_projects, repository_sources, warehouse_names,
    RepositoryDeployment, SourceDeployment,
};
pub use sqlpackage::{
    count_deployed_objects, find_sqlpackage, run_with_timeout, script_path_for,
    sqlpackage_arguments, SqlPackageDeployer,
};
