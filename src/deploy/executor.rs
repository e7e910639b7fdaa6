//! Sequential, non-transactional execution of ordered schema objects

use std::time::Instant;

use tracing::{error, info, warn};

use super::connection::SqlConnection;
use crate::error::DeployError;
use crate::model::{DeploymentResult, SchemaObject};
use crate::util::contains_ci;

/// Execute `objects` in the given order.
///
/// Each object is executed then committed. A failure is recorded and the
/// next object is still attempted; objects that already succeeded stay
/// committed. In dry-run mode nothing is executed and every object counts as
/// deployed, with or without a connection.
pub fn execute_objects<C>(
    objects: &[SchemaObject],
    mut connection: Option<&mut C>,
    dry_run: bool,
) -> DeploymentResult
where
    C: SqlConnection + ?Sized,
{
    if connection.is_none() && !dry_run {
        error!("No database connection available");
        return DeploymentResult::failure(DeployError::NotConnected.to_string());
    }

    let start = Instant::now();
    let mut result = DeploymentResult::default();

    info!(count = objects.len(), dry_run, "Starting deployment of schema objects");

    for object in objects {
        let outcome = match connection.as_mut() {
            Some(conn) if !dry_run => {
                info!(
                    order = object.deployment_order,
                    "Deploying {}: {}",
                    object.object_type,
                    object.qualified_name()
                );
                conn.execute(&object.sql_content).and_then(|()| conn.commit())
            }
            _ => {
                info!(
                    order = object.deployment_order,
                    "[DRY RUN] Would deploy {}: {}",
                    object.object_type,
                    object.qualified_name()
                );
                Ok(())
            }
        };

        match outcome {
            Ok(()) => result.objects_deployed += 1,
            Err(e) => {
                let message = format!(
                    "Failed to deploy {} {}: {}",
                    object.object_type,
                    object.qualified_name(),
                    e
                );
                error!("{}", message);
                result.errors.push(message);
                result.objects_failed += 1;

                // Syntax errors do not stop the batch either
                if contains_ci(&e.to_string(), "syntax error") {
                    warn!(
                        name = %object.qualified_name(),
                        "syntax error reported; continuing with remaining objects"
                    );
                }
            }
        }
    }

    result.execution_time = start.elapsed().as_secs_f64();
    result.success = result.objects_failed == 0;

    info!(
        deployed = result.objects_deployed,
        failed = result.objects_failed,
        "Deployment completed"
    );
    result
}
