//! Schema object and deployment result types

mod deployment_result;
mod schema_object;

pub use deployment_result::DeploymentResult;
pub use schema_object::{SchemaObject, SchemaObjectType};
