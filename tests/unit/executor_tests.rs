//! Unit tests for sequential execution

use pretty_assertions::assert_eq;

use fabric_warehouse_deploy::deploy::{execute_objects, order_for_deployment};
use fabric_warehouse_deploy::{SchemaObject, SchemaObjectType};

use crate::common::RecordingConnection;

fn tables(names: &[&str]) -> Vec<SchemaObject> {
    order_for_deployment(
        names
            .iter()
            .map(|name| {
                SchemaObject::new(
                    *name,
                    SchemaObjectType::Table,
                    "dbo",
                    format!("CREATE TABLE dbo.{} (x INT)", name),
                )
            })
            .collect(),
    )
}

#[test]
fn test_second_of_three_fails() {
    let mut conn = RecordingConnection::failing_on("dbo.B", "Invalid column name 'y'.");
    let result = execute_objects(&tables(&["A", "B", "C"]), Some(&mut conn), false);

    assert!(!result.success);
    assert_eq!(result.objects_deployed, 2);
    assert_eq!(result.objects_failed, 1);
    assert_eq!(
        result.errors,
        vec!["Failed to deploy Table dbo.B: Invalid column name 'y'."]
    );
    assert_eq!(conn.executed().len(), 3);
    assert_eq!(conn.commits(), 2);
}

#[test]
fn test_counts_add_up_to_submitted() {
    let mut conn = RecordingConnection::failing_on("dbo.B", "boom").and_failing_on("dbo.D", "bang");
    let objects = tables(&["A", "B", "C", "D", "E"]);
    let result = execute_objects(&objects, Some(&mut conn), false);

    assert_eq!(result.objects_deployed + result.objects_failed, objects.len());
    assert_eq!(result.errors.len(), result.objects_failed);
}

#[test]
fn test_dry_run_without_connection_deploys_everything() {
    let result = execute_objects::<RecordingConnection>(&tables(&["A", "B", "C"]), None, true);

    assert!(result.success);
    assert_eq!(result.objects_deployed, 3);
    assert_eq!(result.objects_failed, 0);
    assert!(result.errors.is_empty());
}

#[test]
fn test_no_connection_fails_whole_run() {
    let result = execute_objects::<RecordingConnection>(&tables(&["A", "B"]), None, false);

    assert!(!result.success);
    assert_eq!(result.objects_deployed, 0);
    assert_eq!(result.objects_failed, 0);
    assert_eq!(result.errors, vec!["No database connection available"]);
}

#[test]
fn test_syntax_error_does_not_stop_the_batch() {
    let mut conn = RecordingConnection::failing_on("dbo.A", "Incorrect syntax near 'x'. SYNTAX ERROR");
    let result = execute_objects(&tables(&["A", "B"]), Some(&mut conn), false);

    assert_eq!(result.objects_failed, 1);
    assert_eq!(result.objects_deployed, 1);
    assert_eq!(conn.executed(), vec!["CREATE TABLE dbo.A (x INT)", "CREATE TABLE dbo.B (x INT)"]);
}

#[test]
fn test_executes_in_deployment_order() {
    let objects = order_for_deployment(vec![
        SchemaObject::new("v", SchemaObjectType::View, "dbo", "CREATE VIEW v AS SELECT 1 AS x"),
        SchemaObject::new("t", SchemaObjectType::Table, "dbo", "CREATE TABLE t (x INT)"),
        SchemaObject::new("s", SchemaObjectType::Schema, "dbo", "CREATE SCHEMA s"),
    ]);
    let mut conn = RecordingConnection::new();
    let result = execute_objects(&objects, Some(&mut conn), false);

    assert!(result.success);
    assert_eq!(
        conn.executed(),
        vec![
            "CREATE SCHEMA s",
            "CREATE TABLE t (x INT)",
            "CREATE VIEW v AS SELECT 1 AS x"
        ]
    );
    assert!(result.execution_time >= 0.0);
}

#[test]
fn test_empty_batch_succeeds() {
    let mut conn = RecordingConnection::new();
    let result = execute_objects(&[], Some(&mut conn), false);
    assert!(result.success);
    assert_eq!(result.objects_deployed, 0);
}
