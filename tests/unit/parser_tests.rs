//! Unit tests for statement splitting and classification

use std::path::Path;

use pretty_assertions::assert_eq;

use fabric_warehouse_deploy::parser::{
    classify_statement, classify_statement_in_schema, parse_sql, split_statements,
    strip_comments,
};
use fabric_warehouse_deploy::SchemaObjectType;

// ============================================================================
// Splitter
// ============================================================================

#[test]
fn test_two_statements_separated_by_go() {
    let sql = "CREATE TABLE T (x INT);\nGO\nCREATE VIEW V AS SELECT * FROM T;\nGO";
    assert_eq!(
        split_statements(sql),
        vec!["CREATE TABLE T (x INT);", "CREATE VIEW V AS SELECT * FROM T;"]
    );
}

#[test]
fn test_go_is_case_insensitive_whole_word() {
    let sql = "CREATE TABLE Logo (x INT)\ngo\nSELECT 1 AS GoodValue\nGo";
    assert_eq!(
        split_statements(sql),
        vec!["CREATE TABLE Logo (x INT)", "SELECT 1 AS GoodValue"]
    );
}

#[test]
fn test_go_inside_string_literal_still_splits() {
    let statements = split_statements("SELECT 'ready set go now' AS phrase");
    assert_eq!(statements, vec!["SELECT 'ready set", "now' AS phrase"]);
}

#[test]
fn test_block_comment_spanning_lines() {
    let sql = "/* header\n   GO\n*/\nCREATE TABLE t (x INT)";
    assert_eq!(split_statements(sql), vec!["CREATE TABLE t (x INT)"]);
}

#[test]
fn test_line_comments_removed_before_block_comments() {
    let stripped = strip_comments("SELECT 1 -- note /* opens\nSELECT 2 */ tail");
    assert_eq!(stripped, "SELECT 1 \nSELECT 2 */ tail");
}

#[test]
fn test_only_comments_yields_nothing() {
    assert!(split_statements("-- nothing\n/* at all */\nGO\n").is_empty());
}

// ============================================================================
// Classifier
// ============================================================================

#[test]
fn test_bracketed_qualified_table() {
    let obj = classify_statement("CREATE TABLE [dbo].[Foo] (Id INT)", None).unwrap();
    assert_eq!(obj.object_type, SchemaObjectType::Table);
    assert_eq!(obj.name, "Foo");
    assert_eq!(obj.schema_name, "dbo");
    assert_eq!(obj.deployment_order, 0);
    assert!(obj.dependencies.is_empty());
}

#[test]
fn test_alter_table_is_not_classified() {
    assert!(classify_statement("ALTER TABLE dbo.Foo ADD Bar INT", None).is_none());
}

#[test]
fn test_unqualified_name_uses_default_schema() {
    let obj = classify_statement_in_schema("create view vSales as select 1 as x", None, "sales")
        .unwrap();
    assert_eq!(obj.object_type, SchemaObjectType::View);
    assert_eq!(obj.name, "vSales");
    assert_eq!(obj.schema_name, "sales");
}

#[test]
fn test_proc_abbreviation() {
    let obj = classify_statement("CREATE PROC [etl].[usp_Load] AS SELECT 1", None).unwrap();
    assert_eq!(obj.object_type, SchemaObjectType::StoredProcedure);
    assert_eq!(obj.qualified_name(), "etl.usp_Load");
}

#[test]
fn test_function() {
    let sql = "CREATE FUNCTION dbo.fn_Tax (@amount DECIMAL(18,2)) RETURNS DECIMAL(18,2) AS BEGIN RETURN @amount * 0.2 END";
    let obj = classify_statement(sql, None).unwrap();
    assert_eq!(obj.object_type, SchemaObjectType::Function);
    assert_eq!(obj.name, "fn_Tax");
}

#[test]
fn test_schema_keeps_default_schema_name() {
    let obj = classify_statement("CREATE SCHEMA [Staging]", None).unwrap();
    assert_eq!(obj.object_type, SchemaObjectType::Schema);
    assert_eq!(obj.name, "Staging");
    assert_eq!(obj.schema_name, "dbo");
}

#[test]
fn test_first_pattern_in_list_wins_over_position() {
    // The procedure body creates a table; Table is checked before Procedure
    let sql = "CREATE PROCEDURE dbo.usp_Build AS BEGIN CREATE TABLE dbo.Work (x INT) END";
    let obj = classify_statement(sql, None).unwrap();
    assert_eq!(obj.object_type, SchemaObjectType::Table);
    assert_eq!(obj.name, "Work");
}

#[test]
fn test_temp_table_in_body_does_not_match() {
    let sql = "CREATE PROCEDURE dbo.usp_Stage AS BEGIN CREATE TABLE #work (x INT) END";
    let obj = classify_statement(sql, None).unwrap();
    assert_eq!(obj.object_type, SchemaObjectType::StoredProcedure);
    assert_eq!(obj.name, "usp_Stage");
}

#[test]
fn test_statements_that_are_not_creates() {
    for sql in [
        "INSERT INTO dbo.T VALUES (1)",
        "DROP VIEW dbo.V",
        "GRANT SELECT ON dbo.T TO reader",
        "CREATE INDEX IX_T ON dbo.T (x)",
        "EXEC sp_rename 'a', 'b'",
    ] {
        assert!(classify_statement(sql, None).is_none(), "{sql}");
    }
}

#[test]
fn test_sql_content_is_verbatim() {
    let sql = "CREATE TABLE t (\n    id INT\n)";
    let obj = classify_statement(sql, Some(Path::new("t.sql"))).unwrap();
    assert_eq!(obj.sql_content, sql);
    assert_eq!(obj.file_path.as_deref(), Some(Path::new("t.sql")));
}

// ============================================================================
// Split + classify
// ============================================================================

#[test]
fn test_parse_mixed_script() {
    let sql = "\
CREATE SCHEMA sales
GO
-- seed data is not deployed
INSERT INTO sales.Orders VALUES (1)
GO
CREATE TABLE sales.Orders (Id INT)
GO";
    let parsed = parse_sql(sql, Some(Path::new("mixed.sql")), "dbo");

    let kinds: Vec<_> = parsed.objects.iter().map(|o| o.object_type).collect();
    assert_eq!(kinds, vec![SchemaObjectType::Schema, SchemaObjectType::Table]);
    assert_eq!(
        parsed.warnings(),
        vec!["Skipped unrecognized statement in mixed.sql: INSERT INTO sales.Orders VALUES (1)"]
    );
}
