//! Unit tests for .sqlproj parsing

use fabric_warehouse_deploy::project::parse_sqlproj;

use crate::common::TestContext;

#[test]
fn test_parse_build_items_and_default_schema() {
    let ctx = TestContext::with_fixture("sql_project");
    let project = parse_sqlproj(&ctx.project_path()).unwrap();

    assert_eq!(project.name, "project");
    assert_eq!(project.default_schema, "sales");

    let files: Vec<String> = project
        .sql_files
        .iter()
        .map(|p| {
            p.strip_prefix(&ctx.root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    assert_eq!(
        files,
        vec![
            "Procedures/usp_Summarize.sql",
            "Views/vCustomers.sql",
            "Tables/Customers.sql",
            "Tables/Orders.sql",
        ]
    );
}

#[test]
fn test_sdk_project_globs_outside_bin() {
    let ctx = TestContext::with_fixture("sdk_project");
    let project = parse_sqlproj(&ctx.project_path()).unwrap();

    assert_eq!(project.default_schema, "dbo");
    assert_eq!(project.sql_files.len(), 1);
    assert!(project.sql_files[0].ends_with("Tables/Events.sql"));
}

#[test]
fn test_missing_project_file() {
    let ctx = TestContext::empty();
    let err = parse_sqlproj(&ctx.path("nope.sqlproj")).unwrap_err();
    assert!(err.to_string().contains("Failed to read project file"));
}

#[test]
fn test_remove_pattern_with_wildcard() {
    let ctx = TestContext::empty();
    ctx.write("Tables/Keep.sql", "CREATE TABLE Keep (x INT)");
    ctx.write("Tables/Drop_1.sql", "CREATE TABLE Drop_1 (x INT)");
    ctx.write("Tables/Drop_2.sql", "CREATE TABLE Drop_2 (x INT)");
    ctx.write(
        "project.sqlproj",
        r#"<Project><ItemGroup>
  <Build Include="Tables\*.sql" />
  <Build Remove="Tables\Drop_*.sql" />
</ItemGroup></Project>"#,
    );

    let project = parse_sqlproj(&ctx.project_path()).unwrap();
    assert_eq!(project.sql_files.len(), 1);
    assert!(project.sql_files[0].ends_with("Keep.sql"));
}
