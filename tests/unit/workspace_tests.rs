//! Unit tests for Fabric workspace analysis

use std::path::Path;

use fabric_warehouse_deploy::workspace::{
    analyze_repository, validate_item_type, FabricItemType, ItemTypeSupport,
};

use crate::common::TestContext;

#[test]
fn test_analyze_fixture_repository() {
    let ctx = TestContext::with_fixture("workspace_repo");
    let analysis = analyze_repository(&ctx.root).unwrap();

    assert_eq!(analysis.total_items, 5);
    assert_eq!(analysis.count_of(FabricItemType::Notebook), 2);
    assert_eq!(
        analysis.item_types,
        vec![
            FabricItemType::Notebook,
            FabricItemType::Report,
            FabricItemType::SemanticModel,
            FabricItemType::Warehouse,
        ]
    );
    assert!(analysis
        .items
        .iter()
        .any(|i| i.path == Path::new("Load Orders.Notebook")));
}

#[test]
fn test_unsupported_items_are_not_counted() {
    let ctx = TestContext::with_fixture("workspace_repo");
    let analysis = analyze_repository(&ctx.root).unwrap();
    assert!(!analysis
        .items
        .iter()
        .any(|i| i.path.to_string_lossy().contains("Forecast")));
    assert_eq!(validate_item_type("MLModel"), ItemTypeSupport::NotSupported);
}

#[test]
fn test_item_file_counts_as_item() {
    let ctx = TestContext::empty();
    ctx.write("flows/Daily.DataPipeline", "{}");
    let analysis = analyze_repository(&ctx.root).unwrap();
    assert_eq!(analysis.total_items, 1);
    assert_eq!(analysis.items[0].item_type, FabricItemType::DataPipeline);
}

#[test]
fn test_every_supported_type_has_dot_extension() {
    for item_type in FabricItemType::ALL {
        assert_eq!(item_type.extension(), format!(".{}", item_type));
        assert_eq!(
            validate_item_type(item_type.as_str()),
            ItemTypeSupport::Supported(item_type)
        );
    }
}
