//! Unit tests for type-priority ordering

use pretty_assertions::assert_eq;

use fabric_warehouse_deploy::deploy::{order_for_deployment, type_priority, UNRANKED_PRIORITY};
use fabric_warehouse_deploy::{SchemaObject, SchemaObjectType};

fn obj(name: &str, object_type: SchemaObjectType) -> SchemaObject {
    SchemaObject::new(name, object_type, "dbo", format!("CREATE {} {}", object_type, name))
}

fn summary(objects: &[SchemaObject]) -> Vec<(usize, SchemaObjectType, String)> {
    objects
        .iter()
        .map(|o| (o.deployment_order, o.object_type, o.name.clone()))
        .collect()
}

#[test]
fn test_schema_table_procedure() {
    let ordered = order_for_deployment(vec![
        obj("Zeta", SchemaObjectType::StoredProcedure),
        obj("Alpha", SchemaObjectType::Table),
        obj("Beta", SchemaObjectType::Schema),
    ]);
    assert_eq!(
        summary(&ordered),
        vec![
            (1, SchemaObjectType::Schema, "Beta".to_string()),
            (2, SchemaObjectType::Table, "Alpha".to_string()),
            (3, SchemaObjectType::StoredProcedure, "Zeta".to_string()),
        ]
    );
}

#[test]
fn test_every_type_in_priority_order() {
    let ordered = order_for_deployment(vec![
        obj("i", SchemaObjectType::Index),
        obj("tr", SchemaObjectType::Trigger),
        obj("syn", SchemaObjectType::Synonym),
        obj("p", SchemaObjectType::StoredProcedure),
        obj("v", SchemaObjectType::View),
        obj("f", SchemaObjectType::Function),
        obj("t", SchemaObjectType::Table),
        obj("udt", SchemaObjectType::UserDefinedType),
        obj("s", SchemaObjectType::Schema),
    ]);
    let priorities: Vec<u32> = ordered.iter().map(|o| type_priority(o.object_type)).collect();
    assert_eq!(priorities, (1..=9).collect::<Vec<u32>>());
}

#[test]
fn test_names_compare_bytewise() {
    let ordered = order_for_deployment(vec![
        obj("apple", SchemaObjectType::Table),
        obj("Zebra", SchemaObjectType::Table),
        obj("Apple", SchemaObjectType::Table),
    ]);
    let names: Vec<&str> = ordered.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["Apple", "Zebra", "apple"]);
}

#[test]
fn test_same_name_keeps_input_order() {
    let mut first = obj("Dup", SchemaObjectType::View);
    first.schema_name = "a".to_string();
    let mut second = obj("Dup", SchemaObjectType::View);
    second.schema_name = "b".to_string();

    let ordered = order_for_deployment(vec![first, second]);
    assert_eq!(ordered[0].schema_name, "a");
    assert_eq!(ordered[1].schema_name, "b");
}

#[test]
fn test_order_is_permutation_of_one_to_n() {
    let names = ["q", "c", "x", "a", "m", "b", "z", "k"];
    let types = [
        SchemaObjectType::View,
        SchemaObjectType::Table,
        SchemaObjectType::Function,
        SchemaObjectType::Schema,
    ];
    let input: Vec<SchemaObject> = names
        .iter()
        .enumerate()
        .map(|(i, name)| obj(name, types[i % types.len()]))
        .collect();

    let ordered = order_for_deployment(input);
    let orders: Vec<usize> = ordered.iter().map(|o| o.deployment_order).collect();
    assert_eq!(orders, (1..=names.len()).collect::<Vec<_>>());

    for pair in ordered.windows(2) {
        let a = (type_priority(pair[0].object_type), &pair[0].name);
        let b = (type_priority(pair[1].object_type), &pair[1].name);
        assert!(a <= b, "{:?} should not precede {:?}", a, b);
    }
}

#[test]
fn test_empty_input() {
    assert!(order_for_deployment(Vec::new()).is_empty());
}

#[test]
fn test_unranked_priority_sorts_last() {
    assert!(type_priority(SchemaObjectType::Index) < UNRANKED_PRIORITY);
}
