//! Type-priority deployment ordering
//!
//! Objects are ordered by type (schemas before tables before views ...), then
//! by name. This approximates dependency order only: a view that reads
//! another view, or a function that reads a table sorting later by name, is
//! not detected.

use crate::model::{SchemaObject, SchemaObjectType};

/// Priority for types missing from [`TYPE_PRIORITY`]
pub const UNRANKED_PRIORITY: u32 = 999;

/// Lower deploys first
pub const TYPE_PRIORITY: [(SchemaObjectType, u32); 9] = [
    (SchemaObjectType::Schema, 1),
    (SchemaObjectType::UserDefinedType, 2),
    (SchemaObjectType::Table, 3),
    (SchemaObjectType::Function, 4),
    (SchemaObjectType::View, 5),
    (SchemaObjectType::StoredProcedure, 6),
    (SchemaObjectType::Synonym, 7),
    (SchemaObjectType::Trigger, 8),
    (SchemaObjectType::Index, 9),
];

pub fn type_priority(object_type: SchemaObjectType) -> u32 {
    TYPE_PRIORITY
        .iter()
        .find(|(t, _)| *t == object_type)
        .map(|(_, p)| *p)
        .unwrap_or(UNRANKED_PRIORITY)
}

/// Stable-sort by `(type priority, name)` and number the result `1..=N`.
pub fn order_for_deployment(mut objects: Vec<SchemaObject>) -> Vec<SchemaObject> {
    objects.sort_by(|a, b| {
        type_priority(a.object_type)
            .cmp(&type_priority(b.object_type))
            .then_with(|| a.name.cmp(&b.name))
    });

    for (index, object) in objects.iter_mut().enumerate() {
        object.deployment_order = index + 1;
    }

    objects
}
