//! Fabric workspace repository analysis

mod discovery;
mod item_types;

pub use discovery::{analyze_repository, FabricItem, RepositoryAnalysis};
pub use item_types::{validate_item_type, FabricItemType, ItemTypeSupport, NOT_SUPPORTED};
