//! Discovery of Fabric items in a workspace repository

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::item_types::FabricItemType;
use crate::error::DeployError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FabricItem {
    pub item_type: FabricItemType,
    /// Relative to the repository root
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryAnalysis {
    pub items: Vec<FabricItem>,
    /// Distinct types found, sorted by name
    pub item_types: Vec<FabricItemType>,
    pub total_items: usize,
}

impl RepositoryAnalysis {
    pub fn count_of(&self, item_type: FabricItemType) -> usize {
        self.items.iter().filter(|i| i.item_type == item_type).count()
    }
}

/// Find every file or directory named `<name>.<ItemType>` below `repo`.
///
/// `.git*` directories are skipped, as is the content of an item folder.
pub fn analyze_repository(repo: &Path) -> Result<RepositoryAnalysis, DeployError> {
    let mut items = Vec::new();
    let mut walker = WalkDir::new(repo)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.file_type().is_dir() && e.file_name().to_string_lossy().starts_with(".git"))
        });

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| DeployError::DirectoryWalk {
            path: repo.to_path_buf(),
            source: e,
        })?;
        let name = entry.file_name().to_string_lossy();
        let Some(item_type) = FabricItemType::from_item_name(&name) else {
            continue;
        };

        let path = entry
            .path()
            .strip_prefix(repo)
            .unwrap_or(entry.path())
            .to_path_buf();
        debug!(%item_type, path = %path.display(), "found Fabric item");
        items.push(FabricItem { item_type, path });

        if entry.file_type().is_dir() {
            walker.skip_current_dir();
        }
    }

    let item_types: BTreeSet<&'static str> = items.iter().map(|i| i.item_type.as_str()).collect();
    let item_types = item_types
        .into_iter()
        .filter_map(|name| name.parse().ok())
        .collect();

    info!(items = items.len(), "Analyzed repository {}", repo.display());
    Ok(RepositoryAnalysis {
        total_items: items.len(),
        items,
        item_types,
    })
}
