//! Fabric item types known to the deployment tooling

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Item types that can be deployed from a Git-backed workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FabricItemType {
    DataPipeline,
    Environment,
    Notebook,
    Report,
    SemanticModel,
    Lakehouse,
    Warehouse,
    SQLDatabase,
    MirroredDatabase,
    Dataflow,
    CopyJob,
    VariableLibrary,
    Eventhouse,
    KQLDatabase,
    KQLQueryset,
    KQLDashboard,
    Eventstream,
    Reflex,
    GraphQLApi,
    ApacheAirflowJob,
    MountedDataFactory,
}

/// Item names that exist in Fabric but cannot be deployed
pub const NOT_SUPPORTED: [&str; 5] = [
    "MLModel",
    "MLExperiment",
    "SparkJobDefinition",
    "Dashboard",
    "Dataset",
];

impl FabricItemType {
    pub const ALL: [FabricItemType; 21] = [
        FabricItemType::DataPipeline,
        FabricItemType::Environment,
        FabricItemType::Notebook,
        FabricItemType::Report,
        FabricItemType::SemanticModel,
        FabricItemType::Lakehouse,
        FabricItemType::Warehouse,
        FabricItemType::SQLDatabase,
        FabricItemType::MirroredDatabase,
        FabricItemType::Dataflow,
        FabricItemType::CopyJob,
        FabricItemType::VariableLibrary,
        FabricItemType::Eventhouse,
        FabricItemType::KQLDatabase,
        FabricItemType::KQLQueryset,
        FabricItemType::KQLDashboard,
        FabricItemType::Eventstream,
        FabricItemType::Reflex,
        FabricItemType::GraphQLApi,
        FabricItemType::ApacheAirflowJob,
        FabricItemType::MountedDataFactory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FabricItemType::DataPipeline => "DataPipeline",
            FabricItemType::Environment => "Environment",
            FabricItemType::Notebook => "Notebook",
            FabricItemType::Report => "Report",
            FabricItemType::SemanticModel => "SemanticModel",
            FabricItemType::Lakehouse => "Lakehouse",
            FabricItemType::Warehouse => "Warehouse",
            FabricItemType::SQLDatabase => "SQLDatabase",
            FabricItemType::MirroredDatabase => "MirroredDatabase",
            FabricItemType::Dataflow => "Dataflow",
            FabricItemType::CopyJob => "CopyJob",
            FabricItemType::VariableLibrary => "VariableLibrary",
            FabricItemType::Eventhouse => "Eventhouse",
            FabricItemType::KQLDatabase => "KQLDatabase",
            FabricItemType::KQLQueryset => "KQLQueryset",
            FabricItemType::KQLDashboard => "KQLDashboard",
            FabricItemType::Eventstream => "Eventstream",
            FabricItemType::Reflex => "Reflex",
            FabricItemType::GraphQLApi => "GraphQLApi",
            FabricItemType::ApacheAirflowJob => "ApacheAirflowJob",
            FabricItemType::MountedDataFactory => "MountedDataFactory",
        }
    }

    /// Suffix of the item folder in a workspace repository, e.g. `.Notebook`
    pub fn extension(&self) -> String {
        format!(".{}", self.as_str())
    }

    /// Item type whose extension ends `name`
    pub fn from_item_name(name: &str) -> Option<FabricItemType> {
        Self::ALL.into_iter().find(|t| {
            name.strip_suffix(t.as_str())
                .is_some_and(|stem| stem.ends_with('.'))
        })
    }
}

impl fmt::Display for FabricItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FabricItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown Fabric item type: {}", s))
    }
}

/// Outcome of [`validate_item_type`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemTypeSupport {
    Supported(FabricItemType),
    NotSupported,
    Unknown,
}

pub fn validate_item_type(name: &str) -> ItemTypeSupport {
    if let Ok(item_type) = name.parse() {
        ItemTypeSupport::Supported(item_type)
    } else if NOT_SUPPORTED.contains(&name) {
        ItemTypeSupport::NotSupported
    } else {
        ItemTypeSupport::Unknown
    }
}
