//! Classified schema object types

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Kind of database object a `CREATE` statement produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SchemaObjectType {
    Schema,
    Table,
    View,
    StoredProcedure,
    Function,
    UserDefinedType,
    Synonym,
    Trigger,
    Index,
}

impl SchemaObjectType {
    /// Display name used in logs and error messages (e.g. "StoredProcedure")
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaObjectType::Schema => "Schema",
            SchemaObjectType::Table => "Table",
            SchemaObjectType::View => "View",
            SchemaObjectType::StoredProcedure => "StoredProcedure",
            SchemaObjectType::Function => "Function",
            SchemaObjectType::UserDefinedType => "UserDefinedType",
            SchemaObjectType::Synonym => "Synonym",
            SchemaObjectType::Trigger => "Trigger",
            SchemaObjectType::Index => "Index",
        }
    }
}

impl fmt::Display for SchemaObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A database object extracted from one SQL batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaObject {
    /// Object name with brackets stripped
    pub name: String,
    pub object_type: SchemaObjectType,
    /// Containing schema (defaults to `dbo`)
    pub schema_name: String,
    /// Verbatim statement text to execute
    pub sql_content: String,
    /// Referenced object names. Never populated: ordering is type-based only.
    pub dependencies: Vec<String>,
    /// Source file the statement came from
    pub file_path: Option<PathBuf>,
    /// 1-based position assigned by the orderer; 0 until ordered
    pub deployment_order: usize,
}

impl SchemaObject {
    pub fn new(
        name: impl Into<String>,
        object_type: SchemaObjectType,
        schema_name: impl Into<String>,
        sql_content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            object_type,
            schema_name: schema_name.into(),
            sql_content: sql_content.into(),
            dependencies: Vec::new(),
            file_path: None,
            deployment_order: 0,
        }
    }

    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Schema-qualified name, e.g. `dbo.Customers`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema_name, self.name)
    }
}
