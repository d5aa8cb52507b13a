//! Schema graph types
//!
//! These mirror the JSON snapshot produced by the schema loader. Every
//! collection on [`SchemaGraph`] defaults to empty so partial snapshots
//! deserialize cleanly.

use serde::{Deserialize, Serialize};

/// Data type recorded when lineage cannot determine one
pub const UNKNOWN_DATA_TYPE: &str = "unknown";

/// The concrete table column an output column was derived from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSource {
    /// Canonical table id (`schema.name`) when resolvable, otherwise the raw identifier
    pub table: String,
    pub column: String,
}

impl ColumnSource {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Case-insensitive `table::column` key used for de-duplication
    pub fn dedup_key(&self) -> String {
        format!(
            "{}::{}",
            self.table.to_lowercase(),
            self.column.to_lowercase()
        )
    }
}

/// A table or view column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
    pub is_primary_key: bool,
    /// Provenance; the first entry is the primary source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_columns: Option<Vec<ColumnSource>>,
    /// Legacy mirror of `source_columns[0].table`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table: Option<String>,
    /// Legacy mirror of `source_columns[0].column`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_column: Option<String>,
}

impl Column {
    /// A column with no provenance and an unknown, nullable type
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: UNKNOWN_DATA_TYPE.to_string(),
            is_nullable: true,
            is_primary_key: false,
            source_columns: None,
            source_table: None,
            source_column: None,
        }
    }

    /// Replace the provenance, keeping the legacy single-source fields in sync
    pub fn set_sources(&mut self, sources: Vec<ColumnSource>) {
        if sources.is_empty() {
            self.source_columns = None;
            self.source_table = None;
            self.source_column = None;
            return;
        }
        self.source_table = Some(sources[0].table.clone());
        self.source_column = Some(sources[0].column.clone());
        self.source_columns = Some(sources);
    }

    /// Primary provenance, falling back to the legacy fields
    pub fn primary_source(&self) -> Option<ColumnSource> {
        if let Some(first) = self.source_columns.as_ref().and_then(|s| s.first()) {
            return Some(first.clone());
        }
        match (&self.source_table, &self.source_column) {
            (Some(table), Some(column)) => Some(ColumnSource::new(table, column)),
            _ => None,
        }
    }

    pub fn has_unknown_type(&self) -> bool {
        self.data_type.is_empty() || self.data_type.eq_ignore_ascii_case(UNKNOWN_DATA_TYPE)
    }
}

/// A routine parameter; `name` always carries its `@` prefix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureParameter {
    pub name: String,
    pub data_type: String,
    pub is_output: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableNode {
    pub id: String,
    pub name: String,
    pub schema: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewNode {
    pub id: String,
    pub name: String,
    pub schema: String,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub referenced_tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub from_column: String,
    pub to_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub id: String,
    pub name: String,
    pub schema: String,
    pub table_id: String,
    #[serde(default)]
    pub trigger_type: String,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub fires_on_insert: bool,
    #[serde(default)]
    pub fires_on_update: bool,
    #[serde(default)]
    pub fires_on_delete: bool,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub referenced_tables: Vec<String>,
    #[serde(default)]
    pub affected_tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProcedure {
    pub id: String,
    pub name: String,
    pub schema: String,
    #[serde(default)]
    pub procedure_type: String,
    #[serde(default)]
    pub parameters: Vec<ProcedureParameter>,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub referenced_tables: Vec<String>,
    #[serde(default)]
    pub affected_tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarFunction {
    pub id: String,
    pub name: String,
    pub schema: String,
    #[serde(default)]
    pub function_type: String,
    #[serde(default)]
    pub parameters: Vec<ProcedureParameter>,
    #[serde(default)]
    pub return_type: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub referenced_tables: Vec<String>,
    #[serde(default)]
    pub affected_tables: Vec<String>,
}

/// A full schema snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaGraph {
    #[serde(default)]
    pub tables: Vec<TableNode>,
    #[serde(default)]
    pub views: Vec<ViewNode>,
    #[serde(default)]
    pub relationships: Vec<RelationshipEdge>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub stored_procedures: Vec<StoredProcedure>,
    #[serde(default)]
    pub functions: Vec<ScalarFunction>,
}
