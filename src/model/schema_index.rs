//! Case-insensitive name resolution over a schema snapshot.
//!
//! Built once per [`SchemaGraph`] and shared read-only by every parse call.
//! Keys are lower-cased at insertion and at query time, so `[Sales].[Orders]`,
//! `sales.orders` and `ORDERS` all resolve to the same canonical id.

use std::collections::HashMap;

use super::schema::{Column, SchemaGraph};

/// Read-only lookup from qualified or short names to canonical table ids.
#[derive(Debug, Default)]
pub struct SchemaIndex<'a> {
    /// Lower-cased id / `schema.name` / short name -> canonical id
    name_to_id: HashMap<String, &'a str>,
    /// Lower-cased canonical id -> column metadata
    columns: HashMap<String, &'a [Column]>,
}

impl<'a> SchemaIndex<'a> {
    /// Index every table and view of a snapshot.
    ///
    /// The first relation registered under a key keeps it, so a short name
    /// shared by two schemas resolves to whichever table appears first.
    pub fn build(graph: &'a SchemaGraph) -> Self {
        let mut index = Self::default();

        for table in &graph.tables {
            index.register(&table.id, &table.schema, &table.name, &table.columns);
        }
        for view in &graph.views {
            index.register(&view.id, &view.schema, &view.name, &view.columns);
        }

        index
    }

    /// An index with nothing in it; every name resolves to itself.
    pub fn empty() -> Self {
        Self::default()
    }

    fn register(&mut self, id: &'a str, schema: &str, name: &str, columns: &'a [Column]) {
        let keys = [
            id.to_lowercase(),
            format!("{}.{}", schema, name).to_lowercase(),
            name.to_lowercase(),
        ];
        for key in keys {
            self.name_to_id.entry(key).or_insert(id);
        }
        self.columns.entry(id.to_lowercase()).or_insert(columns);
    }

    /// Resolve a qualified or short name (already stripped of delimiters).
    pub fn resolve(&self, name: &str) -> Option<&'a str> {
        self.name_to_id.get(&name.to_lowercase()).copied()
    }

    /// Column metadata for a canonical id.
    pub fn columns(&self, table_id: &str) -> Option<&'a [Column]> {
        self.columns.get(&table_id.to_lowercase()).copied()
    }

    /// Find a column of a table by name, case-insensitively.
    pub fn find_column(&self, table_id: &str, column: &str) -> Option<&'a Column> {
        self.columns(table_id)?
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(column))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
