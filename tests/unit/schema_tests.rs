//! Schema snapshot serialization and name index tests

use pretty_assertions::assert_eq;
use serde_json::Value;

use tsql_lineage::{ColumnSource, SchemaGraph, SchemaIndex};

use crate::common::{load_fixture_schema, sourced_column};

// ============================================================================
// Serialization
// ============================================================================

#[test]
fn test_fixture_snapshot_loads() {
    let graph = load_fixture_schema("shop");
    assert_eq!(graph.tables.len(), 4);
    assert_eq!(graph.views.len(), 2);
    assert_eq!(graph.relationships[0].from_column, "CustomerId");
    assert_eq!(graph.triggers[0].table_id, "dbo.Orders");
    assert!(graph.triggers[0].fires_on_update);
    assert!(graph.stored_procedures[0].parameters.is_empty());
    assert_eq!(graph.functions[0].return_type, "");
}

#[test]
fn test_empty_object_is_empty_graph() {
    let graph: SchemaGraph = serde_json::from_str("{}").unwrap();
    assert!(graph.tables.is_empty());
    assert!(graph.views.is_empty());
    assert!(graph.relationships.is_empty());
    assert!(graph.triggers.is_empty());
    assert!(graph.stored_procedures.is_empty());
    assert!(graph.functions.is_empty());
}

#[test]
fn test_serialized_keys_are_camel_case() {
    let value = serde_json::to_value(load_fixture_schema("shop")).unwrap();

    assert!(value.get("storedProcedures").is_some());
    assert!(value.get("stored_procedures").is_none());
    assert_eq!(value["tables"][0]["columns"][0]["dataType"], "int");
    assert_eq!(value["tables"][0]["columns"][0]["isPrimaryKey"], true);
    assert_eq!(value["triggers"][0]["firesOnUpdate"], true);
    assert_eq!(value["functions"][0]["returnType"], "");
    assert!(value["views"][0]["referencedTables"].is_array());
}

#[test]
fn test_provenance_serialized_only_when_present() {
    let column = sourced_column("Total", "dbo.Orders", "Total");
    let value = serde_json::to_value(&column).unwrap();
    assert_eq!(value["sourceTable"], "dbo.Orders");
    assert_eq!(value["sourceColumn"], "Total");
    assert_eq!(
        value["sourceColumns"],
        serde_json::json!([{ "table": "dbo.Orders", "column": "Total" }])
    );

    let table_column = &load_fixture_schema("shop").tables[0].columns[0];
    let value = serde_json::to_value(table_column).unwrap();
    let keys: Vec<&str> = match &value {
        Value::Object(map) => map.keys().map(String::as_str).collect(),
        _ => Vec::new(),
    };
    assert!(!keys.contains(&"sourceColumns"));
    assert!(!keys.contains(&"sourceTable"));
    assert!(!keys.contains(&"sourceColumn"));
}

#[test]
fn test_column_source_dedup_key_ignores_case() {
    assert_eq!(
        ColumnSource::new("dbo.Orders", "Total").dedup_key(),
        ColumnSource::new("DBO.ORDERS", "total").dedup_key()
    );
}

// ============================================================================
// Name index
// ============================================================================

#[test]
fn test_index_resolves_qualified_and_short_names() {
    let graph = load_fixture_schema("shop");
    let index = SchemaIndex::build(&graph);

    assert_eq!(index.resolve("dbo.Orders"), Some("dbo.Orders"));
    assert_eq!(index.resolve("DBO.ORDERS"), Some("dbo.Orders"));
    assert_eq!(index.resolve("regions"), Some("sales.Regions"));
    assert_eq!(index.resolve("vw_OrderSummary"), Some("dbo.vw_OrderSummary"));
    assert_eq!(index.resolve("dbo.Regions"), None);
    assert_eq!(index.len(), 6);
}

#[test]
fn test_index_column_lookup() {
    let graph = load_fixture_schema("shop");
    let index = SchemaIndex::build(&graph);

    let total = index.find_column("dbo.orders", "TOTAL").expect("Total column");
    assert_eq!(total.name, "Total");
    assert_eq!(total.data_type, "decimal(10,2)");
    assert!(index.find_column("dbo.Orders", "Missing").is_none());
    assert_eq!(index.columns("sales.vw_Regions").map(<[_]>::len), Some(0));
    assert!(index.columns("dbo.Nope").is_none());
}

#[test]
fn test_empty_index() {
    let index = SchemaIndex::empty();
    assert!(index.is_empty());
    assert_eq!(index.resolve("dbo.Orders"), None);
}
