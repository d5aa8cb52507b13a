//! View lineage tests against the shop fixture schema

use pretty_assertions::assert_eq;

use tsql_lineage::model::UNKNOWN_DATA_TYPE;
use tsql_lineage::parser::{parse_view_definition, ViewParseOptions};

use crate::common::{column, fixture_sql, load_fixture_schema, names_of, sources_of, src};

fn parse(sql: &str) -> tsql_lineage::parser::ViewDefinition {
    parse_view_definition(sql, &load_fixture_schema("shop"), &ViewParseOptions::default())
}

// ============================================================================
// Single-table lineage
// ============================================================================

#[test]
fn test_single_table_columns_attributed_in_order() {
    let view = parse("SELECT OrderId, CustomerId, Status FROM dbo.Orders");
    assert_eq!(names_of(&view.columns), vec!["OrderId", "CustomerId", "Status"]);
    for column in &view.columns {
        assert_eq!(sources_of(column), vec![src("dbo.Orders", &column.name)]);
    }
}

#[test]
fn test_bracketed_and_unqualified_table_names_resolve() {
    let view = parse("SELECT [Total] FROM [Orders]");
    assert_eq!(view.referenced_tables, vec!["dbo.Orders"]);
    assert_eq!(sources_of(&view.columns[0]), vec![src("dbo.Orders", "Total")]);
    assert_eq!(view.columns[0].data_type, "decimal(10,2)");
    assert!(view.columns[0].is_nullable);
}

#[test]
fn test_wildcard_expands_in_table_order() {
    let view = parse("SELECT * FROM sales.Regions");
    assert_eq!(names_of(&view.columns), vec!["RegionId", "RegionName"]);
    assert_eq!(
        sources_of(&view.columns[1]),
        vec![src("sales.Regions", "RegionName")]
    );
    assert_eq!(view.columns[1].data_type, "nvarchar(50)");
}

#[test]
fn test_wildcard_over_join_suffixes_collisions() {
    let view = parse("SELECT * FROM dbo.Customers c JOIN sales.Regions r ON r.RegionId = c.RegionId");
    assert_eq!(
        names_of(&view.columns),
        vec!["CustomerId", "Name", "RegionId", "RegionId_2", "RegionName"]
    );
    assert_eq!(
        sources_of(&view.columns[3]),
        vec![src("sales.Regions", "RegionId")]
    );
}

#[test]
fn test_wildcard_skips_tables_read_only_by_subqueries() {
    let view = parse(
        "SELECT * FROM dbo.Orders WHERE OrderId IN (SELECT CustomerId FROM dbo.Customers)",
    );
    assert_eq!(
        names_of(&view.columns),
        vec!["OrderId", "CustomerId", "Total", "Status"]
    );
    assert!(view
        .columns
        .iter()
        .all(|c| c.source_table.as_deref() == Some("dbo.Orders")));
    assert_eq!(view.referenced_tables, vec!["dbo.Orders", "dbo.Customers"]);
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_fixture_view_lineage() {
    let view = parse(&fixture_sql("shop", "views/vw_OrderSummary.sql"));

    assert_eq!(view.referenced_tables, vec!["dbo.Orders", "dbo.Customers"]);
    assert_eq!(
        names_of(&view.columns),
        vec!["OrderId", "CustomerName", "TotalSafe", "StatusLabel"]
    );
    assert_eq!(sources_of(&view.columns[1]), vec![src("dbo.Customers", "Name")]);
    assert_eq!(sources_of(&view.columns[2]), vec![src("dbo.Orders", "Total")]);
    assert_eq!(sources_of(&view.columns[3]), vec![src("dbo.Orders", "Status")]);
    assert_eq!(view.columns[3].data_type, "varchar(20)");
    assert!(!view.columns[3].is_nullable);
}

#[test]
fn test_aggregate_without_column_is_unknown() {
    let view = parse(&fixture_sql("shop", "views/vw_RegionCustomers.sql"));
    assert_eq!(view.referenced_tables, vec!["sales.Regions", "dbo.Customers"]);
    assert_eq!(names_of(&view.columns), vec!["RegionName", "CustomerCount"]);
    assert!(view.columns[1].source_columns.is_none());
    assert_eq!(view.columns[1].data_type, UNKNOWN_DATA_TYPE);
}

#[test]
fn test_subquery_does_not_leak_into_select_list() {
    let view = parse(
        "SELECT c.Name, (SELECT COUNT(*) FROM dbo.Orders o WHERE o.CustomerId = c.CustomerId) AS OrderCount \
         FROM dbo.Customers c",
    );
    assert_eq!(names_of(&view.columns), vec!["Name", "OrderCount"]);
    assert_eq!(view.referenced_tables, vec!["dbo.Orders", "dbo.Customers"]);
}

#[test]
fn test_ambiguous_unqualified_column_left_unattributed() {
    let view = parse("SELECT CustomerId FROM dbo.Orders JOIN dbo.Customers ON 1 = 1");
    assert_eq!(view.columns[0].name, "CustomerId");
    assert!(view.columns[0].source_columns.is_none());
}

#[test]
fn test_comments_and_literals_do_not_create_references() {
    let view = parse(
        "SELECT 'FROM fake' AS note, OrderId -- , Total FROM dbo.Customers\n FROM dbo.Orders /* JOIN x */",
    );
    assert_eq!(names_of(&view.columns), vec!["note", "OrderId"]);
    assert_eq!(view.referenced_tables, vec!["dbo.Orders"]);
}

// ============================================================================
// Column lists and fallbacks
// ============================================================================

#[test]
fn test_declared_column_list_renames_positionally() {
    let view = parse("CREATE VIEW sales.v (Id, Label, Extra) AS SELECT * FROM sales.Regions");
    assert_eq!(names_of(&view.columns), vec!["Id", "Label", "Extra"]);
    assert_eq!(sources_of(&view.columns[0]), vec![src("sales.Regions", "RegionId")]);
    assert!(view.columns[2].source_columns.is_none());
}

#[test]
fn test_fallback_columns_supply_unknown_types() {
    let options = ViewParseOptions {
        fallback_columns: Some(vec![column("OrderCount", "int", false)]),
        default_schema: None,
    };
    let view = parse_view_definition(
        "SELECT COUNT(*) AS OrderCount FROM dbo.Orders",
        &load_fixture_schema("shop"),
        &options,
    );
    assert_eq!(view.columns[0].data_type, "int");
    assert!(!view.columns[0].is_nullable);
}

#[test]
fn test_malformed_input_never_panics() {
    for sql in [
        "",
        "SELECT",
        "SELECT (((",
        "SELECT a, FROM",
        "CREATE VIEW v ( AS",
        "SELECT 'unterminated",
        "SELECT [unterminated FROM dbo.Orders",
        "/* open comment SELECT a FROM b",
        "FROM FROM FROM",
    ] {
        let _ = parse(sql);
    }
}
