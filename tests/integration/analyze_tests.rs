//! Schema-level analysis over the shop fixture

use pretty_assertions::assert_eq;

use tsql_lineage::{
    analyze_schema, regenerate_definition, AnalyzeOptions, ProcedureParameter, SchemaGraph,
    ViewNode,
};

use crate::common::{load_fixture_schema, names_of, sources_of, src};

fn analyzed() -> SchemaGraph {
    analyze_schema(&load_fixture_schema("shop"), &AnalyzeOptions::default())
}

fn view<'a>(graph: &'a SchemaGraph, id: &str) -> &'a ViewNode {
    graph.views.iter().find(|v| v.id == id).expect("view in fixture")
}

// ============================================================================
// Views
// ============================================================================

#[test]
fn test_view_lineage_resolved() {
    let graph = analyzed();
    let summary = view(&graph, "dbo.vw_OrderSummary");

    assert_eq!(summary.referenced_tables, vec!["dbo.Orders", "dbo.Customers"]);
    assert_eq!(
        names_of(&summary.columns),
        vec!["OrderId", "CustomerName", "TotalSafe", "StatusLabel"]
    );
    assert_eq!(sources_of(&summary.columns[0]), vec![src("dbo.Orders", "OrderId")]);
    assert_eq!(sources_of(&summary.columns[1]), vec![src("dbo.Customers", "Name")]);
    assert_eq!(summary.columns[1].data_type, "nvarchar(100)");

    let total = &summary.columns[2];
    assert_eq!(sources_of(total), vec![src("dbo.Orders", "Total")]);
    assert_eq!(total.source_table.as_deref(), Some("dbo.Orders"));
    assert_eq!(total.source_column.as_deref(), Some("Total"));
    assert!(total.is_nullable);
}

#[test]
fn test_view_column_list_applied() {
    let graph = analyzed();
    let regions = view(&graph, "sales.vw_Regions");

    assert_eq!(regions.referenced_tables, vec!["sales.Regions"]);
    assert_eq!(names_of(&regions.columns), vec!["Id", "Label"]);
    assert_eq!(sources_of(&regions.columns[0]), vec![src("sales.Regions", "RegionId")]);
    assert_eq!(sources_of(&regions.columns[1]), vec![src("sales.Regions", "RegionName")]);
    assert_eq!(regions.columns[1].data_type, "nvarchar(50)");
}

#[test]
fn test_view_without_definition_unchanged() {
    let mut graph = load_fixture_schema("shop");
    graph.views[0].definition = "   ".to_string();
    let before = serde_json::to_value(&graph.views[0]).unwrap();

    let result = analyze_schema(&graph, &AnalyzeOptions::default());
    assert_eq!(serde_json::to_value(&result.views[0]).unwrap(), before);
}

#[test]
fn test_many_views_analyzed_in_parallel() {
    let mut graph = load_fixture_schema("shop");
    let template = graph.views[0].clone();
    graph.views = (0..20)
        .map(|i| ViewNode {
            id: format!("dbo.vw_Copy{}", i),
            name: format!("vw_Copy{}", i),
            ..template.clone()
        })
        .collect();

    let result = analyze_schema(&graph, &AnalyzeOptions::default());
    assert_eq!(result.views.len(), 20);
    for (i, view) in result.views.iter().enumerate() {
        assert_eq!(view.id, format!("dbo.vw_Copy{}", i));
        assert_eq!(view.referenced_tables, vec!["dbo.Orders", "dbo.Customers"]);
        assert_eq!(sources_of(&view.columns[3]), vec![src("dbo.Orders", "Status")]);
    }
}

// ============================================================================
// Routines
// ============================================================================

#[test]
fn test_procedure_parameters_and_references() {
    let graph = analyzed();
    let procedure = &graph.stored_procedures[0];

    assert_eq!(
        procedure.parameters,
        vec![
            ProcedureParameter {
                name: "@CustomerId".to_string(),
                data_type: "int".to_string(),
                is_output: false,
            },
            ProcedureParameter {
                name: "@Total".to_string(),
                data_type: "decimal(10,2)".to_string(),
                is_output: false,
            },
            ProcedureParameter {
                name: "@OrderId".to_string(),
                data_type: "int".to_string(),
                is_output: true,
            },
        ]
    );
    assert_eq!(procedure.referenced_tables, vec!["dbo.Customers"]);
    assert_eq!(procedure.affected_tables, vec!["dbo.Orders"]);
}

#[test]
fn test_existing_parameters_kept() {
    let mut graph = load_fixture_schema("shop");
    let declared = vec![ProcedureParameter {
        name: "@CustomerId".to_string(),
        data_type: "bigint".to_string(),
        is_output: false,
    }];
    graph.stored_procedures[0].parameters = declared.clone();

    let result = analyze_schema(&graph, &AnalyzeOptions::default());
    assert_eq!(result.stored_procedures[0].parameters, declared);
    assert_eq!(result.stored_procedures[0].affected_tables, vec!["dbo.Orders"]);
}

#[test]
fn test_function_return_type_and_references() {
    let graph = analyzed();
    let function = &graph.functions[0];

    assert_eq!(function.return_type, "decimal(18,2)");
    assert_eq!(function.parameters.len(), 1);
    assert_eq!(function.parameters[0].name, "@CustomerId");
    assert_eq!(function.referenced_tables, vec!["dbo.Orders"]);
    assert!(function.affected_tables.is_empty());
}

#[test]
fn test_trigger_pseudo_tables_excluded() {
    let graph = analyzed();
    let trigger = &graph.triggers[0];

    assert!(trigger.referenced_tables.is_empty());
    assert_eq!(trigger.affected_tables, vec!["dbo.OrderAudit"]);
    assert_eq!(trigger.table_id, "dbo.Orders");
}

// ============================================================================
// Whole snapshot
// ============================================================================

#[test]
fn test_tables_and_relationships_preserved() {
    let original = load_fixture_schema("shop");
    let graph = analyze_schema(&original, &AnalyzeOptions::default());

    assert_eq!(
        serde_json::to_value(&graph.tables).unwrap(),
        serde_json::to_value(&original.tables).unwrap()
    );
    assert_eq!(graph.relationships.len(), 1);
    assert_eq!(graph.relationships[0].id, "FK_Orders_Customers");
}

#[test]
fn test_enriched_snapshot_round_trips_through_json() {
    let graph = analyzed();
    let json = serde_json::to_string_pretty(&graph).unwrap();
    let reloaded: SchemaGraph = serde_json::from_str(&json).unwrap();

    assert_eq!(
        serde_json::to_value(&reloaded).unwrap(),
        serde_json::to_value(&graph).unwrap()
    );
}

#[test]
fn test_second_pass_is_stable() {
    let once = analyzed();
    let twice = analyze_schema(&once, &AnalyzeOptions::default());
    assert_eq!(
        serde_json::to_value(&twice).unwrap(),
        serde_json::to_value(&once).unwrap()
    );
}

// ============================================================================
// Regeneration
// ============================================================================

#[test]
fn test_regenerate_view_from_lineage() {
    let graph = analyzed();
    assert_eq!(
        regenerate_definition(&graph, "DBO.VW_ORDERSUMMARY").unwrap(),
        "CREATE VIEW dbo.vw_OrderSummary AS\n\
         SELECT\n    \
         dbo.Orders.OrderId,\n    \
         dbo.Customers.Name AS CustomerName,\n    \
         dbo.Orders.Total AS TotalSafe,\n    \
         dbo.Orders.Status AS StatusLabel"
    );
}

#[test]
fn test_regenerate_routines() {
    let graph = analyzed();

    let procedure = regenerate_definition(&graph, "dbo.usp_PlaceOrder").unwrap();
    assert!(procedure.starts_with("CREATE PROCEDURE dbo.usp_PlaceOrder\n    @CustomerId int,"));
    assert!(procedure.contains("@OrderId int OUTPUT"));

    let function = regenerate_definition(&graph, "dbo.fn_CustomerTotal").unwrap();
    assert!(function.contains("RETURNS decimal(18,2)"));

    assert!(regenerate_definition(&graph, "dbo.Orders").is_none());
    assert!(regenerate_definition(&graph, "dbo.Missing").is_none());
}
