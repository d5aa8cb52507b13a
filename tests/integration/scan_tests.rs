//! Directory scans over copies of the shop fixture

use pretty_assertions::assert_eq;

use tsql_lineage::parser::SqlObjectKind;
use tsql_lineage::scan::{discover_sql_files, scan_directory, ScanOptions};
use tsql_lineage::{LineageError, SchemaGraph};

use crate::common::{load_fixture_schema, TestContext};

fn relative_paths(ctx: &TestContext, paths: &[std::path::PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| {
            p.strip_prefix(ctx.sql_dir())
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[test]
fn test_discover_skips_build_output() {
    let ctx = TestContext::with_fixture("shop");
    let files = discover_sql_files(&ctx.sql_dir()).unwrap();

    assert_eq!(
        relative_paths(&ctx, &files),
        vec![
            "functions/fn_CustomerTotal.sql",
            "procedures/usp_PlaceOrder.sql",
            "tables/Orders.sql",
            "triggers/trg_Orders_Audit.sql",
            "views/vw_OrderSummary.sql",
            "views/vw_RegionCustomers.sql",
        ]
    );
}

#[test]
fn test_discover_matches_extension_case_insensitively() {
    let ctx = TestContext::empty();
    ctx.write_file("sql/Upper.SQL", b"CREATE VIEW v AS SELECT 1 AS x");
    ctx.write_file("sql/notes.txt", b"CREATE VIEW w AS SELECT 1 AS x");
    ctx.write_file("sql/obj/Release/gen.sql", b"CREATE VIEW g AS SELECT 1 AS x");

    let files = discover_sql_files(&ctx.sql_dir()).unwrap();
    assert_eq!(relative_paths(&ctx, &files), vec!["Upper.SQL"]);
}

#[test]
fn test_scan_fixture_directory() {
    let ctx = TestContext::with_fixture("shop");
    let schema = load_fixture_schema("shop");
    let report = scan_directory(&ctx.sql_dir(), &schema, &ScanOptions::default()).unwrap();

    let summary: Vec<(SqlObjectKind, &str)> = report
        .objects
        .iter()
        .map(|o| (o.analysis.kind, o.analysis.name.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (SqlObjectKind::Function, "dbo.fn_CustomerTotal"),
            (SqlObjectKind::Procedure, "dbo.usp_PlaceOrder"),
            (SqlObjectKind::Trigger, "dbo.trg_Orders_Audit"),
            (SqlObjectKind::View, "dbo.vw_OrderSummary"),
            (SqlObjectKind::View, "sales.vw_RegionCustomers"),
        ]
    );
    assert_eq!(relative_paths(&ctx, &report.unrecognized), vec!["tables/Orders.sql"]);

    let function = &report.objects[0].analysis;
    assert_eq!(function.return_type.as_deref(), Some("decimal(18,2)"));

    let procedure = &report.objects[1].analysis;
    let signature = procedure.signature.as_ref().unwrap();
    assert_eq!(signature.parameters.len(), 3);
    assert!(signature.parameters[2].is_output);
    let references = procedure.references.as_ref().unwrap();
    assert_eq!(references.affected_tables, vec!["dbo.Orders"]);

    let trigger = &report.objects[2].analysis;
    assert_eq!(
        trigger.references.as_ref().unwrap().affected_tables,
        vec!["dbo.OrderAudit"]
    );

    let view = report.objects[4].analysis.view.as_ref().unwrap();
    assert_eq!(view.referenced_tables, vec!["sales.Regions", "dbo.Customers"]);
}

#[test]
fn test_scan_without_schema_keeps_raw_names() {
    let ctx = TestContext::with_fixture("shop");
    let report = scan_directory(
        &ctx.sql_dir(),
        &SchemaGraph::default(),
        &ScanOptions {
            default_schema: Some("dbo".to_string()),
            verbose: false,
        },
    )
    .unwrap();

    let procedure = &report.objects[1].analysis;
    let references = procedure.references.as_ref().unwrap();
    assert_eq!(references.affected_tables, vec!["dbo.Orders"]);
    assert_eq!(references.referenced_tables, vec!["dbo.Customers"]);
}

#[test]
fn test_verbose_scan_with_empty_schema() {
    let ctx = TestContext::with_fixture("shop");
    let report = scan_directory(
        &ctx.sql_dir(),
        &SchemaGraph::default(),
        &ScanOptions {
            default_schema: None,
            verbose: true,
        },
    )
    .unwrap();

    assert_eq!(report.objects.len(), 5);
    let view = report.objects[3].analysis.view.as_ref().unwrap();
    assert_eq!(view.referenced_tables, vec!["dbo.Orders", "dbo.Customers"]);
}

#[test]
fn test_scan_reads_windows_1252_files() {
    let ctx = TestContext::empty();
    ctx.write_file(
        "sql/vw_Cafe.sql",
        b"CREATE VIEW dbo.vw_Caf\xe9 AS SELECT Name FROM dbo.Customers",
    );

    let report = scan_directory(
        &ctx.sql_dir(),
        &load_fixture_schema("shop"),
        &ScanOptions::default(),
    )
    .unwrap();

    assert_eq!(report.objects.len(), 1);
    assert_eq!(report.objects[0].analysis.name, "dbo.vw_Caf\u{e9}");
    let view = report.objects[0].analysis.view.as_ref().unwrap();
    assert_eq!(view.columns[0].data_type, "nvarchar(100)");
}

#[test]
fn test_scan_many_files() {
    let ctx = TestContext::empty();
    for i in 0..12 {
        ctx.write_file(
            &format!("sql/views/vw_{:02}.sql", i),
            format!("CREATE VIEW dbo.vw_{:02} AS SELECT OrderId FROM dbo.Orders", i).as_bytes(),
        );
    }

    let report = scan_directory(
        &ctx.sql_dir(),
        &load_fixture_schema("shop"),
        &ScanOptions::default(),
    )
    .unwrap();

    assert_eq!(report.objects.len(), 12);
    assert_eq!(report.objects[0].analysis.name, "dbo.vw_00");
    assert_eq!(report.objects[11].analysis.name, "dbo.vw_11");
    assert!(report.unrecognized.is_empty());
}

#[test]
fn test_scan_report_serializes_flat() {
    let ctx = TestContext::with_fixture("shop");
    let report = scan_directory(
        &ctx.sql_dir(),
        &load_fixture_schema("shop"),
        &ScanOptions::default(),
    )
    .unwrap();

    let value = serde_json::to_value(&report).unwrap();
    let function = &value["objects"][0];
    assert_eq!(function["kind"], "function");
    assert_eq!(function["returnType"], "decimal(18,2)");
    assert!(function.get("view").is_none());
    assert!(function["path"].is_string());
    assert!(value["unrecognized"].is_array());
}

#[test]
fn test_missing_directory_errors() {
    let ctx = TestContext::empty();
    let result = scan_directory(
        &ctx.root.join("does-not-exist"),
        &SchemaGraph::default(),
        &ScanOptions::default(),
    );

    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LineageError>(),
        Some(LineageError::DirectoryScanError { .. })
    ));
}
