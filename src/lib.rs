//! tsql-lineage: column lineage and dependency analysis for T-SQL definitions
//!
//! This library reads view, procedure, function and trigger text against a
//! schema snapshot and recovers column provenance, routine signatures and
//! the tables each object reads and writes. It can also regenerate canonical
//! definitions from the structured metadata.

pub mod error;
pub mod generator;
pub mod model;
pub mod parser;
pub mod scan;
pub mod util;

use std::path::Path;

use anyhow::Result;
use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::info_span;

pub use error::LineageError;
pub use model::{
    Column, ColumnSource, ProcedureParameter, ScalarFunction, SchemaGraph, SchemaIndex,
    StoredProcedure, Trigger, ViewNode,
};

use parser::{
    parse_function_return_type, parse_routine_definition_with_index, parse_routine_parameters,
    parse_view_definition_with_index, RoutineParseOptions, ViewParseOptions,
};

/// Minimum number of objects to benefit from parallel processing.
/// Below this threshold, sequential processing is faster due to rayon overhead.
pub(crate) const PARALLEL_THRESHOLD: usize = 8;

/// Options for schema-level analysis
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    /// Schema assumed for unqualified table names
    pub default_schema: Option<String>,
    /// Enable verbose output
    pub verbose: bool,
}

/// Load a schema snapshot from a JSON file
pub fn load_schema(path: &Path) -> Result<SchemaGraph> {
    let content = std::fs::read_to_string(path).map_err(|source| LineageError::SchemaReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = serde_json::from_str(&content).map_err(|source| LineageError::SchemaParseError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(graph)
}

/// Enrich a schema snapshot from its definitions.
///
/// Views get lineage-resolved columns (existing columns act as fallback) and
/// their referenced tables; procedures, functions and triggers get the
/// tables they read and write. Parameters and function return types are
/// parsed only when the snapshot has none.
pub fn analyze_schema(graph: &SchemaGraph, options: &AnalyzeOptions) -> SchemaGraph {
    #[cfg(feature = "tracing")]
    let _span = info_span!(
        "analyze_schema",
        views = graph.views.len(),
        procedures = graph.stored_procedures.len(),
        functions = graph.functions.len(),
        triggers = graph.triggers.len()
    )
    .entered();

    if options.verbose {
        println!(
            "Analyzing {} views, {} procedures, {} functions, {} triggers",
            graph.views.len(),
            graph.stored_procedures.len(),
            graph.functions.len(),
            graph.triggers.len()
        );
    }

    let index = SchemaIndex::build(graph);
    if options.verbose {
        println!("Indexed columns of {} tables and views", index.len());
    }
    let routine_options = RoutineParseOptions {
        default_schema: options.default_schema.clone(),
    };

    let views = map_objects(&graph.views, |view| {
        analyze_view(view, &index, options.default_schema.as_deref())
    });
    let stored_procedures = map_objects(&graph.stored_procedures, |procedure| {
        analyze_procedure(procedure, &index, &routine_options)
    });
    let functions = map_objects(&graph.functions, |function| {
        analyze_function(function, &index, &routine_options)
    });
    let triggers = map_objects(&graph.triggers, |trigger| {
        analyze_trigger(trigger, &index, &routine_options)
    });

    if options.verbose {
        let resolved = views
            .iter()
            .flat_map(|v| &v.columns)
            .filter(|c| c.source_columns.is_some())
            .count();
        println!("Resolved lineage for {} view columns", resolved);
    }

    SchemaGraph {
        tables: graph.tables.clone(),
        views,
        relationships: graph.relationships.clone(),
        triggers,
        stored_procedures,
        functions,
    }
}

/// Regenerate a definition for the view, procedure or function with `id`
/// (case-insensitive). `None` when no such object exists.
pub fn regenerate_definition(graph: &SchemaGraph, id: &str) -> Option<String> {
    if let Some(view) = graph.views.iter().find(|v| v.id.eq_ignore_ascii_case(id)) {
        return Some(generator::generate_create_view(&view.id, &view.columns));
    }
    if let Some(procedure) = graph
        .stored_procedures
        .iter()
        .find(|p| p.id.eq_ignore_ascii_case(id))
    {
        return Some(generator::generate_procedure_definition(
            &procedure.id,
            &procedure.parameters,
        ));
    }
    graph
        .functions
        .iter()
        .find(|f| f.id.eq_ignore_ascii_case(id))
        .map(|function| {
            generator::generate_function_definition(
                &function.id,
                &function.parameters,
                Some(function.return_type.as_str()),
            )
        })
}

/// Map over a slice, in parallel once it is large enough to pay off
fn map_objects<T, R, F>(items: &[T], f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync + Send,
{
    if items.len() >= PARALLEL_THRESHOLD {
        items.par_iter().map(f).collect()
    } else {
        items.iter().map(f).collect()
    }
}

fn analyze_view(view: &ViewNode, index: &SchemaIndex, default_schema: Option<&str>) -> ViewNode {
    if view.definition.trim().is_empty() {
        return view.clone();
    }

    let options = ViewParseOptions {
        fallback_columns: if view.columns.is_empty() {
            None
        } else {
            Some(view.columns.clone())
        },
        default_schema: default_schema.map(str::to_string),
    };
    let parsed = parse_view_definition_with_index(&view.definition, index, &options);

    ViewNode {
        columns: parsed.columns,
        referenced_tables: parsed.referenced_tables,
        ..view.clone()
    }
}

fn analyze_procedure(
    procedure: &StoredProcedure,
    index: &SchemaIndex,
    options: &RoutineParseOptions,
) -> StoredProcedure {
    let mut result = procedure.clone();
    if procedure.definition.trim().is_empty() {
        return result;
    }

    if result.parameters.is_empty() {
        result.parameters = parse_routine_parameters(&procedure.definition).parameters;
    }
    let references = parse_routine_definition_with_index(&procedure.definition, index, options);
    result.referenced_tables = references.referenced_tables;
    result.affected_tables = references.affected_tables;
    result
}

fn analyze_function(
    function: &ScalarFunction,
    index: &SchemaIndex,
    options: &RoutineParseOptions,
) -> ScalarFunction {
    let mut result = function.clone();
    if function.definition.trim().is_empty() {
        return result;
    }

    if result.parameters.is_empty() {
        result.parameters = parse_routine_parameters(&function.definition).parameters;
    }
    if result.return_type.trim().is_empty() {
        result.return_type = parse_function_return_type(&function.definition).unwrap_or_default();
    }
    let references = parse_routine_definition_with_index(&function.definition, index, options);
    result.referenced_tables = references.referenced_tables;
    result.affected_tables = references.affected_tables;
    result
}

fn analyze_trigger(trigger: &Trigger, index: &SchemaIndex, options: &RoutineParseOptions) -> Trigger {
    let mut result = trigger.clone();
    if trigger.definition.trim().is_empty() {
        return result;
    }

    let references = parse_routine_definition_with_index(&trigger.definition, index, options);
    result.referenced_tables = references.referenced_tables;
    result.affected_tables = references.affected_tables;
    result
}
