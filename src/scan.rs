//! Directory scanning for loose `.sql` files
//!
//! Each file is classified by its `CREATE`/`ALTER` header and analyzed with
//! the matching parser. Files that define no view or routine are listed as
//! unrecognized rather than failing the scan.

use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;

use crate::error::LineageError;
use crate::model::{SchemaGraph, SchemaIndex};
use crate::parser::{
    parse_function_return_type, parse_object_header, parse_routine_definition_with_index,
    parse_routine_parameters, parse_view_definition_with_index, RoutineParseOptions,
    RoutineReferences, RoutineSignature, SqlObjectKind, ViewDefinition, ViewParseOptions,
};
use crate::util::read_file_with_encoding_fallback;
use crate::PARALLEL_THRESHOLD;

/// Options for [`scan_directory`]
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub default_schema: Option<String>,
    pub verbose: bool,
}

/// What the parsers found in one definition
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectAnalysis {
    pub kind: SqlObjectKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<ViewDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<RoutineSignature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<RoutineReferences>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedObject {
    pub path: PathBuf,
    #[serde(flatten)]
    pub analysis: ObjectAnalysis,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub objects: Vec<ScannedObject>,
    /// Files with no view, procedure, function or trigger header
    pub unrecognized: Vec<PathBuf>,
}

/// Find `.sql` files under `dir`, skipping `bin` and `obj` build output.
/// Sorted for stable output.
pub fn discover_sql_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && is_build_output_dir(e.file_name())));

    for entry in walker {
        let entry = entry.map_err(|source| LineageError::DirectoryScanError {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        let is_sql = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sql"));
        if entry.file_type().is_file() && is_sql {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn is_build_output_dir(name: &std::ffi::OsStr) -> bool {
    name.eq_ignore_ascii_case("bin") || name.eq_ignore_ascii_case("obj")
}

/// Analyze every `.sql` file under `dir` against a schema snapshot.
pub fn scan_directory(dir: &Path, schema: &SchemaGraph, options: &ScanOptions) -> Result<ScanReport> {
    let files = discover_sql_files(dir)?;

    if options.verbose {
        println!("Found {} SQL files in {}", files.len(), dir.display());
    }

    let index = SchemaIndex::build(schema);
    if options.verbose && index.is_empty() {
        println!("No tables or views in schema; table names are kept as written");
    }
    let default_schema = options.default_schema.as_deref();

    let results: Vec<Result<(PathBuf, Option<ObjectAnalysis>)>> = if files.len() >= PARALLEL_THRESHOLD {
        files
            .par_iter()
            .map(|file| scan_file(file, &index, default_schema))
            .collect()
    } else {
        files
            .iter()
            .map(|file| scan_file(file, &index, default_schema))
            .collect()
    };

    let mut report = ScanReport::default();
    for result in results {
        match result? {
            (path, Some(analysis)) => report.objects.push(ScannedObject { path, analysis }),
            (path, None) => report.unrecognized.push(path),
        }
    }

    if options.verbose {
        println!(
            "Analyzed {} objects ({} files unrecognized)",
            report.objects.len(),
            report.unrecognized.len()
        );
    }

    Ok(report)
}

fn scan_file(
    path: &Path,
    index: &SchemaIndex,
    default_schema: Option<&str>,
) -> Result<(PathBuf, Option<ObjectAnalysis>)> {
    let content =
        read_file_with_encoding_fallback(path).map_err(|source| LineageError::SqlFileReadError {
            path: path.to_path_buf(),
            source,
        })?;
    Ok((
        path.to_path_buf(),
        analyze_definition(&content, index, default_schema),
    ))
}

/// Classify a definition by its header and run the parsers that apply.
/// `None` when the text creates no view or routine.
pub fn analyze_definition(
    definition: &str,
    index: &SchemaIndex,
    default_schema: Option<&str>,
) -> Option<ObjectAnalysis> {
    let header = parse_object_header(definition)?;
    let mut analysis = ObjectAnalysis {
        kind: header.kind,
        name: header.name,
        view: None,
        signature: None,
        return_type: None,
        references: None,
    };

    let routine_options = RoutineParseOptions {
        default_schema: default_schema.map(str::to_string),
    };

    match header.kind {
        SqlObjectKind::View => {
            let view_options = ViewParseOptions {
                fallback_columns: None,
                default_schema: default_schema.map(str::to_string),
            };
            analysis.view = Some(parse_view_definition_with_index(definition, index, &view_options));
        }
        SqlObjectKind::Procedure => {
            analysis.signature = Some(parse_routine_parameters(definition));
            analysis.references =
                Some(parse_routine_definition_with_index(definition, index, &routine_options));
        }
        SqlObjectKind::Function => {
            analysis.signature = Some(parse_routine_parameters(definition));
            analysis.return_type = parse_function_return_type(definition);
            analysis.references =
                Some(parse_routine_definition_with_index(definition, index, &routine_options));
        }
        SqlObjectKind::Trigger => {
            analysis.references =
                Some(parse_routine_definition_with_index(definition, index, &routine_options));
        }
    }

    Some(analysis)
}
