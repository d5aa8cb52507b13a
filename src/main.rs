use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use tsql_lineage::parser::{
    parse_function_return_type, parse_routine_definition, parse_routine_parameters,
    parse_view_definition, RoutineParseOptions, RoutineReferences, RoutineSignature,
    ViewParseOptions,
};
use tsql_lineage::scan::{scan_directory, ScanOptions};
use tsql_lineage::util::read_file_with_encoding_fallback;
use tsql_lineage::{
    analyze_schema, load_schema, regenerate_definition, AnalyzeOptions, LineageError, SchemaGraph,
};

#[derive(Parser)]
#[command(name = "tsql-lineage")]
#[command(author, version, about = "Column lineage and dependency analysis for T-SQL definitions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a schema snapshot with lineage, parameters and table references
    Analyze {
        /// Path to the schema snapshot JSON
        #[arg(short, long)]
        schema: PathBuf,

        /// Output path for the enriched snapshot (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Schema assumed for unqualified table names
        #[arg(short, long)]
        default_schema: Option<String>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse a view definition and print its columns and referenced tables
    View {
        /// Path to the .sql file holding the view definition
        #[arg(short, long)]
        file: PathBuf,

        /// Schema snapshot JSON used to resolve tables and columns
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Schema assumed for unqualified table names
        #[arg(short, long)]
        default_schema: Option<String>,
    },

    /// Parse a procedure or function definition
    Routine {
        /// Path to the .sql file holding the routine definition
        #[arg(short, long)]
        file: PathBuf,

        /// Schema snapshot JSON used to resolve tables
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Schema assumed for unqualified table names
        #[arg(short, long)]
        default_schema: Option<String>,
    },

    /// Analyze every .sql file under a directory
    Scan {
        /// Directory to scan
        #[arg(long)]
        dir: PathBuf,

        /// Schema snapshot JSON used to resolve tables and columns
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Schema assumed for unqualified table names
        #[arg(short, long)]
        default_schema: Option<String>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Regenerate a definition for a view, procedure or function in a snapshot
    Generate {
        /// Path to the schema snapshot JSON
        #[arg(short, long)]
        schema: PathBuf,

        /// Canonical object id (schema.name)
        #[arg(long)]
        object: String,
    },
}

/// Everything the routine parsers report for one definition
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoutineReport {
    #[serde(flatten)]
    signature: RoutineSignature,
    return_type: Option<String>,
    #[serde(flatten)]
    references: RoutineReferences,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            schema,
            output,
            default_schema,
            verbose,
        } => {
            let graph = load_schema(&schema)?;
            let options = AnalyzeOptions {
                default_schema,
                verbose,
            };
            let enriched = analyze_schema(&graph, &options);
            let json = serde_json::to_string_pretty(&enriched)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json).map_err(|source| LineageError::OutputWriteError {
                        path: path.clone(),
                        source,
                    })?;
                    if verbose {
                        println!("Wrote enriched schema: {}", path.display());
                    }
                }
                None => println!("{}", json),
            }
        }
        Commands::View {
            file,
            schema,
            default_schema,
        } => {
            let definition = read_sql(&file)?;
            let graph = load_optional_schema(schema.as_deref())?;
            let options = ViewParseOptions {
                fallback_columns: None,
                default_schema,
            };
            let view = parse_view_definition(&definition, &graph, &options);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        Commands::Routine {
            file,
            schema,
            default_schema,
        } => {
            let definition = read_sql(&file)?;
            let graph = load_optional_schema(schema.as_deref())?;
            let report = RoutineReport {
                signature: parse_routine_parameters(&definition),
                return_type: parse_function_return_type(&definition),
                references: parse_routine_definition(
                    &definition,
                    &graph,
                    &RoutineParseOptions { default_schema },
                ),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Scan {
            dir,
            schema,
            default_schema,
            verbose,
        } => {
            let graph = load_optional_schema(schema.as_deref())?;
            let options = ScanOptions {
                default_schema,
                verbose,
            };
            let report = scan_directory(&dir, &graph, &options)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Generate { schema, object } => {
            let graph = load_schema(&schema)?;
            let definition = regenerate_definition(&graph, &object)
                .ok_or(LineageError::ObjectNotFound { id: object })?;
            println!("{}", definition);
        }
    }

    Ok(())
}

fn read_sql(path: &Path) -> Result<String> {
    let content =
        read_file_with_encoding_fallback(path).map_err(|source| LineageError::SqlFileReadError {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(content)
}

fn load_optional_schema(path: Option<&Path>) -> Result<SchemaGraph> {
    match path {
        Some(path) => load_schema(path),
        None => Ok(SchemaGraph::default()),
    }
}
