//! View definition parsing
//!
//! Ties the pipeline together for `CREATE VIEW` text: tokenize, collect the
//! tables the view reads, split the top-level select list, resolve lineage,
//! then apply an explicit `VIEW name (col, ...)` column list and any fallback
//! column metadata from an existing snapshot.

use serde::Serialize;
use sqlparser::keywords::Keyword;
#[cfg(feature = "tracing")]
use tracing::debug;

use super::identifier_utils::normalize_identifier;
use super::lineage::{ensure_unique_column_names, resolve_select_columns};
use super::select_items::split_select_items;
use super::table_refs::extract_table_references;
use super::token_cursor::{split_top_level_commas, TokenCursor};
use super::tokenizer::{tokenize_sql, SqlToken};
use crate::model::{Column, SchemaGraph, SchemaIndex};

/// Options for [`parse_view_definition`]
#[derive(Debug, Clone, Default)]
pub struct ViewParseOptions {
    /// Columns already known for the view (e.g. from a catalog snapshot).
    /// Used to fill in types lineage cannot determine.
    pub fallback_columns: Option<Vec<Column>>,
    /// Schema assumed for unqualified table names
    pub default_schema: Option<String>,
}

/// Output columns of a view and the tables it reads
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDefinition {
    pub columns: Vec<Column>,
    pub referenced_tables: Vec<String>,
}

/// Parse a view definition against a schema snapshot. Never fails; text
/// without a SELECT yields no columns.
pub fn parse_view_definition(
    definition: &str,
    schema: &SchemaGraph,
    options: &ViewParseOptions,
) -> ViewDefinition {
    let index = SchemaIndex::build(schema);
    parse_view_definition_with_index(definition, &index, options)
}

/// Same as [`parse_view_definition`] with a prebuilt index, for callers
/// parsing many views against one snapshot.
pub fn parse_view_definition_with_index(
    definition: &str,
    index: &SchemaIndex,
    options: &ViewParseOptions,
) -> ViewDefinition {
    let tokens = tokenize_sql(definition);
    let references = extract_table_references(&tokens, index, options.default_schema.as_deref());
    let items = split_select_items(&tokens);
    let mut columns = resolve_select_columns(&items, &references, index);

    if let Some(names) = parse_view_column_list(&tokens) {
        apply_column_list(&mut columns, names);
    }
    if let Some(fallback) = options.fallback_columns.as_deref() {
        apply_fallback_columns(&mut columns, fallback);
    }
    ensure_unique_column_names(&mut columns);

    #[cfg(feature = "tracing")]
    debug!(
        columns = columns.len(),
        tables = references.read_tables.len(),
        "parsed view definition"
    );

    ViewDefinition {
        columns,
        referenced_tables: references.read_tables,
    }
}

/// Column names declared in `CREATE [OR ALTER] VIEW name (a, b, ...)` or
/// `ALTER VIEW name (...)`, normalized. `None` when there is no list.
pub fn parse_view_column_list(tokens: &[SqlToken]) -> Option<Vec<String>> {
    let mut cursor = TokenCursor::new(tokens);
    find_view_header(&mut cursor)?;
    cursor.parse_qualified_name()?;
    let inner = cursor.take_parenthesized()?;

    let names: Vec<String> = split_top_level_commas(inner)
        .into_iter()
        .filter_map(|piece| piece.iter().find(|t| t.is_word()))
        .map(|t| normalize_identifier(&t.value))
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

/// Move the cursor past the first `CREATE [OR ALTER] VIEW` / `ALTER VIEW`.
fn find_view_header(cursor: &mut TokenCursor) -> Option<()> {
    while !cursor.is_at_end() {
        if cursor.check_keyword(Keyword::SELECT) {
            return None;
        }
        if cursor.expect_keyword(Keyword::CREATE).is_some() {
            if cursor.check_keyword(Keyword::OR) {
                cursor.advance();
                cursor.expect_keyword(Keyword::ALTER);
            }
            if cursor.expect_keyword(Keyword::VIEW).is_some() {
                return Some(());
            }
        } else if cursor.expect_keyword(Keyword::ALTER).is_some() {
            if cursor.expect_keyword(Keyword::VIEW).is_some() {
                return Some(());
            }
        } else {
            cursor.advance();
        }
    }
    None
}

/// Declared names override resolved columns by position; extra names get
/// columns with no provenance.
fn apply_column_list(columns: &mut Vec<Column>, names: Vec<String>) {
    for (position, name) in names.into_iter().enumerate() {
        match columns.get_mut(position) {
            Some(column) => column.name = name,
            None => columns.push(Column::unresolved(name)),
        }
    }
}

fn apply_fallback_columns(columns: &mut Vec<Column>, fallback: &[Column]) {
    if columns.is_empty() {
        *columns = fallback.to_vec();
        return;
    }

    for column in columns.iter_mut().filter(|c| c.has_unknown_type()) {
        if let Some(known) = fallback
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(&column.name) && !f.has_unknown_type())
        {
            column.data_type = known.data_type.clone();
            column.is_nullable = known.is_nullable;
        }
    }
}
