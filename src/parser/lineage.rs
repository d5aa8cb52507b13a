//! Column lineage for SELECT list items
//!
//! Each select item is split into an optional alias and its expression
//! tokens. `*` and `q.*` expand to the columns of the tables in scope; any
//! other expression is searched for identifier chains (`col`, `alias.col`,
//! `schema.table.col`) which are resolved through the alias map of the
//! statement. Chains that cannot be pinned to exactly one table are dropped
//! rather than guessed.

use std::collections::HashSet;

use sqlparser::keywords::Keyword;
#[cfg(feature = "tracing")]
use tracing::debug;

use super::identifier_utils::normalize_identifier;
use super::table_refs::TableReferences;
use super::tokenizer::SqlToken;
use crate::model::{Column, ColumnSource, SchemaIndex};

/// Functions whose first argument is a date part, not a column.
const DATE_PART_FUNCTIONS: &[&str] = &[
    "DATEADD",
    "DATEDIFF",
    "DATEDIFF_BIG",
    "DATENAME",
    "DATEPART",
    "DATETRUNC",
];

/// Functions whose first argument is a data type.
const TYPE_ARGUMENT_FUNCTIONS: &[&str] = &["CONVERT", "TRY_CONVERT"];

/// Resolve every select item to an output column with provenance.
///
/// Column names are made unique (case-insensitively) before returning.
pub fn resolve_select_columns(
    items: &[&[SqlToken]],
    references: &TableReferences,
    index: &SchemaIndex,
) -> Vec<Column> {
    let resolver = LineageResolver { references, index };
    let mut columns = Vec::new();

    for (position, item) in items.iter().enumerate() {
        resolver.resolve_item(position, item, &mut columns);
    }

    ensure_unique_column_names(&mut columns);
    columns
}

/// Suffix repeated names with `_2`, `_3`, ... in order of appearance.
/// Comparison is case-insensitive; already-unique lists are left untouched.
pub fn ensure_unique_column_names(columns: &mut [Column]) {
    let mut used: HashSet<String> = HashSet::new();

    for column in columns.iter_mut() {
        let mut candidate = column.name.clone();
        let mut suffix = 2;
        while used.contains(&candidate.to_lowercase()) {
            candidate = format!("{}_{}", column.name, suffix);
            suffix += 1;
        }
        used.insert(candidate.to_lowercase());
        column.name = candidate;
    }
}

/// Split a select item into `(alias, expression tokens)`.
///
/// Recognises `expr AS alias`, `alias = expr` and `expr alias`, where a bare
/// alias must follow a word or `)`.
pub fn split_alias(item: &[SqlToken]) -> (Option<String>, &[SqlToken]) {
    let n = item.len();

    if n >= 2 {
        let last = &item[n - 1];
        if item[n - 2].is_keyword(Keyword::AS) && last.is_word() && !last.is_variable() {
            return (non_empty(normalize_identifier(&last.value)), &item[..n - 2]);
        }
    }

    if n >= 3 {
        let first = &item[0];
        if item[1].is_symbol('=') && first.is_identifier() && !first.is_variable() {
            return (non_empty(normalize_identifier(&first.value)), &item[2..]);
        }
    }

    if n >= 2 {
        let last = &item[n - 1];
        let prev = &item[n - 2];
        let prev_ends_expression = prev.is_symbol(')')
            || (prev.is_word()
                && (!prev.is_reserved() || prev.is_word_ci("END") || prev.is_word_ci("NULL")));
        if last.is_identifier()
            && !last.is_variable()
            && prev_ends_expression
            && !is_phrase_keyword(item, n - 1)
        {
            return (non_empty(normalize_identifier(&last.value)), &item[..n - 1]);
        }
    }

    (None, item)
}

fn non_empty(name: String) -> Option<String> {
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

struct LineageResolver<'r, 'a> {
    references: &'r TableReferences,
    index: &'r SchemaIndex<'a>,
}

impl LineageResolver<'_, '_> {
    fn resolve_item(&self, position: usize, item: &[SqlToken], out: &mut Vec<Column>) {
        let (alias, expr) = split_alias(item);

        if let Some(table_ids) = self.wildcard_tables(expr) {
            for table_id in table_ids {
                self.expand_table(&table_id, out);
            }
            return;
        }

        let sources = self.collect_sources(expr);
        let name = alias
            .or_else(|| sources.first().map(|s| s.column.clone()))
            .or_else(|| implicit_name(expr))
            .unwrap_or_else(|| format!("expr_{}", position + 1));

        let mut column = Column::unresolved(name);
        if let Some(first) = sources.first() {
            if let Some(schema_column) = self.index.find_column(&first.table, &first.column) {
                column.data_type = schema_column.data_type.clone();
                column.is_nullable = schema_column.is_nullable;
            }
        }
        column.set_sources(sources);
        out.push(column);
    }

    /// Tables a wildcard item expands over, or `None` if the item is not a
    /// wildcard.
    fn wildcard_tables(&self, expr: &[SqlToken]) -> Option<Vec<String>> {
        let n = expr.len();
        if n == 0 || !expr[n - 1].is_symbol('*') {
            return None;
        }
        if n == 1 {
            // Outer FROM/JOIN tables; CTE or derived-table sources fall back to every read
            let tables = if self.references.top_level_reads.is_empty() {
                &self.references.read_tables
            } else {
                &self.references.top_level_reads
            };
            return Some(tables.clone());
        }
        if !expr[n - 2].is_symbol('.') {
            return None;
        }

        let qualifier = &expr[..n - 2];
        let is_chain = qualifier.iter().enumerate().all(|(i, t)| {
            if i % 2 == 0 {
                t.is_word()
            } else {
                t.is_symbol('.')
            }
        });
        if qualifier.is_empty() || !is_chain {
            return None;
        }

        let parts: Vec<String> = qualifier
            .iter()
            .filter(|t| t.is_word())
            .map(|t| normalize_identifier(&t.value))
            .collect();
        let tail = &parts[parts.len().saturating_sub(2)..];

        Some(
            self.references
                .alias_map
                .resolve(&tail.join("."))
                .map(|id| vec![id.to_string()])
                .unwrap_or_default(),
        )
    }

    fn expand_table(&self, table_id: &str, out: &mut Vec<Column>) {
        let Some(columns) = self.index.columns(table_id) else {
            return;
        };
        for schema_column in columns {
            let mut column = Column::unresolved(schema_column.name.clone());
            column.data_type = schema_column.data_type.clone();
            column.is_nullable = schema_column.is_nullable;
            column.set_sources(vec![ColumnSource::new(table_id, &schema_column.name)]);
            out.push(column);
        }
    }

    /// Every identifier chain in the expression that resolves to a table
    /// column, de-duplicated by `table::column`.
    fn collect_sources(&self, expr: &[SqlToken]) -> Vec<ColumnSource> {
        let mut sources = Vec::new();
        let mut seen = HashSet::new();
        let mut i = 0;

        while i < expr.len() {
            if !expr[i].is_word() {
                i += 1;
                continue;
            }

            let start = i;
            let mut parts = vec![&expr[i]];
            i += 1;
            while i + 1 < expr.len() && expr[i].is_symbol('.') && expr[i + 1].is_word() {
                parts.push(&expr[i + 1]);
                i += 2;
            }

            if !is_column_chain(expr, start, i, &parts) {
                continue;
            }

            if let Some(source) = self.resolve_chain(&parts) {
                if seen.insert(source.dedup_key()) {
                    sources.push(source);
                }
            }
        }

        sources
    }

    fn resolve_chain(&self, parts: &[&SqlToken]) -> Option<ColumnSource> {
        let names: Vec<String> = parts
            .iter()
            .map(|t| normalize_identifier(&t.value))
            .collect();
        let (column, qualifier) = names.split_last()?;

        if qualifier.is_empty() {
            return self.resolve_unqualified(column);
        }

        let tail = &qualifier[qualifier.len().saturating_sub(2)..];
        let Some(table_id) = self.references.alias_map.resolve(&tail.join(".")) else {
            #[cfg(feature = "tracing")]
            debug!(qualifier = %tail.join("."), column = %column, "unresolved column qualifier");
            return None;
        };

        Some(self.source_for(table_id, column))
    }

    fn resolve_unqualified(&self, column: &str) -> Option<ColumnSource> {
        let tables = &self.references.read_tables;

        if let [table_id] = tables.as_slice() {
            return match self.index.columns(table_id) {
                Some(columns) if !columns.is_empty() => columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(column))
                    .map(|c| ColumnSource::new(table_id, &c.name)),
                _ => Some(ColumnSource::new(table_id, column)),
            };
        }

        let mut matches = tables
            .iter()
            .filter_map(|id| self.index.find_column(id, column).map(|c| (id, c)));
        let first = matches.next();
        if matches.next().is_some() {
            #[cfg(feature = "tracing")]
            debug!(column = %column, "ambiguous unqualified column dropped");
            return None;
        }
        first.map(|(id, c)| ColumnSource::new(id.as_str(), &c.name))
    }

    fn source_for(&self, table_id: &str, column: &str) -> ColumnSource {
        match self.index.find_column(table_id, column) {
            Some(schema_column) => ColumnSource::new(table_id, &schema_column.name),
            None => ColumnSource::new(table_id, column),
        }
    }
}

/// Whether the chain `expr[start..end]` can be a column reference rather
/// than a function name, type name, variable or keyword.
fn is_column_chain(expr: &[SqlToken], start: usize, end: usize, parts: &[&SqlToken]) -> bool {
    let first = parts[0];
    if first.is_variable()
        || first.is_number()
        || first.is_reserved()
        || first.value.starts_with('$')
        || is_phrase_keyword(expr, start)
    {
        return false;
    }

    // Function call, or `q.*` inside an expression
    if expr.get(end).is_some_and(|t| t.is_symbol('(') || t.is_symbol('.')) {
        return false;
    }

    if let Some(prev) = start.checked_sub(1).map(|p| &expr[p]) {
        if prev.is_keyword(Keyword::AS)
            || prev.is_keyword(Keyword::FROM)
            || prev.is_keyword(Keyword::JOIN)
            || prev.is_keyword(Keyword::APPLY)
        {
            return false;
        }
        if prev.is_symbol('(') && start >= 2 {
            let function = &expr[start - 2];
            let skips_first_argument = DATE_PART_FUNCTIONS
                .iter()
                .chain(TYPE_ARGUMENT_FUNCTIONS)
                .any(|f| function.is_word_ci(f));
            if skips_first_argument {
                return false;
            }
        }
    }

    true
}

/// Whether `expr[i]` belongs to a non-reserved keyword phrase: `AT TIME
/// ZONE`, a `COLLATE` collation name, `CURRENT ROW` or `NEXT VALUE FOR seq`.
fn is_phrase_keyword(expr: &[SqlToken], i: usize) -> bool {
    let at = |j: usize, word: &str| expr.get(j).is_some_and(|t| t.is_word_ci(word));
    let back = |n: usize, word: &str| i.checked_sub(n).is_some_and(|j| at(j, word));

    (at(i, "AT") && at(i + 1, "TIME") && at(i + 2, "ZONE"))
        || (back(1, "AT") && at(i, "TIME") && at(i + 1, "ZONE"))
        || (back(2, "AT") && back(1, "TIME") && at(i, "ZONE"))
        || back(1, "COLLATE")
        || (back(1, "CURRENT") && at(i, "ROW"))
        || (at(i, "NEXT") && at(i + 1, "VALUE") && at(i + 2, "FOR"))
        || (back(1, "NEXT") && at(i, "VALUE") && at(i + 1, "FOR"))
        || (back(3, "NEXT") && back(2, "VALUE") && back(1, "FOR"))
}

/// Name implied by an expression that is a single identifier chain.
fn implicit_name(expr: &[SqlToken]) -> Option<String> {
    let last = expr.last()?;
    let is_chain = expr.iter().enumerate().all(|(i, t)| {
        if i % 2 == 0 {
            t.is_identifier() && !t.is_variable()
        } else {
            t.is_symbol('.')
        }
    });
    if !is_chain || !last.is_word() {
        return None;
    }
    non_empty(normalize_identifier(&last.value))
}
