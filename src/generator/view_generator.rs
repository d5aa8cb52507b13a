//! SELECT text for a view column list
//!
//! Output shape when every sourced column comes from one table:
//!
//! ```sql
//! SELECT
//!     id,
//!     total AS amount,
//!     NULL AS note
//! FROM dbo.orders
//! ```
//!
//! With several source tables each reference is qualified and there is no
//! `FROM` clause.

use crate::model::{Column, ColumnSource};
use crate::parser::{quote_identifier, quote_table_id};

pub fn generate_view_definition(columns: &[Column]) -> String {
    if columns.is_empty() {
        return "SELECT NULL AS [placeholder]".to_string();
    }

    let sources: Vec<Option<ColumnSource>> = columns.iter().map(Column::primary_source).collect();
    let single_table = single_source_table(&sources);

    let items: Vec<String> = columns
        .iter()
        .zip(&sources)
        .map(|(column, source)| format!("    {}", select_item(column, source.as_ref(), single_table.is_none())))
        .collect();

    let mut sql = String::from("SELECT\n");
    sql.push_str(&items.join(",\n"));
    if let Some(table) = single_table {
        sql.push_str("\nFROM ");
        sql.push_str(&quote_table_id(table));
    }
    sql
}

/// `CREATE VIEW id AS` followed by [`generate_view_definition`].
pub fn generate_create_view(id: &str, columns: &[Column]) -> String {
    format!(
        "CREATE VIEW {} AS\n{}",
        quote_table_id(id),
        generate_view_definition(columns)
    )
}

/// The one table every sourced column comes from (compared
/// case-insensitively), if there is exactly one.
fn single_source_table(sources: &[Option<ColumnSource>]) -> Option<&str> {
    let mut tables = sources.iter().flatten().map(|s| s.table.as_str());
    let first = tables.next()?;
    if tables.all(|t| t.eq_ignore_ascii_case(first)) {
        Some(first)
    } else {
        None
    }
}

fn select_item(column: &Column, source: Option<&ColumnSource>, qualified: bool) -> String {
    let Some(source) = source else {
        return format!("NULL AS {}", quote_identifier(&column.name));
    };

    let reference = if qualified {
        format!("{}.{}", quote_table_id(&source.table), quote_identifier(&source.column))
    } else {
        quote_identifier(&source.column)
    };

    if column.name == source.column {
        reference
    } else {
        format!("{} AS {}", reference, quote_identifier(&column.name))
    }
}
