//! Identifier handling utilities for T-SQL text.
//!
//! Normalization (stripping `[]`/`""` delimiters), quoting for generated SQL,
//! canonical table-name resolution against a [`SchemaIndex`], and the
//! reserved-word set used to tell aliases apart from clause keywords.
//!
//! # Examples
//!
//! ```ignore
//! assert_eq!(normalize_identifier("[My]]Table]"), "My]Table");
//! assert_eq!(quote_identifier("order"), "[order]");
//! assert_eq!(quote_identifier("orders"), "orders");
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::tokenizer::{tokenize, SqlToken};
use crate::model::SchemaIndex;

/// Words that end or structure a clause and so can never be a bare alias or
/// a column reference. Much narrower than sqlparser's keyword list, which
/// includes ordinary column names like `name`, `status` or `date`.
static RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "ADD", "ALL", "ALTER", "AND", "ANY", "APPLY", "AS", "ASC", "BEGIN", "BETWEEN", "BREAK",
        "BY", "CASE", "CATCH", "CHECK", "CLOSE", "COLLATE", "COMMIT", "CONSTRAINT", "CONTINUE",
        "CREATE", "CROSS", "CURRENT", "CURRENT_TIMESTAMP", "CURRENT_USER", "CURSOR",
        "DEALLOCATE", "DECLARE", "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END",
        "ESCAPE", "EXCEPT", "EXEC", "EXECUTE", "EXISTS", "FETCH", "FOLLOWING", "FOR", "FOREIGN",
        "FROM", "FULL", "FUNCTION", "GO", "GOTO", "GRANT", "GROUP", "HAVING", "IF", "IN",
        "INNER", "INSERT", "INTERSECT", "INTO", "IS", "JOIN", "KEY", "LEFT", "LIKE", "MERGE",
        "NOT", "NULL", "OF", "OFF", "ON", "OPEN", "OPTION", "OR", "ORDER", "OUTER", "OUTPUT",
        "OVER", "PARTITION", "PERCENT", "PIVOT", "PRECEDING", "PRIMARY", "PRINT", "PROC",
        "PROCEDURE", "RAISERROR", "RANGE", "READONLY", "REFERENCES", "RETURN", "RETURNS",
        "REVOKE", "RIGHT", "ROLLBACK", "ROWS", "SELECT", "SESSION_USER", "SET", "SYSTEM_USER",
        "TABLE", "TABLESAMPLE", "THEN", "THROW", "TOP", "TRAN", "TRANSACTION", "TRIGGER",
        "TRUNCATE", "TRY", "UNBOUNDED", "UNION", "UNIQUE", "UNPIVOT", "UPDATE", "USE", "USING",
        "VALUES", "VIEW", "WAITFOR", "WHEN", "WHERE", "WHILE", "WITH", "WITHIN",
    ]
    .into_iter()
    .collect()
});

/// A regular identifier that needs no delimiters in generated SQL.
static REGULAR_IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_@#$]*$").unwrap());

/// Whether an unquoted word is in the reserved set (case-insensitive).
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(word.to_ascii_uppercase().as_str())
}

/// Strips one layer of `[]` or `""` delimiters and un-doubles escaped
/// delimiters. Plain identifiers are only trimmed.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_identifier("[MyTable]"), "MyTable");
/// assert_eq!(normalize_identifier("\"My\"\"Col\""), "My\"Col");
/// assert_eq!(normalize_identifier("  dbo "), "dbo");
/// ```
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(inner) = trimmed.strip_prefix('[') {
        let inner = inner.strip_suffix(']').unwrap_or(inner);
        return inner.replace("]]", "]").trim().to_string();
    }

    if let Some(inner) = trimmed.strip_prefix('"') {
        let inner = inner.strip_suffix('"').unwrap_or(inner);
        return inner.replace("\"\"", "\"").trim().to_string();
    }

    trimmed.to_string()
}

/// Bracket-quote an identifier for generated SQL, only when needed.
pub fn quote_identifier(name: &str) -> String {
    if REGULAR_IDENTIFIER_RE.is_match(name) && !is_reserved_word(name) {
        name.to_string()
    } else {
        format!("[{}]", name.replace(']', "]]"))
    }
}

/// Quote a canonical `schema.name` id part by part.
pub fn quote_table_id(id: &str) -> String {
    match id.split_once('.') {
        Some((schema, name)) => format!("{}.{}", quote_identifier(schema), quote_identifier(name)),
        None => quote_identifier(id),
    }
}

/// Last segment of a canonical id (`dbo.orders` -> `orders`).
pub fn short_name(id: &str) -> &str {
    id.rsplit('.').next().unwrap_or(id)
}

/// Resolve a raw, possibly delimited and qualified table name to its
/// canonical id.
pub fn resolve_table_name(raw: &str, index: &SchemaIndex, default_schema: Option<&str>) -> String {
    let parts: Vec<String> = tokenize(raw)
        .into_iter()
        .filter(SqlToken::is_word)
        .map(|t| t.value)
        .collect();
    resolve_table_name_from_parts(&parts, index, default_schema)
}

/// Resolve already split name parts (raw token text) to a canonical id.
///
/// Server and database prefixes are ignored; `schema.name` is looked up in
/// the index. An unqualified name tries `default_schema.name` first, then the
/// short name, and otherwise comes back prefixed with the default schema.
/// Without a default schema an unknown name is returned normalized but
/// otherwise unchanged.
pub fn resolve_table_name_from_parts<S: AsRef<str>>(
    parts: &[S],
    index: &SchemaIndex,
    default_schema: Option<&str>,
) -> String {
    let normalized: Vec<String> = parts
        .iter()
        .map(|p| normalize_identifier(p.as_ref()))
        .filter(|p| !p.is_empty())
        .collect();

    let tail = &normalized[normalized.len().saturating_sub(2)..];
    if tail.is_empty() {
        return String::new();
    }
    let qualified = tail.join(".");

    if tail.len() == 1 {
        if let Some(schema) = default_schema.filter(|s| !s.trim().is_empty()) {
            let with_schema = format!("{}.{}", normalize_identifier(schema), qualified);
            return index
                .resolve(&with_schema)
                .or_else(|| index.resolve(&qualified))
                .map(str::to_string)
                .unwrap_or(with_schema);
        }
    }

    index
        .resolve(&qualified)
        .map(str::to_string)
        .unwrap_or(qualified)
}

/// Reassemble tokens into readable SQL: single spaces, except none before
/// `(` `)` `,` `.` and none after `(` `.` `,`.
///
/// ```ignore
/// // decimal ( 10 , 2 )  ->  decimal(10,2)
/// ```
pub fn tokens_to_sql(tokens: &[SqlToken]) -> String {
    let mut out = String::new();
    let mut prev: Option<&SqlToken> = None;

    for token in tokens {
        if let Some(p) = prev {
            let glued = p.is_symbol('(')
                || p.is_symbol('.')
                || p.is_symbol(',')
                || token.is_symbol('(')
                || token.is_symbol(')')
                || token.is_symbol(',')
                || token.is_symbol('.');
            if !glued {
                out.push(' ');
            }
        }
        out.push_str(&token.value);
        prev = Some(token);
    }

    out
}
