//! `CREATE`/`ALTER` header detection
//!
//! Classifies a definition as a view, procedure, function or trigger and
//! pulls out the object name. Used when scanning loose `.sql` files where
//! nothing else says what a file contains.

use serde::Serialize;
use sqlparser::keywords::Keyword;

use super::identifier_utils::normalize_identifier;
use super::token_cursor::TokenCursor;
use super::tokenizer::tokenize_sql;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SqlObjectKind {
    View,
    Procedure,
    Function,
    Trigger,
}

impl std::fmt::Display for SqlObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SqlObjectKind::View => "view",
            SqlObjectKind::Procedure => "procedure",
            SqlObjectKind::Function => "function",
            SqlObjectKind::Trigger => "trigger",
        };
        f.write_str(label)
    }
}

/// Kind and name of the first routine or view a script creates or alters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectHeader {
    pub kind: SqlObjectKind,
    /// Normalized `schema.name` (or just `name` when unqualified)
    pub name: String,
}

pub fn detect_object_kind(definition: &str) -> Option<SqlObjectKind> {
    parse_object_header(definition).map(|h| h.kind)
}

pub fn parse_object_header(definition: &str) -> Option<ObjectHeader> {
    let tokens = tokenize_sql(definition);
    let mut cursor = TokenCursor::new(&tokens);

    while !cursor.is_at_end() {
        let is_create = cursor.check_keyword(Keyword::CREATE);
        if !is_create && !cursor.check_keyword(Keyword::ALTER) {
            cursor.advance();
            continue;
        }
        cursor.advance();
        if is_create && cursor.check_keyword(Keyword::OR) {
            cursor.advance();
            cursor.expect_keyword(Keyword::ALTER);
        }

        let Some(kind) = object_kind_at(&cursor) else {
            continue;
        };
        cursor.advance();

        let name = cursor
            .parse_qualified_name()
            .map(|parts| {
                let normalized: Vec<String> =
                    parts.iter().map(|p| normalize_identifier(p)).collect();
                normalized[normalized.len().saturating_sub(2)..].join(".")
            })
            .unwrap_or_default();
        return Some(ObjectHeader { kind, name });
    }

    None
}

fn object_kind_at(cursor: &TokenCursor) -> Option<SqlObjectKind> {
    if cursor.check_keyword(Keyword::VIEW) {
        Some(SqlObjectKind::View)
    } else if cursor.check_keyword(Keyword::PROCEDURE) || cursor.check_word_ci("PROC") {
        Some(SqlObjectKind::Procedure)
    } else if cursor.check_keyword(Keyword::FUNCTION) {
        Some(SqlObjectKind::Function)
    } else if cursor.check_keyword(Keyword::TRIGGER) {
        Some(SqlObjectKind::Trigger)
    } else {
        None
    }
}
