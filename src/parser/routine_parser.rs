//! Stored procedure, function and trigger parsing
//!
//! Three independent, best-effort readers over routine text:
//!
//! - [`parse_routine_parameters`]: the `@name type [= default] [OUTPUT]` list
//!   of a `CREATE FUNCTION`/`CREATE PROCEDURE` header or of a bare fragment
//! - [`parse_function_return_type`]: the type after `RETURNS`
//! - [`parse_routine_definition`]: tables the body reads and writes

use serde::Serialize;
use sqlparser::keywords::Keyword;
#[cfg(feature = "tracing")]
use tracing::debug;

use super::identifier_utils::{short_name, tokens_to_sql};
use super::table_refs::extract_table_references;
use super::token_cursor::{split_top_level_commas, TokenCursor};
use super::tokenizer::{tokenize_sql, SqlToken};
use crate::model::{ProcedureParameter, SchemaGraph, SchemaIndex};

/// Trigger-only virtual tables, never reported as references
const PSEUDO_TABLES: &[&str] = &["inserted", "deleted"];

/// Parameters found in a routine header or fragment.
///
/// `has_signature` is false when the candidate region holds no `@` token at
/// all, which tells "no parameters" apart from "no recognizable signature".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineSignature {
    pub parameters: Vec<ProcedureParameter>,
    pub has_signature: bool,
}

/// Options for [`parse_routine_definition`]
#[derive(Debug, Clone, Default)]
pub struct RoutineParseOptions {
    pub default_schema: Option<String>,
}

/// Tables a routine body reads and writes, as canonical ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutineReferences {
    pub referenced_tables: Vec<String>,
    pub affected_tables: Vec<String>,
}

// ============================================================================
// Parameters
// ============================================================================

pub fn parse_routine_parameters(definition: &str) -> RoutineSignature {
    let tokens = tokenize_sql(definition);
    let region = parameter_region(&tokens);

    if !region.iter().any(SqlToken::is_variable) {
        return RoutineSignature::default();
    }

    let parameters: Vec<ProcedureParameter> = split_top_level_commas(region)
        .into_iter()
        .filter_map(parse_parameter)
        .collect();

    #[cfg(feature = "tracing")]
    debug!(parameters = parameters.len(), "parsed routine signature");

    RoutineSignature {
        parameters,
        has_signature: true,
    }
}

/// Tokens that may hold the parameter list.
///
/// With a `FUNCTION`/`PROCEDURE`/`PROC` header this is the parenthesized list
/// after the name, or everything up to the body. Without one, a leading
/// parenthesized list or everything up to the first body keyword.
fn parameter_region(tokens: &[SqlToken]) -> &[SqlToken] {
    let mut cursor = TokenCursor::new(tokens);

    if let Some(header_pos) = find_routine_keyword(tokens) {
        cursor.set_pos(header_pos + 1);
        if cursor.parse_qualified_name().is_none() {
            return &[];
        }
    }

    if cursor.check_symbol('(') {
        return cursor.take_parenthesized().unwrap_or(&[]);
    }

    let start = cursor.pos();
    let end = find_region_end(tokens, start);
    &tokens[start..end]
}

/// Position of the routine keyword in a header, searched before the body.
fn find_routine_keyword(tokens: &[SqlToken]) -> Option<usize> {
    for (i, token) in tokens.iter().enumerate() {
        if token.is_keyword(Keyword::FUNCTION)
            || token.is_keyword(Keyword::PROCEDURE)
            || token.is_word_ci("PROC")
        {
            return Some(i);
        }
        if token.is_keyword(Keyword::AS)
            || token.is_keyword(Keyword::BEGIN)
            || token.is_keyword(Keyword::SELECT)
        {
            return None;
        }
    }
    None
}

/// First depth-0 `AS`/`BEGIN`/`RETURNS`/`WITH`/`FOR` at or after `start`.
fn find_region_end(tokens: &[SqlToken], start: usize) -> usize {
    const TERMINATORS: &[Keyword] = &[
        Keyword::AS,
        Keyword::BEGIN,
        Keyword::RETURNS,
        Keyword::WITH,
        Keyword::FOR,
    ];

    let mut depth = 0i32;
    for (offset, token) in tokens[start..].iter().enumerate() {
        if token.is_symbol('(') {
            depth += 1;
        } else if token.is_symbol(')') {
            depth -= 1;
        } else if depth == 0 && TERMINATORS.iter().any(|k| token.is_keyword(*k)) {
            return start + offset;
        }
    }
    tokens.len()
}

/// `@name [AS] type [READONLY] [= default] [OUTPUT|OUT]`
fn parse_parameter(chunk: &[SqlToken]) -> Option<ProcedureParameter> {
    let name_pos = chunk.iter().position(SqlToken::is_variable)?;
    let rest = &chunk[name_pos + 1..];

    let mut depth = 0i32;
    let default_pos = rest
        .iter()
        .position(|t| {
            if t.is_symbol('(') {
                depth += 1;
            } else if t.is_symbol(')') {
                depth -= 1;
            }
            depth == 0 && t.is_symbol('=')
        })
        .unwrap_or(rest.len());

    let mut is_output = rest[default_pos..].iter().any(is_output_marker);
    let mut type_tokens: Vec<SqlToken> = Vec::new();
    for token in &rest[..default_pos] {
        if is_output_marker(token) {
            is_output = true;
        } else if !token.is_word_ci("READONLY") {
            type_tokens.push(token.clone());
        }
    }
    if type_tokens.first().is_some_and(|t| t.is_keyword(Keyword::AS)) {
        type_tokens.remove(0);
    }

    Some(ProcedureParameter {
        name: chunk[name_pos].value.clone(),
        data_type: tokens_to_sql(&type_tokens),
        is_output,
    })
}

fn is_output_marker(token: &SqlToken) -> bool {
    token.is_word_ci("OUTPUT") || token.is_word_ci("OUT")
}

// ============================================================================
// Return type
// ============================================================================

/// The type expression after the first `RETURNS`, up to `AS`, `BEGIN`, `;`
/// or a depth-0 `WITH`. `None` if there is no `RETURNS` or nothing after it.
pub fn parse_function_return_type(definition: &str) -> Option<String> {
    let tokens = tokenize_sql(definition);
    let returns_pos = tokens.iter().position(|t| t.is_keyword(Keyword::RETURNS))?;
    let start = returns_pos + 1;

    let mut depth = 0i32;
    let mut end = tokens.len();
    for (offset, token) in tokens[start..].iter().enumerate() {
        if token.is_symbol('(') {
            depth += 1;
        } else if token.is_symbol(')') {
            depth -= 1;
        } else if token.is_keyword(Keyword::AS)
            || token.is_keyword(Keyword::BEGIN)
            || token.is_symbol(';')
            || (depth == 0 && token.is_keyword(Keyword::WITH))
        {
            end = start + offset;
            break;
        }
    }

    let return_type = tokens_to_sql(&tokens[start..end]);
    if return_type.is_empty() {
        None
    } else {
        Some(return_type)
    }
}

// ============================================================================
// Body references
// ============================================================================

pub fn parse_routine_definition(
    definition: &str,
    schema: &SchemaGraph,
    options: &RoutineParseOptions,
) -> RoutineReferences {
    let index = SchemaIndex::build(schema);
    parse_routine_definition_with_index(definition, &index, options)
}

/// Same as [`parse_routine_definition`] with a prebuilt index.
pub fn parse_routine_definition_with_index(
    definition: &str,
    index: &SchemaIndex,
    options: &RoutineParseOptions,
) -> RoutineReferences {
    let tokens = tokenize_sql(definition);
    let references = extract_table_references(&tokens, index, options.default_schema.as_deref());

    let keep = |id: &String| !is_excluded_table(id);
    RoutineReferences {
        referenced_tables: references.read_tables.into_iter().filter(keep).collect(),
        affected_tables: references.write_tables.into_iter().filter(keep).collect(),
    }
}

/// Pseudo-tables, table variables and temp tables
fn is_excluded_table(id: &str) -> bool {
    let short = short_name(id);
    short.starts_with('@')
        || short.starts_with('#')
        || PSEUDO_TABLES.iter().any(|p| short.eq_ignore_ascii_case(p))
}
