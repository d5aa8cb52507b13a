//! T-SQL text analysis
//!
//! Pipeline: [`sanitize_sql`] -> [`tokenize`] -> clause readers built on
//! [`TokenCursor`] (table references, select items, signatures) -> lineage.
//! Every entry point is best-effort and infallible.

mod identifier_utils;
mod lineage;
mod object_header;
mod routine_parser;
mod sanitizer;
mod select_items;
mod table_refs;
mod token_cursor;
mod tokenizer;
mod view_parser;

pub use identifier_utils::{
    is_reserved_word, normalize_identifier, quote_identifier, quote_table_id,
    resolve_table_name, resolve_table_name_from_parts, short_name, tokens_to_sql,
};
pub use lineage::{ensure_unique_column_names, resolve_select_columns, split_alias};
pub use object_header::{detect_object_kind, parse_object_header, ObjectHeader, SqlObjectKind};
pub use routine_parser::{
    parse_function_return_type, parse_routine_definition, parse_routine_definition_with_index,
    parse_routine_parameters, RoutineParseOptions, RoutineReferences, RoutineSignature,
};
pub use sanitizer::sanitize_sql;
pub use select_items::{find_top_level_select, split_select_items};
pub use table_refs::{extract_table_references, AliasMap, TableAccess, TableRef, TableReferences};
pub use token_cursor::{split_top_level_commas, TokenCursor};
pub use tokenizer::{tokenize, tokenize_sql, SqlToken, TokenKind};
pub use view_parser::{
    parse_view_column_list, parse_view_definition, parse_view_definition_with_index,
    ViewDefinition, ViewParseOptions,
};
