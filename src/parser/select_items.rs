//! Top-level SELECT list splitting
//!
//! Finds the first `SELECT` at parenthesis depth 0, skips `DISTINCT`/`ALL`
//! and `TOP (n) [PERCENT] [WITH TIES]`, then splits the list on depth-0
//! commas up to the first depth-0 `FROM` (or another clause keyword when the
//! query has no `FROM`). Commas and `FROM`s inside calls or sub-selects never
//! split or end the list.

use sqlparser::keywords::Keyword;

use super::token_cursor::{split_top_level_commas, TokenCursor};
use super::tokenizer::SqlToken;

/// Position of the first `SELECT` outside any parentheses.
pub fn find_top_level_select(tokens: &[SqlToken]) -> Option<usize> {
    let mut depth = 0i32;
    for (i, token) in tokens.iter().enumerate() {
        if token.is_symbol('(') {
            depth += 1;
        } else if token.is_symbol(')') {
            depth -= 1;
        } else if depth == 0 && token.is_keyword(Keyword::SELECT) {
            return Some(i);
        }
    }
    None
}

/// Split the top-level select list into one token slice per output column.
pub fn split_select_items(tokens: &[SqlToken]) -> Vec<&[SqlToken]> {
    let Some(select_pos) = find_top_level_select(tokens) else {
        return Vec::new();
    };

    let mut cursor = TokenCursor::new(tokens);
    cursor.set_pos(select_pos + 1);
    while cursor.expect_keyword(Keyword::DISTINCT).is_some()
        || cursor.expect_keyword(Keyword::ALL).is_some()
    {}
    cursor.skip_top_clause();

    let list_start = cursor.pos();
    let list_end = find_list_end(tokens, list_start);

    split_top_level_commas(&tokens[list_start..list_end])
}

fn find_list_end(tokens: &[SqlToken], start: usize) -> usize {
    let mut depth = 0i32;
    for (offset, token) in tokens[start..].iter().enumerate() {
        if token.is_symbol('(') {
            depth += 1;
        } else if token.is_symbol(')') {
            depth -= 1;
            if depth < 0 {
                return start + offset;
            }
        } else if depth == 0
            && ends_select_list(token)
            && !is_sequence_for(tokens, start + offset)
        {
            return start + offset;
        }
    }
    tokens.len()
}

fn ends_select_list(token: &SqlToken) -> bool {
    const TERMINATORS: &[Keyword] = &[
        Keyword::FROM,
        Keyword::INTO,
        Keyword::WHERE,
        Keyword::GROUP,
        Keyword::ORDER,
        Keyword::HAVING,
        Keyword::UNION,
        Keyword::EXCEPT,
        Keyword::INTERSECT,
        Keyword::FOR,
    ];
    TERMINATORS.iter().any(|k| token.is_keyword(*k))
        || token.is_word_ci("OPTION")
        || token.is_symbol(';')
}

/// `FOR` in `NEXT VALUE FOR seq`
fn is_sequence_for(tokens: &[SqlToken], i: usize) -> bool {
    i >= 2 && tokens[i - 2].is_word_ci("NEXT") && tokens[i - 1].is_word_ci("VALUE")
}
