//! Flat word/symbol tokenizer for sanitized T-SQL
//!
//! The token stream is deliberately coarse: a token is either a word
//! (identifier, keyword, number, `@variable`, `#temp`, bracketed or
//! double-quoted identifier) or a single punctuation symbol. Anything else is
//! dropped. Unquoted words carry the `sqlparser` keyword they spell so parsers
//! can match on `Keyword::FROM` instead of comparing strings.
//!
//! Run [`sanitize_sql`](super::sanitizer::sanitize_sql) first; string literals
//! and comments are not recognised here.

use sqlparser::keywords::{Keyword, ALL_KEYWORDS, ALL_KEYWORDS_INDEX};

use super::identifier_utils::is_reserved_word;
use super::sanitizer::sanitize_sql;

/// Punctuation kept as symbol tokens.
const SYMBOL_CHARS: &[char] = &[
    '(', ')', ',', '.', '*', '=', ';', '+', '-', '/', '%', '<', '>', '!', '&', '|', '^', '~',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Symbol,
}

/// A single token. Quoted identifiers keep their delimiters and escapes in
/// `value`; use `normalize_identifier` to get the bare name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlToken {
    pub value: String,
    pub kind: TokenKind,
    /// Keyword spelled by an unquoted word, `Keyword::NoKeyword` otherwise
    pub keyword: Keyword,
}

impl SqlToken {
    /// An unquoted word; the keyword is looked up the same way sqlparser does.
    pub fn word(value: impl Into<String>) -> Self {
        let value = value.into();
        let keyword = lookup_keyword(&value);
        Self {
            value,
            kind: TokenKind::Word,
            keyword,
        }
    }

    /// A bracketed or double-quoted identifier. Never a keyword.
    pub fn quoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: TokenKind::Word,
            keyword: Keyword::NoKeyword,
        }
    }

    pub fn symbol(c: char) -> Self {
        Self {
            value: c.to_string(),
            kind: TokenKind::Symbol,
            keyword: Keyword::NoKeyword,
        }
    }

    #[inline]
    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    #[inline]
    pub fn is_symbol(&self, c: char) -> bool {
        self.kind == TokenKind::Symbol && self.value.starts_with(c)
    }

    #[inline]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Word && self.keyword == keyword
    }

    /// Case-insensitive match against an unquoted word. Used for T-SQL words
    /// sqlparser has no keyword for (`PROC`, `OUTPUT`, `READONLY`, ...).
    #[inline]
    pub fn is_word_ci(&self, word: &str) -> bool {
        self.kind == TokenKind::Word && !self.is_quoted() && self.value.eq_ignore_ascii_case(word)
    }

    pub fn is_quoted(&self) -> bool {
        self.value.starts_with('[') || self.value.starts_with('"')
    }

    /// `@name` (parameters and variables; `@@ROWCOUNT` style globals too)
    pub fn is_variable(&self) -> bool {
        self.kind == TokenKind::Word && self.value.starts_with('@')
    }

    pub fn is_number(&self) -> bool {
        self.kind == TokenKind::Word && self.value.starts_with(|c: char| c.is_ascii_digit())
    }

    /// Unquoted word in the reserved set (never usable as a bare alias)
    pub fn is_reserved(&self) -> bool {
        self.kind == TokenKind::Word && !self.is_quoted() && is_reserved_word(&self.value)
    }

    /// A word that can name a table, column or alias
    pub fn is_identifier(&self) -> bool {
        self.is_word() && !self.is_reserved() && !self.is_number() && !self.value.is_empty()
    }
}

fn lookup_keyword(word: &str) -> Keyword {
    let upper = word.to_uppercase();
    ALL_KEYWORDS
        .binary_search(&upper.as_str())
        .map_or(Keyword::NoKeyword, |idx| ALL_KEYWORDS_INDEX[idx])
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$')
}

/// Tokenize sanitized SQL. Never fails; unknown characters are skipped.
pub fn tokenize(sanitized: &str) -> Vec<SqlToken> {
    let chars: Vec<char> = sanitized.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        match c {
            '[' | '"' => {
                let close = if c == '[' { ']' } else { '"' };
                let end = scan_delimited(&chars, i, close);
                tokens.push(SqlToken::quoted(chars[i..end].iter().collect::<String>()));
                i = end;
            }
            c if is_word_char(c) => {
                let start = i;
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
                tokens.push(SqlToken::word(chars[start..i].iter().collect::<String>()));
            }
            c if SYMBOL_CHARS.contains(&c) => {
                tokens.push(SqlToken::symbol(c));
                i += 1;
            }
            _ => i += 1,
        }
    }

    tokens
}

/// Sanitize then tokenize raw SQL text.
pub fn tokenize_sql(sql: &str) -> Vec<SqlToken> {
    tokenize(&sanitize_sql(sql))
}

/// End position (exclusive) of a quoted identifier starting at `start`.
fn scan_delimited(chars: &[char], start: usize, close: char) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == close {
            if chars.get(i + 1) == Some(&close) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}
