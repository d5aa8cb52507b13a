//! Token cursor shared by the clause parsers.
//!
//! A `TokenCursor` is a position over a borrowed token slice with the usual
//! peek/check/expect/advance helpers. Clause parsers compose it rather than
//! re-implementing navigation:
//!
//! ```ignore
//! let mut cursor = TokenCursor::new(&tokens);
//! while !cursor.is_at_end() {
//!     if cursor.check_keyword(Keyword::FROM) {
//!         cursor.advance();
//!         // ...
//!     }
//!     cursor.advance();
//! }
//! ```
//!
//! None of the methods fail: running off the end just reports `None`/`false`.

use sqlparser::keywords::Keyword;

use super::tokenizer::SqlToken;

/// Cursor over a flat token slice.
pub struct TokenCursor<'a> {
    tokens: &'a [SqlToken],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [SqlToken]) -> Self {
        Self { tokens, pos: 0 }
    }

    // ========================================================================
    // Position and state
    // ========================================================================

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos.min(self.tokens.len());
    }

    #[inline]
    pub fn tokens(&self) -> &'a [SqlToken] {
        self.tokens
    }

    // ========================================================================
    // Token access
    // ========================================================================

    #[inline]
    pub fn current_token(&self) -> Option<&'a SqlToken> {
        self.tokens.get(self.pos)
    }

    /// Token at an offset from the current position.
    #[inline]
    pub fn peek(&self, offset: usize) -> Option<&'a SqlToken> {
        self.tokens.get(self.pos + offset)
    }

    #[inline]
    pub fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    // ========================================================================
    // Token checks
    // ========================================================================

    #[inline]
    pub fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current_token().is_some_and(|t| t.is_keyword(keyword))
    }

    /// Case-insensitive word check for T-SQL words sqlparser has no keyword
    /// for (`PROC`, `OUTPUT`, `READONLY`, ...).
    #[inline]
    pub fn check_word_ci(&self, word: &str) -> bool {
        self.current_token().is_some_and(|t| t.is_word_ci(word))
    }

    #[inline]
    pub fn check_symbol(&self, symbol: char) -> bool {
        self.current_token().is_some_and(|t| t.is_symbol(symbol))
    }

    // ========================================================================
    // Expect methods (check and advance)
    // ========================================================================

    pub fn expect_keyword(&mut self, keyword: Keyword) -> Option<()> {
        if self.check_keyword(keyword) {
            self.advance();
            Some(())
        } else {
            None
        }
    }

    pub fn expect_symbol(&mut self, symbol: char) -> Option<()> {
        if self.check_symbol(symbol) {
            self.advance();
            Some(())
        } else {
            None
        }
    }

    // ========================================================================
    // Identifier parsing
    // ========================================================================

    /// Consume one identifier word (not reserved, not a number). Returns the
    /// raw token text.
    pub fn parse_identifier(&mut self) -> Option<&'a str> {
        let token = self.current_token()?;
        if !token.is_identifier() {
            return None;
        }
        self.advance();
        Some(token.value.as_str())
    }

    /// Consume a dot-separated name chain (`a`, `a.b`, `[a].[b].c`) and
    /// return its raw parts. Leaves the cursor untouched if no name starts
    /// here.
    pub fn parse_qualified_name(&mut self) -> Option<Vec<&'a str>> {
        let first = self.parse_identifier()?;
        let mut parts = vec![first];

        while self.check_symbol('.') {
            let Some(next) = self.peek(1) else { break };
            if !next.is_word() || next.is_number() {
                break;
            }
            self.advance();
            self.advance();
            parts.push(next.value.as_str());
        }

        Some(parts)
    }

    // ========================================================================
    // Parenthesized regions
    // ========================================================================

    /// Skip a parenthesized region including nested parentheses. The cursor
    /// must be at `(`; afterwards it is after the matching `)` (or at end).
    pub fn skip_parenthesized(&mut self) {
        self.take_parenthesized();
    }

    /// Consume a parenthesized region and return the tokens strictly inside
    /// it. An unbalanced region runs to the end of input.
    pub fn take_parenthesized(&mut self) -> Option<&'a [SqlToken]> {
        if !self.check_symbol('(') {
            return None;
        }

        let start = self.pos + 1;
        let mut depth = 0usize;

        while let Some(token) = self.current_token() {
            if token.is_symbol('(') {
                depth += 1;
            } else if token.is_symbol(')') {
                depth -= 1;
                if depth == 0 {
                    let inner = &self.tokens[start..self.pos];
                    self.advance();
                    return Some(inner);
                }
            }
            self.advance();
        }

        Some(&self.tokens[start.min(self.tokens.len())..])
    }

    /// Skip `TOP (n)` / `TOP n` with an optional `PERCENT` and `WITH TIES`.
    pub fn skip_top_clause(&mut self) {
        if self.expect_keyword(Keyword::TOP).is_none() {
            return;
        }
        if self.check_symbol('(') {
            self.skip_parenthesized();
        } else {
            self.advance();
        }
        self.expect_keyword(Keyword::PERCENT);
        if self.check_keyword(Keyword::WITH) && self.peek(1).is_some_and(|t| t.is_word_ci("TIES")) {
            self.advance();
            self.advance();
        }
    }
}

/// Split a token slice on commas at parenthesis depth 0. Empty pieces are
/// dropped.
pub fn split_top_level_commas(tokens: &[SqlToken]) -> Vec<&[SqlToken]> {
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        if token.is_symbol('(') {
            depth += 1;
        } else if token.is_symbol(')') {
            depth -= 1;
        } else if depth == 0 && token.is_symbol(',') {
            if i > start {
                pieces.push(&tokens[start..i]);
            }
            start = i + 1;
        }
    }
    if start < tokens.len() {
        pieces.push(&tokens[start..]);
    }

    pieces
}
