//! Lexical sanitizer for T-SQL text
//!
//! Blanks out string literals and comments so later stages never see their
//! content. The output has exactly as many characters as the input and keeps
//! every line break, so positions in the sanitized text line up with the
//! original.
//!
//! Bracketed (`[...]`) and double-quoted (`"..."`) identifiers are copied
//! through untouched: a `'` or `--` inside `[it's--odd]` is part of a name.
//!
//! Nothing here fails. An unterminated literal, comment or quoted identifier
//! simply runs to the end of the input.

/// Replace every string literal and comment in `sql` with spaces.
pub fn sanitize_sql(sql: &str) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            '\'' => i = blank_string_literal(&chars, i, &mut out),
            'N' | 'n'
                if next == Some('\'') && !is_identifier_char_at(&chars, i.wrapping_sub(1)) =>
            {
                // Unicode literal prefix goes with the literal
                out.push(' ');
                i = blank_string_literal(&chars, i + 1, &mut out);
            }
            '-' if next == Some('-') => i = blank_line_comment(&chars, i, &mut out),
            '/' if next == Some('*') => i = blank_block_comment(&chars, i, &mut out),
            '[' => i = copy_delimited(&chars, i, ']', &mut out),
            '"' => i = copy_delimited(&chars, i, '"', &mut out),
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}

/// Blank a single character, keeping line breaks.
#[inline]
fn blank(c: char) -> char {
    if c == '\n' || c == '\r' {
        c
    } else {
        ' '
    }
}

fn is_identifier_char_at(chars: &[char], pos: usize) -> bool {
    chars
        .get(pos)
        .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$'))
}

/// Blank `'...'` starting at `start` (the opening quote). `''` is an escaped quote.
/// Returns the position after the closing quote.
fn blank_string_literal(chars: &[char], start: usize, out: &mut String) -> usize {
    out.push(' ');
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push_str("  ");
                i += 2;
                continue;
            }
            out.push(' ');
            return i + 1;
        }
        out.push(blank(chars[i]));
        i += 1;
    }
    i
}

/// Blank `-- ...` up to (not including) the line break.
fn blank_line_comment(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut i = start;
    while i < chars.len() && chars[i] != '\n' && chars[i] != '\r' {
        out.push(' ');
        i += 1;
    }
    i
}

/// Blank `/* ... */`. SQL Server allows these to nest.
fn blank_block_comment(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        let next = chars.get(i + 1).copied();
        if chars[i] == '/' && next == Some('*') {
            depth += 1;
            out.push_str("  ");
            i += 2;
        } else if chars[i] == '*' && next == Some('/') {
            depth -= 1;
            out.push_str("  ");
            i += 2;
            if depth == 0 {
                return i;
            }
        } else {
            out.push(blank(chars[i]));
            i += 1;
        }
    }
    i
}

/// Copy a quoted identifier verbatim; a doubled closing delimiter is an escape.
fn copy_delimited(chars: &[char], start: usize, close: char, out: &mut String) -> usize {
    out.push(chars[start]);
    let mut i = start + 1;
    while i < chars.len() {
        out.push(chars[i]);
        if chars[i] == close {
            if chars.get(i + 1) == Some(&close) {
                out.push(close);
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    i
}
