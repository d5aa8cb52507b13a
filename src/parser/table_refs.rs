//! Table-reference extraction from FROM/JOIN/INTO/UPDATE/DELETE/MERGE clauses
//!
//! Walks the token stream once, collecting every table reference together
//! with its alias and whether it is read or written:
//!
//! ```sql
//! SELECT ... FROM a, b x JOIN c AS y ON ... CROSS APPLY dbo.fn(@p) f   -- reads
//! INSERT [INTO] t / UPDATE t / DELETE [FROM] t / MERGE [INTO] t        -- writes
//! SELECT ... INTO t FROM ...                                           -- write
//! ```
//!
//! Every resolved table is registered in one [`AliasMap`] under its
//! canonical id, its short name and its alias, so later stages can resolve
//! any of the three. Common table expression names are recognised and kept
//! out of the results.

use std::collections::{HashMap, HashSet};

use sqlparser::keywords::Keyword;
#[cfg(feature = "tracing")]
use tracing::debug;

use super::identifier_utils::{normalize_identifier, resolve_table_name_from_parts, short_name};
use super::token_cursor::TokenCursor;
use super::tokenizer::SqlToken;
use crate::model::SchemaIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAccess {
    Read,
    Write,
}

/// One table reference as written in the SQL text
#[derive(Debug, Clone)]
pub struct TableRef {
    /// Raw name parts (delimiters kept)
    pub parts: Vec<String>,
    /// Normalized alias, if one was declared
    pub alias: Option<String>,
    pub access: TableAccess,
    /// Parenthesis nesting at the reference; 0 for the outer statement
    pub depth: usize,
}

impl TableRef {
    /// Normalized, lower-cased last name part
    fn short_key(&self) -> String {
        self.parts
            .last()
            .map(|p| normalize_identifier(p).to_lowercase())
            .unwrap_or_default()
    }
}

/// Per-query lookup from alias, short name or canonical id to canonical id.
///
/// Declared aliases win over short names, so `UPDATE o ... FROM orders o`
/// resolves `o` to `orders` even though `o` was also seen as a bare name.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    aliases: HashMap<String, String>,
    names: HashMap<String, String>,
}

impl AliasMap {
    /// Resolve an alias, short name or qualified id (case-insensitive).
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let key = name.to_lowercase();
        self.aliases
            .get(&key)
            .or_else(|| self.names.get(&key))
            .map(String::as_str)
    }

    pub fn register_alias(&mut self, alias: &str, table_id: &str) {
        self.aliases
            .insert(alias.to_lowercase(), table_id.to_string());
    }

    /// Register a name; the first table registered under a name keeps it.
    pub fn register_name(&mut self, name: &str, table_id: &str) {
        self.names
            .entry(name.to_lowercase())
            .or_insert_with(|| table_id.to_string());
    }

}

/// Tables a statement reads and writes, plus the alias map built from them.
#[derive(Debug, Clone, Default)]
pub struct TableReferences {
    /// Canonical ids, de-duplicated, in order of first appearance
    pub read_tables: Vec<String>,
    /// The reads that sit outside any parentheses (no subqueries or CTE
    /// bodies)
    pub top_level_reads: Vec<String>,
    /// Canonical ids, de-duplicated, in order of first appearance
    pub write_tables: Vec<String>,
    pub alias_map: AliasMap,
}

/// Extract table references from a token stream.
pub fn extract_table_references(
    tokens: &[SqlToken],
    index: &SchemaIndex,
    default_schema: Option<&str>,
) -> TableReferences {
    let mut scanner = TableRefScanner::new(tokens);
    scanner.scan();

    let result = build_references(&scanner.refs, &scanner.cte_names, index, default_schema);

    #[cfg(feature = "tracing")]
    debug!(
        reads = result.read_tables.len(),
        writes = result.write_tables.len(),
        ctes = scanner.cte_names.len(),
        "extracted table references"
    );

    result
}

fn build_references(
    refs: &[TableRef],
    cte_names: &HashSet<String>,
    index: &SchemaIndex,
    default_schema: Option<&str>,
) -> TableReferences {
    let refs: Vec<&TableRef> = refs
        .iter()
        .filter(|r| !(r.parts.len() == 1 && cte_names.contains(&r.short_key())))
        .collect();

    let resolved: Vec<String> = refs
        .iter()
        .map(|r| resolve_table_name_from_parts(&r.parts, index, default_schema))
        .collect();

    let mut alias_map = AliasMap::default();
    for (table_ref, id) in refs.iter().zip(&resolved) {
        if let Some(alias) = &table_ref.alias {
            alias_map.register_alias(alias, id);
        }
    }

    // A bare single-part target naming another reference's alias is that table
    let final_ids: Vec<String> = refs
        .iter()
        .zip(&resolved)
        .map(|(table_ref, id)| {
            if table_ref.parts.len() == 1 && table_ref.alias.is_none() {
                if let Some(aliased) = alias_map.aliases.get(&table_ref.short_key()) {
                    return aliased.clone();
                }
            }
            id.clone()
        })
        .collect();

    let mut result = TableReferences::default();
    let mut seen_reads = HashSet::new();
    let mut seen_top_level = HashSet::new();
    let mut seen_writes = HashSet::new();

    for (table_ref, id) in refs.iter().zip(&final_ids) {
        if id.is_empty() {
            continue;
        }
        alias_map.register_name(id, id);
        alias_map.register_name(short_name(id), id);

        match table_ref.access {
            TableAccess::Read => {
                if seen_reads.insert(id.to_lowercase()) {
                    result.read_tables.push(id.clone());
                }
                if table_ref.depth == 0 && seen_top_level.insert(id.to_lowercase()) {
                    result.top_level_reads.push(id.clone());
                }
            }
            TableAccess::Write => {
                if seen_writes.insert(id.to_lowercase()) {
                    result.write_tables.push(id.clone());
                }
            }
        }
    }

    result.alias_map = alias_map;
    result
}

/// Single pass over the tokens collecting table references and CTE names.
struct TableRefScanner<'a> {
    cursor: TokenCursor<'a>,
    refs: Vec<TableRef>,
    /// Lower-cased CTE names
    cte_names: HashSet<String>,
    depth: usize,
}

impl<'a> TableRefScanner<'a> {
    fn new(tokens: &'a [SqlToken]) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            refs: Vec::new(),
            cte_names: HashSet::new(),
            depth: 0,
        }
    }

    fn scan(&mut self) {
        while let Some(token) = self.cursor.current_token() {
            if token.is_keyword(Keyword::FROM) {
                self.cursor.advance();
                self.parse_table_list(TableAccess::Read);
            } else if token.is_keyword(Keyword::JOIN)
                || token.is_keyword(Keyword::APPLY)
                || token.is_keyword(Keyword::USING)
            {
                self.cursor.advance();
                self.parse_table_ref(TableAccess::Read);
            } else if token.is_keyword(Keyword::INSERT) {
                self.cursor.advance();
                self.cursor.skip_top_clause();
                self.cursor.expect_keyword(Keyword::INTO);
                self.parse_table_ref(TableAccess::Write);
            } else if token.is_keyword(Keyword::MERGE) {
                self.cursor.advance();
                self.cursor.skip_top_clause();
                self.cursor.expect_keyword(Keyword::INTO);
                self.parse_table_ref(TableAccess::Write);
            } else if token.is_keyword(Keyword::UPDATE) {
                self.cursor.advance();
                self.cursor.skip_top_clause();
                self.parse_table_ref(TableAccess::Write);
            } else if token.is_keyword(Keyword::DELETE) {
                self.cursor.advance();
                self.cursor.skip_top_clause();
                self.cursor.expect_keyword(Keyword::FROM);
                self.parse_table_ref(TableAccess::Write);
            } else if token.is_keyword(Keyword::INTO) {
                // SELECT ... INTO target / OUTPUT ... INTO target
                self.cursor.advance();
                self.parse_table_ref(TableAccess::Write);
            } else if token.is_keyword(Keyword::WITH) {
                self.collect_cte_names();
                self.cursor.advance();
            } else {
                if token.is_symbol('(') {
                    self.depth += 1;
                } else if token.is_symbol(')') {
                    self.depth = self.depth.saturating_sub(1);
                }
                self.cursor.advance();
            }
        }
    }

    /// `FROM a [alias], b [alias], ...`
    fn parse_table_list(&mut self, access: TableAccess) {
        while self.parse_table_ref(access).is_some() {
            if self.cursor.expect_symbol(',').is_none() {
                break;
            }
        }
    }

    /// `name[.name...] [(args)] [[AS] alias]`
    fn parse_table_ref(&mut self, access: TableAccess) -> Option<()> {
        let parts = self.cursor.parse_qualified_name()?;

        // Table-valued function arguments or an INSERT column list
        if self.cursor.check_symbol('(') {
            self.cursor.skip_parenthesized();
        }

        let alias = self.parse_alias();
        self.refs.push(TableRef {
            parts: parts.into_iter().map(str::to_string).collect(),
            alias,
            access,
            depth: self.depth,
        });
        Some(())
    }

    fn parse_alias(&mut self) -> Option<String> {
        if self.cursor.check_keyword(Keyword::AS) {
            let next = self.cursor.peek(1)?;
            if !next.is_identifier() || next.is_variable() {
                return None;
            }
            self.cursor.advance();
            self.cursor.advance();
            return Some(normalize_identifier(&next.value));
        }

        let token = self.cursor.current_token()?;
        if token.is_identifier() && !token.is_variable() {
            self.cursor.advance();
            return Some(normalize_identifier(&token.value));
        }
        None
    }

    /// Look ahead from `WITH` for `name [(cols)] AS (body) [, name ...]` and
    /// record the names. The cursor is not moved so CTE bodies are still
    /// scanned for references.
    fn collect_cte_names(&mut self) {
        let mut look = TokenCursor::new(self.cursor.tokens());
        look.set_pos(self.cursor.pos() + 1);

        loop {
            let Some(name) = look.parse_identifier() else {
                return;
            };
            if look.check_symbol('(') {
                look.skip_parenthesized();
            }
            if look.expect_keyword(Keyword::AS).is_none() || !look.check_symbol('(') {
                return;
            }
            self.cte_names.insert(normalize_identifier(name).to_lowercase());
            look.skip_parenthesized();
            if look.expect_symbol(',').is_none() {
                return;
            }
        }
    }
}
