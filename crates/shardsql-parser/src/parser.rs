//! Statement parser: dispatch, scope bookkeeping and the statement-aware
//! parenthesis skipper shared by every clause parser.

use serde::{Deserialize, Serialize};
use shardsql_ast::{SelectStatement, Span, Statement, StatementScope, Table, TableToken};
use shardsql_error::{Result, SqlParseError};

use crate::dialect::DatabaseType;
use crate::dictionary::Keyword;
use crate::engine::LexerEngine;
use crate::metadata::TableMetadata;
use crate::token::{Symbol, Token, TokenKind};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub dialect: DatabaseType,
    /// Maximum depth of nested sub-statements and parenthesised condition
    /// groups before the parse is rejected.
    pub max_nesting_depth: usize,
}

impl ParserConfig {
    pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

    #[must_use]
    pub fn new(dialect: DatabaseType) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Load from a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            dialect: DatabaseType::Standard,
            max_nesting_depth: Self::DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

// ---------------------------------------------------------------------------
// Scope bookkeeping
// ---------------------------------------------------------------------------

/// A `name.` qualifier seen while parsing, resolved when the statement ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OwnerRef {
    start: u32,
    literal: String,
    name: String,
}

/// Statement scope under construction.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScopeBuilder {
    pub(crate) scope: StatementScope,
    owners: Vec<OwnerRef>,
}

impl ScopeBuilder {
    pub(crate) fn starting_at(parameters_index: u32) -> Self {
        Self {
            scope: StatementScope {
                parameters_index,
                ..StatementScope::default()
            },
            owners: Vec::new(),
        }
    }

    pub(crate) fn next_parameter(&mut self) -> u32 {
        self.scope.next_parameter()
    }

    /// Record `tok` as the qualifier of a following `.member`.
    pub(crate) fn note_owner(&mut self, tok: &Token<'_>) {
        self.owners.push(OwnerRef {
            start: tok.span.start,
            literal: tok.text.to_owned(),
            name: tok.identifier_name().into_owned(),
        });
    }

    /// Declare a sharded table and mark its name.
    pub(crate) fn declare(&mut self, table: Table, literal: &str) {
        tracing::trace!(
            table = %table.name,
            start = table.span.start,
            "table token"
        );
        self.scope
            .table_tokens
            .push(TableToken::new(table.span.start, literal, table.name.clone()));
        self.scope.tables.push(table);
    }

    /// Resolve owner qualifiers against the declared tables.
    ///
    /// Unresolved qualifiers are returned so an enclosing statement can try
    /// them against its own tables (correlated references).
    pub(crate) fn finish(self) -> (StatementScope, Vec<OwnerRef>) {
        let Self { mut scope, owners } = self;
        let mut unresolved = Vec::new();
        for owner in owners {
            match scope.find_table(&owner.name) {
                Some(table) => {
                    tracing::trace!(
                        owner = %owner.literal,
                        table = %table.name,
                        start = owner.start,
                        "table token"
                    );
                    let token = TableToken::new(owner.start, owner.literal, table.name.clone());
                    scope.table_tokens.push(token);
                }
                None => unresolved.push(owner),
            }
        }
        scope.table_tokens.sort();
        scope.table_tokens.dedup_by(|a, b| a.start == b.start);
        (scope, unresolved)
    }

    pub(crate) fn adopt(&mut self, owners: Vec<OwnerRef>) {
        self.owners.extend(owners);
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Recursive-descent parser for a single SQL statement.
pub struct SqlParser<'a, 'm> {
    pub(crate) engine: LexerEngine<'a>,
    pub(crate) metadata: &'m dyn TableMetadata,
    pub(crate) dialect: DatabaseType,
    max_depth: usize,
    depth: usize,
    /// Set once the depth limit is hit; speculative parses must not swallow it.
    pub(crate) nesting_exhausted: bool,
}

impl<'a, 'm> SqlParser<'a, 'm> {
    pub fn new(input: &'a str, config: &ParserConfig, metadata: &'m dyn TableMetadata) -> Result<Self> {
        Ok(Self {
            engine: LexerEngine::new(input, config.dialect.options())?,
            metadata,
            dialect: config.dialect,
            max_depth: config.max_nesting_depth,
            depth: 0,
            nesting_exhausted: false,
        })
    }

    /// Parse the whole input as one statement, optionally followed by `;`.
    pub fn parse(mut self) -> Result<Statement> {
        let stmt = self.parse_statement()?;
        self.engine.skip_if_symbol(Symbol::Semicolon)?;
        if !self.engine.is_end() {
            return Err(self.engine.unexpected("end of statement"));
        }
        tracing::debug!(
            dialect = %self.dialect,
            kind = stmt.kind_name(),
            sql_len = self.engine.input().len(),
            parameters = stmt.parameters_count(),
            table_tokens = stmt.scope().table_tokens.len(),
            "parsed statement"
        );
        Ok(stmt)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let tok = self.engine.current();
        match tok.kind {
            TokenKind::Keyword(Keyword::Select) => {
                let (select, unresolved) = self.parse_select_statement(0)?;
                log_unresolved(&unresolved);
                Ok(Statement::Select(select))
            }
            TokenKind::Keyword(Keyword::Insert) => self.parse_insert().map(Statement::Insert),
            TokenKind::Keyword(Keyword::Update) => self.parse_update().map(Statement::Update),
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete().map(Statement::Delete),
            TokenKind::Keyword(
                Keyword::Create | Keyword::Alter | Keyword::Drop | Keyword::Truncate,
            ) => self.parse_ddl().map(Statement::Ddl),
            _ => Err(self.engine.unexpected("SELECT, INSERT, UPDATE, DELETE or DDL statement")),
        }
    }

    // -----------------------------------------------------------------------
    // Shared helpers for clause parsers
    // -----------------------------------------------------------------------

    #[must_use]
    pub(crate) fn input(&self) -> &'a str {
        self.engine.input()
    }

    /// Verbatim text between two offsets, trimmed.
    #[must_use]
    pub(crate) fn source_text(&self, start: usize, end: usize) -> &'a str {
        self.input().get(start..end).unwrap_or_default().trim()
    }

    /// Increase nesting depth, failing once the configured limit is reached.
    pub(crate) fn enter_nesting(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            self.nesting_exhausted = true;
            return Err(self.engine.error(format!(
                "nesting depth exceeds limit of {}",
                self.max_depth
            )));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Consume the current token, counting `?` and noting `name.` owners.
    pub(crate) fn consume_tracked(&mut self, scope: &mut ScopeBuilder) -> Result<Token<'a>> {
        let tok = self.engine.current();
        if tok.is_symbol(Symbol::Question) {
            scope.next_parameter();
        }
        self.engine.next_token()?;
        if tok.is_name() && self.engine.is_symbol(Symbol::Dot) {
            scope.note_owner(&tok);
        }
        Ok(tok)
    }

    /// Skip from the current `(` to its matching `)`.
    ///
    /// Nested `SELECT`s are parsed as sub-statements and attached to
    /// `scope`; every other token is consumed with [`Self::consume_tracked`].
    pub(crate) fn skip_parentheses(&mut self, scope: &mut ScopeBuilder) -> Result<Span> {
        let open = self.engine.accept_symbol(Symbol::LeftParen)?;
        let mut depth = 1_u32;
        while depth > 0 {
            let tok = self.engine.current();
            match tok.kind {
                TokenKind::End => return Err(self.engine.unbalanced(open)),
                TokenKind::Symbol(Symbol::LeftParen) => {
                    depth += 1;
                    self.engine.next_token()?;
                }
                TokenKind::Symbol(Symbol::RightParen) => {
                    depth -= 1;
                    self.engine.next_token()?;
                }
                TokenKind::Keyword(Keyword::Select) => {
                    let nested = self.parse_nested_select(scope)?;
                    scope.scope.subqueries.push(nested);
                }
                _ => {
                    self.consume_tracked(scope)?;
                }
            }
        }
        Ok(Span::from_offsets(open.span.start as usize, self.engine.last_end()))
    }

    /// Parse a `SELECT` embedded in an enclosing statement.
    ///
    /// The nested placeholder counter continues from the enclosing one and is
    /// copied back when the nested statement ends.
    pub(crate) fn parse_nested_select(&mut self, outer: &mut ScopeBuilder) -> Result<SelectStatement> {
        self.enter_nesting()?;
        tracing::trace!(depth = self.depth, "nested statement");
        let parsed = self.parse_select_statement(outer.scope.parameters_index);
        self.leave_nesting();
        let (select, unresolved) = parsed?;
        outer.scope.parameters_index = select.scope.parameters_index;
        outer.adopt(unresolved);
        Ok(select)
    }

    /// Consume the `)` matching `open`.
    pub(crate) fn expect_closing(&mut self, open: Token<'a>) -> Result<()> {
        if self.engine.skip_if_symbol(Symbol::RightParen)? {
            return Ok(());
        }
        Err(if self.engine.is_end() {
            self.engine.unbalanced(open)
        } else {
            self.engine.unexpected("')'")
        })
    }

    /// Consume tokens up to `;` or the end of input.
    pub(crate) fn skip_remainder(&mut self, scope: &mut ScopeBuilder) -> Result<()> {
        loop {
            let tok = self.engine.current();
            if tok.is_end() || tok.is_symbol(Symbol::Semicolon) {
                return Ok(());
            }
            if tok.is_symbol(Symbol::LeftParen) {
                self.skip_parentheses(scope)?;
            } else {
                self.consume_tracked(scope)?;
            }
        }
    }

    /// Reject set operations, which this parser does not support.
    pub(crate) fn reject_set_operation(&self) -> Result<()> {
        match self.engine.current().kind {
            TokenKind::Keyword(kw @ (Keyword::Union | Keyword::Intersect | Keyword::Except)) => {
                Err(self.engine.error(format!("unsupported {}", kw.as_str())))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn syntax_error(&self, offset: usize, detail: impl Into<String>) -> SqlParseError {
        SqlParseError::syntax(self.input(), offset, detail)
    }
}

pub(crate) fn log_unresolved(unresolved: &[OwnerRef]) {
    for owner in unresolved {
        tracing::trace!(owner = %owner.literal, start = owner.start, "unresolved owner");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{AnyTable, KnownTables};

    fn parse(sql: &str) -> Result<Statement> {
        let tables = KnownTables::new(["orders", "items"]);
        SqlParser::new(sql, &ParserConfig::new(DatabaseType::MySql), &tables)?.parse()
    }

    #[test]
    fn config_defaults_and_json() {
        let cfg = ParserConfig::default();
        assert_eq!(cfg.dialect, DatabaseType::Standard);
        assert_eq!(cfg.max_nesting_depth, 64);
        let cfg = ParserConfig::from_json(r#"{"dialect":"sqlserver"}"#).unwrap();
        assert_eq!(cfg.dialect, DatabaseType::SqlServer);
        assert_eq!(cfg.max_nesting_depth, 64);
        assert!(ParserConfig::from_json(r#"{"dialect":"oracle"}"#).is_err());
    }

    #[test]
    fn dispatch_rejects_unknown_statement() {
        let err = parse("GRANT ALL ON t").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.offset(), 0);
    }

    #[test]
    fn trailing_semicolon_is_allowed() {
        assert!(parse("SELECT 1;").is_ok());
        assert!(parse("SELECT 1; SELECT 2").unwrap_err().is_syntax());
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let err = parse("SELECT a FROM orders o x").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.offset(), 23);
    }

    #[test]
    fn nesting_limit() {
        let sql = format!("SELECT {}1{}", "(SELECT ".repeat(5), ")".repeat(5));
        let cfg = ParserConfig {
            dialect: DatabaseType::Standard,
            max_nesting_depth: 3,
        };
        let err = SqlParser::new(&sql, &cfg, &AnyTable).unwrap().parse().unwrap_err();
        assert!(err.is_syntax());
        assert!(err.detail().contains("nesting"));
        let cfg = ParserConfig::default();
        assert!(SqlParser::new(&sql, &cfg, &AnyTable).unwrap().parse().is_ok());
    }

    #[test]
    fn unbalanced_parentheses() {
        let err = parse("SELECT COUNT(a FROM orders").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.offset(), 12);
    }

    #[test]
    fn correlated_owner_resolves_in_enclosing_scope() {
        let stmt = parse(
            "SELECT * FROM orders o WHERE EXISTS (SELECT 1 FROM items i WHERE i.oid = o.id)",
        )
        .unwrap();
        let outer: Vec<(u32, &str)> = stmt
            .scope()
            .table_tokens
            .iter()
            .map(|t| (t.start, t.literal.as_str()))
            .collect();
        assert_eq!(outer, vec![(14, "orders"), (73, "o")]);
    }

    #[test]
    fn set_operations_are_unsupported() {
        let err = parse("SELECT a FROM orders UNION SELECT b FROM items").unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.detail(), "unsupported UNION");
    }
}
