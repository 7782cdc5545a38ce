//! `FROM` clause: table factors, joins and table hints.

use shardsql_ast::{FromClause, Join, JoinKind, Span, Table, TableFactor, TableSource};
use shardsql_error::Result;

use crate::dialect::DatabaseType;
use crate::dictionary::Keyword;
use crate::parser::{ScopeBuilder, SqlParser};
use crate::token::{Symbol, Token, TokenKind};

impl<'a> SqlParser<'a, '_> {
    pub(crate) fn parse_from(&mut self, scope: &mut ScopeBuilder) -> Result<Option<FromClause>> {
        if !self.engine.skip_if_keyword(Keyword::From)? {
            return Ok(None);
        }
        self.parse_table_sources(scope).map(Some)
    }

    fn parse_table_sources(&mut self, scope: &mut ScopeBuilder) -> Result<FromClause> {
        let mut sources = vec![self.parse_table_source(scope)?];
        while self.engine.skip_if_symbol(Symbol::Comma)? {
            sources.push(self.parse_table_source(scope)?);
        }
        Ok(FromClause { sources })
    }

    fn parse_table_source(&mut self, scope: &mut ScopeBuilder) -> Result<TableSource> {
        let factor = self.parse_table_factor(scope)?;
        let mut joins = Vec::new();
        while let Some(join) = self.parse_join(scope)? {
            joins.push(join);
        }
        Ok(TableSource { factor, joins })
    }

    fn parse_table_factor(&mut self, scope: &mut ScopeBuilder) -> Result<TableFactor> {
        if !self.engine.is_symbol(Symbol::LeftParen) {
            return self.parse_table_reference(scope).map(TableFactor::Table);
        }
        let begin = self.engine.current().span.start as usize;
        let open = self.engine.accept_symbol(Symbol::LeftParen)?;
        if self.engine.is_keyword(Keyword::Select) {
            let query = self.parse_nested_select(scope)?;
            self.expect_closing(open)?;
            let span = Span::from_offsets(begin, self.engine.last_end());
            return Ok(TableFactor::Derived {
                query: Box::new(query),
                alias: self.parse_alias()?,
                span,
            });
        }
        self.enter_nesting()?;
        let inner = self.parse_table_sources(scope);
        self.leave_nesting();
        let inner = inner?;
        self.expect_closing(open)?;
        Ok(TableFactor::Parenthesized(Box::new(inner)))
    }

    fn parse_join(&mut self, scope: &mut ScopeBuilder) -> Result<Option<Join>> {
        let natural = self.engine.skip_if_keyword(Keyword::Natural)?;
        let kind = match self.engine.current().kind {
            TokenKind::Keyword(Keyword::Join) => {
                self.engine.next_token()?;
                JoinKind::Inner
            }
            TokenKind::Keyword(Keyword::StraightJoin) => {
                self.engine.next_token()?;
                JoinKind::Straight
            }
            TokenKind::Keyword(kw @ (Keyword::Inner | Keyword::Cross)) => {
                self.engine.next_token()?;
                self.engine.accept_keyword(Keyword::Join)?;
                if kw == Keyword::Cross {
                    JoinKind::Cross
                } else {
                    JoinKind::Inner
                }
            }
            TokenKind::Keyword(kw @ (Keyword::Left | Keyword::Right | Keyword::Full)) => {
                self.engine.next_token()?;
                self.engine.skip_if_keyword(Keyword::Outer)?;
                self.engine.accept_keyword(Keyword::Join)?;
                match kw {
                    Keyword::Left => JoinKind::Left,
                    Keyword::Right => JoinKind::Right,
                    _ => JoinKind::Full,
                }
            }
            _ if natural => return Err(self.engine.unexpected("JOIN")),
            _ => return Ok(None),
        };

        let factor = self.parse_table_factor(scope)?;
        let mut on = Vec::new();
        let mut using = Vec::new();
        if self.engine.skip_if_keyword(Keyword::On)? {
            on = self.parse_conditions(scope)?;
        } else if self.engine.skip_if_keyword(Keyword::Using)? {
            let open = self.engine.accept_symbol(Symbol::LeftParen)?;
            loop {
                let tok = self.engine.current();
                if !tok.is_name() {
                    return Err(self.engine.unexpected("column name"));
                }
                self.engine.next_token()?;
                using.push(tok.identifier_name().into_owned());
                if !self.engine.skip_if_symbol(Symbol::Comma)? {
                    break;
                }
            }
            self.expect_closing(open)?;
        }
        Ok(Some(Join {
            natural,
            kind,
            factor,
            on,
            using,
        }))
    }

    /// `[schema.]name [[AS] alias] [hints]`, declared when it names a
    /// sharded table.
    pub(crate) fn parse_table_reference(&mut self, scope: &mut ScopeBuilder) -> Result<Table> {
        let (mut table, literal) = self.parse_table_name()?;
        table.alias = self.parse_alias()?;
        self.skip_table_hints()?;
        self.declare_table(scope, &table, literal);
        Ok(table)
    }

    /// `[schema.]name`, returning the table and the raw name token.
    pub(crate) fn parse_table_name(&mut self) -> Result<(Table, Token<'a>)> {
        let first = self.engine.current();
        if !first.is_name() {
            return Err(self.engine.unexpected("table name"));
        }
        self.engine.next_token()?;
        if !self.engine.is_symbol(Symbol::Dot) {
            return Ok((table_from(&first, None), first));
        }
        self.engine.next_token()?;
        let name = self.engine.current();
        if !name.is_name() {
            return Err(self.engine.unexpected("table name"));
        }
        self.engine.next_token()?;
        let schema = first.identifier_name().into_owned();
        Ok((table_from(&name, Some(schema)), name))
    }

    /// Register `table` as sharded when the metadata knows it.
    pub(crate) fn declare_table(&self, scope: &mut ScopeBuilder, table: &Table, literal: Token<'_>) {
        if table.name.eq_ignore_ascii_case("dual") || !self.metadata.is_table_name(&table.name) {
            return;
        }
        scope.declare(table.clone(), literal.text);
    }

    /// MySQL index hints and SQL Server `WITH (...)` table hints.
    fn skip_table_hints(&mut self) -> Result<()> {
        loop {
            let tok = self.engine.current();
            let index_hint = matches!(
                tok.kind,
                TokenKind::Keyword(Keyword::Use | Keyword::Force | Keyword::Ignore)
            ) && matches!(
                self.engine.peek()?.kind,
                TokenKind::Keyword(Keyword::Index | Keyword::Key)
            );
            if index_hint {
                self.engine.next_token()?;
                self.engine.next_token()?;
                if self.engine.skip_if_keyword(Keyword::For)? {
                    if !self.engine.skip_if_keyword(Keyword::Join)? {
                        if !self.engine.skip_if_keyword(Keyword::Order)? {
                            self.engine.accept_keyword(Keyword::Group)?;
                        }
                        self.engine.accept_keyword(Keyword::By)?;
                    }
                }
                let hint = self.engine.skip_parentheses()?;
                tracing::trace!(span = %hint.span, "index hint");
                continue;
            }
            if self.dialect == DatabaseType::SqlServer
                && tok.is_keyword(Keyword::With)
                && self.engine.peek()?.is_symbol(Symbol::LeftParen)
            {
                self.engine.next_token()?;
                self.engine.skip_parentheses()?;
                continue;
            }
            return Ok(());
        }
    }
}

fn table_from(tok: &Token<'_>, schema: Option<String>) -> Table {
    Table {
        name: tok.identifier_name().into_owned(),
        schema,
        alias: None,
        span: tok.span,
    }
}
