//! `INSERT`, `UPDATE` and `DELETE` statement parsers.

use shardsql_ast::{
    Assignment, DeleteStatement, InsertSource, InsertStatement, Span, UpdateStatement, ValuesRow,
};
use shardsql_error::Result;

use crate::dictionary::Keyword;
use crate::parser::{ScopeBuilder, SqlParser, log_unresolved};
use crate::token::{Symbol, TokenKind};

const INSERT_MODIFIERS: &[TokenKind] = &[
    TokenKind::Keyword(Keyword::LowPriority),
    TokenKind::Keyword(Keyword::Delayed),
    TokenKind::Keyword(Keyword::HighPriority),
    TokenKind::Keyword(Keyword::Ignore),
];

const UPDATE_MODIFIERS: &[TokenKind] = &[
    TokenKind::Keyword(Keyword::LowPriority),
    TokenKind::Keyword(Keyword::Ignore),
];

const DELETE_MODIFIERS: &[TokenKind] = &[
    TokenKind::Keyword(Keyword::LowPriority),
    TokenKind::Keyword(Keyword::Quick),
    TokenKind::Keyword(Keyword::Ignore),
];

impl SqlParser<'_, '_> {
    pub(crate) fn parse_insert(&mut self) -> Result<InsertStatement> {
        let begin = self.engine.current().span.start as usize;
        self.engine.accept_keyword(Keyword::Insert)?;
        self.engine.skip_all(INSERT_MODIFIERS)?;
        self.engine.skip_if_keyword(Keyword::Into)?;
        let mut scope = ScopeBuilder::starting_at(0);
        let table = self.parse_table_reference(&mut scope)?;

        let mut columns = Vec::new();
        if self.engine.is_symbol(Symbol::LeftParen) && !self.engine.peek()?.is_keyword(Keyword::Select) {
            let open = self.engine.accept_symbol(Symbol::LeftParen)?;
            if !self.engine.is_symbol(Symbol::RightParen) {
                columns.push(self.parse_expression(&mut scope)?);
                while self.engine.skip_if_symbol(Symbol::Comma)? {
                    columns.push(self.parse_expression(&mut scope)?);
                }
            }
            self.expect_closing(open)?;
        }

        let source = match self.engine.current().kind {
            TokenKind::Keyword(Keyword::Values | Keyword::Value) => {
                self.engine.next_token()?;
                InsertSource::Values(self.parse_values_rows(&mut scope)?)
            }
            TokenKind::Keyword(Keyword::Set) => {
                self.engine.next_token()?;
                InsertSource::Set(self.parse_assignments(&mut scope)?)
            }
            TokenKind::Keyword(Keyword::Select) => {
                InsertSource::Select(Box::new(self.parse_nested_select(&mut scope)?))
            }
            TokenKind::Symbol(Symbol::LeftParen) => {
                let open = self.engine.accept_symbol(Symbol::LeftParen)?;
                let query = self.parse_nested_select(&mut scope)?;
                self.expect_closing(open)?;
                InsertSource::Select(Box::new(query))
            }
            _ => return Err(self.engine.unexpected("VALUES, SET or SELECT")),
        };

        let mut on_duplicate = Vec::new();
        if self.engine.is_keyword(Keyword::On) && self.engine.peek()?.is_keyword(Keyword::Duplicate) {
            self.engine.next_token()?;
            self.engine.next_token()?;
            self.engine.accept_keyword(Keyword::Key)?;
            self.engine.accept_keyword(Keyword::Update)?;
            on_duplicate = self.parse_assignments(&mut scope)?;
        }

        let span = Span::from_offsets(begin, self.engine.last_end());
        let (scope, unresolved) = scope.finish();
        log_unresolved(&unresolved);
        Ok(InsertStatement {
            table,
            columns,
            source,
            on_duplicate,
            scope,
            span,
        })
    }

    pub(crate) fn parse_update(&mut self) -> Result<UpdateStatement> {
        let begin = self.engine.current().span.start as usize;
        self.engine.accept_keyword(Keyword::Update)?;
        self.engine.skip_all(UPDATE_MODIFIERS)?;
        let mut scope = ScopeBuilder::starting_at(0);
        let table = self.parse_table_reference(&mut scope)?;
        self.engine.accept_keyword(Keyword::Set)?;
        let assignments = self.parse_assignments(&mut scope)?;
        let where_clause = self.parse_condition_clause(Keyword::Where, &mut scope)?;
        let order_by = self.parse_order_by(&mut scope)?;
        let limit = self.parse_limit(&mut scope)?;

        let span = Span::from_offsets(begin, self.engine.last_end());
        let (scope, unresolved) = scope.finish();
        log_unresolved(&unresolved);
        Ok(UpdateStatement {
            table,
            assignments,
            where_clause,
            order_by,
            limit,
            scope,
            span,
        })
    }

    pub(crate) fn parse_delete(&mut self) -> Result<DeleteStatement> {
        let begin = self.engine.current().span.start as usize;
        self.engine.accept_keyword(Keyword::Delete)?;
        self.engine.skip_all(DELETE_MODIFIERS)?;
        self.engine.skip_if_keyword(Keyword::From)?;
        let mut scope = ScopeBuilder::starting_at(0);
        let table = self.parse_table_reference(&mut scope)?;
        let where_clause = self.parse_condition_clause(Keyword::Where, &mut scope)?;
        let order_by = self.parse_order_by(&mut scope)?;
        let limit = self.parse_limit(&mut scope)?;

        let span = Span::from_offsets(begin, self.engine.last_end());
        let (scope, unresolved) = scope.finish();
        log_unresolved(&unresolved);
        Ok(DeleteStatement {
            table,
            where_clause,
            order_by,
            limit,
            scope,
            span,
        })
    }

    /// `(v, ...)[, (v, ...)]...`
    fn parse_values_rows(&mut self, scope: &mut ScopeBuilder) -> Result<Vec<ValuesRow>> {
        let mut rows = Vec::new();
        loop {
            let begin = self.engine.current().span.start as usize;
            let open = self.engine.accept_symbol(Symbol::LeftParen)?;
            let mut values = Vec::new();
            if !self.engine.is_symbol(Symbol::RightParen) {
                values.push(self.parse_expression(scope)?);
                while self.engine.skip_if_symbol(Symbol::Comma)? {
                    values.push(self.parse_expression(scope)?);
                }
            }
            self.expect_closing(open)?;
            rows.push(ValuesRow {
                values,
                span: Span::from_offsets(begin, self.engine.last_end()),
            });
            if !self.engine.skip_if_symbol(Symbol::Comma)? {
                return Ok(rows);
            }
        }
    }

    /// `column = value[, column = value]...`
    fn parse_assignments(&mut self, scope: &mut ScopeBuilder) -> Result<Vec<Assignment>> {
        let mut assignments = Vec::new();
        loop {
            let column = self.parse_expression(scope)?;
            self.engine.accept_symbol(Symbol::Eq)?;
            let value = self.parse_expression(scope)?;
            assignments.push(Assignment { column, value });
            if !self.engine.skip_if_symbol(Symbol::Comma)? {
                return Ok(assignments);
            }
        }
    }
}
