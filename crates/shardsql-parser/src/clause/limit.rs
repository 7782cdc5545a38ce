//! Pagination: `LIMIT`, `OFFSET ... FETCH` and SQL Server `TOP`.

use shardsql_ast::{Limit, LimitForm, LimitValue};
use shardsql_error::Result;

use crate::dialect::DatabaseType;
use crate::dictionary::Keyword;
use crate::parser::{ScopeBuilder, SqlParser};
use crate::token::{Symbol, TokenKind};

impl SqlParser<'_, '_> {
    /// `LIMIT n`, `LIMIT o, n`, `LIMIT n OFFSET o`, or the standard
    /// `OFFSET o ROWS FETCH FIRST n ROWS ONLY` form.
    pub(crate) fn parse_limit(&mut self, scope: &mut ScopeBuilder) -> Result<Option<Limit>> {
        match self.engine.current().kind {
            TokenKind::Keyword(Keyword::Limit) => {
                self.engine.next_token()?;
                let first = self.parse_limit_value(scope)?;
                let limit = if self.engine.skip_if_symbol(Symbol::Comma)? {
                    Limit {
                        form: LimitForm::LimitComma,
                        offset: Some(first),
                        row_count: Some(self.parse_limit_value(scope)?),
                        ..Limit::default()
                    }
                } else if self.engine.skip_if_keyword(Keyword::Offset)? {
                    Limit {
                        offset: Some(self.parse_limit_value(scope)?),
                        row_count: Some(first),
                        ..Limit::default()
                    }
                } else {
                    Limit {
                        row_count: Some(first),
                        ..Limit::default()
                    }
                };
                Ok(Some(limit))
            }
            TokenKind::Keyword(Keyword::Offset | Keyword::Fetch) => {
                self.parse_offset_fetch(scope).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn parse_offset_fetch(&mut self, scope: &mut ScopeBuilder) -> Result<Limit> {
        let mut limit = Limit {
            form: LimitForm::OffsetFetch,
            ..Limit::default()
        };
        if self.engine.skip_if_keyword(Keyword::Offset)? {
            limit.offset = Some(self.parse_limit_value(scope)?);
            self.engine
                .skip_if_equal(&[TokenKind::Keyword(Keyword::Row), TokenKind::Keyword(Keyword::Rows)])?;
        }
        if self.engine.skip_if_keyword(Keyword::Fetch)? {
            if !self
                .engine
                .skip_if_equal(&[TokenKind::Keyword(Keyword::First), TokenKind::Keyword(Keyword::Next)])?
            {
                return Err(self.engine.unexpected("FIRST or NEXT"));
            }
            limit.row_count = Some(self.parse_limit_value(scope)?);
            if !self
                .engine
                .skip_if_equal(&[TokenKind::Keyword(Keyword::Row), TokenKind::Keyword(Keyword::Rows)])?
            {
                return Err(self.engine.unexpected("ROW or ROWS"));
            }
            self.engine.accept_keyword(Keyword::Only)?;
        }
        Ok(limit)
    }

    /// SQL Server `TOP n | TOP (n) [PERCENT] [WITH TIES]`.
    pub(crate) fn parse_top(&mut self, scope: &mut ScopeBuilder) -> Result<Option<Limit>> {
        if self.dialect != DatabaseType::SqlServer || !self.engine.skip_if_keyword(Keyword::Top)? {
            return Ok(None);
        }
        let row_count = if self.engine.is_symbol(Symbol::LeftParen) {
            let open = self.engine.accept_symbol(Symbol::LeftParen)?;
            let value = self.parse_limit_value(scope)?;
            self.expect_closing(open)?;
            value
        } else {
            self.parse_limit_value(scope)?
        };
        let percent = self.engine.skip_if_keyword(Keyword::Percent)?;
        let with_ties = self.engine.is_keyword(Keyword::With) && self.engine.peek()?.is_keyword(Keyword::Ties);
        if with_ties {
            self.engine.next_token()?;
            self.engine.next_token()?;
        }
        Ok(Some(Limit {
            form: LimitForm::Top,
            offset: None,
            row_count: Some(row_count),
            percent,
            with_ties,
        }))
    }

    fn parse_limit_value(&mut self, scope: &mut ScopeBuilder) -> Result<LimitValue> {
        let tok = self.engine.current();
        let value = match tok.kind {
            TokenKind::Symbol(Symbol::Question) => LimitValue::Placeholder {
                index: scope.next_parameter(),
                span: tok.span,
            },
            TokenKind::IntLiteral | TokenKind::HexLiteral => LimitValue::Literal {
                value: tok.int_value().ok_or_else(|| {
                    self.syntax_error(tok.span.start as usize, "integer literal out of range")
                })?,
                span: tok.span,
            },
            _ => return Err(self.engine.unexpected("row count")),
        };
        self.engine.next_token()?;
        Ok(value)
    }
}
