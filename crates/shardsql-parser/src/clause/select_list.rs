//! Select list: `*`, `owner.*`, aggregations and expressions.

use shardsql_ast::{AggregationKind, Identifier, SelectItem, Span};
use shardsql_error::Result;

use crate::dictionary::Keyword;
use crate::parser::{ScopeBuilder, SqlParser};
use crate::token::{Symbol, TokenKind};

impl SqlParser<'_, '_> {
    pub(crate) fn parse_select_list(&mut self, scope: &mut ScopeBuilder) -> Result<Vec<SelectItem>> {
        let mut items = vec![self.parse_select_item(scope)?];
        while self.engine.skip_if_symbol(Symbol::Comma)? {
            items.push(self.parse_select_item(scope)?);
        }
        Ok(items)
    }

    fn parse_select_item(&mut self, scope: &mut ScopeBuilder) -> Result<SelectItem> {
        let tok = self.engine.current();
        let begin = tok.span.start as usize;

        if tok.is_symbol(Symbol::Star) {
            self.engine.next_token()?;
            return Ok(SelectItem::Star {
                owner: None,
                span: tok.span,
            });
        }

        if tok.is_name()
            && self.engine.peek()?.is_symbol(Symbol::Dot)
            && self.engine.peek_nth(2)?.is_symbol(Symbol::Star)
        {
            scope.note_owner(&tok);
            self.engine.next_token()?;
            self.engine.next_token()?;
            self.engine.next_token()?;
            return Ok(SelectItem::Star {
                owner: Some(Identifier::new(tok.identifier_name(), tok.span)),
                span: Span::from_offsets(begin, self.engine.last_end()),
            });
        }

        if tok.kind == TokenKind::Identifier && self.engine.peek()?.is_symbol(Symbol::LeftParen) {
            if let Some(kind) = AggregationKind::from_name(tok.text) {
                self.engine.next_token()?;
                let args = self.skip_parentheses(scope)?;
                if !self.skip_continuation(scope)? && !self.skip_comparison_tail(scope)? {
                    let argument = self
                        .source_text(args.start as usize + 1, args.end as usize - 1)
                        .to_owned();
                    let span = Span::from_offsets(begin, self.engine.last_end());
                    return Ok(SelectItem::Aggregation {
                        kind,
                        argument,
                        alias: self.parse_alias()?,
                        span,
                    });
                }
                let expr = self.opaque_from(begin);
                return Ok(SelectItem::Expr {
                    expr,
                    alias: self.parse_alias()?,
                });
            }
        }

        let mut expr = self.parse_expression(scope)?;
        if self.skip_comparison_tail(scope)? {
            expr = self.opaque_from(begin);
        }
        Ok(SelectItem::Expr {
            expr,
            alias: self.parse_alias()?,
        })
    }

    /// Fold `= x`, `IS NULL`, `LIKE x`, `REGEXP x`, `IN (...)`, `BETWEEN a AND b` tails
    /// that follow a select item into its span.
    fn skip_comparison_tail(&mut self, scope: &mut ScopeBuilder) -> Result<bool> {
        let mut consumed = false;
        loop {
            let tok = self.engine.current();
            match tok.kind {
                TokenKind::Symbol(sym) if sym.is_comparison() => {
                    self.engine.next_token()?;
                    self.skip_operand(scope)?;
                    self.skip_continuation(scope)?;
                }
                TokenKind::Keyword(Keyword::Is) => {
                    self.engine.next_token()?;
                    self.engine.skip_if_keyword(Keyword::Not)?;
                    self.skip_operand(scope)?;
                }
                TokenKind::Keyword(Keyword::Not)
                    if matches!(
                        self.engine.peek()?.kind,
                        TokenKind::Keyword(Keyword::In | Keyword::Like | Keyword::Between)
                    ) || self.is_regexp(&self.engine.peek()?) =>
                {
                    self.engine.next_token()?;
                }
                TokenKind::Identifier if self.is_regexp(&tok) => {
                    self.engine.next_token()?;
                    self.skip_operand(scope)?;
                    self.skip_continuation(scope)?;
                }
                TokenKind::Keyword(Keyword::Like | Keyword::In) => {
                    self.engine.next_token()?;
                    self.skip_operand(scope)?;
                    self.skip_continuation(scope)?;
                }
                TokenKind::Keyword(Keyword::Between) => {
                    self.engine.next_token()?;
                    self.skip_operand(scope)?;
                    self.skip_continuation(scope)?;
                    self.engine.accept_keyword(Keyword::And)?;
                    self.skip_operand(scope)?;
                    self.skip_continuation(scope)?;
                }
                _ => return Ok(consumed),
            }
            consumed = true;
        }
    }
}
