//! `GROUP BY` and `ORDER BY` item lists.

use shardsql_ast::{NullsOrder, OrderItem, SortDirection};
use shardsql_error::Result;

use crate::dictionary::Keyword;
use crate::parser::{ScopeBuilder, SqlParser};
use crate::token::{Symbol, TokenKind};

impl SqlParser<'_, '_> {
    /// `GROUP BY items [WITH ROLLUP]`; empty when absent.
    pub(crate) fn parse_group_by(&mut self, scope: &mut ScopeBuilder) -> Result<Vec<OrderItem>> {
        if !self.engine.skip_if_keyword(Keyword::Group)? {
            return Ok(Vec::new());
        }
        self.engine.accept_keyword(Keyword::By)?;
        let items = self.parse_order_items(scope)?;
        if self.engine.is_keyword(Keyword::With) && self.engine.peek()?.is_keyword(Keyword::Rollup) {
            self.engine.next_token()?;
            self.engine.next_token()?;
        }
        Ok(items)
    }

    /// `ORDER BY items`; empty when absent.
    pub(crate) fn parse_order_by(&mut self, scope: &mut ScopeBuilder) -> Result<Vec<OrderItem>> {
        if !self.engine.skip_if_keyword(Keyword::Order)? {
            return Ok(Vec::new());
        }
        self.engine.accept_keyword(Keyword::By)?;
        self.parse_order_items(scope)
    }

    fn parse_order_items(&mut self, scope: &mut ScopeBuilder) -> Result<Vec<OrderItem>> {
        let mut items = vec![self.parse_order_item(scope)?];
        while self.engine.skip_if_symbol(Symbol::Comma)? {
            items.push(self.parse_order_item(scope)?);
        }
        Ok(items)
    }

    fn parse_order_item(&mut self, scope: &mut ScopeBuilder) -> Result<OrderItem> {
        let expr = self.parse_expression(scope)?;
        let direction = match self.engine.current().kind {
            TokenKind::Keyword(Keyword::Asc) => Some(SortDirection::Asc),
            TokenKind::Keyword(Keyword::Desc) => Some(SortDirection::Desc),
            _ => None,
        };
        if direction.is_some() {
            self.engine.next_token()?;
        }
        let mut nulls = None;
        if self.engine.skip_if_keyword(Keyword::Nulls)? {
            nulls = Some(match self.engine.current().kind {
                TokenKind::Keyword(Keyword::First) => NullsOrder::First,
                TokenKind::Keyword(Keyword::Last) => NullsOrder::Last,
                _ => return Err(self.engine.unexpected("FIRST or LAST")),
            });
            self.engine.next_token()?;
        }
        Ok(OrderItem {
            expr,
            direction,
            nulls,
        })
    }
}
