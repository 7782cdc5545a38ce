//! `SELECT` statement parser.
//!
//! Clauses are parsed in a fixed order; each clause parser is a no-op when
//! its introducing keyword is absent.

use shardsql_ast::{SelectStatement, Span};
use shardsql_error::Result;

use crate::dictionary::Keyword;
use crate::parser::{OwnerRef, ScopeBuilder, SqlParser};

impl SqlParser<'_, '_> {
    /// Parse a `SELECT` whose placeholder counter starts at `parameters_index`.
    ///
    /// Returns the owner qualifiers that no table of this statement claims.
    pub(crate) fn parse_select_statement(
        &mut self,
        parameters_index: u32,
    ) -> Result<(SelectStatement, Vec<OwnerRef>)> {
        let begin = self.engine.current().span.start as usize;
        self.engine.accept_keyword(Keyword::Select)?;
        let mut scope = ScopeBuilder::starting_at(parameters_index);

        let distinct = self.parse_distinct()?;
        self.skip_select_options()?;
        let top = self.parse_top(&mut scope)?;
        let items = self.parse_select_list(&mut scope)?;
        let from = self.parse_from(&mut scope)?;
        let where_clause = self.parse_condition_clause(Keyword::Where, &mut scope)?;
        let group_by = self.parse_group_by(&mut scope)?;
        let having = self.parse_condition_clause(Keyword::Having, &mut scope)?;
        let order_by = self.parse_order_by(&mut scope)?;

        let limit_start = self.engine.current().span.start as usize;
        let limit = match (top, self.parse_limit(&mut scope)?) {
            (Some(_), Some(_)) => {
                return Err(self.syntax_error(limit_start, "TOP cannot be combined with OFFSET or FETCH"));
            }
            (top, limit) => limit.or(top),
        };
        let (lock, query_option) = self.parse_trailing_options()?;
        self.reject_set_operation()?;

        let span = Span::from_offsets(begin, self.engine.last_end());
        let (scope, unresolved) = scope.finish();
        let select = SelectStatement {
            distinct,
            items,
            from,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            lock,
            query_option,
            scope,
            span,
        };
        Ok((select, unresolved))
    }
}
