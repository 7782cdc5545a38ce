//! Condition lists for `WHERE`, `HAVING` and `ON`.
//!
//! Conditions are kept flat: each [`Condition`] carries the connector that
//! joined it to its predecessor. Parenthesised lists become
//! [`Predicate::Group`].

use shardsql_ast::{CompareOp, Condition, Connector, Expr, InList, Predicate, Span, WhereClause};
use shardsql_error::Result;

use crate::dialect::DatabaseType;
use crate::dictionary::Keyword;
use crate::parser::{ScopeBuilder, SqlParser};
use crate::token::{Symbol, Token, TokenKind};

impl SqlParser<'_, '_> {
    /// `WHERE conditions` or `HAVING conditions` when `keyword` is present.
    pub(crate) fn parse_condition_clause(
        &mut self,
        keyword: Keyword,
        scope: &mut ScopeBuilder,
    ) -> Result<Option<WhereClause>> {
        if !self.engine.skip_if_keyword(keyword)? {
            return Ok(None);
        }
        let begin = self.engine.current().span.start as usize;
        let conditions = self.parse_conditions(scope)?;
        Ok(Some(WhereClause {
            conditions,
            span: Span::from_offsets(begin, self.engine.last_end()),
        }))
    }

    /// Predicates joined by `AND` / `OR` (`&&` counts as `AND`).
    pub(crate) fn parse_conditions(&mut self, scope: &mut ScopeBuilder) -> Result<Vec<Condition>> {
        let mut conditions = Vec::new();
        let mut connector = Connector::First;
        loop {
            let begin = self.engine.current().span.start as usize;
            let predicate = self.parse_predicate(scope)?;
            conditions.push(Condition {
                connector,
                predicate,
                span: Span::from_offsets(begin, self.engine.last_end()),
            });
            connector = match self.engine.current().kind {
                TokenKind::Keyword(Keyword::And) | TokenKind::Symbol(Symbol::AmpAmp) => {
                    Connector::And
                }
                TokenKind::Keyword(Keyword::Or) => Connector::Or,
                _ => return Ok(conditions),
            };
            self.engine.next_token()?;
        }
    }

    fn parse_predicate(&mut self, scope: &mut ScopeBuilder) -> Result<Predicate> {
        let tok = self.engine.current();
        match tok.kind {
            TokenKind::Keyword(Keyword::Not) => {
                self.engine.next_token()?;
                self.enter_nesting()?;
                let inner = self.parse_predicate(scope);
                self.leave_nesting();
                Ok(match inner? {
                    Predicate::Exists {
                        negated: false,
                        query,
                    } => Predicate::Exists {
                        negated: true,
                        query,
                    },
                    other => Predicate::Not(Box::new(other)),
                })
            }
            TokenKind::Keyword(Keyword::Exists) => {
                self.engine.next_token()?;
                let open = self.engine.accept_symbol(Symbol::LeftParen)?;
                if !self.engine.is_keyword(Keyword::Select) {
                    return Err(self.engine.unexpected("SELECT"));
                }
                let query = self.parse_nested_select(scope)?;
                self.expect_closing(open)?;
                Ok(Predicate::Exists {
                    negated: false,
                    query: Box::new(query),
                })
            }
            TokenKind::Symbol(Symbol::LeftParen)
                if !self.engine.peek()?.is_keyword(Keyword::Select) =>
            {
                match self.try_parse_group(scope)? {
                    Some(conditions) => Ok(Predicate::Group(conditions)),
                    None => {
                        let left = self.parse_expression(scope)?;
                        self.parse_predicate_tail(left, scope)
                    }
                }
            }
            _ => {
                let left = self.parse_expression(scope)?;
                self.parse_predicate_tail(left, scope)
            }
        }
    }

    /// Try `( conditions )` as a group. Backtracks when the parenthesised
    /// text is really the first operand of a larger predicate, e.g.
    /// `(a + b) > 3`.
    fn try_parse_group(&mut self, scope: &mut ScopeBuilder) -> Result<Option<Vec<Condition>>> {
        let saved = self.engine.clone();
        let mut trial = scope.clone();
        self.enter_nesting()?;
        let attempt = self.parse_group_body(&mut trial);
        self.leave_nesting();
        match attempt {
            Ok(conditions) if !self.continues_operand()? => {
                *scope = trial;
                Ok(Some(conditions))
            }
            Err(err) if self.nesting_exhausted => Err(err),
            _ => {
                self.engine = saved;
                Ok(None)
            }
        }
    }

    fn parse_group_body(&mut self, scope: &mut ScopeBuilder) -> Result<Vec<Condition>> {
        self.engine.accept_symbol(Symbol::LeftParen)?;
        let conditions = self.parse_conditions(scope)?;
        self.engine.accept_symbol(Symbol::RightParen)?;
        Ok(conditions)
    }

    fn continues_operand(&self) -> Result<bool> {
        Ok(match self.engine.current().kind {
            TokenKind::Symbol(sym) => sym.is_comparison() || sym.is_composite_operator(),
            TokenKind::Keyword(
                Keyword::Is
                | Keyword::In
                | Keyword::Between
                | Keyword::Like
                | Keyword::Div
                | Keyword::Mod,
            ) => true,
            TokenKind::Keyword(Keyword::Not) => {
                let next = self.engine.peek()?;
                matches!(
                    next.kind,
                    TokenKind::Keyword(Keyword::In | Keyword::Between | Keyword::Like)
                ) || self.is_regexp(&next)
            }
            TokenKind::Identifier => self.is_regexp(&self.engine.current()),
            _ => false,
        })
    }

    /// MySQL `REGEXP` / `RLIKE` operator.
    pub(crate) fn is_regexp(&self, tok: &Token<'_>) -> bool {
        self.dialect == DatabaseType::MySql && tok.is_regexp_operator()
    }

    fn parse_predicate_tail(&mut self, left: Expr, scope: &mut ScopeBuilder) -> Result<Predicate> {
        let begin = left.span().start as usize;
        let tok = self.engine.current();

        if let TokenKind::Symbol(sym) = tok.kind {
            if let Some(op) = compare_op(sym) {
                self.engine.next_token()?;
                let right = self.parse_comparand(scope)?;
                return Ok(Predicate::Compare { left, op, right });
            }
        }

        if tok.is_keyword(Keyword::Is) {
            self.engine.next_token()?;
            let negated = self.engine.skip_if_keyword(Keyword::Not)?;
            if self.engine.skip_if_keyword(Keyword::Null)? {
                return Ok(Predicate::IsNull { left, negated });
            }
            // IS [NOT] TRUE / FALSE / UNKNOWN
            self.skip_operand(scope)?;
            return Ok(Predicate::Bare(self.opaque_from(begin)));
        }

        let negated = self.engine.skip_if_keyword(Keyword::Not)?;
        match self.engine.current().kind {
            TokenKind::Keyword(Keyword::In) => {
                self.engine.next_token()?;
                let list = self.parse_in_list(scope)?;
                Ok(Predicate::In {
                    left,
                    negated,
                    list,
                })
            }
            TokenKind::Keyword(Keyword::Between) => {
                self.engine.next_token()?;
                let low = self.parse_expression(scope)?;
                self.engine.accept_keyword(Keyword::And)?;
                let high = self.parse_expression(scope)?;
                Ok(Predicate::Between {
                    left,
                    negated,
                    low,
                    high,
                })
            }
            TokenKind::Keyword(Keyword::Like) => {
                self.engine.next_token()?;
                let pattern = self.parse_expression(scope)?;
                let escape = if self.engine.skip_if_keyword(Keyword::Escape)? {
                    Some(self.parse_expression(scope)?)
                } else {
                    None
                };
                Ok(Predicate::Like {
                    left,
                    negated,
                    pattern,
                    escape,
                })
            }
            TokenKind::Identifier if self.is_regexp(&self.engine.current()) => {
                self.engine.next_token()?;
                self.parse_expression(scope)?;
                Ok(Predicate::Bare(self.opaque_from(begin)))
            }
            _ if negated => Err(self.engine.unexpected("IN, BETWEEN, LIKE or REGEXP")),
            _ => Ok(Predicate::Bare(left)),
        }
    }

    /// Right side of a comparison; `ALL (...)` is kept opaque.
    fn parse_comparand(&mut self, scope: &mut ScopeBuilder) -> Result<Expr> {
        if self.engine.is_keyword(Keyword::All) && self.engine.peek()?.is_symbol(Symbol::LeftParen) {
            let begin = self.engine.current().span.start as usize;
            self.engine.next_token()?;
            self.skip_parentheses(scope)?;
            return Ok(self.opaque_from(begin));
        }
        self.parse_expression(scope)
    }

    fn parse_in_list(&mut self, scope: &mut ScopeBuilder) -> Result<InList> {
        let open = self.engine.accept_symbol(Symbol::LeftParen)?;
        let list = if self.engine.is_keyword(Keyword::Select) {
            InList::Subquery(Box::new(self.parse_nested_select(scope)?))
        } else {
            let mut values = vec![self.parse_expression(scope)?];
            while self.engine.skip_if_symbol(Symbol::Comma)? {
                values.push(self.parse_expression(scope)?);
            }
            InList::Values(values)
        };
        self.expect_closing(open)?;
        Ok(list)
    }
}

fn compare_op(sym: Symbol) -> Option<CompareOp> {
    Some(match sym {
        Symbol::Eq => CompareOp::Eq,
        Symbol::LtGt | Symbol::BangEq => CompareOp::NotEq,
        Symbol::LtEqGt => CompareOp::NullSafeEq,
        Symbol::Lt => CompareOp::Lt,
        Symbol::LtEq | Symbol::BangGt => CompareOp::LtEq,
        Symbol::Gt => CompareOp::Gt,
        Symbol::GtEq | Symbol::BangLt => CompareOp::GtEq,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DatabaseType;
    use crate::metadata::AnyTable;
    use crate::parser::ParserConfig;

    fn conditions(src: &str) -> (Vec<Condition>, ScopeBuilder) {
        let cfg = ParserConfig::new(DatabaseType::MySql);
        let mut parser = SqlParser::new(src, &cfg, &AnyTable).unwrap();
        let mut scope = ScopeBuilder::default();
        let list = parser.parse_conditions(&mut scope).unwrap();
        assert!(parser.engine.is_end(), "unconsumed input in {src:?}");
        (list, scope)
    }

    #[test]
    fn comparison_chain() {
        let (list, scope) = conditions("a = ? AND b <> 2 OR c >= ?");
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].connector, Connector::First);
        assert_eq!(list[1].connector, Connector::And);
        assert_eq!(list[2].connector, Connector::Or);
        assert!(matches!(
            list[1].predicate,
            Predicate::Compare {
                op: CompareOp::NotEq,
                ..
            }
        ));
        match &list[2].predicate {
            Predicate::Compare { op, right, .. } => {
                assert_eq!(*op, CompareOp::GtEq);
                assert!(matches!(right, Expr::Placeholder { index: 1, .. }));
            }
            other => panic!("{other:?}"),
        }
        assert_eq!(scope.scope.parameters_index, 2);
    }

    #[test]
    fn in_between_like_is_null() {
        let (list, _) = conditions(
            "id NOT IN (1, 2, ?) AND d BETWEEN ? AND ? AND n LIKE 'a%' ESCAPE '!' AND x IS NOT NULL",
        );
        match &list[0].predicate {
            Predicate::In {
                negated: true,
                list: InList::Values(values),
                ..
            } => assert_eq!(values.len(), 3),
            other => panic!("{other:?}"),
        }
        assert!(matches!(list[1].predicate, Predicate::Between { negated: false, .. }));
        match &list[2].predicate {
            Predicate::Like { escape, .. } => assert!(escape.is_some()),
            other => panic!("{other:?}"),
        }
        assert!(matches!(list[3].predicate, Predicate::IsNull { negated: true, .. }));
    }

    #[test]
    fn regexp_is_kept_verbatim() {
        let (list, scope) = conditions("name REGEXP ? AND code NOT RLIKE '^a' AND id = ?");
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].predicate, Predicate::Bare(Expr::Opaque {
            text: "name REGEXP ?".to_owned(),
            span: Span::new(0, 13),
        }));
        assert_eq!(list[1].predicate, Predicate::Bare(Expr::Opaque {
            text: "code NOT RLIKE '^a'".to_owned(),
            span: Span::new(18, 37),
        }));
        assert_eq!(scope.scope.parameters_index, 2);
    }

    #[test]
    fn regexp_is_mysql_only() {
        let cfg = ParserConfig::new(DatabaseType::Standard);
        let mut parser = SqlParser::new("name REGEXP 'a'", &cfg, &AnyTable).unwrap();
        let mut scope = ScopeBuilder::default();
        parser.parse_conditions(&mut scope).unwrap();
        assert!(!parser.engine.is_end());
    }

    #[test]
    fn parenthesised_group() {
        let (list, _) = conditions("(a = 1 OR b = 2) AND c = 3");
        match &list[0].predicate {
            Predicate::Group(inner) => assert_eq!(inner.len(), 2),
            other => panic!("{other:?}"),
        }
        assert_eq!(list[0].span, Span::new(0, 16));
    }

    #[test]
    fn parenthesised_operand_backtracks() {
        let (list, scope) = conditions("(a + ?) * 2 > ?");
        match &list[0].predicate {
            Predicate::Compare { left, op, .. } => {
                assert_eq!(*op, CompareOp::Gt);
                assert_eq!(left, &Expr::Opaque {
                    text: "(a + ?) * 2".to_owned(),
                    span: Span::new(0, 11),
                });
            }
            other => panic!("{other:?}"),
        }
        assert_eq!(scope.scope.parameters_index, 2);
    }

    #[test]
    fn exists_and_not() {
        let (list, scope) = conditions("NOT EXISTS (SELECT 1 FROM t) AND NOT a = 1");
        assert!(matches!(list[0].predicate, Predicate::Exists { negated: true, .. }));
        assert!(matches!(list[1].predicate, Predicate::Not(_)));
        assert!(scope.scope.subqueries.is_empty());
    }

    #[test]
    fn in_subquery_continues_parameter_count() {
        let (list, scope) = conditions("a = ? AND b IN (SELECT id FROM t WHERE c = ?)");
        match &list[1].predicate {
            Predicate::In {
                list: InList::Subquery(q),
                ..
            } => assert_eq!(q.scope.parameters_index, 2),
            other => panic!("{other:?}"),
        }
        assert_eq!(scope.scope.parameters_index, 2);
    }

    #[test]
    fn double_ampersand_joins_conditions() {
        let (list, _) = conditions("a = 1 && b = 2");
        assert_eq!(list.len(), 2);
        assert_eq!(list[1].connector, Connector::And);
    }

    #[test]
    fn bare_and_all_comparand() {
        let (list, scope) = conditions("flag AND a > ALL (SELECT b FROM t)");
        assert!(matches!(list[0].predicate, Predicate::Bare(Expr::Identifier(_))));
        assert!(matches!(
            &list[1].predicate,
            Predicate::Compare {
                right: Expr::Opaque { .. },
                ..
            }
        ));
        assert_eq!(scope.scope.subqueries.len(), 1);
    }

    #[test]
    fn dangling_not_is_an_error() {
        let cfg = ParserConfig::new(DatabaseType::MySql);
        let mut parser = SqlParser::new("a NOT 1", &cfg, &AnyTable).unwrap();
        let mut scope = ScopeBuilder::default();
        let err = parser.parse_conditions(&mut scope).unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.offset(), 6);
    }

    #[test]
    fn deep_groups_hit_the_nesting_limit() {
        let cfg = ParserConfig {
            max_nesting_depth: 3,
            ..ParserConfig::new(DatabaseType::MySql)
        };
        let src = format!("{}a = 1{}", "(".repeat(6), ")".repeat(6));
        let mut parser = SqlParser::new(&src, &cfg, &AnyTable).unwrap();
        let mut scope = ScopeBuilder::default();
        let err = parser.parse_conditions(&mut scope).unwrap_err();
        assert!(err.is_syntax());
        assert!(err.detail().contains("nesting depth"));
    }
}
