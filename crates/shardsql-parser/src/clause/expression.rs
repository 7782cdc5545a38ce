//! Expression clause parser.
//!
//! Only simple leaves are decomposed: names, `owner.member`, literals and
//! placeholders. Anything composite (operators, function calls,
//! parenthesised terms, `CASE`) becomes an [`Expr::Opaque`] span of the
//! original text. Placeholders and `owner.` qualifiers inside opaque spans
//! are still counted and recorded.

use shardsql_ast::{Expr, Identifier, NumberValue, Span};
use shardsql_error::Result;

use crate::dictionary::Keyword;
use crate::parser::{ScopeBuilder, SqlParser};
use crate::token::{Symbol, Token, TokenKind};

impl<'a> SqlParser<'a, '_> {
    /// Parse one expression.
    pub(crate) fn parse_expression(&mut self, scope: &mut ScopeBuilder) -> Result<Expr> {
        let tok = self.engine.current();
        let begin = tok.span.start as usize;

        let leaf = match tok.kind {
            TokenKind::Symbol(Symbol::Question) => {
                self.engine.next_token()?;
                Expr::Placeholder {
                    index: scope.next_parameter(),
                    span: tok.span,
                }
            }
            TokenKind::IntLiteral | TokenKind::HexLiteral => {
                self.engine.next_token()?;
                let value = tok
                    .int_value()
                    .ok_or_else(|| self.syntax_error(begin, "integer literal out of range"))?;
                Expr::Number {
                    value: NumberValue::Integer(value),
                    span: tok.span,
                }
            }
            TokenKind::FloatLiteral => {
                self.engine.next_token()?;
                let value = tok
                    .float_value()
                    .ok_or_else(|| self.syntax_error(begin, "malformed number"))?;
                Expr::Number {
                    value: NumberValue::Float(value),
                    span: tok.span,
                }
            }
            TokenKind::CharsLiteral => {
                self.engine.next_token()?;
                Expr::Text {
                    value: tok
                        .chars_value(self.engine.options().backslash_escapes)
                        .unwrap_or_default(),
                    national: tok.is_national_chars(),
                    span: tok.span,
                }
            }
            _ if tok.is_name() && !self.is_function_call()? => {
                return self.parse_name_expression(scope);
            }
            _ => {
                self.skip_operand(scope)?;
                self.skip_continuation(scope)?;
                return Ok(self.opaque_from(begin));
            }
        };

        if self.skip_continuation(scope)? {
            Ok(self.opaque_from(begin))
        } else {
            Ok(leaf)
        }
    }

    /// `name`, `owner.member`, or a composite starting with either.
    fn parse_name_expression(&mut self, scope: &mut ScopeBuilder) -> Result<Expr> {
        let owner_tok = self.engine.current();
        let begin = owner_tok.span.start as usize;
        self.engine.next_token()?;
        let owner = identifier(&owner_tok);

        if !self.engine.is_symbol(Symbol::Dot) {
            return if self.skip_continuation(scope)? {
                Ok(self.opaque_from(begin))
            } else {
                Ok(Expr::Identifier(owner))
            };
        }

        scope.note_owner(&owner_tok);
        self.engine.next_token()?;
        let member_tok = self.engine.current();
        let member = match member_tok.kind {
            TokenKind::Symbol(Symbol::Star) => "*".to_owned(),
            TokenKind::Identifier | TokenKind::Keyword(_) => {
                member_tok.identifier_name().into_owned()
            }
            _ => return Err(self.engine.unexpected("column name")),
        };
        self.engine.next_token()?;

        if self.skip_continuation(scope)? {
            return Ok(self.opaque_from(begin));
        }
        Ok(Expr::Property {
            owner,
            member,
            span: Span::from_offsets(begin, self.engine.last_end()),
        })
    }

    /// Whether the current token is a function name followed by `(`.
    fn is_function_call(&self) -> Result<bool> {
        let tok = self.engine.current();
        let callable = tok.is_name()
            || matches!(
                tok.kind,
                TokenKind::Keyword(
                    Keyword::Left | Keyword::Right | Keyword::Values | Keyword::Insert | Keyword::If
                )
            );
        Ok(callable && self.engine.peek()?.is_symbol(Symbol::LeftParen))
    }

    /// Skip a single operand: a literal, name, call, parenthesised term,
    /// `CASE ... END`, `EXISTS (...)`, `INTERVAL expr unit`, or any of those
    /// behind unary prefixes.
    pub(crate) fn skip_operand(&mut self, scope: &mut ScopeBuilder) -> Result<()> {
        loop {
            let tok = self.engine.current();
            let unary = matches!(
                tok.kind,
                TokenKind::Symbol(Symbol::Minus | Symbol::Plus | Symbol::Tilde | Symbol::Bang)
                    | TokenKind::Keyword(Keyword::Not)
            );
            if !unary {
                break;
            }
            self.engine.next_token()?;
        }

        let tok = self.engine.current();
        match tok.kind {
            TokenKind::Symbol(Symbol::LeftParen) => {
                self.skip_parentheses(scope)?;
            }
            TokenKind::Keyword(Keyword::Case) => self.skip_case(scope)?,
            TokenKind::Keyword(Keyword::Exists) => {
                self.engine.next_token()?;
                self.skip_parentheses(scope)?;
            }
            TokenKind::Keyword(Keyword::Interval) => {
                self.engine.next_token()?;
                self.enter_nesting()?;
                let inner = self.skip_operand(scope);
                self.leave_nesting();
                inner?;
                if self.engine.current().is_name() {
                    self.engine.next_token()?;
                }
            }
            _ if self.is_function_call()? => {
                self.engine.next_token()?;
                self.skip_parentheses(scope)?;
            }
            _ if is_operand_token(&tok) => {
                self.consume_tracked(scope)?;
            }
            _ => return Err(self.engine.unexpected("expression")),
        }
        Ok(())
    }

    /// Skip binary operators and their right operands. Returns whether
    /// anything was consumed.
    pub(crate) fn skip_continuation(&mut self, scope: &mut ScopeBuilder) -> Result<bool> {
        let mut consumed = false;
        loop {
            let tok = self.engine.current();
            match tok.kind {
                TokenKind::Symbol(Symbol::LeftParen) => {
                    self.skip_parentheses(scope)?;
                }
                TokenKind::Symbol(Symbol::Dot) => {
                    self.engine.next_token()?;
                    let member = self.engine.current();
                    if !(member.is_name()
                        || member.is_symbol(Symbol::Star)
                        || matches!(member.kind, TokenKind::Keyword(_)))
                    {
                        return Err(self.engine.unexpected("column name"));
                    }
                    self.consume_tracked(scope)?;
                }
                TokenKind::Symbol(sym) if sym.is_composite_operator() => {
                    self.engine.next_token()?;
                    self.skip_operand(scope)?;
                }
                TokenKind::Keyword(Keyword::Div | Keyword::Mod) => {
                    self.engine.next_token()?;
                    self.skip_operand(scope)?;
                }
                _ => return Ok(consumed),
            }
            consumed = true;
        }
    }

    /// Skip `CASE ... END`, including nested `CASE` blocks.
    fn skip_case(&mut self, scope: &mut ScopeBuilder) -> Result<()> {
        let open = self.engine.accept_keyword(Keyword::Case)?;
        let mut depth = 1_u32;
        while depth > 0 {
            let tok = self.engine.current();
            match tok.kind {
                TokenKind::End => {
                    return Err(self.syntax_error(
                        open.span.start as usize,
                        "CASE without matching END",
                    ));
                }
                TokenKind::Symbol(Symbol::LeftParen) => {
                    self.skip_parentheses(scope)?;
                }
                TokenKind::Keyword(Keyword::Case) => {
                    depth += 1;
                    self.engine.next_token()?;
                }
                TokenKind::Keyword(Keyword::End) => {
                    depth -= 1;
                    self.engine.next_token()?;
                }
                _ => {
                    self.consume_tracked(scope)?;
                }
            }
        }
        Ok(())
    }

    /// An opaque node over `begin..last_end`, trimmed.
    pub(crate) fn opaque_from(&self, begin: usize) -> Expr {
        let end = self.engine.last_end();
        Expr::Opaque {
            text: self.source_text(begin, end).to_owned(),
            span: Span::from_offsets(begin, end),
        }
    }
}

fn identifier(tok: &Token<'_>) -> Identifier {
    Identifier::new(tok.identifier_name(), tok.span)
}

/// Single tokens that form a complete operand.
fn is_operand_token(tok: &Token<'_>) -> bool {
    match tok.kind {
        TokenKind::Identifier
        | TokenKind::IntLiteral
        | TokenKind::FloatLiteral
        | TokenKind::HexLiteral
        | TokenKind::CharsLiteral
        | TokenKind::Variable
        | TokenKind::Symbol(Symbol::Question) => true,
        TokenKind::Keyword(kw) => kw.is_name_like() || kw.starts_operand(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DatabaseType;
    use crate::metadata::AnyTable;
    use crate::parser::ParserConfig;

    fn expr(src: &str) -> (Expr, u32) {
        expr_in(src, DatabaseType::MySql)
    }

    fn expr_in(src: &str, dialect: DatabaseType) -> (Expr, u32) {
        let cfg = ParserConfig::new(dialect);
        let mut parser = SqlParser::new(src, &cfg, &AnyTable).unwrap();
        let mut scope = ScopeBuilder::default();
        let e = parser.parse_expression(&mut scope).unwrap();
        assert!(parser.engine.is_end(), "unconsumed input in {src:?}");
        (e, scope.scope.parameters_index)
    }

    fn opaque_text(e: &Expr) -> &str {
        match e {
            Expr::Opaque { text, .. } => text,
            other => panic!("expected opaque, got {other:?}"),
        }
    }

    #[test]
    fn literals() {
        assert!(matches!(
            expr("123").0,
            Expr::Number {
                value: NumberValue::Integer(123),
                ..
            }
        ));
        assert!(matches!(
            expr("-5").0,
            Expr::Number {
                value: NumberValue::Integer(-5),
                ..
            }
        ));
        assert!(matches!(
            expr("0x1F").0,
            Expr::Number {
                value: NumberValue::Integer(31),
                ..
            }
        ));
        match expr("'a''b'").0 {
            Expr::Text {
                value,
                national,
                span,
            } => {
                assert_eq!(value, "a'b");
                assert!(!national);
                assert_eq!(span, Span::new(0, 6));
            }
            other => panic!("{other:?}"),
        }
        match expr_in("N'x'", DatabaseType::SqlServer).0 {
            Expr::Text { value, national, .. } => {
                assert_eq!(value, "x");
                assert!(national);
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn placeholder_takes_next_index() {
        let (e, count) = expr("?");
        assert_eq!(
            e,
            Expr::Placeholder {
                index: 0,
                span: Span::new(0, 1)
            }
        );
        assert_eq!(count, 1);
    }

    #[test]
    fn property() {
        let (e, _) = expr("o.user_id");
        match e {
            Expr::Property {
                owner,
                member,
                span,
            } => {
                assert_eq!(owner.name, "o");
                assert_eq!(member, "user_id");
                assert_eq!(span, Span::new(0, 9));
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn quoted_property() {
        let (e, _) = expr("`o`.`order`");
        match e {
            Expr::Property { owner, member, .. } => {
                assert_eq!(owner.name, "o");
                assert_eq!(owner.span, Span::new(0, 3));
                assert_eq!(member, "order");
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn function_call_is_opaque() {
        let (e, _) = expr("DATE(create_time) + 1");
        assert_eq!(opaque_text(&e), "DATE(create_time) + 1");
        assert_eq!(e.span(), Span::new(0, 21));
    }

    #[test]
    fn arithmetic_is_opaque_and_counts_placeholders() {
        let (e, count) = expr("price * ? + (tax - ?)");
        assert_eq!(opaque_text(&e), "price * ? + (tax - ?)");
        assert_eq!(count, 2);
    }

    #[test]
    fn chained_property_is_single_opaque() {
        let (e, _) = expr("a.b.c + 1");
        assert_eq!(opaque_text(&e), "a.b.c + 1");
    }

    #[test]
    fn case_is_opaque() {
        let (e, _) = expr("CASE WHEN a > 1 THEN (CASE b WHEN 1 THEN 2 END) ELSE 0 END");
        assert!(e.is_opaque());
    }

    #[test]
    fn minus_after_case_end_is_binary() {
        let (e, _) = expr("CASE WHEN a > 0 THEN 1 ELSE 0 END -1");
        assert_eq!(opaque_text(&e), "CASE WHEN a > 0 THEN 1 ELSE 0 END -1");
    }

    #[test]
    fn unary_prefix() {
        let (e, _) = expr("-a");
        assert_eq!(opaque_text(&e), "-a");
        let (e, _) = expr("NOT flag");
        assert_eq!(opaque_text(&e), "NOT flag");
    }

    #[test]
    fn interval_and_mysql_operators() {
        let (e, _) = expr("NOW() - INTERVAL 1 DAY");
        assert_eq!(opaque_text(&e), "NOW() - INTERVAL 1 DAY");
        let (e, _) = expr("a DIV 2");
        assert_eq!(opaque_text(&e), "a DIV 2");
    }

    #[test]
    fn interval_chain_hits_the_nesting_limit() {
        let src = format!("{}1", "INTERVAL ".repeat(10_000));
        let cfg = ParserConfig::new(DatabaseType::MySql);
        let mut parser = SqlParser::new(&src, &cfg, &AnyTable).unwrap();
        let err = parser
            .parse_expression(&mut ScopeBuilder::default())
            .unwrap_err();
        assert!(err.is_syntax());
        assert!(err.detail().contains("nesting depth"));
    }

    #[test]
    fn keyword_functions() {
        let (e, _) = expr("LEFT(name, 3)");
        assert_eq!(opaque_text(&e), "LEFT(name, 3)");
        let (e, _) = expr("VALUES(qty)");
        assert_eq!(opaque_text(&e), "VALUES(qty)");
    }

    #[test]
    fn non_reserved_keyword_is_identifier() {
        let (e, _) = expr("mode");
        assert_eq!(e, Expr::Identifier(Identifier::new("mode", Span::new(0, 4))));
    }

    #[test]
    fn null_literal_is_opaque() {
        let (e, _) = expr_in("NULL", DatabaseType::Standard);
        assert_eq!(opaque_text(&e), "NULL");
    }

    #[test]
    fn reserved_keyword_is_rejected() {
        let cfg = ParserConfig::default();
        let mut parser = SqlParser::new("FROM t", &cfg, &AnyTable).unwrap();
        let err = parser
            .parse_expression(&mut ScopeBuilder::default())
            .unwrap_err();
        assert!(err.is_syntax());
        assert_eq!(err.detail(), "expected expression, found 'FROM'");
    }

    #[test]
    fn nested_select_in_parentheses() {
        let cfg = ParserConfig::default();
        let mut parser = SqlParser::new("(SELECT MAX(id) FROM t WHERE x = ?) + ?", &cfg, &AnyTable).unwrap();
        let mut scope = ScopeBuilder::default();
        let e = parser.parse_expression(&mut scope).unwrap();
        assert!(e.is_opaque());
        assert_eq!(scope.scope.subqueries.len(), 1);
        assert_eq!(scope.scope.parameters_index, 2);
        assert_eq!(scope.scope.subqueries[0].scope.table_tokens.len(), 1);
    }
}
