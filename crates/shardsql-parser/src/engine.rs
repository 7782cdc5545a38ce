//! Token-matching combinators over the [`Lexer`].
//!
//! Clause parsers only ever touch the token stream through a
//! [`LexerEngine`].

use shardsql_ast::Span;
use shardsql_error::{Result, SqlParseError};

use crate::dialect::DialectOptions;
use crate::dictionary::Keyword;
use crate::lexer::Lexer;
use crate::token::{Symbol, Token, TokenKind};

/// Result of skipping a balanced parenthesised run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skipped {
    /// From the opening `(` through the closing `)`.
    pub span: Span,
    /// `?` placeholders seen inside.
    pub placeholders: u32,
}

#[derive(Clone)]
pub struct LexerEngine<'a> {
    lexer: Lexer<'a>,
    last_end: usize,
}

impl<'a> LexerEngine<'a> {
    pub fn new(input: &'a str, options: &'a DialectOptions) -> Result<Self> {
        Ok(Self {
            lexer: Lexer::new(input, options)?,
            last_end: 0,
        })
    }

    #[must_use]
    pub const fn input(&self) -> &'a str {
        self.lexer.input()
    }

    #[must_use]
    pub const fn options(&self) -> &'a DialectOptions {
        self.lexer.options()
    }

    #[must_use]
    pub const fn current(&self) -> Token<'a> {
        self.lexer.current()
    }

    /// End offset of the most recently consumed token.
    #[must_use]
    pub const fn last_end(&self) -> usize {
        self.last_end
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        self.current().is_end()
    }

    /// Consume the current token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        self.last_end = self.current().span.end as usize;
        self.lexer.advance()
    }

    /// The token after the current one, without consuming anything.
    pub fn peek(&self) -> Result<Token<'a>> {
        self.peek_nth(1)
    }

    /// The `n`-th token after the current one (`peek_nth(0)` is the current token).
    pub fn peek_nth(&self, n: usize) -> Result<Token<'a>> {
        let mut ahead = self.lexer.clone();
        for _ in 0..n {
            if ahead.current().is_end() {
                break;
            }
            ahead.advance()?;
        }
        Ok(ahead.current())
    }

    #[must_use]
    pub fn matches_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current().kind)
    }

    #[must_use]
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.current().is_keyword(kw)
    }

    #[must_use]
    pub fn is_symbol(&self, sym: Symbol) -> bool {
        self.current().is_symbol(sym)
    }

    /// Advance past the current token iff it is one of `kinds`.
    pub fn skip_if_equal(&mut self, kinds: &[TokenKind]) -> Result<bool> {
        if self.matches_any(kinds) {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn skip_if_keyword(&mut self, kw: Keyword) -> Result<bool> {
        self.skip_if_equal(&[TokenKind::Keyword(kw)])
    }

    pub fn skip_if_symbol(&mut self, sym: Symbol) -> Result<bool> {
        self.skip_if_equal(&[TokenKind::Symbol(sym)])
    }

    /// Advance past every leading token that is one of `kinds`.
    pub fn skip_all(&mut self, kinds: &[TokenKind]) -> Result<()> {
        while self.skip_if_equal(kinds)? {}
        Ok(())
    }

    /// Require the current token to be `kind` and consume it.
    pub fn accept(&mut self, kind: TokenKind) -> Result<Token<'a>> {
        let tok = self.current();
        if tok.kind != kind {
            return Err(self.unexpected(&describe(kind)));
        }
        self.next_token()?;
        Ok(tok)
    }

    pub fn accept_keyword(&mut self, kw: Keyword) -> Result<Token<'a>> {
        self.accept(TokenKind::Keyword(kw))
    }

    pub fn accept_symbol(&mut self, sym: Symbol) -> Result<Token<'a>> {
        self.accept(TokenKind::Symbol(sym))
    }

    /// Skip from the current `(` to its matching `)`.
    pub fn skip_parentheses(&mut self) -> Result<Skipped> {
        let open = self.accept_symbol(Symbol::LeftParen)?;
        let mut depth = 1_u32;
        let mut placeholders = 0_u32;
        while depth > 0 {
            let tok = self.current();
            match tok.kind {
                TokenKind::End => return Err(self.unbalanced(open)),
                TokenKind::Symbol(Symbol::LeftParen) => depth += 1,
                TokenKind::Symbol(Symbol::RightParen) => depth -= 1,
                TokenKind::Symbol(Symbol::Question) => placeholders += 1,
                _ => {}
            }
            self.next_token()?;
        }
        Ok(Skipped {
            span: Span::from_offsets(open.span.start as usize, self.last_end),
            placeholders,
        })
    }

    /// Syntax error at the current token.
    #[must_use]
    pub fn error(&self, detail: impl Into<String>) -> SqlParseError {
        SqlParseError::syntax(self.input(), self.current().span.start as usize, detail)
    }

    /// `expected X, found Y` at the current token.
    #[must_use]
    pub fn unexpected(&self, expected: &str) -> SqlParseError {
        let tok = self.current();
        let found = if tok.is_end() {
            "end of input".to_owned()
        } else {
            format!("'{}'", tok.text)
        };
        self.error(format!("expected {expected}, found {found}"))
    }

    /// Unbalanced-parenthesis error pointing at the opening `(`.
    #[must_use]
    pub fn unbalanced(&self, open: Token<'a>) -> SqlParseError {
        SqlParseError::syntax(
            self.input(),
            open.span.start as usize,
            "unbalanced parentheses: missing ')'",
        )
    }
}

fn describe(kind: TokenKind) -> String {
    match kind {
        TokenKind::Keyword(kw) => kw.as_str().to_owned(),
        TokenKind::Symbol(sym) => format!("'{}'", sym.as_str()),
        TokenKind::Identifier => "identifier".to_owned(),
        TokenKind::IntLiteral | TokenKind::HexLiteral => "integer".to_owned(),
        TokenKind::FloatLiteral => "number".to_owned(),
        TokenKind::CharsLiteral => "string".to_owned(),
        TokenKind::Variable => "variable".to_owned(),
        TokenKind::End => "end of input".to_owned(),
    }
}
