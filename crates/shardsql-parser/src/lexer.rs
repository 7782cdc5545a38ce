//! SQL lexer.
//!
//! Holds the cursor and the current token. Each [`Lexer::advance`] skips
//! ignorable content, picks a scan routine by lookahead and moves the cursor
//! to the end of the scanned token. Unknown characters are always an error.

use shardsql_ast::Span;
use shardsql_error::{Result, SqlParseError};

use crate::char_type::{byte_at, is_digit, is_identifier_char, is_identifier_start, is_symbol};
use crate::dialect::DialectOptions;
use crate::dictionary::Dictionary;
use crate::scanner::{Scanner, is_comment_begin, skip_comment, skip_hint, skip_whitespace};
use crate::token::{Token, TokenKind};

/// SQL lexer over a single statement text.
#[derive(Clone)]
pub struct Lexer<'a> {
    input: &'a str,
    options: &'a DialectOptions,
    offset: usize,
    current: Token<'a>,
}

/// Whether every byte offset of an input of `len` bytes fits a [`Span`].
const fn fits_span(len: usize) -> bool {
    len <= u32::MAX as usize
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned on the first token of `input`.
    ///
    /// Input longer than `u32::MAX` bytes is rejected up front.
    pub fn new(input: &'a str, options: &'a DialectOptions) -> Result<Self> {
        if !fits_span(input.len()) {
            return Err(SqlParseError::lexical(input, 0, "statement exceeds 4 GiB"));
        }
        let mut lexer = Self {
            input,
            options,
            offset: 0,
            current: Token::new(TokenKind::End, "", Span::ZERO),
        };
        lexer.advance()?;
        Ok(lexer)
    }

    /// Tokenize the whole input. The final token is always [`TokenKind::End`].
    pub fn tokenize(input: &'a str, options: &'a DialectOptions) -> Result<Vec<Token<'a>>> {
        let mut lexer = Self::new(input, options)?;
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.current();
            tokens.push(tok);
            if tok.is_end() {
                return Ok(tokens);
            }
            lexer.advance()?;
        }
    }

    #[must_use]
    pub const fn input(&self) -> &'a str {
        self.input
    }

    #[must_use]
    pub const fn options(&self) -> &'a DialectOptions {
        self.options
    }

    #[must_use]
    pub const fn dictionary(&self) -> &'a Dictionary {
        self.options.dictionary
    }

    #[must_use]
    pub const fn current(&self) -> Token<'a> {
        self.current
    }

    /// Cursor position: the end of the current token.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Move to the next token and return it.
    pub fn advance(&mut self) -> Result<Token<'a>> {
        self.skip_ignored()?;
        let (token, end) = self.scan_next()?;
        self.offset = end;
        self.current = token;
        Ok(token)
    }

    /// Skip whitespace, hints and comments until none remain.
    fn skip_ignored(&mut self) -> Result<()> {
        let src = self.input.as_bytes();
        loop {
            let before = self.offset;
            self.offset = skip_whitespace(src, self.offset);
            while self.options.recognizes_hint(src, self.offset) {
                self.offset = skip_hint(self.input, self.offset)?;
                self.offset = skip_whitespace(src, self.offset);
            }
            while is_comment_begin(src, self.options, self.offset) {
                self.offset = skip_comment(self.input, self.options, self.offset)?;
                self.offset = skip_whitespace(src, self.offset);
            }
            if self.offset == before {
                return Ok(());
            }
        }
    }

    fn scan_next(&self) -> Result<(Token<'a>, usize)> {
        let scanner = Scanner::new(self.input, self.options, self.offset);
        if self.offset >= self.input.len() {
            let end = self.input.len();
            return Ok((
                Token::new(TokenKind::End, "", Span::from_offsets(end, end)),
                end,
            ));
        }
        if self.is_variable_begin() {
            return scanner.scan_variable();
        }
        if self.is_nchars_begin() {
            return scanner.scan_nchars();
        }
        if self.is_identifier_begin() {
            return scanner.scan_identifier();
        }
        if self.is_hex_begin() {
            return scanner.scan_hex_decimal();
        }
        if self.is_number_begin() {
            return scanner.scan_number();
        }
        if is_symbol(self.at(0)) {
            return scanner.scan_symbol();
        }
        if matches!(self.at(0), b'\'' | b'"') {
            return scanner.scan_chars();
        }
        Err(SqlParseError::lexical(
            self.input,
            self.offset,
            "unrecognized character",
        ))
    }

    fn at(&self, ahead: usize) -> u8 {
        byte_at(self.input.as_bytes(), self.offset + ahead)
    }

    fn is_variable_begin(&self) -> bool {
        self.options.supports_variables && self.at(0) == b'@'
    }

    fn is_nchars_begin(&self) -> bool {
        self.options.supports_national_chars
            && matches!(self.at(0), b'N' | b'n')
            && self.at(1) == b'\''
    }

    fn is_identifier_begin(&self) -> bool {
        let b = self.at(0);
        is_identifier_start(b) || b == b'`' || (b == b'[' && self.options.bracket_identifiers)
    }

    fn is_hex_begin(&self) -> bool {
        self.at(0) == b'0' && matches!(self.at(1), b'x' | b'X')
    }

    /// A digit; `.digit` not glued to a name; `-digit` in operand position.
    fn is_number_begin(&self) -> bool {
        let b = self.at(0);
        if is_digit(b) {
            return true;
        }
        let prev = self
            .offset
            .checked_sub(1)
            .map_or(b' ', |p| byte_at(self.input.as_bytes(), p));
        match b {
            b'.' => is_digit(self.at(1)) && !is_identifier_char(prev),
            b'-' => {
                let digit_follows =
                    is_digit(self.at(1)) || (self.at(1) == b'.' && is_digit(self.at(2)));
                digit_follows && !self.current.ends_operand()
            }
            _ => false,
        }
    }
}
