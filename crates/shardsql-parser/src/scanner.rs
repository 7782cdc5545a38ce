//! Offset-parameterised scan routines.
//!
//! A [`Scanner`] is built for a single scan call from the input, the dialect
//! options and a start offset. Each routine returns exactly one token and the
//! offset immediately after it; no state survives the call.

use memchr::{memchr, memchr2, memmem};
use shardsql_ast::Span;
use shardsql_error::{Result, SqlParseError};

use crate::char_type::{byte_at, is_digit, is_hex_digit, is_identifier_char, is_whitespace};
use crate::dialect::DialectOptions;
use crate::dictionary::Keyword;
use crate::token::{MAX_SYMBOL_LEN, Symbol, Token, TokenKind};

#[derive(Clone, Copy)]
pub struct Scanner<'a> {
    input: &'a str,
    src: &'a [u8],
    options: &'a DialectOptions,
    offset: usize,
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub fn new(input: &'a str, options: &'a DialectOptions, offset: usize) -> Self {
        Self {
            input,
            src: input.as_bytes(),
            options,
            offset,
        }
    }

    fn at(&self, pos: usize) -> u8 {
        byte_at(self.src, pos)
    }

    fn token(&self, kind: TokenKind, end: usize) -> (Token<'a>, usize) {
        let text = &self.input[self.offset..end];
        (
            Token::new(kind, text, Span::from_offsets(self.offset, end)),
            end,
        )
    }

    fn lexical(&self, offset: usize, detail: &str) -> SqlParseError {
        SqlParseError::lexical(self.input, offset, detail)
    }

    /// `@name` or `@@name`.
    pub fn scan_variable(&self) -> Result<(Token<'a>, usize)> {
        let mut pos = self.offset + 1;
        if self.at(pos) == b'@' {
            pos += 1;
        }
        let name_start = pos;
        while is_identifier_char(self.at(pos)) || self.at(pos) == b'.' {
            pos += 1;
        }
        if pos == name_start {
            return Err(self.lexical(self.offset, "malformed variable"));
        }
        Ok(self.token(TokenKind::Variable, pos))
    }

    /// `N'...'`: the token span starts at the `N`.
    pub fn scan_nchars(&self) -> Result<(Token<'a>, usize)> {
        let end = self.quoted_end(self.offset + 1, "unterminated string literal")?;
        Ok(self.token(TokenKind::CharsLiteral, end))
    }

    /// Unquoted, back-quoted or bracketed identifier, or a keyword.
    pub fn scan_identifier(&self) -> Result<(Token<'a>, usize)> {
        match self.at(self.offset) {
            b'`' => {
                let end = self.quoted_end(self.offset, "unterminated quoted identifier")?;
                Ok(self.token(TokenKind::Identifier, end))
            }
            b'[' if self.options.bracket_identifiers => {
                let end = self.bracketed_end()?;
                Ok(self.token(TokenKind::Identifier, end))
            }
            _ => {
                let mut pos = self.offset;
                while is_identifier_char(self.at(pos)) {
                    pos += 1;
                }
                let word = &self.input[self.offset..pos];
                let kind = match self.options.dictionary.lookup(word) {
                    Some(Keyword::Group | Keyword::Order) if !self.followed_by_by(pos) => {
                        TokenKind::Identifier
                    }
                    Some(kw) => TokenKind::Keyword(kw),
                    None => TokenKind::Identifier,
                };
                Ok(self.token(kind, pos))
            }
        }
    }

    /// `GROUP` and `ORDER` are keywords only in front of `BY`.
    fn followed_by_by(&self, mut pos: usize) -> bool {
        while is_whitespace(self.at(pos)) {
            pos += 1;
        }
        self.at(pos).eq_ignore_ascii_case(&b'b')
            && self.at(pos + 1).eq_ignore_ascii_case(&b'y')
            && !is_identifier_char(self.at(pos + 2))
    }

    /// `0x1F`, `0x-1F`.
    pub fn scan_hex_decimal(&self) -> Result<(Token<'a>, usize)> {
        let mut pos = self.offset + 2;
        if self.at(pos) == b'-' {
            pos += 1;
        }
        let digits_start = pos;
        while is_hex_digit(self.at(pos)) {
            pos += 1;
        }
        if pos == digits_start {
            return Err(self.lexical(self.offset, "malformed hex literal"));
        }
        let (token, end) = self.token(TokenKind::HexLiteral, pos);
        if token.int_value().is_none() {
            return Err(self.lexical(self.offset, "hex literal out of range"));
        }
        Ok((token, end))
    }

    /// `[-]digits[.digits][e[+-]digits][f|F|d|D]`.
    pub fn scan_number(&self) -> Result<(Token<'a>, usize)> {
        let mut pos = self.offset;
        let mut is_float = false;
        if self.at(pos) == b'-' {
            pos += 1;
        }
        while is_digit(self.at(pos)) {
            pos += 1;
        }
        if self.at(pos) == b'.' && self.at(pos + 1) != b'.' {
            is_float = true;
            pos += 1;
            while is_digit(self.at(pos)) {
                pos += 1;
            }
        }
        if matches!(self.at(pos), b'e' | b'E') {
            let sign = usize::from(matches!(self.at(pos + 1), b'+' | b'-'));
            if is_digit(self.at(pos + 1 + sign)) {
                is_float = true;
                pos += 1 + sign;
                while is_digit(self.at(pos)) {
                    pos += 1;
                }
            }
        }
        if matches!(self.at(pos), b'f' | b'F' | b'd' | b'D') && !is_identifier_char(self.at(pos + 1))
        {
            is_float = true;
            pos += 1;
        }
        if is_float {
            return Ok(self.token(TokenKind::FloatLiteral, pos));
        }
        let (token, end) = self.token(TokenKind::IntLiteral, pos);
        if token.int_value().is_none() {
            return Err(self.lexical(self.offset, "integer literal out of range"));
        }
        Ok((token, end))
    }

    /// `'...'` or `"..."`.
    pub fn scan_chars(&self) -> Result<(Token<'a>, usize)> {
        let end = self.quoted_end(self.offset, "unterminated string literal")?;
        Ok(self.token(TokenKind::CharsLiteral, end))
    }

    /// Longest operator match.
    pub fn scan_symbol(&self) -> Result<(Token<'a>, usize)> {
        let available = self.src.len().saturating_sub(self.offset).min(MAX_SYMBOL_LEN);
        for len in (1..=available).rev() {
            let Some(text) = self.input.get(self.offset..self.offset + len) else {
                continue;
            };
            if let Some(sym) = Symbol::from_text(text) {
                return Ok(self.token(TokenKind::Symbol(sym), self.offset + len));
            }
        }
        Err(self.lexical(self.offset, "unrecognized character"))
    }

    /// End of a literal opened by the quote byte at `open`.
    ///
    /// A doubled terminator is an escaped terminator; a backslash escapes the
    /// next byte when the dialect enables backslash escapes (never inside
    /// back-quoted identifiers).
    fn quoted_end(&self, open: usize, unterminated: &str) -> Result<usize> {
        let quote = self.at(open);
        let backslash = self.options.backslash_escapes && quote != b'`';
        let mut pos = open + 1;
        loop {
            let rest = self.src.get(pos..).unwrap_or_default();
            let found = if backslash {
                memchr2(quote, b'\\', rest)
            } else {
                memchr(quote, rest)
            };
            let Some(idx) = found else {
                return Err(self.lexical(open, unterminated));
            };
            let hit = pos + idx;
            if self.src[hit] == b'\\' {
                pos = hit + 2;
                if pos > self.src.len() {
                    return Err(self.lexical(open, unterminated));
                }
            } else if self.at(hit + 1) == quote {
                pos = hit + 2;
            } else {
                return Ok(hit + 1);
            }
        }
    }

    fn bracketed_end(&self) -> Result<usize> {
        let mut pos = self.offset + 1;
        loop {
            let rest = self.src.get(pos..).unwrap_or_default();
            let Some(idx) = memchr(b']', rest) else {
                return Err(self.lexical(self.offset, "unterminated quoted identifier"));
            };
            let hit = pos + idx;
            if self.at(hit + 1) == b']' {
                pos = hit + 2;
            } else {
                return Ok(hit + 1);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Ignorable content
// ---------------------------------------------------------------------------

/// Offset of the first non-whitespace byte at or after `offset`.
#[must_use]
pub fn skip_whitespace(src: &[u8], mut offset: usize) -> usize {
    while offset < src.len() && is_whitespace(src[offset]) {
        offset += 1;
    }
    offset
}

/// Whether a comment starts at `offset`.
#[must_use]
pub fn is_comment_begin(src: &[u8], options: &DialectOptions, offset: usize) -> bool {
    let (a, b) = (byte_at(src, offset), byte_at(src, offset + 1));
    matches!((a, b), (b'-', b'-') | (b'/', b'/') | (b'/', b'*'))
        || (a == b'#' && options.hash_comments)
}

/// Skip one comment starting at `offset`, returning the offset after it.
pub fn skip_comment(input: &str, options: &DialectOptions, offset: usize) -> Result<usize> {
    let src = input.as_bytes();
    if byte_at(src, offset) == b'/' && byte_at(src, offset + 1) == b'*' {
        return skip_block(input, offset, "unterminated block comment");
    }
    debug_assert!(is_comment_begin(src, options, offset));
    let rest = src.get(offset..).unwrap_or_default();
    Ok(memchr(b'\n', rest).map_or(src.len(), |idx| offset + idx + 1))
}

/// Skip a dialect hint (`/*! ... */`) starting at `offset`.
pub fn skip_hint(input: &str, offset: usize) -> Result<usize> {
    skip_block(input, offset, "unterminated hint")
}

fn skip_block(input: &str, offset: usize, unterminated: &str) -> Result<usize> {
    let src = input.as_bytes();
    let body = src.get(offset + 2..).unwrap_or_default();
    memmem::find(body, b"*/")
        .map(|idx| offset + 2 + idx + 2)
        .ok_or_else(|| SqlParseError::lexical(input, offset, unterminated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DatabaseType;

    fn std_opts() -> &'static DialectOptions {
        DatabaseType::Standard.options()
    }

    fn scan<'a>(
        input: &'a str,
        f: impl Fn(&Scanner<'a>) -> Result<(Token<'a>, usize)>,
    ) -> (Token<'a>, usize) {
        f(&Scanner::new(input, std_opts(), 0)).unwrap()
    }

    #[test]
    fn identifier_and_keyword() {
        let (tok, end) = scan("user_id = 1", Scanner::scan_identifier);
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.text, "user_id");
        assert_eq!(end, 7);
        let (tok, _) = scan("select", Scanner::scan_identifier);
        assert_eq!(tok.kind, TokenKind::Keyword(Keyword::Select));
    }

    #[test]
    fn identifier_with_dollar_and_hash() {
        let (tok, _) = scan("a$b#c d", Scanner::scan_identifier);
        assert_eq!(tok.text, "a$b#c");
    }

    #[test]
    fn group_without_by_is_identifier() {
        let (tok, _) = scan("group , x", Scanner::scan_identifier);
        assert_eq!(tok.kind, TokenKind::Identifier);
        let (tok, _) = scan("GROUP  BY x", Scanner::scan_identifier);
        assert_eq!(tok.kind, TokenKind::Keyword(Keyword::Group));
        let (tok, _) = scan("order byte", Scanner::scan_identifier);
        assert_eq!(tok.kind, TokenKind::Identifier);
    }

    #[test]
    fn backquoted_identifier() {
        let (tok, end) = scan("`order` x", Scanner::scan_identifier);
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.text, "`order`");
        assert_eq!(end, 7);
        let err = Scanner::new("`abc", std_opts(), 0)
            .scan_identifier()
            .unwrap_err();
        assert!(err.is_lexical());
    }

    #[test]
    fn bracketed_identifier_only_for_sqlserver() {
        let opts = DatabaseType::SqlServer.options();
        let (tok, end) = Scanner::new("[my]]t] x", opts, 0).scan_identifier().unwrap();
        assert_eq!(tok.text, "[my]]t]");
        assert_eq!(end, 7);
        assert_eq!(tok.identifier_name(), "my]t");
    }

    #[test]
    fn numbers() {
        let (tok, _) = scan("123", Scanner::scan_number);
        assert_eq!((tok.kind, tok.int_value()), (TokenKind::IntLiteral, Some(123)));
        let (tok, _) = scan("12.5", Scanner::scan_number);
        assert_eq!((tok.kind, tok.float_value()), (TokenKind::FloatLiteral, Some(12.5)));
        let (tok, _) = scan("-5", Scanner::scan_number);
        assert_eq!((tok.kind, tok.int_value()), (TokenKind::IntLiteral, Some(-5)));
        let (tok, _) = scan(".5e-2", Scanner::scan_number);
        assert_eq!(tok.kind, TokenKind::FloatLiteral);
        assert_eq!(tok.text, ".5e-2");
        let (tok, _) = scan("3d", Scanner::scan_number);
        assert_eq!((tok.kind, tok.text), (TokenKind::FloatLiteral, "3d"));
        let (tok, _) = scan("1e", Scanner::scan_number);
        assert_eq!((tok.kind, tok.text), (TokenKind::IntLiteral, "1"));
    }

    #[test]
    fn integer_overflow_is_lexical() {
        let err = Scanner::new("99999999999999999999", std_opts(), 0)
            .scan_number()
            .unwrap_err();
        assert!(err.is_lexical());
        assert!(err.detail().contains("out of range"));
    }

    #[test]
    fn hex() {
        let (tok, end) = scan("0x1F+", Scanner::scan_hex_decimal);
        assert_eq!((tok.kind, tok.int_value(), end), (TokenKind::HexLiteral, Some(31), 4));
        assert!(Scanner::new("0xg", std_opts(), 0).scan_hex_decimal().is_err());
    }

    #[test]
    fn chars_with_doubled_quote() {
        let (tok, end) = scan("'a''b' x", Scanner::scan_chars);
        assert_eq!(tok.text, "'a''b'");
        assert_eq!(end, 6);
        assert_eq!(tok.chars_value(false).as_deref(), Some("a'b"));
    }

    #[test]
    fn chars_backslash_in_mysql() {
        let opts = DatabaseType::MySql.options();
        let (tok, end) = Scanner::new(r"'it\'s' x", opts, 0).scan_chars().unwrap();
        assert_eq!(end, 7);
        assert_eq!(tok.chars_value(true).as_deref(), Some("it's"));
    }

    #[test]
    fn unterminated_chars() {
        let err = Scanner::new("'abc", std_opts(), 0).scan_chars().unwrap_err();
        assert!(err.is_lexical());
        assert_eq!(err.offset(), 0);
    }

    #[test]
    fn national_chars_span_starts_at_n() {
        let opts = DatabaseType::SqlServer.options();
        let (tok, end) = Scanner::new("N'x' ", opts, 0).scan_nchars().unwrap();
        assert_eq!((tok.text, end), ("N'x'", 4));
    }

    #[test]
    fn symbol_longest_match() {
        let (tok, _) = scan("<=> 1", Scanner::scan_symbol);
        assert_eq!(tok.kind, TokenKind::Symbol(Symbol::LtEqGt));
        let (tok, _) = scan("<= 1", Scanner::scan_symbol);
        assert_eq!(tok.kind, TokenKind::Symbol(Symbol::LtEq));
        let (tok, _) = scan("<1", Scanner::scan_symbol);
        assert_eq!(tok.kind, TokenKind::Symbol(Symbol::Lt));
        let (tok, _) = scan("||", Scanner::scan_symbol);
        assert_eq!(tok.kind, TokenKind::Symbol(Symbol::BarBar));
    }

    #[test]
    fn variables() {
        let opts = DatabaseType::MySql.options();
        let (tok, _) = Scanner::new("@@session.x = 1", opts, 0).scan_variable().unwrap();
        assert_eq!(tok.text, "@@session.x");
        assert!(Scanner::new("@ ", opts, 0).scan_variable().is_err());
    }

    #[test]
    fn comments() {
        let src = "-- hi\nSELECT";
        assert!(is_comment_begin(src.as_bytes(), std_opts(), 0));
        assert_eq!(skip_comment(src, std_opts(), 0).unwrap(), 6);
        assert_eq!(skip_comment("/* a */x", std_opts(), 0).unwrap(), 7);
        assert_eq!(skip_comment("// tail", std_opts(), 0).unwrap(), 7);
        assert!(skip_comment("/* open", std_opts(), 0).unwrap_err().is_lexical());
        assert!(!is_comment_begin(b"# x", std_opts(), 0));
        assert!(is_comment_begin(b"# x", DatabaseType::MySql.options(), 0));
    }

    #[test]
    fn hints() {
        assert_eq!(skip_hint("/*!40001 SQL_NO_CACHE */ x", 0).unwrap(), 24);
        assert!(skip_hint("/*! x", 0).is_err());
    }

    #[test]
    fn whitespace() {
        assert_eq!(skip_whitespace(b"  \t\nx", 0), 4);
        assert_eq!(skip_whitespace(b"   ", 0), 3);
    }
}
