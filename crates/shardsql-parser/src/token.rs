//! Token types.
//!
//! A token borrows its exact source text (quotes, prefixes and signs
//! included) and carries the byte span it was read from. Literal values are
//! decoded on demand.

use std::borrow::Cow;

use shardsql_ast::Span;

use crate::dictionary::Keyword;

/// A single token produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// The source slice `input[span.start..span.end]`.
    pub text: &'a str,
    pub span: Span,
}

/// Token discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Keyword(Keyword),
    /// Unquoted, back-quoted or bracketed name.
    Identifier,
    /// Decimal integer, optionally negative: `42`, `-5`.
    IntLiteral,
    /// Decimal with fraction, exponent or `f|d` suffix: `12.5`, `1e3`.
    FloatLiteral,
    /// `0x1F`.
    HexLiteral,
    /// `'text'`, `"text"` or `N'text'`.
    CharsLiteral,
    Symbol(Symbol),
    /// `@name` or `@@name`.
    Variable,
    End,
}

macro_rules! symbols {
    ($($variant:ident => $text:literal),* $(,)?) => {
        /// Punctuation and operator identity.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Symbol {
            $($variant),*
        }

        impl Symbol {
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),*
                }
            }

            /// Exact-match lookup of an operator spelling.
            #[must_use]
            pub fn from_text(text: &str) -> Option<Self> {
                match text {
                    $($text => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

symbols! {
    LeftParen => "(",
    RightParen => ")",
    LeftBracket => "[",
    RightBracket => "]",
    LeftBrace => "{",
    RightBrace => "}",
    Plus => "+",
    Minus => "-",
    Star => "*",
    Slash => "/",
    Percent => "%",
    Caret => "^",
    Eq => "=",
    Gt => ">",
    Lt => "<",
    Tilde => "~",
    Bang => "!",
    Question => "?",
    Amp => "&",
    Bar => "|",
    Dot => ".",
    Colon => ":",
    Hash => "#",
    Comma => ",",
    Semicolon => ";",
    At => "@",
    DotDot => "..",
    DoubleColon => "::",
    ColonEq => ":=",
    LtEq => "<=",
    GtEq => ">=",
    LtEqGt => "<=>",
    LtGt => "<>",
    BangEq => "!=",
    BangGt => "!>",
    BangLt => "!<",
    AmpAmp => "&&",
    BarBar => "||",
    ShiftLeft => "<<",
    ShiftRight => ">>",
    Arrow => "->",
}

/// Longest operator spelling, in bytes.
pub const MAX_SYMBOL_LEN: usize = 3;

impl Symbol {
    /// Binary operators that continue a composite expression.
    #[must_use]
    pub const fn is_composite_operator(self) -> bool {
        matches!(
            self,
            Self::Plus
                | Self::Minus
                | Self::Star
                | Self::Slash
                | Self::Percent
                | Self::Amp
                | Self::Bar
                | Self::BarBar
                | Self::Caret
                | Self::ShiftLeft
                | Self::ShiftRight
                | Self::DoubleColon
                | Self::Arrow
                | Self::Dot
                | Self::LeftParen
        )
    }

    /// Comparison operators recognised by the condition parser.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::Gt
                | Self::Lt
                | Self::LtEq
                | Self::GtEq
                | Self::LtEqGt
                | Self::LtGt
                | Self::BangEq
                | Self::BangGt
                | Self::BangLt
        )
    }
}

impl<'a> Token<'a> {
    #[must_use]
    pub const fn new(kind: TokenKind, text: &'a str, span: Span) -> Self {
        Self { kind, text, span }
    }

    #[must_use]
    pub fn is_keyword(&self, kw: Keyword) -> bool {
        self.kind == TokenKind::Keyword(kw)
    }

    #[must_use]
    pub fn is_symbol(&self, sym: Symbol) -> bool {
        self.kind == TokenKind::Symbol(sym)
    }

    #[must_use]
    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::End
    }

    /// Whether this token can end an operand, so a following `-` is binary.
    #[must_use]
    pub fn ends_operand(&self) -> bool {
        match self.kind {
            TokenKind::Identifier
            | TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::HexLiteral
            | TokenKind::CharsLiteral
            | TokenKind::Variable => true,
            TokenKind::Symbol(sym) => matches!(
                sym,
                Symbol::RightParen | Symbol::RightBracket | Symbol::Question
            ),
            TokenKind::Keyword(kw) => {
                kw.is_name_like()
                    || matches!(kw, Keyword::Null | Keyword::True | Keyword::False | Keyword::End)
            }
            TokenKind::End => false,
        }
    }

    /// `REGEXP` or `RLIKE`, which lex as plain identifiers.
    #[must_use]
    pub fn is_regexp_operator(&self) -> bool {
        self.kind == TokenKind::Identifier
            && (self.text.eq_ignore_ascii_case("REGEXP") || self.text.eq_ignore_ascii_case("RLIKE"))
    }

    /// Whether this token may name a table, column or alias.
    #[must_use]
    pub fn is_name(&self) -> bool {
        match self.kind {
            TokenKind::Identifier => true,
            TokenKind::Keyword(kw) => kw.is_name_like(),
            _ => false,
        }
    }

    /// Name with surrounding back-quotes or brackets removed.
    #[must_use]
    pub fn identifier_name(&self) -> Cow<'a, str> {
        unquote_identifier(self.text)
    }

    /// Decoded value of an integer literal.
    #[must_use]
    pub fn int_value(&self) -> Option<i64> {
        match self.kind {
            TokenKind::IntLiteral => self.text.parse().ok(),
            TokenKind::HexLiteral => decode_hex(self.text),
            _ => None,
        }
    }

    /// Decoded value of a float literal (binary-float suffix dropped).
    #[must_use]
    pub fn float_value(&self) -> Option<f64> {
        if self.kind != TokenKind::FloatLiteral {
            return None;
        }
        self.text
            .trim_end_matches(['f', 'F', 'd', 'D'])
            .parse()
            .ok()
    }

    /// Content of a character literal with quotes removed and escapes decoded.
    #[must_use]
    /// Whether this is an `N'...'` literal.
    #[must_use]
    pub fn is_national_chars(&self) -> bool {
        self.kind == TokenKind::CharsLiteral && matches!(self.text.as_bytes().first(), Some(b'N' | b'n'))
    }

    pub fn chars_value(&self, backslash_escapes: bool) -> Option<String> {
        (self.kind == TokenKind::CharsLiteral).then(|| decode_chars(self.text, backslash_escapes))
    }
}

/// Remove identifier quoting: `` `a``b` `` → ``a`b``, `[a]]b]` → `a]b`.
#[must_use]
pub fn unquote_identifier(text: &str) -> Cow<'_, str> {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 {
        let (open, close) = (bytes[0], bytes[bytes.len() - 1]);
        let inner = &text[1..text.len() - 1];
        if open == b'`' && close == b'`' {
            return if inner.contains("``") {
                Cow::Owned(inner.replace("``", "`"))
            } else {
                Cow::Borrowed(inner)
            };
        }
        if open == b'[' && close == b']' {
            return if inner.contains("]]") {
                Cow::Owned(inner.replace("]]", "]"))
            } else {
                Cow::Borrowed(inner)
            };
        }
    }
    Cow::Borrowed(text)
}

/// Decode `0x1F` / `0x-1F`.
fn decode_hex(text: &str) -> Option<i64> {
    let digits = text.get(2..)?;
    match digits.strip_prefix('-') {
        Some(rest) => i64::from_str_radix(rest, 16).ok().map(|v| -v),
        None => i64::from_str_radix(digits, 16).ok(),
    }
}

/// Decode a quoted character literal, including any `N` prefix.
fn decode_chars(text: &str, backslash_escapes: bool) -> String {
    let body = text.strip_prefix(['N', 'n']).unwrap_or(text);
    let Some(quote) = body.chars().next() else {
        return String::new();
    };
    let inner = body
        .get(1..body.len().saturating_sub(1).max(1))
        .unwrap_or_default();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == quote && chars.peek() == Some(&quote) {
            chars.next();
            out.push(quote);
        } else if c == '\\' && backslash_escapes {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('0') => out.push('\0'),
                Some('b') => out.push('\u{8}'),
                Some('Z') => out.push('\u{1A}'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
