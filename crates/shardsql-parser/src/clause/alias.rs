//! Alias clause parser: `[AS] name`.

use shardsql_error::Result;

use crate::dictionary::Keyword;
use crate::parser::SqlParser;
use crate::token::{Token, TokenKind};

/// Keywords accepted as a bare alias.
const ALIAS_KEYWORDS: &[Keyword] = &[
    Keyword::User,
    Keyword::End,
    Keyword::Case,
    Keyword::Key,
    Keyword::Interval,
    Keyword::Constraint,
];

impl SqlParser<'_, '_> {
    /// Parse an optional alias and return its decoded text.
    ///
    /// `AS` directly followed by a symbol yields no alias and leaves the
    /// symbol in place.
    pub(crate) fn parse_alias(&mut self) -> Result<Option<String>> {
        if self.engine.skip_if_keyword(Keyword::As)? {
            let tok = self.engine.current();
            return match tok.kind {
                TokenKind::Symbol(_) => Ok(None),
                TokenKind::End => Err(self.engine.unexpected("alias")),
                _ => {
                    self.engine.next_token()?;
                    Ok(Some(self.decode_alias(&tok)))
                }
            };
        }
        let tok = self.engine.current();
        let bare = match tok.kind {
            TokenKind::Identifier | TokenKind::CharsLiteral => true,
            TokenKind::Keyword(kw) => ALIAS_KEYWORDS.contains(&kw),
            _ => false,
        };
        if !bare {
            return Ok(None);
        }
        self.engine.next_token()?;
        Ok(Some(self.decode_alias(&tok)))
    }

    fn decode_alias(&self, tok: &Token<'_>) -> String {
        match tok.kind {
            TokenKind::CharsLiteral => tok
                .chars_value(self.engine.options().backslash_escapes)
                .unwrap_or_default(),
            _ => tok.identifier_name().into_owned(),
        }
    }
}
