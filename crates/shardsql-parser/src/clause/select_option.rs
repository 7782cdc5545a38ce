//! Leading select modifiers and trailing statement options.

use shardsql_ast::LockMode;
use shardsql_error::Result;

use crate::dialect::DatabaseType;
use crate::dictionary::Keyword;
use crate::parser::SqlParser;
use crate::token::{Symbol, TokenKind};

const MYSQL_SELECT_OPTIONS: &[TokenKind] = &[
    TokenKind::Keyword(Keyword::HighPriority),
    TokenKind::Keyword(Keyword::StraightJoin),
    TokenKind::Keyword(Keyword::SqlSmallResult),
    TokenKind::Keyword(Keyword::SqlBigResult),
    TokenKind::Keyword(Keyword::SqlBufferResult),
    TokenKind::Keyword(Keyword::SqlCache),
    TokenKind::Keyword(Keyword::SqlNoCache),
    TokenKind::Keyword(Keyword::SqlCalcFoundRows),
];

impl SqlParser<'_, '_> {
    /// `ALL | DISTINCT | DISTINCTROW`; returns whether duplicates are removed.
    pub(crate) fn parse_distinct(&mut self) -> Result<bool> {
        match self.engine.current().kind {
            TokenKind::Keyword(Keyword::All) => {
                self.engine.next_token()?;
                Ok(false)
            }
            TokenKind::Keyword(Keyword::Distinct | Keyword::DistinctRow) => {
                self.engine.next_token()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    pub(crate) fn skip_select_options(&mut self) -> Result<()> {
        if self.dialect == DatabaseType::MySql {
            self.engine.skip_all(MYSQL_SELECT_OPTIONS)?;
        }
        Ok(())
    }

    /// `FOR UPDATE`, `FOR SHARE`, `LOCK IN SHARE MODE` and SQL Server
    /// `OPTION (...)`, the latter returned verbatim.
    pub(crate) fn parse_trailing_options(&mut self) -> Result<(Option<LockMode>, Option<String>)> {
        let mut lock = None;
        let mut query_option = None;
        loop {
            let tok = self.engine.current();
            match tok.kind {
                TokenKind::Keyword(Keyword::For) => {
                    self.engine.next_token()?;
                    lock = Some(match self.engine.current().kind {
                        TokenKind::Keyword(Keyword::Update) => LockMode::ForUpdate,
                        TokenKind::Keyword(Keyword::Share) => LockMode::ShareMode,
                        _ => return Err(self.engine.unexpected("UPDATE or SHARE")),
                    });
                    self.engine.next_token()?;
                    self.skip_lock_wait_option()?;
                }
                TokenKind::Keyword(Keyword::Lock) => {
                    self.engine.next_token()?;
                    self.engine.accept_keyword(Keyword::In)?;
                    self.engine.accept_keyword(Keyword::Share)?;
                    self.engine.accept_keyword(Keyword::Mode)?;
                    lock = Some(LockMode::ShareMode);
                }
                TokenKind::Keyword(Keyword::Option)
                    if self.engine.peek()?.is_symbol(Symbol::LeftParen) =>
                {
                    let begin = tok.span.start as usize;
                    self.engine.next_token()?;
                    self.engine.skip_parentheses()?;
                    query_option = Some(self.source_text(begin, self.engine.last_end()).to_owned());
                }
                _ => return Ok((lock, query_option)),
            }
        }
    }

    /// `NOWAIT` or `SKIP LOCKED` after a locking clause.
    fn skip_lock_wait_option(&mut self) -> Result<()> {
        let tok = self.engine.current();
        if tok.kind != TokenKind::Identifier {
            return Ok(());
        }
        if tok.text.eq_ignore_ascii_case("nowait") {
            self.engine.next_token()?;
        } else if tok.text.eq_ignore_ascii_case("skip") {
            let next = self.engine.peek()?;
            if next.kind == TokenKind::Identifier && next.text.eq_ignore_ascii_case("locked") {
                self.engine.next_token()?;
                self.engine.next_token()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::AnyTable;
    use crate::parser::ParserConfig;

    fn parser(sql: &str, dialect: DatabaseType) -> SqlParser<'_, 'static> {
        SqlParser::new(sql, &ParserConfig::new(dialect), &AnyTable).unwrap()
    }

    #[test]
    fn distinct_modifiers() {
        assert!(parser("DISTINCTROW a", DatabaseType::MySql).parse_distinct().unwrap());
        assert!(parser("DISTINCT a", DatabaseType::Standard).parse_distinct().unwrap());
        assert!(!parser("ALL a", DatabaseType::Standard).parse_distinct().unwrap());
        let mut p = parser("a", DatabaseType::Standard);
        assert!(!p.parse_distinct().unwrap());
        assert_eq!(p.engine.current().text, "a");
    }

    #[test]
    fn mysql_options_are_skipped() {
        let mut p = parser("HIGH_PRIORITY SQL_NO_CACHE SQL_CALC_FOUND_ROWS a", DatabaseType::MySql);
        p.skip_select_options().unwrap();
        assert_eq!(p.engine.current().text, "a");
    }

    #[test]
    fn locking_clauses() {
        let mut p = parser("FOR UPDATE NOWAIT", DatabaseType::MySql);
        assert_eq!(p.parse_trailing_options().unwrap(), (Some(LockMode::ForUpdate), None));
        assert!(p.engine.is_end());
        let mut p = parser("LOCK IN SHARE MODE", DatabaseType::MySql);
        assert_eq!(p.parse_trailing_options().unwrap().0, Some(LockMode::ShareMode));
        let mut p = parser("FOR SHARE SKIP LOCKED", DatabaseType::MySql);
        assert_eq!(p.parse_trailing_options().unwrap().0, Some(LockMode::ShareMode));
        assert!(p.engine.is_end());
    }

    #[test]
    fn sqlserver_query_option() {
        let mut p = parser("OPTION (MAXDOP 1, RECOMPILE)", DatabaseType::SqlServer);
        assert_eq!(
            p.parse_trailing_options().unwrap(),
            (None, Some("OPTION (MAXDOP 1, RECOMPILE)".to_owned()))
        );
        assert!(p.engine.is_end());
    }
}
