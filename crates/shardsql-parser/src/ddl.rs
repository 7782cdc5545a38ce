//! Table-level DDL. Only table names are analysed; everything after them is
//! consumed token by token so placeholders and qualifiers are still seen.

use shardsql_ast::{DdlKind, DdlStatement, Span, Table};
use shardsql_error::Result;

use crate::dictionary::Keyword;
use crate::parser::{ScopeBuilder, SqlParser, log_unresolved};
use crate::token::{Symbol, TokenKind};

impl SqlParser<'_, '_> {
    pub(crate) fn parse_ddl(&mut self) -> Result<DdlStatement> {
        let begin = self.engine.current().span.start as usize;
        let verb = self.engine.current();
        self.engine.next_token()?;
        let kind = match verb.kind {
            TokenKind::Keyword(Keyword::Create) => {
                self.engine.skip_if_keyword(Keyword::Temporary)?;
                self.expect_table_target(Keyword::Create)?;
                if self.engine.skip_if_keyword(Keyword::If)? {
                    self.engine.accept_keyword(Keyword::Not)?;
                    self.engine.accept_keyword(Keyword::Exists)?;
                }
                DdlKind::CreateTable
            }
            TokenKind::Keyword(Keyword::Alter) => {
                self.engine.skip_if_keyword(Keyword::Ignore)?;
                self.expect_table_target(Keyword::Alter)?;
                DdlKind::AlterTable
            }
            TokenKind::Keyword(Keyword::Drop) => {
                self.engine.skip_if_keyword(Keyword::Temporary)?;
                self.expect_table_target(Keyword::Drop)?;
                if self.engine.skip_if_keyword(Keyword::If)? {
                    self.engine.accept_keyword(Keyword::Exists)?;
                }
                DdlKind::DropTable
            }
            TokenKind::Keyword(Keyword::Truncate) => {
                self.engine.skip_if_keyword(Keyword::Table)?;
                DdlKind::TruncateTable
            }
            _ => {
                return Err(self.syntax_error(begin, "expected DDL statement"));
            }
        };

        let mut scope = ScopeBuilder::starting_at(0);
        let mut tables = vec![self.parse_ddl_table(&mut scope)?];
        if kind == DdlKind::DropTable {
            while self.engine.skip_if_symbol(Symbol::Comma)? {
                tables.push(self.parse_ddl_table(&mut scope)?);
            }
        }
        self.skip_remainder(&mut scope)?;

        let end = self.engine.last_end();
        let span = Span::from_offsets(begin, end);
        let (scope, unresolved) = scope.finish();
        log_unresolved(&unresolved);
        Ok(DdlStatement {
            kind,
            tables,
            text: self.source_text(begin, end).to_owned(),
            scope,
            span,
        })
    }

    fn expect_table_target(&mut self, verb: Keyword) -> Result<()> {
        if self.engine.skip_if_keyword(Keyword::Table)? {
            return Ok(());
        }
        let target = self.engine.current();
        if target.is_end() {
            return Err(self.engine.unexpected("TABLE"));
        }
        Err(self.engine.error(format!(
            "unsupported {} {}",
            verb.as_str(),
            target.text.to_ascii_uppercase()
        )))
    }

    fn parse_ddl_table(&mut self, scope: &mut ScopeBuilder) -> Result<Table> {
        let (table, literal) = self.parse_table_name()?;
        self.declare_table(scope, &table, literal);
        Ok(table)
    }
}
