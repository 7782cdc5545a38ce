// Dialect-aware SQL lexer and recursive-descent clause parsers.
//
// The parser decomposes only what a sharding rewriter needs (table names,
// `owner.column` references, placeholders, pagination) and keeps every other
// expression as a verbatim span of the input.

pub mod char_type;
pub mod dialect;
pub mod dictionary;
pub mod engine;
pub mod lexer;
pub mod metadata;
pub mod parser;
pub mod scanner;
pub mod token;

mod clause;
mod ddl;
mod dml;
mod select;

pub use dialect::{DatabaseType, DialectOptions};
pub use dictionary::{Dictionary, Keyword};
pub use engine::LexerEngine;
pub use lexer::Lexer;
pub use metadata::{AnyTable, KnownTables, TableMetadata};
pub use parser::{ParserConfig, SqlParser};
pub use token::{Symbol, Token, TokenKind};

use shardsql_ast::Statement;
use shardsql_error::Result;

/// Tokenize `sql` for `dialect`. The last token is always [`TokenKind::End`].
pub fn tokenize(sql: &str, dialect: DatabaseType) -> Result<Vec<Token<'_>>> {
    Lexer::tokenize(sql, dialect.options())
}

/// Parse a single statement with a fresh parser.
pub fn parse_statement(sql: &str, config: &ParserConfig, metadata: &dyn TableMetadata) -> Result<Statement> {
    SqlParser::new(sql, config, metadata)?.parse()
}
