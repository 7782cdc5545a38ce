//! Parsing front end of a transparent sharding middleware.
//!
//! [`SqlParsingEngine`] turns one SQL statement into a [`ParsedStatement`]:
//! the statement tree plus the ordered rewrite markers ([`TableToken`]) a
//! rewriter substitutes with physical table names.
//!
//! ```
//! use std::sync::Arc;
//! use shardsql::{KnownTables, ParserConfig, DatabaseType, SqlParsingEngine};
//!
//! let engine = SqlParsingEngine::new(
//!     ParserConfig::new(DatabaseType::MySql),
//!     Arc::new(KnownTables::new(["orders"])),
//! );
//! let parsed = engine.parse("SELECT o.id FROM orders o WHERE o.user_id = ?").unwrap();
//! let sql = parsed.rewrite(|token| (token.literal == "orders").then(|| "orders_3".to_owned()));
//! assert_eq!(sql, "SELECT o.id FROM orders_3 o WHERE o.user_id = ?");
//! ```

mod metrics;

use std::sync::Arc;

pub use metrics::{ParseMetricsSnapshot, parse_metrics_snapshot, reset_parse_metrics};
pub use shardsql_ast::{self as ast, Statement, StatementScope, TableToken};
pub use shardsql_error::{Result, SqlParseError};
pub use shardsql_parser::{
    AnyTable, DatabaseType, DialectOptions, KnownTables, ParserConfig, TableMetadata, Token,
    TokenKind,
};

use shardsql_ast::visit::collect_table_tokens;
use shardsql_parser::SqlParser;

/// Parses statements for one dialect against one table catalogue.
///
/// Cheap to clone and safe to share; every call to [`Self::parse`] uses its
/// own lexer and parser.
#[derive(Clone)]
pub struct SqlParsingEngine {
    config: ParserConfig,
    metadata: Arc<dyn TableMetadata>,
}

impl std::fmt::Debug for SqlParsingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlParsingEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SqlParsingEngine {
    #[must_use]
    pub fn new(config: ParserConfig, metadata: Arc<dyn TableMetadata>) -> Self {
        Self { config, metadata }
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse one statement.
    pub fn parse(&self, sql: &str) -> Result<ParsedStatement> {
        let parsed = SqlParser::new(sql, &self.config, self.metadata.as_ref()).and_then(SqlParser::parse);
        match parsed {
            Ok(statement) => {
                let table_tokens = collect_table_tokens(&statement);
                metrics::record_success(table_tokens.len());
                Ok(ParsedStatement {
                    sql: sql.to_owned(),
                    statement,
                    table_tokens,
                })
            }
            Err(err) => {
                metrics::record_failure(&err);
                tracing::warn!(
                    dialect = %self.config.dialect,
                    error_kind = err.kind_name(),
                    offset = err.offset(),
                    detail = err.detail(),
                    "statement rejected"
                );
                Err(err)
            }
        }
    }

    /// Tokenize `sql` with this engine's dialect.
    pub fn tokenize<'a>(&self, sql: &'a str) -> Result<Vec<Token<'a>>> {
        shardsql_parser::tokenize(sql, self.config.dialect)
    }
}

/// A parsed statement with the rewrite markers of every nested statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    pub sql: String,
    pub statement: Statement,
    /// Sorted by `start`, non-overlapping.
    pub table_tokens: Vec<TableToken>,
}

impl ParsedStatement {
    /// Number of `?` placeholders, nested statements included.
    #[must_use]
    pub fn parameters_count(&self) -> u32 {
        self.statement.parameters_count()
    }

    /// Logical tables declared anywhere in the statement, deduplicated.
    #[must_use]
    pub fn logical_tables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.table_tokens.iter().map(|t| t.table.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Replace marker spans with whatever `substitute` returns for them.
    ///
    /// Markers for which `substitute` returns `None` are left alone, as is
    /// every byte outside a marker.
    pub fn rewrite<F>(&self, mut substitute: F) -> String
    where
        F: FnMut(&TableToken) -> Option<String>,
    {
        let mut out = self.sql.clone();
        for token in self.table_tokens.iter().rev() {
            let Some(replacement) = substitute(token) else {
                continue;
            };
            let span = token.span();
            let (start, end) = (span.start as usize, span.end as usize);
            if out.get(start..end) == Some(token.literal.as_str()) {
                out.replace_range(start..end, &replacement);
            }
        }
        out
    }
}
