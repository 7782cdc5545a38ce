//! Process-wide parse counters.

use std::sync::atomic::{AtomicU64, Ordering};

use shardsql_error::SqlParseError;

static SHARDSQL_STATEMENTS_PARSED_TOTAL: AtomicU64 = AtomicU64::new(0);
static SHARDSQL_LEXICAL_ERRORS_TOTAL: AtomicU64 = AtomicU64::new(0);
static SHARDSQL_SYNTAX_ERRORS_TOTAL: AtomicU64 = AtomicU64::new(0);
static SHARDSQL_TABLE_TOKENS_EMITTED_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Point-in-time snapshot of parse metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseMetricsSnapshot {
    pub statements_parsed: u64,
    pub lexical_errors: u64,
    pub syntax_errors: u64,
    pub table_tokens_emitted: u64,
}

/// Take a point-in-time snapshot of parse metrics.
#[must_use]
pub fn parse_metrics_snapshot() -> ParseMetricsSnapshot {
    ParseMetricsSnapshot {
        statements_parsed: SHARDSQL_STATEMENTS_PARSED_TOTAL.load(Ordering::Relaxed),
        lexical_errors: SHARDSQL_LEXICAL_ERRORS_TOTAL.load(Ordering::Relaxed),
        syntax_errors: SHARDSQL_SYNTAX_ERRORS_TOTAL.load(Ordering::Relaxed),
        table_tokens_emitted: SHARDSQL_TABLE_TOKENS_EMITTED_TOTAL.load(Ordering::Relaxed),
    }
}

/// Reset parse metrics.
pub fn reset_parse_metrics() {
    SHARDSQL_STATEMENTS_PARSED_TOTAL.store(0, Ordering::Relaxed);
    SHARDSQL_LEXICAL_ERRORS_TOTAL.store(0, Ordering::Relaxed);
    SHARDSQL_SYNTAX_ERRORS_TOTAL.store(0, Ordering::Relaxed);
    SHARDSQL_TABLE_TOKENS_EMITTED_TOTAL.store(0, Ordering::Relaxed);
}

pub(crate) fn record_success(table_tokens: usize) {
    SHARDSQL_STATEMENTS_PARSED_TOTAL.fetch_add(1, Ordering::Relaxed);
    SHARDSQL_TABLE_TOKENS_EMITTED_TOTAL.fetch_add(table_tokens as u64, Ordering::Relaxed);
}

pub(crate) fn record_failure(err: &SqlParseError) {
    let counter = if err.is_lexical() {
        &SHARDSQL_LEXICAL_ERRORS_TOTAL
    } else {
        &SHARDSQL_SYNTAX_ERRORS_TOTAL
    };
    counter.fetch_add(1, Ordering::Relaxed);
}
