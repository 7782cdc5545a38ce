//! Dialect selection and capability tables.

use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::char_type::byte_at;
use crate::dictionary::Dictionary;

/// SQL dialect selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    #[default]
    Standard,
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "sqlserver")]
    SqlServer,
}

impl DatabaseType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::MySql => "mysql",
            Self::SqlServer => "sqlserver",
        }
    }

    /// The capability table for this dialect.
    #[must_use]
    pub fn options(self) -> &'static DialectOptions {
        match self {
            Self::Standard => &STANDARD,
            Self::MySql => &MYSQL,
            Self::SqlServer => &SQLSERVER,
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognises the start of an optimizer hint at an offset.
pub type HintRecognizer = fn(&[u8], usize) -> bool;

/// Per-dialect lexing capabilities.
#[derive(Clone, Copy)]
pub struct DialectOptions {
    pub database_type: DatabaseType,
    /// `@var` / `@@var`.
    pub supports_variables: bool,
    /// `N'...'`.
    pub supports_national_chars: bool,
    pub hint_recognizer: Option<HintRecognizer>,
    /// `\'` style escapes inside character literals.
    pub backslash_escapes: bool,
    /// `[name]` quoted identifiers.
    pub bracket_identifiers: bool,
    /// `#` line comments.
    pub hash_comments: bool,
    pub dictionary: &'static Dictionary,
}

impl DialectOptions {
    #[must_use]
    pub fn recognizes_hint(&self, src: &[u8], offset: usize) -> bool {
        self.hint_recognizer.is_some_and(|f| f(src, offset))
    }
}

impl fmt::Debug for DialectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectOptions")
            .field("database_type", &self.database_type)
            .field("supports_variables", &self.supports_variables)
            .field("supports_national_chars", &self.supports_national_chars)
            .field("hints", &self.hint_recognizer.is_some())
            .field("backslash_escapes", &self.backslash_escapes)
            .field("bracket_identifiers", &self.bracket_identifiers)
            .field("hash_comments", &self.hash_comments)
            .field("keywords", &self.dictionary.len())
            .finish()
    }
}

/// MySQL executable comment `/*! ... */`.
fn mysql_hint(src: &[u8], offset: usize) -> bool {
    byte_at(src, offset) == b'/' && byte_at(src, offset + 1) == b'*' && byte_at(src, offset + 2) == b'!'
}

static STANDARD: LazyLock<DialectOptions> = LazyLock::new(|| DialectOptions {
    database_type: DatabaseType::Standard,
    supports_variables: false,
    supports_national_chars: false,
    hint_recognizer: None,
    backslash_escapes: false,
    bracket_identifiers: false,
    hash_comments: false,
    dictionary: Dictionary::standard(),
});

static MYSQL: LazyLock<DialectOptions> = LazyLock::new(|| DialectOptions {
    database_type: DatabaseType::MySql,
    supports_variables: true,
    supports_national_chars: true,
    hint_recognizer: Some(mysql_hint),
    backslash_escapes: true,
    bracket_identifiers: false,
    hash_comments: true,
    dictionary: Dictionary::mysql(),
});

static SQLSERVER: LazyLock<DialectOptions> = LazyLock::new(|| DialectOptions {
    database_type: DatabaseType::SqlServer,
    supports_variables: true,
    supports_national_chars: true,
    hint_recognizer: None,
    backslash_escapes: false,
    bracket_identifiers: true,
    hash_comments: false,
    dictionary: Dictionary::sqlserver(),
});
