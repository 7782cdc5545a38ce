use thiserror::Error;

/// Maximum number of characters captured in an error excerpt.
const EXCERPT_CHARS: usize = 24;

/// Error raised while lexing or parsing a SQL statement.
///
/// There are deliberately only two kinds. Both carry the byte offset into
/// the statement text where analysis stopped and a short excerpt of the
/// input starting at that offset. Neither kind is recovered from: a failed
/// parse never yields a partial AST.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlParseError {
    /// No scan routine matched, or a literal/comment was left unterminated.
    #[error("lexical error at offset {offset}: {detail} (near \"{excerpt}\")")]
    Lexical {
        offset: usize,
        excerpt: String,
        detail: String,
    },

    /// A clause parser found a token it did not expect.
    #[error("syntax error at offset {offset}: {detail} (near \"{excerpt}\")")]
    Syntax {
        offset: usize,
        excerpt: String,
        detail: String,
    },
}

/// Result alias used throughout the shardsql crates.
pub type Result<T> = std::result::Result<T, SqlParseError>;

impl SqlParseError {
    /// Create a lexical error at `offset` within `input`.
    pub fn lexical(input: &str, offset: usize, detail: impl Into<String>) -> Self {
        Self::Lexical {
            offset,
            excerpt: excerpt(input, offset),
            detail: detail.into(),
        }
    }

    /// Create a syntax error at `offset` within `input`.
    pub fn syntax(input: &str, offset: usize, detail: impl Into<String>) -> Self {
        Self::Syntax {
            offset,
            excerpt: excerpt(input, offset),
            detail: detail.into(),
        }
    }

    /// Byte offset where analysis stopped.
    pub const fn offset(&self) -> usize {
        match self {
            Self::Lexical { offset, .. } | Self::Syntax { offset, .. } => *offset,
        }
    }

    /// The input excerpt captured at the failing offset.
    pub fn excerpt(&self) -> &str {
        match self {
            Self::Lexical { excerpt, .. } | Self::Syntax { excerpt, .. } => excerpt,
        }
    }

    /// Description of what went wrong.
    pub fn detail(&self) -> &str {
        match self {
            Self::Lexical { detail, .. } | Self::Syntax { detail, .. } => detail,
        }
    }

    pub const fn is_lexical(&self) -> bool {
        matches!(self, Self::Lexical { .. })
    }

    pub const fn is_syntax(&self) -> bool {
        matches!(self, Self::Syntax { .. })
    }

    /// Stable name of the error kind, suitable as a log or metric label.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Lexical { .. } => "lexical",
            Self::Syntax { .. } => "syntax",
        }
    }

    /// Human-friendly suggestion for fixing this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        let detail = self.detail();
        if detail.starts_with("unterminated") {
            Some("Close the quoted literal, identifier or comment")
        } else if detail.contains("out of range") {
            Some("Bind the value as a parameter instead of an inline literal")
        } else if detail.contains("nesting") {
            Some("Flatten nested sub-queries or raise max_nesting_depth")
        } else if detail.starts_with("unsupported") {
            Some("Rewrite the statement without the unsupported construct")
        } else {
            None
        }
    }
}

/// Up to [`EXCERPT_CHARS`] characters of `input` starting at `offset`.
///
/// Offsets that fall inside a multi-byte character are moved back to the
/// preceding char boundary.
fn excerpt(input: &str, offset: usize) -> String {
    let mut start = offset.min(input.len());
    while !input.is_char_boundary(start) {
        start -= 1;
    }
    input[start..].chars().take(EXCERPT_CHARS).collect()
}
