//! Reserved-word dictionaries.
//!
//! A [`Dictionary`] maps case-folded words to [`Keyword`] identities. One
//! immutable instance exists per dialect; it is built on first use and shared
//! read-only by every lexer of that dialect.

use std::collections::HashMap;
use std::sync::LazyLock;

macro_rules! keywords {
    ($($variant:ident => $text:literal),* $(,)?) => {
        /// Keyword identity.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Keyword {
            $($variant),*
        }

        impl Keyword {
            /// Canonical upper-case spelling.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),*
                }
            }
        }
    };
}

keywords! {
    // Statements
    Select => "SELECT",
    Insert => "INSERT",
    Update => "UPDATE",
    Delete => "DELETE",
    Create => "CREATE",
    Alter => "ALTER",
    Drop => "DROP",
    Truncate => "TRUNCATE",
    Table => "TABLE",
    Temporary => "TEMPORARY",
    If => "IF",
    // Predicates and operators
    Exists => "EXISTS",
    Not => "NOT",
    Null => "NULL",
    Is => "IS",
    In => "IN",
    Between => "BETWEEN",
    Like => "LIKE",
    Escape => "ESCAPE",
    And => "AND",
    Or => "OR",
    Div => "DIV",
    Mod => "MOD",
    // Clauses
    As => "AS",
    Distinct => "DISTINCT",
    DistinctRow => "DISTINCTROW",
    All => "ALL",
    From => "FROM",
    Where => "WHERE",
    Group => "GROUP",
    Order => "ORDER",
    By => "BY",
    Having => "HAVING",
    Limit => "LIMIT",
    Offset => "OFFSET",
    Fetch => "FETCH",
    Next => "NEXT",
    First => "FIRST",
    Last => "LAST",
    Row => "ROW",
    Rows => "ROWS",
    Only => "ONLY",
    Asc => "ASC",
    Desc => "DESC",
    Nulls => "NULLS",
    Union => "UNION",
    Intersect => "INTERSECT",
    Except => "EXCEPT",
    Into => "INTO",
    Values => "VALUES",
    Value => "VALUE",
    Set => "SET",
    For => "FOR",
    With => "WITH",
    // Joins
    Join => "JOIN",
    Inner => "INNER",
    Cross => "CROSS",
    Left => "LEFT",
    Right => "RIGHT",
    Full => "FULL",
    Outer => "OUTER",
    Natural => "NATURAL",
    On => "ON",
    Using => "USING",
    StraightJoin => "STRAIGHT_JOIN",
    // Operand keywords
    Case => "CASE",
    When => "WHEN",
    Then => "THEN",
    Else => "ELSE",
    End => "END",
    Interval => "INTERVAL",
    Default => "DEFAULT",
    True => "TRUE",
    False => "FALSE",
    // Non-reserved words accepted as aliases or names
    User => "USER",
    Key => "KEY",
    Index => "INDEX",
    Constraint => "CONSTRAINT",
    // MySQL
    Dual => "DUAL",
    Use => "USE",
    Force => "FORCE",
    Ignore => "IGNORE",
    LowPriority => "LOW_PRIORITY",
    HighPriority => "HIGH_PRIORITY",
    Delayed => "DELAYED",
    Quick => "QUICK",
    SqlSmallResult => "SQL_SMALL_RESULT",
    SqlBigResult => "SQL_BIG_RESULT",
    SqlBufferResult => "SQL_BUFFER_RESULT",
    SqlCache => "SQL_CACHE",
    SqlNoCache => "SQL_NO_CACHE",
    SqlCalcFoundRows => "SQL_CALC_FOUND_ROWS",
    Duplicate => "DUPLICATE",
    Lock => "LOCK",
    Share => "SHARE",
    Mode => "MODE",
    Rollup => "ROLLUP",
    // SQL Server
    Top => "TOP",
    Percent => "PERCENT",
    Ties => "TIES",
    Option => "OPTION",
    Nolock => "NOLOCK",
}

impl Keyword {
    /// Structural keywords that can never stand for a name or an operand.
    #[must_use]
    pub const fn is_reserved(self) -> bool {
        matches!(
            self,
            Self::Select
                | Self::Insert
                | Self::Update
                | Self::Delete
                | Self::Create
                | Self::Alter
                | Self::Drop
                | Self::Truncate
                | Self::Table
                | Self::Is
                | Self::In
                | Self::Between
                | Self::Like
                | Self::Escape
                | Self::And
                | Self::Or
                | Self::As
                | Self::Distinct
                | Self::DistinctRow
                | Self::All
                | Self::From
                | Self::Where
                | Self::Group
                | Self::Order
                | Self::By
                | Self::Having
                | Self::Limit
                | Self::Offset
                | Self::Fetch
                | Self::Asc
                | Self::Desc
                | Self::Union
                | Self::Intersect
                | Self::Except
                | Self::Into
                | Self::Values
                | Self::Set
                | Self::For
                | Self::With
                | Self::Join
                | Self::Inner
                | Self::Cross
                | Self::Left
                | Self::Right
                | Self::Full
                | Self::Outer
                | Self::Natural
                | Self::On
                | Self::Using
                | Self::StraightJoin
                | Self::When
                | Self::Then
                | Self::Else
                | Self::End
                | Self::HighPriority
                | Self::SqlSmallResult
                | Self::SqlBigResult
                | Self::SqlBufferResult
                | Self::SqlCache
                | Self::SqlNoCache
                | Self::SqlCalcFoundRows
                | Self::Lock
                | Self::Top
                | Self::Option
        )
    }

    /// Keywords that begin an operand without being a name.
    #[must_use]
    pub const fn starts_operand(self) -> bool {
        matches!(
            self,
            Self::Not
                | Self::Exists
                | Self::Case
                | Self::Interval
                | Self::Null
                | Self::True
                | Self::False
                | Self::Default
        )
    }

    /// Keywords usable as a column, table or alias name.
    #[must_use]
    pub const fn is_name_like(self) -> bool {
        !self.is_reserved() && !self.starts_operand()
    }
}

const BASE_KEYWORDS: &[Keyword] = &[
    Keyword::Select,
    Keyword::Insert,
    Keyword::Update,
    Keyword::Delete,
    Keyword::Create,
    Keyword::Alter,
    Keyword::Drop,
    Keyword::Truncate,
    Keyword::Table,
    Keyword::Temporary,
    Keyword::If,
    Keyword::Exists,
    Keyword::Not,
    Keyword::Null,
    Keyword::Is,
    Keyword::In,
    Keyword::Between,
    Keyword::Like,
    Keyword::Escape,
    Keyword::And,
    Keyword::Or,
    Keyword::As,
    Keyword::Distinct,
    Keyword::All,
    Keyword::From,
    Keyword::Where,
    Keyword::Group,
    Keyword::Order,
    Keyword::By,
    Keyword::Having,
    Keyword::Limit,
    Keyword::Offset,
    Keyword::Fetch,
    Keyword::Next,
    Keyword::First,
    Keyword::Last,
    Keyword::Row,
    Keyword::Rows,
    Keyword::Only,
    Keyword::Asc,
    Keyword::Desc,
    Keyword::Nulls,
    Keyword::Union,
    Keyword::Intersect,
    Keyword::Except,
    Keyword::Into,
    Keyword::Values,
    Keyword::Set,
    Keyword::For,
    Keyword::With,
    Keyword::Join,
    Keyword::Inner,
    Keyword::Cross,
    Keyword::Left,
    Keyword::Right,
    Keyword::Full,
    Keyword::Outer,
    Keyword::Natural,
    Keyword::On,
    Keyword::Using,
    Keyword::Case,
    Keyword::When,
    Keyword::Then,
    Keyword::Else,
    Keyword::End,
    Keyword::Interval,
    Keyword::Default,
    Keyword::True,
    Keyword::False,
    Keyword::User,
    Keyword::Key,
    Keyword::Index,
    Keyword::Constraint,
];

const MYSQL_KEYWORDS: &[Keyword] = &[
    Keyword::DistinctRow,
    Keyword::Value,
    Keyword::Div,
    Keyword::Mod,
    Keyword::StraightJoin,
    Keyword::Dual,
    Keyword::Use,
    Keyword::Force,
    Keyword::Ignore,
    Keyword::LowPriority,
    Keyword::HighPriority,
    Keyword::Delayed,
    Keyword::Quick,
    Keyword::SqlSmallResult,
    Keyword::SqlBigResult,
    Keyword::SqlBufferResult,
    Keyword::SqlCache,
    Keyword::SqlNoCache,
    Keyword::SqlCalcFoundRows,
    Keyword::Duplicate,
    Keyword::Lock,
    Keyword::Share,
    Keyword::Mode,
    Keyword::Rollup,
];

const SQLSERVER_KEYWORDS: &[Keyword] = &[
    Keyword::Top,
    Keyword::Percent,
    Keyword::Ties,
    Keyword::Option,
    Keyword::Nolock,
];

static STANDARD: LazyLock<Dictionary> = LazyLock::new(|| Dictionary::new(&[]));
static MYSQL: LazyLock<Dictionary> = LazyLock::new(|| Dictionary::new(MYSQL_KEYWORDS));
static SQLSERVER: LazyLock<Dictionary> = LazyLock::new(|| Dictionary::new(SQLSERVER_KEYWORDS));

/// Case-insensitive reserved-word table.
#[derive(Debug, Clone)]
pub struct Dictionary {
    words: HashMap<&'static str, Keyword>,
    longest: usize,
}

impl Dictionary {
    /// Base keywords plus `extra`.
    #[must_use]
    pub fn new(extra: &[Keyword]) -> Self {
        let words: HashMap<&'static str, Keyword> = BASE_KEYWORDS
            .iter()
            .chain(extra)
            .map(|&kw| (kw.as_str(), kw))
            .collect();
        let longest = words.keys().map(|w| w.len()).max().unwrap_or(0);
        Self { words, longest }
    }

    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    #[must_use]
    pub fn mysql() -> &'static Self {
        &MYSQL
    }

    #[must_use]
    pub fn sqlserver() -> &'static Self {
        &SQLSERVER
    }

    /// Look up `word` ignoring ASCII case. Does not allocate.
    #[must_use]
    pub fn lookup(&self, word: &str) -> Option<Keyword> {
        const BUF: usize = 32;
        let bytes = word.as_bytes();
        if bytes.is_empty() || bytes.len() > self.longest || bytes.len() > BUF {
            return None;
        }
        let mut buf = [0u8; BUF];
        for (dst, &src) in buf.iter_mut().zip(bytes) {
            if !src.is_ascii() {
                return None;
            }
            *dst = src.to_ascii_uppercase();
        }
        let upper = std::str::from_utf8(&buf[..bytes.len()]).ok()?;
        self.words.get(upper).copied()
    }

    #[must_use]
    pub fn contains(&self, keyword: Keyword) -> bool {
        self.words.contains_key(keyword.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
