//! Annotated SQL AST for the shardsql parsing engine.
//!
//! The tree is intentionally shallow. Only what a shard rewriter needs is
//! decomposed (bare `owner.column` references, literals, placeholders, table
//! names, pagination values); every composite expression is kept as an
//! [`Expr::Opaque`] span holding the verbatim source text, because output SQL
//! is produced by substituting spans of the original text rather than by
//! re-rendering this tree.
//!
//! Every statement owns a [`StatementScope`] that records the declared tables,
//! the bound-parameter counter and the [`TableToken`] rewrite markers.

mod display;
pub mod visit;

use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Spans
// ---------------------------------------------------------------------------

/// Half-open byte range `[start, end)` into the statement text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Span of nodes built outside a parse.
    pub const ZERO: Self = Self { start: 0, end: 0 };

    /// Build a span from `usize` offsets.
    ///
    /// The lexer rejects statements longer than `u32::MAX` bytes, so parser
    /// offsets always fit. Anything larger saturates.
    #[must_use]
    pub fn from_offsets(start: usize, end: usize) -> Self {
        let clamp = |v: usize| u32::try_from(v).unwrap_or(u32::MAX);
        Self::new(clamp(start), clamp(end))
    }

    /// Whether two spans share at least one byte.
    #[must_use]
    pub const fn overlaps(self, other: Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The text this span covers in `source`, if it lies on char boundaries.
    #[must_use]
    pub fn slice(self, source: &str) -> Option<&str> {
        source.get(self.start as usize..self.end as usize)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// A (possibly quoted) name as written, with its decoded value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identifier {
    /// Decoded name: surrounding quotes, back-quotes or brackets removed.
    pub name: String,
    /// Span of the name as written, quotes included.
    pub span: Span,
}

impl Identifier {
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// A decoded numeric literal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum NumberValue {
    /// Decimal or hexadecimal integer.
    Integer(i64),
    /// Literal with a fractional part, exponent or binary-float suffix.
    Float(f64),
}

/// Expression node.
///
/// The variant set is closed on purpose: anything that is not one of the
/// simple leaves is an [`Expr::Opaque`] span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// Bare column or name reference: `user_id`.
    Identifier(Identifier),
    /// Qualified reference: `o.user_id`.
    Property {
        owner: Identifier,
        member: String,
        span: Span,
    },
    /// Bound parameter `?`; `index` is 0-based in source order.
    Placeholder { index: u32, span: Span },
    /// Numeric literal.
    Number { value: NumberValue, span: Span },
    /// Character string literal with quotes removed and escapes decoded.
    /// `national` marks the `N'...'` form.
    Text {
        value: String,
        national: bool,
        span: Span,
    },
    /// Composite expression kept as the trimmed verbatim source text.
    Opaque { text: String, span: Span },
}

impl Expr {
    /// Source span of this expression.
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            Self::Identifier(ident) => ident.span,
            Self::Property { span, .. }
            | Self::Placeholder { span, .. }
            | Self::Number { span, .. }
            | Self::Text { span, .. }
            | Self::Opaque { span, .. } => *span,
        }
    }

    /// Whether this is a verbatim composite span.
    #[must_use]
    pub const fn is_opaque(&self) -> bool {
        matches!(self, Self::Opaque { .. })
    }

    /// The column name for `col` or `owner.col` references.
    #[must_use]
    pub fn column_name(&self) -> Option<&str> {
        match self {
            Self::Identifier(ident) => Some(&ident.name),
            Self::Property { member, .. } => Some(member),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tables and rewrite markers
// ---------------------------------------------------------------------------

/// A table reference as declared in FROM / INTO / UPDATE / DDL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Unquoted logical table name.
    pub name: String,
    /// Optional schema qualifier.
    pub schema: Option<String>,
    /// Unquoted alias, if any.
    pub alias: Option<String>,
    /// Span of the table name as written (without schema qualifier).
    pub span: Span,
}

impl Table {
    /// Whether `owner` refers to this table by name or alias (ASCII case-insensitive).
    #[must_use]
    pub fn is_referenced_by(&self, owner: &str) -> bool {
        self.name.eq_ignore_ascii_case(owner)
            || self
                .alias
                .as_deref()
                .is_some_and(|alias| alias.eq_ignore_ascii_case(owner))
    }
}

/// Rewrite marker: a span of the original text naming a logical table.
///
/// The span is `[start, start + literal.len())` and encloses exactly the
/// text as written (quotes included). `table` is the logical table the
/// literal resolves to, which differs from the literal for aliases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TableToken {
    pub start: u32,
    pub literal: String,
    pub table: String,
}

impl TableToken {
    #[must_use]
    pub fn new(start: u32, literal: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            start,
            literal: literal.into(),
            table: table.into(),
        }
    }

    /// Span of the marked text.
    #[must_use]
    pub fn span(&self) -> Span {
        let len = u32::try_from(self.literal.len()).unwrap_or(u32::MAX);
        Span::new(self.start, self.start.saturating_add(len))
    }
}

/// Per-statement bookkeeping populated while the statement is parsed.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct StatementScope {
    /// Tables the metadata recognised, in declaration order.
    pub tables: Vec<Table>,
    /// Rewrite markers, ascending by `start`, non-overlapping.
    pub table_tokens: Vec<TableToken>,
    /// Number of `?` parameters consumed so far.
    pub parameters_index: u32,
    /// Nested statements found inside skipped parentheses.
    pub subqueries: Vec<SelectStatement>,
}

impl StatementScope {
    /// Find a declared table by name or alias.
    #[must_use]
    pub fn find_table(&self, owner: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.is_referenced_by(owner))
    }

    /// Declared logical table names.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Allocate the next placeholder index.
    pub fn next_parameter(&mut self) -> u32 {
        let index = self.parameters_index;
        self.parameters_index += 1;
        index
    }
}

// ---------------------------------------------------------------------------
// Top-level statement
// ---------------------------------------------------------------------------

/// A single parsed SQL statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    Ddl(DdlStatement),
}

impl Statement {
    /// The statement's scope (tables, markers, parameter counter).
    #[must_use]
    pub const fn scope(&self) -> &StatementScope {
        match self {
            Self::Select(s) => &s.scope,
            Self::Insert(s) => &s.scope,
            Self::Update(s) => &s.scope,
            Self::Delete(s) => &s.scope,
            Self::Ddl(s) => &s.scope,
        }
    }

    /// Short statement kind label.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Select(_) => "select",
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::Ddl(_) => "ddl",
        }
    }

    /// Number of bound parameters the statement consumes.
    #[must_use]
    pub const fn parameters_count(&self) -> u32 {
        self.scope().parameters_index
    }
}

// ---------------------------------------------------------------------------
// SELECT
// ---------------------------------------------------------------------------

/// A `SELECT` statement (top-level or nested).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectStatement {
    pub distinct: bool,
    pub items: Vec<SelectItem>,
    pub from: Option<FromClause>,
    pub where_clause: Option<WhereClause>,
    pub group_by: Vec<OrderItem>,
    pub having: Option<WhereClause>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Limit>,
    pub lock: Option<LockMode>,
    /// SQL Server `OPTION (...)` query hints, verbatim.
    pub query_option: Option<String>,
    pub scope: StatementScope,
    pub span: Span,
}

impl SelectStatement {
    /// An empty statement whose parameter counter starts at `parameters_index`.
    #[must_use]
    pub fn starting_at(parameters_index: u32) -> Self {
        Self {
            distinct: false,
            items: Vec::new(),
            from: None,
            where_clause: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            lock: None,
            query_option: None,
            scope: StatementScope {
                parameters_index,
                ..StatementScope::default()
            },
            span: Span::ZERO,
        }
    }
}

/// Aggregate functions that a result merger must understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AggregationKind {
    Count,
    Sum,
    Max,
    Min,
    Avg,
}

impl AggregationKind {
    /// Recognise an aggregate function name (ASCII case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [
            ("COUNT", Self::Count),
            ("SUM", Self::Sum),
            ("MAX", Self::Max),
            ("MIN", Self::Min),
            ("AVG", Self::Avg),
        ]
        .into_iter()
        .find_map(|(n, kind)| n.eq_ignore_ascii_case(name).then_some(kind))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::Avg => "AVG",
        }
    }
}

/// One entry of the select list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SelectItem {
    /// `*` or `owner.*`.
    Star { owner: Option<Identifier>, span: Span },
    /// `COUNT(...)`, `SUM(...)` etc. not followed by further arithmetic.
    Aggregation {
        kind: AggregationKind,
        /// Trimmed text between the parentheses.
        argument: String,
        alias: Option<String>,
        span: Span,
    },
    /// Any other expression.
    Expr { expr: Expr, alias: Option<String> },
}

impl SelectItem {
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Star { .. } => None,
            Self::Aggregation { alias, .. } | Self::Expr { alias, .. } => alias.as_deref(),
        }
    }
}

/// The `FROM` clause: comma-separated sources, each with its joins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FromClause {
    pub sources: Vec<TableSource>,
}

/// A table factor followed by zero or more joins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSource {
    pub factor: TableFactor,
    pub joins: Vec<Join>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TableFactor {
    Table(Table),
    /// `(SELECT ...) [AS] alias`
    Derived {
        query: Box<SelectStatement>,
        alias: Option<String>,
        span: Span,
    },
    /// `( a JOIN b ON ... )`
    Parenthesized(Box<FromClause>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JoinKind {
    Inner,
    Cross,
    Left,
    Right,
    Full,
    Straight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Join {
    pub natural: bool,
    pub kind: JoinKind,
    pub factor: TableFactor,
    /// `ON` conditions (empty when absent).
    pub on: Vec<Condition>,
    /// `USING (...)` column names (empty when absent).
    pub using: Vec<String>,
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// A `WHERE` or `HAVING` clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhereClause {
    pub conditions: Vec<Condition>,
    pub span: Span,
}

/// How a condition attaches to the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Connector {
    First,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub connector: Connector,
    pub predicate: Predicate,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    NullSafeEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::NullSafeEq => "<=>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InList {
    Values(Vec<Expr>),
    Subquery(Box<SelectStatement>),
}

/// A single predicate. Operands are shallow [`Expr`] leaves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Predicate {
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    In {
        left: Expr,
        negated: bool,
        list: InList,
    },
    Between {
        left: Expr,
        negated: bool,
        low: Expr,
        high: Expr,
    },
    IsNull {
        left: Expr,
        negated: bool,
    },
    Like {
        left: Expr,
        negated: bool,
        pattern: Expr,
        escape: Option<Expr>,
    },
    Exists {
        negated: bool,
        query: Box<SelectStatement>,
    },
    Not(Box<Predicate>),
    /// Parenthesised condition list.
    Group(Vec<Condition>),
    /// A lone expression used as a boolean.
    Bare(Expr),
}

// ---------------------------------------------------------------------------
// ORDER BY / GROUP BY / LIMIT / locking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NullsOrder {
    First,
    Last,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub expr: Expr,
    pub direction: Option<SortDirection>,
    pub nulls: Option<NullsOrder>,
}

/// A pagination value with the span a rewriter may substitute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LimitValue {
    Literal { value: i64, span: Span },
    Placeholder { index: u32, span: Span },
}

impl LimitValue {
    #[must_use]
    pub const fn span(self) -> Span {
        match self {
            Self::Literal { span, .. } | Self::Placeholder { span, .. } => span,
        }
    }
}

/// Which pagination syntax a [`Limit`] was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum LimitForm {
    /// `LIMIT n [OFFSET o]`
    #[default]
    Limit,
    /// MySQL `LIMIT o, n`
    LimitComma,
    /// `[OFFSET o ROWS] [FETCH NEXT n ROWS ONLY]`
    OffsetFetch,
    /// SQL Server `TOP (n)`
    Top,
}

/// Pagination (`LIMIT`, `OFFSET ... FETCH`, `TOP`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Limit {
    pub form: LimitForm,
    pub offset: Option<LimitValue>,
    pub row_count: Option<LimitValue>,
    /// SQL Server `TOP n PERCENT`.
    pub percent: bool,
    /// SQL Server `TOP n WITH TIES`.
    pub with_ties: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LockMode {
    ForUpdate,
    ShareMode,
}

// ---------------------------------------------------------------------------
// INSERT / UPDATE / DELETE
// ---------------------------------------------------------------------------

/// `column = value` in `SET` lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assignment {
    pub column: Expr,
    pub value: Expr,
}

/// One parenthesised `VALUES` row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuesRow {
    pub values: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InsertSource {
    Values(Vec<ValuesRow>),
    Set(Vec<Assignment>),
    Select(Box<SelectStatement>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertStatement {
    pub table: Table,
    pub columns: Vec<Expr>,
    pub source: InsertSource,
    /// MySQL `ON DUPLICATE KEY UPDATE` assignments.
    pub on_duplicate: Vec<Assignment>,
    pub scope: StatementScope,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateStatement {
    pub table: Table,
    pub assignments: Vec<Assignment>,
    pub where_clause: Option<WhereClause>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Limit>,
    pub scope: StatementScope,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeleteStatement {
    pub table: Table,
    pub where_clause: Option<WhereClause>,
    pub order_by: Vec<OrderItem>,
    pub limit: Option<Limit>,
    pub scope: StatementScope,
    pub span: Span,
}

// ---------------------------------------------------------------------------
// DDL
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DdlKind {
    CreateTable,
    AlterTable,
    DropTable,
    TruncateTable,
}

/// Table-level DDL. Only the table names are analysed; the rest of the
/// statement is kept as written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DdlStatement {
    pub kind: DdlKind,
    pub tables: Vec<Table>,
    /// Statement text, trimmed of the trailing `;`.
    pub text: String,
    pub scope: StatementScope,
    pub span: Span,
}
