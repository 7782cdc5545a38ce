//! SQL rendering via `fmt::Display` for AST nodes.
//!
//! Rendering is for diagnostics and logging. Opaque expressions are written
//! back verbatim, so the output re-parses to an equivalent tree, but it is
//! not byte-identical to the input; rewriting goes through span
//! substitution on the original text instead.

#[allow(clippy::wildcard_imports)]
use crate::*;
use std::fmt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn comma_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Write a list of conditions, joined by their connectors.
fn condition_list(f: &mut fmt::Formatter<'_>, conditions: &[Condition]) -> fmt::Result {
    for (i, cond) in conditions.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{cond}")?;
    }
    Ok(())
}

fn needs_quoting(name: &str) -> bool {
    let Some(&first) = name.as_bytes().first() else {
        return true;
    };
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return true;
    }
    name.bytes()
        .any(|b| !(b.is_ascii_alphanumeric() || b == b'_' || b == b'$'))
}

fn write_ident(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if needs_quoting(name) {
        write!(f, "\"{}\"", name.replace('"', "\"\""))
    } else {
        f.write_str(name)
    }
}

fn write_alias(f: &mut fmt::Formatter<'_>, alias: Option<&str>) -> fmt::Result {
    if let Some(alias) = alias {
        f.write_str(" AS ")?;
        write_ident(f, alias)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_ident(f, &self.name)
    }
}

impl fmt::Display for NumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Self::Float(v) => write!(f, "{v}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(ident) => write!(f, "{ident}"),
            Self::Property { owner, member, .. } => {
                write!(f, "{owner}.")?;
                if member == "*" {
                    f.write_str("*")
                } else {
                    write_ident(f, member)
                }
            }
            Self::Placeholder { .. } => f.write_str("?"),
            Self::Number { value, .. } => write!(f, "{value}"),
            Self::Text {
                value, national, ..
            } => {
                if *national {
                    f.write_str("N")?;
                }
                write!(f, "'{}'", value.replace('\'', "''"))
            }
            Self::Opaque { text, .. } => f.write_str(text),
        }
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(s) => write!(f, "{s}"),
            Self::Insert(s) => write!(f, "{s}"),
            Self::Update(s) => write!(f, "{s}"),
            Self::Delete(s) => write!(f, "{s}"),
            Self::Ddl(s) => write!(f, "{s}"),
        }
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        let (top, limit) = match self.limit {
            Some(l) if l.form == LimitForm::Top => (Some(l), None),
            other => (None, other),
        };
        if let Some(top) = top {
            write!(f, "{top} ")?;
        }
        comma_list(f, &self.items)?;
        if let Some(from) = &self.from {
            write!(f, " FROM {from}")?;
        }
        if let Some(w) = &self.where_clause {
            write!(f, " WHERE {w}")?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            comma_list(f, &self.group_by)?;
        }
        if let Some(h) = &self.having {
            write!(f, " HAVING {h}")?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            comma_list(f, &self.order_by)?;
        }
        if let Some(limit) = limit {
            write!(f, " {limit}")?;
        }
        match self.lock {
            Some(LockMode::ForUpdate) => f.write_str(" FOR UPDATE")?,
            Some(LockMode::ShareMode) => f.write_str(" LOCK IN SHARE MODE")?,
            None => {}
        }
        if let Some(option) = &self.query_option {
            write!(f, " {option}")?;
        }
        Ok(())
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Star { owner: Some(o), .. } => write!(f, "{o}.*"),
            Self::Star { owner: None, .. } => f.write_str("*"),
            Self::Aggregation {
                kind,
                argument,
                alias,
                ..
            } => {
                write!(f, "{}({argument})", kind.as_str())?;
                write_alias(f, alias.as_deref())
            }
            Self::Expr { expr, alias } => {
                write!(f, "{expr}")?;
                write_alias(f, alias.as_deref())
            }
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write_ident(f, schema)?;
            f.write_str(".")?;
        }
        write_ident(f, &self.name)?;
        write_alias(f, self.alias.as_deref())
    }
}

impl fmt::Display for FromClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        comma_list(f, &self.sources)
    }
}

impl fmt::Display for TableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.factor)?;
        for join in &self.joins {
            write!(f, " {join}")?;
        }
        Ok(())
    }
}

impl fmt::Display for TableFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(t) => write!(f, "{t}"),
            Self::Derived { query, alias, .. } => {
                write!(f, "({query})")?;
                write_alias(f, alias.as_deref())
            }
            Self::Parenthesized(inner) => write!(f, "({inner})"),
        }
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.natural {
            f.write_str("NATURAL ")?;
        }
        let kw = match self.kind {
            JoinKind::Inner => "JOIN",
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Straight => "STRAIGHT_JOIN",
        };
        write!(f, "{kw} {}", self.factor)?;
        if !self.on.is_empty() {
            f.write_str(" ON ")?;
            condition_list(f, &self.on)?;
        }
        if !self.using.is_empty() {
            f.write_str(" USING (")?;
            for (i, col) in self.using.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_ident(f, col)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        condition_list(f, &self.conditions)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.connector {
            Connector::First => {}
            Connector::And => f.write_str("AND ")?,
            Connector::Or => f.write_str("OR ")?,
        }
        write!(f, "{}", self.predicate)
    }
}

fn not_kw(negated: bool) -> &'static str {
    if negated { "NOT " } else { "" }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compare { left, op, right } => write!(f, "{left} {} {right}", op.as_str()),
            Self::In {
                left,
                negated,
                list,
            } => {
                write!(f, "{left} {}IN (", not_kw(*negated))?;
                match list {
                    InList::Values(values) => comma_list(f, values)?,
                    InList::Subquery(q) => write!(f, "{q}")?,
                }
                f.write_str(")")
            }
            Self::Between {
                left,
                negated,
                low,
                high,
            } => write!(f, "{left} {}BETWEEN {low} AND {high}", not_kw(*negated)),
            Self::IsNull { left, negated } => write!(f, "{left} IS {}NULL", not_kw(*negated)),
            Self::Like {
                left,
                negated,
                pattern,
                escape,
            } => {
                write!(f, "{left} {}LIKE {pattern}", not_kw(*negated))?;
                if let Some(esc) = escape {
                    write!(f, " ESCAPE {esc}")?;
                }
                Ok(())
            }
            Self::Exists { negated, query } => write!(f, "{}EXISTS ({query})", not_kw(*negated)),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::Group(conditions) => {
                f.write_str("(")?;
                condition_list(f, conditions)?;
                f.write_str(")")
            }
            Self::Bare(expr) => write!(f, "{expr}"),
        }
    }
}

impl fmt::Display for OrderItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr)?;
        match self.direction {
            Some(SortDirection::Asc) => f.write_str(" ASC")?,
            Some(SortDirection::Desc) => f.write_str(" DESC")?,
            None => {}
        }
        match self.nulls {
            Some(NullsOrder::First) => f.write_str(" NULLS FIRST"),
            Some(NullsOrder::Last) => f.write_str(" NULLS LAST"),
            None => Ok(()),
        }
    }
}

impl fmt::Display for LimitValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { value, .. } => write!(f, "{value}"),
            Self::Placeholder { .. } => f.write_str("?"),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.form {
            LimitForm::Limit => {
                f.write_str("LIMIT ")?;
                match self.row_count {
                    Some(count) => write!(f, "{count}")?,
                    None => f.write_str("ALL")?,
                }
                if let Some(offset) = self.offset {
                    write!(f, " OFFSET {offset}")?;
                }
            }
            LimitForm::LimitComma => {
                f.write_str("LIMIT ")?;
                if let Some(offset) = self.offset {
                    write!(f, "{offset}, ")?;
                }
                match self.row_count {
                    Some(count) => write!(f, "{count}")?,
                    None => f.write_str("ALL")?,
                }
            }
            LimitForm::OffsetFetch => {
                if let Some(offset) = self.offset {
                    write!(f, "OFFSET {offset} ROWS")?;
                }
                if let Some(count) = self.row_count {
                    if self.offset.is_some() {
                        f.write_str(" ")?;
                    }
                    write!(f, "FETCH NEXT {count} ROWS ONLY")?;
                }
            }
            LimitForm::Top => {
                if let Some(count) = self.row_count {
                    write!(f, "TOP ({count})")?;
                }
                if self.percent {
                    f.write_str(" PERCENT")?;
                }
                if self.with_ties {
                    f.write_str(" WITH TIES")?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.column, self.value)
    }
}

impl fmt::Display for ValuesRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        comma_list(f, &self.values)?;
        f.write_str(")")
    }
}

impl fmt::Display for InsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "INSERT INTO {}", self.table)?;
        if !self.columns.is_empty() {
            f.write_str(" (")?;
            comma_list(f, &self.columns)?;
            f.write_str(")")?;
        }
        match &self.source {
            InsertSource::Values(rows) => {
                f.write_str(" VALUES ")?;
                comma_list(f, rows)?;
            }
            InsertSource::Set(assignments) => {
                f.write_str(" SET ")?;
                comma_list(f, assignments)?;
            }
            InsertSource::Select(query) => write!(f, " {query}")?,
        }
        if !self.on_duplicate.is_empty() {
            f.write_str(" ON DUPLICATE KEY UPDATE ")?;
            comma_list(f, &self.on_duplicate)?;
        }
        Ok(())
    }
}

impl fmt::Display for UpdateStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UPDATE {} SET ", self.table)?;
        comma_list(f, &self.assignments)?;
        if let Some(w) = &self.where_clause {
            write!(f, " WHERE {w}")?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            comma_list(f, &self.order_by)?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " {limit}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DeleteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DELETE FROM {}", self.table)?;
        if let Some(w) = &self.where_clause {
            write!(f, " WHERE {w}")?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            comma_list(f, &self.order_by)?;
        }
        if let Some(limit) = &self.limit {
            write!(f, " {limit}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DdlStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Identifier {
        Identifier::new(name, Span::ZERO)
    }

    #[test]
    fn expr_rendering() {
        let prop = Expr::Property {
            owner: ident("o"),
            member: "user_id".to_owned(),
            span: Span::ZERO,
        };
        assert_eq!(prop.to_string(), "o.user_id");
        let text = Expr::Text {
            value: "a'b".to_owned(),
            national: false,
            span: Span::ZERO,
        };
        assert_eq!(text.to_string(), "'a''b'");
        let text = Expr::Text {
            value: "x".to_owned(),
            national: true,
            span: Span::ZERO,
        };
        assert_eq!(text.to_string(), "N'x'");
        let opaque = Expr::Opaque {
            text: "DATE(create_time) + 1".to_owned(),
            span: Span::ZERO,
        };
        assert_eq!(opaque.to_string(), "DATE(create_time) + 1");
    }

    #[test]
    fn identifiers_are_quoted_when_needed() {
        assert_eq!(ident("order items").to_string(), "\"order items\"");
        assert_eq!(ident("t_order").to_string(), "t_order");
    }

    #[test]
    fn float_keeps_decimal_point() {
        assert_eq!(NumberValue::Float(2.0).to_string(), "2.0");
        assert_eq!(NumberValue::Float(1.5).to_string(), "1.5");
        assert_eq!(NumberValue::Integer(-5).to_string(), "-5");
    }

    #[test]
    fn select_rendering() {
        let mut select = SelectStatement::starting_at(0);
        select.items.push(SelectItem::Star {
            owner: None,
            span: Span::ZERO,
        });
        select.from = Some(FromClause {
            sources: vec![TableSource {
                factor: TableFactor::Table(Table {
                    name: "orders".to_owned(),
                    schema: None,
                    alias: Some("o".to_owned()),
                    span: Span::ZERO,
                }),
                joins: Vec::new(),
            }],
        });
        select.where_clause = Some(WhereClause {
            conditions: vec![Condition {
                connector: Connector::First,
                predicate: Predicate::Compare {
                    left: Expr::Identifier(ident("id")),
                    op: CompareOp::Eq,
                    right: Expr::Placeholder {
                        index: 0,
                        span: Span::ZERO,
                    },
                },
                span: Span::ZERO,
            }],
            span: Span::ZERO,
        });
        select.limit = Some(Limit {
            offset: Some(LimitValue::Literal {
                value: 10,
                span: Span::ZERO,
            }),
            row_count: Some(LimitValue::Literal {
                value: 20,
                span: Span::ZERO,
            }),
            ..Limit::default()
        });
        assert_eq!(
            select.to_string(),
            "SELECT * FROM orders AS o WHERE id = ? LIMIT 20 OFFSET 10"
        );
    }

    fn placeholder(index: u32) -> Option<LimitValue> {
        Some(LimitValue::Placeholder {
            index,
            span: Span::ZERO,
        })
    }

    #[test]
    fn limit_keeps_its_form() {
        let limit = |form: LimitForm, offset: Option<LimitValue>, row_count: Option<LimitValue>| Limit {
            form,
            offset,
            row_count,
            ..Limit::default()
        };
        assert_eq!(
            limit(LimitForm::LimitComma, placeholder(0), placeholder(1)).to_string(),
            "LIMIT ?, ?"
        );
        assert_eq!(
            limit(LimitForm::OffsetFetch, placeholder(0), placeholder(1)).to_string(),
            "OFFSET ? ROWS FETCH NEXT ? ROWS ONLY"
        );
        assert_eq!(
            limit(LimitForm::OffsetFetch, None, placeholder(0)).to_string(),
            "FETCH NEXT ? ROWS ONLY"
        );
        let top = Limit {
            percent: true,
            with_ties: true,
            ..limit(LimitForm::Top, None, placeholder(0))
        };
        assert_eq!(top.to_string(), "TOP (?) PERCENT WITH TIES");
    }

    #[test]
    fn top_renders_before_the_select_list() {
        let mut select = SelectStatement::starting_at(0);
        select.items.push(SelectItem::Expr {
            expr: Expr::Identifier(ident("a")),
            alias: None,
        });
        select.limit = Some(Limit {
            form: LimitForm::Top,
            row_count: placeholder(0),
            ..Limit::default()
        });
        select.query_option = Some("OPTION (MAXDOP 1)".to_owned());
        assert_eq!(select.to_string(), "SELECT TOP (?) a OPTION (MAXDOP 1)");
    }

    #[test]
    fn ddl_renders_verbatim() {
        let ddl = DdlStatement {
            kind: DdlKind::CreateTable,
            tables: Vec::new(),
            text: "CREATE TABLE IF NOT EXISTS orders (id INT PRIMARY KEY)".to_owned(),
            scope: StatementScope::default(),
            span: Span::ZERO,
        };
        assert_eq!(ddl.to_string(), "CREATE TABLE IF NOT EXISTS orders (id INT PRIMARY KEY)");
    }
}
