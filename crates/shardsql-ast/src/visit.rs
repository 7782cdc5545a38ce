//! Depth-first traversal over parsed statements.
//!
//! A [`Visitor`] is called on entry to every node and again on exit. Returning
//! [`Visit::SkipChildren`] from [`Visitor::enter`] prunes the subtree below
//! that node; `leave` is still called for it.

#[allow(clippy::wildcard_imports)]
use crate::*;

/// A borrowed reference to any node the walker visits.
#[derive(Debug, Clone, Copy)]
pub enum Node<'n> {
    Statement(&'n Statement),
    Select(&'n SelectStatement),
    Insert(&'n InsertStatement),
    Update(&'n UpdateStatement),
    Delete(&'n DeleteStatement),
    Ddl(&'n DdlStatement),
    SelectItem(&'n SelectItem),
    TableFactor(&'n TableFactor),
    Join(&'n Join),
    Condition(&'n Condition),
    Predicate(&'n Predicate),
    OrderItem(&'n OrderItem),
    Limit(&'n Limit),
    Assignment(&'n Assignment),
    Expr(&'n Expr),
}

impl<'n> Node<'n> {
    /// The scope owned by statement nodes.
    #[must_use]
    pub fn scope(self) -> Option<&'n StatementScope> {
        match self {
            Self::Statement(s) => Some(s.scope()),
            Self::Select(s) => Some(&s.scope),
            Self::Insert(s) => Some(&s.scope),
            Self::Update(s) => Some(&s.scope),
            Self::Delete(s) => Some(&s.scope),
            Self::Ddl(s) => Some(&s.scope),
            _ => None,
        }
    }
}

/// What the walker does after [`Visitor::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Descend,
    SkipChildren,
}

pub trait Visitor<'n> {
    fn enter(&mut self, _node: Node<'n>) -> Visit {
        Visit::Descend
    }

    fn leave(&mut self, _node: Node<'n>) {}
}

/// Walk `node` and everything below it in source order.
pub fn walk<'n, V: Visitor<'n> + ?Sized>(node: Node<'n>, visitor: &mut V) {
    if visitor.enter(node) == Visit::Descend {
        walk_children(node, visitor);
    }
    visitor.leave(node);
}

fn walk_all<'n, T, V: Visitor<'n> + ?Sized>(
    items: &'n [T],
    wrap: fn(&'n T) -> Node<'n>,
    visitor: &mut V,
) {
    for item in items {
        walk(wrap(item), visitor);
    }
}

fn walk_subqueries<'n, V: Visitor<'n> + ?Sized>(scope: &'n StatementScope, visitor: &mut V) {
    walk_all(&scope.subqueries, Node::Select, visitor);
}

fn walk_from<'n, V: Visitor<'n> + ?Sized>(from: &'n FromClause, visitor: &mut V) {
    for source in &from.sources {
        walk(Node::TableFactor(&source.factor), visitor);
        walk_all(&source.joins, Node::Join, visitor);
    }
}

fn walk_tail<'n, V: Visitor<'n> + ?Sized>(
    where_clause: Option<&'n WhereClause>,
    order_by: &'n [OrderItem],
    limit: Option<&'n Limit>,
    visitor: &mut V,
) {
    if let Some(w) = where_clause {
        walk_all(&w.conditions, Node::Condition, visitor);
    }
    walk_all(order_by, Node::OrderItem, visitor);
    if let Some(limit) = limit {
        walk(Node::Limit(limit), visitor);
    }
}

#[allow(clippy::too_many_lines)]
fn walk_children<'n, V: Visitor<'n> + ?Sized>(node: Node<'n>, visitor: &mut V) {
    match node {
        Node::Statement(stmt) => match stmt {
            Statement::Select(s) => walk(Node::Select(s), visitor),
            Statement::Insert(s) => walk(Node::Insert(s), visitor),
            Statement::Update(s) => walk(Node::Update(s), visitor),
            Statement::Delete(s) => walk(Node::Delete(s), visitor),
            Statement::Ddl(s) => walk(Node::Ddl(s), visitor),
        },
        Node::Select(s) => {
            walk_all(&s.items, Node::SelectItem, visitor);
            if let Some(from) = &s.from {
                walk_from(from, visitor);
            }
            if let Some(w) = &s.where_clause {
                walk_all(&w.conditions, Node::Condition, visitor);
            }
            walk_all(&s.group_by, Node::OrderItem, visitor);
            if let Some(h) = &s.having {
                walk_all(&h.conditions, Node::Condition, visitor);
            }
            walk_tail(None, &s.order_by, s.limit.as_ref(), visitor);
            walk_subqueries(&s.scope, visitor);
        }
        Node::Insert(s) => {
            walk_all(&s.columns, Node::Expr, visitor);
            match &s.source {
                InsertSource::Values(rows) => {
                    for row in rows {
                        walk_all(&row.values, Node::Expr, visitor);
                    }
                }
                InsertSource::Set(assignments) => {
                    walk_all(assignments, Node::Assignment, visitor);
                }
                InsertSource::Select(query) => walk(Node::Select(query), visitor),
            }
            walk_all(&s.on_duplicate, Node::Assignment, visitor);
            walk_subqueries(&s.scope, visitor);
        }
        Node::Update(s) => {
            walk_all(&s.assignments, Node::Assignment, visitor);
            walk_tail(
                s.where_clause.as_ref(),
                &s.order_by,
                s.limit.as_ref(),
                visitor,
            );
            walk_subqueries(&s.scope, visitor);
        }
        Node::Delete(s) => {
            walk_tail(
                s.where_clause.as_ref(),
                &s.order_by,
                s.limit.as_ref(),
                visitor,
            );
            walk_subqueries(&s.scope, visitor);
        }
        Node::Ddl(_) | Node::Limit(_) | Node::Expr(_) => {}
        Node::SelectItem(item) => {
            if let SelectItem::Expr { expr, .. } = item {
                walk(Node::Expr(expr), visitor);
            }
        }
        Node::TableFactor(factor) => match factor {
            TableFactor::Table(_) => {}
            TableFactor::Derived { query, .. } => walk(Node::Select(query), visitor),
            TableFactor::Parenthesized(inner) => walk_from(inner, visitor),
        },
        Node::Join(join) => {
            walk(Node::TableFactor(&join.factor), visitor);
            walk_all(&join.on, Node::Condition, visitor);
        }
        Node::Condition(cond) => walk(Node::Predicate(&cond.predicate), visitor),
        Node::Predicate(pred) => match pred {
            Predicate::Compare { left, right, .. } => {
                walk(Node::Expr(left), visitor);
                walk(Node::Expr(right), visitor);
            }
            Predicate::In { left, list, .. } => {
                walk(Node::Expr(left), visitor);
                match list {
                    InList::Values(values) => walk_all(values, Node::Expr, visitor),
                    InList::Subquery(q) => walk(Node::Select(q), visitor),
                }
            }
            Predicate::Between {
                left, low, high, ..
            } => {
                walk(Node::Expr(left), visitor);
                walk(Node::Expr(low), visitor);
                walk(Node::Expr(high), visitor);
            }
            Predicate::IsNull { left, .. } => walk(Node::Expr(left), visitor),
            Predicate::Like {
                left,
                pattern,
                escape,
                ..
            } => {
                walk(Node::Expr(left), visitor);
                walk(Node::Expr(pattern), visitor);
                if let Some(esc) = escape {
                    walk(Node::Expr(esc), visitor);
                }
            }
            Predicate::Exists { query, .. } => walk(Node::Select(query), visitor),
            Predicate::Not(inner) => walk(Node::Predicate(inner), visitor),
            Predicate::Group(conditions) => walk_all(conditions, Node::Condition, visitor),
            Predicate::Bare(expr) => walk(Node::Expr(expr), visitor),
        },
        Node::OrderItem(item) => walk(Node::Expr(&item.expr), visitor),
        Node::Assignment(a) => {
            walk(Node::Expr(&a.column), visitor);
            walk(Node::Expr(&a.value), visitor);
        }
    }
}

// ---------------------------------------------------------------------------
// Ready-made visitors
// ---------------------------------------------------------------------------

struct TableTokenCollector {
    tokens: Vec<TableToken>,
}

impl Visitor<'_> for TableTokenCollector {
    fn enter(&mut self, node: Node<'_>) -> Visit {
        // `Statement` wraps a concrete node that carries the same scope.
        if !matches!(node, Node::Statement(_)) {
            if let Some(scope) = node.scope() {
                self.tokens.extend(scope.table_tokens.iter().cloned());
            }
        }
        Visit::Descend
    }
}

/// Every rewrite marker in `stmt` and its nested statements, sorted by
/// start offset with duplicates removed.
#[must_use]
pub fn collect_table_tokens(stmt: &Statement) -> Vec<TableToken> {
    let mut collector = TableTokenCollector { tokens: Vec::new() };
    walk(Node::Statement(stmt), &mut collector);
    let mut tokens = collector.tokens;
    tokens.sort();
    tokens.dedup_by(|a, b| a.start == b.start);
    tokens
}

struct PlaceholderCollector {
    indices: Vec<u32>,
}

impl Visitor<'_> for PlaceholderCollector {
    fn enter(&mut self, node: Node<'_>) -> Visit {
        match node {
            Node::Expr(Expr::Placeholder { index, .. }) => self.indices.push(*index),
            Node::Limit(limit) => {
                for value in [limit.offset, limit.row_count].into_iter().flatten() {
                    if let LimitValue::Placeholder { index, .. } = value {
                        self.indices.push(index);
                    }
                }
            }
            _ => {}
        }
        Visit::Descend
    }
}

/// Indices of placeholders that appear as standalone expression or
/// pagination nodes, in ascending order.
///
/// Placeholders inside opaque spans are counted by the scope's
/// `parameters_index` but have no node of their own.
#[must_use]
pub fn placeholder_indices(stmt: &Statement) -> Vec<u32> {
    let mut collector = PlaceholderCollector {
        indices: Vec::new(),
    };
    walk(Node::Statement(stmt), &mut collector);
    collector.indices.sort_unstable();
    collector.indices
}

/// Number of standalone placeholder nodes (see [`placeholder_indices`]).
#[must_use]
pub fn count_placeholders(stmt: &Statement) -> usize {
    placeholder_indices(stmt).len()
}
