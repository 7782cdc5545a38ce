//! End-to-end contract between the parsing engine and a shard rewriter.
//!
//! Every statement here goes through [`SqlParsingEngine`], the same entry
//! point a router uses, and the assertions are on what the rewriter consumes:
//! marker offsets, logical table names, placeholder indices and verbatim
//! opaque spans.

use std::sync::Arc;

use shardsql::ast::{
    Expr, InsertSource, LimitValue, NumberValue, Predicate, SelectItem, TableFactor,
};
use shardsql::{DatabaseType, KnownTables, ParserConfig, SqlParsingEngine, Statement, TokenKind};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

fn engine(dialect: DatabaseType) -> SqlParsingEngine {
    init_tracing();
    SqlParsingEngine::new(
        ParserConfig::new(dialect),
        Arc::new(KnownTables::new(["orders", "t_order", "t_order_item"])),
    )
}

fn markers(parsed: &shardsql::ParsedStatement) -> Vec<(u32, &str, &str)> {
    parsed
        .table_tokens
        .iter()
        .map(|t| (t.start, t.literal.as_str(), t.table.as_str()))
        .collect()
}

// ─── Lexical properties ────────────────────────────────────────────────

#[test]
fn numeric_literals_decode() {
    let tokens = engine(DatabaseType::MySql)
        .tokenize("SELECT 123, 12.5, 0x1F, -5")
        .unwrap();
    assert_eq!(tokens[1].kind, TokenKind::IntLiteral);
    assert_eq!(tokens[1].int_value(), Some(123));
    assert_eq!(tokens[3].kind, TokenKind::FloatLiteral);
    assert_eq!(tokens[3].float_value(), Some(12.5));
    assert_eq!(tokens[5].kind, TokenKind::HexLiteral);
    assert_eq!(tokens[5].int_value(), Some(31));
    assert_eq!(tokens[7].kind, TokenKind::IntLiteral);
    assert_eq!(tokens[7].int_value(), Some(-5));
    assert_eq!(tokens[8].kind, TokenKind::End);
}

#[test]
fn doubled_quote_decodes_to_one_quote() {
    let parsed = engine(DatabaseType::Standard).parse("SELECT 'a''b'").unwrap();
    let Statement::Select(select) = &parsed.statement else {
        panic!("expected SELECT");
    };
    match &select.items[0] {
        SelectItem::Expr {
            expr: Expr::Text { value, .. },
            ..
        } => assert_eq!(value, "a'b"),
        other => panic!("{other:?}"),
    }
}

#[test]
fn token_texts_reproduce_significant_input() {
    let sql = "SELECT o.id /* note */ FROM orders o -- tail\n WHERE o.id = ?";
    let tokens = engine(DatabaseType::MySql).tokenize(sql).unwrap();
    let joined: Vec<&str> = tokens.iter().map(|t| t.text).filter(|t| !t.is_empty()).collect();
    assert_eq!(
        joined.join(" "),
        "SELECT o . id FROM orders o WHERE o . id = ?"
    );
    for pair in tokens.windows(2) {
        assert!(pair[0].span.end <= pair[1].span.start);
    }
}

#[test]
fn unterminated_string_is_lexical() {
    let err = engine(DatabaseType::MySql)
        .parse("SELECT * FROM orders WHERE note = 'open")
        .unwrap_err();
    assert!(err.is_lexical());
    assert_eq!(err.offset(), 34);
}

#[test]
fn unterminated_block_comment_is_lexical() {
    let err = engine(DatabaseType::Standard)
        .parse("SELECT 1 /* never closed")
        .unwrap_err();
    assert!(err.is_lexical());
}

// ─── Rewrite markers ───────────────────────────────────────────────────

#[test]
fn property_in_where_marks_alias_owner() {
    let parsed = engine(DatabaseType::MySql)
        .parse("SELECT o.id FROM orders o WHERE o.id = ?")
        .unwrap();
    assert_eq!(
        markers(&parsed),
        vec![(7, "o", "orders"), (17, "orders", "orders"), (32, "o", "orders")]
    );

    let Statement::Select(select) = &parsed.statement else {
        panic!("expected SELECT");
    };
    assert_eq!(select.scope.table_names().collect::<Vec<_>>(), vec!["orders"]);
    let predicate = &select.where_clause.as_ref().unwrap().conditions[0].predicate;
    match predicate {
        Predicate::Compare {
            left: Expr::Property { owner, member, .. },
            right: Expr::Placeholder { index: 0, .. },
            ..
        } => {
            assert_eq!(owner.name, "o");
            assert_eq!(member, "id");
        }
        other => panic!("{other:?}"),
    }
    match predicate {
        Predicate::Compare { left, .. } => assert_eq!(left.column_name(), Some("id")),
        other => panic!("{other:?}"),
    }
}

#[test]
fn nested_statements_contribute_markers_in_source_order() {
    let sql = "SELECT t.name FROM shop.t_order t WHERE t.id IN \
               (SELECT order_id FROM t_order_item WHERE price > ?) \
               ORDER BY t.created DESC LIMIT ?, ?";
    let parsed = engine(DatabaseType::MySql).parse(sql).unwrap();
    let starts: Vec<u32> = parsed.table_tokens.iter().map(|t| t.start).collect();
    assert_eq!(starts, vec![7, 24, 40, 70, 109]);
    for pair in parsed.table_tokens.windows(2) {
        assert!(!pair[0].span().overlaps(pair[1].span()));
    }
    assert_eq!(parsed.logical_tables(), vec!["t_order", "t_order_item"]);
    assert_eq!(parsed.parameters_count(), 3);

    let Statement::Select(select) = &parsed.statement else {
        panic!("expected SELECT");
    };
    let limit = select.limit.as_ref().unwrap();
    assert!(matches!(limit.offset, Some(LimitValue::Placeholder { index: 1, .. })));
    assert!(matches!(limit.row_count, Some(LimitValue::Placeholder { index: 2, .. })));
}

#[test]
fn unknown_tables_get_no_markers() {
    let parsed = engine(DatabaseType::MySql)
        .parse("SELECT a.x FROM audit_log a JOIN orders o ON a.order_id = o.id")
        .unwrap();
    let literals: Vec<&str> = parsed.table_tokens.iter().map(|t| t.literal.as_str()).collect();
    assert_eq!(literals, vec!["orders", "o"]);
}

#[test]
fn sql_server_brackets_and_hints() {
    let parsed = engine(DatabaseType::SqlServer)
        .parse("SELECT TOP 10 * FROM [orders] WITH (NOLOCK) WHERE [orders].id = @id")
        .unwrap();
    let found: Vec<(u32, &str)> = parsed
        .table_tokens
        .iter()
        .map(|t| (t.start, t.table.as_str()))
        .collect();
    assert_eq!(found, vec![(21, "orders"), (50, "orders")]);

    let Statement::Select(select) = &parsed.statement else {
        panic!("expected SELECT");
    };
    let limit = select.limit.as_ref().unwrap();
    assert!(matches!(limit.row_count, Some(LimitValue::Literal { value: 10, .. })));
}

#[test]
fn derived_table_markers_are_transitive() {
    let parsed = engine(DatabaseType::MySql)
        .parse("SELECT d.total FROM (SELECT SUM(amount) total FROM orders WHERE user_id = ?) d")
        .unwrap();
    let literals: Vec<&str> = parsed.table_tokens.iter().map(|t| t.literal.as_str()).collect();
    assert_eq!(literals, vec!["orders"]);
    assert_eq!(parsed.parameters_count(), 1);

    let Statement::Select(select) = &parsed.statement else {
        panic!("expected SELECT");
    };
    let from = select.from.as_ref().unwrap();
    assert!(matches!(
        &from.sources[0].factor,
        TableFactor::Derived { alias: Some(a), .. } if a == "d"
    ));
}

// ─── Expressions and placeholders ──────────────────────────────────────

#[test]
fn composite_expression_keeps_verbatim_text() {
    let sql = "SELECT DATE(create_time) + 1 FROM orders";
    let parsed = engine(DatabaseType::MySql).parse(sql).unwrap();
    let Statement::Select(select) = &parsed.statement else {
        panic!("expected SELECT");
    };
    match &select.items[0] {
        SelectItem::Expr {
            expr: Expr::Opaque { text, span },
            alias: None,
        } => {
            assert_eq!(text, "DATE(create_time) + 1");
            assert_eq!(span.slice(sql), Some("DATE(create_time) + 1"));
        }
        other => panic!("{other:?}"),
    }
}

#[test]
fn insert_placeholders_follow_source_order() {
    let parsed = engine(DatabaseType::MySql)
        .parse("INSERT INTO t_order (order_id, user_id, status) VALUES (?, ?, ?)")
        .unwrap();
    assert_eq!(parsed.parameters_count(), 3);
    let Statement::Insert(insert) = &parsed.statement else {
        panic!("expected INSERT");
    };
    let InsertSource::Values(rows) = &insert.source else {
        panic!("expected VALUES");
    };
    let indices: Vec<u32> = rows[0]
        .values
        .iter()
        .filter_map(|e| match e {
            Expr::Placeholder { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn numeric_where_operand() {
    let parsed = engine(DatabaseType::MySql)
        .parse("DELETE FROM orders WHERE id = 42")
        .unwrap();
    let Statement::Delete(delete) = &parsed.statement else {
        panic!("expected DELETE");
    };
    match &delete.where_clause.as_ref().unwrap().conditions[0].predicate {
        Predicate::Compare {
            right: Expr::Number {
                value: NumberValue::Integer(42),
                ..
            },
            ..
        } => {}
        other => panic!("{other:?}"),
    }
}

// ─── Aliases ───────────────────────────────────────────────────────────

#[test]
fn table_alias_forms() {
    let engine = engine(DatabaseType::MySql);
    let parsed = engine.parse("SELECT * FROM t1 AS x").unwrap();
    let Statement::Select(select) = &parsed.statement else {
        panic!("expected SELECT");
    };
    let from = select.from.as_ref().unwrap();
    assert!(matches!(
        &from.sources[0].factor,
        TableFactor::Table(t) if t.name == "t1" && t.alias.as_deref() == Some("x")
    ));

    let parsed = engine.parse("SELECT * FROM t1 AS , t2").unwrap();
    let Statement::Select(select) = &parsed.statement else {
        panic!("expected SELECT");
    };
    let from = select.from.as_ref().unwrap();
    assert_eq!(from.sources.len(), 2);
    assert!(
        from.sources
            .iter()
            .all(|s| matches!(&s.factor, TableFactor::Table(t) if t.alias.is_none()))
    );
}

// ─── Rewriting ─────────────────────────────────────────────────────────

#[test]
fn rewrite_leaves_everything_else_untouched() {
    let sql = "UPDATE t_order SET status = 'done' WHERE order_id = ? AND note = 't_order'";
    let parsed = engine(DatabaseType::MySql).parse(sql).unwrap();
    let rewritten = parsed.rewrite(|t| Some(format!("{}_7", t.table)));
    assert_eq!(
        rewritten,
        "UPDATE t_order_7 SET status = 'done' WHERE order_id = ? AND note = 't_order'"
    );
}

#[test]
fn parsing_twice_is_identical() {
    let sql = "SELECT o.id, COUNT(*) c FROM orders o WHERE o.status IN (?, ?) GROUP BY o.id";
    let first = engine(DatabaseType::MySql).parse(sql).unwrap();
    let second = engine(DatabaseType::MySql).parse(sql).unwrap();
    assert_eq!(first, second);
}

// ─── Rejections ────────────────────────────────────────────────────────

#[test]
fn unsupported_and_malformed_statements_are_syntax_errors() {
    let engine = engine(DatabaseType::MySql);
    for sql in [
        "SELECT id FROM orders UNION SELECT id FROM t_order",
        "SELECT * FROM orders WHERE (id = 1",
        "SELECT * FROM orders extra garbage here",
        "GRANT ALL ON orders TO bob",
    ] {
        let err = engine.parse(sql).unwrap_err();
        assert!(err.is_syntax(), "{sql}: {err}");
    }
}

#[test]
fn nesting_depth_is_bounded() {
    let config = ParserConfig {
        max_nesting_depth: 4,
        ..ParserConfig::new(DatabaseType::MySql)
    };
    let engine = SqlParsingEngine::new(config, Arc::new(KnownTables::new(["orders"])));
    let mut sql = String::from("SELECT * FROM orders WHERE ");
    sql.push_str(&"(".repeat(10));
    sql.push_str("id = 1");
    sql.push_str(&")".repeat(10));
    let err = engine.parse(&sql).unwrap_err();
    assert!(err.is_syntax());
}

#[test]
fn interval_prefix_chain_is_bounded() {
    let engine = SqlParsingEngine::new(
        ParserConfig::new(DatabaseType::MySql),
        Arc::new(KnownTables::new(["orders"])),
    );
    let sql = format!("SELECT {}1 FROM orders", "INTERVAL ".repeat(200_000));
    let err = engine.parse(&sql).unwrap_err();
    assert!(err.is_syntax());
    assert!(err.detail().contains("nesting depth"));
}

#[test]
fn minus_after_case_end_parses() {
    let engine = SqlParsingEngine::new(
        ParserConfig::new(DatabaseType::MySql),
        Arc::new(KnownTables::new(["orders"])),
    );
    let sql = "SELECT CASE WHEN qty > 0 THEN 1 ELSE 0 END -1 AS flag FROM orders";
    let parsed = engine.parse(sql).unwrap();
    assert_eq!(
        parsed.rewrite(|t| Some(format!("{}_0", t.table))),
        "SELECT CASE WHEN qty > 0 THEN 1 ELSE 0 END -1 AS flag FROM orders_0"
    );
}
