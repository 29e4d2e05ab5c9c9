//! Compiles log queries to parameterized SQLite statements
//!
//! Every value, root paths included, is pushed as a bound parameter. Only
//! column names and operators, which come from fixed tables, become SQL text.

use sqlx::{QueryBuilder, Sqlite};
use syncwatch_core::{root_bounds, Direction, LogQuery, Predicate, Value};

/// Columns selected for every log read, in `row_to_entry` order
pub const ENTRY_COLUMNS: &str = "id, repository_id, event_date, category, event_id, doc_path, \
     doc_uuid, doc_life_cycle, principal_name, extended_info";

/// Builds the `SELECT` for a log query
pub fn build_select(query: &LogQuery) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new("SELECT ");
    builder.push(ENTRY_COLUMNS);
    builder.push(" FROM audit_log WHERE ");
    push_predicate(&mut builder, &query.predicate);

    if !query.order.is_empty() {
        builder.push(" ORDER BY ");
        for (i, key) in query.order.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(key.field.column());
            builder.push(match key.direction {
                Direction::Ascending => " ASC",
                Direction::Descending => " DESC",
            });
        }
    }

    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    builder
}

/// Appends a predicate as a parenthesized boolean expression
pub fn push_predicate(builder: &mut QueryBuilder<'static, Sqlite>, predicate: &Predicate) {
    match predicate {
        Predicate::Always => {
            builder.push("1 = 1");
        }
        Predicate::Compare(field, op, value) => {
            builder.push(field.column());
            builder.push(" ");
            builder.push(op.sql());
            builder.push(" ");
            push_value(builder, value);
        }
        Predicate::In(_, values) if values.is_empty() => {
            builder.push("0 = 1");
        }
        Predicate::In(field, values) => {
            builder.push(field.column());
            builder.push(" IN (");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                push_value(builder, value);
            }
            builder.push(")");
        }
        Predicate::PathUnder(roots) if roots.is_empty() => {
            builder.push("0 = 1");
        }
        Predicate::PathUnder(roots) => {
            builder.push("(");
            for (i, root) in roots.iter().enumerate() {
                if i > 0 {
                    builder.push(" OR ");
                }
                push_path_under(builder, root);
            }
            builder.push(")");
        }
        Predicate::And(parts) => push_joined(builder, parts, " AND ", "1 = 1"),
        Predicate::Or(parts) => push_joined(builder, parts, " OR ", "0 = 1"),
    }
}

fn push_joined(
    builder: &mut QueryBuilder<'static, Sqlite>,
    parts: &[Predicate],
    separator: &str,
    when_empty: &str,
) {
    if parts.is_empty() {
        builder.push(when_empty);
        return;
    }
    builder.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        push_predicate(builder, part);
    }
    builder.push(")");
}

/// `doc_path` is the root or starts with the root followed by a separator.
/// A prefix comparison with `substr` has no wildcard characters to escape.
fn push_path_under(builder: &mut QueryBuilder<'static, Sqlite>, root: &str) {
    let (exact, prefix) = root_bounds(root);
    // substr counts characters, not bytes
    let prefix_len = prefix.chars().count() as i64;

    builder.push("(doc_path = ");
    builder.push_bind(exact.to_string());
    builder.push(" OR substr(doc_path, 1, ");
    builder.push_bind(prefix_len);
    builder.push(") = ");
    builder.push_bind(prefix);
    builder.push(")");
}

fn push_value(builder: &mut QueryBuilder<'static, Sqlite>, value: &Value) {
    match value {
        Value::Integer(v) => {
            builder.push_bind(*v);
        }
        Value::Text(v) => {
            builder.push_bind(v.clone());
        }
        Value::Date(v) => {
            builder.push_bind(v.timestamp_millis());
        }
    }
}
