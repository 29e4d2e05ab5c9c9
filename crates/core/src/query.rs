//! Structured log queries
//!
//! A [`LogQuery`] is a predicate tree plus a sort order and an optional result
//! cap. Backends either evaluate the tree directly (memory) or compile it to a
//! parameterized statement (SQLite). Path and id values always travel as data,
//! never as query text.
//!
//! Comparisons against a field the entry does not carry (for example
//! `doc_path` on a root registration without a document) are false for every
//! operator, `Ne` included, matching SQL `NULL` semantics.

use crate::types::{is_under_root, LogEntry};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Queryable columns of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    RepositoryId,
    EventDate,
    Category,
    EventId,
    DocPath,
    DocUuid,
    DocLifeCycle,
}

impl Field {
    /// Column name used by relational backends
    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::RepositoryId => "repository_id",
            Self::EventDate => "event_date",
            Self::Category => "category",
            Self::EventId => "event_id",
            Self::DocPath => "doc_path",
            Self::DocUuid => "doc_uuid",
            Self::DocLifeCycle => "doc_life_cycle",
        }
    }
}

/// A literal compared against a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Text(String),
    Date(DateTime<Utc>),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// SQL spelling of the operator
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    fn holds(&self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Ne => ordering != Ordering::Equal,
            Self::Lt => ordering == Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
            Self::Gt => ordering == Ordering::Greater,
            Self::Ge => ordering != Ordering::Less,
        }
    }
}

/// Boolean expression over log entry fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every entry
    Always,
    /// `field <op> value`
    Compare(Field, CompareOp, Value),
    /// `field` equals one of the values
    In(Field, Vec<Value>),
    /// `doc_path` equals one of the roots or lies below it
    PathUnder(Vec<String>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: Field, value: impl Into<Value>) -> Self {
        Self::Compare(field, CompareOp::Eq, value.into())
    }

    pub fn ne(field: Field, value: impl Into<Value>) -> Self {
        Self::Compare(field, CompareOp::Ne, value.into())
    }

    pub fn lt(field: Field, value: impl Into<Value>) -> Self {
        Self::Compare(field, CompareOp::Lt, value.into())
    }

    pub fn le(field: Field, value: impl Into<Value>) -> Self {
        Self::Compare(field, CompareOp::Le, value.into())
    }

    pub fn gt(field: Field, value: impl Into<Value>) -> Self {
        Self::Compare(field, CompareOp::Gt, value.into())
    }

    pub fn ge(field: Field, value: impl Into<Value>) -> Self {
        Self::Compare(field, CompareOp::Ge, value.into())
    }

    /// Membership test; an empty value list matches nothing
    pub fn is_in<I, V>(field: Field, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In(field, values.into_iter().map(Into::into).collect())
    }

    /// Conjunction, flattening nested `And`s
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::Always, p) | (p, Self::Always) => p,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), p) => {
                left.push(p);
                Self::And(left)
            }
            (p, Self::And(mut right)) => {
                right.insert(0, p);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// Disjunction, flattening nested `Or`s
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), p) => {
                left.push(p);
                Self::Or(left)
            }
            (p, Self::Or(mut right)) => {
                right.insert(0, p);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }

    /// Evaluates the predicate against an entry
    pub fn matches(&self, entry: &LogEntry) -> bool {
        match self {
            Self::Always => true,
            Self::Compare(field, op, value) => field_value(entry, *field)
                .and_then(|actual| actual.compare(value))
                .is_some_and(|ordering| op.holds(ordering)),
            Self::In(field, values) => field_value(entry, *field).is_some_and(|actual| {
                values
                    .iter()
                    .any(|v| actual.compare(v) == Some(Ordering::Equal))
            }),
            Self::PathUnder(roots) => entry
                .doc_path
                .as_deref()
                .is_some_and(|path| roots.iter().any(|root| is_under_root(path, root))),
            Self::And(parts) => parts.iter().all(|p| p.matches(entry)),
            Self::Or(parts) => parts.iter().any(|p| p.matches(entry)),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// One key of a multi-key sort
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: Field,
    pub direction: Direction,
}

impl SortKey {
    pub fn asc(field: Field) -> Self {
        Self {
            field,
            direction: Direction::Ascending,
        }
    }

    pub fn desc(field: Field) -> Self {
        Self {
            field,
            direction: Direction::Descending,
        }
    }
}

/// A filtered, sorted, optionally capped read of the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub predicate: Predicate,
    pub order: Vec<SortKey>,
    pub limit: Option<usize>,
}

impl LogQuery {
    /// Creates an unsorted, uncapped query
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            order: Vec::new(),
            limit: None,
        }
    }

    /// Appends a sort key
    pub fn order_by(mut self, key: SortKey) -> Self {
        self.order.push(key);
        self
    }

    /// Caps the number of returned entries
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Orders two entries by this query's sort keys
    ///
    /// Missing values sort before present ones in ascending order, as SQL
    /// `NULL`s do.
    pub fn compare(&self, a: &LogEntry, b: &LogEntry) -> Ordering {
        for key in &self.order {
            let ordering = match (field_value(a, key.field), field_value(b, key.field)) {
                (Some(x), Some(y)) => x.cmp_same(&y),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            let ordering = match key.direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Runs the query over an in-memory slice of entries
    pub fn apply<'a, I>(&self, entries: I) -> Vec<LogEntry>
    where
        I: IntoIterator<Item = &'a LogEntry>,
    {
        let mut matched: Vec<LogEntry> = entries
            .into_iter()
            .filter(|e| self.predicate.matches(e))
            .cloned()
            .collect();
        matched.sort_by(|a, b| self.compare(a, b));
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// Borrowed view of a field's value on one entry
#[derive(Debug, Clone, Copy)]
enum FieldRef<'a> {
    Integer(i64),
    Text(&'a str),
    Date(DateTime<Utc>),
}

impl FieldRef<'_> {
    fn compare(&self, value: &Value) -> Option<Ordering> {
        match (self, value) {
            (Self::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Self::Text(a), Value::Text(b)) => Some((*a).cmp(b.as_str())),
            (Self::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn cmp_same(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

fn field_value(entry: &LogEntry, field: Field) -> Option<FieldRef<'_>> {
    match field {
        Field::Id => Some(FieldRef::Integer(entry.id)),
        Field::RepositoryId => Some(FieldRef::Text(&entry.repository_id)),
        Field::EventDate => Some(FieldRef::Date(entry.event_date)),
        Field::Category => Some(FieldRef::Text(&entry.category)),
        Field::EventId => Some(FieldRef::Text(&entry.event_id)),
        Field::DocPath => entry.doc_path.as_deref().map(FieldRef::Text),
        Field::DocUuid => entry.doc_uuid.as_deref().map(FieldRef::Text),
        Field::DocLifeCycle => entry.doc_life_cycle.as_deref().map(FieldRef::Text),
    }
}
