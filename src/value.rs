//! Typed field access shared by pages and attachments.
//!
//! Query operations address items by field name (`filter_with("author",
//! "^=", "J", false)`, `sort_by("date", Order::Asc)`). Rather than
//! dispatching on method names at runtime, every queryable type implements
//! [`Fields`], a single lookup returning an optional [`Value`].

use serde::Serialize;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// A field value as seen by the query engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl Value {
    /// Falsy values drop an item from every field filter:
    /// `""`, `"0"`, `0` and `false`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Text(s) => !s.is_empty() && s != "0",
            Value::Int(n) => *n != 0,
            Value::Bool(b) => *b,
        }
    }

    /// String form used by pattern operators and sorting.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Text(s) => Cow::Borrowed(s),
            Value::Int(n) => Cow::Owned(n.to_string()),
            Value::Bool(true) => Cow::Borrowed("1"),
            Value::Bool(false) => Cow::Borrowed(""),
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            Value::Text(s) => parse_number(s),
            Value::Int(n) => Some(*n as f64),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        }
    }

    /// Compare against a query operand: numerically when both sides are
    /// numeric, lexically otherwise.
    pub fn compare(&self, operand: &str) -> Ordering {
        match (self.as_number(), parse_number(operand)) {
            (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            _ => self.as_text().as_ref().cmp(operand),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Named field lookup. Keys are matched case-insensitively by implementors.
pub trait Fields {
    fn field(&self, key: &str) -> Option<Value>;
}

impl<T: Fields + ?Sized> Fields for Rc<T> {
    fn field(&self, key: &str) -> Option<Value> {
        (**self).field(key)
    }
}

impl<T: Fields + ?Sized> Fields for &T {
    fn field(&self, key: &str) -> Option<Value> {
        (**self).field(key)
    }
}
