//! Ordered, copy-on-filter collections with chainable queries.
//!
//! A [`Collection`] maps string keys (canonical page paths, attachment file
//! names) to items, preserving insertion order. Order is significant: it
//! drives iteration, positional lookups (`eq`, `first`, `last`), slicing and
//! the sibling-relative `prev`/`next` of pages.
//!
//! Every query returns a **new** collection; the receiver is never touched.
//! Templates branch several queries off one shared value, so earlier results
//! must stay valid:
//!
//! ```text
//! let blog  = pages.filter("blog/*");
//! let recent = blog.sort_by("date", Order::Desc).limit(5);
//! let hidden = blog.is("drafts");            // `blog` is unchanged
//! ```
//!
//! ## Totality
//!
//! No query fails. Invalid regular expressions, unknown operators,
//! out-of-range indexes and slices all produce an empty result (or `None`
//! for single-item lookups).

use crate::value::{Fields, Value};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

/// An ordered key → item mapping with immutable query chaining.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

/// Later duplicates replace earlier ones in place, as with [`Collection::insert`].
impl<T> FromIterator<(String, T)> for Collection<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut entries: Vec<(String, T)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (key, item) in iter {
            match index.get(&key) {
                Some(&i) => entries[i].1 = item,
                None => {
                    index.insert(key.clone(), entries.len());
                    entries.push((key, item));
                }
            }
        }
        Self { entries }
    }
}

impl<T> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an item. A replaced item keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, item: T) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = item,
            None => self.entries.push((key, item)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Position of `key` in iteration order.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cardinality.
    pub fn count(&self) -> usize {
        self.len()
    }

    /// Alias of [`count`](Self::count).
    pub fn size(&self) -> usize {
        self.len()
    }

    /// 0-based positional lookup. Negative or past-the-end indexes yield `None`.
    pub fn eq(&self, index: isize) -> Option<&T> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.entries.get(i))
            .map(|(_, v)| v)
    }

    pub fn first(&self) -> Option<&T> {
        self.entries.first().map(|(_, v)| v)
    }

    pub fn last(&self) -> Option<&T> {
        self.entries.last().map(|(_, v)| v)
    }
}

impl<T: Clone> Collection<T> {
    /// Keep the entries for which `keep` returns true, in order.
    pub fn select(&self, mut keep: impl FnMut(&str, &T) -> bool) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(k, v)| keep(k, v))
                .cloned()
                .collect(),
        }
    }

    /// Glob filter on the key: `*` matches any run of characters, the rest is
    /// literal, and the whole key must match.
    ///
    /// `filter("blog/*")` keeps every descendant of `blog`; `filter("about")`
    /// keeps only the exact key.
    pub fn filter(&self, pattern: &str) -> Self {
        let anchored = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
        match Regex::new(&anchored) {
            Ok(re) => self.select(|k, _| re.is_match(k)),
            Err(_) => Self::default(),
        }
    }

    /// Keep items whose key matches the (unanchored) regular expression.
    pub fn is(&self, pattern: &str) -> Self {
        match compile(pattern) {
            Some(re) => self.select(|k, _| re.is_match(k)),
            None => Self::default(),
        }
    }

    /// Drop items whose key matches the (unanchored) regular expression.
    pub fn not(&self, pattern: &str) -> Self {
        match compile(pattern) {
            Some(re) => self.select(|k, _| !re.is_match(k)),
            None => Self::default(),
        }
    }

    pub fn reverse(&self) -> Self {
        Self {
            entries: self.entries.iter().rev().cloned().collect(),
        }
    }

    /// Alias of [`reverse`](Self::reverse).
    pub fn flip(&self) -> Self {
        self.reverse()
    }

    /// Array-slice semantics: a negative `offset` counts from the end, a
    /// negative `length` stops that many items before the end, `None` runs to
    /// the end.
    pub fn slice(&self, offset: isize, length: Option<isize>) -> Self {
        let len = self.entries.len() as isize;
        let start = if offset < 0 {
            (len + offset).max(0)
        } else {
            offset.min(len)
        };
        let end = match length {
            None => len,
            Some(n) if n < 0 => len + n,
            Some(n) => start.saturating_add(n).min(len),
        };
        if end <= start {
            return Self::default();
        }
        Self {
            entries: self.entries[start as usize..end as usize].to_vec(),
        }
    }

    pub fn limit(&self, n: usize) -> Self {
        self.slice(0, Some(isize::try_from(n).unwrap_or(isize::MAX)))
    }

    /// Keep every `n`th item (1-based positions `n`, `2n`, …).
    /// `n` outside `1..len` yields an empty collection.
    pub fn nth(&self, n: isize) -> Self {
        let Ok(step) = usize::try_from(n) else {
            return Self::default();
        };
        if step == 0 || step >= self.entries.len() {
            return Self::default();
        }
        Self {
            entries: self
                .entries
                .iter()
                .enumerate()
                .filter(|(i, _)| (i + 1) % step == 0)
                .map(|(_, e)| e.clone())
                .collect(),
        }
    }
}

impl<T: Clone + Fields> Collection<T> {
    /// Equality filter on a field; shorthand for `filter_with(key, "=", value, false)`.
    pub fn filter_eq(&self, key: &str, value: &str) -> Self {
        self.filter_with(key, "=", value, false)
    }

    /// Field filter.
    ///
    /// An item survives only when its `key` field is present and truthy and
    /// the comparison holds. See [`Operator`] for the accepted operators; an
    /// unrecognized operator yields an empty collection.
    pub fn filter_with(&self, key: &str, operator: &str, value: &str, case_insensitive: bool) -> Self {
        let Ok(op) = operator.parse::<Operator>() else {
            tracing::debug!(operator, "unknown filter operator");
            return Self::default();
        };
        self.select(|_, item| {
            item.field(key)
                .filter(Value::is_truthy)
                .is_some_and(|field| op.matches(&field, value, case_insensitive))
        })
    }

    /// Stable sort by the text form of a field. Missing fields sort as empty.
    pub fn sort_by(&self, key: &str, order: Order) -> Self {
        let mut keyed: Vec<(String, (String, T))> = self
            .entries
            .iter()
            .map(|entry| {
                let text = entry
                    .1
                    .field(key)
                    .map(|v| v.as_text().into_owned())
                    .unwrap_or_default();
                (text, entry.clone())
            })
            .collect();
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        if order == Order::Desc {
            keyed.reverse();
        }
        Self {
            entries: keyed.into_iter().map(|(_, e)| e).collect(),
        }
    }

    /// Alias of [`sort_by`](Self::sort_by).
    pub fn order_by(&self, key: &str, order: Order) -> Self {
        self.sort_by(key, order)
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::debug!(pattern, error = %e, "invalid key pattern");
            None
        }
    }
}

/// Comparison operators accepted by [`Collection::filter_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `*=`
    Contains,
    /// `^=`
    StartsWith,
    /// `$=`
    EndsWith,
    /// `=`, `==`, `===`
    Equal,
    /// `!=`, `<>`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessOrEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterOrEqual,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "*=" => Operator::Contains,
            "^=" => Operator::StartsWith,
            "$=" => Operator::EndsWith,
            "=" | "==" | "===" => Operator::Equal,
            "!=" | "<>" => Operator::NotEqual,
            "<" => Operator::Less,
            "<=" => Operator::LessOrEqual,
            ">" => Operator::Greater,
            ">=" => Operator::GreaterOrEqual,
            other => return Err(UnknownOperator(other.to_string())),
        })
    }
}

impl Operator {
    /// Apply the operator to a field value and a query operand.
    ///
    /// Pattern operators work on the text form and honor `case_insensitive`;
    /// ordering operators use [`Value::compare`].
    pub fn matches(self, field: &Value, operand: &str, case_insensitive: bool) -> bool {
        let text = field.as_text();
        let (haystack, needle) = if case_insensitive {
            (text.to_lowercase(), operand.to_lowercase())
        } else {
            (text.into_owned(), operand.to_string())
        };
        match self {
            Operator::Contains => haystack.contains(&needle),
            Operator::StartsWith => haystack.starts_with(&needle),
            Operator::EndsWith => haystack.ends_with(&needle),
            Operator::Equal => haystack == needle,
            Operator::NotEqual => haystack != needle,
            Operator::Less => field.compare(operand) == Ordering::Less,
            Operator::LessOrEqual => field.compare(operand) != Ordering::Greater,
            Operator::Greater => field.compare(operand) == Ordering::Greater,
            Operator::GreaterOrEqual => field.compare(operand) != Ordering::Less,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            other => Err(format!("unknown sort order: {other}")),
        }
    }
}
