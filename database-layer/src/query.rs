//! Filters and find options shared by every store back-end
//!
//! Fields are addressed by dotted paths into the serialized document
//! (`"reservationFee.paid"`). The in-memory store evaluates conditions
//! directly against `serde_json::Value`; the PostgreSQL store translates the
//! same conditions into JSONB path expressions.

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// A single predicate over one document field
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { field: String, value: Value },
    In { field: String, values: Vec<Value> },
    /// Array field holds `value` among its elements
    Contains { field: String, value: Value },
    Gte { field: String, value: Value },
    Lte { field: String, value: Value },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Eq { field, .. }
            | Condition::In { field, .. }
            | Condition::Contains { field, .. }
            | Condition::Gte { field, .. }
            | Condition::Lte { field, .. } => field,
        }
    }

    fn matches(&self, document: &Value) -> bool {
        let actual = lookup(document, self.field()).unwrap_or(&Value::Null);
        match self {
            Condition::Eq { value, .. } => values_equal(actual, value),
            Condition::In { values, .. } => values.iter().any(|v| values_equal(actual, v)),
            Condition::Contains { value, .. } => actual
                .as_array()
                .is_some_and(|items| items.iter().any(|item| values_equal(item, value))),
            Condition::Gte { value, .. } => matches!(
                compare_values(actual, value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Condition::Lte { value, .. } => matches!(
                compare_values(actual, value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Conjunction of conditions; an empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq<V: Serialize>(mut self, field: &str, value: V) -> Self {
        self.conditions.push(Condition::Eq {
            field: field.to_string(),
            value: to_value(value),
        });
        self
    }

    /// Add an equality condition only if `value` is `Some`
    pub fn eq_opt<V: Serialize>(self, field: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    pub fn is_in<V: Serialize>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.conditions.push(Condition::In {
            field: field.to_string(),
            values: values.into_iter().map(to_value).collect(),
        });
        self
    }

    /// Add an array-membership condition only if `value` is `Some`
    pub fn contains_opt<V: Serialize>(mut self, field: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.conditions.push(Condition::Contains {
                field: field.to_string(),
                value: to_value(value),
            });
        }
        self
    }

    pub fn gte_opt<V: Serialize>(mut self, field: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.conditions.push(Condition::Gte {
                field: field.to_string(),
                value: to_value(value),
            });
        }
        self
    }

    pub fn lte_opt<V: Serialize>(mut self, field: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.conditions.push(Condition::Lte {
                field: field.to_string(),
                value: to_value(value),
            });
        }
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(document))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Ordering and windowing for `find`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Vec<(String, SortOrder)>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort_asc(mut self, field: &str) -> Self {
        self.sort.push((field.to_string(), SortOrder::Ascending));
        self
    }

    pub fn sort_desc(mut self, field: &str) -> Self {
        self.sort.push((field.to_string(), SortOrder::Descending));
        self
    }

    /// Window for a 1-based page of `page_size` documents
    pub fn page(mut self, page: u32, page_size: u32) -> Self {
        self.skip = u64::from(page.saturating_sub(1)) * u64::from(page_size);
        self.limit = Some(u64::from(page_size));
        self
    }

    /// Compare two documents by the configured sort keys
    pub fn compare(&self, left: &Value, right: &Value) -> Ordering {
        for (field, order) in &self.sort {
            let a = lookup(left, field).unwrap_or(&Value::Null);
            let b = lookup(right, field).unwrap_or(&Value::Null);
            let ordering = compare_values(a, b).unwrap_or_else(|| null_last(a, b));
            let ordering = match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Split a dotted field path into its segments
pub fn path_segments(field: &str) -> Vec<String> {
    field.split('.').map(str::to_string).collect()
}

fn lookup<'a>(document: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

fn to_value<V: Serialize>(value: V) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn null_last(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        _ => Ordering::Equal,
    }
}
