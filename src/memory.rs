//! # In-Memory Query Backend
//!
//! [`MemoryQuery`] evaluates the query capability over a shared vector of
//! JSON rows. It records conditions, ordering and the window, and evaluates
//! them only when counted or fetched.
//!
//! Lookup semantics follow the Django-style keys parsed by
//! [`Lookup`](crate::lookup::Lookup): nested objects are reached through
//! `__` path segments, arrays along the path match when any element does, and
//! RFC 3339 strings compare chronologically.

use crate::error::StoreError;
use crate::lookup::{Lookup, LookupOp};
use crate::queryable::{OrderDirective, PredicateMap, Queryable};
use async_trait::async_trait;
use chrono::DateTime;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;

pub type Row = Map<String, Value>;

static NULL: Value = Value::Null;

/// A recorded filter or exclusion
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Include(PredicateMap),
    Exclude(PredicateMap),
}

impl Condition {
    fn accepts(&self, row: &Row) -> bool {
        match self {
            Condition::Include(predicates) => all_match(row, predicates),
            Condition::Exclude(predicates) => !all_match(row, predicates),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoryQuery {
    rows: Arc<Vec<Row>>,
    conditions: Vec<Condition>,
    ordering: Vec<OrderDirective>,
    offset: u64,
    limit: Option<u64>,
}

impl MemoryQuery {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows: Arc::new(rows),
            conditions: Vec::new(),
            ordering: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    /// Build from JSON values; anything but objects is skipped
    pub fn from_values(values: Vec<Value>) -> Self {
        Self::new(
            values
                .into_iter()
                .filter_map(|value| match value {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect(),
        )
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn ordering(&self) -> &[OrderDirective] {
        &self.ordering
    }

    pub fn window(&self) -> (u64, Option<u64>) {
        (self.offset, self.limit)
    }

    fn matching(&self) -> Vec<&Row> {
        let mut rows: Vec<&Row> = self
            .rows
            .iter()
            .filter(|row| self.conditions.iter().all(|condition| condition.accepts(row)))
            .collect();

        if !self.ordering.is_empty() {
            let keys: Vec<(Lookup, bool)> = self
                .ordering
                .iter()
                .map(|directive| (Lookup::parse(&directive.field), directive.descending))
                .collect();
            rows.sort_by(|left, right| compare_rows(left, right, &keys));
        }
        rows
    }

    fn windowed(&self) -> Vec<&Row> {
        let skip = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let take = self
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        self.matching().into_iter().skip(skip).take(take).collect()
    }
}

#[async_trait]
impl Queryable for MemoryQuery {
    type Entity = Row;

    fn filter(mut self, predicates: &PredicateMap) -> Self {
        if !predicates.is_empty() {
            self.conditions.push(Condition::Include(predicates.clone()));
        }
        self
    }

    fn exclude(mut self, predicates: &PredicateMap) -> Self {
        if !predicates.is_empty() {
            self.conditions.push(Condition::Exclude(predicates.clone()));
        }
        self
    }

    fn order_by(mut self, directives: &[OrderDirective]) -> Self {
        self.ordering = directives.to_vec();
        self
    }

    fn offset(mut self, skip: u64) -> Self {
        self.offset = skip;
        self
    }

    fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.matching().len() as u64)
    }

    async fn fetch_all(&self) -> Result<Vec<Row>, StoreError> {
        Ok(self.windowed().into_iter().cloned().collect())
    }

    async fn fetch_one_by(&self, key_field: &str, key: &Value) -> Result<Option<Row>, StoreError> {
        let lookup = Lookup::parse(key_field);
        Ok(self
            .matching()
            .into_iter()
            .find(|row| lookup_matches(row, &lookup, key))
            .cloned())
    }
}

fn all_match(row: &Row, predicates: &PredicateMap) -> bool {
    predicates
        .iter()
        .all(|(key, expected)| lookup_matches(row, &Lookup::parse(key), expected))
}

/// Values reachable from `row` along `path`, descending into arrays
fn resolve<'a>(row: &'a Row, path: &[String]) -> Vec<&'a Value> {
    let Some((first, rest)) = path.split_first() else {
        return Vec::new();
    };
    let mut current: Vec<&Value> = row.get(first).into_iter().collect();

    for segment in rest {
        current = current
            .into_iter()
            .flat_map(|value| match value {
                Value::Array(items) => items.iter().filter_map(|item| item.get(segment)).collect(),
                other => other.get(segment).into_iter().collect::<Vec<_>>(),
            })
            .collect();
    }

    // Related collections match through their members
    current
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => std::iter::once(value).chain(items.iter()).collect(),
            other => vec![other],
        })
        .collect()
}

fn lookup_matches(row: &Row, lookup: &Lookup, expected: &Value) -> bool {
    let candidates = resolve(row, &lookup.path);

    match lookup.op {
        LookupOp::IsNull => {
            let is_null = candidates.iter().all(|value| value.is_null());
            expected.as_bool().unwrap_or(true) == is_null
        }
        // `__not` holds when no reachable value equals the expected one
        LookupOp::Not => !candidates.iter().any(|value| values_equal(value, expected)),
        LookupOp::Exact if expected.is_null() => {
            candidates.is_empty() || candidates.iter().any(|value| value.is_null())
        }
        op => candidates.iter().any(|value| compare_op(op, value, expected)),
    }
}

fn compare_op(op: LookupOp, value: &Value, expected: &Value) -> bool {
    match op {
        LookupOp::Exact => values_equal(value, expected),
        LookupOp::In => match expected {
            Value::Array(options) => options.iter().any(|option| values_equal(value, option)),
            single => values_equal(value, single),
        },
        LookupOp::Gt => compare_values(value, expected) == Some(Ordering::Greater),
        LookupOp::Gte => matches!(
            compare_values(value, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        LookupOp::Lt => compare_values(value, expected) == Some(Ordering::Less),
        LookupOp::Lte => matches!(
            compare_values(value, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
        LookupOp::Contains => match (value, expected) {
            (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
            (Value::Array(items), needle) => items.iter().any(|item| values_equal(item, needle)),
            _ => false,
        },
        LookupOp::IContains => match (value, expected) {
            (Value::String(haystack), Value::String(needle)) => {
                haystack.to_lowercase().contains(&needle.to_lowercase())
            }
            _ => false,
        },
        LookupOp::StartsWith => match (value, expected) {
            (Value::String(haystack), Value::String(prefix)) => haystack.starts_with(prefix.as_str()),
            _ => false,
        },
        LookupOp::EndsWith => match (value, expected) {
            (Value::String(haystack), Value::String(suffix)) => haystack.ends_with(suffix.as_str()),
            _ => false,
        },
        LookupOp::Not | LookupOp::IsNull => false,
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(_), _) | (_, Value::Array(_)) | (Value::Object(_), _) => left == right,
        _ => left == right || compare_values(left, right) == Some(Ordering::Equal),
    }
}

/// Ordering between scalar JSON values of compatible kinds
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(left), Value::Bool(right)) => Some(left.cmp(right)),
        (Value::Number(left), Value::Number(right)) => match (left.as_i64(), right.as_i64()) {
            (Some(left), Some(right)) => Some(left.cmp(&right)),
            _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
        },
        (Value::String(left), Value::String(right)) => {
            match (
                DateTime::parse_from_rfc3339(left),
                DateTime::parse_from_rfc3339(right),
            ) {
                (Ok(left), Ok(right)) => Some(left.cmp(&right)),
                _ => Some(left.cmp(right)),
            }
        }
        _ => None,
    }
}

fn compare_rows(left: &Row, right: &Row, keys: &[(Lookup, bool)]) -> Ordering {
    for (lookup, descending) in keys {
        let left_value = resolve(left, &lookup.path).into_iter().next().unwrap_or(&NULL);
        let right_value = resolve(right, &lookup.path).into_iter().next().unwrap_or(&NULL);

        // Nulls sort first ascending
        let ordering = match (left_value.is_null(), right_value.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => compare_values(left_value, right_value).unwrap_or(Ordering::Equal),
        };
        let ordering = if *descending { ordering.reverse() } else { ordering };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
