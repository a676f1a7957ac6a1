//! The abstract query capability every backend implements.
//!
//! Query values are consumed and returned by each operation, so a previous
//! step can never be mutated behind a caller's back. Only `count` and the
//! fetch operations touch the store.

use crate::error::StoreError;
use crate::schema::FilterField;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Predicate key (Django-style lookup) to bound value
pub type PredicateMap = BTreeMap<String, Value>;

/// Prefix marking a descending ordering token
pub const DESCENDING_MARKER: char = '-';

/// One `ORDER BY` entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderDirective {
    pub field: String,
    pub descending: bool,
}

impl OrderDirective {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    pub fn new(field: impl Into<String>, descending: bool) -> Self {
        Self {
            field: field.into(),
            descending,
        }
    }

    /// Parse `id` / `-id`
    pub fn parse(token: &str) -> Self {
        match token.strip_prefix(DESCENDING_MARKER) {
            Some(field) => Self::desc(field),
            None => Self::asc(token),
        }
    }

    pub fn parse_all<S: AsRef<str>>(tokens: &[S]) -> Vec<Self> {
        tokens.iter().map(|token| Self::parse(token.as_ref())).collect()
    }
}

impl fmt::Display for OrderDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "{DESCENDING_MARKER}{}", self.field)
        } else {
            write!(f, "{}", self.field)
        }
    }
}

#[async_trait]
pub trait Queryable: Clone + Send + Sync + Sized + 'static {
    type Entity: Send;

    /// Keep rows matching all predicates
    fn filter(self, predicates: &PredicateMap) -> Self;

    /// Drop rows matching all predicates
    fn exclude(self, predicates: &PredicateMap) -> Self;

    /// Replace the current ordering
    fn order_by(self, directives: &[OrderDirective]) -> Self;

    fn offset(self, skip: u64) -> Self;

    fn limit(self, limit: u64) -> Self;

    /// Declared types of the fields about to be filtered on. Backends that
    /// encode values per column type record them; others ignore them.
    fn with_field_types(self, _fields: &[FilterField]) -> Self {
        self
    }

    /// Rows matched by the query, ignoring any offset/limit window
    async fn count(&self) -> Result<u64, StoreError>;

    async fn fetch_all(&self) -> Result<Vec<Self::Entity>, StoreError>;

    /// First row whose `key_field` equals `key`, ignoring any window
    async fn fetch_one_by(
        &self,
        key_field: &str,
        key: &Value,
    ) -> Result<Option<Self::Entity>, StoreError>;
}
