//! Request-scoped parameters and response side channel.

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Already type-validated request parameters keyed by their request name
/// (alias), e.g. `id[]`, `created_at__gte!`, `page`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    values: HashMap<String, Value>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Integer parameter, `None` when absent or not an integer
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.values.get(key).and_then(Value::as_i64)
    }

    /// List of strings, used for `ordering[]`
    pub fn get_str_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(single)) => vec![single.clone()],
            _ => Vec::new(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ParameterMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Response metadata written by stages, surfaced by the caller as headers
pub type ResponseHeaders = BTreeMap<String, String>;

/// Everything a stage may read or write for one request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub params: ParameterMap,
    pub headers: ResponseHeaders,
}

impl RequestContext {
    pub fn new(params: ParameterMap) -> Self {
        Self {
            params,
            headers: ResponseHeaders::new(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}
