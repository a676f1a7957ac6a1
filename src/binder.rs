//! # Parameter Binder
//!
//! Turns raw, URL-decoded `(key, value)` request pairs into a typed
//! [`ParameterMap`]. Only declared parameters are bound: filter schema keys
//! (plain and negated), the ordering list and the pagination pair. Every
//! coercion failure is collected and reported together with its location, so
//! stages only ever see well-typed values.

use crate::error::{
    LocSegment, QuerysetError, Result, ValidationError, ERROR_BOOL, ERROR_DATETIME, ERROR_FLOAT,
    ERROR_INTEGER,
};
use crate::params::ParameterMap;
use crate::schema::{FieldType, FilterSchema};
use crate::stages::pagination::{ensure_at_least_one, PAGE_PARAM, PER_PAGE_PARAM};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{Number, Value};
use std::collections::HashMap;
use tracing::{debug, warn};

const LOCATION: &str = "query";

#[derive(Debug, Clone, PartialEq)]
struct DeclaredParam {
    key: String,
    field_type: FieldType,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterBinder {
    declared: Vec<DeclaredParam>,
    ordering_param: Option<String>,
    paginated: bool,
}

impl ParameterBinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare every request key of `schema`
    pub fn schema(mut self, schema: &FilterSchema) -> Self {
        for field in schema.fields() {
            self.declared.push(DeclaredParam {
                key: field.request_key().to_string(),
                field_type: field.field_type.clone(),
            });
        }
        self
    }

    /// Declare a list-valued ordering parameter such as `ordering[]`
    pub fn ordering(mut self, param: impl Into<String>) -> Self {
        self.ordering_param = Some(param.into());
        self
    }

    /// Declare `page` and `per_page`
    pub fn pagination(mut self) -> Self {
        self.paginated = true;
        self
    }

    pub fn bind<I, K, V>(&self, pairs: I) -> Result<ParameterMap>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut raw: HashMap<String, Vec<String>> = HashMap::new();
        for (key, value) in pairs {
            raw.entry(key.as_ref().to_string())
                .or_default()
                .push(value.as_ref().to_string());
        }

        let mut params = ParameterMap::new();
        let mut errors = Vec::new();

        for declared in &self.declared {
            let Some(values) = raw.get(&declared.key) else {
                continue;
            };
            match bind_declared(&declared.key, &declared.field_type, values) {
                Ok(value) => params.insert(declared.key.clone(), value),
                Err(mut failures) => errors.append(&mut failures),
            }
        }

        if let Some(ordering_param) = &self.ordering_param {
            if let Some(values) = raw.get(ordering_param) {
                let tokens: Vec<Value> = values.iter().cloned().map(Value::String).collect();
                params.insert(ordering_param.clone(), Value::Array(tokens));
            }
        }

        if self.paginated {
            for key in [PAGE_PARAM, PER_PAGE_PARAM] {
                let Some(raw_value) = raw.get(key).and_then(|values| values.last()) else {
                    continue;
                };
                let loc = vec![LocSegment::from(LOCATION), LocSegment::from(key)];
                let bound = coerce(raw_value, &FieldType::Integer, loc.clone()).and_then(|value| {
                    let number = value.as_i64().unwrap_or_default();
                    ensure_at_least_one(number, loc).map(|_| value)
                });
                match bound {
                    Ok(value) => params.insert(key, value),
                    Err(error) => errors.push(error),
                }
            }
        }

        if errors.is_empty() {
            debug!(bound = params.len(), "Request parameters bound");
            Ok(params)
        } else {
            warn!(failures = errors.len(), "Request parameters rejected");
            Err(QuerysetError::Validation(errors))
        }
    }
}

fn bind_declared(
    key: &str,
    field_type: &FieldType,
    values: &[String],
) -> std::result::Result<Value, Vec<ValidationError>> {
    match field_type {
        FieldType::List(item_type) => {
            let mut items = Vec::with_capacity(values.len());
            let mut errors = Vec::new();
            for (index, raw) in values.iter().enumerate() {
                let loc = vec![
                    LocSegment::from(LOCATION),
                    LocSegment::from(key),
                    LocSegment::from(index),
                ];
                match coerce(raw, item_type, loc) {
                    Ok(value) => items.push(value),
                    Err(error) => errors.push(error),
                }
            }
            if errors.is_empty() {
                Ok(Value::Array(items))
            } else {
                Err(errors)
            }
        }
        scalar => {
            // Repeated scalar keys: the last occurrence wins
            let raw = values.last().map(String::as_str).unwrap_or_default();
            let loc = vec![LocSegment::from(LOCATION), LocSegment::from(key)];
            coerce(raw, scalar, loc).map_err(|error| vec![error])
        }
    }
}

fn coerce(
    raw: &str,
    field_type: &FieldType,
    loc: Vec<LocSegment>,
) -> std::result::Result<Value, ValidationError> {
    let trimmed = raw.trim();
    match field_type {
        FieldType::String => Ok(Value::String(raw.to_string())),
        FieldType::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| ValidationError::new(loc, "value is not a valid integer", ERROR_INTEGER)),
        FieldType::Float => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| ValidationError::new(loc, "value is not a valid float", ERROR_FLOAT)),
        FieldType::Boolean => parse_bool(trimmed).map(Value::Bool).ok_or_else(|| {
            ValidationError::new(loc, "value could not be parsed to a boolean", ERROR_BOOL)
        }),
        FieldType::DateTime => parse_datetime(trimmed)
            .map(|datetime| Value::String(datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            .ok_or_else(|| ValidationError::new(loc, "invalid datetime format", ERROR_DATETIME)),
        FieldType::List(item_type) => coerce(raw, item_type, loc).map(|value| Value::Array(vec![value])),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" | "y" | "t" => Some(true),
        "0" | "false" | "off" | "no" | "n" | "f" => Some(false),
        _ => None,
    }
}

/// RFC 3339, naive ISO 8601 (taken as UTC), bare dates or unix seconds
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single())
}
