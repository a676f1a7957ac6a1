//! # Filter Schemas
//!
//! Declarative, ordered field descriptors for an endpoint's filter parameters.
//! Each field maps a request parameter (its alias, or its name when no alias
//! is set) onto a predicate key understood by the store.
//!
//! A negated schema is a pure transform of a source schema: same fields in the
//! same order, every request key suffixed with the negation marker. Values
//! supplied under those keys become exclusion predicates.

use crate::error::ConfigurationError;
use crate::params::ParameterMap;
use crate::queryable::PredicateMap;
use serde_json::Value;
use std::collections::HashSet;

/// Default suffix appended to request keys of a negated schema
pub const NEGATION_MARKER: &str = "!";

/// Declared value type of a filter field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Float,
    Boolean,
    String,
    DateTime,
    List(Box<FieldType>),
}

impl FieldType {
    pub fn list_of(item: FieldType) -> Self {
        FieldType::List(Box::new(item))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldType::List(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterField {
    pub name: String,
    pub field_type: FieldType,
    pub default: Value,
    pub alias: Option<String>,
}

impl FilterField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            default: Value::Null,
            alias: None,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = default.into();
        self
    }

    /// Request parameter name this field is bound from
    pub fn request_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSchema {
    name: String,
    fields: Vec<FilterField>,
}

impl FilterSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FilterField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FilterField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Look up a field by its request key
    pub fn by_request_key(&self, key: &str) -> Option<&FilterField> {
        self.fields.iter().find(|field| field.request_key() == key)
    }

    /// Reject schemas whose field names or request keys collide
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut names = HashSet::new();
        let mut keys = HashSet::new();
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(ConfigurationError::invalid_value(
                    format!("{}.{}", self.name, field.name),
                    "duplicate field name",
                ));
            }
            if !keys.insert(field.request_key()) {
                return Err(ConfigurationError::invalid_value(
                    format!("{}.{}", self.name, field.name),
                    format!("request key '{}' is declared twice", field.request_key()),
                ));
            }
        }
        Ok(())
    }

    /// Derive the negated schema using [`NEGATION_MARKER`]
    pub fn negated(&self) -> FilterSchema {
        self.negated_with(NEGATION_MARKER)
    }

    /// Derive the negated schema with a custom marker. Deterministic: two
    /// derivations from the same source are equal.
    pub fn negated_with(&self, marker: &str) -> FilterSchema {
        let fields = self
            .fields
            .iter()
            .map(|field| FilterField {
                alias: Some(format!("{}{marker}", field.request_key())),
                ..field.clone()
            })
            .collect();

        FilterSchema {
            name: format!("{}Negation", self.name),
            fields,
        }
    }

    /// Predicates for exactly those fields whose request key is present in
    /// `params`. Absent fields contribute nothing and unknown keys are ignored.
    pub fn predicates(&self, params: &ParameterMap) -> PredicateMap {
        self.fields
            .iter()
            .filter_map(|field| {
                params
                    .get(field.request_key())
                    .map(|value| (field.name.clone(), value.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn task_filter() -> FilterSchema {
        FilterSchema::new("TaskFilter")
            .field(FilterField::new("id", FieldType::Integer))
            .field(FilterField::new("id__in", FieldType::list_of(FieldType::Integer)).alias("id[]"))
            .field(FilterField::new("project_id", FieldType::Integer).alias("project"))
            .field(FilterField::new("created_at__gte", FieldType::DateTime))
    }

    #[test]
    fn test_request_key_falls_back_to_name() {
        let schema = task_filter();
        assert_eq!(schema.fields()[0].request_key(), "id");
        assert_eq!(schema.fields()[1].request_key(), "id[]");
    }

    #[test]
    fn test_negated_schema_keeps_shape_and_suffixes_keys() {
        let schema = task_filter();
        let negated = schema.negated();

        assert_eq!(negated.name(), "TaskFilterNegation");
        assert_eq!(negated.len(), schema.len());
        for (source, derived) in schema.fields().iter().zip(negated.fields()) {
            assert_eq!(source.name, derived.name);
            assert_eq!(source.field_type, derived.field_type);
            assert_eq!(source.default, derived.default);
            assert_eq!(derived.request_key(), format!("{}!", source.request_key()));
        }
    }

    #[test]
    fn test_negated_derivation_is_deterministic() {
        let schema = task_filter();
        assert_eq!(schema.negated(), schema.negated());
    }

    #[test]
    fn test_negation_does_not_touch_source() {
        let schema = task_filter();
        let before = schema.clone();
        let _ = schema.negated();
        assert_eq!(schema, before);
    }

    #[test]
    fn test_predicates_only_for_present_keys() {
        let schema = task_filter();
        let params = ParameterMap::new()
            .with("project", 1)
            .with("id[]", json!([1, 2]))
            .with("not_in_schema", 5);

        let predicates = schema.predicates(&params);
        assert_eq!(predicates.len(), 2);
        assert_eq!(predicates.get("project_id"), Some(&json!(1)));
        assert_eq!(predicates.get("id__in"), Some(&json!([1, 2])));
        assert!(!predicates.contains_key("not_in_schema"));
    }

    #[test]
    fn test_field_name_is_not_matched_when_aliased() {
        let schema = task_filter();
        let params = ParameterMap::new().with("project_id", 1);
        assert!(schema.predicates(&params).is_empty());
    }

    #[test]
    fn test_validate_rejects_duplicate_request_keys() {
        let schema = FilterSchema::new("Broken")
            .field(FilterField::new("a", FieldType::Integer).alias("x"))
            .field(FilterField::new("b", FieldType::Integer).alias("x"));
        assert!(schema.validate().is_err());
        assert!(task_filter().validate().is_ok());
    }
}
