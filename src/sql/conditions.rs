use crate::lookup::{Lookup, LookupOp};
use crate::queryable::PredicateMap;
use crate::schema::FieldType;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// A value bound to a `$n` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Json(Value),
}

impl From<&Value> for SqlValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => SqlValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlValue::Json(value.clone()),
        }
    }
}

impl SqlValue {
    /// Encode `value` for a column of the declared type.
    ///
    /// Bound datetimes arrive as RFC 3339 text; they become `timestamptz`
    /// only for fields declared as [`FieldType::DateTime`].
    pub fn typed(value: &Value, field_type: Option<&FieldType>) -> Self {
        match (field_type, value) {
            (Some(FieldType::DateTime), Value::String(s)) => {
                match DateTime::parse_from_rfc3339(s) {
                    Ok(datetime) => SqlValue::Timestamp(datetime.with_timezone(&Utc)),
                    Err(_) => SqlValue::Text(s.clone()),
                }
            }
            (Some(FieldType::Float), Value::Number(n)) => {
                SqlValue::Float(n.as_f64().unwrap_or_default())
            }
            _ => SqlValue::from(value),
        }
    }
}

/// SQL text under construction plus its bound values
#[derive(Debug, Default)]
pub struct SqlWriter {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

impl SqlWriter {
    pub fn push(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    pub fn push_bind(&mut self, value: SqlValue) {
        self.binds.push(value);
        self.sql.push_str(&format!("${}", self.binds.len()));
    }
}

/// Quoted column for a lookup path. A lone field is qualified with `table`.
pub fn column_ref<S: AsRef<str>>(table: Option<&str>, path: &[S]) -> String {
    let segments: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
    match (table, segments.as_slice()) {
        (Some(table), [field]) => quote_ident(&format!("{table}.{field}")),
        _ => quote_ident(&segments.join(".")),
    }
}

/// Double-quote each `.`-separated segment of an identifier
pub fn quote_ident(ident: &str) -> String {
    ident
        .split('.')
        .map(|segment| format!("\"{}\"", segment.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Represents different types of SQL conditions
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        column: String,
        operator: &'static str,
        value: SqlValue,
    },
    In {
        column: String,
        values: Vec<SqlValue>,
        or_null: bool,
    },
    IsNull {
        column: String,
    },
    IsNotNull {
        column: String,
    },
    Raw {
        sql: String,
    },
}

impl Condition {
    /// Translate one predicate (`created_at__gte` → `"created_at" >= $n`)
    pub fn from_predicate(key: &str, value: &Value) -> Self {
        Self::resolve(None, key, value, None)
    }

    /// Translate one predicate against `table`, encoding the value by the
    /// field's declared type
    pub fn qualified(
        table: &str,
        key: &str,
        value: &Value,
        field_type: Option<&FieldType>,
    ) -> Self {
        Self::resolve(Some(table), key, value, field_type)
    }

    fn resolve(
        table: Option<&str>,
        key: &str,
        value: &Value,
        field_type: Option<&FieldType>,
    ) -> Self {
        let lookup = Lookup::parse(key);
        let column = column_ref(table, lookup.path.as_slice());
        let item_type = match field_type {
            Some(FieldType::List(item)) => Some(&**item),
            other => other,
        };

        match (lookup.op, value) {
            (LookupOp::Exact, Value::Null) => Condition::IsNull { column },
            (LookupOp::Not, Value::Null) => Condition::IsNotNull { column },
            (LookupOp::IsNull, flag) => {
                if flag.as_bool().unwrap_or(true) {
                    Condition::IsNull { column }
                } else {
                    Condition::IsNotNull { column }
                }
            }
            (LookupOp::In, Value::Array(items)) => Condition::In {
                column,
                values: items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(|item| SqlValue::typed(item, item_type))
                    .collect(),
                or_null: items.iter().any(Value::is_null),
            },
            (LookupOp::In | LookupOp::Gte | LookupOp::Lte, Value::Null) => {
                Condition::IsNull { column }
            }
            // Null is never strictly ordered against a value nor matched by a pattern
            (_, Value::Null) => Condition::Raw {
                sql: "FALSE".to_string(),
            },
            (LookupOp::In, single) => Condition::In {
                column,
                values: vec![SqlValue::typed(single, item_type)],
                or_null: false,
            },
            (op @ (LookupOp::Contains | LookupOp::IContains), Value::String(s)) => Condition::Compare {
                column,
                operator: op.sql_operator(),
                value: SqlValue::Text(format!("%{}%", escape_like(s))),
            },
            (LookupOp::StartsWith, Value::String(s)) => Condition::Compare {
                column,
                operator: LookupOp::StartsWith.sql_operator(),
                value: SqlValue::Text(format!("{}%", escape_like(s))),
            },
            (LookupOp::EndsWith, Value::String(s)) => Condition::Compare {
                column,
                operator: LookupOp::EndsWith.sql_operator(),
                value: SqlValue::Text(format!("%{}", escape_like(s))),
            },
            // Array containment for non-string needles
            (LookupOp::Contains, other) => Condition::Compare {
                column,
                operator: "@>",
                value: SqlValue::Json(Value::Array(vec![other.clone()])),
            },
            (op, value) => Condition::Compare {
                column,
                operator: match op {
                    LookupOp::IContains | LookupOp::StartsWith | LookupOp::EndsWith => "=",
                    op => op.sql_operator(),
                },
                value: SqlValue::typed(value, field_type),
            },
        }
    }

    pub fn render(&self, out: &mut SqlWriter) {
        match self {
            Condition::Compare {
                column,
                operator,
                value,
            } => {
                out.push(&format!("{column} {operator} "));
                out.push_bind(value.clone());
            }
            Condition::In {
                column,
                values,
                or_null,
            } => {
                if values.is_empty() {
                    if *or_null {
                        out.push(&format!("{column} IS NULL"));
                    } else {
                        out.push("FALSE");
                    }
                    return;
                }
                if *or_null {
                    out.push("(");
                }
                out.push(&format!("{column} IN ("));
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        out.push(", ");
                    }
                    out.push_bind(value.clone());
                }
                out.push(")");
                if *or_null {
                    out.push(&format!(" OR {column} IS NULL)"));
                }
            }
            Condition::IsNull { column } => out.push(&format!("{column} IS NULL")),
            Condition::IsNotNull { column } => out.push(&format!("{column} IS NOT NULL")),
            Condition::Raw { sql } => out.push(sql),
        }
    }
}

/// A group of conditions joined with AND, optionally negated as a whole
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    pub conditions: Vec<Condition>,
    pub negated: bool,
}

impl WhereClause {
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            negated: false,
        }
    }

    /// `NOT (a AND b)`: drops rows matching every condition
    pub fn none_of(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            negated: true,
        }
    }

    pub fn from_predicates(predicates: &PredicateMap, negated: bool) -> Self {
        let conditions = predicates
            .iter()
            .map(|(key, value)| Condition::from_predicate(key, value))
            .collect();
        Self {
            conditions,
            negated,
        }
    }

    pub fn raw(sql: &str) -> Self {
        Self::all(vec![Condition::Raw {
            sql: sql.to_string(),
        }])
    }

    pub fn render(&self, out: &mut SqlWriter) {
        if self.conditions.is_empty() {
            out.push(if self.negated { "1=0" } else { "1=1" });
            return;
        }

        if self.negated {
            out.push("NOT ");
        }
        let grouped = self.negated || self.conditions.len() > 1;
        if grouped {
            out.push("(");
        }
        for (index, condition) in self.conditions.iter().enumerate() {
            if index > 0 {
                out.push(" AND ");
            }
            condition.render(out);
        }
        if grouped {
            out.push(")");
        }
    }
}
