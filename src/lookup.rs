//! Django-style lookup keys.
//!
//! A predicate key such as `created_at__gte` or `workers__id__in` splits into
//! a field path (`["workers", "id"]`) and a comparison operator. Segments that
//! are not operators address related data.

use std::fmt;

/// Separator between path segments and the trailing operator
pub const LOOKUP_SEPARATOR: &str = "__";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOp {
    Exact,
    Not,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    IContains,
    StartsWith,
    EndsWith,
    IsNull,
}

impl LookupOp {
    fn from_suffix(suffix: &str) -> Option<Self> {
        let op = match suffix {
            "exact" => LookupOp::Exact,
            "not" => LookupOp::Not,
            "in" => LookupOp::In,
            "gt" => LookupOp::Gt,
            "gte" => LookupOp::Gte,
            "lt" => LookupOp::Lt,
            "lte" => LookupOp::Lte,
            "contains" => LookupOp::Contains,
            "icontains" => LookupOp::IContains,
            "startswith" => LookupOp::StartsWith,
            "endswith" => LookupOp::EndsWith,
            "isnull" => LookupOp::IsNull,
            _ => return None,
        };
        Some(op)
    }

    /// SQL comparison operator for the simple binary forms
    pub fn sql_operator(self) -> &'static str {
        match self {
            LookupOp::Exact => "=",
            LookupOp::Not => "<>",
            LookupOp::Gt => ">",
            LookupOp::Gte => ">=",
            LookupOp::Lt => "<",
            LookupOp::Lte => "<=",
            LookupOp::Contains | LookupOp::StartsWith | LookupOp::EndsWith => "LIKE",
            LookupOp::IContains => "ILIKE",
            LookupOp::In => "IN",
            LookupOp::IsNull => "IS NULL",
        }
    }
}

/// A parsed lookup key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub path: Vec<String>,
    pub op: LookupOp,
}

impl Lookup {
    pub fn parse(key: &str) -> Self {
        let mut path: Vec<String> = key.split(LOOKUP_SEPARATOR).map(str::to_string).collect();

        // A lone segment is always a field name, even if it spells an operator
        let op = match path.last() {
            Some(last) if path.len() > 1 => LookupOp::from_suffix(last),
            _ => None,
        };

        match op {
            Some(op) => {
                path.pop();
                Self { path, op }
            }
            None => Self {
                path,
                op: LookupOp::Exact,
            },
        }
    }

    /// Field path joined with `.` for qualified column references
    pub fn column(&self) -> String {
        self.path.join(".")
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.column(), self.op)
    }
}
