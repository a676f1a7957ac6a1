use super::conditions::quote_ident;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

impl JoinType {
    fn keyword(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
        }
    }
}

/// A related table reachable through `relation__field` lookups.
///
/// The table is aliased with the relation name so that a predicate such as
/// `project__created_at` renders as `"project"."created_at"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: String,
    pub relation: String,
    pub on_condition: String,
}

impl Join {
    pub fn inner(table: &str, relation: &str, on_condition: &str) -> Self {
        Self {
            join_type: JoinType::Inner,
            table: table.to_string(),
            relation: relation.to_string(),
            on_condition: on_condition.to_string(),
        }
    }

    pub fn left(table: &str, relation: &str, on_condition: &str) -> Self {
        Self {
            join_type: JoinType::Left,
            table: table.to_string(),
            relation: relation.to_string(),
            on_condition: on_condition.to_string(),
        }
    }

    pub fn to_sql(&self) -> String {
        format!(
            "{} {} AS {} ON {}",
            self.join_type.keyword(),
            quote_ident(&self.table),
            quote_ident(&self.relation),
            self.on_condition
        )
    }
}
