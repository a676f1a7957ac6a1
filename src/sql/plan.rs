use super::conditions::{column_ref, quote_ident, Condition, SqlValue, SqlWriter, WhereClause};
use super::joins::Join;
use crate::lookup::LOOKUP_SEPARATOR;
use crate::queryable::{OrderDirective, PredicateMap};
use crate::schema::{FieldType, FilterField};
use serde_json::Value;
use std::collections::BTreeMap;

/// Rendered statement and the values for its `$n` placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

/// Pure description of a `SELECT` over one table and its joined relations.
///
/// Nothing here touches a connection, so plans can be built and inspected
/// without a database. Lone field names resolve against the base table;
/// `relation__field` paths resolve against the join aliased `relation`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlPlan {
    base_table: String,
    select_fields: Vec<String>,
    joins: Vec<Join>,
    field_types: BTreeMap<String, FieldType>,
    where_clauses: Vec<WhereClause>,
    order_by: Vec<OrderDirective>,
    offset: Option<u64>,
    limit: Option<u64>,
}

impl SqlPlan {
    pub fn new(table: &str) -> Self {
        Self {
            base_table: table.to_string(),
            select_fields: Vec::new(),
            joins: Vec::new(),
            field_types: BTreeMap::new(),
            where_clauses: Vec::new(),
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.base_table
    }

    /// Set specific fields to select (defaults to every base-table column)
    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn inner_join(self, table: &str, relation: &str, on_condition: &str) -> Self {
        self.join(Join::inner(table, relation, on_condition))
    }

    pub fn left_join(self, table: &str, relation: &str, on_condition: &str) -> Self {
        self.join(Join::left(table, relation, on_condition))
    }

    /// Declare the value type of a predicate key (`created_at__gte`)
    pub fn field_type(mut self, key: &str, field_type: FieldType) -> Self {
        self.field_types.insert(key.to_string(), field_type);
        self
    }

    /// Declare the value types of every field of a filter schema
    pub fn declare_fields(self, fields: &[FilterField]) -> Self {
        fields.iter().fold(self, |plan, field| {
            plan.field_type(&field.name, field.field_type.clone())
        })
    }

    pub fn where_clause(mut self, clause: WhereClause) -> Self {
        self.where_clauses.push(clause);
        self
    }

    /// Fixed SQL restriction, e.g. a soft-delete guard
    pub fn where_raw(self, sql: &str) -> Self {
        self.where_clause(WhereClause::raw(sql))
    }

    pub fn filter(self, predicates: &PredicateMap) -> Self {
        if predicates.is_empty() {
            return self;
        }
        let clause = WhereClause::all(self.conditions(predicates));
        self.where_clause(clause)
    }

    pub fn exclude(self, predicates: &PredicateMap) -> Self {
        if predicates.is_empty() {
            return self;
        }
        let clause = WhereClause::none_of(self.conditions(predicates));
        self.where_clause(clause)
    }

    pub fn order_by(mut self, directives: &[OrderDirective]) -> Self {
        self.order_by = directives.to_vec();
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn where_clauses(&self) -> &[WhereClause] {
        &self.where_clauses
    }

    pub fn ordering(&self) -> &[OrderDirective] {
        &self.order_by
    }

    /// Full `SELECT` with ordering and window
    pub fn build(&self) -> RenderedSql {
        let mut out = SqlWriter::default();
        out.push(&format!("SELECT {}", self.select_list()));
        self.push_from_and_where(&mut out);

        if !self.order_by.is_empty() {
            let entries: Vec<String> = self
                .order_by
                .iter()
                .map(|directive| self.order_entry(directive))
                .collect();
            out.push(&format!(" ORDER BY {}", entries.join(", ")));
        }
        if let Some(limit) = self.limit {
            out.push(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            out.push(&format!(" OFFSET {offset}"));
        }

        RenderedSql {
            sql: out.sql,
            binds: out.binds,
        }
    }

    /// `COUNT(*)` over the same rows, ignoring ordering and window
    pub fn build_count(&self) -> RenderedSql {
        let mut out = SqlWriter::default();
        out.push("SELECT COUNT(*)");
        self.push_from_and_where(&mut out);
        RenderedSql {
            sql: out.sql,
            binds: out.binds,
        }
    }

    /// Single-row lookup by key, ignoring ordering and window
    pub fn build_lookup(&self, key_field: &str, key: &Value) -> RenderedSql {
        let mut keyed = self.clone();
        keyed.order_by.clear();
        keyed.offset = None;
        keyed.limit = Some(1);
        let condition = Condition::qualified(
            &self.base_table,
            key_field,
            key,
            self.field_types.get(key_field),
        );
        keyed.where_clauses.push(WhereClause::all(vec![condition]));
        keyed.build()
    }

    pub fn build_sql(&self) -> String {
        self.build().sql
    }

    fn select_list(&self) -> String {
        if self.select_fields.is_empty() {
            return format!("{}.*", quote_ident(&self.base_table));
        }
        self.select_fields.join(", ")
    }

    fn conditions(&self, predicates: &PredicateMap) -> Vec<Condition> {
        predicates
            .iter()
            .map(|(key, value)| {
                Condition::qualified(&self.base_table, key, value, self.field_types.get(key))
            })
            .collect()
    }

    // Nulls sort as the smallest value, matching the in-memory backend
    fn order_entry(&self, directive: &OrderDirective) -> String {
        let path: Vec<&str> = directive.field.split(LOOKUP_SEPARATOR).collect();
        let column = column_ref(Some(self.base_table.as_str()), path.as_slice());
        if directive.descending {
            format!("{column} DESC NULLS LAST")
        } else {
            format!("{column} ASC NULLS FIRST")
        }
    }

    fn push_from_and_where(&self, out: &mut SqlWriter) {
        out.push(&format!(" FROM {}", quote_ident(&self.base_table)));
        for join in &self.joins {
            out.push(" ");
            out.push(&join.to_sql());
        }

        for (index, clause) in self.where_clauses.iter().enumerate() {
            out.push(if index == 0 { " WHERE " } else { " AND " });
            clause.render(out);
        }
    }
}
