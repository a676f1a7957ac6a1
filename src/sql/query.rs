use super::conditions::SqlValue;
use super::plan::{RenderedSql, SqlPlan};
use crate::error::StoreError;
use crate::queryable::{OrderDirective, PredicateMap, Queryable};
use crate::schema::FilterField;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Arguments, FromRow, PgPool};
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

/// Postgres-backed [`Queryable`] yielding rows decoded as `T`
pub struct SqlQuery<T> {
    plan: SqlPlan,
    pool: PgPool,
    _row: PhantomData<fn() -> T>,
}

impl<T> SqlQuery<T> {
    pub fn new(pool: PgPool, plan: SqlPlan) -> Self {
        Self {
            plan,
            pool,
            _row: PhantomData,
        }
    }

    pub fn table(pool: PgPool, table: &str) -> Self {
        Self::new(pool, SqlPlan::new(table))
    }

    pub fn plan(&self) -> &SqlPlan {
        &self.plan
    }

    fn map_plan(self, f: impl FnOnce(SqlPlan) -> SqlPlan) -> Self {
        Self {
            plan: f(self.plan),
            pool: self.pool,
            _row: PhantomData,
        }
    }
}

impl<T> Clone for SqlQuery<T> {
    fn clone(&self) -> Self {
        Self {
            plan: self.plan.clone(),
            pool: self.pool.clone(),
            _row: PhantomData,
        }
    }
}

impl<T> fmt::Debug for SqlQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqlQuery").field("plan", &self.plan).finish()
    }
}

fn arguments(binds: &[SqlValue]) -> Result<PgArguments, StoreError> {
    let mut args = PgArguments::default();
    for value in binds {
        let added = match value {
            SqlValue::Null => args.add(None::<String>),
            SqlValue::Bool(b) => args.add(*b),
            SqlValue::Int(i) => args.add(*i),
            SqlValue::Float(f) => args.add(*f),
            SqlValue::Text(s) => args.add(s.clone()),
            SqlValue::Timestamp(t) => args.add(*t),
            SqlValue::Json(j) => args.add(sqlx::types::Json(j.clone())),
        };
        added.map_err(|e| StoreError::backend(format!("Failed to bind parameter: {e}")))?;
    }
    Ok(args)
}

#[async_trait]
impl<T> Queryable for SqlQuery<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
{
    type Entity = T;

    fn filter(self, predicates: &PredicateMap) -> Self {
        self.map_plan(|plan| plan.filter(predicates))
    }

    fn exclude(self, predicates: &PredicateMap) -> Self {
        self.map_plan(|plan| plan.exclude(predicates))
    }

    fn order_by(self, directives: &[OrderDirective]) -> Self {
        self.map_plan(|plan| plan.order_by(directives))
    }

    fn offset(self, skip: u64) -> Self {
        self.map_plan(|plan| plan.offset(skip))
    }

    fn limit(self, limit: u64) -> Self {
        self.map_plan(|plan| plan.limit(limit))
    }

    fn with_field_types(self, fields: &[FilterField]) -> Self {
        self.map_plan(|plan| plan.declare_fields(fields))
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let RenderedSql { sql, binds } = self.plan.build_count();
        debug!(sql = %sql, binds = binds.len(), "Counting rows");
        let total: i64 = sqlx::query_scalar_with::<_, i64, _>(&sql, arguments(&binds)?)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn fetch_all(&self) -> Result<Vec<T>, StoreError> {
        let RenderedSql { sql, binds } = self.plan.build();
        debug!(sql = %sql, binds = binds.len(), "Fetching rows");
        let rows = sqlx::query_as_with::<_, T, _>(&sql, arguments(&binds)?)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_one_by(&self, key_field: &str, key: &Value) -> Result<Option<T>, StoreError> {
        let RenderedSql { sql, binds } = self.plan.build_lookup(key_field, key);
        debug!(sql = %sql, key_field = %key_field, "Fetching row by key");
        let row = sqlx::query_as_with::<_, T, _>(&sql, arguments(&binds)?)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
