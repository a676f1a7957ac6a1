//! # Postgres Backend
//!
//! Renders query transformations into parameterised SQL and executes them
//! through `sqlx`.
//!
//! Lookups translate as follows:
//!
//! - `field` / `field__not`: `=` / `<>` (`IS NULL` / `IS NOT NULL` for null)
//! - `field__gt`, `__gte`, `__lt`, `__lte`: comparison operators
//! - `field__in`: `IN ($1, $2, ...)`, plus `OR ... IS NULL` when the list holds null
//! - `field__contains`, `__icontains`, `__startswith`, `__endswith`: `LIKE` / `ILIKE`
//! - `field__isnull`: `IS NULL` / `IS NOT NULL`
//! - `field`: `"table"."field"` on the plan's base table
//! - `relation__field`: `"relation"."field"`, resolved through a [`Join`] aliased as `relation`
//!
//! A null bound to `__gte`, `__lte` or `__in` matches null columns; under any
//! other comparison it matches nothing. Values are bound as text unless the
//! field is declared with a type: [`crate::schema::FieldType::DateTime`] fields
//! bind RFC 3339 strings as `timestamptz`. The filter stages declare their
//! schema's types through [`crate::queryable::Queryable::with_field_types`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use router_querysets::queryable::Queryable;
//! use router_querysets::sql::SqlQuery;
//! use serde_json::json;
//!
//! # async fn example(pool: sqlx::PgPool) -> Result<(), router_querysets::error::StoreError> {
//! let predicates = [("project_id".to_string(), json!(1))].into_iter().collect();
//! let tasks: Vec<(i64, String)> = SqlQuery::table(pool, "tasks")
//!     .filter(&predicates)
//!     .limit(25)
//!     .fetch_all()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod conditions;
pub mod joins;
pub mod plan;
pub mod query;

pub use conditions::{column_ref, Condition, SqlValue, WhereClause};
pub use joins::{Join, JoinType};
pub use plan::{RenderedSql, SqlPlan};
pub use query::SqlQuery;
