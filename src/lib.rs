#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow builder methods without must_use

//! # Router Querysets
//!
//! Composable query stages for list and detail API endpoints.
//!
//! ## Overview
//!
//! A list endpoint starts from a base query supplied by a [`provider::QueryProvider`]
//! and passes it through an ordered chain of stages:
//!
//! 1. **Filter**: predicates from a declared [`schema::FilterSchema`]
//! 2. **Negation**: the same fields with a `!` suffix, applied as exclusions
//! 3. **Ordering**: allow-listed `ordering[]` tokens, with per-field handlers
//! 4. **Pagination**: `page` / `per_page` windowing plus `x-page`, `x-pages`,
//!    `x-per-page` and `x-total` response headers
//!
//! Detail endpoints reuse the filter and negation stages and resolve one
//! entity by key, reporting a miss as a 404 located at the key's alias.
//!
//! ## Module Organization
//!
//! - [`binder`] - Raw query pairs to typed parameters with located errors
//! - [`schema`] - Filter schemas and their negated derivation
//! - [`stages`] - Filter, negation, ordering and pagination stages
//! - [`pipeline`] - Stage composition and the standard builder
//! - [`queryable`] - The backend abstraction stages operate on
//! - [`memory`] - In-memory backend over JSON rows
//! - [`sql`] - PostgreSQL backend via SQLx
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use router_querysets::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let rows = MemoryQuery::from_values(vec![
//!     json!({"id": 1, "name": "Test Worker 0", "contract_id": 1}),
//!     json!({"id": 2, "name": "Test Worker 1", "contract_id": 2}),
//! ]);
//!
//! let pipeline = PipelineBuilder::new(QuerysetConfig::default())
//!     .filters(FilterSchema::new("WorkerFilter").field(
//!         FilterField::new("contract_id", FieldType::Integer).alias("contract"),
//!     ))
//!     .negation()
//!     .ordering(OrderingStage::new(["id", "name"]))
//!     .pagination()
//!     .build(ModelProvider::new(rows))?;
//!
//! let page = pipeline
//!     .fetch_page([("contract!", "2"), ("ordering[]", "-id")])
//!     .await?;
//! assert_eq!(page.headers["x-total"], "1");
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod config;
pub mod error;
pub mod logging;
pub mod lookup;
pub mod memory;
pub mod params;
pub mod pipeline;
pub mod provider;
pub mod queryable;
pub mod schema;
pub mod sql;
pub mod stages;

pub use binder::ParameterBinder;
pub use config::{DetailConfig, FilterConfig, PaginationConfig, QuerysetConfig};
pub use error::{ConfigurationError, QuerysetError, Result, StoreError, ValidationError};
pub use logging::init_structured_logging;
pub use params::{ParameterMap, RequestContext, ResponseHeaders};
pub use pipeline::{Page, Pipeline, PipelineBuilder, Stage};
pub use provider::{ModelProvider, QueryProvider};
pub use queryable::{OrderDirective, PredicateMap, Queryable};
pub use schema::{FieldType, FilterField, FilterSchema};

/// Common imports for building endpoints
pub mod prelude {
    pub use crate::config::QuerysetConfig;
    pub use crate::error::{QuerysetError, Result};
    pub use crate::memory::MemoryQuery;
    pub use crate::params::{ParameterMap, RequestContext};
    pub use crate::pipeline::{Page, Pipeline, PipelineBuilder, Stage};
    pub use crate::provider::{ModelProvider, QueryProvider};
    pub use crate::queryable::{OrderDirective, Queryable};
    pub use crate::schema::{FieldType, FilterField, FilterSchema};
    pub use crate::sql::SqlQuery;
    pub use crate::stages::{FilterStage, NegationStage, OrderingStage, PaginationStage};
}
