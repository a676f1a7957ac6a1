//! # Pipeline Composition
//!
//! A pipeline is an explicit, ordered list of stages over a query provider.
//! List requests run every stage in order; detail requests run only the
//! stages that apply to single-entity lookups (filter and negation) before
//! resolving the key.
//!
//! ```rust,no_run
//! use router_querysets::config::QuerysetConfig;
//! use router_querysets::memory::MemoryQuery;
//! use router_querysets::pipeline::PipelineBuilder;
//! use router_querysets::provider::ModelProvider;
//! use router_querysets::schema::{FieldType, FilterField, FilterSchema};
//! use router_querysets::stages::OrderingStage;
//!
//! # async fn example(rows: MemoryQuery) -> Result<(), Box<dyn std::error::Error>> {
//! let schema = FilterSchema::new("TaskFilter")
//!     .field(FilterField::new("project_id", FieldType::Integer).alias("project"));
//!
//! let pipeline = PipelineBuilder::new(QuerysetConfig::default())
//!     .filters(schema)
//!     .negation()
//!     .ordering(OrderingStage::new(["id", "cost"]).default_ordering(&["id"]))
//!     .pagination()
//!     .build(ModelProvider::new(rows))?;
//!
//! let page = pipeline.fetch_page([("project", "1"), ("page", "2")]).await?;
//! println!("{} rows, {:?}", page.items.len(), page.headers);
//! # Ok(())
//! # }
//! ```

use crate::binder::ParameterBinder;
use crate::config::QuerysetConfig;
use crate::error::{ConfigurationError, QuerysetError, Result};
use crate::logging::{log_rejected_request, log_stage_operation};
use crate::params::{RequestContext, ResponseHeaders};
use crate::provider::QueryProvider;
use crate::queryable::Queryable;
use crate::schema::FilterSchema;
use crate::stages::{FilterStage, NegationStage, OrderingStage, PaginationStage};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// One transformation step of a pipeline
#[async_trait]
pub trait Stage<Q: Queryable>: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether detail (single entity) requests run this stage
    fn applies_to_detail(&self) -> bool {
        false
    }

    async fn transform(&self, ctx: &mut RequestContext, query: Q) -> Result<Q>;
}

/// Items of one list request together with the response metadata
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub headers: ResponseHeaders,
}

pub struct Pipeline<Q: Queryable> {
    provider: Arc<dyn QueryProvider<Q>>,
    stages: Vec<Arc<dyn Stage<Q>>>,
    binder: ParameterBinder,
    detail_filters: bool,
}

impl<Q: Queryable> Pipeline<Q> {
    pub fn new(provider: impl QueryProvider<Q> + 'static) -> Self {
        Self {
            provider: Arc::new(provider),
            stages: Vec::new(),
            binder: ParameterBinder::new(),
            detail_filters: true,
        }
    }

    /// Append a stage to the end of the chain
    pub fn stage(mut self, stage: impl Stage<Q> + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn binder(mut self, binder: ParameterBinder) -> Self {
        self.binder = binder;
        self
    }

    /// Run filter and negation stages before detail lookups (default on)
    pub fn detail_filters(mut self, enabled: bool) -> Self {
        self.detail_filters = enabled;
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Bind raw request pairs into a fresh request context
    pub fn bind<I, K, V>(&self, pairs: I) -> Result<RequestContext>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let params = self.binder.bind(pairs).inspect_err(log_rejection)?;
        Ok(RequestContext::new(params))
    }

    /// Query for a list request: base query through every stage in order
    #[instrument(skip_all, fields(stages = self.stages.len()))]
    pub async fn list(&self, ctx: &mut RequestContext) -> Result<Q> {
        let mut query = self.provider.base_query(ctx);
        for stage in &self.stages {
            log_stage_operation(stage.name(), None, "running", None);
            query = stage.transform(ctx, query).await.inspect_err(log_rejection)?;
        }
        Ok(query)
    }

    pub async fn fetch_list(&self, ctx: &mut RequestContext) -> Result<Vec<Q::Entity>> {
        let query = self.list(ctx).await?;
        Ok(query.fetch_all().await?)
    }

    /// Bind, run and fetch one list request
    pub async fn fetch_page<I, K, V>(&self, pairs: I) -> Result<Page<Q::Entity>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut ctx = self.bind(pairs)?;
        let items = self.fetch_list(&mut ctx).await?;
        Ok(Page {
            items,
            headers: ctx.headers,
        })
    }

    /// Query for a detail request: ordering and pagination never apply
    #[instrument(skip_all)]
    pub async fn detail_query(&self, ctx: &mut RequestContext) -> Result<Q> {
        let mut query = self.provider.base_query(ctx);
        if self.detail_filters {
            for stage in self.stages.iter().filter(|stage| stage.applies_to_detail()) {
                log_stage_operation(stage.name(), None, "running", Some("detail"));
                query = stage.transform(ctx, query).await.inspect_err(log_rejection)?;
            }
        }
        Ok(query)
    }

    pub async fn instance(&self, ctx: &mut RequestContext, key: &Value) -> Result<Q::Entity> {
        let query = self.detail_query(ctx).await?;
        self.provider
            .entity_by_key(query, key)
            .await
            .inspect_err(log_rejection)
    }
}

fn log_rejection(error: &QuerysetError) {
    for detail in error.details() {
        log_rejected_request(error.status_code(), &detail.location(), &detail.msg);
    }
}

impl<Q: Queryable> std::fmt::Debug for Pipeline<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stage_names())
            .field("detail_filters", &self.detail_filters)
            .finish()
    }
}

/// Assembles the standard Filter → Negation → Ordering → Pagination chain
/// and a matching parameter binder from configuration
pub struct PipelineBuilder<Q: Queryable> {
    config: QuerysetConfig,
    filters: Option<FilterSchema>,
    negation: bool,
    ordering: Option<OrderingStage<Q>>,
    pagination: bool,
    detail_filters: bool,
}

impl<Q: Queryable> PipelineBuilder<Q> {
    pub fn new(config: QuerysetConfig) -> Self {
        Self {
            config,
            filters: None,
            negation: false,
            ordering: None,
            pagination: false,
            detail_filters: true,
        }
    }

    pub fn filters(mut self, schema: FilterSchema) -> Self {
        self.filters = Some(schema);
        self
    }

    /// Add a negation stage derived from the filter schema
    pub fn negation(mut self) -> Self {
        self.negation = true;
        self
    }

    /// Add an ordering stage; its parameter name is taken from
    /// `filters.ordering_param` in the configuration
    pub fn ordering(mut self, stage: OrderingStage<Q>) -> Self {
        self.ordering = Some(stage);
        self
    }

    pub fn pagination(mut self) -> Self {
        self.pagination = true;
        self
    }

    pub fn detail_filters(mut self, enabled: bool) -> Self {
        self.detail_filters = enabled;
        self
    }

    pub fn build(
        self,
        provider: impl QueryProvider<Q> + 'static,
    ) -> std::result::Result<Pipeline<Q>, ConfigurationError> {
        self.config.validate()?;

        let mut binder = ParameterBinder::new();
        let mut pipeline = Pipeline::new(provider).detail_filters(self.detail_filters);

        match (&self.filters, self.negation) {
            (Some(schema), negation) => {
                schema.validate()?;
                binder = binder.schema(schema);
                pipeline = pipeline.stage(FilterStage::new(schema.clone()));

                if negation {
                    let stage = NegationStage::with_marker(schema, &self.config.filters.negation_marker);
                    binder = binder.schema(stage.negated_schema());
                    pipeline = pipeline.stage(stage);
                }
            }
            (None, true) => {
                return Err(ConfigurationError::invalid_value(
                    "negation",
                    "a filter schema is required to derive negated filters",
                ));
            }
            (None, false) => {}
        }

        if let Some(ordering) = self.ordering {
            let ordering = ordering.param(self.config.filters.ordering_param.clone());
            binder = binder.ordering(ordering.param_name().to_string());
            pipeline = pipeline.stage(ordering);
        }

        if self.pagination {
            binder = binder.pagination();
            pipeline = pipeline.stage(PaginationStage::new(self.config.pagination));
        }

        debug!(stages = ?pipeline.stage_names(), "Pipeline built");
        Ok(pipeline.binder(binder))
    }
}
