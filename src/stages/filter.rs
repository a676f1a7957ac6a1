use crate::error::Result;
use crate::params::{ParameterMap, RequestContext};
use crate::pipeline::Stage;
use crate::queryable::Queryable;
use crate::schema::FilterSchema;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Applies the predicates of every schema field present in the request
#[derive(Debug, Clone)]
pub struct FilterStage {
    schema: Arc<FilterSchema>,
}

impl FilterStage {
    pub fn new(schema: FilterSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &FilterSchema {
        &self.schema
    }

    pub fn apply<Q: Queryable>(&self, params: &ParameterMap, query: Q) -> Q {
        let predicates = self.schema.predicates(params);
        if predicates.is_empty() {
            return query;
        }

        debug!(
            schema = %self.schema.name(),
            fields = ?predicates.keys().collect::<Vec<_>>(),
            "Applying filter predicates"
        );
        query
            .with_field_types(self.schema.fields())
            .filter(&predicates)
    }
}

#[async_trait]
impl<Q: Queryable> Stage<Q> for FilterStage {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn applies_to_detail(&self) -> bool {
        true
    }

    async fn transform(&self, ctx: &mut RequestContext, query: Q) -> Result<Q> {
        Ok(self.apply(&ctx.params, query))
    }
}
