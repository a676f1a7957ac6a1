use crate::error::Result;
use crate::params::{ParameterMap, RequestContext};
use crate::pipeline::Stage;
use crate::queryable::Queryable;
use crate::schema::{FilterSchema, NEGATION_MARKER};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Excludes rows matching the negated-key parameters (`created_at__gte!`).
///
/// The negated schema is derived once when the stage is built and shared by
/// every request afterwards.
#[derive(Debug, Clone)]
pub struct NegationStage {
    negated: Arc<FilterSchema>,
}

impl NegationStage {
    pub fn new(schema: &FilterSchema) -> Self {
        Self::with_marker(schema, NEGATION_MARKER)
    }

    pub fn with_marker(schema: &FilterSchema, marker: &str) -> Self {
        Self {
            negated: Arc::new(schema.negated_with(marker)),
        }
    }

    pub fn negated_schema(&self) -> &FilterSchema {
        &self.negated
    }

    pub fn apply<Q: Queryable>(&self, params: &ParameterMap, query: Q) -> Q {
        let predicates = self.negated.predicates(params);
        if predicates.is_empty() {
            return query;
        }

        debug!(
            schema = %self.negated.name(),
            fields = ?predicates.keys().collect::<Vec<_>>(),
            "Applying exclusion predicates"
        );
        query
            .with_field_types(self.negated.fields())
            .exclude(&predicates)
    }
}

#[async_trait]
impl<Q: Queryable> Stage<Q> for NegationStage {
    fn name(&self) -> &'static str {
        "negation"
    }

    fn applies_to_detail(&self) -> bool {
        true
    }

    async fn transform(&self, ctx: &mut RequestContext, query: Q) -> Result<Q> {
        Ok(self.apply(&ctx.params, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryQuery;
    use crate::schema::{FieldType, FilterField};
    use serde_json::json;

    fn schema() -> FilterSchema {
        FilterSchema::new("TaskFilter")
            .field(FilterField::new("id", FieldType::Integer))
            .field(FilterField::new("project_id", FieldType::Integer).alias("project"))
    }

    fn rows() -> MemoryQuery {
        MemoryQuery::from_values(vec![
            json!({"id": 1, "project_id": 1}),
            json!({"id": 2, "project_id": 2}),
            json!({"id": 3, "project_id": 1}),
        ])
    }

    #[tokio::test]
    async fn test_negated_key_excludes_matches() {
        let stage = NegationStage::new(&schema());
        let params = ParameterMap::new().with("project!", 1);

        let ids: Vec<_> = stage
            .apply(&params, rows())
            .fetch_all()
            .await
            .unwrap()
            .into_iter()
            .map(|row| row["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(2)]);
    }

    #[tokio::test]
    async fn test_plain_key_is_not_negated() {
        let stage = NegationStage::new(&schema());
        let params = ParameterMap::new().with("project", 1);
        assert_eq!(stage.apply(&params, rows()).count().await.unwrap(), 3);
    }

    #[test]
    fn test_custom_marker() {
        let stage = NegationStage::with_marker(&schema(), "__exclude");
        let keys: Vec<_> = stage
            .negated_schema()
            .fields()
            .iter()
            .map(|field| field.request_key().to_string())
            .collect();
        assert_eq!(keys, vec!["id__exclude", "project__exclude"]);
    }
}
