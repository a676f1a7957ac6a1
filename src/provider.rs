//! Base query and key lookup for an entity type.

use crate::config::DetailConfig;
use crate::error::{QuerysetError, Result};
use crate::loc;
use crate::params::RequestContext;
use crate::queryable::Queryable;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

#[async_trait]
pub trait QueryProvider<Q: Queryable>: Send + Sync {
    /// Unfiltered query for the entity type
    fn base_query(&self, ctx: &RequestContext) -> Q;

    /// Key field, request alias and location used by [`entity_by_key`](Self::entity_by_key)
    fn detail(&self) -> &DetailConfig;

    /// Resolve one entity; a miss is reported against the key's request alias
    async fn entity_by_key(&self, query: Q, key: &Value) -> Result<Q::Entity> {
        let detail = self.detail();
        match query.fetch_one_by(&detail.key_field, key).await? {
            Some(entity) => {
                debug!(key_field = %detail.key_field, key = %key, "Entity resolved");
                Ok(entity)
            }
            None => {
                warn!(key_field = %detail.key_field, key = %key, "Entity not found");
                Err(QuerysetError::not_found(
                    loc![detail.key_location.as_str(), detail.key_alias.as_str()],
                    "Instance not found",
                ))
            }
        }
    }
}

/// Provider handing out clones of a fixed base query
#[derive(Debug, Clone)]
pub struct ModelProvider<Q> {
    base: Q,
    detail: DetailConfig,
}

impl<Q: Queryable> ModelProvider<Q> {
    pub fn new(base: Q) -> Self {
        Self {
            base,
            detail: DetailConfig::default(),
        }
    }

    pub fn with_detail(mut self, detail: DetailConfig) -> Self {
        self.detail = detail;
        self
    }

    /// Store field compared against the lookup key (default `id`)
    pub fn key_field(mut self, key_field: impl Into<String>) -> Self {
        self.detail.key_field = key_field.into();
        self
    }

    /// Request parameter the key arrives in (default `pk`)
    pub fn key_alias(mut self, key_alias: impl Into<String>) -> Self {
        self.detail.key_alias = key_alias.into();
        self
    }
}

#[async_trait]
impl<Q: Queryable> QueryProvider<Q> for ModelProvider<Q> {
    fn base_query(&self, _ctx: &RequestContext) -> Q {
        self.base.clone()
    }

    fn detail(&self) -> &DetailConfig {
        &self.detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryQuery;
    use serde_json::json;

    fn provider() -> ModelProvider<MemoryQuery> {
        ModelProvider::new(MemoryQuery::from_values(vec![
            json!({"id": 1, "name": "Test Worker 0"}),
            json!({"id": 2, "name": "Test Worker 1"}),
        ]))
    }

    #[tokio::test]
    async fn test_entity_by_key_hit() {
        let provider = provider();
        let query = provider.base_query(&RequestContext::default());
        let entity = provider.entity_by_key(query, &json!(2)).await.unwrap();
        assert_eq!(entity["name"], json!("Test Worker 1"));
    }

    #[tokio::test]
    async fn test_entity_by_key_miss_reports_alias() {
        let provider = provider().key_alias("instance_pk");
        let query = provider.base_query(&RequestContext::default());
        let error = provider.entity_by_key(query, &json!(99)).await.unwrap_err();

        assert_eq!(error.status_code(), 404);
        let detail = &error.details()[0];
        assert_eq!(detail.loc, loc!["path", "instance_pk"]);
        assert_eq!(detail.msg, "Instance not found");
        assert_eq!(detail.kind, "value_error");
    }

    #[tokio::test]
    async fn test_custom_key_field() {
        let provider = provider().key_field("name");
        let query = provider.base_query(&RequestContext::default());
        let entity = provider
            .entity_by_key(query, &json!("Test Worker 0"))
            .await
            .unwrap();
        assert_eq!(entity["id"], json!(1));
    }
}
