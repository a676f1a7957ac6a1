//! Allow-listed ordering.
//!
//! Tokens come from a list parameter (`ordering[]=-project__id&ordering[]=id`).
//! Each token is checked against the allow-list; a token with a registered
//! handler is delegated to it, any other token re-applies the full token list
//! as the ordering. The first token outside the allow-list aborts the stage.

use crate::error::{QuerysetError, Result, ERROR_VALUE};
use crate::loc;
use crate::params::{ParameterMap, RequestContext};
use crate::pipeline::Stage;
use crate::queryable::{OrderDirective, Queryable};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_ORDERING_PARAM: &str = "ordering[]";

/// Custom ordering for one field: receives the query and the descending flag
pub type OrderingHandler<Q> = Arc<dyn Fn(Q, bool) -> Q + Send + Sync>;

pub struct OrderingStage<Q> {
    param: String,
    allowed: HashSet<String>,
    default_ordering: Vec<OrderDirective>,
    handlers: HashMap<String, OrderingHandler<Q>>,
}

impl<Q: Queryable> OrderingStage<Q> {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            param: DEFAULT_ORDERING_PARAM.to_string(),
            allowed: allowed.into_iter().map(Into::into).collect(),
            default_ordering: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Request parameter carrying the tokens
    pub fn param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    /// Ordering applied when the request carries no tokens
    pub fn default_ordering<S: AsRef<str>>(mut self, tokens: &[S]) -> Self {
        self.default_ordering = OrderDirective::parse_all(tokens);
        self
    }

    /// Register custom ordering logic for `field`
    pub fn handler<F>(mut self, field: impl Into<String>, handler: F) -> Self
    where
        F: Fn(Q, bool) -> Q + Send + Sync + 'static,
    {
        self.handlers.insert(field.into(), Arc::new(handler));
        self
    }

    pub fn param_name(&self) -> &str {
        &self.param
    }

    pub fn is_allowed(&self, field: &str) -> bool {
        self.allowed.contains(field)
    }

    pub fn apply(&self, params: &ParameterMap, query: Q) -> Result<Q> {
        let tokens = params.get_str_list(&self.param);
        self.apply_tokens(&tokens, query)
    }

    pub fn apply_tokens<S: AsRef<str>>(&self, tokens: &[S], mut query: Q) -> Result<Q> {
        if tokens.is_empty() {
            if self.default_ordering.is_empty() {
                return Ok(query);
            }
            debug!(ordering = ?self.default_ordering, "Applying default ordering");
            return Ok(query.order_by(&self.default_ordering));
        }

        let requested = OrderDirective::parse_all(tokens);

        for (index, directive) in requested.iter().enumerate() {
            if !self.is_allowed(&directive.field) {
                warn!(
                    index,
                    field = %directive.field,
                    "Ordering field is not allowed"
                );
                return Err(QuerysetError::validation(
                    loc!["query", self.param.as_str(), index],
                    "Invalid value",
                    ERROR_VALUE,
                ));
            }

            // Without a handler the whole requested list is re-applied, not
            // only the remaining tokens
            query = match self.handlers.get(&directive.field) {
                Some(handler) => {
                    debug!(field = %directive.field, descending = directive.descending, "Custom ordering handler");
                    handler(query, directive.descending)
                }
                None => query.order_by(&requested),
            };
        }

        Ok(query)
    }
}

impl<Q> fmt::Debug for OrderingStage<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut allowed: Vec<_> = self.allowed.iter().collect();
        allowed.sort();
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        handlers.sort();

        f.debug_struct("OrderingStage")
            .field("param", &self.param)
            .field("allowed", &allowed)
            .field("default_ordering", &self.default_ordering)
            .field("handlers", &handlers)
            .finish()
    }
}

#[async_trait]
impl<Q: Queryable> Stage<Q> for OrderingStage<Q> {
    fn name(&self) -> &'static str {
        "ordering"
    }

    async fn transform(&self, ctx: &mut RequestContext, query: Q) -> Result<Q> {
        self.apply(&ctx.params, query)
    }
}
