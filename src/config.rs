//! # Queryset Configuration
//!
//! Settings shared by every endpoint pipeline: pagination defaults, the
//! detail lookup key and the request-key conventions for negation and
//! ordering.
//!
//! Values are layered with the `config` crate: built-in defaults, then an
//! optional TOML/YAML file, then `QUERYSET__`-prefixed environment variables
//! (`QUERYSET__PAGINATION__PER_PAGE_MAX=100`).
//!
//! ```rust,no_run
//! use router_querysets::config::QuerysetConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = QuerysetConfig::load(Some("config/querysets.toml".as_ref()))?;
//! assert!(config.pagination.per_page >= 1);
//! # Ok(())
//! # }
//! ```

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use tracing::debug;

pub const ENV_PREFIX: &str = "QUERYSET";
pub const ENV_SEPARATOR: &str = "__";

/// Page size settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the request does not provide one
    pub per_page: u32,
    /// Upper bound applied to any requested page size
    pub per_page_max: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            per_page: 25,
            per_page_max: 25,
        }
    }
}

impl PaginationConfig {
    /// Missing values fall back to the defaults
    pub fn new(per_page_max: Option<u32>, per_page: Option<u32>) -> Self {
        let defaults = Self::default();
        Self {
            per_page: per_page.unwrap_or(defaults.per_page),
            per_page_max: per_page_max.unwrap_or(defaults.per_page_max),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.per_page < 1 {
            return Err(ConfigurationError::invalid_value(
                "pagination.per_page",
                "must be at least 1",
            ));
        }
        if self.per_page_max < 1 {
            return Err(ConfigurationError::invalid_value(
                "pagination.per_page_max",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Detail endpoint key lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailConfig {
    /// Store field compared against the key
    pub key_field: String,
    /// Request parameter the key arrives in
    pub key_alias: String,
    /// Location segment reported on a miss
    pub key_location: String,
}

impl Default for DetailConfig {
    fn default() -> Self {
        Self {
            key_field: "id".to_string(),
            key_alias: "pk".to_string(),
            key_location: "path".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub negation_marker: String,
    pub ordering_param: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            negation_marker: crate::schema::NEGATION_MARKER.to_string(),
            ordering_param: "ordering[]".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerysetConfig {
    pub pagination: PaginationConfig,
    pub detail: DetailConfig,
    pub filters: FilterConfig,
}

impl QuerysetConfig {
    /// Load defaults, an optional file and process environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        Self::load_with_env(path, None)
    }

    /// Same as [`QuerysetConfig::load`] but reads overrides from `env_vars`
    /// instead of the process environment when provided
    pub fn load_with_env(
        path: Option<&Path>,
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigurationError> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&QuerysetConfig::default())?);

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading queryset configuration file");
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env_vars),
        );

        let config: QuerysetConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            per_page = config.pagination.per_page,
            per_page_max = config.pagination.per_page_max,
            key_alias = %config.detail.key_alias,
            "Queryset configuration loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.pagination.validate()?;

        if self.detail.key_alias.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "detail.key_alias",
                "must not be empty",
            ));
        }
        if self.detail.key_field.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "detail.key_field",
                "must not be empty",
            ));
        }
        if self.filters.negation_marker.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "filters.negation_marker",
                "must not be empty",
            ));
        }
        if self.filters.ordering_param.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "filters.ordering_param",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

/// Deployment environment name: `QUERYSET_ENV`, then `APP_ENV`, else `development`
pub fn detect_environment() -> String {
    env::var("QUERYSET_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}
