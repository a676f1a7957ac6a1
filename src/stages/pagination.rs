//! Page windowing and pagination metadata.
//!
//! The effective page size is `min(per_page_max, per_page or default)` and the
//! window skips `(page - 1) * size` rows. A count of the unwindowed query
//! yields the metadata surfaced as `x-page`, `x-pages`, `x-per-page` and
//! `x-total`.

use crate::config::PaginationConfig;
use crate::error::{
    LocSegment, QuerysetError, Result, ValidationError, ERROR_NOT_GE, ERROR_NOT_LE,
};
use crate::loc;
use crate::params::{ParameterMap, RequestContext, ResponseHeaders};
use crate::pipeline::Stage;
use crate::queryable::Queryable;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

pub const PAGE_PARAM: &str = "page";
pub const PER_PAGE_PARAM: &str = "per_page";

pub const HEADER_PAGE: &str = "x-page";
pub const HEADER_PAGES: &str = "x-pages";
pub const HEADER_PER_PAGE: &str = "x-per-page";
pub const HEADER_TOTAL: &str = "x-total";

/// Reject integers below 1 with the standard `not_ge` error
pub fn ensure_at_least_one(
    value: i64,
    loc: Vec<LocSegment>,
) -> std::result::Result<u64, ValidationError> {
    if value >= 1 {
        Ok(value.unsigned_abs())
    } else {
        Err(ValidationError::new(
            loc,
            "ensure this value is greater than or equal to 1",
            ERROR_NOT_GE,
        ))
    }
}

/// `(skip, limit)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationWindow {
    pub skip: u64,
    pub limit: u64,
}

impl PaginationWindow {
    /// Page number recomputed from the window: `ceil(skip / limit) + 1`
    pub fn page(&self) -> u64 {
        self.skip.div_ceil(self.limit) + 1
    }

    /// Number of pages needed for `total` rows
    pub fn pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    pub page: u64,
    pub pages: u64,
    pub per_page: u64,
    pub total: u64,
}

impl PageMetadata {
    pub fn new(window: PaginationWindow, total: u64) -> Self {
        Self {
            page: window.page(),
            pages: window.pages(total),
            per_page: window.limit,
            total,
        }
    }

    pub fn write_headers(&self, headers: &mut ResponseHeaders) {
        headers.insert(HEADER_PAGE.to_string(), self.page.to_string());
        headers.insert(HEADER_PAGES.to_string(), self.pages.to_string());
        headers.insert(HEADER_PER_PAGE.to_string(), self.per_page.to_string());
        headers.insert(HEADER_TOTAL.to_string(), self.total.to_string());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PaginationStage {
    config: PaginationConfig,
}

impl PaginationStage {
    pub fn new(config: PaginationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Effective page size for an optional requested size
    pub fn effective_per_page(&self, requested: Option<u64>) -> u64 {
        let per_page = requested.unwrap_or(u64::from(self.config.per_page));
        per_page.min(u64::from(self.config.per_page_max)).max(1)
    }

    pub fn window(&self, params: &ParameterMap) -> Result<PaginationWindow> {
        let page = params
            .get_i64(PAGE_PARAM)
            .map(|page| ensure_at_least_one(page, loc!["query", PAGE_PARAM]))
            .transpose()
            .map_err(|error| QuerysetError::Validation(vec![error]))?
            .unwrap_or(1);

        let per_page = params
            .get_i64(PER_PAGE_PARAM)
            .map(|per_page| ensure_at_least_one(per_page, loc!["query", PER_PAGE_PARAM]))
            .transpose()
            .map_err(|error| QuerysetError::Validation(vec![error]))?;

        let limit = self.effective_per_page(per_page);
        Ok(PaginationWindow {
            skip: Self::skip_for(page, limit)?,
            limit,
        })
    }

    /// Rows skipped before `page`. Offsets must fit a signed 64-bit `OFFSET`.
    fn skip_for(page: u64, limit: u64) -> Result<u64> {
        let max_skip = i64::MAX.unsigned_abs();
        match (page - 1).checked_mul(limit) {
            Some(skip) if skip <= max_skip => Ok(skip),
            _ => Err(QuerysetError::validation(
                loc!["query", PAGE_PARAM],
                format!(
                    "ensure this value is less than or equal to {}",
                    max_skip / limit + 1
                ),
                ERROR_NOT_LE,
            )),
        }
    }

    /// Count the query, then window it. The count is the only store call.
    pub async fn paginate<Q: Queryable>(
        &self,
        params: &ParameterMap,
        query: Q,
    ) -> Result<(Q, PageMetadata)> {
        let window = self.window(params)?;
        let total = query.count().await?;
        let metadata = PageMetadata::new(window, total);

        debug!(
            skip = window.skip,
            limit = window.limit,
            total,
            pages = metadata.pages,
            "Applying pagination window"
        );

        Ok((query.offset(window.skip).limit(window.limit), metadata))
    }
}

#[async_trait]
impl<Q: Queryable> Stage<Q> for PaginationStage {
    fn name(&self) -> &'static str {
        "pagination"
    }

    async fn transform(&self, ctx: &mut RequestContext, query: Q) -> Result<Q> {
        let (query, metadata) = self.paginate(&ctx.params, query).await?;
        metadata.write_headers(&mut ctx.headers);
        Ok(query)
    }
}
