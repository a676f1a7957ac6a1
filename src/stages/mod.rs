//! # Pipeline Stages
//!
//! Each stage consumes the query produced by the previous one and returns a
//! new query. Stages are configured once and shared read-only across
//! requests.
//!
//! - [`filter`] - inclusion predicates from a filter schema
//! - [`negation`] - exclusion predicates from the derived negated schema
//! - [`ordering`] - allow-listed ordering with per-field handlers
//! - [`pagination`] - offset/limit window plus page metadata

pub mod filter;
pub mod negation;
pub mod ordering;
pub mod pagination;

pub use filter::FilterStage;
pub use negation::NegationStage;
pub use ordering::{OrderingHandler, OrderingStage};
pub use pagination::{PageMetadata, PaginationStage, PaginationWindow};
