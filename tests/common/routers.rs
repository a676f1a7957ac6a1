//! Endpoint-style pipelines over the fixture rows.

use super::fixtures::{task_query, worker_query};
use router_querysets::config::{PaginationConfig, QuerysetConfig};
use router_querysets::memory::MemoryQuery;
use router_querysets::pipeline::{Pipeline, PipelineBuilder};
use router_querysets::provider::ModelProvider;
use router_querysets::schema::{FieldType, FilterField, FilterSchema};
use router_querysets::stages::OrderingStage;

pub const TASK_PER_PAGE: u32 = 25;
pub const TASK_PER_PAGE_MAX: u32 = 50;

pub const TASK_ORDERING_FIELDS: [&str; 8] = [
    "id",
    "cost",
    "created_at",
    "description",
    "project_id",
    "project__id",
    "workers_required_max",
    "workers_required_min",
];

pub fn task_schema() -> FilterSchema {
    FilterSchema::new("TaskFilter")
        .field(FilterField::new("id", FieldType::Integer))
        .field(FilterField::new("created_at__gte", FieldType::DateTime))
        .field(FilterField::new("project_id", FieldType::Integer).alias("project"))
        .field(FilterField::new("project__name", FieldType::String))
        .field(FilterField::new("workers__id", FieldType::Integer))
}

pub fn worker_schema() -> FilterSchema {
    FilterSchema::new("WorkerFilter")
        .field(FilterField::new("id", FieldType::Integer))
        .field(FilterField::new("id__in", FieldType::list_of(FieldType::Integer)).alias("id[]"))
        .field(FilterField::new("name", FieldType::String))
        .field(FilterField::new("contract_id", FieldType::Integer).alias("contract"))
        .field(FilterField::new("contract__salary__gte", FieldType::Float))
}

pub fn task_config() -> QuerysetConfig {
    QuerysetConfig {
        pagination: PaginationConfig::new(Some(TASK_PER_PAGE_MAX), Some(TASK_PER_PAGE)),
        ..QuerysetConfig::default()
    }
}

/// Filter → Negation → Ordering (default `id`) → Pagination over tasks
pub fn tasks_router() -> Pipeline<MemoryQuery> {
    tasks_router_over(task_query())
}

pub fn tasks_router_over(rows: MemoryQuery) -> Pipeline<MemoryQuery> {
    PipelineBuilder::new(task_config())
        .filters(task_schema())
        .negation()
        .ordering(OrderingStage::new(TASK_ORDERING_FIELDS).default_ordering(&["id"]))
        .pagination()
        .build(ModelProvider::new(rows))
        .expect("valid task router")
}

/// Filter and negation only, as used by detail endpoints
pub fn workers_router() -> Pipeline<MemoryQuery> {
    PipelineBuilder::new(QuerysetConfig::default())
        .filters(worker_schema())
        .negation()
        .build(ModelProvider::new(worker_query()).key_alias("instance_pk"))
        .expect("valid worker router")
}
