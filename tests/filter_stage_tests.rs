//! Filter and negation stages behind the worker endpoint.

mod common;

use common::*;
use router_querysets::error::{ERROR_INTEGER, ERROR_NOT_GE};
use router_querysets::loc;
use router_querysets::memory::MemoryQuery;
use router_querysets::params::ParameterMap;
use router_querysets::pipeline::Pipeline;
use router_querysets::queryable::{PredicateMap, Queryable};
use router_querysets::stages::{FilterStage, NegationStage};
use serde_json::{json, Value};

async fn list_ids(pipeline: &Pipeline<MemoryQuery>, pairs: &[(&str, &str)]) -> Vec<i64> {
    let mut ctx = pipeline.bind(pairs.iter().copied()).expect("bindable request");
    let mut ids = ids(&pipeline.fetch_list(&mut ctx).await.expect("list request"));
    ids.sort_unstable();
    ids
}

async fn expected_ids(query: MemoryQuery) -> Vec<i64> {
    let mut ids = ids(&query.fetch_all().await.unwrap());
    ids.sort_unstable();
    ids
}

fn predicates(pairs: &[(&str, Value)]) -> PredicateMap {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

#[tokio::test]
async fn test_params_empty_not_filtered() {
    let ids = list_ids(&workers_router(), &[]).await;
    assert_eq!(ids, (1..=100).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_params_filter_with_params() {
    let cases: Vec<(Vec<(&str, &str)>, PredicateMap)> = vec![
        (vec![("id", "1")], predicates(&[("id", json!(1))])),
        (
            vec![("id[]", "1"), ("id[]", "2"), ("id[]", "3")],
            predicates(&[("id__in", json!([1, 2, 3]))]),
        ),
        (
            vec![("name", "Test Worker 1")],
            predicates(&[("name", json!("Test Worker 1"))]),
        ),
        (vec![("contract", "2")], predicates(&[("contract_id", json!(2))])),
    ];

    for (pairs, model_filters) in cases {
        let expected = expected_ids(worker_query().filter(&model_filters)).await;
        assert!(!expected.is_empty());
        assert_eq!(list_ids(&workers_router(), &pairs).await, expected, "{pairs:?}");
    }
}

#[tokio::test]
async fn test_related_path_filter() {
    let ids = list_ids(&workers_router(), &[("contract__salary__gte", "9500")]).await;
    assert_eq!(ids, vec![96, 98, 100]);
}

#[tokio::test]
async fn test_param_not_in_schema_ignored() {
    let ids = list_ids(&workers_router(), &[("not_exist_param", "1")]).await;
    assert_eq!(ids.len(), 100);
}

#[tokio::test]
async fn test_param_wrong_type_error() {
    let error = workers_router().bind([("id", "abc")]).unwrap_err();

    assert_eq!(error.status_code(), 422);
    let detail = &error.details()[0];
    assert_eq!(detail.loc, loc!["query", "id"]);
    assert_eq!(detail.msg, "value is not a valid integer");
    assert_eq!(detail.kind, ERROR_INTEGER);
}

#[tokio::test]
async fn test_param_list_element_wrong_type_error() {
    let error = workers_router()
        .bind([("id[]", "1"), ("id[]", "abc")])
        .unwrap_err();

    let detail = &error.details()[0];
    assert_eq!(detail.loc, loc!["query", "id[]", 1usize]);
    assert_eq!(detail.kind, ERROR_INTEGER);
}

#[tokio::test]
async fn test_every_binding_failure_is_reported() {
    let error = tasks_router()
        .bind([("id", "x"), ("project", "y"), ("page", "0")])
        .unwrap_err();

    let details = error.details();
    assert_eq!(details.len(), 3);
    assert!(details.iter().any(|detail| detail.kind == ERROR_NOT_GE));
}

#[tokio::test]
async fn test_negated_params_exclude() {
    let cases: Vec<(Vec<(&str, &str)>, PredicateMap)> = vec![
        (vec![("id!", "1")], predicates(&[("id", json!(1))])),
        (
            vec![("id[]!", "1"), ("id[]!", "2"), ("id[]!", "3")],
            predicates(&[("id__in", json!([1, 2, 3]))]),
        ),
        (vec![("contract!", "2")], predicates(&[("contract_id", json!(2))])),
    ];

    for (pairs, model_filters) in cases {
        let expected = expected_ids(worker_query().exclude(&model_filters)).await;
        assert_eq!(list_ids(&workers_router(), &pairs).await, expected, "{pairs:?}");
    }
}

#[tokio::test]
async fn test_negation_equals_base_minus_filter() {
    let schema = worker_schema();
    let stage = NegationStage::new(&schema);
    let params = ParameterMap::new().with("name!", "Test Worker 1");

    let excluded = expected_ids(stage.apply(&params, worker_query())).await;
    let matched = expected_ids(worker_query().filter(&predicates(&[("name", json!("Test Worker 1"))]))).await;

    let expected: Vec<i64> = (1..=100).filter(|id| !matched.contains(id)).collect();
    assert_eq!(excluded, expected);
}

#[tokio::test]
async fn test_filter_and_negation_are_independent() {
    let schema = worker_schema();
    let params = ParameterMap::new().with("id[]", json!([1, 2, 3, 4])).with("contract!", 2);

    let query = FilterStage::new(schema.clone()).apply(&params, worker_query());
    let query = NegationStage::new(&schema).apply(&params, query);

    assert_eq!(expected_ids(query).await, vec![1, 3, 4]);
}
