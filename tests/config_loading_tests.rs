//! Layered configuration: defaults, file, environment.

mod common;

use common::*;
use router_querysets::config::QuerysetConfig;
use router_querysets::error::ConfigurationError;
use router_querysets::pipeline::PipelineBuilder;
use router_querysets::provider::ModelProvider;
use router_querysets::stages::OrderingStage;
use serde_json::json;
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn test_toml_file_overrides_defaults() {
    let file = config_file(
        ".toml",
        r#"
[pagination]
per_page = 10
per_page_max = 40

[detail]
key_alias = "instance_pk"
"#,
    );

    let config = QuerysetConfig::load_with_env(Some(file.path()), Some(HashMap::new())).unwrap();
    assert_eq!(config.pagination.per_page, 10);
    assert_eq!(config.pagination.per_page_max, 40);
    assert_eq!(config.detail.key_alias, "instance_pk");
    assert_eq!(config.detail.key_field, "id");
    assert_eq!(config.filters.negation_marker, "!");
}

#[test]
fn test_yaml_file_is_read_by_extension() {
    let file = config_file(".yaml", "filters:\n  negation_marker: \"~\"\n  ordering_param: sort\n");

    let config = QuerysetConfig::load_with_env(Some(file.path()), Some(HashMap::new())).unwrap();
    assert_eq!(config.filters.negation_marker, "~");
    assert_eq!(config.filters.ordering_param, "sort");
}

#[test]
fn test_environment_wins_over_file() {
    let file = config_file(".toml", "[pagination]\nper_page = 10\nper_page_max = 40\n");
    let env_vars = HashMap::from([(
        "QUERYSET__PAGINATION__PER_PAGE".to_string(),
        "20".to_string(),
    )]);

    let config = QuerysetConfig::load_with_env(Some(file.path()), Some(env_vars)).unwrap();
    assert_eq!(config.pagination.per_page, 20);
    assert_eq!(config.pagination.per_page_max, 40);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("querysets.toml");

    let error = QuerysetConfig::load_with_env(Some(&missing), Some(HashMap::new())).unwrap_err();
    assert!(matches!(error, ConfigurationError::Load(_)));
}

#[test]
fn test_empty_marker_is_rejected() {
    let file = config_file(".toml", "[filters]\nnegation_marker = \"\"\n");

    let error = QuerysetConfig::load_with_env(Some(file.path()), Some(HashMap::new())).unwrap_err();
    assert!(matches!(
        error,
        ConfigurationError::InvalidValue { ref field, .. } if field == "filters.negation_marker"
    ));
}

#[tokio::test]
async fn test_loaded_config_drives_pipeline() {
    let file = config_file(
        ".toml",
        "[pagination]\nper_page = 10\nper_page_max = 40\n\n[filters]\nnegation_marker = \"~\"\n",
    );
    let config = QuerysetConfig::load_with_env(Some(file.path()), Some(HashMap::new())).unwrap();

    let router = PipelineBuilder::new(config)
        .filters(worker_schema())
        .negation()
        .ordering(OrderingStage::new(["id"]).default_ordering(&["id"]))
        .pagination()
        .build(ModelProvider::new(worker_query()))
        .unwrap();

    let page = router
        .fetch_page([("contract~", "2"), ("per_page", "100")])
        .await
        .unwrap();

    assert_eq!(page.items.len(), 40);
    assert_eq!(page.items[1]["id"], json!(3));
    assert_eq!(page.headers["x-total"], "99");
    assert_eq!(page.headers["x-pages"], "3");
}
