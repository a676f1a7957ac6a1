//! Fixture rows: 100 workers, 100 tasks spread over four projects.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use router_querysets::memory::MemoryQuery;
use serde_json::{json, Value};

pub const FIXTURE_SIZE: i64 = 100;
pub const PROJECT_COUNT: i64 = 4;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn rfc3339(datetime: DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Task `id` is created `id` days after [`base_time`]
pub fn task_created_at(id: i64) -> DateTime<Utc> {
    base_time() + Duration::days(id)
}

pub fn task_project_id(id: i64) -> i64 {
    (id - 1) % PROJECT_COUNT + 1
}

/// Worker ids assigned to task `id`
pub fn task_worker_ids(id: i64) -> [i64; 2] {
    [id % 10 + 1, id % 7 + 11]
}

pub fn worker(index: i64) -> Value {
    let id = index + 1;
    let contract = (id % 2 == 0).then(|| json!({"id": id, "salary": index * 100}));
    json!({
        "id": id,
        "name": format!("Test Worker {index}"),
        "contract_id": contract.as_ref().map(|_| id),
        "contract": contract,
    })
}

pub fn task(id: i64) -> Value {
    let project_id = task_project_id(id);
    let workers: Vec<Value> = task_worker_ids(id)
        .iter()
        .map(|worker_id| json!({"id": worker_id, "name": format!("Test Worker {}", worker_id - 1)}))
        .collect();

    json!({
        "id": id,
        "cost": (id * 37 % 100) as f64 + 0.5,
        "created_at": rfc3339(task_created_at(id)),
        "description": format!("Task {id} description"),
        "is_done": id % 3 == 0,
        "project_id": project_id,
        "project": {"id": project_id, "name": format!("Project {project_id}")},
        "workers_required_max": if id % 5 == 0 { Value::Null } else { json!(id * 3 % 11) },
        "workers_required_min": id % 3 + 1,
        "workers": workers,
    })
}

pub fn workers() -> Vec<Value> {
    (0..FIXTURE_SIZE).map(worker).collect()
}

pub fn tasks() -> Vec<Value> {
    (1..=FIXTURE_SIZE).map(task).collect()
}

pub fn worker_query() -> MemoryQuery {
    MemoryQuery::from_values(workers())
}

pub fn task_query() -> MemoryQuery {
    MemoryQuery::from_values(tasks())
}

pub fn empty_query() -> MemoryQuery {
    MemoryQuery::from_values(Vec::new())
}
