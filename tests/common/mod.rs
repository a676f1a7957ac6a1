#![allow(dead_code)] // Each test binary uses a different subset

pub mod fixtures;
pub mod routers;
pub mod strategies;

pub use fixtures::*;
pub use routers::*;

use router_querysets::memory::Row;

/// `id` column of fetched rows, in order
pub fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter()
        .map(|row| row.get("id").and_then(|id| id.as_i64()).expect("row without id"))
        .collect()
}
