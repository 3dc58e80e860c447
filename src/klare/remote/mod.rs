//! Remote relational store boundary.
//!
//! The server is authoritative for every domain row; this module is the
//! crate's only way to talk to it. The interface is a deliberately
//! narrow row-oriented query surface: equality-filtered select, insert,
//! update, delete on named tables. Every call site scopes its filters
//! by `user_id`; there is no cross-user query anywhere.
//!
//! There are no multi-table transactions. A caller that writes N rows
//! issues N independent calls and stops at the first failure; rows
//! already written stay written.

use serde_json::Value;

use crate::error::Result;

pub mod memory;
pub mod rest;

/// A column-equality filter.
#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

impl Filter {
    pub fn eq(column: &str, value: &str) -> Self {
        Self {
            column: column.to_string(),
            value: value.to_string(),
        }
    }
}

/// Row-oriented access to the remote store.
pub trait RemoteStore {
    /// All rows of `table` matching every filter.
    fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>>;

    /// Insert one row; returns the stored row.
    fn insert(&self, table: &str, row: Value) -> Result<Value>;

    /// Merge `patch` into every matching row; returns how many rows
    /// matched.
    fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<usize>;

    /// Delete matching rows; returns how many rows were removed.
    fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize>;
}

/// Update-or-insert helper used by the save paths: patch the matching
/// row, insert when nothing matched.
pub fn upsert<R: RemoteStore>(
    remote: &R,
    table: &str,
    filters: &[Filter],
    row: Value,
) -> Result<()> {
    let matched = remote.update(table, filters, row.clone())?;
    if matched == 0 {
        remote.insert(table, row)?;
    }
    Ok(())
}
