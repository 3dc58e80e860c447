use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;

use super::{Filter, RemoteStore};
use crate::error::Result;

/// In-memory remote store: a map of table name to rows. Used by tests
/// and by offline runs where no endpoint is configured.
#[derive(Default)]
pub struct MemoryRemote {
    tables: RefCell<HashMap<String, Vec<Value>>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .borrow()
            .get(table)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| {
        row.get(&f.column).is_some_and(|v| match v {
            Value::String(s) => s == &f.value,
            other => other.to_string() == f.value,
        })
    })
}

fn merge_patch(row: &mut Value, patch: &Value) {
    if let (Value::Object(row_map), Value::Object(patch_map)) = (row, patch) {
        for (k, v) in patch_map {
            row_map.insert(k.clone(), v.clone());
        }
    }
}

impl RemoteStore for MemoryRemote {
    fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        Ok(self
            .tables
            .borrow()
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn insert(&self, table: &str, row: Value) -> Result<Value> {
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<usize> {
        let mut tables = self.tables.borrow_mut();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let mut matched = 0;
        for row in rows.iter_mut() {
            if matches(row, filters) {
                merge_patch(row, &patch);
                matched += 1;
            }
        }
        Ok(matched)
    }

    fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize> {
        let mut tables = self.tables.borrow_mut();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches(row, filters));
        Ok(before - rows.len())
    }
}
