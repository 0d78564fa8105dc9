//! Raw key-value table surface that the metadata store is built on.

use std::time::Duration;

use async_trait::async_trait;

use super::attributes::{AttributeValue, Item};
use crate::Error;

/// Provisioning settings for a snapshot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub read_capacity: i64,
    pub write_capacity: i64,
    /// How long `create_table` waits for the table to report ready.
    pub ready_timeout: Duration,
}

impl Default for TableSpec {
    fn default() -> Self {
        Self { read_capacity: 10, write_capacity: 20, ready_timeout: Duration::from_secs(120) }
    }
}

/// Scan predicate: `project` contains the needle OR `id` equals it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFilter {
    needle: String,
}

impl ScanFilter {
    /// The needle is lowercased; stored projects are lowercase already.
    pub fn new(query: &str) -> Self {
        Self { needle: query.to_lowercase() }
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    pub fn matches(&self, item: &Item) -> bool {
        let project = item.get("project").and_then(AttributeValue::as_s);
        let id = item.get("id").and_then(AttributeValue::as_s);
        project.is_some_and(|p| p.contains(&self.needle)) || id == Some(self.needle.as_str())
    }
}

/// A remote (or emulated) key-value table store.
///
/// Implementations only move items; they do not interpret them. Each call is a
/// single request with the store's own per-item atomicity.
#[async_trait]
pub trait TableBackend: Send + Sync {
    /// Consistent read by hash key.
    async fn get_item(&self, table: &str, id: &str) -> Result<Option<Item>, Error>;

    /// Unconditional write; overwrites an existing item with the same id.
    async fn put_item(&self, table: &str, item: Item) -> Result<(), Error>;

    /// Unconditional delete; a missing id is not an error.
    async fn delete_item(&self, table: &str, id: &str) -> Result<(), Error>;

    /// Full scan, following pagination to the end. `None` returns every item.
    async fn scan(&self, table: &str, filter: Option<&ScanFilter>) -> Result<Vec<Item>, Error>;

    /// Create a table keyed by `id` and wait until it is ready.
    async fn create_table(&self, table: &str, spec: &TableSpec) -> Result<(), Error>;
}
