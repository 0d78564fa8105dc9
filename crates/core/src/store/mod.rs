//! Snapshot metadata store client.
//!
//! [`MetadataStore`] addresses one repository. The repository is a hard
//! partition: every call goes to the table `wpsnapshots-<repository>`, so
//! records of different repositories never see each other.
//!
//! The client owns everything that gives items meaning (record marshalling,
//! tombstone handling, project lowercasing, time stamping); the
//! [`TableBackend`] only moves items.

pub mod attributes;
pub mod backend;
pub mod sqlite;

pub use attributes::{AttributeValue, Item};
pub use backend::{ScanFilter, TableBackend, TableSpec};
pub use sqlite::SqliteTable;

use crate::id::{validate_slug, validate_snapshot_id};
use crate::record::{SnapshotDescriptor, SnapshotRecord};
use crate::Error;

/// Prefix of every snapshot table name.
pub const TABLE_PREFIX: &str = "wpsnapshots";

/// Name of the table holding a repository's records.
pub fn table_name(repository: &str) -> String {
    format!("{TABLE_PREFIX}-{repository}")
}

/// Metadata store client bound to one repository.
#[derive(Debug, Clone)]
pub struct MetadataStore<B> {
    backend: B,
    repository: String,
    table: String,
    spec: TableSpec,
}

impl<B: TableBackend> MetadataStore<B> {
    /// Bind `backend` to `repository`. The repository must be a valid slug.
    pub fn new(backend: B, repository: &str) -> Result<Self, Error> {
        let repository = validate_slug(repository)?;
        let table = table_name(&repository);
        Ok(Self { backend, repository, table, spec: TableSpec::default() })
    }

    /// Provisioning settings used by [`MetadataStore::create_table`].
    pub fn with_table_spec(mut self, spec: TableSpec) -> Self {
        self.spec = spec;
        self
    }

    /// Lowercased repository slug this store is bound to.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Table holding this repository's records, `wpsnapshots-<repository>`.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Underlying table backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Consistent read of one record.
    ///
    /// Returns `None` when the id is absent or the stored item is a tombstone.
    pub async fn get(&self, id: &str) -> Result<Option<SnapshotRecord>, Error> {
        validate_snapshot_id(id)?;
        tracing::debug!(table = %self.table, id, "getting snapshot");

        let item = self
            .backend
            .get_item(&self.table, id)
            .await
            .inspect_err(|e| e.trace("get", &self.table))?;

        match item {
            None => Ok(None),
            Some(item) if attributes::is_tombstone(&item) => {
                tracing::debug!(table = %self.table, id, "ignoring tombstoned snapshot");
                Ok(None)
            }
            Some(item) => attributes::unmarshal(&item)
                .map(Some)
                .inspect_err(|e| e.trace("get", &self.table)),
        }
    }

    /// Write a record for `id`, overwriting any existing one.
    ///
    /// The creation time is stamped here. The returned record is exactly
    /// what was written.
    pub async fn insert(&self, id: &str, descriptor: &SnapshotDescriptor) -> Result<SnapshotRecord, Error> {
        validate_snapshot_id(id)?;
        let time = chrono::Utc::now().timestamp();
        let record = SnapshotRecord::from_descriptor(id, &self.repository, time, descriptor);

        tracing::debug!(table = %self.table, id, project = %record.project, "inserting snapshot");
        self.backend
            .put_item(&self.table, attributes::marshal(&record))
            .await
            .inspect_err(|e| e.trace("insert", &self.table))?;

        Ok(record)
    }

    /// Delete a record. Deleting an absent id succeeds.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        validate_snapshot_id(id)?;
        tracing::debug!(table = %self.table, id, "deleting snapshot");
        self.backend
            .delete_item(&self.table, id)
            .await
            .inspect_err(|e| e.trace("delete", &self.table))
    }

    /// Search the repository.
    ///
    /// `"*"` returns every record. Any other query matches records whose
    /// project contains it (case-insensitively) or whose id equals it.
    /// This is a full table scan, O(table size), and the order of the
    /// results is unspecified. Tombstoned items are skipped.
    pub async fn search(&self, query: &str) -> Result<Vec<SnapshotRecord>, Error> {
        let filter = (query != "*").then(|| ScanFilter::new(query));
        tracing::debug!(table = %self.table, query, "scanning snapshots");

        let items = self
            .backend
            .scan(&self.table, filter.as_ref())
            .await
            .inspect_err(|e| e.trace("search", &self.table))?;

        items
            .iter()
            .filter(|item| !attributes::is_tombstone(item))
            .map(attributes::unmarshal)
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| e.trace("search", &self.table))
    }

    /// Create the repository table and wait until it is ready.
    ///
    /// A table that already exists is reported as a store error with the
    /// remote's code; see [`Error::hint`].
    pub async fn create_table(&self) -> Result<(), Error> {
        tracing::info!(table = %self.table, read = self.spec.read_capacity, write = self.spec.write_capacity, "creating table");
        self.backend
            .create_table(&self.table, &self.spec)
            .await
            .inspect_err(|e| e.trace("create_table", &self.table))
    }
}
