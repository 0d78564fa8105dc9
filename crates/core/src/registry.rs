//! Snapshot lifecycle across the metadata store and the local cache.
//!
//! [`SnapshotRegistry`] is the only type that mutates both sides for an id.
//! The two sides are never updated atomically: each operation reports what
//! happened on each side so callers can reconcile.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::Error;
use crate::cache::CacheDir;
use crate::id::{generate_snapshot_id, validate_snapshot_id};
use crate::record::{SnapshotDescriptor, SnapshotRecord};
use crate::store::{MetadataStore, TableBackend};

/// Where a snapshot currently exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotLocation {
    /// Record in the store and payload in the local cache.
    Both(SnapshotRecord),
    /// Record in the store, nothing cached locally.
    RecordOnly(SnapshotRecord),
    /// Cached payload with no record (orphan, or not registered yet).
    CacheOnly,
    Neither,
}

impl SnapshotLocation {
    pub fn record(&self) -> Option<&SnapshotRecord> {
        match self {
            SnapshotLocation::Both(record) | SnapshotLocation::RecordOnly(record) => Some(record),
            SnapshotLocation::CacheOnly | SnapshotLocation::Neither => None,
        }
    }

    /// The record, or `Error::NotFound` naming `id` when there is none.
    pub fn require_record(&self, id: &str) -> Result<&SnapshotRecord, Error> {
        self.record()
            .ok_or_else(|| Error::NotFound(format!("snapshot {id} has no record in the repository")))
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, SnapshotLocation::Both(_) | SnapshotLocation::CacheOnly)
    }
}

/// Result of [`SnapshotRegistry::purge`]; each side is reported on its own.
#[derive(Debug)]
pub struct PurgeOutcome {
    pub id: String,
    /// Remote record deletion.
    pub record: Result<(), Error>,
    /// Local directory removal; `Ok(false)` if nothing was cached.
    pub cache: Result<bool, Error>,
}

impl PurgeOutcome {
    pub fn is_complete(&self) -> bool {
        self.record.is_ok() && self.cache.is_ok()
    }
}

/// A fresh id with its cache directory, ready for the payload to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSnapshot {
    pub id: String,
    pub dir: PathBuf,
    pub payload_path: PathBuf,
}

/// Answers whether a payload is durably stored in remote object storage.
#[async_trait]
pub trait PayloadProbe: Send + Sync {
    async fn payload_exists(&self, repository: &str, id: &str) -> Result<bool, Error>;
}

/// Agreement between a record and its remote payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audit {
    Consistent(SnapshotRecord),
    /// The record exists but its payload never reached remote storage.
    DanglingRecord(SnapshotRecord),
    NoRecord,
}

pub struct SnapshotRegistry<B> {
    store: MetadataStore<B>,
    cache: CacheDir,
}

impl<B: TableBackend> SnapshotRegistry<B> {
    pub fn new(store: MetadataStore<B>, cache: CacheDir) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &MetadataStore<B> {
        &self.store
    }

    pub fn cache(&self) -> &CacheDir {
        &self.cache
    }

    /// Register a snapshot under a freshly generated id.
    ///
    /// The payload must already be fully written to the cache for that id;
    /// this is not re-checked. Use [`SnapshotRegistry::stage`] and
    /// [`SnapshotRegistry::register_staged`] when the id is needed first.
    pub async fn register(&self, descriptor: &SnapshotDescriptor) -> Result<SnapshotRecord, Error> {
        let id = generate_snapshot_id();
        self.store.insert(&id, descriptor).await
    }

    /// Reserve a fresh id and create its cache directory.
    pub async fn stage(&self) -> Result<StagedSnapshot, Error> {
        let id = generate_snapshot_id();
        let dir = self.cache.ensure_snapshot_dir(&id).await?;
        let payload_path = self.cache.payload_path(&id)?;
        tracing::debug!(id, path = %dir.display(), "staged snapshot");
        Ok(StagedSnapshot { id, dir, payload_path })
    }

    /// Register a staged snapshot once its payload is in the cache.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the payload file does not exist yet.
    pub async fn register_staged(&self, id: &str, descriptor: &SnapshotDescriptor) -> Result<SnapshotRecord, Error> {
        if !self.cache.is_payload_cached(id).await? {
            return Err(Error::Validation(format!("payload for snapshot {id} is not in the cache")));
        }
        self.store.insert(id, descriptor).await
    }

    /// Find a snapshot in the store and in the local cache.
    pub async fn locate(&self, id: &str) -> Result<SnapshotLocation, Error> {
        validate_snapshot_id(id)?;
        let record = self.store.get(id).await?;
        let cached = self.cache.is_payload_cached(id).await?;

        Ok(match (record, cached) {
            (Some(record), true) => SnapshotLocation::Both(record),
            (Some(record), false) => SnapshotLocation::RecordOnly(record),
            (None, true) => SnapshotLocation::CacheOnly,
            (None, false) => SnapshotLocation::Neither,
        })
    }

    /// Delete the remote record and the local cache directory.
    ///
    /// Both halves are always attempted. Only an invalid id fails the call.
    pub async fn purge(&self, id: &str) -> Result<PurgeOutcome, Error> {
        validate_snapshot_id(id)?;
        let record = self.store.delete(id).await;
        let cache = self.cache.remove_snapshot_dir(id).await;

        if let Err(e) = &cache {
            tracing::warn!(id, error = %e, "could not remove cached snapshot");
        }
        tracing::info!(id, record_deleted = record.is_ok(), cache_removed = ?cache.as_ref().ok(), "purged snapshot");

        Ok(PurgeOutcome { id: id.to_string(), record, cache })
    }

    /// Check that a registered snapshot's payload reached remote storage.
    pub async fn audit(&self, id: &str, probe: &dyn PayloadProbe) -> Result<Audit, Error> {
        let Some(record) = self.store.get(id).await? else {
            return Ok(Audit::NoRecord);
        };

        if probe.payload_exists(self.store.repository(), id).await? {
            Ok(Audit::Consistent(record))
        } else {
            tracing::warn!(id, repository = self.store.repository(), "record has no remote payload");
            Ok(Audit::DanglingRecord(record))
        }
    }

    /// Cached ids that have no record in the store.
    pub async fn orphans(&self) -> Result<Vec<String>, Error> {
        let mut orphans = Vec::new();
        for id in self.cache.cached_ids().await? {
            if self.store.get(&id).await?.is_none() {
                orphans.push(id);
            }
        }
        Ok(orphans)
    }
}
