//! Core of wpsnapshots: snapshot metadata and the local snapshot cache.
//!
//! This crate provides:
//! - The snapshot metadata store client, generic over a key-value table backend
//! - A SQLite table backend for offline repositories and tests
//! - The local cache directory layout and path resolution
//! - The snapshot registry tying both together
//! - Unified error types and layered configuration

pub mod cache;
pub mod command;
pub mod config;
pub mod error;
pub mod id;
pub mod record;
pub mod registry;
pub mod store;

pub use cache::{CacheDir, PathResolver};
pub use config::{AppConfig, ConfigError, Environment};
pub use error::{Error, StoreFailure};
pub use id::generate_snapshot_id;
pub use record::{SiteDescriptor, SnapshotDescriptor, SnapshotRecord};
pub use registry::{Audit, PayloadProbe, PurgeOutcome, SnapshotLocation, SnapshotRegistry, StagedSnapshot};
pub use store::{MetadataStore, SqliteTable, TableBackend, TableSpec};
