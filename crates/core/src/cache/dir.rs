//! The local snapshot cache tree.
//!
//! Layout: `<root>/<id>/data.sql.gz`, plus any asset files the command layer
//! puts next to it. Cache presence is a filesystem probe, not an index; the
//! metadata store stays the source of truth for which snapshots exist.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::Error;
use crate::id::validate_snapshot_id;

use super::paths::PathResolver;

/// File name of the compressed database dump inside a snapshot directory.
pub const PAYLOAD_FILE: &str = "data.sql.gz";

/// Handle on the snapshot cache root.
///
/// There is no locking: two processes working on the same id may race on
/// directory creation, which is harmless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_resolver(resolver: &PathResolver) -> Self {
        Self::new(resolver.cache_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot_dir(&self, id: &str) -> Result<PathBuf, Error> {
        Ok(self.root.join(validate_snapshot_id(id)?))
    }

    pub fn payload_path(&self, id: &str) -> Result<PathBuf, Error> {
        Ok(self.snapshot_dir(id)?.join(PAYLOAD_FILE))
    }

    /// Create the cache root if absent and check that it is writable.
    pub async fn ensure_root(&self) -> Result<(), Error> {
        create_dir(&self.root, true).await?;
        check_writable(&self.root).await
    }

    /// Create `<root>/<id>/` (and the root first) and check that it is writable.
    ///
    /// If the snapshot directory fails, the root may be left behind.
    pub async fn ensure_snapshot_dir(&self, id: &str) -> Result<PathBuf, Error> {
        let dir = self.snapshot_dir(id)?;
        self.ensure_root().await?;
        create_dir(&dir, false).await?;
        check_writable(&dir).await?;
        Ok(dir)
    }

    /// Whether the compressed dump for `id` exists.
    ///
    /// Existence only: a truncated or corrupt file still counts as cached.
    pub async fn is_payload_cached(&self, id: &str) -> Result<bool, Error> {
        let path = self.payload_path(id)?;
        fs::try_exists(&path).await.map_err(|e| Error::directory(&path, e))
    }

    /// Remove the snapshot directory for `id`. Returns `false` if it was not there.
    pub async fn remove_snapshot_dir(&self, id: &str) -> Result<bool, Error> {
        let dir = self.snapshot_dir(id)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::debug!(path = %dir.display(), "removed cached snapshot");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::directory(&dir, e)),
        }
    }

    /// Ids of every snapshot directory under the root, sorted.
    ///
    /// Entries whose names are not valid ids are ignored.
    pub async fn cached_ids(&self) -> Result<Vec<String>, Error> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::directory(&self.root, e)),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Error::directory(&self.root, e))? {
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| Error::directory(&entry.path(), e))?
                .is_dir();
            let name = entry.file_name();
            match name.to_str() {
                Some(name) if is_dir && validate_snapshot_id(name).is_ok() => ids.push(name.to_string()),
                _ => {}
            }
        }
        ids.sort();
        Ok(ids)
    }
}

async fn create_dir(path: &Path, recursive: bool) -> Result<(), Error> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(recursive);
    #[cfg(unix)]
    builder.mode(0o755);

    match builder.create(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(Error::directory(path, e)),
    }
}

/// Writable means an anonymous temp file can be created in `path` by this process.
async fn check_writable(path: &Path) -> Result<(), Error> {
    let meta = fs::metadata(path).await.map_err(|e| Error::directory(path, e))?;
    if !meta.is_dir() {
        return Err(Error::directory(path, "not a directory"));
    }

    let dir = path.to_path_buf();
    let probe = tokio::task::spawn_blocking(move || tempfile::tempfile_in(&dir))
        .await
        .map_err(|e| Error::directory(path, e))?;
    match probe {
        Ok(_) => Ok(()),
        Err(e) => Err(Error::directory(path, format!("not writable: {e}"))),
    }
}
