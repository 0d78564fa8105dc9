//! Unified error types for wpsnapshots.
//!
//! Every failure the core can produce is one of these variants. The
//! SCREAMING_CASE prefix in each message is stable so the command layer can
//! match on it.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio_rusqlite::rusqlite;

/// Error code the remote store uses when a table is created twice.
pub const TABLE_EXISTS_CODE: &str = "ResourceInUseException";

/// Error code the remote store uses when the addressed table is missing.
pub const TABLE_MISSING_CODE: &str = "ResourceNotFoundException";

/// Error code used when an item cannot be converted to or from a record.
pub const MALFORMED_ITEM_CODE: &str = "MalformedItem";

/// Diagnostics attached to a remote-store failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreFailure {
    pub message: String,
    pub request_id: Option<String>,
    pub error_type: Option<String>,
    pub error_code: Option<String>,
}

impl StoreFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), ..Default::default() }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// An item that does not have the shape of a snapshot record.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::new(reason).with_code(MALFORMED_ITEM_CODE).with_type("Client")
    }

    pub fn table_missing(table: &str) -> Self {
        Self::new(format!("Requested resource not found: Table: {table} not found"))
            .with_code(TABLE_MISSING_CODE)
            .with_type("Client")
    }

    pub fn table_exists(table: &str) -> Self {
        Self::new(format!("Table already exists: {table}"))
            .with_code(TABLE_EXISTS_CODE)
            .with_type("Client")
    }
}

impl fmt::Display for StoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(code) = &self.error_code {
            write!(f, " (code: {code})")?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request id: {request_id})")?;
        }
        Ok(())
    }
}

/// Unified error type for snapshot metadata and cache operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The credential lacks permission on the addressed table.
    #[error("ACCESS_DENIED: {table}: {message}")]
    AccessDenied { table: String, message: String },

    /// Any other remote-store failure (network, throttling, missing table, bad item).
    #[error("STORE_ERROR: {0}")]
    Store(StoreFailure),

    /// Local cache directory could not be created or is not writable.
    #[error("DIRECTORY_ERROR: {}: {reason}", .path.display())]
    Directory { path: PathBuf, reason: String },

    /// A snapshot that the caller required does not exist.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// Malformed identifier or slug, rejected before any I/O.
    #[error("VALIDATION_ERROR: {0}")]
    Validation(String),

    /// Local table database operation failed.
    #[error("STORE_ERROR: local table: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("STORE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Subprocess could not be started.
    #[error("COMMAND_FAILED: {program}: {source}")]
    Spawn { program: String, source: std::io::Error },

    /// Subprocess exited unsuccessfully. `code` is `None` when killed by a signal.
    #[error("COMMAND_FAILED: {program} exited with {}", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    Command { program: String, code: Option<i32> },
}

impl Error {
    pub(crate) fn directory(path: &Path, reason: impl fmt::Display) -> Self {
        Error::Directory { path: path.to_path_buf(), reason: reason.to_string() }
    }

    /// Remote error code, when the failure came from the store.
    pub fn store_code(&self) -> Option<&str> {
        match self {
            Error::Store(failure) => failure.error_code.as_deref(),
            _ => None,
        }
    }

    /// Human remediation line for failures that have one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::AccessDenied { .. } => Some("Access denied. You might not have access to this repository."),
            Error::Store(failure) if failure.error_code.as_deref() == Some(TABLE_EXISTS_CODE) => {
                Some("The repository table may already exist.")
            }
            Error::Store(failure) if failure.error_code.as_deref() == Some(TABLE_MISSING_CODE) => {
                Some("The repository table does not exist. Create it before pushing snapshots.")
            }
            _ => None,
        }
    }

    /// Emit the diagnostics of a failed store operation.
    pub(crate) fn trace(&self, operation: &str, table: &str) {
        match self {
            Error::Store(failure) => tracing::warn!(
                operation,
                table,
                request_id = failure.request_id.as_deref().unwrap_or("-"),
                error_type = failure.error_type.as_deref().unwrap_or("-"),
                error_code = failure.error_code.as_deref().unwrap_or("-"),
                "{}",
                failure.message
            ),
            other => tracing::warn!(operation, table, "{other}"),
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
