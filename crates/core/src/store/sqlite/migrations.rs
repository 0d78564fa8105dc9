//! Schema migrations for the local table database.
//!
//! Applied versions are recorded in `_migrations`. Every pending step runs
//! in one transaction with its version row, so a failed step leaves the
//! schema at the previous version.

use tokio_rusqlite::rusqlite::{self, Transaction};
use tokio_rusqlite::{Connection, params};

use crate::Error;

/// Ordered schema steps. Versions start at 1 and increase by one.
const STEPS: &[(i64, &str)] = &[
    (1, include_str!("../../../migrations/001_tables.sql")),
    (2, include_str!("../../../migrations/002_items.sql")),
];

const TRACKING_TABLE: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
)";

fn applied_version(conn: &rusqlite::Connection) -> Result<i64, Error> {
    conn.execute(TRACKING_TABLE, [])?;
    let version = conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))?;
    Ok(version)
}

fn apply(tx: Transaction<'_>, version: i64, sql: &str) -> Result<(), Error> {
    tx.execute_batch(sql)
        .map_err(|e| Error::MigrationFailed(format!("version {version}: {e}")))?;
    tx.execute(
        "INSERT INTO _migrations (version, applied_at) VALUES (?1, ?2)",
        params![version, chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}

/// Bring the schema up to the latest version.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let current = applied_version(conn)?;
        for &(version, sql) in STEPS.iter().filter(|(version, _)| *version > current) {
            tracing::debug!(from = current, version, "migrating table store");
            apply(conn.transaction()?, version, sql)?;
        }
        Ok(())
    })
    .await
    .map_err(Error::from)
}
