//! Item operations on the local table database.

use async_trait::async_trait;
use tokio_rusqlite::{params, rusqlite};

use super::connection::SqliteTable;
use crate::Error;
use crate::error::StoreFailure;
use crate::store::attributes::{HASH_KEY, Item, item_id};
use crate::store::backend::{ScanFilter, TableBackend, TableSpec};

fn ensure_table(conn: &rusqlite::Connection, table: &str) -> Result<(), Error> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM kv_tables WHERE name = ?1)",
        params![table],
        |row| row.get(0),
    )?;
    if exists { Ok(()) } else { Err(Error::Store(StoreFailure::table_missing(table))) }
}

fn decode(json: &str) -> Result<Item, Error> {
    serde_json::from_str(json).map_err(|e| Error::Store(StoreFailure::malformed(format!("stored item: {e}"))))
}

#[async_trait]
impl TableBackend for SqliteTable {
    async fn get_item(&self, table: &str, id: &str) -> Result<Option<Item>, Error> {
        let table = table.to_string();
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Item>, Error> {
                ensure_table(conn, &table)?;
                let result = conn.query_row(
                    "SELECT item_json FROM kv_items WHERE table_name = ?1 AND id = ?2",
                    params![table, id],
                    |row| row.get::<_, String>(0),
                );

                match result {
                    Ok(json) => decode(&json).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put_item(&self, table: &str, item: Item) -> Result<(), Error> {
        let id = item_id(&item)
            .ok_or_else(|| Error::Store(StoreFailure::malformed(format!("item has no string {HASH_KEY:?} key"))))?
            .to_string();
        let json = serde_json::to_string(&item)
            .map_err(|e| Error::Store(StoreFailure::malformed(format!("encoding item {id}: {e}"))))?;
        let table = table.to_string();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_table(conn, &table)?;
                conn.execute(
                    "INSERT INTO kv_items (table_name, id, item_json, written_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(table_name, id) DO UPDATE SET
                        item_json = excluded.item_json,
                        written_at = excluded.written_at",
                    params![table, id, json, chrono::Utc::now().to_rfc3339()],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_item(&self, table: &str, id: &str) -> Result<(), Error> {
        let table = table.to_string();
        let id = id.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_table(conn, &table)?;
                conn.execute("DELETE FROM kv_items WHERE table_name = ?1 AND id = ?2", params![table, id])?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn scan(&self, table: &str, filter: Option<&ScanFilter>) -> Result<Vec<Item>, Error> {
        let table = table.to_string();
        let filter = filter.cloned();
        self.conn
            .call(move |conn| -> Result<Vec<Item>, Error> {
                ensure_table(conn, &table)?;
                let mut stmt = conn.prepare("SELECT item_json FROM kv_items WHERE table_name = ?1")?;
                let rows = stmt.query_map(params![table], |row| row.get::<_, String>(0))?;

                let mut items = Vec::new();
                for json in rows {
                    let item = decode(&json?)?;
                    if filter.as_ref().is_none_or(|f| f.matches(&item)) {
                        items.push(item);
                    }
                }
                Ok(items)
            })
            .await
            .map_err(Error::from)
    }

    async fn create_table(&self, table: &str, spec: &TableSpec) -> Result<(), Error> {
        let table = table.to_string();
        let spec = *spec;
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let inserted = conn.execute(
                    "INSERT INTO kv_tables (name, hash_key, read_capacity, write_capacity, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(name) DO NOTHING",
                    params![table, HASH_KEY, spec.read_capacity, spec.write_capacity, chrono::Utc::now().to_rfc3339()],
                )?;
                if inserted == 0 {
                    return Err(Error::Store(StoreFailure::table_exists(&table)));
                }
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
