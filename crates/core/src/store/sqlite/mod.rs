//! SQLite emulation of the remote key-value tables.
//!
//! Tables are rows in `kv_tables`; items are wire-typed JSON rows in
//! `kv_items`, keyed by `(table_name, id)`. Errors mirror the remote store's
//! codes so callers cannot tell the backends apart.

mod connection;
mod items;
mod migrations;

pub use connection::SqliteTable;
