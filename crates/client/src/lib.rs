//! Hosted table backend for wpsnapshots.
//!
//! Pairs [`wpsnapshots_core::MetadataStore`] with DynamoDB:
//!
//! ```no_run
//! # async fn demo() -> Result<(), wpsnapshots_core::Error> {
//! use wpsnapshots_client::DynamoTable;
//! use wpsnapshots_core::{AppConfig, MetadataStore};
//!
//! let config = AppConfig { repository: Some("main".into()), ..Default::default() };
//! let backend = DynamoTable::connect(&config).await;
//! let store = MetadataStore::new(backend, "main")?.with_table_spec(config.table_spec());
//! let hits = store.search("*").await?;
//! # let _ = hits;
//! # Ok(())
//! # }
//! ```

pub mod dynamo;

pub use dynamo::DynamoTable;
