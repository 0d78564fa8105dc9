//! End-to-end snapshot lifecycle against a file-backed local table store.

use std::path::{Path, PathBuf};

use wpsnapshots_core::{
    AppConfig, CacheDir, Environment, MetadataStore, PathResolver, SnapshotDescriptor, SnapshotLocation,
    SnapshotRegistry, SqliteTable,
};

async fn open_registry(workdir: &Path) -> SnapshotRegistry<SqliteTable> {
    let config = AppConfig {
        repository: Some("Agency".into()),
        dir: Some(workdir.join("cache")),
        ..Default::default()
    };
    config.validate().unwrap();

    let resolver = PathResolver::new(Environment {
        cwd: workdir.to_path_buf(),
        home: workdir.join("home"),
        snapshots_dir: config.dir.clone(),
    });
    let cache = CacheDir::from_resolver(&resolver);
    let backend = SqliteTable::open(config.table_db_path(&resolver)).await.unwrap();

    let store = MetadataStore::new(backend, config.require_repository().unwrap())
        .unwrap()
        .with_table_spec(config.table_spec());
    if let Err(e) = store.create_table().await {
        assert!(e.hint().is_some_and(|h| h.contains("already exist")), "unexpected: {e}");
    }
    SnapshotRegistry::new(store, cache)
}

fn acme() -> SnapshotDescriptor {
    SnapshotDescriptor {
        project: "Acme Site".into(),
        description: "pre-launch".into(),
        author: "Jo".into(),
        table_prefix: "wp_".into(),
        size: 1024,
        wp_version: "6.5.2".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn search_and_delete_by_project() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = open_registry(tmp.path()).await;
    let store = registry.store();
    assert_eq!(store.table(), "wpsnapshots-agency");

    store.insert("abc123", &acme()).await.unwrap();

    let hits = store.search("acme").await.unwrap();
    assert_eq!(hits.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["abc123"]);
    assert!(store.search("zzz").await.unwrap().is_empty());

    store.delete("abc123").await.unwrap();
    assert!(store.get("abc123").await.unwrap().is_none());
}

#[tokio::test]
async fn purge_removes_cached_payload() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = open_registry(tmp.path()).await;
    let cache = registry.cache();
    assert_eq!(cache.root(), PathBuf::from(tmp.path().join("cache")));

    let dir = cache.ensure_snapshot_dir("deadbeef").await.unwrap();
    std::fs::write(dir.join("data.sql.gz"), b"\x1f\x8b").unwrap();
    assert!(cache.is_payload_cached("deadbeef").await.unwrap());

    let outcome = registry.purge("deadbeef").await.unwrap();
    assert!(outcome.record.is_ok());
    assert!(matches!(outcome.cache, Ok(true)));
    assert!(!dir.exists());
    assert!(!cache.is_payload_cached("deadbeef").await.unwrap());
}

#[tokio::test]
async fn staged_snapshot_survives_reopen() {
    let tmp = tempfile::tempdir().unwrap();

    let staged_id = {
        let registry = open_registry(tmp.path()).await;
        let staged = registry.stage().await.unwrap();
        std::fs::write(&staged.payload_path, b"dump").unwrap();
        registry.register_staged(&staged.id, &acme()).await.unwrap();
        staged.id
    };

    let registry = open_registry(tmp.path()).await;
    match registry.locate(&staged_id).await.unwrap() {
        SnapshotLocation::Both(record) => {
            assert_eq!(record.project, "acme site");
            assert_eq!(record.repository, "agency");
        }
        other => panic!("expected Both, got {other:?}"),
    }
    assert!(registry.orphans().await.unwrap().is_empty());
}
