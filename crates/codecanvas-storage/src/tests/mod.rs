use super::*;
use serde_json::json;

#[test]
fn test_sqlite_set_get_overwrite() -> Result<(), StorageError> {
    let store = SqliteStore::new_in_memory()?;
    assert_eq!(store.get("file_app.py")?, None);

    store.set("file_app.py", "x = 1")?;
    assert_eq!(store.get("file_app.py")?.as_deref(), Some("x = 1"));

    store.set("file_app.py", "x = 2")?;
    assert_eq!(store.get("file_app.py")?.as_deref(), Some("x = 2"));
    assert_eq!(store.keys()?, vec!["file_app.py".to_string()]);
    Ok(())
}

#[test]
fn test_sqlite_remove_and_clear() -> Result<(), StorageError> {
    let store = SqliteStore::new_in_memory()?;
    store.set("a", "1")?;
    store.set("b", "2")?;
    assert!(store.remove("a")?);
    assert!(!store.remove("a")?);
    store.clear()?;
    assert!(store.keys()?.is_empty());
    Ok(())
}

#[test]
fn test_sqlite_schema_version_is_set() -> Result<(), StorageError> {
    let store = SqliteStore::new_in_memory()?;
    assert_eq!(store.schema_version()?, SCHEMA_VERSION);
    Ok(())
}

#[test]
fn test_sqlite_survives_reopen() -> Result<(), StorageError> {
    let dir = tempfile::tempdir().map_err(|e| StorageError::Other(e.to_string()))?;
    let path = dir.path().join("canvas.db");
    {
        let store = SqliteStore::open(&path)?;
        store.set(&buffer_key("app.py"), "print('hi')")?;
    }
    let store = SqliteStore::open(&path)?;
    assert_eq!(
        store.get(&buffer_key("app.py"))?.as_deref(),
        Some("print('hi')")
    );
    Ok(())
}

#[test]
fn test_memory_store_behaves_like_sqlite() -> Result<(), StorageError> {
    let store = MemoryStore::new();
    assert!(store.is_empty());
    store.set("k", "v")?;
    assert_eq!(store.get("k")?.as_deref(), Some("v"));
    assert_eq!(store.len(), 1);
    assert!(store.remove("k")?);
    assert_eq!(store.get("k")?, None);
    Ok(())
}

#[test]
fn test_json_blobs_roundtrip_opaquely() -> Result<(), StorageError> {
    let store = MemoryStore::new();
    let key = documentation_key("app.py");
    let blob = json!({"app.py.main": {"summary": "entry point"}});
    store.set_json(&key, &blob)?;
    let loaded: Option<serde_json::Value> = store.get_json(&key)?;
    assert_eq!(loaded, Some(blob));

    store.set(&testing_key("app.py"), "not json")?;
    let broken: Result<Option<serde_json::Value>, _> = store.get_json(&testing_key("app.py"));
    assert!(matches!(broken, Err(StorageError::Json(_))));
    Ok(())
}

#[test]
fn test_key_layout() {
    assert_eq!(buffer_key("app.py"), "file_app.py");
    assert_eq!(documentation_key("app.py"), "app.py.documentation.json");
    assert_eq!(testing_key("app.py"), "app.py.testing.json");
}
