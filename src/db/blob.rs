//! Named blob storage

use std::collections::HashMap;
use std::sync::Mutex;

use super::DbPool;
use crate::{Error, Result};

/// Key-value store of whole text blobs
pub trait BlobStore: Send + Sync {
    /// Read a blob, or `None` if it was never written
    ///
    /// # Errors
    ///
    /// Returns error if the backing store cannot be read
    fn get(&self, name: &str) -> Result<Option<String>>;

    /// Replace a blob
    ///
    /// # Errors
    ///
    /// Returns error if the backing store cannot be written
    fn put(&self, name: &str, value: &str) -> Result<()>;
}

/// Blob store backed by the `SQLite` `blobs` table
#[derive(Clone)]
pub struct SqliteBlobStore {
    pool: DbPool,
}

impl SqliteBlobStore {
    /// Create a new blob store backed by the given pool
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl BlobStore for SqliteBlobStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;
        let result = conn.query_row(
            "SELECT value FROM blobs WHERE name = ?1",
            rusqlite::params![name],
            |row| row.get(0),
        );
        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, name: &str, value: &str) -> Result<()> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO blobs (name, value, updated_at)
             VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(name) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![name, value],
        )?;
        Ok(())
    }
}

/// In-process blob store
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one blob
    #[must_use]
    pub fn with_blob(name: &str, value: &str) -> Self {
        let store = Self::default();
        if let Ok(mut blobs) = store.blobs.lock() {
            blobs.insert(name.to_string(), value.to_string());
        }
        store
    }
}

impl BlobStore for MemoryBlobStore {
    fn get(&self, name: &str) -> Result<Option<String>> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| Error::Database("blob store lock poisoned".to_string()))?;
        Ok(blobs.get(name).cloned())
    }

    fn put(&self, name: &str, value: &str) -> Result<()> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| Error::Database("blob store lock poisoned".to_string()))?;
        blobs.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_put_and_get() {
        let store = SqliteBlobStore::new(crate::db::init_memory().unwrap());
        assert!(store.get("progress").unwrap().is_none());

        store.put("progress", "[]").unwrap();
        assert_eq!(store.get("progress").unwrap().as_deref(), Some("[]"));

        store.put("progress", "[1]").unwrap();
        assert_eq!(store.get("progress").unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn sqlite_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lingo.db");

        SqliteBlobStore::new(crate::db::init(&path).unwrap())
            .put("progress", "saved")
            .unwrap();

        let reopened = SqliteBlobStore::new(crate::db::init(&path).unwrap());
        assert_eq!(reopened.get("progress").unwrap().as_deref(), Some("saved"));
    }

    #[test]
    fn memory_store() {
        let store = MemoryBlobStore::with_blob("a", "1");
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert!(store.get("b").unwrap().is_none());
        store.put("b", "2").unwrap();
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }
}
