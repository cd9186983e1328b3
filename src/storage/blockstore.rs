//! Block stores backing the storage shim

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{HarnessError, Result};
use cid::Cid;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use tracing::info;

/// Abstraction for block storage backends. Writing the same CID twice is a no-op.
pub trait BlockStore: Send + Sync {
    fn put(&self, cid: &Cid, bytes: &[u8]) -> Result<()>;
    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>>;
    fn has(&self, cid: &Cid) -> Result<bool>;
    fn pin(&self, cid: &Cid) -> Result<()>;
    fn is_pinned(&self, cid: &Cid) -> Result<bool>;
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

fn poisoned() -> HarnessError {
    HarnessError::DatabaseError("Lock poisoned".to_string())
}

/// Process-local store; contents vanish on restart.
#[derive(Default)]
pub struct MemoryBlockStore {
    blocks: RwLock<HashMap<Cid, Vec<u8>>>,
    pins: RwLock<HashSet<Cid>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockStore for MemoryBlockStore {
    fn put(&self, cid: &Cid, bytes: &[u8]) -> Result<()> {
        let mut blocks = self.blocks.write().map_err(|_| poisoned())?;
        blocks.entry(*cid).or_insert_with(|| bytes.to_vec());
        Ok(())
    }

    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>> {
        let blocks = self.blocks.read().map_err(|_| poisoned())?;
        Ok(blocks.get(cid).cloned())
    }

    fn has(&self, cid: &Cid) -> Result<bool> {
        let blocks = self.blocks.read().map_err(|_| poisoned())?;
        Ok(blocks.contains_key(cid))
    }

    fn pin(&self, cid: &Cid) -> Result<()> {
        if !self.has(cid)? {
            return Err(HarnessError::StorageError(format!(
                "cannot pin missing block {}",
                cid
            )));
        }
        self.pins.write().map_err(|_| poisoned())?.insert(*cid);
        Ok(())
    }

    fn is_pinned(&self, cid: &Cid) -> Result<bool> {
        Ok(self.pins.read().map_err(|_| poisoned())?.contains(cid))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.blocks.read().map_err(|_| poisoned())?.len())
    }
}

/// SQLite-backed store that survives restarts.
pub struct SqliteBlockStore {
    conn: Mutex<Connection>,
}

impl SqliteBlockStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| HarnessError::DatabaseError(format!("Failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS blocks (
                cid TEXT PRIMARY KEY,
                data BLOB NOT NULL,
                stored_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            HarnessError::DatabaseError(format!("Failed to create blocks table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS pins (
                cid TEXT PRIMARY KEY REFERENCES blocks(cid),
                pinned_at TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| HarnessError::DatabaseError(format!("Failed to create pins table: {}", e)))?;

        Ok(SqliteBlockStore {
            conn: Mutex::new(conn),
        })
    }
}

impl BlockStore for SqliteBlockStore {
    fn put(&self, cid: &Cid, bytes: &[u8]) -> Result<()> {
        let conn = self.conn.lock().map_err(|_| poisoned())?;
        conn.execute(
            "INSERT OR IGNORE INTO blocks (cid, data, stored_at) VALUES (?1, ?2, ?3)",
            params![cid.to_string(), bytes, chrono::Utc::now().to_rfc3339()],
        )
        .map_err(|e| HarnessError::DatabaseError(format!("Failed to save block: {}", e)))?;
        Ok(())
    }

    fn get(&self, cid: &Cid) -> Result<Option<Vec<u8>>> {
        let conn = self.conn.lock().map_err(|_| poisoned())?;
        let data = conn
            .query_row(
                "SELECT data FROM blocks WHERE cid = ?1",
                params![cid.to_string()],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(data)
    }

    fn has(&self, cid: &Cid) -> Result<bool> {
        let conn = self.conn.lock().map_err(|_| poisoned())?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM blocks WHERE cid = ?1",
            params![cid.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn pin(&self, cid: &Cid) -> Result<()> {
        if !self.has(cid)? {
            return Err(HarnessError::StorageError(format!(
                "cannot pin missing block {}",
                cid
            )));
        }
        let conn = self.conn.lock().map_err(|_| poisoned())?;
        conn.execute(
            "INSERT OR IGNORE INTO pins (cid, pinned_at) VALUES (?1, ?2)",
            params![cid.to_string(), chrono::Utc::now().to_rfc3339()],
        )
        .map_err(|e| HarnessError::DatabaseError(format!("Failed to pin block: {}", e)))?;
        Ok(())
    }

    fn is_pinned(&self, cid: &Cid) -> Result<bool> {
        let conn = self.conn.lock().map_err(|_| poisoned())?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM pins WHERE cid = ?1",
            params![cid.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn len(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(|_| poisoned())?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Open the backend named in the storage config.
pub fn open_block_store(config: &StorageConfig) -> Result<Arc<dyn BlockStore>> {
    match config.backend {
        StorageBackend::Memory => {
            info!("using in-memory block store");
            Ok(Arc::new(MemoryBlockStore::new()))
        }
        StorageBackend::Sqlite => {
            let path: &Path = &config.database_path;
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(|e| {
                        HarnessError::DatabaseError(format!(
                            "Failed to create data dir {:?}: {}",
                            parent, e
                        ))
                    })?;
                }
            }
            let path_str = path.to_str().ok_or_else(|| {
                HarnessError::Config(format!("database path {:?} is not UTF-8", path))
            })?;
            info!(path = path_str, "using sqlite block store");
            Ok(Arc::new(SqliteBlockStore::open(path_str)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::content_id::json_cid;
    use tempfile::TempDir;

    fn exercise(store: &dyn BlockStore) {
        let bytes = br#"{"name":"mug"}"#;
        let cid = json_cid(bytes).unwrap();

        assert!(store.is_empty().unwrap());
        assert!(store.get(&cid).unwrap().is_none());
        assert!(store.pin(&cid).is_err());

        store.put(&cid, bytes).unwrap();
        store.put(&cid, bytes).unwrap();
        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get(&cid).unwrap().unwrap(), bytes.to_vec());

        assert!(!store.is_pinned(&cid).unwrap());
        store.pin(&cid).unwrap();
        store.pin(&cid).unwrap();
        assert!(store.is_pinned(&cid).unwrap());
    }

    #[test]
    fn test_memory_store() {
        exercise(&MemoryBlockStore::new());
    }

    #[test]
    fn test_sqlite_store() {
        exercise(&SqliteBlockStore::open(":memory:").unwrap());
    }

    #[test]
    fn test_sqlite_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blocks.sqlite");
        let path = path.to_str().unwrap();
        let bytes = br#"{"name":"lamp"}"#;
        let cid = json_cid(bytes).unwrap();

        {
            let store = SqliteBlockStore::open(path).unwrap();
            store.put(&cid, bytes).unwrap();
            store.pin(&cid).unwrap();
        }

        let store = SqliteBlockStore::open(path).unwrap();
        assert_eq!(store.get(&cid).unwrap().unwrap(), bytes.to_vec());
        assert!(store.is_pinned(&cid).unwrap());
    }

    #[test]
    fn test_open_from_config_creates_data_dir() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            backend: StorageBackend::Sqlite,
            database_path: dir.path().join("nested").join("blocks.sqlite"),
            ..StorageConfig::default()
        };
        let store = open_block_store(&config).unwrap();
        assert!(store.is_empty().unwrap());
        assert!(dir.path().join("nested").exists());
    }
}
