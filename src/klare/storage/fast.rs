use redb::{Database, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::KvEngine;
use crate::error::{KlareError, Result};

const BLOBS: TableDefinition<&str, &str> = TableDefinition::new("blobs");

/// Fast engine: an embedded `redb` database holding all keys of one
/// facade instance in a single table. Durable on return.
pub struct RedbEngine {
    db: Database,
    path: PathBuf,
}

impl RedbEngine {
    /// Open or create the database file. Fails if the file is locked by
    /// another handle, corrupted, or the directory is unwritable; the
    /// facade treats any failure here as the signal to fall back.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(|e| KlareError::Engine(e.to_string()))?;

        // Create the table up front so reads on a fresh database
        // don't have to special-case a missing table.
        let txn = db
            .begin_write()
            .map_err(|e| KlareError::Engine(e.to_string()))?;
        txn.open_table(BLOBS)
            .map_err(|e| KlareError::Engine(e.to_string()))?;
        txn.commit().map_err(|e| KlareError::Engine(e.to_string()))?;

        debug!(path = %path.display(), "fast engine opened");
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KvEngine for RedbEngine {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| KlareError::Engine(e.to_string()))?;
        {
            let mut table = txn
                .open_table(BLOBS)
                .map_err(|e| KlareError::Engine(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| KlareError::Engine(e.to_string()))?;
        }
        txn.commit().map_err(|e| KlareError::Engine(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| KlareError::Engine(e.to_string()))?;
        let table = txn
            .open_table(BLOBS)
            .map_err(|e| KlareError::Engine(e.to_string()))?;
        let value = table
            .get(key)
            .map_err(|e| KlareError::Engine(e.to_string()))?;
        Ok(value.map(|guard| guard.value().to_string()))
    }

    fn delete(&self, key: &str) -> Result<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| KlareError::Engine(e.to_string()))?;
        {
            let mut table = txn
                .open_table(BLOBS)
                .map_err(|e| KlareError::Engine(e.to_string()))?;
            table
                .remove(key)
                .map_err(|e| KlareError::Engine(e.to_string()))?;
        }
        txn.commit().map_err(|e| KlareError::Engine(e.to_string()))?;
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| KlareError::Engine(e.to_string()))?;
        txn.delete_table(BLOBS)
            .map_err(|e| KlareError::Engine(e.to_string()))?;
        txn.open_table(BLOBS)
            .map_err(|e| KlareError::Engine(e.to_string()))?;
        txn.commit().map_err(|e| KlareError::Engine(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RedbEngine::open(&dir.path().join("test.redb")).unwrap();

        engine.set("k", "v").unwrap();
        assert_eq!(engine.get("k").unwrap(), Some("v".to_string()));

        engine.delete("k").unwrap();
        assert_eq!(engine.get("k").unwrap(), None);
    }

    #[test]
    fn clear_all_empties_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RedbEngine::open(&dir.path().join("test.redb")).unwrap();

        engine.set("a", "1").unwrap();
        engine.set("b", "2").unwrap();
        engine.clear_all().unwrap();

        assert_eq!(engine.get("a").unwrap(), None);
        assert_eq!(engine.get("b").unwrap(), None);
    }

    #[test]
    fn open_fails_when_path_is_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("occupied.redb");
        std::fs::create_dir(&path).unwrap();

        assert!(RedbEngine::open(&path).is_err());
    }
}
