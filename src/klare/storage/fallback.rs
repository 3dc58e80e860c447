use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::KvEngine;
use crate::error::Result;

/// Fallback engine: one file per key under a dedicated directory.
///
/// Writes do not hit disk immediately. `set` appends to a pending
/// queue; the queue drains on [`KvEngine::flush`], before reads, and on
/// drop. A caller that writes and then reads through a path that does
/// not flush will not observe its own write.
pub struct FileEngine {
    dir: PathBuf,
    pending: RefCell<Vec<(String, String)>>,
}

impl FileEngine {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        debug!(dir = %dir.display(), "fallback engine opened");
        Ok(Self {
            dir: dir.to_path_buf(),
            pending: RefCell::new(Vec::new()),
        })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        // Keys are fixed enum strings or legacy aliases, never user
        // input, so a flat sanitize is enough.
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(safe)
    }

    /// Write a single value to its file, tmp-then-rename so a partial
    /// write never replaces a good blob.
    fn persist(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl KvEngine for FileEngine {
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.pending
            .borrow_mut()
            .push((key.to_string(), value.to_string()));
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        self.flush()?;
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.pending.borrow_mut().retain(|(k, _)| k != key);
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn clear_all(&self) -> Result<()> {
        self.pending.borrow_mut().clear();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let queued: Vec<(String, String)> = self.pending.borrow_mut().drain(..).collect();
        for (key, value) in queued {
            self.persist(&key, &value)?;
        }
        Ok(())
    }
}

impl Drop for FileEngine {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "fallback engine lost queued writes on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_is_queued_until_flush() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FileEngine::open(dir.path()).unwrap();

        engine.set("k", "v").unwrap();
        assert!(!dir.path().join("k").exists());

        engine.flush().unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("k")).unwrap(), "v");
    }

    #[test]
    fn get_flushes_first() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FileEngine::open(dir.path()).unwrap();

        engine.set("k", "v").unwrap();
        assert_eq!(engine.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn delete_drops_queued_writes_too() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FileEngine::open(dir.path()).unwrap();

        engine.set("k", "v").unwrap();
        engine.delete("k").unwrap();
        assert_eq!(engine.get("k").unwrap(), None);
    }

    #[test]
    fn last_queued_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FileEngine::open(dir.path()).unwrap();

        engine.set("k", "old").unwrap();
        engine.set("k", "new").unwrap();
        assert_eq!(engine.get("k").unwrap(), Some("new".to_string()));
    }

    #[test]
    fn queued_writes_survive_drop() {
        let dir = tempfile::tempdir().unwrap();
        {
            let engine = FileEngine::open(dir.path()).unwrap();
            engine.set("k", "v").unwrap();
        }
        let engine = FileEngine::open(dir.path()).unwrap();
        assert_eq!(engine.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn clear_all_removes_files_and_queue() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FileEngine::open(dir.path()).unwrap();

        engine.set("a", "1").unwrap();
        engine.flush().unwrap();
        engine.set("b", "2").unwrap();
        engine.clear_all().unwrap();

        assert_eq!(engine.get("a").unwrap(), None);
        assert_eq!(engine.get("b").unwrap(), None);
    }
}
