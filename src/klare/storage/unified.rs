use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use super::fallback::FileEngine;
use super::fast::RedbEngine;
use super::{EngineKind, KvEngine};
use crate::error::Result;

/// Probe key for the fast engine's construction-time self-test.
const FAST_PROBE_KEY: &str = "__storage_test__";
/// Probe key for the fallback engine's own self-test.
const FALLBACK_PROBE_KEY: &str = "__fallback_storage_test__";

enum ActiveEngine {
    Fast(RedbEngine),
    Fallback(FileEngine),
    None,
}

/// Unified storage facade over the two engines.
///
/// Construction never fails: if neither engine passes its self-test the
/// instance degrades to logged no-ops and the app keeps running without
/// persistence. None of the operations propagates an engine error to
/// the caller; failures are logged and swallowed.
///
/// Each instance owns its own engine handle under its own storage id.
/// Instances are not meant to be shared across domain stores.
pub struct UnifiedStorage {
    engine: ActiveEngine,
    id: String,
    root: PathBuf,
}

impl UnifiedStorage {
    /// Open storage under `root` for the given storage id. Tries the
    /// fast engine first; on any self-test failure falls back to the
    /// file engine for the lifetime of this instance.
    pub fn open(root: &Path, id: &str) -> Self {
        let engine = match Self::open_fast(root, id) {
            Ok(fast) => {
                debug!(id, "storage running on fast engine");
                ActiveEngine::Fast(fast)
            }
            Err(e) => {
                warn!(id, error = %e, "fast engine unavailable, falling back");
                match Self::open_fallback(root, id) {
                    Ok(fallback) => ActiveEngine::Fallback(fallback),
                    Err(e) => {
                        error!(id, error = %e, "no storage engine available, persistence disabled");
                        ActiveEngine::None
                    }
                }
            }
        };
        Self {
            engine,
            id: id.to_string(),
            root: root.to_path_buf(),
        }
    }

    fn open_fast(root: &Path, id: &str) -> Result<RedbEngine> {
        let engine = RedbEngine::open(&root.join(format!("{id}.redb")))?;
        Self::self_test(&engine, FAST_PROBE_KEY)?;
        Ok(engine)
    }

    fn open_fallback(root: &Path, id: &str) -> Result<FileEngine> {
        let engine = FileEngine::open(&root.join(id))?;
        Self::self_test(&engine, FALLBACK_PROBE_KEY)?;
        Ok(engine)
    }

    /// Write/read/delete round-trip with a literal payload. Any failure
    /// disqualifies the engine.
    fn self_test<E: KvEngine>(engine: &E, probe: &str) -> Result<()> {
        engine.set(probe, "test")?;
        engine.flush()?;
        engine.get(probe)?;
        engine.delete(probe)?;
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind(&self) -> EngineKind {
        match self.engine {
            ActiveEngine::Fast(_) => EngineKind::Fast,
            ActiveEngine::Fallback(_) => EngineKind::Fallback,
            ActiveEngine::None => EngineKind::None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.engine, ActiveEngine::None)
    }

    /// Write through to the active engine. On the fallback engine the
    /// value only enters the pending queue; durability is not confirmed
    /// when this returns.
    pub fn set(&self, key: &str, value: &str) {
        let outcome = match &self.engine {
            ActiveEngine::Fast(e) => e.set(key, value),
            ActiveEngine::Fallback(e) => e.set(key, value),
            ActiveEngine::None => return,
        };
        if let Err(e) = outcome {
            warn!(id = %self.id, key, error = %e, "storage write failed");
        }
    }

    /// Synchronous read. Only meaningful on the fast engine; on the
    /// fallback engine this returns `None` unconditionally because
    /// queued writes may not have reached disk. Use [`Self::load_str`]
    /// when the engine is not known.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match &self.engine {
            ActiveEngine::Fast(e) => match e.get(key) {
                Ok(value) => value,
                Err(e) => {
                    warn!(id = %self.id, key, error = %e, "storage read failed");
                    None
                }
            },
            ActiveEngine::Fallback(_) | ActiveEngine::None => None,
        }
    }

    /// Read that is valid on every engine: drains the fallback queue
    /// first, then reads. On the fast engine identical to `get_str`.
    pub fn load_str(&self, key: &str) -> Option<String> {
        let outcome = match &self.engine {
            ActiveEngine::Fast(e) => e.get(key),
            ActiveEngine::Fallback(e) => e.get(key),
            ActiveEngine::None => return None,
        };
        match outcome {
            Ok(value) => value,
            Err(e) => {
                warn!(id = %self.id, key, error = %e, "storage read failed");
                None
            }
        }
    }

    pub fn delete(&self, key: &str) {
        let outcome = match &self.engine {
            ActiveEngine::Fast(e) => e.delete(key),
            ActiveEngine::Fallback(e) => e.delete(key),
            ActiveEngine::None => return,
        };
        if let Err(e) = outcome {
            warn!(id = %self.id, key, error = %e, "storage delete failed");
        }
    }

    pub fn clear_all(&self) {
        let outcome = match &self.engine {
            ActiveEngine::Fast(e) => e.clear_all(),
            ActiveEngine::Fallback(e) => e.clear_all(),
            ActiveEngine::None => return,
        };
        if let Err(e) = outcome {
            warn!(id = %self.id, error = %e, "storage clear failed");
        }
    }

    /// Push queued fallback writes to disk. A no-op on the fast engine.
    pub fn flush(&self) {
        let outcome = match &self.engine {
            ActiveEngine::Fast(e) => e.flush(),
            ActiveEngine::Fallback(e) => e.flush(),
            ActiveEngine::None => return,
        };
        if let Err(e) = outcome {
            warn!(id = %self.id, error = %e, "storage flush failed");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{open_on_fallback, open_on_nothing};
    use super::*;

    #[test]
    fn selects_fast_engine_when_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UnifiedStorage::open(dir.path(), "main");
        assert_eq!(storage.kind(), EngineKind::Fast);
        assert!(storage.is_available());
    }

    #[test]
    fn fast_engine_reads_back_synchronously() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UnifiedStorage::open(dir.path(), "main");

        storage.set("k", "v");
        assert_eq!(storage.get_str("k"), Some("v".to_string()));
        assert_eq!(storage.load_str("k"), Some("v".to_string()));
    }

    #[test]
    fn fallback_sync_read_is_blind_but_load_sees_the_write() {
        let dir = tempfile::tempdir().unwrap();
        let storage = open_on_fallback(dir.path(), "main");

        storage.set("k", "v");
        assert_eq!(storage.get_str("k"), None);
        assert_eq!(storage.load_str("k"), Some("v".to_string()));
    }

    #[test]
    fn fallback_is_eventually_consistent_across_many_writes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = open_on_fallback(dir.path(), "main");

        for i in 0..20 {
            storage.set(&format!("key-{i}"), &format!("value-{i}"));
        }
        for i in 0..20 {
            assert_eq!(
                storage.load_str(&format!("key-{i}")),
                Some(format!("value-{i}"))
            );
        }
    }

    #[test]
    fn no_engine_degrades_to_noops() {
        let dir = tempfile::tempdir().unwrap();
        let storage = open_on_nothing(dir.path(), "main");

        assert!(!storage.is_available());
        storage.set("k", "v");
        storage.delete("k");
        storage.clear_all();
        assert_eq!(storage.get_str("k"), None);
        assert_eq!(storage.load_str("k"), None);
    }

    #[test]
    fn probe_keys_are_cleaned_up_after_selection() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UnifiedStorage::open(dir.path(), "main");
        assert_eq!(storage.load_str(FAST_PROBE_KEY), None);

        let dir = tempfile::tempdir().unwrap();
        let storage = open_on_fallback(dir.path(), "main");
        assert_eq!(storage.load_str(FALLBACK_PROBE_KEY), None);
    }

    #[test]
    fn clear_all_wipes_every_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UnifiedStorage::open(dir.path(), "main");

        storage.set("a", "1");
        storage.set("b", "2");
        storage.clear_all();
        assert_eq!(storage.get_str("a"), None);
        assert_eq!(storage.get_str("b"), None);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = UnifiedStorage::open(dir.path(), "main");
            storage.set("k", "v");
        }
        let storage = UnifiedStorage::open(dir.path(), "main");
        assert_eq!(storage.get_str("k"), Some("v".to_string()));
    }
}
