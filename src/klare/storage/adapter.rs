use tracing::warn;

use super::unified::UnifiedStorage;

/// Async-style key-value contract expected by the state containers'
/// persistence machinery: get, set, remove, nothing else. Calls must
/// always return: an implementation may drop a write, but it may not
/// fail or block the container.
pub trait StateBackend {
    fn get_item(&mut self, name: &str) -> Option<String>;

    fn set_item(&mut self, name: &str, value: &str);

    fn remove_item(&mut self, name: &str);
}

/// The sole production implementer of [`StateBackend`], wrapping one
/// [`UnifiedStorage`] instance.
///
/// Guards against a key that arrives empty or as the literal string
/// `"undefined"`, the artifact of building a key from a missing value
/// upstream. Such calls are warned no-ops instead of polluting storage
/// with a junk key.
pub struct PersistenceAdapter {
    storage: UnifiedStorage,
}

impl PersistenceAdapter {
    pub fn new(storage: UnifiedStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &UnifiedStorage {
        &self.storage
    }

    fn guard(name: &str) -> bool {
        if name.is_empty() || name == "undefined" {
            warn!(name, "refusing storage operation on invalid key");
            return false;
        }
        true
    }
}

impl StateBackend for PersistenceAdapter {
    fn get_item(&mut self, name: &str) -> Option<String> {
        if !Self::guard(name) {
            return None;
        }
        self.storage.load_str(name)
    }

    fn set_item(&mut self, name: &str, value: &str) {
        if !Self::guard(name) {
            return;
        }
        self.storage.set(name, value);
    }

    fn remove_item(&mut self, name: &str) {
        if !Self::guard(name) {
            return;
        }
        self.storage.delete(name);
    }
}
