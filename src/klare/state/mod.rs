//! # State Containers
//!
//! One container per domain slice (user, theme, life wheel,
//! progression, journal, vision board, chat). Each owns its in-memory
//! state, a set of mutation methods, and a persistence backend keyed by
//! its own [`StorageKey`].
//!
//! ## Startup Protocol
//!
//! 1. [`Persisted::attach`] rehydrates from the backend: the blob is
//!    JSON-parsed and merged into the default state. A missing or
//!    unparseable blob leaves the container at its defaults; a corrupt
//!    cache must never take the app down.
//! 2. Once a user session exists, the container's `load_remote` fetches
//!    authoritative rows from the remote store and overwrites the
//!    slice. Remote data always wins over rehydrated local data.
//! 3. Every mutation goes through [`Persisted::update`], which
//!    write-throughs the partialized state to the backend best-effort.
//!    Remote writes are separate, explicit `save_remote` calls; local
//!    and remote writes are independent and not transactional.
//!
//! The in-memory shape is a strict superset of the persisted shape:
//! transient [`SyncMeta`] (loading flag, last error) never reaches
//! storage.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::storage::adapter::{PersistenceAdapter, StateBackend};
use crate::storage::StorageKey;

pub mod chat;
pub mod journal;
pub mod life_wheel;
pub mod progression;
pub mod theme;
pub mod user;
pub mod vision_board;

/// Transient per-container sync metadata. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncMeta {
    pub loading: bool,
    pub error: Option<String>,
    pub last_loaded_at: Option<DateTime<Utc>>,
}

/// A domain state shape that knows which key it persists under and
/// which subset of itself is worth persisting.
pub trait PersistedState: Default {
    const KEY: StorageKey;

    /// The persisted subset of the state.
    type Blob: Serialize + DeserializeOwned;

    fn partialize(&self) -> Self::Blob;

    /// Merge a rehydrated blob into `self` (which starts at defaults).
    fn apply_blob(&mut self, blob: Self::Blob);
}

/// A state container bound to a persistence backend.
pub struct Persisted<S: PersistedState, B: StateBackend = PersistenceAdapter> {
    state: S,
    backend: B,
}

impl<S: PersistedState, B: StateBackend> Persisted<S, B> {
    /// Construct at defaults and rehydrate from the backend.
    pub fn attach(backend: B) -> Self {
        let mut container = Self {
            state: S::default(),
            backend,
        };
        container.rehydrate();
        container
    }

    fn rehydrate(&mut self) {
        let key = S::KEY.as_str();
        match self.backend.get_item(key) {
            Some(raw) => match serde_json::from_str::<S::Blob>(&raw) {
                Ok(blob) => {
                    self.state.apply_blob(blob);
                    debug!(key, "container rehydrated");
                }
                Err(e) => {
                    error!(key, error = %e, "persisted blob unreadable, keeping defaults");
                }
            },
            None => debug!(key, "no persisted blob, starting at defaults"),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// The persistence backend, exposed for the diagnostics routines.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Apply a mutation and write the partialized state through to the
    /// backend. The local write is best-effort; it never fails the
    /// mutation.
    pub fn update(&mut self, mutate: impl FnOnce(&mut S)) {
        mutate(&mut self.state);
        self.persist();
    }

    fn persist(&mut self) {
        let key = S::KEY.as_str();
        match serde_json::to_string(&self.state.partialize()) {
            Ok(raw) => self.backend.set_item(key, &raw),
            Err(e) => warn!(key, error = %e, "failed to serialize state for persistence"),
        }
    }

    /// Restore defaults and clear the backing key.
    pub fn reset(&mut self) {
        self.state = S::default();
        self.backend.remove_item(S::KEY.as_str());
    }
}


#[cfg(test)]
mod tests {
    use super::tests_support::MapBackend;
    use super::*;
    use serde::Deserialize;

    #[derive(Default)]
    struct Counter {
        count: u32,
        meta: SyncMeta,
    }

    #[derive(Serialize, Deserialize)]
    struct CounterBlob {
        count: u32,
    }

    impl PersistedState for Counter {
        const KEY: StorageKey = StorageKey::User;
        type Blob = CounterBlob;

        fn partialize(&self) -> CounterBlob {
            CounterBlob { count: self.count }
        }

        fn apply_blob(&mut self, blob: CounterBlob) {
            self.count = blob.count;
        }
    }

    #[test]
    fn update_writes_through() {
        let mut container: Persisted<Counter, MapBackend> = Persisted::attach(MapBackend::default());
        container.update(|s| s.count = 3);
        assert_eq!(
            container.backend.items.get("user-storage").unwrap(),
            "{\"count\":3}"
        );
    }

    #[test]
    fn rehydrates_from_seeded_backend() {
        let mut backend = MapBackend::default();
        backend.set_item("user-storage", "{\"count\":9}");

        let container: Persisted<Counter, MapBackend> = Persisted::attach(backend);
        assert_eq!(container.state().count, 9);
    }

    #[test]
    fn corrupt_blob_falls_back_to_defaults() {
        let mut backend = MapBackend::default();
        backend.set_item("user-storage", "{not valid json");

        let container: Persisted<Counter, MapBackend> = Persisted::attach(backend);
        assert_eq!(container.state().count, 0);
    }

    #[test]
    fn transient_meta_is_not_persisted() {
        let mut container: Persisted<Counter, MapBackend> = Persisted::attach(MapBackend::default());
        container.update(|s| {
            s.count = 1;
            s.meta.loading = true;
            s.meta.error = Some("boom".into());
        });

        let raw = container.backend.items.get("user-storage").unwrap();
        assert!(!raw.contains("loading"));
        assert!(!raw.contains("boom"));
    }

    #[test]
    fn reset_clears_state_and_key() {
        let mut container: Persisted<Counter, MapBackend> = Persisted::attach(MapBackend::default());
        container.update(|s| s.count = 5);
        container.reset();

        assert_eq!(container.state().count, 0);
        assert!(container.backend.items.is_empty());
    }
}
