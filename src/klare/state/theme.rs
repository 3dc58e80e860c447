use serde::{Deserialize, Serialize};

use super::{Persisted, PersistedState};
use crate::model::ThemeMode;
use crate::storage::adapter::StateBackend;
use crate::storage::StorageKey;

/// Theme preference. Local-only: there is no remote table for it.
#[derive(Debug, Default)]
pub struct ThemeState {
    pub mode: ThemeMode,
}

#[derive(Serialize, Deserialize)]
pub struct ThemeBlob {
    mode: ThemeMode,
}

impl PersistedState for ThemeState {
    const KEY: StorageKey = StorageKey::Theme;
    type Blob = ThemeBlob;

    fn partialize(&self) -> ThemeBlob {
        ThemeBlob { mode: self.mode }
    }

    fn apply_blob(&mut self, blob: ThemeBlob) {
        self.mode = blob.mode;
    }
}

pub type ThemeStore<B = crate::storage::adapter::PersistenceAdapter> = Persisted<ThemeState, B>;

impl<B: StateBackend> ThemeStore<B> {
    pub fn set_mode(&mut self, mode: ThemeMode) {
        self.update(|s| s.mode = mode);
    }

    /// Flip between explicit light and dark; from `System` the first
    /// toggle lands on `Dark`.
    pub fn toggle(&mut self) {
        self.update(|s| {
            s.mode = match s.mode {
                ThemeMode::Light => ThemeMode::Dark,
                ThemeMode::Dark => ThemeMode::Light,
                ThemeMode::System => ThemeMode::Dark,
            };
        });
    }
}
