use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::info;

use crate::error::Result;
use crate::remote::RemoteStore;
use crate::state::chat::ChatStore;
use crate::state::journal::JournalStore;
use crate::state::life_wheel::LifeWheelStore;
use crate::state::progression::ProgressionStore;
use crate::state::theme::ThemeStore;
use crate::state::user::UserStore;
use crate::state::vision_board::VisionBoardStore;
use crate::state::Persisted;
use crate::storage::adapter::PersistenceAdapter;
use crate::storage::doctor::{self, KeyCheck, RepairReport, StartupReport};
use crate::storage::unified::UnifiedStorage;
use crate::storage::{StorageKey, LEGACY_KEY_ALIASES};

/// Data directory for a normal installation.
pub fn default_data_dir() -> Option<PathBuf> {
    ProjectDirs::from("de", "klare", "klare").map(|dirs| dirs.data_dir().to_path_buf())
}

fn attach<S>(root: &Path) -> Persisted<S, PersistenceAdapter>
where
    S: crate::state::PersistedState,
{
    let storage = UnifiedStorage::open(root, S::KEY.as_str());
    Persisted::attach(PersistenceAdapter::new(storage))
}

/// The assembled application core: every state container attached to
/// its own storage instance under one root directory.
///
/// Containers rehydrate synchronously during [`AppContext::initialize`];
/// the remote reconciliation happens later, once a user id is known,
/// through [`AppContext::load_all`].
pub struct AppContext {
    pub user: UserStore,
    pub theme: ThemeStore,
    pub life_wheel: LifeWheelStore,
    pub progression: ProgressionStore,
    pub journal: JournalStore,
    pub vision_board: VisionBoardStore,
    pub chat: ChatStore,
    diagnostics: UnifiedStorage,
}

impl AppContext {
    pub fn initialize(root: &Path) -> Self {
        info!(root = %root.display(), "initializing app core");
        Self {
            user: attach(root),
            theme: attach(root),
            life_wheel: attach(root),
            progression: attach(root),
            journal: attach(root),
            vision_board: attach(root),
            chat: attach(root),
            diagnostics: UnifiedStorage::open(root, "diagnostics"),
        }
    }

    /// One-time startup health probe. An unhealthy report is the cue to
    /// offer the user a storage reset, the only user-facing recovery
    /// action in this subsystem.
    pub fn startup_report(&self) -> StartupReport {
        doctor::startup_check(&self.diagnostics)
    }

    /// Fetch authoritative data for every remote-backed container.
    /// Each container records its own failure in its transient
    /// metadata; one failing slice does not stop the others.
    pub fn load_all<R: RemoteStore>(&mut self, remote: &R, user_id: &str) {
        self.user.load_remote(remote, user_id);
        self.life_wheel.load_remote(remote, user_id);
        self.progression.load_remote(remote, user_id);
        self.journal.load_remote(remote, user_id);
        self.vision_board.load_remote(remote, user_id);
    }

    /// Push every remote-backed container, stopping at the first
    /// failure. Writes already issued stay committed.
    pub fn save_all<R: RemoteStore>(&self, remote: &R, user_id: &str) -> Result<()> {
        self.user.save_remote(remote)?;
        self.life_wheel.save_remote(remote, user_id)?;
        self.progression.save_remote(remote, user_id)?;
        self.journal.save_remote(remote, user_id)?;
        self.vision_board.save_remote(remote, user_id)?;
        Ok(())
    }

    /// Reset every container to defaults and clear its backing key.
    pub fn reset_all_storage(&mut self) {
        self.user.reset();
        self.theme.reset();
        self.life_wheel.reset();
        self.progression.reset();
        self.journal.reset();
        self.vision_board.reset();
        self.chat.reset();
        self.diagnostics.clear_all();
        info!("all local storage reset");
    }

    /// Reconcile legacy string keys inside every container's store.
    pub fn sync_legacy_keys(&self) {
        for storage in self.container_storages() {
            doctor::sync_storage_keys(storage);
        }
    }

    /// Round-trip check across every container's store.
    pub fn check_all(&self) -> Vec<KeyCheck> {
        self.container_storages()
            .into_iter()
            .flat_map(|storage| doctor::check_keys(storage, &[storage.id()]))
            .collect()
    }

    /// Corrupt-blob sweep across every container's store.
    pub fn repair_all(&self) -> RepairReport {
        let mut total = RepairReport::default();
        for storage in self.container_storages() {
            let report = doctor::repair_keys(storage, &container_keys(storage.id()));
            total.checked += report.checked;
            total.removed.extend(report.removed);
        }
        total
    }

    /// First 100 characters of every persisted blob, for inspection.
    pub fn dump_all(&self) -> Vec<(String, String)> {
        self.container_storages()
            .into_iter()
            .flat_map(|storage| doctor::dump_keys(storage, &container_keys(storage.id())))
            .collect()
    }

    fn container_storages(&self) -> Vec<&UnifiedStorage> {
        vec![
            self.user.backend().storage(),
            self.theme.backend().storage(),
            self.life_wheel.backend().storage(),
            self.progression.backend().storage(),
            self.journal.backend().storage(),
            self.vision_board.backend().storage(),
            self.chat.backend().storage(),
        ]
    }
}

/// The keys a container's store may hold: its enum key plus the legacy
/// alias that maps to it, if any.
fn container_keys(enum_key: &str) -> Vec<&'static str> {
    let mut keys = Vec::new();
    for key in StorageKey::ALL {
        if key.as_str() == enum_key {
            keys.push(key.as_str());
        }
    }
    for (legacy, key) in LEGACY_KEY_ALIASES.iter() {
        if key.as_str() == enum_key {
            keys.push(*legacy);
        }
    }
    keys
}
