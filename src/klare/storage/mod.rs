//! # Storage Layer
//!
//! This module defines the local persistence core. Every domain store
//! keeps its state as one JSON blob under one [`StorageKey`], written
//! through a [`unified::UnifiedStorage`] facade that hides which of two
//! key-value engines is actually doing the work.
//!
//! ## Dual-Engine Architecture
//!
//! 1. **Fast engine** ([`fast::RedbEngine`]): an embedded `redb`
//!    database. Reads and writes are synchronous and durable on return.
//! 2. **Fallback engine** ([`fallback::FileEngine`]): one file per key.
//!    Writes are queued and flushed opportunistically, so a write is
//!    *not* guaranteed durable when `set` returns.
//!
//! The facade self-tests the fast engine at construction and silently
//! falls back when the test fails (locked file, unwritable directory,
//! corrupt database). If the fallback engine fails its own self-test,
//! persistence degrades to logged no-ops and the app keeps running
//! without it. The selection is made once per instance; there is no
//! re-promotion.
//!
//! ### Read Paths
//!
//! - `get_str`: synchronous, correct only on the fast engine. On the
//!   fallback engine it returns `None` unconditionally because queued
//!   writes may not have reached disk.
//! - `load_str`: flushes the queue first, then reads. The only read
//!   path valid on every engine.
//!
//! ## Failure Philosophy
//!
//! Persistence here is best-effort. Facade operations catch engine
//! errors, log them, and return normally; no storage failure may take
//! the app down. Corrupted blobs are detected lazily on read and the
//! recovery policy is deletion, not reconstruction (see [`doctor`]).
//!
//! ## Storage Layout
//!
//! ```text
//! <root>/
//! ├── <id>.redb       # fast engine database (one per facade instance)
//! └── <id>/           # fallback engine directory
//!     └── <key>       # one file per key, raw blob bytes
//! ```

use once_cell::sync::Lazy;
use std::fmt;

use crate::error::Result;

pub mod adapter;
pub mod doctor;
pub mod fallback;
pub mod fast;
pub mod unified;

/// Namespaced key of one logical persisted blob. Exactly one value per
/// domain store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    User,
    Theme,
    LifeWheel,
    Progression,
    Journal,
    VisionBoard,
    Chat,
}

impl StorageKey {
    pub const ALL: [StorageKey; 7] = [
        StorageKey::User,
        StorageKey::Theme,
        StorageKey::LifeWheel,
        StorageKey::Progression,
        StorageKey::Journal,
        StorageKey::VisionBoard,
        StorageKey::Chat,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::User => "user-storage",
            StorageKey::Theme => "theme-storage",
            StorageKey::LifeWheel => "life-wheel-storage",
            StorageKey::Progression => "progression-storage",
            StorageKey::Journal => "journal-storage",
            StorageKey::VisionBoard => "vision-board-storage",
            StorageKey::Chat => "chat-storage",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plain-string keys written by an earlier schema version, paired with
/// the [`StorageKey`] that replaced them. Both sides may coexist in one
/// physical store; [`doctor::sync_storage_keys`] keeps them
/// value-synchronized.
pub static LEGACY_KEY_ALIASES: Lazy<Vec<(&'static str, StorageKey)>> = Lazy::new(|| {
    vec![
        ("user", StorageKey::User),
        ("theme", StorageKey::Theme),
        ("life-wheel", StorageKey::LifeWheel),
        ("progression", StorageKey::Progression),
        ("journal", StorageKey::Journal),
        ("vision-board", StorageKey::VisionBoard),
    ]
});

/// Which engine a facade instance ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    Fast,
    Fallback,
    None,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineKind::Fast => "Fast",
            EngineKind::Fallback => "Fallback",
            EngineKind::None => "None",
        };
        f.write_str(name)
    }
}

/// Raw key-value engine interface. Implementations report real errors;
/// swallowing them is the facade's job, not the engine's.
pub trait KvEngine {
    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn get(&self, key: &str) -> Result<Option<String>>;

    fn delete(&self, key: &str) -> Result<()>;

    fn clear_all(&self) -> Result<()>;

    /// Push any queued writes to durable storage. A no-op for engines
    /// that write through immediately.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
