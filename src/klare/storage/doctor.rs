//! Development-only diagnostics over a storage instance.
//!
//! None of these routines is wired to a user-facing surface; they are
//! called from debug screens and from the startup health check.

use tracing::{info, warn};

use super::unified::UnifiedStorage;
use super::{EngineKind, StorageKey, LEGACY_KEY_ALIASES};

/// Outcome of one key's write/read/delete round-trip.
#[derive(Debug)]
pub struct KeyCheck {
    pub key: String,
    pub passed: bool,
    pub detail: Option<String>,
}

/// Report of the corrupt-blob sweep.
#[derive(Debug, Default)]
pub struct RepairReport {
    pub checked: usize,
    pub removed: Vec<String>,
}

/// Every key the diagnostics routines look at: the enum keys plus the
/// legacy string aliases.
pub fn all_known_keys() -> Vec<&'static str> {
    let mut keys: Vec<&'static str> = StorageKey::ALL.iter().map(|k| k.as_str()).collect();
    keys.extend(LEGACY_KEY_ALIASES.iter().map(|(legacy, _)| *legacy));
    keys
}

/// Round-trip a literal test payload for each key and report per-key
/// pass/fail. The probe is written next to the key, not over it, so a
/// check never clobbers live data.
pub fn check_keys(storage: &UnifiedStorage, keys: &[&str]) -> Vec<KeyCheck> {
    keys.iter()
        .map(|key| {
            let probe = format!("{key}__check__");
            storage.set(&probe, "test");
            let read = storage.load_str(&probe);
            storage.delete(&probe);

            match read {
                Some(ref v) if v == "test" => KeyCheck {
                    key: key.to_string(),
                    passed: true,
                    detail: None,
                },
                other => KeyCheck {
                    key: key.to_string(),
                    passed: false,
                    detail: Some(format!("round-trip returned {other:?}")),
                },
            }
        })
        .collect()
}

/// Dump the first 100 characters of every present value, for manual
/// inspection.
pub fn dump_keys(storage: &UnifiedStorage, keys: &[&str]) -> Vec<(String, String)> {
    keys.iter()
        .filter_map(|key| {
            storage
                .load_str(key)
                .map(|value| (key.to_string(), value.chars().take(100).collect()))
        })
        .collect()
}

/// Sweep every key for a blob that no longer parses as JSON and delete
/// it outright. Deletion is the recovery policy for corruption; the
/// owning container falls back to its defaults on next rehydrate.
pub fn repair_keys(storage: &UnifiedStorage, keys: &[&str]) -> RepairReport {
    let mut report = RepairReport::default();
    for key in keys {
        let Some(value) = storage.load_str(key) else {
            continue;
        };
        report.checked += 1;
        if serde_json::from_str::<serde_json::Value>(&value).is_err() {
            warn!(key, "removing corrupted blob");
            storage.delete(key);
            report.removed.push(key.to_string());
        }
    }
    report
}

/// Reconcile legacy string keys with their enum counterparts: when
/// exactly one side of a pair holds a value, copy it to the empty side.
/// When both sides hold values nothing is merged, since neither side is
/// known to be newer. Running this twice changes nothing.
pub fn sync_storage_keys(storage: &UnifiedStorage) {
    for (legacy, key) in LEGACY_KEY_ALIASES.iter() {
        let legacy_value = storage.load_str(legacy);
        let enum_value = storage.load_str(key.as_str());

        match (legacy_value, enum_value) {
            (Some(value), None) => {
                info!(from = legacy, to = %key, "copying legacy value to enum key");
                storage.set(key.as_str(), &value);
            }
            (None, Some(value)) => {
                info!(from = %key, to = legacy, "backfilling legacy key");
                storage.set(legacy, &value);
            }
            _ => {}
        }
    }
    storage.flush();
}

/// What the app inspects once at startup to decide whether to offer the
/// "reset local storage" action.
#[derive(Debug)]
pub struct StartupReport {
    pub kind: EngineKind,
    pub healthy: bool,
}

/// One-time startup self-check: a probe round-trip on the instance.
pub fn startup_check(storage: &UnifiedStorage) -> StartupReport {
    let checks = check_keys(storage, &["__startup__"]);
    StartupReport {
        kind: storage.kind(),
        healthy: storage.is_available() && checks.iter().all(|c| c.passed),
    }
}
