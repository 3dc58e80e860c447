use std::cell::Cell;

use klare::app::AppContext;
use klare::error::{KlareError, Result};
use klare::model::{LifeWheelArea, ThemeMode};
use klare::reflection::{previous_questions, save_reflection_answer};
use klare::remote::memory::MemoryRemote;
use klare::remote::{Filter, RemoteStore};
use klare::storage::doctor;
use klare::storage::unified::UnifiedStorage;
use klare::storage::{EngineKind, StorageKey};
use serde_json::Value;

/// Force the facade onto the fallback engine by letting a directory
/// squat on the fast engine's database path.
fn open_on_fallback(root: &std::path::Path, id: &str) -> UnifiedStorage {
    std::fs::create_dir_all(root.join(format!("{id}.redb"))).unwrap();
    let storage = UnifiedStorage::open(root, id);
    assert_eq!(storage.kind(), EngineKind::Fallback);
    storage
}

#[test]
fn fallback_facade_sync_read_is_blind_but_load_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let storage = open_on_fallback(dir.path(), "main");

    storage.set("k", "v");
    assert_eq!(storage.get_str("k"), None);
    assert_eq!(storage.load_str("k"), Some("v".to_string()));
}

#[test]
fn legacy_theme_key_is_copied_to_enum_key() {
    let dir = tempfile::tempdir().unwrap();
    let storage = UnifiedStorage::open(dir.path(), "main");

    storage.set("theme", "\"dark\"");
    doctor::sync_storage_keys(&storage);
    assert_eq!(
        storage.get_str(StorageKey::Theme.as_str()),
        Some("\"dark\"".to_string())
    );
}

#[test]
fn corrupt_blob_is_deleted_by_repair() {
    let dir = tempfile::tempdir().unwrap();
    let storage = UnifiedStorage::open(dir.path(), "main");

    storage.set(StorageKey::Journal.as_str(), "{not valid json");
    doctor::repair_keys(&storage, &[StorageKey::Journal.as_str()]);
    assert_eq!(storage.get_str(StorageKey::Journal.as_str()), None);
}

#[test]
fn reflection_history_returns_questions_in_order() {
    let remote = MemoryRemote::new();
    let area = LifeWheelArea::new("u1", "Health", 5, 8);
    let area_id = area.id;
    remote
        .insert("life_wheel_areas", serde_json::to_value(&area).unwrap())
        .unwrap();

    save_reflection_answer(&remote, "u1", area_id, "Q1", "A1", "s1").unwrap();
    save_reflection_answer(&remote, "u1", area_id, "Q2", "A2", "s1").unwrap();

    let questions = previous_questions(&remote, "u1", area_id).unwrap();
    assert_eq!(questions, vec!["Q1".to_string(), "Q2".to_string()]);
}

#[test]
fn full_lifecycle_rehydrate_reconcile_mutate_restart() {
    let dir = tempfile::tempdir().unwrap();
    let remote = MemoryRemote::new();

    // first session: local mutations, then an explicit remote save
    {
        let mut ctx = AppContext::initialize(dir.path());
        assert!(ctx.startup_report().healthy);

        ctx.theme.set_mode(ThemeMode::Dark);
        ctx.life_wheel
            .add_area(LifeWheelArea::new("u1", "Health", 3, 9));
        ctx.save_all(&remote, "u1").unwrap();
    }

    // the remote moves on while the app is closed
    remote
        .update(
            "life_wheel_areas",
            &[Filter::eq("user_id", "u1")],
            serde_json::json!({"current_value": 7}),
        )
        .unwrap();

    // second session: rehydrated cache first, then remote wins
    let mut ctx = AppContext::initialize(dir.path());
    assert_eq!(ctx.theme.state().mode, ThemeMode::Dark);
    assert_eq!(ctx.life_wheel.state().areas[0].current_value, 3);

    ctx.load_all(&remote, "u1");
    assert_eq!(ctx.life_wheel.state().areas[0].current_value, 7);
}

/// Remote that starts failing writes after a fixed number of calls.
struct FlakyRemote {
    inner: MemoryRemote,
    writes_left: Cell<usize>,
}

impl FlakyRemote {
    fn failing_after(writes: usize) -> Self {
        Self {
            inner: MemoryRemote::new(),
            writes_left: Cell::new(writes),
        }
    }

    fn take_write_budget(&self) -> Result<()> {
        let left = self.writes_left.get();
        if left == 0 {
            return Err(KlareError::Remote("connection dropped".into()));
        }
        self.writes_left.set(left - 1);
        Ok(())
    }
}

impl RemoteStore for FlakyRemote {
    fn select(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>> {
        self.inner.select(table, filters)
    }

    fn insert(&self, table: &str, row: Value) -> Result<Value> {
        self.take_write_budget()?;
        self.inner.insert(table, row)
    }

    fn update(&self, table: &str, filters: &[Filter], patch: Value) -> Result<usize> {
        self.take_write_budget()?;
        self.inner.update(table, filters, patch)
    }

    fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize> {
        self.take_write_budget()?;
        self.inner.delete(table, filters)
    }
}

#[test]
fn partial_multi_row_save_keeps_earlier_writes() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = AppContext::initialize(dir.path());
    for name in ["Health", "Career", "Family"] {
        ctx.life_wheel
            .add_area(LifeWheelArea::new("u1", name, 5, 8));
    }

    // each new area costs two writes (failed match probe + insert);
    // allow exactly one area through, then fail
    let remote = FlakyRemote::failing_after(2);
    let result = ctx.life_wheel.save_remote(&remote, "u1");

    assert!(result.is_err());
    assert_eq!(remote.inner.row_count("life_wheel_areas"), 1);
}

#[test]
fn app_survives_with_no_storage_engine_at_all() {
    let dir = tempfile::tempdir().unwrap();
    // a file where the storage root should be breaks both engines
    let root = dir.path().join("root");
    std::fs::write(&root, b"occupied").unwrap();

    let mut ctx = AppContext::initialize(&root);
    let report = ctx.startup_report();
    assert!(!report.healthy);
    assert_eq!(report.kind, EngineKind::None);

    // the app still works, it just does not persist
    ctx.theme.set_mode(ThemeMode::Dark);
    assert_eq!(ctx.theme.state().mode, ThemeMode::Dark);

    drop(ctx);
    let ctx = AppContext::initialize(&root);
    assert_eq!(ctx.theme.state().mode, ThemeMode::System);
}
