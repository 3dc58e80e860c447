use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Persisted, PersistedState, SyncMeta};
use crate::error::Result;
use crate::model::StageId;
use crate::remote::{Filter, RemoteStore};
use crate::storage::adapter::StateBackend;
use crate::storage::StorageKey;

const TABLE: &str = "completed_modules";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedModule {
    pub module_id: String,
    pub stage: StageId,
    pub completed_at: DateTime<Utc>,
}

/// Progress through the five-stage curriculum.
#[derive(Debug)]
pub struct ProgressionState {
    pub current_stage: StageId,
    pub completed: Vec<CompletedModule>,
    pub meta: SyncMeta,
}

impl Default for ProgressionState {
    fn default() -> Self {
        Self {
            current_stage: StageId::K,
            completed: Vec::new(),
            meta: SyncMeta::default(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ProgressionBlob {
    current_stage: StageId,
    completed: Vec<CompletedModule>,
}

impl PersistedState for ProgressionState {
    const KEY: StorageKey = StorageKey::Progression;
    type Blob = ProgressionBlob;

    fn partialize(&self) -> ProgressionBlob {
        ProgressionBlob {
            current_stage: self.current_stage,
            completed: self.completed.clone(),
        }
    }

    fn apply_blob(&mut self, blob: ProgressionBlob) {
        self.current_stage = blob.current_stage;
        self.completed = blob.completed;
    }
}

pub type ProgressionStore<B = crate::storage::adapter::PersistenceAdapter> =
    Persisted<ProgressionState, B>;

impl<B: StateBackend> ProgressionStore<B> {
    pub fn is_completed(&self, module_id: &str) -> bool {
        self.state().completed.iter().any(|m| m.module_id == module_id)
    }

    /// Record a module as completed. Completing the same module twice
    /// is a no-op.
    pub fn complete_module(&mut self, stage: StageId, module_id: &str) {
        if self.is_completed(module_id) {
            return;
        }
        self.update(|s| {
            s.completed.push(CompletedModule {
                module_id: module_id.to_string(),
                stage,
                completed_at: Utc::now(),
            });
        });
    }

    /// Move to the next stage; a no-op on the final stage.
    pub fn advance_stage(&mut self) {
        self.update(|s| {
            if let Some(next) = s.current_stage.next() {
                s.current_stage = next;
            }
        });
    }

    pub fn completed_for_stage(&self, stage: StageId) -> usize {
        self.state()
            .completed
            .iter()
            .filter(|m| m.stage == stage)
            .count()
    }

    /// Overwrite the completion list with the authoritative rows.
    pub fn load_remote<R: RemoteStore>(&mut self, remote: &R, user_id: &str) {
        self.update(|s| {
            s.meta.loading = true;
            s.meta.error = None;
        });

        match remote.select(TABLE, &[Filter::eq("user_id", user_id)]) {
            Ok(rows) => {
                let mut completed = Vec::with_capacity(rows.len());
                for row in rows {
                    match serde_json::from_value::<CompletedModule>(row) {
                        Ok(module) => completed.push(module),
                        Err(e) => warn!(error = %e, "skipping unreadable completion row"),
                    }
                }
                self.update(|s| {
                    s.completed = completed;
                    s.meta.loading = false;
                    s.meta.last_loaded_at = Some(Utc::now());
                });
            }
            Err(e) => {
                warn!(error = %e, "progression load failed, keeping cached completions");
                self.update(|s| {
                    s.meta.loading = false;
                    s.meta.error = Some(e.to_string());
                });
            }
        }
    }

    /// Insert completions the remote does not know yet, one call per
    /// row, stopping at the first failure.
    pub fn save_remote<R: RemoteStore>(&self, remote: &R, user_id: &str) -> Result<()> {
        let known = remote.select(TABLE, &[Filter::eq("user_id", user_id)])?;
        let known_ids: Vec<String> = known
            .iter()
            .filter_map(|row| row.get("module_id"))
            .filter_map(|v| v.as_str().map(String::from))
            .collect();

        for module in &self.state().completed {
            if known_ids.contains(&module.module_id) {
                continue;
            }
            let mut row = serde_json::to_value(module)?;
            if let Some(map) = row.as_object_mut() {
                map.insert("user_id".into(), user_id.into());
            }
            remote.insert(TABLE, row)?;
        }
        Ok(())
    }
}
