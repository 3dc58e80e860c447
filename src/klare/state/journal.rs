use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::{Persisted, PersistedState, SyncMeta};
use crate::error::Result;
use crate::model::JournalEntry;
use crate::remote::{upsert, Filter, RemoteStore};
use crate::storage::adapter::StateBackend;
use crate::storage::StorageKey;

const TABLE: &str = "journal_entries";

#[derive(Debug, Default)]
pub struct JournalState {
    pub entries: Vec<JournalEntry>,
    pub meta: SyncMeta,
}

#[derive(Serialize, Deserialize)]
pub struct JournalBlob {
    entries: Vec<JournalEntry>,
}

impl PersistedState for JournalState {
    const KEY: StorageKey = StorageKey::Journal;
    type Blob = JournalBlob;

    fn partialize(&self) -> JournalBlob {
        JournalBlob {
            entries: self.entries.clone(),
        }
    }

    fn apply_blob(&mut self, blob: JournalBlob) {
        self.entries = blob.entries;
    }
}

pub type JournalStore<B = crate::storage::adapter::PersistenceAdapter> =
    Persisted<JournalState, B>;

impl<B: StateBackend> JournalStore<B> {
    pub fn add_entry(&mut self, entry: JournalEntry) {
        self.update(|s| s.entries.push(entry));
    }

    pub fn edit_entry(&mut self, id: Uuid, title: String, content: String, tags: Vec<String>) {
        self.update(|s| {
            if let Some(entry) = s.entries.iter_mut().find(|e| e.id == id) {
                entry.title = title;
                entry.content = content;
                entry.tags = tags;
                entry.updated_at = Utc::now();
            }
        });
    }

    pub fn remove_entry(&mut self, id: Uuid) {
        self.update(|s| s.entries.retain(|e| e.id != id));
    }

    pub fn entry(&self, id: Uuid) -> Option<&JournalEntry> {
        self.state().entries.iter().find(|e| e.id == id)
    }

    pub fn load_remote<R: RemoteStore>(&mut self, remote: &R, user_id: &str) {
        self.update(|s| {
            s.meta.loading = true;
            s.meta.error = None;
        });

        match remote.select(TABLE, &[Filter::eq("user_id", user_id)]) {
            Ok(rows) => {
                let mut entries = Vec::with_capacity(rows.len());
                for row in rows {
                    match serde_json::from_value::<JournalEntry>(row) {
                        Ok(entry) => entries.push(entry),
                        Err(e) => warn!(error = %e, "skipping unreadable journal row"),
                    }
                }
                self.update(|s| {
                    s.entries = entries;
                    s.meta.loading = false;
                    s.meta.last_loaded_at = Some(Utc::now());
                });
            }
            Err(e) => {
                warn!(error = %e, "journal load failed, keeping cached entries");
                self.update(|s| {
                    s.meta.loading = false;
                    s.meta.error = Some(e.to_string());
                });
            }
        }
    }

    /// One update-or-insert per entry, in order, stopping at the first
    /// failure.
    pub fn save_remote<R: RemoteStore>(&self, remote: &R, user_id: &str) -> Result<()> {
        for entry in &self.state().entries {
            let row = serde_json::to_value(entry)?;
            upsert(
                remote,
                TABLE,
                &[
                    Filter::eq("id", &entry.id.to_string()),
                    Filter::eq("user_id", user_id),
                ],
                row,
            )?;
        }
        Ok(())
    }

    /// Remove an entry locally and remotely. The remote delete is
    /// issued after the local removal; its failure does not restore the
    /// local entry.
    pub fn delete_entry<R: RemoteStore>(
        &mut self,
        remote: &R,
        user_id: &str,
        id: Uuid,
    ) -> Result<()> {
        self.remove_entry(id);
        remote.delete(
            TABLE,
            &[
                Filter::eq("id", &id.to_string()),
                Filter::eq("user_id", user_id),
            ],
        )?;
        Ok(())
    }
}
