use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::{Persisted, PersistedState, SyncMeta};
use crate::error::Result;
use crate::model::VisionBoardItem;
use crate::remote::{upsert, Filter, RemoteStore};
use crate::storage::adapter::StateBackend;
use crate::storage::StorageKey;

const TABLE: &str = "vision_board_items";

#[derive(Debug, Default)]
pub struct VisionBoardState {
    pub items: Vec<VisionBoardItem>,
    pub meta: SyncMeta,
}

#[derive(Serialize, Deserialize)]
pub struct VisionBoardBlob {
    items: Vec<VisionBoardItem>,
}

impl PersistedState for VisionBoardState {
    const KEY: StorageKey = StorageKey::VisionBoard;
    type Blob = VisionBoardBlob;

    fn partialize(&self) -> VisionBoardBlob {
        VisionBoardBlob {
            items: self.items.clone(),
        }
    }

    fn apply_blob(&mut self, blob: VisionBoardBlob) {
        self.items = blob.items;
    }
}

pub type VisionBoardStore<B = crate::storage::adapter::PersistenceAdapter> =
    Persisted<VisionBoardState, B>;

impl<B: StateBackend> VisionBoardStore<B> {
    pub fn add_item(&mut self, item: VisionBoardItem) {
        self.update(|s| s.items.push(item));
    }

    pub fn remove_item(&mut self, id: Uuid) {
        self.update(|s| s.items.retain(|i| i.id != id));
    }

    pub fn move_item(&mut self, id: Uuid, x: f32, y: f32) {
        self.update(|s| {
            if let Some(item) = s.items.iter_mut().find(|i| i.id == id) {
                item.position_x = x;
                item.position_y = y;
            }
        });
    }

    pub fn scale_item(&mut self, id: Uuid, scale: f32) {
        self.update(|s| {
            if let Some(item) = s.items.iter_mut().find(|i| i.id == id) {
                item.scale = scale;
            }
        });
    }

    pub fn set_image(&mut self, id: Uuid, image_url: String) {
        self.update(|s| {
            if let Some(item) = s.items.iter_mut().find(|i| i.id == id) {
                item.image_url = Some(image_url);
            }
        });
    }

    pub fn load_remote<R: RemoteStore>(&mut self, remote: &R, user_id: &str) {
        self.update(|s| {
            s.meta.loading = true;
            s.meta.error = None;
        });

        match remote.select(TABLE, &[Filter::eq("user_id", user_id)]) {
            Ok(rows) => {
                let mut items = Vec::with_capacity(rows.len());
                for row in rows {
                    match serde_json::from_value::<VisionBoardItem>(row) {
                        Ok(item) => items.push(item),
                        Err(e) => warn!(error = %e, "skipping unreadable vision board row"),
                    }
                }
                self.update(|s| {
                    s.items = items;
                    s.meta.loading = false;
                    s.meta.last_loaded_at = Some(Utc::now());
                });
            }
            Err(e) => {
                warn!(error = %e, "vision board load failed, keeping cached items");
                self.update(|s| {
                    s.meta.loading = false;
                    s.meta.error = Some(e.to_string());
                });
            }
        }
    }

    pub fn save_remote<R: RemoteStore>(&self, remote: &R, user_id: &str) -> Result<()> {
        for item in &self.state().items {
            let row = serde_json::to_value(item)?;
            upsert(
                remote,
                TABLE,
                &[
                    Filter::eq("id", &item.id.to_string()),
                    Filter::eq("user_id", user_id),
                ],
                row,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryRemote;
    use crate::state::tests_support::map_backend;

    #[test]
    fn items_move_and_scale() {
        let mut store = VisionBoardStore::attach(map_backend());
        let item = VisionBoardItem::new("u1", "Calm mornings".into());
        let id = item.id;
        store.add_item(item);

        store.move_item(id, 12.5, -3.0);
        store.scale_item(id, 1.4);

        let item = store.state().items.iter().find(|i| i.id == id).unwrap();
        assert_eq!(item.position_x, 12.5);
        assert_eq!(item.position_y, -3.0);
        assert_eq!(item.scale, 1.4);
    }

    #[test]
    fn save_then_load_round_trips_items() {
        let remote = MemoryRemote::new();
        let mut store = VisionBoardStore::attach(map_backend());
        store.add_item(VisionBoardItem::new("u1", "Calm mornings".into()));
        store.save_remote(&remote, "u1").unwrap();

        let mut other = VisionBoardStore::attach(map_backend());
        other.load_remote(&remote, "u1");
        assert_eq!(other.state().items.len(), 1);
        assert_eq!(other.state().items[0].title, "Calm mornings");
    }
}
