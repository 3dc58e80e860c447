use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use super::{Persisted, PersistedState, SyncMeta};
use crate::error::Result;
use crate::model::{clamp_rating, LifeWheelArea};
use crate::remote::{upsert, Filter, RemoteStore};
use crate::storage::adapter::StateBackend;
use crate::storage::StorageKey;

const AREAS_TABLE: &str = "life_wheel_areas";
const SNAPSHOTS_TABLE: &str = "life_wheel_snapshots";

/// The life wheel self-assessment: one area per life domain, each with
/// a current and a target rating.
#[derive(Debug, Default)]
pub struct LifeWheelState {
    pub areas: Vec<LifeWheelArea>,
    pub meta: SyncMeta,
}

#[derive(Serialize, Deserialize)]
pub struct LifeWheelBlob {
    areas: Vec<LifeWheelArea>,
}

impl PersistedState for LifeWheelState {
    const KEY: StorageKey = StorageKey::LifeWheel;
    type Blob = LifeWheelBlob;

    fn partialize(&self) -> LifeWheelBlob {
        LifeWheelBlob {
            areas: self.areas.clone(),
        }
    }

    fn apply_blob(&mut self, blob: LifeWheelBlob) {
        self.areas = blob.areas;
    }
}

pub type LifeWheelStore<B = crate::storage::adapter::PersistenceAdapter> =
    Persisted<LifeWheelState, B>;

impl<B: StateBackend> LifeWheelStore<B> {
    pub fn add_area(&mut self, area: LifeWheelArea) {
        self.update(|s| s.areas.push(area));
    }

    pub fn remove_area(&mut self, id: Uuid) {
        self.update(|s| s.areas.retain(|a| a.id != id));
    }

    /// Set an area's ratings, clamping to the 1..=10 scale.
    pub fn set_area_values(&mut self, id: Uuid, current: u8, target: u8) {
        self.update(|s| {
            if let Some(area) = s.areas.iter_mut().find(|a| a.id == id) {
                area.current_value = clamp_rating(current);
                area.target_value = clamp_rating(target);
                area.updated_at = Utc::now();
            }
        });
    }

    pub fn area(&self, id: Uuid) -> Option<&LifeWheelArea> {
        self.state().areas.iter().find(|a| a.id == id)
    }

    /// Fetch the authoritative area rows for this user and overwrite
    /// the local list. Rows that fail to parse are skipped with a log
    /// line rather than poisoning the whole load.
    pub fn load_remote<R: RemoteStore>(&mut self, remote: &R, user_id: &str) {
        self.update(|s| {
            s.meta.loading = true;
            s.meta.error = None;
        });

        match remote.select(AREAS_TABLE, &[Filter::eq("user_id", user_id)]) {
            Ok(rows) => {
                let mut areas = Vec::with_capacity(rows.len());
                for row in rows {
                    match serde_json::from_value::<LifeWheelArea>(row) {
                        Ok(area) => areas.push(area),
                        Err(e) => warn!(error = %e, "skipping unreadable life wheel row"),
                    }
                }
                self.update(|s| {
                    s.areas = areas;
                    s.meta.loading = false;
                    s.meta.last_loaded_at = Some(Utc::now());
                });
            }
            Err(e) => {
                warn!(error = %e, "life wheel load failed, keeping cached areas");
                self.update(|s| {
                    s.meta.loading = false;
                    s.meta.error = Some(e.to_string());
                });
            }
        }
    }

    /// Push every area as its own update-or-insert call, in order.
    /// Stops at the first failure; earlier writes stay committed and
    /// nothing is rolled back.
    pub fn save_remote<R: RemoteStore>(&self, remote: &R, user_id: &str) -> Result<()> {
        for area in &self.state().areas {
            let row = serde_json::to_value(area)?;
            upsert(
                remote,
                AREAS_TABLE,
                &[
                    Filter::eq("id", &area.id.to_string()),
                    Filter::eq("user_id", user_id),
                ],
                row,
            )?;
        }
        Ok(())
    }

    /// Record the wheel as it stands right now into the snapshot table.
    pub fn save_snapshot<R: RemoteStore>(&self, remote: &R, user_id: &str) -> Result<()> {
        let areas = serde_json::to_value(&self.state().areas)?;
        remote.insert(
            SNAPSHOTS_TABLE,
            json!({
                "id": Uuid::new_v4(),
                "user_id": user_id,
                "taken_at": Utc::now(),
                "areas": areas,
            }),
        )?;
        Ok(())
    }
}
