use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{Persisted, PersistedState, SyncMeta};
use crate::error::Result;
use crate::model::UserProfile;
use crate::remote::{upsert, Filter, RemoteStore};
use crate::storage::adapter::StateBackend;
use crate::storage::StorageKey;

const TABLE: &str = "user_profiles";

/// Session slice: the signed-in user's profile, or `None` when signed
/// out.
#[derive(Debug, Default)]
pub struct UserState {
    pub profile: Option<UserProfile>,
    pub meta: SyncMeta,
}

#[derive(Serialize, Deserialize)]
pub struct UserBlob {
    profile: Option<UserProfile>,
}

impl PersistedState for UserState {
    const KEY: StorageKey = StorageKey::User;
    type Blob = UserBlob;

    fn partialize(&self) -> UserBlob {
        UserBlob {
            profile: self.profile.clone(),
        }
    }

    fn apply_blob(&mut self, blob: UserBlob) {
        self.profile = blob.profile;
    }
}

pub type UserStore<B = crate::storage::adapter::PersistenceAdapter> = Persisted<UserState, B>;

impl<B: StateBackend> UserStore<B> {
    pub fn set_profile(&mut self, profile: UserProfile) {
        self.update(|s| s.profile = Some(profile));
    }

    pub fn complete_onboarding(&mut self) {
        self.update(|s| {
            if let Some(profile) = s.profile.as_mut() {
                profile.onboarding_completed = true;
            }
        });
    }

    pub fn sign_out(&mut self) {
        self.reset();
    }

    /// Fetch the authoritative profile row. Overwrites whatever was
    /// rehydrated locally; on failure the cached profile stays and the
    /// error lands in the transient metadata.
    pub fn load_remote<R: RemoteStore>(&mut self, remote: &R, user_id: &str) {
        self.update(|s| {
            s.meta.loading = true;
            s.meta.error = None;
        });

        let fetched = remote
            .select(TABLE, &[Filter::eq("id", user_id)])
            .and_then(|rows| {
                rows.into_iter()
                    .next()
                    .map(|row| serde_json::from_value::<UserProfile>(row).map_err(Into::into))
                    .transpose()
            });

        match fetched {
            Ok(profile) => self.update(|s| {
                if profile.is_some() {
                    s.profile = profile;
                }
                s.meta.loading = false;
                s.meta.last_loaded_at = Some(chrono::Utc::now());
            }),
            Err(e) => {
                warn!(error = %e, "profile load failed, keeping cached profile");
                self.update(|s| {
                    s.meta.loading = false;
                    s.meta.error = Some(e.to_string());
                });
            }
        }
    }

    /// Push the local profile to the remote store.
    pub fn save_remote<R: RemoteStore>(&self, remote: &R) -> Result<()> {
        let Some(profile) = &self.state().profile else {
            return Ok(());
        };
        let row = serde_json::to_value(profile)?;
        upsert(remote, TABLE, &[Filter::eq("id", &profile.id)], row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryRemote;
    use crate::state::tests_support::map_backend;
    use chrono::Utc;
    use serde_json::json;

    fn profile(id: &str) -> UserProfile {
        UserProfile {
            id: id.to_string(),
            email: format!("{id}@example.test"),
            display_name: "Test".into(),
            onboarding_completed: false,
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn profile_round_trips_through_persistence() {
        let mut store = UserStore::attach(map_backend());
        store.set_profile(profile("u1"));

        let raw = store.state().profile.clone();
        assert_eq!(raw.unwrap().id, "u1");
    }

    #[test]
    fn remote_profile_wins_over_cached() {
        let remote = MemoryRemote::new();
        remote
            .insert(
                TABLE,
                json!({
                    "id": "u1",
                    "email": "fresh@example.test",
                    "display_name": "Fresh",
                    "onboarding_completed": true,
                    "joined_at": Utc::now(),
                }),
            )
            .unwrap();

        let mut store = UserStore::attach(map_backend());
        store.set_profile(profile("u1"));
        store.load_remote(&remote, "u1");

        let p = store.state().profile.as_ref().unwrap();
        assert_eq!(p.email, "fresh@example.test");
        assert!(p.onboarding_completed);
        assert!(!store.state().meta.loading);
    }

    #[test]
    fn missing_remote_row_keeps_cached_profile() {
        let remote = MemoryRemote::new();
        let mut store = UserStore::attach(map_backend());
        store.set_profile(profile("u1"));
        store.load_remote(&remote, "u1");

        assert!(store.state().profile.is_some());
        assert!(store.state().meta.error.is_none());
    }

    #[test]
    fn save_remote_upserts_one_row() {
        let remote = MemoryRemote::new();
        let mut store = UserStore::attach(map_backend());
        store.set_profile(profile("u1"));

        store.save_remote(&remote).unwrap();
        store.save_remote(&remote).unwrap();
        assert_eq!(remote.row_count(TABLE), 1);
    }

    #[test]
    fn sign_out_resets_to_defaults() {
        let mut store = UserStore::attach(map_backend());
        store.set_profile(profile("u1"));
        store.sign_out();
        assert!(store.state().profile.is_none());
    }
}
