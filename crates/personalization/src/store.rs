//! Profile store: per-user profiles and their append-only interaction log.

use aquascape_core::types::{InteractionEvent, UserProfile};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

/// A profile and the events it was derived from. Kept in one entry so that a
/// single shard lock covers both.
#[derive(Debug, Clone)]
pub struct ProfileRecord {
    pub profile: UserProfile,
    pub history: Vec<InteractionEvent>,
}

pub struct ProfileStore {
    records: DashMap<String, ProfileRecord>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Insert or replace a profile. An existing interaction log is kept.
    pub fn upsert_profile(&self, profile: UserProfile) {
        let user_id = profile.id.clone();
        let experience = profile.preferences.experience_level.as_str();
        let primary_style = profile
            .preferences
            .aquascaping_styles
            .first()
            .map_or("none", |style| style.as_str());
        match self.records.entry(user_id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().profile = profile;
                info!(user_id = %user_id, experience, primary_style, "Profile replaced");
            }
            Entry::Vacant(entry) => {
                entry.insert(ProfileRecord {
                    profile,
                    history: Vec::new(),
                });
                info!(user_id = %user_id, experience, primary_style, "Profile created");
            }
        }
    }

    pub fn get_profile(&self, user_id: &str) -> Option<UserProfile> {
        self.records.get(user_id).map(|r| r.profile.clone())
    }

    pub fn history(&self, user_id: &str) -> Vec<InteractionEvent> {
        self.records
            .get(user_id)
            .map(|r| r.history.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.records.contains_key(user_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All profiles, ordered by user id.
    pub fn profiles(&self) -> Vec<UserProfile> {
        let mut profiles: Vec<UserProfile> = self
            .records
            .iter()
            .map(|entry| entry.value().profile.clone())
            .collect();
        profiles.sort_by(|a, b| a.id.cmp(&b.id));
        profiles
    }

    /// Run `f` against a consistent view of one record.
    pub fn with_record<R>(&self, user_id: &str, f: impl FnOnce(&ProfileRecord) -> R) -> Option<R> {
        self.records.get(user_id).map(|record| f(record.value()))
    }

    /// Run `f` with exclusive access to one record. Readers of the same user
    /// block until `f` returns.
    pub(crate) fn update<R>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut ProfileRecord) -> R,
    ) -> Option<R> {
        self.records
            .get_mut(user_id)
            .map(|mut record| f(record.value_mut()))
    }
}

impl Default for ProfileStore {
    fn default() -> Self {
        Self::new()
    }
}
