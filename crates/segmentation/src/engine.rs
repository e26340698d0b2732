//! Segmenter: one full pass over the profile store per call. Nothing is
//! cached between calls.

use aquascape_core::types::UserProfile;
use aquascape_personalization::store::ProfileStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

use crate::segments::SegmentKey;

const HIGH_ENGAGEMENT_ABOVE: f64 = 0.3;
const LOW_ENGAGEMENT_BELOW: f64 = 0.1;
const RECENT_SIGNUP_DAYS: f64 = 30.0;
const LONG_TIME_SUBSCRIBER_DAYS: f64 = 365.0;

/// Segment name to member user ids. Every key is present; ids are sorted.
pub type SegmentMap = BTreeMap<SegmentKey, Vec<String>>;

pub struct Segmenter<'a> {
    store: &'a ProfileStore,
}

impl<'a> Segmenter<'a> {
    pub fn new(store: &'a ProfileStore) -> Self {
        Self { store }
    }

    pub fn segment(&self) -> SegmentMap {
        self.segment_at(Utc::now())
    }

    pub fn segment_at(&self, now: DateTime<Utc>) -> SegmentMap {
        let mut segments: SegmentMap = SegmentKey::ALL.iter().map(|k| (*k, Vec::new())).collect();

        // Profiles arrive sorted by id, so member lists stay sorted.
        for profile in self.store.profiles() {
            for key in classify(&profile, now) {
                segments.entry(key).or_default().push(profile.id.clone());
            }
        }

        debug!(
            profiles = self.store.len(),
            non_empty = segments.values().filter(|m| !m.is_empty()).count(),
            "Segments computed"
        );
        segments
    }
}

/// Every segment a single profile belongs to, without duplicates.
pub fn classify(profile: &UserProfile, now: DateTime<Utc>) -> Vec<SegmentKey> {
    let mut keys = vec![SegmentKey::for_experience(
        profile.preferences.experience_level,
    )];

    for style in &profile.preferences.aquascaping_styles {
        let key = SegmentKey::for_style(*style);
        if !keys.contains(&key) {
            keys.push(key);
        }
    }

    let engagement = profile.average_engagement();
    if engagement > HIGH_ENGAGEMENT_ABOVE {
        keys.push(SegmentKey::HighEngagement);
    } else if engagement < LOW_ENGAGEMENT_BELOW {
        keys.push(SegmentKey::LowEngagement);
    }

    let days_since_signup =
        (now - profile.demographics.signup_date).num_seconds() as f64 / 86_400.0;
    if days_since_signup < RECENT_SIGNUP_DAYS {
        keys.push(SegmentKey::RecentSignups);
    } else if days_since_signup > LONG_TIME_SUBSCRIBER_DAYS {
        keys.push(SegmentKey::LongTimeSubscribers);
    }

    keys
}
