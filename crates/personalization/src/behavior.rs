//! Behavior aggregation: folds interaction events into engagement rates,
//! best send times, learned preference weights and purchase history.

use aquascape_core::types::{
    hour_slot, ContentItem, ContentType, InteractionEvent, InteractionType, PreferenceWeights,
    UserProfile,
};
use chrono::Timelike;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::catalog::ContentLibrary;
use crate::store::ProfileStore;

/// Number of send-time slots kept on a profile.
const BEST_SEND_TIME_SLOTS: usize = 2;

/// Learned weights that decay below this are forgotten.
const MIN_PREFERENCE_WEIGHT: f64 = 1e-3;

pub struct BehaviorAggregator<'a> {
    store: &'a ProfileStore,
    library: &'a ContentLibrary,
    view_decay: f64,
}

impl<'a> BehaviorAggregator<'a> {
    pub fn new(store: &'a ProfileStore, library: &'a ContentLibrary, view_decay: f64) -> Self {
        Self {
            store,
            library,
            view_decay,
        }
    }

    /// Append `event` to the user's history and recompute everything derived
    /// from it. Events for unknown users are dropped; returns whether the
    /// event was recorded.
    pub fn record_interaction(&self, user_id: &str, event: InteractionEvent) -> bool {
        // Resolved before taking the profile lock.
        let viewed = match (event.interaction_type, &event.content_id) {
            (InteractionType::ContentView, Some(content_id)) => self.library.get(content_id),
            _ => None,
        };

        let interaction_type = event.interaction_type;
        let recorded = self.store.update(user_id, |record| {
            apply_event(&mut record.profile, &event, viewed.as_ref(), self.view_decay);
            record.history.push(event);
            recompute_engagement(&mut record.profile, &record.history);
        });

        match recorded {
            Some(()) => {
                debug!(user_id, ?interaction_type, "Interaction recorded");
                true
            }
            None => {
                warn!(user_id, ?interaction_type, "Interaction for unknown user ignored");
                false
            }
        }
    }
}

fn apply_event(
    profile: &mut UserProfile,
    event: &InteractionEvent,
    viewed: Option<&ContentItem>,
    view_decay: f64,
) {
    let behavior = &mut profile.behavior;
    match event.interaction_type {
        InteractionType::ContentView => {
            if let Some(item) = viewed {
                apply_view_weights(&mut behavior.preference_weights, item, view_decay);
                behavior.content_interaction.most_viewed_categories =
                    most_viewed_categories(&behavior.preference_weights);
            }
            if let Some(seconds) = event.metadata_f64("time_spent") {
                let stats = &mut behavior.content_interaction;
                stats.timed_views += 1;
                stats.avg_time_spent += (seconds - stats.avg_time_spent) / stats.timed_views as f64;
            }
        }
        InteractionType::Share => behavior.content_interaction.sharing_frequency += 1,
        InteractionType::Comment => behavior.content_interaction.comment_engagement += 1,
        InteractionType::Purchase => {
            let purchases = &mut behavior.purchase_history;
            if let Some(category) = event.metadata_str("category") {
                push_unique(&mut purchases.categories, category);
            }
            if let Some(brand) = event.metadata_str("brand") {
                push_unique(&mut purchases.brands, brand);
            }
            if let Some(price_range) = event.metadata_str("price_range") {
                purchases.price_range = price_range.to_string();
            }
            let month = event.timestamp.format("%B").to_string().to_lowercase();
            *purchases.seasonal_patterns.entry(month).or_insert(0) += 1;
        }
        InteractionType::EmailOpen | InteractionType::EmailClick | InteractionType::EmailSent => {}
    }
}

/// Exponential decay per view: every learned weight shrinks by `decay` and
/// is dropped once negligible, then the viewed item's style, tags and content
/// type each gain 1.0.
fn apply_view_weights(weights: &mut PreferenceWeights, item: &ContentItem, decay: f64) {
    decay_weights(&mut weights.style_weights, decay);
    decay_weights(&mut weights.tag_weights, decay);
    decay_weights(&mut weights.content_type_weights, decay);

    if let Some(style) = item.style {
        *weights.style_weights.entry(style).or_insert(0.0) += 1.0;
    }
    for tag in &item.tags {
        *weights.tag_weights.entry(tag.clone()).or_insert(0.0) += 1.0;
    }
    *weights
        .content_type_weights
        .entry(item.content_type)
        .or_insert(0.0) += 1.0;
}

fn decay_weights<K: Ord>(weights: &mut BTreeMap<K, f64>, decay: f64) {
    weights.retain(|_, weight| {
        *weight *= decay;
        *weight >= MIN_PREFERENCE_WEIGHT
    });
}

fn most_viewed_categories(weights: &PreferenceWeights) -> Vec<ContentType> {
    let mut ranked: Vec<_> = weights.content_type_weights.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.into_iter().map(|(content_type, _)| *content_type).collect()
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

fn recompute_engagement(profile: &mut UserProfile, history: &[InteractionEvent]) {
    let count = |kind: InteractionType| {
        history
            .iter()
            .filter(|e| e.interaction_type == kind)
            .count()
    };
    let sent = count(InteractionType::EmailSent);
    let opens = count(InteractionType::EmailOpen);
    let clicks = count(InteractionType::EmailClick);

    let engagement = &mut profile.behavior.email_engagement;
    engagement.open_rate = engagement_rate(opens, sent);
    engagement.click_rate = engagement_rate(clicks, opens);

    let best = best_send_times(history);
    if !best.is_empty() {
        engagement.best_send_times = best;
    }
}

/// `positive / total`, or 0 when there were no opportunities.
pub fn engagement_rate(positive: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        positive as f64 / total as f64
    }
}

/// The most frequent engagement hours as "HH:00" slots. Ties keep the order in
/// which the hours were first seen.
pub fn best_send_times(history: &[InteractionEvent]) -> Vec<String> {
    let mut heatmap: Vec<(u32, usize)> = Vec::new();
    for event in history.iter().filter(|e| {
        matches!(
            e.interaction_type,
            InteractionType::EmailOpen | InteractionType::EmailClick
        )
    }) {
        let hour = event.timestamp.hour();
        match heatmap.iter_mut().find(|(h, _)| *h == hour) {
            Some((_, count)) => *count += 1,
            None => heatmap.push((hour, 1)),
        }
    }

    // Stable sort keeps first-seen order among equal counts.
    heatmap.sort_by(|a, b| b.1.cmp(&a.1));
    heatmap
        .into_iter()
        .take(BEST_SEND_TIME_SLOTS)
        .map(|(hour, _)| hour_slot(hour))
        .collect()
}
