//! Engine snapshots: a JSON document of signups, content and events that
//! can be replayed into a fresh engine.

use aquascape_core::config::PersonalizationConfig;
use aquascape_core::error::{EngineError, EngineResult};
use aquascape_core::types::{ContentItem, InteractionEvent, ProfileSignup};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::engine::PersonalizationEngine;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEvent {
    pub user_id: String,
    #[serde(flatten)]
    pub event: InteractionEvent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSnapshot {
    #[serde(default)]
    pub profiles: Vec<ProfileSignup>,
    #[serde(default)]
    pub content: Vec<ContentItem>,
    #[serde(default)]
    pub events: Vec<SnapshotEvent>,
}

impl EngineSnapshot {
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Snapshot(format!("cannot read {}: {e}", path.display()))
        })?;
        let snapshot: Self = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            profiles = snapshot.profiles.len(),
            content_items = snapshot.content.len(),
            events = snapshot.events.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Replay profiles, then content, then events in document order.
    pub fn into_engine(self, config: PersonalizationConfig) -> PersonalizationEngine {
        let engine = PersonalizationEngine::new(config);
        for signup in self.profiles {
            engine.build_profile(signup);
        }
        for item in self.content {
            engine.register_content(item);
        }
        let total = self.events.len();
        let mut recorded = 0usize;
        for SnapshotEvent { user_id, event } in self.events {
            if engine.record_interaction(&user_id, event) {
                recorded += 1;
            }
        }
        info!(recorded, skipped = total - recorded, "Snapshot events replayed");
        engine.log_summary();
        engine
    }
}
