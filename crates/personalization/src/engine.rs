//! Engine facade: owns one profile store and one content library and wires
//! the components to them. Engines share no state with each other.

use aquascape_core::config::PersonalizationConfig;
use aquascape_core::error::EngineResult;
use aquascape_core::types::{
    ContentItem, ContentType, InteractionEvent, PersonalizationScore, ProfileSignup, UserProfile,
};
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::behavior::BehaviorAggregator;
use crate::catalog::ContentLibrary;
use crate::newsletter::{NewsletterPersonalizer, NewsletterTemplate, PersonalizedNewsletter};
use crate::recommendations::{Recommendation, Recommender};
use crate::scoring::ContentScorer;
use crate::store::ProfileStore;

pub struct PersonalizationEngine {
    config: PersonalizationConfig,
    store: ProfileStore,
    library: ContentLibrary,
}

impl PersonalizationEngine {
    pub fn new(config: PersonalizationConfig) -> Self {
        Self {
            config,
            store: ProfileStore::new(),
            library: ContentLibrary::new(),
        }
    }

    pub fn config(&self) -> &PersonalizationConfig {
        &self.config
    }

    pub fn store(&self) -> &ProfileStore {
        &self.store
    }

    pub fn library(&self) -> &ContentLibrary {
        &self.library
    }

    // ─── Profiles & content ────────────────────────────────────────────

    /// Build (or rebuild) a profile from signup data. A signup without a user
    /// id gets a generated one.
    pub fn build_profile(&self, signup: ProfileSignup) -> UserProfile {
        self.build_profile_at(signup, Utc::now())
    }

    pub fn build_profile_at(&self, mut signup: ProfileSignup, now: DateTime<Utc>) -> UserProfile {
        let user_id = signup
            .user_id
            .take()
            .unwrap_or_else(|| format!("user_{}", Uuid::new_v4().simple()));
        let profile =
            UserProfile::from_signup(user_id, signup, &self.config.default_send_times, now);
        self.store.upsert_profile(profile.clone());
        profile
    }

    pub fn register_content(&self, item: ContentItem) -> bool {
        self.library.register(item)
    }

    pub fn profile(&self, user_id: &str) -> Option<UserProfile> {
        self.store.get_profile(user_id)
    }

    pub fn history(&self, user_id: &str) -> Vec<InteractionEvent> {
        self.store.history(user_id)
    }

    // ─── Components ────────────────────────────────────────────────────

    pub fn aggregator(&self) -> BehaviorAggregator<'_> {
        BehaviorAggregator::new(&self.store, &self.library, self.config.view_decay)
    }

    pub fn scorer(&self) -> ContentScorer<'_> {
        ContentScorer::new(&self.store, &self.library)
    }

    pub fn recommender(&self) -> Recommender<'_> {
        Recommender::new(self.scorer(), &self.library)
    }

    pub fn newsletter(&self) -> NewsletterPersonalizer<'_> {
        NewsletterPersonalizer::new(
            self.scorer(),
            self.recommender(),
            self.config.newsletter_articles,
            self.config.fallback_send_time.clone(),
        )
    }

    // ─── Operations ────────────────────────────────────────────────────

    pub fn record_interaction(&self, user_id: &str, event: InteractionEvent) -> bool {
        self.aggregator().record_interaction(user_id, event)
    }

    pub fn score(&self, user_id: &str, content_id: &str) -> EngineResult<PersonalizationScore> {
        self.scorer().score(user_id, content_id)
    }

    pub fn score_at(
        &self,
        user_id: &str,
        content_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<PersonalizationScore> {
        self.scorer().score_at(user_id, content_id, now)
    }

    pub fn recommend(
        &self,
        user_id: &str,
        limit: usize,
        content_type: Option<ContentType>,
    ) -> EngineResult<Vec<Recommendation>> {
        self.recommender().recommend(user_id, limit, content_type)
    }

    pub fn recommend_at(
        &self,
        user_id: &str,
        limit: usize,
        content_type: Option<ContentType>,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<Recommendation>> {
        self.recommender()
            .recommend_at(user_id, limit, content_type, now)
    }

    pub fn personalize_newsletter(
        &self,
        user_id: &str,
        template: NewsletterTemplate,
    ) -> EngineResult<PersonalizedNewsletter> {
        self.newsletter().personalize(user_id, template)
    }

    pub fn personalize_newsletter_at(
        &self,
        user_id: &str,
        template: NewsletterTemplate,
        now: DateTime<Utc>,
    ) -> EngineResult<PersonalizedNewsletter> {
        self.newsletter().personalize_at(user_id, template, now)
    }

    pub fn log_summary(&self) {
        info!(
            profiles = self.store.len(),
            content_items = self.library.len(),
            "Personalization engine ready"
        );
    }
}

impl Default for PersonalizationEngine {
    fn default() -> Self {
        Self::new(PersonalizationConfig::default())
    }
}
