//! Content scoring: five weighted sub-factors per (user, content) pair plus
//! an engagement prediction.

use aquascape_core::error::{EngineError, EngineResult};
use aquascape_core::types::{
    hour_slot, slot_hour, ContentItem, ExperienceLevel, InteractionType, PersonalizationFactors,
    PersonalizationScore, UserProfile,
};
use chrono::{DateTime, Timelike, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::catalog::ContentLibrary;
use crate::store::ProfileStore;

/// Stand-in for a click rate or engagement score that is missing or zero.
const ENGAGEMENT_FALLBACK: f64 = 0.05;

/// A profile together with the tags of everything the user has viewed,
/// captured once so many items can be scored against the same state.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub profile: UserProfile,
    pub viewed_tags: HashSet<String>,
}

pub struct ContentScorer<'a> {
    store: &'a ProfileStore,
    library: &'a ContentLibrary,
}

impl<'a> ContentScorer<'a> {
    pub fn new(store: &'a ProfileStore, library: &'a ContentLibrary) -> Self {
        Self { store, library }
    }

    pub fn score(&self, user_id: &str, content_id: &str) -> EngineResult<PersonalizationScore> {
        self.score_at(user_id, content_id, Utc::now())
    }

    pub fn score_at(
        &self,
        user_id: &str,
        content_id: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<PersonalizationScore> {
        let context = self.context(user_id)?;
        let content = self
            .library
            .get(content_id)
            .ok_or_else(|| EngineError::ContentNotFound(content_id.to_string()))?;
        Ok(self.score_with(&context, &content, now))
    }

    /// Snapshot the user's profile and viewing history for scoring.
    pub fn context(&self, user_id: &str) -> EngineResult<ScoringContext> {
        let (profile, viewed_ids) = self
            .store
            .with_record(user_id, |record| {
                let viewed: Vec<String> = record
                    .history
                    .iter()
                    .filter(|e| e.interaction_type == InteractionType::ContentView)
                    .filter_map(|e| e.content_id.clone())
                    .collect();
                (record.profile.clone(), viewed)
            })
            .ok_or_else(|| EngineError::UserNotFound(user_id.to_string()))?;

        let viewed_tags = self.library.tags_of(viewed_ids.iter().map(String::as_str));
        Ok(ScoringContext {
            profile,
            viewed_tags,
        })
    }

    pub fn score_with(
        &self,
        context: &ScoringContext,
        content: &ContentItem,
        now: DateTime<Utc>,
    ) -> PersonalizationScore {
        let profile = &context.profile;
        let factors = PersonalizationFactors {
            style_match: style_match(profile, content),
            difficulty_match: difficulty_match(
                profile.preferences.experience_level,
                content.difficulty,
            ),
            topic_interest: topic_interest(profile, content, &context.viewed_tags),
            timing_optimal: timing_optimal(
                &profile.behavior.email_engagement.best_send_times,
                now.hour(),
            ),
            language_match: language_match(profile, content),
        };
        let relevance_score = factors.relevance();
        let engagement_prediction = engagement_prediction(
            Some(profile.behavior.email_engagement.click_rate),
            content.engagement_score,
            relevance_score,
        );

        debug!(
            user_id = %profile.id,
            content_id = %content.id,
            relevance_score,
            engagement_prediction,
            "Content scored"
        );

        PersonalizationScore {
            user_id: profile.id.clone(),
            content_id: content.id.clone(),
            relevance_score,
            engagement_prediction,
            personalization_factors: factors,
        }
    }
}

/// 1.0 for a preferred style, 0.6 when the user holds a compatible style,
/// 0.2 otherwise.
pub fn style_match(profile: &UserProfile, content: &ContentItem) -> f64 {
    let styles = &profile.preferences.aquascaping_styles;
    let Some(style) = content.style else {
        return 0.2;
    };
    if styles.contains(&style) {
        return 1.0;
    }
    if style
        .compatible_styles()
        .iter()
        .any(|compatible| styles.contains(compatible))
    {
        0.6
    } else {
        0.2
    }
}

/// Content one level above the user is favoured over one level below.
pub fn difficulty_match(user: ExperienceLevel, content: ExperienceLevel) -> f64 {
    let user_level = user.rank();
    let content_level = content.rank();
    if user_level == content_level {
        1.0
    } else if content_level == user_level + 1 {
        0.8
    } else if content_level == user_level - 1 {
        0.7
    } else {
        let difference = (user_level - content_level).abs() as f64;
        (1.0 - difference * 0.3).max(0.2)
    }
}

pub fn topic_interest(
    profile: &UserProfile,
    content: &ContentItem,
    viewed_tags: &HashSet<String>,
) -> f64 {
    let tag_matches = content
        .tags
        .iter()
        .filter(|tag| viewed_tags.contains(*tag))
        .count();
    let mut score = 0.5 + (tag_matches as f64 / content.tags.len().max(1) as f64) * 0.5;

    if content
        .category
        .is_some_and(|category| profile.preferences.content_types.contains(&category))
    {
        score += 0.3;
    }
    score.min(1.0)
}

/// 1.0 at a best send time, 0.7 within two hours of one, 0.3 otherwise.
pub fn timing_optimal(best_send_times: &[String], current_hour: u32) -> f64 {
    let current_slot = hour_slot(current_hour);
    if best_send_times.iter().any(|slot| *slot == current_slot) {
        return 1.0;
    }
    let near_optimal = best_send_times
        .iter()
        .filter_map(|slot| slot_hour(slot))
        .any(|optimal| current_hour.abs_diff(optimal) <= 2);
    if near_optimal {
        0.7
    } else {
        0.3
    }
}

pub fn language_match(profile: &UserProfile, content: &ContentItem) -> f64 {
    if profile.preferences.languages.contains(&content.language) {
        1.0
    } else {
        0.0
    }
}

pub fn engagement_prediction(
    click_rate: Option<f64>,
    content_engagement: Option<f64>,
    relevance_score: f64,
) -> f64 {
    let base = or_fallback(click_rate);
    let content = or_fallback(content_engagement);
    ((base + content + relevance_score) / 3.0).min(1.0)
}

fn or_fallback(value: Option<f64>) -> f64 {
    value
        .filter(|v| *v != 0.0 && !v.is_nan())
        .unwrap_or(ENGAGEMENT_FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquascape_core::types::{
        AquascapeStyle, ContentPreference, ContentType, InteractionEvent, Language, ProfileSignup,
    };
    use chrono::TimeZone;

    use crate::behavior::BehaviorAggregator;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn profile(styles: Vec<AquascapeStyle>, level: ExperienceLevel) -> UserProfile {
        UserProfile::from_signup(
            "u1",
            ProfileSignup {
                email: "u1@example.com".to_string(),
                styles: Some(styles),
                experience: Some(level),
                ..Default::default()
            },
            &["09:00".to_string(), "19:00".to_string()],
            Utc::now(),
        )
    }

    fn item(id: &str, style: Option<AquascapeStyle>, tags: &[&str]) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            content_type: ContentType::Newsletter,
            topic: "Carpeting plants".to_string(),
            style,
            difficulty: ExperienceLevel::Beginner,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            language: Language::En,
            engagement_score: Some(0.5),
            created_at: Utc::now(),
            category: None,
        }
    }

    #[test]
    fn test_style_match_values() {
        let user = profile(vec![AquascapeStyle::Nature], ExperienceLevel::Beginner);
        assert_eq!(style_match(&user, &item("a", Some(AquascapeStyle::Nature), &[])), 1.0);
        assert_eq!(style_match(&user, &item("a", Some(AquascapeStyle::Iwagumi), &[])), 0.6);
        assert_eq!(style_match(&user, &item("a", Some(AquascapeStyle::Dutch), &[])), 0.6);
        assert_eq!(style_match(&user, &item("a", Some(AquascapeStyle::Paludarium), &[])), 0.2);
        assert_eq!(style_match(&user, &item("a", None, &[])), 0.2);

        let paludarium = profile(vec![AquascapeStyle::Paludarium], ExperienceLevel::Beginner);
        assert_eq!(
            style_match(&paludarium, &item("a", Some(AquascapeStyle::Biotope), &[])),
            0.6
        );
    }

    #[test]
    fn test_style_match_only_three_values() {
        for held in AquascapeStyle::ALL {
            let user = profile(vec![held], ExperienceLevel::Beginner);
            for style in AquascapeStyle::ALL.into_iter().map(Some).chain([None]) {
                let value = style_match(&user, &item("a", style, &[]));
                assert!([1.0, 0.6, 0.2].contains(&value), "unexpected {value}");
            }
        }
    }

    #[test]
    fn test_difficulty_match() {
        use ExperienceLevel::*;
        assert_eq!(difficulty_match(Beginner, Beginner), 1.0);
        assert_eq!(difficulty_match(Beginner, Intermediate), 0.8);
        assert_eq!(difficulty_match(Advanced, Intermediate), 0.7);
        assert!(approx(difficulty_match(Beginner, Advanced), 0.4));
        assert!(approx(difficulty_match(Expert, Intermediate), 0.4));
        assert_eq!(difficulty_match(Expert, Beginner), 0.2);
        assert_eq!(difficulty_match(Beginner, Expert), 0.2);
    }

    #[test]
    fn test_timing_optimal() {
        let slots = vec!["09:00".to_string(), "19:00".to_string()];
        assert_eq!(timing_optimal(&slots, 9), 1.0);
        assert_eq!(timing_optimal(&slots, 11), 0.7);
        assert_eq!(timing_optimal(&slots, 17), 0.7);
        assert_eq!(timing_optimal(&slots, 14), 0.3);
        // No wrap-around past midnight.
        assert_eq!(timing_optimal(&["23:00".to_string()], 0), 0.3);
        assert_eq!(timing_optimal(&[], 9), 0.3);
    }

    #[test]
    fn test_topic_interest() {
        let mut user = profile(vec![AquascapeStyle::Nature], ExperienceLevel::Beginner);
        let viewed: HashSet<String> = ["moss".to_string()].into_iter().collect();

        let content = item("a", None, &["moss", "driftwood"]);
        assert!(approx(topic_interest(&user, &content, &viewed), 0.75));
        assert!(approx(topic_interest(&user, &item("b", None, &[]), &viewed), 0.5));

        let mut how_to = item("c", None, &["moss"]);
        how_to.category = Some(ContentPreference::HowTo);
        assert_eq!(topic_interest(&user, &how_to, &viewed), 1.0);

        user.preferences.content_types = vec![ContentPreference::Troubleshooting];
        assert_eq!(topic_interest(&user, &how_to, &viewed), 1.0);
        assert!(approx(topic_interest(&user, &how_to, &HashSet::new()), 0.5));
    }

    #[test]
    fn test_engagement_prediction_fallbacks() {
        assert!(approx(engagement_prediction(Some(0.0), None, 0.9), (0.05 + 0.05 + 0.9) / 3.0));
        assert!(approx(engagement_prediction(Some(0.6), Some(0.3), 0.9), 0.6));
        assert_eq!(engagement_prediction(Some(1.0), Some(1.0), 1.0), 1.0);
    }

    #[test]
    fn test_score_not_found() {
        let store = ProfileStore::new();
        let library = ContentLibrary::new();
        store.upsert_profile(profile(vec![AquascapeStyle::Nature], ExperienceLevel::Beginner));
        library.register(item("c1", None, &[]));
        let scorer = ContentScorer::new(&store, &library);

        let err = scorer.score("ghost", "c1").unwrap_err();
        assert!(matches!(err, EngineError::UserNotFound(_)));
        let err = scorer.score("u1", "missing").unwrap_err();
        assert!(matches!(err, EngineError::ContentNotFound(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_score_weighted_sum_and_determinism() {
        let store = ProfileStore::new();
        let library = ContentLibrary::new();
        store.upsert_profile(profile(vec![AquascapeStyle::Nature], ExperienceLevel::Beginner));
        library.register(item("seen", None, &["moss"]));
        library.register(item("c1", Some(AquascapeStyle::Nature), &["moss", "rock"]));
        BehaviorAggregator::new(&store, &library, 0.9).record_interaction(
            "u1",
            InteractionEvent::new(InteractionType::ContentView, Utc::now()).with_content("seen"),
        );

        let scorer = ContentScorer::new(&store, &library);
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 9, 30, 0).unwrap();
        let score = scorer.score_at("u1", "c1", now).unwrap();
        let factors = score.personalization_factors;

        assert_eq!(factors.style_match, 1.0);
        assert_eq!(factors.difficulty_match, 1.0);
        assert!(approx(factors.topic_interest, 0.75));
        assert_eq!(factors.language_match, 1.0);
        assert_eq!(factors.timing_optimal, 1.0);
        assert!(approx(score.relevance_score, 0.925));
        assert!(approx(
            score.engagement_prediction,
            (0.05 + 0.5 + score.relevance_score) / 3.0
        ));
        assert_eq!(score, scorer.score_at("u1", "c1", now).unwrap());
    }

    #[test]
    fn test_language_mismatch_scores_zero() {
        let user = profile(vec![AquascapeStyle::Nature], ExperienceLevel::Beginner);
        let mut content = item("a", None, &[]);
        content.language = Language::Bg;
        assert_eq!(language_match(&user, &content), 0.0);
    }
}
