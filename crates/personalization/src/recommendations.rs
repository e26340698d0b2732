//! Content recommendations: ranks the library for one user by blended
//! relevance and predicted engagement.

use aquascape_core::error::EngineResult;
use aquascape_core::types::{ContentItem, ContentType, PersonalizationScore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::ContentLibrary;
use crate::scoring::{ContentScorer, ScoringContext};

const RELEVANCE_SHARE: f64 = 0.7;
const ENGAGEMENT_SHARE: f64 = 0.3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub content: ContentItem,
    pub score: PersonalizationScore,
    /// Blend used for ordering.
    pub rank_score: f64,
    /// Why the item was picked, from its strongest factor.
    pub reason: String,
}

pub struct Recommender<'a> {
    scorer: ContentScorer<'a>,
    library: &'a ContentLibrary,
}

impl<'a> Recommender<'a> {
    pub fn new(scorer: ContentScorer<'a>, library: &'a ContentLibrary) -> Self {
        Self { scorer, library }
    }

    pub fn recommend(
        &self,
        user_id: &str,
        limit: usize,
        content_type: Option<ContentType>,
    ) -> EngineResult<Vec<Recommendation>> {
        self.recommend_at(user_id, limit, content_type, Utc::now())
    }

    pub fn recommend_at(
        &self,
        user_id: &str,
        limit: usize,
        content_type: Option<ContentType>,
        now: DateTime<Utc>,
    ) -> EngineResult<Vec<Recommendation>> {
        let context = self.scorer.context(user_id)?;
        Ok(self.rank(&context, limit, content_type, now))
    }

    /// Rank library items against an already captured scoring context.
    /// Items outside the user's languages are dropped, not penalised.
    pub fn rank(
        &self,
        context: &ScoringContext,
        limit: usize,
        content_type: Option<ContentType>,
        now: DateTime<Utc>,
    ) -> Vec<Recommendation> {
        let languages = &context.profile.preferences.languages;

        let mut items: Vec<Recommendation> = self
            .library
            .items()
            .into_iter()
            .filter(|item| content_type.map_or(true, |wanted| item.content_type == wanted))
            .filter(|item| languages.contains(&item.language))
            .map(|content| {
                let score = self.scorer.score_with(context, &content, now);
                let rank_score = score.relevance_score * RELEVANCE_SHARE
                    + score.engagement_prediction * ENGAGEMENT_SHARE;
                let reason = score.personalization_factors.explanation().to_string();
                Recommendation {
                    content,
                    score,
                    rank_score,
                    reason,
                }
            })
            .collect();

        // Stable sort: equal scores keep library order.
        items.sort_by(|a, b| {
            b.rank_score
                .partial_cmp(&a.rank_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        items.truncate(limit);

        debug!(
            user_id = %context.profile.id,
            returned = items.len(),
            "Recommendations ranked"
        );
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquascape_core::error::EngineError;
    use aquascape_core::types::{
        AquascapeStyle, ExperienceLevel, Language, ProfileSignup, UserProfile,
    };
    use chrono::TimeZone;

    use crate::store::ProfileStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap()
    }

    fn item(
        id: &str,
        content_type: ContentType,
        style: AquascapeStyle,
        language: Language,
    ) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            content_type,
            topic: "Aquascaping".to_string(),
            style: Some(style),
            difficulty: ExperienceLevel::Beginner,
            tags: vec![],
            language,
            engagement_score: Some(0.3),
            created_at: now(),
            category: None,
        }
    }

    fn setup() -> (ProfileStore, ContentLibrary) {
        let store = ProfileStore::new();
        store.upsert_profile(UserProfile::from_signup(
            "u1",
            ProfileSignup {
                email: "u1@example.com".to_string(),
                styles: Some(vec![AquascapeStyle::Dutch]),
                ..Default::default()
            },
            &["09:00".to_string()],
            now(),
        ));
        (store, ContentLibrary::new())
    }

    #[test]
    fn test_ranked_by_blend() {
        let (store, library) = setup();
        library.register(item("iwagumi", ContentType::BlogArticle, AquascapeStyle::Iwagumi, Language::En));
        library.register(item("dutch", ContentType::BlogArticle, AquascapeStyle::Dutch, Language::En));
        library.register(item("nature", ContentType::BlogArticle, AquascapeStyle::Nature, Language::En));

        let recommender = Recommender::new(ContentScorer::new(&store, &library), &library);
        let recs = recommender.recommend_at("u1", 10, None, now()).unwrap();
        let ids: Vec<&str> = recs.iter().map(|r| r.content.id.as_str()).collect();
        // Nature and iwagumi both score 0.2 on style and keep library order.
        assert_eq!(ids, vec!["dutch", "iwagumi", "nature"]);
        assert!(recs[0].rank_score > recs[1].rank_score);
        let expected = recs[0].score.relevance_score * 0.7 + recs[0].score.engagement_prediction * 0.3;
        assert!((recs[0].rank_score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_language_filter_excludes() {
        let (store, library) = setup();
        library.register(item("bg", ContentType::BlogArticle, AquascapeStyle::Dutch, Language::Bg));
        library.register(item("en", ContentType::BlogArticle, AquascapeStyle::Iwagumi, Language::En));

        let recommender = Recommender::new(ContentScorer::new(&store, &library), &library);
        let recs = recommender.recommend_at("u1", 10, None, now()).unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].content.id, "en");
    }

    #[test]
    fn test_type_filter_and_limit() {
        let (store, library) = setup();
        for i in 0..15 {
            library.register(item(
                &format!("n{i}"),
                ContentType::Newsletter,
                AquascapeStyle::Dutch,
                Language::En,
            ));
        }
        library.register(item("post", ContentType::SocialPost, AquascapeStyle::Dutch, Language::En));

        let recommender = Recommender::new(ContentScorer::new(&store, &library), &library);
        let recs = recommender
            .recommend_at("u1", 10, Some(ContentType::Newsletter), now())
            .unwrap();
        assert_eq!(recs.len(), 10);
        assert!(recs.iter().all(|r| r.content.content_type == ContentType::Newsletter));
        // Identical scores keep library order.
        let ids: Vec<&str> = recs.iter().take(3).map(|r| r.content.id.as_str()).collect();
        assert_eq!(ids, vec!["n0", "n1", "n2"]);
    }

    #[test]
    fn test_empty_result_is_ok() {
        let (store, library) = setup();
        library.register(item("hu", ContentType::BlogArticle, AquascapeStyle::Dutch, Language::Hu));
        let recommender = Recommender::new(ContentScorer::new(&store, &library), &library);
        assert!(recommender.recommend("u1", 5, None).unwrap().is_empty());
        assert!(recommender
            .recommend("u1", 5, Some(ContentType::ProductFeature))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unknown_user() {
        let (store, library) = setup();
        let recommender = Recommender::new(ContentScorer::new(&store, &library), &library);
        let err = recommender.recommend("ghost", 5, None).unwrap_err();
        assert!(matches!(err, EngineError::UserNotFound(_)));
    }

    #[test]
    fn test_reason_from_top_factor() {
        let (store, library) = setup();
        library.register(item("dutch", ContentType::BlogArticle, AquascapeStyle::Dutch, Language::En));
        let recommender = Recommender::new(ContentScorer::new(&store, &library), &library);
        let recs = recommender.recommend_at("u1", 1, None, now()).unwrap();
        assert_eq!(recs[0].reason, "Matches your preferred aquascaping style");
    }
}
