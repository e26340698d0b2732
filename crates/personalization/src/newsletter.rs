//! Newsletter personalization: annotates a newsletter template with a
//! greeting, selected articles, send time, subject line, plant tips and the
//! reader's difficulty level.

use aquascape_core::error::EngineResult;
use aquascape_core::types::{AquascapeStyle, ContentItem, ContentType, ExperienceLevel, UserProfile};
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::recommendations::Recommender;
use crate::scoring::ContentScorer;

/// Newsletter template. Fields the personalizer does not know about are
/// carried through in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsletterTemplate {
    pub topic: String,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_articles: Option<Vec<ContentItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_line: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plant_recommendations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_difficulty: Option<ExperienceLevel>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NewsletterTemplate {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedPersonalization {
    Greeting,
    ContentSelection,
    SendTimeOptimization,
    SubjectLine,
    PlantTips,
    DifficultyAdjustment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementOptimization {
    pub optimal_send_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizedNewsletter {
    pub content: NewsletterTemplate,
    pub applied: Vec<AppliedPersonalization>,
    pub optimization: EngagementOptimization,
}

pub struct NewsletterPersonalizer<'a> {
    scorer: ContentScorer<'a>,
    recommender: Recommender<'a>,
    article_count: usize,
    fallback_send_time: String,
}

impl<'a> NewsletterPersonalizer<'a> {
    pub fn new(
        scorer: ContentScorer<'a>,
        recommender: Recommender<'a>,
        article_count: usize,
        fallback_send_time: impl Into<String>,
    ) -> Self {
        Self {
            scorer,
            recommender,
            article_count,
            fallback_send_time: fallback_send_time.into(),
        }
    }

    pub fn personalize(
        &self,
        user_id: &str,
        template: NewsletterTemplate,
    ) -> EngineResult<PersonalizedNewsletter> {
        self.personalize_at(user_id, template, Utc::now())
    }

    pub fn personalize_at(
        &self,
        user_id: &str,
        mut template: NewsletterTemplate,
        now: DateTime<Utc>,
    ) -> EngineResult<PersonalizedNewsletter> {
        let context = self.scorer.context(user_id)?;
        let profile = &context.profile;
        let mut applied = Vec::with_capacity(6);

        template.greeting = Some(greeting(profile.preferences.experience_level, now.hour()));
        applied.push(AppliedPersonalization::Greeting);

        let articles = self
            .recommender
            .rank(&context, self.article_count, Some(ContentType::Newsletter), now)
            .into_iter()
            .map(|r| r.content)
            .collect();
        template.recommended_articles = Some(articles);
        applied.push(AppliedPersonalization::ContentSelection);

        let optimal_send_time = profile
            .behavior
            .email_engagement
            .best_send_times
            .first()
            .cloned()
            .unwrap_or_else(|| self.fallback_send_time.clone());
        applied.push(AppliedPersonalization::SendTimeOptimization);

        template.subject_line = Some(subject_line(profile, &template.topic));
        applied.push(AppliedPersonalization::SubjectLine);

        if !profile.preferences.preferred_plants.is_empty() {
            template.plant_recommendations =
                Some(plant_tips(&profile.preferences.preferred_plants));
            applied.push(AppliedPersonalization::PlantTips);
        }

        template.content_difficulty = Some(profile.preferences.experience_level);
        applied.push(AppliedPersonalization::DifficultyAdjustment);

        info!(
            user_id,
            applied = applied.len(),
            send_time = %optimal_send_time,
            "Newsletter personalized"
        );

        Ok(PersonalizedNewsletter {
            content: template,
            applied,
            optimization: EngagementOptimization { optimal_send_time },
        })
    }
}

fn salutation(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 17 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}

fn address_term(level: ExperienceLevel) -> &'static str {
    match level {
        ExperienceLevel::Beginner => "fellow aquascaping enthusiast",
        ExperienceLevel::Intermediate => "aquascaping hobbyist",
        ExperienceLevel::Advanced => "skilled aquascaper",
        ExperienceLevel::Expert => "aquascaping expert",
    }
}

pub fn greeting(level: ExperienceLevel, hour: u32) -> String {
    format!("{}, {}!", salutation(hour), address_term(level))
}

fn style_emoji(style: Option<AquascapeStyle>) -> &'static str {
    match style {
        Some(AquascapeStyle::Nature) => "🌿",
        Some(AquascapeStyle::Iwagumi) => "🪨",
        Some(AquascapeStyle::Dutch) => "🌺",
        Some(AquascapeStyle::Biotope) => "🐟",
        Some(AquascapeStyle::Paludarium) => "🌱",
        None => "🐠",
    }
}

/// Emoji for the primary style followed by a tier-specific phrasing.
pub fn subject_line(profile: &UserProfile, topic: &str) -> String {
    let emoji = style_emoji(profile.preferences.aquascaping_styles.first().copied());
    match profile.preferences.experience_level {
        ExperienceLevel::Beginner => format!("{emoji} Easy {topic} Tips for Beginners"),
        ExperienceLevel::Expert => format!("{emoji} Advanced {topic} Masterclass"),
        ExperienceLevel::Intermediate | ExperienceLevel::Advanced => {
            format!("{emoji} {topic} Secrets Revealed")
        }
    }
}

/// Up to three tips, never more than there are preferred plants.
pub fn plant_tips(plants: &[String]) -> Vec<String> {
    let Some(first) = plants.first() else {
        return Vec::new();
    };
    let second = plants.get(1).unwrap_or(first);
    let tips = [
        format!("Special care tips for your favorite {first}"),
        format!("New varieties similar to {second} you might love"),
        format!("Troubleshooting common {first} problems"),
    ];
    tips.into_iter().take(plants.len().min(3)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquascape_core::types::{Language, ProfileSignup};
    use chrono::TimeZone;

    use crate::catalog::ContentLibrary;
    use crate::store::ProfileStore;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, hour, 0, 0).unwrap()
    }

    fn signup(plants: Vec<&str>, level: ExperienceLevel) -> ProfileSignup {
        ProfileSignup {
            email: "reader@example.com".to_string(),
            styles: Some(vec![AquascapeStyle::Iwagumi]),
            experience: Some(level),
            plants: Some(plants.into_iter().map(String::from).collect()),
            ..Default::default()
        }
    }

    fn newsletter_item(id: &str, content_type: ContentType) -> ContentItem {
        ContentItem {
            id: id.to_string(),
            content_type,
            topic: "Hardscape".to_string(),
            style: Some(AquascapeStyle::Iwagumi),
            difficulty: ExperienceLevel::Beginner,
            tags: vec![],
            language: Language::En,
            engagement_score: Some(0.2),
            created_at: at(0),
            category: None,
        }
    }

    fn personalize(
        store: &ProfileStore,
        library: &ContentLibrary,
        template: NewsletterTemplate,
        now: DateTime<Utc>,
    ) -> EngineResult<PersonalizedNewsletter> {
        let personalizer = NewsletterPersonalizer::new(
            ContentScorer::new(store, library),
            Recommender::new(ContentScorer::new(store, library), library),
            5,
            "09:00",
        );
        personalizer.personalize_at("u1", template, now)
    }

    fn store_with(signup: ProfileSignup, send_times: &[String]) -> ProfileStore {
        let store = ProfileStore::new();
        store.upsert_profile(UserProfile::from_signup("u1", signup, send_times, at(0)));
        store
    }

    #[test]
    fn test_greeting_by_hour_and_level() {
        assert_eq!(
            greeting(ExperienceLevel::Beginner, 8),
            "Good morning, fellow aquascaping enthusiast!"
        );
        assert_eq!(
            greeting(ExperienceLevel::Advanced, 12),
            "Good afternoon, skilled aquascaper!"
        );
        assert_eq!(greeting(ExperienceLevel::Expert, 17), "Good evening, aquascaping expert!");
    }

    #[test]
    fn test_plant_tips_capped() {
        assert!(plant_tips(&[]).is_empty());
        let one = plant_tips(&["Monte Carlo".to_string()]);
        assert_eq!(one, vec!["Special care tips for your favorite Monte Carlo"]);

        let plants: Vec<String> = ["Bucephalandra", "Java fern", "Anubias", "Rotala"]
            .iter()
            .map(|p| p.to_string())
            .collect();
        let tips = plant_tips(&plants);
        assert_eq!(tips.len(), 3);
        assert_eq!(tips[1], "New varieties similar to Java fern you might love");
        assert_eq!(tips[2], "Troubleshooting common Bucephalandra problems");
    }

    #[test]
    fn test_subject_line_tiers() {
        let mut profile =
            UserProfile::from_signup("u1", signup(vec![], ExperienceLevel::Beginner), &[], at(0));
        assert_eq!(subject_line(&profile, "Moss"), "🪨 Easy Moss Tips for Beginners");
        profile.preferences.experience_level = ExperienceLevel::Intermediate;
        assert_eq!(subject_line(&profile, "Moss"), "🪨 Moss Secrets Revealed");
        profile.preferences.experience_level = ExperienceLevel::Expert;
        profile.preferences.aquascaping_styles.clear();
        assert_eq!(subject_line(&profile, "Moss"), "🐠 Advanced Moss Masterclass");
    }

    #[test]
    fn test_full_personalization() {
        let store = store_with(
            signup(vec!["Eleocharis"], ExperienceLevel::Intermediate),
            &["19:00".to_string()],
        );
        let library = ContentLibrary::new();
        library.register(newsletter_item("n1", ContentType::Newsletter));
        library.register(newsletter_item("b1", ContentType::BlogArticle));

        let mut template = NewsletterTemplate::new("Weekly Aquascaping Update");
        template
            .extra
            .insert("campaign".to_string(), serde_json::json!("spring"));

        let result = personalize(&store, &library, template, at(18)).unwrap();
        assert_eq!(
            result.applied,
            vec![
                AppliedPersonalization::Greeting,
                AppliedPersonalization::ContentSelection,
                AppliedPersonalization::SendTimeOptimization,
                AppliedPersonalization::SubjectLine,
                AppliedPersonalization::PlantTips,
                AppliedPersonalization::DifficultyAdjustment,
            ]
        );
        let content = &result.content;
        assert_eq!(content.greeting.as_deref(), Some("Good evening, aquascaping hobbyist!"));
        let articles = content.recommended_articles.as_ref().unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].id, "n1");
        assert_eq!(
            content.subject_line.as_deref(),
            Some("🪨 Weekly Aquascaping Update Secrets Revealed")
        );
        assert_eq!(content.plant_recommendations.as_ref().unwrap().len(), 1);
        assert_eq!(content.content_difficulty, Some(ExperienceLevel::Intermediate));
        assert_eq!(content.extra["campaign"], "spring");
        assert_eq!(result.optimization.optimal_send_time, "19:00");
    }

    #[test]
    fn test_minimal_personalization_without_plants() {
        let store = store_with(signup(vec![], ExperienceLevel::Beginner), &[]);
        let library = ContentLibrary::new();

        let result =
            personalize(&store, &library, NewsletterTemplate::new("CO2"), at(9)).unwrap();
        assert_eq!(result.applied.len(), 5);
        assert!(!result.applied.contains(&AppliedPersonalization::PlantTips));
        assert!(result.content.greeting.is_some());
        assert!(result.content.plant_recommendations.is_none());
        assert_eq!(result.content.recommended_articles, Some(vec![]));
        assert_eq!(result.content.content_difficulty, Some(ExperienceLevel::Beginner));
        assert_eq!(result.optimization.optimal_send_time, "09:00");
    }

    #[test]
    fn test_unknown_user() {
        let store = ProfileStore::new();
        let library = ContentLibrary::new();
        let err = personalize(&store, &library, NewsletterTemplate::new("CO2"), at(9)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_template_round_trips_extra_fields() {
        let template: NewsletterTemplate = serde_json::from_value(serde_json::json!({
            "topic": "Moss walls",
            "sections": ["featured_article", "tips"],
            "footer": {"unsubscribe": true}
        }))
        .unwrap();
        assert_eq!(template.sections.len(), 2);
        assert_eq!(template.extra["footer"]["unsubscribe"], true);
        let value = serde_json::to_value(&template).unwrap();
        assert!(value.get("greeting").is_none());
        assert_eq!(value["footer"]["unsubscribe"], true);
    }
}
