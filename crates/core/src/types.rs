use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Vocabularies ───────────────────────────────────────────────────────────

/// Layout aesthetic of an aquascape.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AquascapeStyle {
    Nature,
    Iwagumi,
    Dutch,
    Biotope,
    Paludarium,
}

impl AquascapeStyle {
    pub const ALL: [AquascapeStyle; 5] = [
        Self::Nature,
        Self::Iwagumi,
        Self::Dutch,
        Self::Biotope,
        Self::Paludarium,
    ];

    /// Styles that share enough visual language to earn partial credit.
    pub fn compatible_styles(self) -> &'static [AquascapeStyle] {
        match self {
            Self::Nature => &[Self::Iwagumi, Self::Biotope],
            Self::Iwagumi => &[Self::Nature],
            Self::Dutch => &[Self::Nature],
            Self::Biotope => &[Self::Nature, Self::Paludarium],
            Self::Paludarium => &[Self::Biotope],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nature => "nature",
            Self::Iwagumi => "iwagumi",
            Self::Dutch => "dutch",
            Self::Biotope => "biotope",
            Self::Paludarium => "paludarium",
        }
    }
}

/// Ordered skill tier. Content difficulty uses the same scale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 4] = [
        Self::Beginner,
        Self::Intermediate,
        Self::Advanced,
        Self::Expert,
    ];

    /// Zero-based position on the scale.
    pub fn rank(self) -> i32 {
        match self {
            Self::Beginner => 0,
            Self::Intermediate => 1,
            Self::Advanced => 2,
            Self::Expert => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
            Self::Expert => "expert",
        }
    }
}

/// Editorial kind of content a user likes to read.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ContentPreference {
    HowTo,
    Inspiration,
    ProductReview,
    Troubleshooting,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Bg,
    Hu,
}

/// Delivery format of a content item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Newsletter,
    SocialPost,
    BlogArticle,
    ProductFeature,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newsletter => "newsletter",
            Self::SocialPost => "social_post",
            Self::BlogArticle => "blog_article",
            Self::ProductFeature => "product_feature",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SendFrequency {
    Daily,
    #[default]
    Weekly,
    Biweekly,
    Monthly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    EmailOpen,
    EmailClick,
    EmailSent,
    ContentView,
    Share,
    Comment,
    Purchase,
}

// ─── User profile ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub preferences: Preferences,
    pub behavior: Behavior,
    pub demographics: Demographics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub aquascaping_styles: Vec<AquascapeStyle>,
    pub experience_level: ExperienceLevel,
    pub tank_sizes: Vec<String>,
    pub preferred_plants: Vec<String>,
    pub equipment_brands: Vec<String>,
    pub content_types: Vec<ContentPreference>,
    /// Never empty.
    pub languages: Vec<Language>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Behavior {
    pub email_engagement: EmailEngagement,
    pub content_interaction: ContentInteraction,
    pub purchase_history: PurchaseHistory,
    #[serde(default)]
    pub preference_weights: PreferenceWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailEngagement {
    pub open_rate: f64,
    pub click_rate: f64,
    /// "HH:00" slots, most engaging first.
    pub best_send_times: Vec<String>,
    pub preferred_frequency: SendFrequency,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentInteraction {
    pub most_viewed_categories: Vec<ContentType>,
    /// Mean seconds per view, over views that reported a duration.
    pub avg_time_spent: f64,
    #[serde(default)]
    pub timed_views: u64,
    pub sharing_frequency: u64,
    pub comment_engagement: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseHistory {
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub price_range: String,
    /// Purchases per lowercase month name.
    pub seasonal_patterns: BTreeMap<String, u32>,
}

impl Default for PurchaseHistory {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            brands: Vec::new(),
            price_range: "mid".to_string(),
            seasonal_patterns: BTreeMap::new(),
        }
    }
}

/// Weights learned from content views. Not consumed by relevance scoring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceWeights {
    pub style_weights: BTreeMap<AquascapeStyle, f64>,
    pub tag_weights: BTreeMap<String, f64>,
    pub content_type_weights: BTreeMap<ContentType, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub country: String,
    pub timezone: String,
    pub signup_date: DateTime<Utc>,
    pub referral_source: String,
}

/// Raw signup fields. Anything left out falls back to the signup defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileSignup {
    pub user_id: Option<String>,
    pub email: String,
    pub styles: Option<Vec<AquascapeStyle>>,
    pub experience: Option<ExperienceLevel>,
    pub tank_sizes: Option<Vec<String>>,
    pub plants: Option<Vec<String>>,
    pub brands: Option<Vec<String>>,
    pub content_types: Option<Vec<ContentPreference>>,
    pub language: Option<Language>,
    pub country: Option<String>,
    pub timezone: Option<String>,
    pub source: Option<String>,
    /// Overrides the signup timestamp, for imports of existing subscribers.
    pub signup_date: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn from_signup(
        user_id: impl Into<String>,
        signup: ProfileSignup,
        default_send_times: &[String],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: user_id.into(),
            email: signup.email,
            preferences: Preferences {
                aquascaping_styles: signup
                    .styles
                    .unwrap_or_else(|| vec![AquascapeStyle::Nature]),
                experience_level: signup.experience.unwrap_or_default(),
                tank_sizes: signup
                    .tank_sizes
                    .unwrap_or_else(|| vec!["60cm".to_string()]),
                preferred_plants: signup.plants.unwrap_or_default(),
                equipment_brands: signup.brands.unwrap_or_default(),
                content_types: signup.content_types.unwrap_or_else(|| {
                    vec![ContentPreference::HowTo, ContentPreference::Inspiration]
                }),
                languages: vec![signup.language.unwrap_or_default()],
            },
            behavior: Behavior {
                email_engagement: EmailEngagement {
                    open_rate: 0.0,
                    click_rate: 0.0,
                    best_send_times: default_send_times.to_vec(),
                    preferred_frequency: SendFrequency::default(),
                },
                content_interaction: ContentInteraction::default(),
                purchase_history: PurchaseHistory::default(),
                preference_weights: PreferenceWeights::default(),
            },
            demographics: Demographics {
                country: signup.country.unwrap_or_else(|| "Unknown".to_string()),
                timezone: signup.timezone.unwrap_or_else(|| "UTC".to_string()),
                signup_date: signup.signup_date.unwrap_or(now),
                referral_source: signup.source.unwrap_or_else(|| "direct".to_string()),
            },
        }
    }

    /// Mean of open and click rate.
    pub fn average_engagement(&self) -> f64 {
        let engagement = &self.behavior.email_engagement;
        (engagement.open_rate + engagement.click_rate) / 2.0
    }
}

// ─── Content ────────────────────────────────────────────────────────────────

/// A piece of marketing content in the library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub topic: String,
    #[serde(default)]
    pub style: Option<AquascapeStyle>,
    pub difficulty: ExperienceLevel,
    #[serde(default)]
    pub tags: Vec<String>,
    pub language: Language,
    /// Historical engagement in [0, 1].
    #[serde(default)]
    pub engagement_score: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub category: Option<ContentPreference>,
}

// ─── Interactions ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    #[serde(default)]
    pub content_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl InteractionEvent {
    pub fn new(interaction_type: InteractionType, timestamp: DateTime<Utc>) -> Self {
        Self {
            interaction_type,
            content_id: None,
            timestamp,
            metadata: None,
        }
    }

    pub fn with_content(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// String field from the metadata object, if present.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.as_ref()?.get(key)?.as_str()
    }

    pub fn metadata_f64(&self, key: &str) -> Option<f64> {
        self.metadata.as_ref()?.get(key)?.as_f64()
    }
}

// ─── Scores ─────────────────────────────────────────────────────────────────

/// One of the five relevance sub-factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFactor {
    StyleMatch,
    DifficultyMatch,
    TopicInterest,
    TimingOptimal,
    LanguageMatch,
}

impl ScoreFactor {
    pub const ALL: [ScoreFactor; 5] = [
        Self::StyleMatch,
        Self::DifficultyMatch,
        Self::TopicInterest,
        Self::TimingOptimal,
        Self::LanguageMatch,
    ];

    /// Contribution of this factor to the relevance score. Sums to 1.0.
    pub fn weight(self) -> f64 {
        match self {
            Self::StyleMatch => 0.25,
            Self::DifficultyMatch => 0.20,
            Self::TopicInterest => 0.30,
            Self::TimingOptimal => 0.10,
            Self::LanguageMatch => 0.15,
        }
    }

    pub fn explanation(self) -> &'static str {
        match self {
            Self::StyleMatch => "Matches your preferred aquascaping style",
            Self::DifficultyMatch => "Perfect for your experience level",
            Self::TopicInterest => "Based on your reading history",
            Self::TimingOptimal => "Recommended at your optimal time",
            Self::LanguageMatch => "Available in your preferred language",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationFactors {
    pub style_match: f64,
    pub difficulty_match: f64,
    pub topic_interest: f64,
    pub timing_optimal: f64,
    pub language_match: f64,
}

impl PersonalizationFactors {
    pub fn get(&self, factor: ScoreFactor) -> f64 {
        match factor {
            ScoreFactor::StyleMatch => self.style_match,
            ScoreFactor::DifficultyMatch => self.difficulty_match,
            ScoreFactor::TopicInterest => self.topic_interest,
            ScoreFactor::TimingOptimal => self.timing_optimal,
            ScoreFactor::LanguageMatch => self.language_match,
        }
    }

    /// Weighted sum of all factors.
    pub fn relevance(&self) -> f64 {
        ScoreFactor::ALL
            .iter()
            .map(|factor| self.get(*factor) * factor.weight())
            .sum()
    }

    /// Highest-valued factor; the earliest declared one wins ties.
    pub fn top_factor(&self) -> ScoreFactor {
        let mut best = ScoreFactor::StyleMatch;
        for factor in ScoreFactor::ALL {
            if self.get(factor) > self.get(best) {
                best = factor;
            }
        }
        best
    }

    pub fn explanation(&self) -> &'static str {
        self.top_factor().explanation()
    }
}

/// Relevance and engagement estimate for one user/content pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationScore {
    pub user_id: String,
    pub content_id: String,
    pub relevance_score: f64,
    pub engagement_prediction: f64,
    pub personalization_factors: PersonalizationFactors,
}

// ─── Send-time slots ────────────────────────────────────────────────────────

/// Formats an hour of day as a "HH:00" slot.
pub fn hour_slot(hour: u32) -> String {
    format!("{hour:02}:00")
}

/// Hour component of a "HH:MM" slot.
pub fn slot_hour(slot: &str) -> Option<u32> {
    let (hour, _) = slot.split_once(':')?;
    hour.trim().parse().ok().filter(|h| *h < 24)
}
