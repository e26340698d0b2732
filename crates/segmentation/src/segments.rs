//! Segment keys and the traits that place a profile in them.

use aquascape_core::types::{AquascapeStyle, ExperienceLevel};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKey {
    Beginners,
    Intermediates,
    Advanced,
    Experts,
    NatureLovers,
    IwagumiLovers,
    DutchLovers,
    BiotopeLovers,
    PaludariumLovers,
    HighEngagement,
    LowEngagement,
    RecentSignups,
    LongTimeSubscribers,
}

impl SegmentKey {
    pub const ALL: [SegmentKey; 13] = [
        Self::Beginners,
        Self::Intermediates,
        Self::Advanced,
        Self::Experts,
        Self::NatureLovers,
        Self::IwagumiLovers,
        Self::DutchLovers,
        Self::BiotopeLovers,
        Self::PaludariumLovers,
        Self::HighEngagement,
        Self::LowEngagement,
        Self::RecentSignups,
        Self::LongTimeSubscribers,
    ];

    pub fn for_experience(level: ExperienceLevel) -> Self {
        match level {
            ExperienceLevel::Beginner => Self::Beginners,
            ExperienceLevel::Intermediate => Self::Intermediates,
            ExperienceLevel::Advanced => Self::Advanced,
            ExperienceLevel::Expert => Self::Experts,
        }
    }

    pub fn for_style(style: AquascapeStyle) -> Self {
        match style {
            AquascapeStyle::Nature => Self::NatureLovers,
            AquascapeStyle::Iwagumi => Self::IwagumiLovers,
            AquascapeStyle::Dutch => Self::DutchLovers,
            AquascapeStyle::Biotope => Self::BiotopeLovers,
            AquascapeStyle::Paludarium => Self::PaludariumLovers,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginners => "beginners",
            Self::Intermediates => "intermediates",
            Self::Advanced => "advanced",
            Self::Experts => "experts",
            Self::NatureLovers => "nature_lovers",
            Self::IwagumiLovers => "iwagumi_lovers",
            Self::DutchLovers => "dutch_lovers",
            Self::BiotopeLovers => "biotope_lovers",
            Self::PaludariumLovers => "paludarium_lovers",
            Self::HighEngagement => "high_engagement",
            Self::LowEngagement => "low_engagement",
            Self::RecentSignups => "recent_signups",
            Self::LongTimeSubscribers => "long_time_subscribers",
        }
    }
}

impl std::fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
