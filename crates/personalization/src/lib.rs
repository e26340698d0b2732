//! Personalization engine: profile store, behavior aggregation, content
//! scoring, recommendations, and newsletter personalization.

pub mod behavior;
pub mod catalog;
pub mod engine;
pub mod newsletter;
pub mod recommendations;
pub mod scoring;
pub mod snapshot;
pub mod store;

pub use behavior::BehaviorAggregator;
pub use catalog::ContentLibrary;
pub use engine::PersonalizationEngine;
pub use newsletter::{NewsletterPersonalizer, NewsletterTemplate, PersonalizedNewsletter};
pub use recommendations::{Recommendation, Recommender};
pub use scoring::{ContentScorer, ScoringContext};
pub use snapshot::EngineSnapshot;
pub use store::ProfileStore;
