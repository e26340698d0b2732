use serde::Deserialize;

use crate::error::EngineResult;

/// Root application configuration. Loaded from an optional `aquascape.toml`
/// and environment variables with the prefix `AQUASCAPE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Engine snapshot to load when the binary is not given `--snapshot`.
    #[serde(default)]
    pub snapshot_path: Option<String>,
    #[serde(default)]
    pub personalization: PersonalizationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersonalizationConfig {
    /// Best send times assigned to a freshly built profile.
    #[serde(default = "default_send_times")]
    pub default_send_times: Vec<String>,
    /// Send time used by the newsletter when a profile has none.
    #[serde(default = "default_fallback_send_time")]
    pub fallback_send_time: String,
    #[serde(default = "default_newsletter_articles")]
    pub newsletter_articles: usize,
    #[serde(default = "default_recommendation_limit")]
    pub default_recommendation_limit: usize,
    /// Multiplier applied to every learned preference weight on each view.
    #[serde(default = "default_view_decay")]
    pub view_decay: f64,
}

// Default functions
fn default_send_times() -> Vec<String> {
    vec!["09:00".to_string(), "19:00".to_string()]
}
fn default_fallback_send_time() -> String {
    "09:00".to_string()
}
fn default_newsletter_articles() -> usize {
    5
}
fn default_recommendation_limit() -> usize {
    10
}
fn default_view_decay() -> f64 {
    0.9
}

impl Default for PersonalizationConfig {
    fn default() -> Self {
        Self {
            default_send_times: default_send_times(),
            fallback_send_time: default_fallback_send_time(),
            newsletter_articles: default_newsletter_articles(),
            default_recommendation_limit: default_recommendation_limit(),
            view_decay: default_view_decay(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            personalization: PersonalizationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the optional config file and environment variables.
    pub fn load() -> EngineResult<Self> {
        Self::load_from(environment())
    }

    fn load_from(environment: config::Environment) -> EngineResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("aquascape").required(false))
            .add_source(environment);

        let config = builder.build()?;
        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        let decay = self.personalization.view_decay;
        if !(0.0..=1.0).contains(&decay) {
            return Err(config::ConfigError::Message(format!(
                "personalization.view_decay must be within [0, 1], got {decay}"
            )));
        }
        Ok(())
    }
}

/// `AQUASCAPE__` variables. Only list-typed keys are split on commas.
fn environment() -> config::Environment {
    config::Environment::with_prefix("AQUASCAPE")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("personalization.default_send_times")
}
