//! Aquascape Personalize: loads an engine snapshot and runs one
//! personalization operation against it, printing the result as JSON.

use aquascape_core::config::AppConfig;
use aquascape_core::types::ContentType;
use aquascape_personalization::{EngineSnapshot, NewsletterTemplate, PersonalizationEngine};
use aquascape_segmentation::Segmenter;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "aquascape-personalize")]
#[command(about = "Aquascaping content personalization and subscriber segmentation")]
#[command(version)]
struct Cli {
    /// Engine snapshot to replay (overrides config)
    #[arg(long, env = "AQUASCAPE__SNAPSHOT_PATH")]
    snapshot: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score one content item for one user
    Score {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        content: String,
    },

    /// Rank the content library for a user
    Recommend {
        #[arg(short, long)]
        user: String,

        /// Maximum number of items (default from config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only consider one content type: newsletter, social_post,
        /// blog_article, product_feature
        #[arg(long, value_parser = parse_content_type)]
        content_type: Option<ContentType>,
    },

    /// Personalize a newsletter template for a user
    Newsletter {
        #[arg(short, long)]
        user: String,

        #[arg(short, long)]
        topic: String,

        /// Template section, repeatable
        #[arg(long = "section")]
        sections: Vec<String>,
    },

    /// Partition all profiles into segments
    Segments,
}

fn parse_content_type(raw: &str) -> Result<ContentType, String> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| format!("unknown content type '{raw}'"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Logs on stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aquascape=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(path) = cli.snapshot {
        config.snapshot_path = Some(path);
    }

    let engine = match config.snapshot_path.as_deref() {
        Some(path) => EngineSnapshot::load(path)?.into_engine(config.personalization.clone()),
        None => {
            info!("No snapshot configured, starting with an empty engine");
            PersonalizationEngine::new(config.personalization.clone())
        }
    };

    match cli.command {
        Commands::Score { user, content } => {
            print_json(&engine.score(&user, &content)?)?;
        }
        Commands::Recommend {
            user,
            limit,
            content_type,
        } => {
            let limit = limit.unwrap_or(config.personalization.default_recommendation_limit);
            print_json(&engine.recommend(&user, limit, content_type)?)?;
        }
        Commands::Newsletter {
            user,
            topic,
            sections,
        } => {
            let mut template = NewsletterTemplate::new(topic);
            template.sections = sections;
            print_json(&engine.personalize_newsletter(&user, template)?)?;
        }
        Commands::Segments => {
            print_json(&Segmenter::new(engine.store()).segment())?;
        }
    }

    Ok(())
}
