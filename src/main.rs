use anyhow::Result;
use ingredient_translator::{
    cache, config::Config, dictionary::Dictionary, server, server::AppState,
    translation::Translator,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored when absent)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ingredient_translator=info".parse()?),
        )
        .init();

    info!("Starting ingredient translator");

    // Load configuration from environment
    let config = Config::from_env()?;

    let dictionary = Dictionary::from_config(&config)?;
    info!("✓ Dictionary ready with {} entries", dictionary.len());

    let cache = cache::connect(&config).await?;
    info!("✓ Using {} translation cache", cache.name());

    let state = AppState {
        translator: Translator::new(dictionary, cache),
        max_body_bytes: config.max_body_bytes,
    };

    server::run(&config, state).await
}
