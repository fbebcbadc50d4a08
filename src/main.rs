use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hookbot::config::Config;
use hookbot::{Api, Bot, ParseMode};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hookbot=debug,echobot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Webhook: {}", config.telegram.webhook_url);
    info!("  Listen address: {}", config.listen_addr());

    let api = match &config.telegram.api_base_url {
        Some(base_url) => Api::with_base_url(&config.telegram.bot_token, base_url),
        None => Api::new(&config.telegram.bot_token),
    };
    let bot = Bot::with_api(api)
        .await
        .context("Failed to resolve bot identity")?;

    bot.set_webhook(&config.telegram.webhook_url)
        .await
        .context("Failed to register webhook")?;

    let mut updates = bot
        .listen(&config.listen_addr())
        .await
        .context("Failed to start webhook listener")?;

    info!("Bot is running, listening on {}", updates.local_addr());

    while let Some(msg) = updates.recv().await {
        if config.general.debug {
            debug!("{:#?}", msg);
        } else {
            info!("{}", msg);
        }

        let Some(text) = msg.text.as_deref() else {
            continue;
        };

        if let Err(e) = bot
            .send_message(msg.chat_id(), text, ParseMode::Plain, false, None)
            .await
        {
            error!("Failed to echo message {}: {:#}", msg.id, e);
        }
    }

    Ok(())
}
