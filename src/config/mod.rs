//! Configuration module for Doorman.
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, bail};

use crate::notify::DEFAULT_NOTICE_TTL;

/// Bot running mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

impl BotMode {
    /// Parse `BOT_MODE`, case-insensitively. Unset means polling.
    fn parse(value: Option<&str>) -> anyhow::Result<Self> {
        match value.map(str::to_lowercase).as_deref() {
            None | Some("polling") => Ok(Self::Polling),
            Some("webhook") => Ok(Self::Webhook),
            Some(other) => bail!("BOT_MODE must be `polling` or `webhook`, got `{other}`"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Bot username (without @) shown by `/show_chats`.
    /// Optional - will be fetched via getMe if not set.
    pub bot_username: Option<String>,

    // MongoDB, `None` keeps everything in memory
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,

    /// How long ephemeral notices stay in the chat.
    pub notice_ttl: Duration,
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` first if a `.env` file should be honored.
    pub fn from_env() -> anyhow::Result<Self> {
        let bot_mode = BotMode::parse(non_empty("BOT_MODE").as_deref())?;

        let webhook_url = non_empty("WEBHOOK_URL");
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            bail!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let webhook_port = match non_empty("WEBHOOK_PORT") {
            Some(port) => port.parse().context("WEBHOOK_PORT must be a port number")?,
            None => 8443,
        };

        let notice_ttl = match non_empty("NOTICE_TTL_SECS") {
            Some(secs) => Duration::from_secs(
                secs.parse()
                    .context("NOTICE_TTL_SECS must be a number of seconds")?,
            ),
            None => DEFAULT_NOTICE_TTL,
        };

        Ok(Self {
            bot_token: non_empty("BOT_TOKEN").context("BOT_TOKEN must be set")?,
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret: non_empty("WEBHOOK_SECRET"),
            bot_username: non_empty("BOT_USERNAME")
                .map(|s| s.trim_start_matches('@').to_string()),
            mongodb_uri: non_empty("MONGODB_URI"),
            mongodb_database: non_empty("MONGODB_DATABASE")
                .unwrap_or_else(|| "doorman".to_string()),
            notice_ttl,
        })
    }
}
