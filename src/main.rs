//! Doorman - greets members of Telegram groups.
//!
//! Welcomes people joining a group, says goodbye when they leave, and
//! cleans up after itself: every message it sends is deleted again after
//! a short delay.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - Key-value storage (MongoDB or in-memory)
//! - `cache` - Moka-backed read cache for storage
//! - `registry` - Known chats and their settings
//! - `permissions` - Owner/lock/quiet checks
//! - `notify` - Ephemeral messages and their expiry
//! - `transport` - Outbound Telegram calls
//! - `bot` - Dispatcher and update listeners (with Throttle)
//! - `plugins` - Command handlers
//! - `events` - Membership event handlers
//! - `utils` - Template rendering

mod bot;
mod cache;
mod config;
mod database;
mod events;
mod notify;
mod permissions;
mod plugins;
mod registry;
mod transport;
mod utils;

use std::sync::Arc;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use bot::AppState;
use config::Config;
use database::{Database, KvRepository, KvStore, MemoryStore};
use notify::Notifier;
use registry::ChatRegistry;
use transport::TelegramTransport;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("doorman=info,teloxide=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Doorman bot...");

    let config = Config::from_env()?;
    info!("Bot mode: {:?}", config.bot_mode);

    let store: Arc<dyn KvStore> = match config.mongodb_uri.as_deref() {
        Some(uri) => {
            info!("Connecting to MongoDB...");
            let db = Database::connect(uri, &config.mongodb_database).await?;
            Arc::new(KvRepository::new(&db))
        }
        None => {
            warn!("MONGODB_URI is not set, settings will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let registry = Arc::new(ChatRegistry::load(store).await?);

    // Throttle keeps us within Telegram's per-chat and global rate limits
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());

    let bot_username = match config.bot_username.clone() {
        Some(username) => username,
        None => bot.get_me().await?.username().to_string(),
    };
    info!("Using bot username: @{}", bot_username);

    let transport = Arc::new(TelegramTransport::new(bot.clone()));
    let (notifier, expiry_worker) = Notifier::spawn(transport.clone(), config.notice_ttl);
    let state = AppState::new(registry.clone(), notifier, transport, bot_username);

    let dispatcher = bot::build_dispatcher(bot.clone(), state);
    bot::run(&config, bot, dispatcher).await?;

    info!("Shutting down...");
    if let Err(e) = registry.flush().await {
        error!("Failed to flush chat list: {}", e);
    }

    // The dispatcher owned the last notifier; the worker now flushes and exits
    if let Err(e) = expiry_worker.await {
        error!("Expiry worker panicked: {}", e);
    }

    Ok(())
}
