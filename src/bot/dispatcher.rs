//! Update dispatcher setup.
//!
//! Builds the dispatcher with the command handler and the membership
//! event handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use tracing::{error, warn};

use crate::events;
use crate::notify::Notifier;
use crate::permissions::Gate;
use crate::plugins;
use crate::registry::ChatRegistry;
use crate::transport::{DeliveryError, Formatting, Transport};

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Known chats and their configuration.
    pub registry: Arc<ChatRegistry>,

    /// Lock/ownership checks.
    pub gate: Gate,

    /// Sends ephemeral notices and expires them.
    pub notifier: Notifier,

    /// Raw outbound capability, for messages that must not expire.
    pub transport: Arc<dyn Transport>,

    /// Bot username (without @), shown by `/show_chats`.
    pub bot_username: String,
}

impl AppState {
    pub fn new(
        registry: Arc<ChatRegistry>,
        notifier: Notifier,
        transport: Arc<dyn Transport>,
        bot_username: String,
    ) -> Self {
        Self {
            gate: Gate::new(registry.clone()),
            registry,
            notifier,
            transport,
            bot_username,
        }
    }

    /// Send an ephemeral reply, settling delivery failures on the spot.
    pub async fn respond(&self, chat_id: i64, text: &str, formatting: Formatting) {
        if let Err(e) = self.notifier.send_ephemeral(chat_id, text, formatting).await {
            self.delivery_failed(chat_id, &e).await;
        }
    }

    /// Forget chats the bot can no longer reach; log everything else.
    pub async fn delivery_failed(&self, chat_id: i64, err: &DeliveryError) {
        if err.is_unreachable() {
            warn!("Chat {} is unreachable: {}", chat_id, err);
            self.registry.remove_chat_on_delivery_failure(chat_id).await;
        } else {
            error!("An error occurred while sending to chat {}: {:?}", chat_id, err);
        }
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    let message_handler = Update::filter_message().branch(plugins::command_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(events::event_handler())
}
