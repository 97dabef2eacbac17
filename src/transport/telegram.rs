//! Telegram implementation of the transport capability.

use async_trait::async_trait;
use teloxide::RequestError;
use teloxide::prelude::*;
use teloxide::types::{MessageId, ParseMode};

use super::{DeliveryError, DeliveryFailure, Formatting, Transport};
use crate::bot::dispatcher::ThrottledBot;

/// Sends through the throttled bot so Telegram's rate limits are respected.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: ThrottledBot,
}

impl TelegramTransport {
    pub fn new(bot: ThrottledBot) -> Self {
        Self { bot }
    }
}

fn delivery_error(err: RequestError) -> DeliveryError {
    match err {
        RequestError::Api(api) => DeliveryError::from_description(api.to_string()),
        other => DeliveryError::new(DeliveryFailure::Other, other.to_string()),
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        formatting: Formatting,
    ) -> Result<i32, DeliveryError> {
        let request = self.bot.send_message(ChatId(chat_id), text);
        let sent = match formatting {
            Formatting::Html => request.parse_mode(ParseMode::Html).await,
            Formatting::Plain => request.await,
        }
        .map_err(delivery_error)?;

        Ok(sent.id.0)
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), DeliveryError> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id))
            .await
            .map_err(delivery_error)?;
        Ok(())
    }
}
