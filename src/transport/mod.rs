//! Outbound message capability.
//!
//! Handlers never talk to Telegram directly; they go through `Transport`
//! so delivery failures are classified in one place.

mod telegram;
#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use thiserror::Error;

pub use telegram::TelegramTransport;

/// How a message body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatting {
    Plain,
    Html,
}

/// Why a send or delete failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    /// Bot was blocked, kicked or otherwise forbidden.
    Unauthorized,
    /// Bot is in the chat but may not post.
    NoSendRights,
    /// Chat id is unknown to Telegram.
    PeerInvalid,
    /// Message is already gone or can't be deleted.
    MessageGone,
    Other,
}

#[derive(Debug, Clone, Error)]
#[error("delivery failed ({kind:?}): {detail}")]
pub struct DeliveryError {
    pub kind: DeliveryFailure,
    pub detail: String,
}

impl DeliveryError {
    pub fn new(kind: DeliveryFailure, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Build an error from a Telegram error description.
    pub fn from_description(description: impl Into<String>) -> Self {
        let detail = description.into();
        Self {
            kind: classify_description(&detail),
            detail,
        }
    }

    /// The bot can no longer reach the chat at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self.kind,
            DeliveryFailure::Unauthorized
                | DeliveryFailure::NoSendRights
                | DeliveryFailure::PeerInvalid
        )
    }
}

/// Map a Telegram error description onto a failure kind.
pub fn classify_description(description: &str) -> DeliveryFailure {
    let text = description.to_lowercase();

    if text.contains("peer_id_invalid") || text.contains("chat not found") {
        DeliveryFailure::PeerInvalid
    } else if text.contains("have no rights to send") || text.contains("not enough rights to send")
    {
        DeliveryFailure::NoSendRights
    } else if text.contains("unauthorized") || text.contains("forbidden") {
        DeliveryFailure::Unauthorized
    } else if text.contains("message to delete not found")
        || text.contains("message can't be deleted")
    {
        DeliveryFailure::MessageGone
    } else {
        DeliveryFailure::Other
    }
}

/// Send/delete capability provided by the chat network.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a message, returning its message id.
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        formatting: Formatting,
    ) -> Result<i32, DeliveryError>;

    /// Delete a message. Best effort.
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_descriptions() {
        for description in [
            "Unauthorized",
            "Forbidden: bot was kicked from the group chat",
            "Bad Request: have no rights to send a message",
            "Bad Request: PEER_ID_INVALID",
            "Bad Request: chat not found",
        ] {
            assert!(
                DeliveryError::from_description(description).is_unreachable(),
                "{description}"
            );
        }
    }

    #[test]
    fn deleted_message_is_not_unreachable() {
        let err = DeliveryError::from_description("Bad Request: message to delete not found");
        assert_eq!(err.kind, DeliveryFailure::MessageGone);
        assert!(!err.is_unreachable());

        let err = DeliveryError::from_description("Too Many Requests: retry after 5");
        assert_eq!(err.kind, DeliveryFailure::Other);
    }
}
