//! Recording transport for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;

use super::{DeliveryError, Formatting, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub chat_id: i64,
    pub message_id: i32,
    pub text: String,
    pub formatting: Formatting,
}

/// Remembers every send and delete; can be told to fail specific chats.
#[derive(Default)]
pub struct RecordingTransport {
    next_id: AtomicI32,
    sent: Mutex<Vec<SentMessage>>,
    deleted: Mutex<HashMap<(i64, i32), usize>>,
    failing: Mutex<HashMap<i64, String>>,
    gone: Mutex<HashSet<(i64, i32)>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every send to `chat_id` fails with the given Telegram description.
    pub fn fail_chat(&self, chat_id: i64, description: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(chat_id, description.to_string());
    }

    /// Deleting this message reports that it no longer exists.
    pub fn mark_gone(&self, chat_id: i64, message_id: i32) {
        self.gone.lock().unwrap().insert((chat_id, message_id));
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect()
    }

    pub fn texts(&self, chat_id: i64) -> Vec<String> {
        self.sent_to(chat_id).into_iter().map(|m| m.text).collect()
    }

    /// How often delete was called for a message.
    pub fn delete_count(&self, chat_id: i64, message_id: i32) -> usize {
        self.deleted
            .lock()
            .unwrap()
            .get(&(chat_id, message_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_deletes(&self) -> usize {
        self.deleted.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        formatting: Formatting,
    ) -> Result<i32, DeliveryError> {
        if let Some(description) = self.failing.lock().unwrap().get(&chat_id) {
            return Err(DeliveryError::from_description(description.clone()));
        }

        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            message_id,
            text: text.to_string(),
            formatting,
        });
        Ok(message_id)
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), DeliveryError> {
        *self
            .deleted
            .lock()
            .unwrap()
            .entry((chat_id, message_id))
            .or_default() += 1;

        if self.gone.lock().unwrap().contains(&(chat_id, message_id)) {
            return Err(DeliveryError::from_description(
                "Bad Request: message to delete not found",
            ));
        }
        Ok(())
    }
}
