//! Ephemeral notification lifecycle.
//!
//! Every message the bot sends in response to a command or membership event
//! is deleted again after a fixed delay. Sending returns a move-only
//! [`Notice`]; scheduling its deletion consumes it, so a message can only
//! ever be queued once. A single expiry worker owns the timers.

mod worker;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::transport::{DeliveryError, Formatting, Transport};

/// Default lifetime of an ephemeral notice.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(30);

/// Handle of a sent message. Not `Clone`: it is consumed by scheduling.
#[derive(Debug, PartialEq, Eq)]
pub struct Notice {
    chat_id: i64,
    message_id: i32,
}

#[cfg(test)]
impl Notice {
    pub fn chat_id(&self) -> i64 {
        self.chat_id
    }

    pub fn message_id(&self) -> i32 {
        self.message_id
    }
}

/// A deletion waiting for its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingDeletion {
    pub chat_id: i64,
    pub message_id: i32,
    pub not_before: Instant,
}

/// Sends notices and hands them to the expiry worker.
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn Transport>,
    queue: mpsc::UnboundedSender<PendingDeletion>,
    scheduled: Arc<DashSet<(i64, i32)>>,
    ttl: Duration,
}

impl Notifier {
    /// Create a notifier and spawn its expiry worker.
    ///
    /// The worker runs until every `Notifier` clone is dropped, then deletes
    /// whatever is still pending and exits.
    pub fn spawn(transport: Arc<dyn Transport>, ttl: Duration) -> (Self, JoinHandle<()>) {
        let (queue, rx) = mpsc::unbounded_channel();
        let scheduled = Arc::new(DashSet::new());
        let handle = tokio::spawn(worker::run(rx, transport.clone(), scheduled.clone()));

        let notifier = Self {
            transport,
            queue,
            scheduled,
            ttl,
        };
        (notifier, handle)
    }

    /// Send a message and return its handle.
    pub async fn notify(
        &self,
        chat_id: i64,
        text: &str,
        formatting: Formatting,
    ) -> Result<Notice, DeliveryError> {
        let message_id = self
            .transport
            .send_message(chat_id, text, formatting)
            .await?;
        Ok(Notice {
            chat_id,
            message_id,
        })
    }

    /// Queue a notice for deletion after `delay`.
    ///
    /// Returns `false` if the message was already queued or the worker is gone.
    pub fn schedule_delete(&self, notice: Notice, delay: Duration) -> bool {
        let key = (notice.chat_id, notice.message_id);
        if !self.scheduled.insert(key) {
            warn!(
                "Deletion of message {} in chat {} is already scheduled",
                notice.message_id, notice.chat_id
            );
            return false;
        }

        let pending = PendingDeletion {
            chat_id: notice.chat_id,
            message_id: notice.message_id,
            not_before: Instant::now() + delay,
        };

        if self.queue.send(pending).is_err() {
            self.scheduled.remove(&key);
            warn!("Expiry worker stopped, message {} stays", notice.message_id);
            return false;
        }

        debug!(
            "Scheduled deletion of message {} in chat {} in {:?}",
            notice.message_id, notice.chat_id, delay
        );
        true
    }

    /// Send a message and schedule its deletion after the configured TTL.
    pub async fn send_ephemeral(
        &self,
        chat_id: i64,
        text: &str,
        formatting: Formatting,
    ) -> Result<(), DeliveryError> {
        let notice = self.notify(chat_id, text, formatting).await?;
        self.schedule_delete(notice, self.ttl);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::RecordingTransport;

    fn notifier(transport: &Arc<RecordingTransport>) -> (Notifier, JoinHandle<()>) {
        Notifier::spawn(transport.clone(), DEFAULT_NOTICE_TTL)
    }

    #[tokio::test(start_paused = true)]
    async fn deletes_after_ttl() {
        let transport = Arc::new(RecordingTransport::new());
        let (notifier, _worker) = notifier(&transport);

        notifier
            .send_ephemeral(-100, "Got it!", Formatting::Plain)
            .await
            .unwrap();
        let sent = transport.sent_to(-100);
        assert_eq!(sent.len(), 1);
        let message_id = sent[0].message_id;

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(transport.delete_count(-100, message_id), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(transport.delete_count(-100, message_id), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn every_notice_is_deleted_exactly_once() {
        let transport = Arc::new(RecordingTransport::new());
        let (notifier, _worker) = notifier(&transport);

        for chat_id in [-1, -2, -3] {
            for _ in 0..3 {
                notifier
                    .send_ephemeral(chat_id, "hello", Formatting::Html)
                    .await
                    .unwrap();
            }
        }

        tokio::time::sleep(Duration::from_secs(120)).await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 9);
        for message in &sent {
            assert_eq!(transport.delete_count(message.chat_id, message.message_id), 1);
        }
        assert_eq!(transport.total_deletes(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_handle_is_refused() {
        let transport = Arc::new(RecordingTransport::new());
        let (notifier, _worker) = notifier(&transport);

        let notice = notifier.notify(-1, "x", Formatting::Plain).await.unwrap();
        let forged = Notice {
            chat_id: notice.chat_id(),
            message_id: notice.message_id(),
        };
        let message_id = notice.message_id();

        assert!(notifier.schedule_delete(notice, Duration::from_secs(1)));
        assert!(!notifier.schedule_delete(forged, Duration::from_secs(1)));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(transport.delete_count(-1, message_id), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_deletion_is_swallowed() {
        let transport = Arc::new(RecordingTransport::new());
        let (notifier, worker) = notifier(&transport);

        let notice = notifier.notify(-1, "x", Formatting::Plain).await.unwrap();
        transport.mark_gone(-1, notice.message_id());
        let message_id = notice.message_id();
        notifier.schedule_delete(notice, Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(transport.delete_count(-1, message_id), 1);
        assert!(!worker.is_finished());

        notifier
            .send_ephemeral(-1, "still alive", Formatting::Plain)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(transport.total_deletes(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_pending() {
        let transport = Arc::new(RecordingTransport::new());
        let (notifier, worker) = notifier(&transport);

        notifier
            .send_ephemeral(-1, "bye", Formatting::Plain)
            .await
            .unwrap();
        drop(notifier);
        worker.await.unwrap();

        assert_eq!(transport.total_deletes(), 1);
    }

    #[tokio::test]
    async fn send_failure_is_reported() {
        let transport = Arc::new(RecordingTransport::new());
        transport.fail_chat(-1, "Forbidden: bot was kicked from the group chat");
        let (notifier, _worker) = notifier(&transport);

        let err = notifier
            .send_ephemeral(-1, "x", Formatting::Plain)
            .await
            .unwrap_err();
        assert!(err.is_unreachable());
        assert_eq!(transport.total_deletes(), 0);
    }
}
