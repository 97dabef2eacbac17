//! Expiry worker: deletes notices once their deadline passes.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashSet;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::time::{DelayQueue, delay_queue};
use tracing::{debug, info, warn};

use super::PendingDeletion;
use crate::transport::{DeliveryFailure, Transport};

/// Run until the sending side closes, then flush what is left.
pub(super) async fn run(
    mut rx: mpsc::UnboundedReceiver<PendingDeletion>,
    transport: Arc<dyn Transport>,
    scheduled: Arc<DashSet<(i64, i32)>>,
) {
    let mut queue: DelayQueue<PendingDeletion> = DelayQueue::new();
    let mut keys: HashMap<(i64, i32), delay_queue::Key> = HashMap::new();

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(pending) => {
                    let key = queue.insert_at(pending, pending.not_before);
                    keys.insert((pending.chat_id, pending.message_id), key);
                }
                None => break,
            },
            Some(expired) = queue.next(), if !queue.is_empty() => {
                let pending = expired.into_inner();
                keys.remove(&(pending.chat_id, pending.message_id));
                delete(transport.as_ref(), &scheduled, pending).await;
            }
        }
    }

    if !queue.is_empty() {
        info!("Flushing {} pending deletions", queue.len());
    }
    for (_, key) in keys.drain() {
        let pending = queue.remove(&key).into_inner();
        delete(transport.as_ref(), &scheduled, pending).await;
    }
}

/// One best-effort delete. Never retried.
async fn delete(
    transport: &dyn Transport,
    scheduled: &DashSet<(i64, i32)>,
    pending: PendingDeletion,
) {
    match transport
        .delete_message(pending.chat_id, pending.message_id)
        .await
    {
        Ok(()) => debug!(
            "Deleted message {} in chat {}",
            pending.message_id, pending.chat_id
        ),
        Err(e) if e.kind == DeliveryFailure::MessageGone => debug!(
            "Message {} in chat {} was already gone",
            pending.message_id, pending.chat_id
        ),
        Err(e) => warn!(
            "Failed to delete message {} in chat {}: {}",
            pending.message_id, pending.chat_id, e
        ),
    }
    scheduled.remove(&(pending.chat_id, pending.message_id));
}
