//! Report subsystem: /receive_reports, /stop_reports, /report.
//!
//! These commands work in any group and ignore lock and quiet. Recipients
//! are stored per group, independent of the chat's settings.

use futures::future::join_all;
use tracing::{info, warn};

use crate::bot::dispatcher::AppState;
use crate::transport::Formatting;

use super::{CommandError, Invocation, reply};

const GROUP_ONLY: &str = "Please send this command in a group!";
const ADDED: &str = "Added! You will receive report notifications in a private chat with me!";
const REMOVED: &str = "You will no longer receive notifications of reports.";
const REPORTED: &str = "Reported!";

pub async fn receive_reports(state: &AppState, inv: &Invocation) -> Result<(), CommandError> {
    if !inv.chat.kind.is_group() {
        return reply(state, inv, GROUP_ONLY, Formatting::Plain).await;
    }
    if state
        .registry
        .add_report_recipient(inv.chat.id, inv.user_id)
        .await?
    {
        reply(state, inv, ADDED, Formatting::Plain).await?;
    }
    Ok(())
}

pub async fn stop_reports(state: &AppState, inv: &Invocation) -> Result<(), CommandError> {
    if !inv.chat.kind.is_group() {
        return reply(state, inv, GROUP_ONLY, Formatting::Plain).await;
    }
    if state
        .registry
        .remove_report_recipient(inv.chat.id, inv.user_id)
        .await?
    {
        reply(state, inv, REMOVED, Formatting::Plain).await?;
    }
    Ok(())
}

/// Notify every recipient in private, then confirm in the group.
///
/// Notifications are not ephemeral. A recipient that blocked the bot is
/// forgotten as a private chat but stays a recipient.
pub async fn report(state: &AppState, inv: &Invocation) -> Result<(), CommandError> {
    if !inv.chat.kind.is_group() {
        return Ok(());
    }

    let recipients = state.registry.report_recipients(inv.chat.id).await?;
    let text = format!("Message reported in the group: {}", inv.chat.title);

    let sends = recipients.iter().map(|&user_id| {
        let text = text.as_str();
        async move {
            let chat_id = user_id as i64;
            (
                chat_id,
                state
                    .transport
                    .send_message(chat_id, text, Formatting::Plain)
                    .await,
            )
        }
    });

    for (chat_id, result) in join_all(sends).await {
        if let Err(e) = result {
            warn!("Could not deliver report to {}: {}", chat_id, e);
            if e.is_unreachable() {
                state.registry.remove_chat_on_delivery_failure(chat_id).await;
            }
        }
    }

    info!(
        "User {} reported a message in chat {} ({} recipients)",
        inv.user_id,
        inv.chat.id,
        recipients.len()
    );
    reply(state, inv, REPORTED, Formatting::Plain).await
}
