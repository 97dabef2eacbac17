//! /show_chats.

use std::fmt::Write as _;

use crate::bot::dispatcher::AppState;
use crate::registry::AggregateSnapshot;
use crate::transport::Formatting;

use super::{CommandError, Invocation, reply};

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The aggregate sets only cover activity since the last start; the
/// persisted list is authoritative for groups.
fn chats_text(bot_username: &str, sets: &AggregateSnapshot, titles: &[(i64, String)]) -> String {
    let mut text = format!(
        "Since the last start, @{} has started a conversation with the user IDs: {}\n\
         Moreover it has become a member of the groups with IDs: {}\n\
         and administrator in the channels with IDs: {}\n\n\
         Group titles active in the database:\n",
        bot_username,
        join_ids(&sets.user_ids),
        join_ids(&sets.group_ids),
        join_ids(&sets.channel_ids),
    );
    for (_, title) in titles {
        let _ = writeln!(text, "{title}");
    }
    text
}

pub async fn show_chats(state: &AppState, inv: &Invocation) -> Result<(), CommandError> {
    let sets = state.registry.aggregate_snapshot();
    let titles = state.registry.persisted_chats().await;
    let text = chats_text(&state.bot_username, &sets, &titles);
    reply(state, inv, &text, Formatting::Plain).await
}
