//! Membership events.
//!
//! Two kinds of updates arrive here: changes to the bot's own membership
//! (`my_chat_member`), which maintain the chat registry, and changes to
//! other members (`chat_member`), which trigger greetings.

pub mod greet;
pub mod membership;
pub mod tracker;
pub mod transition;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::ChatMemberUpdated;

pub use membership::{ChatKind, ChatRef, MembershipEvent};
pub use transition::Transition;
#[cfg(test)]
pub use transition::{MembershipStatus, StatusSnapshot};

use crate::bot::dispatcher::AppState;

/// Build the handler for both kinds of membership updates.
pub fn event_handler() -> UpdateHandler<anyhow::Error> {
    dptree::entry()
        .branch(Update::filter_my_chat_member().endpoint(on_my_chat_member))
        .branch(Update::filter_chat_member().endpoint(on_chat_member))
}

async fn on_my_chat_member(update: ChatMemberUpdated, state: AppState) -> anyhow::Result<()> {
    tracker::track(&state, &MembershipEvent::from_update(&update)).await;
    Ok(())
}

async fn on_chat_member(update: ChatMemberUpdated, state: AppState) -> anyhow::Result<()> {
    greet::greet(&state, &MembershipEvent::from_update(&update)).await;
    Ok(())
}
