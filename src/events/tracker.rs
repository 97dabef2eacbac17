//! Tracks the chats the bot itself is a member of.

use tracing::{debug, error};

use super::MembershipEvent;
use crate::bot::dispatcher::AppState;

pub async fn track(state: &AppState, event: &MembershipEvent) {
    let Some(transition) = event.transition() else {
        debug!("Status of the bot in chat {} did not change", event.chat.id);
        return;
    };

    if let Err(e) = state.registry.record_transition(event, transition).await {
        error!(
            "Failed to record membership change in chat {}: {}",
            event.chat.id, e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MembershipStatus, StatusSnapshot};
    use crate::plugins::testing::*;

    fn event(old: MembershipStatus, new: MembershipStatus) -> MembershipEvent {
        MembershipEvent {
            chat: group(),
            actor_user_id: OWNER,
            actor_name: "Owner".into(),
            subject_user_id: 1,
            subject_name: "doorman".into(),
            old: StatusSnapshot::new(old, false),
            new: StatusSnapshot::new(new, false),
        }
    }

    #[tokio::test]
    async fn added_then_removed() {
        let (state, _transport) = state();

        track(&state, &event(MembershipStatus::Left, MembershipStatus::Member)).await;
        let config = state.registry.get_config(GROUP).unwrap();
        assert_eq!(config.owner_user_id, OWNER);
        assert!(config.locked);

        track(&state, &event(MembershipStatus::Member, MembershipStatus::Administrator)).await;
        assert!(state.registry.get_config(GROUP).is_some());

        track(&state, &event(MembershipStatus::Administrator, MembershipStatus::Banned)).await;
        assert!(state.registry.get_config(GROUP).is_none());
        assert!(state.registry.persisted_chats().await.is_empty());
    }
}
