//! Welcome and goodbye messages for members of a group.

use tracing::{debug, info};

use super::MembershipEvent;
use crate::bot::dispatcher::AppState;
use crate::database::{ChatConfig, GoodbyeTemplate};
use crate::transport::Formatting;
use crate::utils::{Placeholders, html_escape, render};

pub const DEFAULT_WELCOME: &str = "Hello $username! Welcome to $title";
pub const DEFAULT_GOODBYE: &str = "Goodbye, $username!";

/// The rendered greeting for an event, if there is one to send.
///
/// A chat without config behaves as if every template were unset.
pub fn greeting(config: Option<&ChatConfig>, event: &MembershipEvent) -> Option<String> {
    let transition = event.transition()?;

    let template = if transition.is_join() {
        config
            .and_then(|c| c.welcome_template.as_deref())
            .unwrap_or(DEFAULT_WELCOME)
    } else if transition.is_leave() {
        match config.map(|c| &c.goodbye_template) {
            Some(GoodbyeTemplate::Disabled) => return None,
            Some(GoodbyeTemplate::Custom(text)) => text.as_str(),
            Some(GoodbyeTemplate::Unset) | None => DEFAULT_GOODBYE,
        }
    } else {
        return None;
    };

    let username = html_escape(&event.subject_name);
    let title = html_escape(&event.chat.title);
    Some(render(
        template,
        &Placeholders {
            username: &username,
            title: &title,
        },
    ))
}

/// Greet a member joining or leaving a group.
pub async fn greet(state: &AppState, event: &MembershipEvent) {
    if !event.chat.kind.is_group() {
        return;
    }

    let config = state.registry.get_config(event.chat.id);
    let Some(text) = greeting(config.as_ref(), event) else {
        debug!(
            "No greeting for user {} in chat {}",
            event.subject_user_id, event.chat.id
        );
        return;
    };

    state.respond(event.chat.id, &text, Formatting::Html).await;
    info!(
        "Greeted {} in chat {}",
        event.subject_name, event.chat.id
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChatKind, ChatRef, MembershipStatus, StatusSnapshot};
    use crate::plugins::testing::*;

    fn event(old: MembershipStatus, new: MembershipStatus) -> MembershipEvent {
        MembershipEvent {
            chat: group(),
            actor_user_id: 9,
            actor_name: "Someone".into(),
            subject_user_id: 9,
            subject_name: "Ann".into(),
            old: StatusSnapshot::new(old, false),
            new: StatusSnapshot::new(new, false),
        }
    }

    fn joined() -> MembershipEvent {
        event(MembershipStatus::Left, MembershipStatus::Member)
    }

    fn left() -> MembershipEvent {
        event(MembershipStatus::Member, MembershipStatus::Left)
    }

    fn config(goodbye: GoodbyeTemplate) -> ChatConfig {
        let mut config = ChatConfig::new(GROUP, OWNER, "Devs");
        config.goodbye_template = goodbye;
        config
    }

    #[test]
    fn defaults_without_config() {
        assert_eq!(
            greeting(None, &joined()).as_deref(),
            Some("Hello Ann! Welcome to Devs")
        );
        assert_eq!(greeting(None, &left()).as_deref(), Some("Goodbye, Ann!"));
    }

    #[test]
    fn goodbye_is_tri_state() {
        let unset = config(GoodbyeTemplate::Unset);
        let disabled = config(GoodbyeTemplate::Disabled);
        let custom = config(GoodbyeTemplate::Custom("Bye $username$nfrom $title".into()));

        assert_eq!(greeting(Some(&unset), &left()).as_deref(), Some("Goodbye, Ann!"));
        assert_eq!(greeting(Some(&disabled), &left()), None);
        assert_eq!(
            greeting(Some(&custom), &left()).as_deref(),
            Some("Bye Ann\nfrom Devs")
        );
    }

    #[test]
    fn disabled_goodbye_still_welcomes() {
        let disabled = config(GoodbyeTemplate::Disabled);
        assert!(greeting(Some(&disabled), &joined()).is_some());
    }

    #[test]
    fn promotion_is_not_greeted() {
        let promoted = event(MembershipStatus::Member, MembershipStatus::Administrator);
        assert_eq!(greeting(None, &promoted), None);

        let same = event(MembershipStatus::Member, MembershipStatus::Member);
        assert_eq!(greeting(None, &same), None);
    }

    #[test]
    fn names_are_escaped_and_not_rescanned() {
        let mut event = joined();
        event.subject_name = "<b>$title</b>".into();

        assert_eq!(
            greeting(None, &event).as_deref(),
            Some("Hello &lt;b&gt;$title&lt;/b&gt;! Welcome to Devs")
        );
    }

    #[tokio::test]
    async fn greets_in_groups_only() {
        let (state, transport) = registered_state().await;
        greet(&state, &joined()).await;

        let mut private = joined();
        private.chat = ChatRef::new(9, ChatKind::Private, "");
        greet(&state, &private).await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].chat_id, GROUP);
        assert_eq!(sent[0].formatting, Formatting::Html);
    }

    #[tokio::test]
    async fn disabled_goodbye_sends_nothing() {
        let (state, transport) = registered_state().await;
        state
            .registry
            .mutate_config(GROUP, |c| c.goodbye_template = GoodbyeTemplate::Disabled)
            .await
            .unwrap();

        greet(&state, &left()).await;
        assert!(transport.sent().is_empty());
    }
}
