//! Settings commands.
//!
//! /welcome, /goodbye, /disable_goodbye, /lock, /unlock, /quiet, /unquiet.

use crate::bot::dispatcher::AppState;
use crate::database::{ChatConfig, GoodbyeTemplate};
use crate::transport::Formatting;

use super::{Command, CommandError, GOT_IT, Invocation, ensure_allowed, reply};

const WELCOME_USAGE: &str = "You need to send a message, too! For example:\n\
    <code>/welcome Hello $username, welcome to $title!</code>";

const GOODBYE_USAGE: &str = "You need to send a message, too! For example:\n\
    <code>/goodbye Goodbye, $username!</code>";

/// Persist a config change and confirm it. Callers authorize first.
async fn apply(
    state: &AppState,
    inv: &Invocation,
    mutator: impl FnOnce(&mut ChatConfig),
) -> Result<(), CommandError> {
    state.registry.mutate_config(inv.chat.id, mutator).await?;
    reply(state, inv, GOT_IT, Formatting::Plain).await
}

/// Trimmed argument, or a usage hint if there is none.
fn required(text: &str, hint: &'static str) -> Result<String, CommandError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CommandError::Validation { hint });
    }
    Ok(text.to_string())
}

/// Handle /welcome <text>.
pub async fn set_welcome(
    state: &AppState,
    inv: &Invocation,
    command: &Command,
    text: &str,
) -> Result<(), CommandError> {
    ensure_allowed(state, inv, command)?;
    let template = required(text, WELCOME_USAGE)?;
    apply(state, inv, |c| c.welcome_template = Some(template)).await
}

/// Handle /goodbye <text>. Also re-enables a disabled goodbye.
pub async fn set_goodbye(
    state: &AppState,
    inv: &Invocation,
    command: &Command,
    text: &str,
) -> Result<(), CommandError> {
    ensure_allowed(state, inv, command)?;
    let template = required(text, GOODBYE_USAGE)?;
    apply(state, inv, |c| {
        c.goodbye_template = GoodbyeTemplate::Custom(template)
    })
    .await
}

pub async fn disable_goodbye(
    state: &AppState,
    inv: &Invocation,
    command: &Command,
) -> Result<(), CommandError> {
    ensure_allowed(state, inv, command)?;
    apply(state, inv, |c| {
        c.goodbye_template = GoodbyeTemplate::Disabled
    })
    .await
}

/// Handle /lock and /unlock.
pub async fn set_locked(
    state: &AppState,
    inv: &Invocation,
    command: &Command,
    locked: bool,
) -> Result<(), CommandError> {
    ensure_allowed(state, inv, command)?;
    apply(state, inv, |c| c.locked = locked).await
}

/// Handle /quiet and /unquiet.
pub async fn set_quiet(
    state: &AppState,
    inv: &Invocation,
    command: &Command,
    quiet: bool,
) -> Result<(), CommandError> {
    ensure_allowed(state, inv, command)?;
    apply(state, inv, |c| c.quiet = quiet).await
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{NOT_OWNER, dispatch};
    use super::*;

    const STRANGER: u64 = 7;

    #[tokio::test]
    async fn owner_sets_welcome() {
        let (state, transport) = registered_state().await;
        dispatch(
            &state,
            &in_group(OWNER),
            Command::Welcome("  Hi $username  ".into()),
        )
        .await;

        let config = state.registry.get_config(GROUP).unwrap();
        assert_eq!(config.welcome_template.as_deref(), Some("Hi $username"));
        assert_eq!(transport.texts(GROUP), vec![GOT_IT.to_string()]);
    }

    #[tokio::test]
    async fn empty_welcome_gets_usage_hint() {
        let (state, transport) = registered_state().await;
        dispatch(&state, &in_group(OWNER), Command::Welcome("   ".into())).await;

        assert!(state.registry.get_config(GROUP).unwrap().welcome_template.is_none());
        let sent = transport.sent_to(GROUP);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, WELCOME_USAGE);
        assert_eq!(sent[0].formatting, Formatting::Html);
    }

    #[tokio::test]
    async fn stranger_is_told_off_when_locked() {
        let (state, transport) = registered_state().await;
        dispatch(&state, &in_group(STRANGER), Command::Goodbye("Bye".into())).await;

        let config = state.registry.get_config(GROUP).unwrap();
        assert_eq!(config.goodbye_template, GoodbyeTemplate::Unset);
        assert_eq!(transport.texts(GROUP), vec![NOT_OWNER.to_string()]);
    }

    #[tokio::test]
    async fn quiet_denial_sends_nothing() {
        let (state, transport) = registered_state().await;
        dispatch(&state, &in_group(OWNER), Command::Quiet).await;
        dispatch(&state, &in_group(STRANGER), Command::Welcome("x".into())).await;

        assert!(state.registry.get_config(GROUP).unwrap().quiet);
        assert_eq!(transport.texts(GROUP), vec![GOT_IT.to_string()]);
    }

    #[tokio::test]
    async fn unlocked_chat_accepts_anyone_except_for_policy() {
        let (state, transport) = registered_state().await;
        dispatch(&state, &in_group(OWNER), Command::Unlock).await;
        dispatch(&state, &in_group(STRANGER), Command::DisableGoodbye).await;
        dispatch(&state, &in_group(STRANGER), Command::Lock).await;

        let config = state.registry.get_config(GROUP).unwrap();
        assert_eq!(config.goodbye_template, GoodbyeTemplate::Disabled);
        assert!(!config.locked);
        assert_eq!(
            transport.texts(GROUP),
            vec![GOT_IT.to_string(), GOT_IT.to_string(), NOT_OWNER.to_string()]
        );
    }

    #[tokio::test]
    async fn owner_policy_commands_work_while_unlocked() {
        let (state, _transport) = registered_state().await;
        dispatch(&state, &in_group(OWNER), Command::Unlock).await;
        dispatch(&state, &in_group(OWNER), Command::Quiet).await;
        dispatch(&state, &in_group(OWNER), Command::Unquiet).await;
        dispatch(&state, &in_group(OWNER), Command::Lock).await;

        let config = state.registry.get_config(GROUP).unwrap();
        assert!(config.locked);
        assert!(!config.quiet);
    }

    #[tokio::test]
    async fn goodbye_after_disable_re_enables() {
        let (state, _transport) = registered_state().await;
        dispatch(&state, &in_group(OWNER), Command::DisableGoodbye).await;
        dispatch(&state, &in_group(OWNER), Command::Goodbye("See you".into())).await;

        assert_eq!(
            state.registry.get_config(GROUP).unwrap().goodbye_template,
            GoodbyeTemplate::Custom("See you".into())
        );
    }
}
