//! /start and /help.

use crate::bot::dispatcher::AppState;
use crate::transport::Formatting;

use super::{CommandError, Invocation, reply};

pub const HELP_TEXT: &str = "Welcomes everyone that enters a group chat that this bot is a \
part of. By default, only the person who invited the bot into the group is able to change \
settings.\nCommands:\n\n\
/welcome - Set welcome message\n\
/goodbye - Set goodbye message\n\
/disable_goodbye - Disable the goodbye message\n\
/lock - Only the person who invited the bot can change messages\n\
/unlock - Everyone can change messages\n\
/quiet - Disable \"Sorry, only the person who...\" &amp; help messages\n\
/unquiet - Enable \"Sorry, only the person who...\" &amp; help messages\n\n\
You can use $username and $title as placeholders when setting messages. \
<a href=\"https://core.telegram.org/bots/api#formatting-options\">HTML formatting</a> \
is also supported.\n\n\
/show_chats - Displays information about the chats active with the bot\n\
/report - Send private report message to the authorized user list\n\
/receive_reports - Add yourself to the authorized user list for report notifications\n\
/stop_reports - Remove yourself from the authorized user list for report notifications";

/// Quiet chats only show help to their owner.
pub async fn help(state: &AppState, inv: &Invocation) -> Result<(), CommandError> {
    if !state.gate.may_show_help(&inv.chat, inv.user_id) {
        return Ok(());
    }
    reply(state, inv, HELP_TEXT, Formatting::Html).await
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::{Command, dispatch};
    use super::*;

    #[tokio::test]
    async fn help_works_in_private() {
        let (state, transport) = state();
        dispatch(&state, &in_private(7), Command::Start).await;

        let sent = transport.sent_to(7);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, HELP_TEXT);
        assert_eq!(sent[0].formatting, Formatting::Html);
    }

    #[tokio::test]
    async fn quiet_chat_hides_help_from_others() {
        let (state, transport) = registered_state().await;
        dispatch(&state, &in_group(OWNER), Command::Quiet).await;
        dispatch(&state, &in_group(7), Command::Help).await;
        assert_eq!(transport.sent_to(GROUP).len(), 1);

        dispatch(&state, &in_group(OWNER), Command::Help).await;
        assert_eq!(transport.texts(GROUP).last().map(String::as_str), Some(HELP_TEXT));
    }
}
