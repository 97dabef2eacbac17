//! Command handlers.
//!
//! Every command is a variant of [`Command`]; [`dispatch`] routes it with a
//! single exhaustive match. Handlers share one signature and return
//! [`CommandError`], which is turned into a reply (or a log line) at the
//! end of `dispatch`. Nothing propagates further.

pub mod chats;
pub mod help;
pub mod reports;
pub mod settings;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::bot::dispatcher::AppState;
use crate::events::ChatRef;
use crate::permissions::{Authorization, DenyReason};
use crate::registry::RegistryError;
use crate::transport::{DeliveryError, Formatting};

/// All bot commands.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "Show help")]
    Start,

    #[command(description = "Show help")]
    Help,

    #[command(description = "Set welcome message")]
    Welcome(String),

    #[command(description = "Set goodbye message")]
    Goodbye(String),

    #[command(description = "Disable the goodbye message")]
    DisableGoodbye,

    #[command(description = "Only the person who invited the bot can change messages")]
    Lock,

    #[command(description = "Everyone can change messages")]
    Unlock,

    #[command(description = "Disable denial and help messages")]
    Quiet,

    #[command(description = "Enable denial and help messages")]
    Unquiet,

    #[command(description = "Show the chats the bot is active in")]
    ShowChats,

    #[command(description = "Receive report notifications in private")]
    ReceiveReports,

    #[command(description = "Stop receiving report notifications")]
    StopReports,

    #[command(description = "Report to the recipients of this group")]
    Report,
}

impl Command {
    /// Commands that change the authorization policy itself always require
    /// the owner, whatever the current lock state.
    pub fn lock_override(&self) -> Option<bool> {
        match self {
            Self::Lock | Self::Quiet | Self::Unquiet => Some(true),
            _ => None,
        }
    }
}

/// Who sent a command, and where.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub chat: ChatRef,
    pub user_id: u64,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("chat {0} is not registered")]
    ChatNotRegistered(i64),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("missing argument")]
    Validation { hint: &'static str },

    #[error("denied ({reason:?}, silent: {silent})")]
    Denied { silent: bool, reason: DenyReason },

    #[error("storage error: {0}")]
    Storage(anyhow::Error),
}

impl From<RegistryError> for CommandError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::ChatNotRegistered(chat_id) => Self::ChatNotRegistered(chat_id),
            RegistryError::Storage(e) => Self::Storage(e),
        }
    }
}

pub const GOT_IT: &str = "Got it!";
const GROUP_ONLY: &str = "Please add me to a group first!";
const NOT_OWNER: &str = "Sorry, only the person who invited me can do that.";
const NOT_REGISTERED: &str =
    "I don't have settings for this group yet. Remove me and add me again to set it up.";

/// Turn an authorization decision into a `Result`.
pub fn ensure_allowed(
    state: &AppState,
    inv: &Invocation,
    command: &Command,
) -> Result<(), CommandError> {
    match state.gate.authorize(&inv.chat, inv.user_id, command) {
        Authorization::Allowed => Ok(()),
        Authorization::Denied { silent, reason } => Err(CommandError::Denied { silent, reason }),
    }
}

/// Send an ephemeral reply to the invoking chat.
pub async fn reply(
    state: &AppState,
    inv: &Invocation,
    text: &str,
    formatting: Formatting,
) -> Result<(), CommandError> {
    state
        .notifier
        .send_ephemeral(inv.chat.id, text, formatting)
        .await?;
    Ok(())
}

/// Route a command to its handler and settle any error it returns.
pub async fn dispatch(state: &AppState, inv: &Invocation, command: Command) {
    debug!(
        "Command {:?} from {} in chat {}",
        command, inv.user_id, inv.chat.id
    );

    let result = match &command {
        Command::Start | Command::Help => help::help(state, inv).await,
        Command::Welcome(text) => settings::set_welcome(state, inv, &command, text).await,
        Command::Goodbye(text) => settings::set_goodbye(state, inv, &command, text).await,
        Command::DisableGoodbye => settings::disable_goodbye(state, inv, &command).await,
        Command::Lock => settings::set_locked(state, inv, &command, true).await,
        Command::Unlock => settings::set_locked(state, inv, &command, false).await,
        Command::Quiet => settings::set_quiet(state, inv, &command, true).await,
        Command::Unquiet => settings::set_quiet(state, inv, &command, false).await,
        Command::ShowChats => chats::show_chats(state, inv).await,
        Command::ReceiveReports => reports::receive_reports(state, inv).await,
        Command::StopReports => reports::stop_reports(state, inv).await,
        Command::Report => reports::report(state, inv).await,
    };

    if let Err(err) = result {
        settle(state, inv, err).await;
    }
}

async fn settle(state: &AppState, inv: &Invocation, err: CommandError) {
    let answer = match &err {
        CommandError::Validation { hint } => Some((*hint, Formatting::Html)),
        CommandError::Denied { silent: true, .. } => {
            debug!("Silently denied user {} in chat {}", inv.user_id, inv.chat.id);
            None
        }
        CommandError::Denied {
            reason: DenyReason::GroupOnly,
            ..
        } => Some((GROUP_ONLY, Formatting::Plain)),
        CommandError::Denied {
            reason: DenyReason::NotOwner,
            ..
        } => Some((NOT_OWNER, Formatting::Plain)),
        CommandError::ChatNotRegistered(chat_id) => {
            warn!("Command for unregistered chat {}", chat_id);
            Some((NOT_REGISTERED, Formatting::Plain))
        }
        CommandError::Delivery(e) => {
            state.delivery_failed(inv.chat.id, e).await;
            None
        }
        CommandError::Storage(e) => {
            error!("Storage error in chat {}: {:?}", inv.chat.id, e);
            None
        }
    };

    if let Some((text, formatting)) = answer {
        state.respond(inv.chat.id, text, formatting).await;
    }
}

/// Build the teloxide command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    teloxide::filter_command::<Command, _>().endpoint(handle_command)
}

async fn handle_command(msg: Message, cmd: Command, state: AppState) -> anyhow::Result<()> {
    let user_id = match msg.from.as_ref() {
        Some(user) => user.id.0,
        None => return Ok(()),
    };

    let inv = Invocation {
        chat: ChatRef::from_chat(&msg.chat),
        user_id,
    };
    dispatch(&state, &inv, cmd).await;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::bot::dispatcher::AppState;
    use crate::database::MemoryStore;
    use crate::events::{
        ChatKind, ChatRef, MembershipEvent, MembershipStatus, StatusSnapshot,
    };
    use crate::notify::Notifier;
    use crate::registry::ChatRegistry;
    use crate::transport::testing::RecordingTransport;

    use super::Invocation;

    pub const OWNER: u64 = 42;
    pub const GROUP: i64 = -100;

    pub fn group() -> ChatRef {
        ChatRef::new(GROUP, ChatKind::Supergroup, "Devs")
    }

    pub fn in_group(user_id: u64) -> Invocation {
        Invocation {
            chat: group(),
            user_id,
        }
    }

    pub fn in_private(user_id: u64) -> Invocation {
        Invocation {
            chat: ChatRef::new(user_id as i64, ChatKind::Private, ""),
            user_id,
        }
    }

    pub fn state() -> (AppState, Arc<RecordingTransport>) {
        let transport = Arc::new(RecordingTransport::new());
        let registry = Arc::new(ChatRegistry::new(Arc::new(MemoryStore::new())));
        let (notifier, _worker) = Notifier::spawn(transport.clone(), Duration::from_secs(30));
        let state = AppState::new(registry, notifier, transport.clone(), "doorman_bot".into());
        (state, transport)
    }

    /// State with the bot already added to `group()` by `OWNER`.
    pub async fn registered_state() -> (AppState, Arc<RecordingTransport>) {
        let (state, transport) = state();
        let event = MembershipEvent {
            chat: group(),
            actor_user_id: OWNER,
            actor_name: "Owner".into(),
            subject_user_id: 1,
            subject_name: "doorman".into(),
            old: StatusSnapshot::new(MembershipStatus::Left, false),
            new: StatusSnapshot::new(MembershipStatus::Member, false),
        };
        state
            .registry
            .record_transition(&event, event.transition().unwrap())
            .await
            .unwrap();
        (state, transport)
    }
}
