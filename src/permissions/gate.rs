//! Authorization gate for configuration commands.

use std::sync::Arc;

use tracing::debug;

use crate::events::ChatRef;
use crate::plugins::Command;
use crate::registry::ChatRegistry;

/// Why a request was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// Settings only exist for groups.
    GroupOnly,
    /// The chat is locked to the person who added the bot.
    NotOwner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    /// `silent` denials produce no message in the chat.
    Denied { silent: bool, reason: DenyReason },
}

/// Decides whether a user may change a chat's settings.
#[derive(Clone)]
pub struct Gate {
    registry: Arc<ChatRegistry>,
}

impl Gate {
    pub fn new(registry: Arc<ChatRegistry>) -> Self {
        Self { registry }
    }

    /// Authorize a command, applying its lock override if it has one.
    pub fn authorize(&self, chat: &ChatRef, requester: u64, command: &Command) -> Authorization {
        self.authorize_with(chat, requester, command.lock_override())
    }

    /// Authorize with an explicit lock override.
    ///
    /// A group without a registered config has no owner, so a locked request
    /// there is always denied.
    pub fn authorize_with(
        &self,
        chat: &ChatRef,
        requester: u64,
        override_lock: Option<bool>,
    ) -> Authorization {
        if !chat.kind.is_group() {
            return Authorization::Denied {
                silent: false,
                reason: DenyReason::GroupOnly,
            };
        }

        let config = self.registry.get_config(chat.id);
        let locked = override_lock.unwrap_or_else(|| config.as_ref().is_some_and(|c| c.locked));
        let is_owner = config.as_ref().is_some_and(|c| c.is_owner(requester));

        if locked && !is_owner {
            let silent = config.as_ref().is_some_and(|c| c.quiet);
            debug!(
                "Denied user {} in chat {} (silent: {})",
                requester, chat.id, silent
            );
            return Authorization::Denied {
                silent,
                reason: DenyReason::NotOwner,
            };
        }

        Authorization::Allowed
    }

    /// Help is shown unless the chat is quiet and the requester isn't the owner.
    pub fn may_show_help(&self, chat: &ChatRef, requester: u64) -> bool {
        match self.registry.get_config(chat.id) {
            Some(config) => !config.quiet || config.is_owner(requester),
            None => true,
        }
    }
}
