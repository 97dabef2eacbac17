//! Transport-independent membership notifications.

use teloxide::types::{Chat, ChatMemberUpdated};

use super::transition::{StatusSnapshot, Transition, classify};

/// Kind of chat an update came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn of(chat: &Chat) -> Self {
        if chat.is_private() {
            Self::Private
        } else if chat.is_channel() {
            Self::Channel
        } else if chat.is_supergroup() {
            Self::Supergroup
        } else {
            Self::Group
        }
    }

    /// Groups and supergroups are treated the same everywhere.
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group | Self::Supergroup)
    }
}

/// The chat a command or event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRef {
    pub id: i64,
    pub kind: ChatKind,
    pub title: String,
}

impl ChatRef {
    pub fn new(id: i64, kind: ChatKind, title: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
        }
    }

    pub fn from_chat(chat: &Chat) -> Self {
        Self::new(chat.id.0, ChatKind::of(chat), chat.title().unwrap_or_default())
    }
}

/// One membership change, built once per incoming notification.
#[derive(Debug, Clone)]
pub struct MembershipEvent {
    pub chat: ChatRef,
    pub actor_user_id: u64,
    pub actor_name: String,
    pub subject_user_id: u64,
    pub subject_name: String,
    pub old: StatusSnapshot,
    pub new: StatusSnapshot,
}

impl MembershipEvent {
    pub fn from_update(update: &ChatMemberUpdated) -> Self {
        let subject = &update.new_chat_member.user;
        Self {
            chat: ChatRef::from_chat(&update.chat),
            actor_user_id: update.from.id.0,
            actor_name: update.from.full_name(),
            subject_user_id: subject.id.0,
            subject_name: subject.first_name.clone(),
            old: StatusSnapshot::from_kind(&update.old_chat_member.kind),
            new: StatusSnapshot::from_kind(&update.new_chat_member.kind),
        }
    }

    pub fn transition(&self) -> Option<Transition> {
        classify(self.old, self.new)
    }
}
