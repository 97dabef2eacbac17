//! Membership transition classifier.
//!
//! Turns a before/after membership status pair into a `Transition`.
//! Pure functions only, no I/O.

use teloxide::types::ChatMemberKind;

/// Membership status as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MembershipStatus {
    /// No prior status known. Telegram always sends one.
    #[cfg_attr(not(test), allow(dead_code))]
    None,
    Member,
    Restricted,
    Administrator,
    Owner,
    Left,
    Banned,
}

/// A status together with its `is_member` flag.
///
/// The flag only means something for `Restricted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: MembershipStatus,
    pub is_member_flag: bool,
}

impl StatusSnapshot {
    pub const fn new(status: MembershipStatus, is_member_flag: bool) -> Self {
        Self {
            status,
            is_member_flag,
        }
    }

    /// Build a snapshot from a teloxide chat member kind.
    pub fn from_kind(kind: &ChatMemberKind) -> Self {
        match kind {
            ChatMemberKind::Owner(_) => Self::new(MembershipStatus::Owner, false),
            ChatMemberKind::Administrator(_) => Self::new(MembershipStatus::Administrator, false),
            ChatMemberKind::Member { .. } => Self::new(MembershipStatus::Member, false),
            ChatMemberKind::Restricted(restricted) => {
                Self::new(MembershipStatus::Restricted, restricted.is_member)
            }
            ChatMemberKind::Left { .. } => Self::new(MembershipStatus::Left, false),
            ChatMemberKind::Banned(_) => Self::new(MembershipStatus::Banned, false),
        }
    }
}

/// Derived membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub was_member: bool,
    pub is_member: bool,
}

impl Transition {
    /// Not a member before, a member now.
    pub fn is_join(&self) -> bool {
        !self.was_member && self.is_member
    }

    /// A member before, not a member now.
    pub fn is_leave(&self) -> bool {
        self.was_member && !self.is_member
    }
}

/// Whether a status/flag pair counts as membership.
pub fn is_member(status: MembershipStatus, flag: bool) -> bool {
    matches!(
        status,
        MembershipStatus::Member | MembershipStatus::Owner | MembershipStatus::Administrator
    ) || (status == MembershipStatus::Restricted && flag)
}

/// Classify a status change.
///
/// Returns `None` when the status itself did not change. Both sides are
/// evaluated independently, so `Member -> Administrator` yields a transition
/// that is neither a join nor a leave.
pub fn classify(old: StatusSnapshot, new: StatusSnapshot) -> Option<Transition> {
    if old.status == new.status {
        return None;
    }

    Some(Transition {
        was_member: is_member(old.status, old.is_member_flag),
        is_member: is_member(new.status, new.is_member_flag),
    })
}
