//! Per-chat configuration.

use serde::{Deserialize, Serialize};

/// Goodbye message setting.
///
/// `Unset` falls back to the built-in farewell, `Disabled` sends nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "text", rename_all = "lowercase")]
pub enum GoodbyeTemplate {
    #[default]
    Unset,
    Disabled,
    Custom(String),
}

/// Configuration of a group the bot was added to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Telegram chat ID
    pub chat_id: i64,

    /// Welcome template, `None` means the default one
    #[serde(default)]
    pub welcome_template: Option<String>,

    /// Goodbye template
    #[serde(default)]
    pub goodbye_template: GoodbyeTemplate,

    /// User who added the bot
    pub owner_user_id: u64,

    /// Only the owner may change settings
    #[serde(default)]
    pub locked: bool,

    /// Suppress denial and help messages
    #[serde(default)]
    pub quiet: bool,

    /// Group title at registration time
    #[serde(default)]
    pub title: String,

    /// Registration time (unix seconds)
    #[serde(default)]
    pub registered_at: i64,
}

impl ChatConfig {
    /// Config for a freshly joined group: locked to the inviter, not quiet.
    pub fn new(chat_id: i64, owner_user_id: u64, title: impl Into<String>) -> Self {
        Self {
            chat_id,
            welcome_template: None,
            goodbye_template: GoodbyeTemplate::Unset,
            owner_user_id,
            locked: true,
            quiet: false,
            title: title.into(),
            registered_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether the user is the registered owner.
    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owner_user_id == user_id
    }
}
