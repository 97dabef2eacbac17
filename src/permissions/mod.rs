//! Permission system for configuration commands.
//!
//! A chat is owned by whoever added the bot. While a chat is locked only
//! the owner may change its settings; quiet chats swallow denials.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let gate = Gate::new(registry.clone());
//!
//! match gate.authorize(&chat, user_id, &command) {
//!     Authorization::Allowed => { /* ... */ }
//!     Authorization::Denied { silent, .. } => { /* ... */ }
//! }
//! ```

mod gate;

pub use gate::{Authorization, DenyReason, Gate};
