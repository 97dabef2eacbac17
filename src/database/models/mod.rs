//! Database model exports.

pub mod chat_config;
pub mod kv_entry;

pub use chat_config::{ChatConfig, GoodbyeTemplate};
pub use kv_entry::KvEntry;
