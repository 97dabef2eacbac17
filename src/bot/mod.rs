//! Bot module - dispatcher setup and update listeners.

pub mod dispatcher;
mod runtime;
mod webhook;

pub use dispatcher::{AppState, build_dispatcher};
pub use runtime::run;
