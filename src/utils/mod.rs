//! Utility functions.

pub mod template;

pub use template::{Placeholders, html_escape, render};
