//! Browser console
//!
//! A console that answers `clear`, `help` and `echo` itself and hands every
//! other command to a native messaging host through the console relay.

pub mod commands;
pub mod history;
pub mod panel;
pub mod prompt;
pub mod terminal;

pub use panel::{Console, Line, LineStyle, Submission};
