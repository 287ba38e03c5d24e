//! CLI module for qbank.
//!
//! Defines command-line argument parsing and confirmation prompts.

pub mod args;
pub mod prompt;

pub use args::{Cli, Command, GlobalArgs};
pub use prompt::{confirmer, TerminalPrompt};
