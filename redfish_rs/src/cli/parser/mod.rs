//! Argument parsing for one-shot invocations and shell lines.
//!
//! # Module Structure
//!
//! - [`core`] - Global option split and parsing
//! - [`helpers`] - Shell-style line splitting and per-command clap adapter

mod core;
mod helpers;

pub use self::core::{parse_global_options, split_global_args};
pub use self::helpers::{parse_command_args, split_line};
