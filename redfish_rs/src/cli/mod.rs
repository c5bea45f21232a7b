//! Command-line front end.
//!
//! # Flow
//!
//! ```text
//! argv ──► split_global_args ──► GlobalOptions
//!              │
//!              ▼
//!          command + args ──► Dispatcher ──► CommandRegistry::resolve ──► Command::run
//!              │                   │
//!        (empty: shell)      handle_condition ──► exit code
//! ```
//!
//! # Module Structure
//!
//! - [`command`] - command contract, registry and global options
//! - [`parser`] - global option splitting and per-command parsing
//! - [`dispatch`] - running commands and translating conditions
//! - [`repl`] - interactive shell with tab completion
//! - [`entrypoint`] - process entry shared by the binary and tests

pub mod command;
pub mod dispatch;
pub mod entrypoint;
pub mod parser;
pub mod repl;

pub use command::{Command, CommandRegistry, GlobalOptions};
pub use dispatch::Dispatcher;
