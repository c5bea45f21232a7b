//! # redfish
//!
//! Command-line utility and interactive shell for managing servers through
//! their Redfish management controller.
//!
//! Every command is a [`Command`](cli::Command) registered at startup in a
//! [`CommandRegistry`](cli::CommandRegistry). Commands receive one explicit
//! [`AppContext`](context::AppContext) holding the configuration, the global
//! options and the live [`SessionContext`](session::SessionContext), and fail
//! with a [`Condition`](error::Condition) that the dispatcher turns into an
//! exit code.
//!
//! ## CLI Usage
//!
//! ```bash
//! redfish                                  # interactive shell
//! redfish login 10.0.0.100 -u admin -p pw  # open and cache a session
//! redfish get BootMode --selector Bios.    # read properties
//! redfish biosdefaults --reboot ForceRestart
//! redfish onebuttonerase --confirm
//! ```

// ============================================================================
// Front end
// ============================================================================

/// Argument parsing, dispatch, the interactive shell and the entry point.
pub mod cli;

/// Built-in commands.
pub mod commands;

/// Tab completion state machine used by the shell.
pub mod completion;

// ============================================================================
// Server access
// ============================================================================

/// Redfish client abstraction and the HTTP transport.
pub mod client;

/// Credential encoding for cached sessions and `--enc`.
pub mod codec;

/// Live session, session cache and credential resolution.
pub mod session;

/// Polling monitor for long-running operations.
pub mod monitor;

// ============================================================================
// Ambient
// ============================================================================

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod ui;

pub use error::{Condition, ReturnCode};
