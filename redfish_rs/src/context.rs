//! Application context handed to every command.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use crate::cli::command::GlobalOptions;
use crate::config::RedfishConfig;
use crate::monitor::{ConsoleTerminal, DEFAULT_POLL_INTERVAL, TerminalControl};
use crate::session::SessionContext;

/// Source of answers to interactive confirmation prompts.
pub trait Prompter {
    fn ask(&mut self, message: &str) -> io::Result<String>;
}

/// Reads answers from stdin.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn ask(&mut self, message: &str) -> io::Result<String> {
        let mut stdout = io::stdout();
        stdout.write_all(message.as_bytes())?;
        stdout.flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(answer.trim().to_string())
    }
}

pub struct AppContext {
    pub global: GlobalOptions,
    pub config: RedfishConfig,
    pub session: SessionContext,
    /// Running inside the shell rather than as a one-shot invocation.
    pub interactive: bool,
    /// Effective user is root.
    pub admin: bool,
    pub terminal: Box<dyn TerminalControl>,
    pub prompter: Box<dyn Prompter>,
    pub poll_interval: Duration,
}

impl AppContext {
    pub fn new(global: GlobalOptions, config: RedfishConfig, session: SessionContext) -> Self {
        Self {
            global,
            config,
            session,
            interactive: false,
            admin: is_admin(),
            terminal: Box::new(ConsoleTerminal::stdout()),
            prompter: Box::new(StdinPrompter),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Staged work is kept between invocations only with caching enabled.
    pub fn cache_enabled(&self) -> bool {
        !self.global.nocache && self.config.cache
    }
}

#[cfg(unix)]
fn is_admin() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_admin() -> bool {
    true
}
