//! Console output helpers (status messages, spinner, banner).
//!
//! Everything user-facing that is not command payload goes through here so
//! the glyphs and colours stay consistent.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::command::help_texts::{COPYRIGHT, LONG_NAME, VERSION};

/// Spinner for blocking network calls
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    /// Create a new spinner with a message
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self { bar }
    }

    /// Clear the spinner without a message
    pub fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// Print a success message (green checkmark)
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an info message (blue)
pub fn info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), message);
}

/// Print a warning message (yellow)
pub fn warning(message: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), message);
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

pub fn banner_text() -> String {
    format!("{} version {}\n{}", LONG_NAME, VERSION, COPYRIGHT)
}

pub fn banner() {
    println!("{}\n", banner_text());
}

pub fn user_not_admin() {
    warning(
        "You are not logged in as an administrator on this machine. \
         Some commands may fail or return incomplete results.",
    );
}

/// `"Did you mean: x?"` line used after an unknown command.
pub fn suggestion(candidate: &str) {
    eprintln!("{} Did you mean: {}?", style("→").cyan(), style(candidate).bold());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_names_tool_and_version() {
        let text = banner_text();
        assert!(text.starts_with("Redfish Utility version "));
        assert!(text.contains(VERSION));
    }
}
