//! Poll-and-render monitor for long-running controller operations.
//!
//! The monitor owns no knowledge of a particular operation. A
//! [`ProgressLayout`] turns the raw status resource into an ordered
//! [`ProgressSnapshot`], a [`StatusSource`] fetches that resource, and the
//! monitor redraws the snapshot in place until every status field reaches a
//! terminal state.

use std::io;
use std::thread;
use std::time::Duration;

use console::Term;
use serde_json::Value;
use tracing::debug;

use crate::error::Condition;

const TERMINAL_STATUSES: &[&str] = &["completedwithsuccess", "completedwitherrors", "failed"];
const ACTIVE_STATUSES: &[&str] = &["initiated", "inprogress"];
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
const REFRESH_EVERY: usize = 8;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Cursor control used for in-place redraws.
pub trait TerminalControl {
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Move the cursor up `count` lines, erasing each.
    fn erase_lines(&mut self, count: usize) -> io::Result<()>;
}

/// Stdout terminal. Redraws degrade to plain appends when stdout is not a
/// TTY so piped output stays free of escape sequences.
pub struct ConsoleTerminal {
    term: Term,
    redraw: bool,
}

impl ConsoleTerminal {
    pub fn stdout() -> Self {
        let term = Term::stdout();
        let redraw = term.is_term();
        Self { term, redraw }
    }
}

impl TerminalControl for ConsoleTerminal {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.term.write_line(line)
    }

    fn erase_lines(&mut self, count: usize) -> io::Result<()> {
        if self.redraw && count > 0 {
            self.term.clear_last_lines(count)?;
        }
        Ok(())
    }
}

/// Where the monitor gets its status resource from.
pub trait StatusSource {
    fn fetch(&mut self) -> Result<Value, Condition>;

    /// Called once when monitoring stops.
    fn finish(&mut self) -> Result<(), Condition>;
}

/// Turns a raw status resource into display fields.
pub trait ProgressLayout {
    fn title(&self) -> &str;

    /// Fails when `raw` lacks the fields the layout needs.
    fn snapshot(&self, raw: &Value) -> Result<ProgressSnapshot, Condition>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressField {
    pub key: String,
    pub label: String,
    pub value: String,
    /// Timer fields are shown but never gate termination.
    pub timer: bool,
}

impl ProgressField {
    pub fn is_active(&self) -> bool {
        ACTIVE_STATUSES.contains(&self.value.to_lowercase().as_str())
    }

    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATUSES.contains(&self.value.to_lowercase().as_str())
    }
}

/// Ordered field list derived from one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    fields: Vec<ProgressField>,
}

impl ProgressSnapshot {
    pub fn push(&mut self, key: &str, label: &str, value: &Value, timer: bool) {
        self.fields.push(ProgressField {
            key: key.to_string(),
            label: label.to_string(),
            value: display_value(value),
            timer,
        });
    }

    pub fn fields(&self) -> &[ProgressField] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&ProgressField> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// True once there is at least one status field and all of them are
    /// terminal.
    pub fn is_finished(&self) -> bool {
        let mut statuses = self.fields.iter().filter(|f| !f.timer).peekable();
        statuses.peek().is_some() && statuses.all(ProgressField::is_terminal)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

pub struct ProgressMonitor<'a> {
    terminal: &'a mut dyn TerminalControl,
    interval: Duration,
}

impl<'a> ProgressMonitor<'a> {
    pub fn new(terminal: &'a mut dyn TerminalControl, interval: Duration) -> Self {
        Self { terminal, interval }
    }

    /// Polls until the operation finishes and returns the number of rendered
    /// iterations. The source is finished whether or not polling succeeded.
    pub fn watch(
        &mut self,
        layout: &dyn ProgressLayout,
        source: &mut dyn StatusSource,
    ) -> Result<usize, Condition> {
        let outcome = self.poll(layout, source);
        let finished = source.finish();
        let iterations = outcome?;
        finished?;
        Ok(iterations)
    }

    fn poll(
        &mut self,
        layout: &dyn ProgressLayout,
        source: &mut dyn StatusSource,
    ) -> Result<usize, Condition> {
        self.terminal.write_line(&format!("\t{}", layout.title()))?;
        self.terminal
            .write_line(&"=".repeat(layout.title().len() + 16))?;

        let mut raw = source.fetch()?;
        let mut counter = 0;
        let mut printed = 0;
        let mut iterations = 0;
        loop {
            if (counter + 1) % REFRESH_EVERY == 0 {
                raw = source.fetch()?;
            }
            let snapshot = layout.snapshot(&raw)?;
            self.terminal.erase_lines(printed)?;
            printed = self.render(&snapshot, SPINNER[counter % SPINNER.len()])?;
            iterations += 1;

            if snapshot.is_finished() {
                debug!(iterations, "monitored operation finished");
                return Ok(iterations);
            }
            counter = (counter + 1) % REFRESH_EVERY;
            if !self.interval.is_zero() {
                thread::sleep(self.interval);
            }
        }
    }

    /// Returns the number of lines written.
    fn render(&mut self, snapshot: &ProgressSnapshot, glyph: char) -> io::Result<usize> {
        for field in snapshot.fields() {
            let mut line = format!("{} {}", field.label, field.value);
            if field.is_active() {
                line.push('\t');
                line.push(glyph);
            }
            self.terminal.write_line(&line)?;
        }
        self.terminal.write_line("")?;
        Ok(snapshot.fields().len() + 1)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    use super::*;

    #[derive(Debug, Default)]
    pub struct TerminalLog {
        pub lines: Vec<String>,
        pub erased: Vec<usize>,
    }

    /// Terminal that records output instead of drawing it.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingTerminal {
        pub log: Rc<RefCell<TerminalLog>>,
    }

    impl TerminalControl for RecordingTerminal {
        fn write_line(&mut self, line: &str) -> io::Result<()> {
            self.log.borrow_mut().lines.push(line.to_string());
            Ok(())
        }

        fn erase_lines(&mut self, count: usize) -> io::Result<()> {
            self.log.borrow_mut().erased.push(count);
            Ok(())
        }
    }

    /// Serves queued bodies; the last one sticks.
    #[derive(Debug, Default)]
    pub struct ScriptedSource {
        pub bodies: VecDeque<Value>,
        pub fetches: usize,
        pub finished: bool,
    }

    impl StatusSource for ScriptedSource {
        fn fetch(&mut self) -> Result<Value, Condition> {
            self.fetches += 1;
            let body = if self.bodies.len() > 1 {
                self.bodies.pop_front()
            } else {
                self.bodies.front().cloned()
            };
            Ok(body.unwrap_or(Value::Null))
        }

        fn finish(&mut self) -> Result<(), Condition> {
            self.finished = true;
            Ok(())
        }
    }
}
