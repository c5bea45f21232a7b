//! Interactive shell.

use std::cell::RefCell;
use std::ops::ControlFlow;

use rustyline::completion::Completer;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};
use tracing::debug;

use crate::cli::command::help_texts::{PROMPT, SHORT_NAME};
use crate::cli::dispatch::{Dispatcher, is_help_request, requests_fresh_login};
use crate::cli::parser::split_line;
use crate::completion::CompletionEngine;
use crate::error::ReturnCode;
use crate::ui;

/// Characters that end a completion word.
const WORD_DELIMITERS: &str = " \t\n\"\\'`@$><=;|&{(";

pub struct ShellHelper {
    engine: RefCell<CompletionEngine>,
}

impl ShellHelper {
    pub fn new(engine: CompletionEngine) -> Self {
        Self {
            engine: RefCell::new(engine),
        }
    }

    pub fn engine_mut(&mut self) -> &mut CompletionEngine {
        self.engine.get_mut()
    }
}

impl Completer for ShellHelper {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let begin = word_start(line, pos);
        let candidates = self.engine.borrow_mut().candidates(line, begin, pos);
        Ok((begin, candidates))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

fn word_start(line: &str, pos: usize) -> usize {
    line.get(..pos)
        .and_then(|head| head.rfind(|c| WORD_DELIMITERS.contains(c)))
        .map(|idx| idx + 1)
        .unwrap_or(0)
}

/// Runs the shell until an exit request or end of input.
pub fn run_shell(dispatcher: &mut Dispatcher) -> ReturnCode {
    dispatcher.context_mut().interactive = true;
    if !dispatcher.context().global.nologo {
        ui::banner();
    }
    if !dispatcher.context().admin {
        ui::user_not_admin();
    }

    let config = Config::builder()
        .completion_type(CompletionType::List)
        .auto_add_history(false)
        .build();
    let mut editor = match Editor::<ShellHelper, DefaultHistory>::with_config(config) {
        Ok(editor) => editor,
        Err(err) => {
            ui::error(&format!("Unable to start the interactive shell: {}", err));
            return ReturnCode::GeneralError;
        }
    };
    let engine = CompletionEngine::new(dispatcher.initial_completion_options());
    editor.set_helper(Some(ShellHelper::new(engine)));

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                debug!("input closed, leaving shell");
                dispatcher.finish_session(&[]);
                return ReturnCode::Success;
            }
            Err(err) => {
                ui::error(&format!("Unable to read input: {}", err));
                dispatcher.finish_session(&[]);
                return ReturnCode::GeneralError;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        let outcome = split_line(line).and_then(|tokens| {
            if requests_fresh_login(&tokens) && !is_help_request(&tokens) {
                dispatcher.context_mut().session.logout();
            }
            let code = dispatcher.run_command(&tokens)?;
            let updates = dispatcher.completion_updates(&tokens);
            if let Some(helper) = editor.helper_mut() {
                helper.engine_mut().updates_tab_completion_lists(updates);
            }
            Ok(code)
        });

        let code = match outcome {
            Ok(code) => code,
            Err(condition) => match dispatcher.handle_condition(condition) {
                ControlFlow::Break(code) => return code,
                ControlFlow::Continue(code) => code,
            },
        };
        if dispatcher.context().global.verbose {
            println!("{} return code: {}", SHORT_NAME, code.code());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_start_uses_delimiters() {
        assert_eq!(word_start("set Boot", 8), 4);
        assert_eq!(word_start("set BootMode=Ue", 15), 13);
        assert_eq!(word_start("get", 3), 0);
        assert_eq!(word_start("", 0), 0);
    }
}
