//! Global option handling.
//!
//! Global options are the option-like tokens before the command name. Flags
//! that take a value consume the next token even when it does not start
//! with `-`.

use clap::Parser;
use clap::error::ErrorKind;

use crate::cli::command::GlobalOptions;
use crate::cli::command::help_texts::SHORT_NAME;
use crate::error::Condition;

/// Global flags whose value is a separate token.
const VALUE_FLAGS: &[&str] = &["-c", "--config", "--cache-dir", "--logdir", "--proxy"];

/// Splits raw arguments into `(global options, command + its arguments)`.
pub fn split_global_args(args: &[String]) -> (Vec<String>, Vec<String>) {
    let mut global = Vec::new();
    let mut expects_value = false;
    for (idx, arg) in args.iter().enumerate() {
        if !expects_value && !arg.starts_with('-') {
            return (global, args[idx..].to_vec());
        }
        expects_value = VALUE_FLAGS.contains(&arg.as_str());
        global.push(arg.clone());
    }
    (global, Vec::new())
}

/// Parses the global tokens. `Ok(None)` means help was printed.
pub fn parse_global_options(tokens: &[String]) -> Result<Option<GlobalOptions>, Condition> {
    let argv = std::iter::once(SHORT_NAME.to_string()).chain(tokens.iter().cloned());
    match GlobalOptions::try_parse_from(argv) {
        Ok(options) => Ok(Some(options)),
        Err(err) if err.kind() == ErrorKind::DisplayHelp => {
            let _ = err.print();
            Ok(None)
        }
        Err(err) => {
            let _ = err.print();
            Err(Condition::InvalidCommandLineOptions(err.kind().to_string()))
        }
    }
}
