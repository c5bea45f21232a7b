use clap::{CommandFactory, Parser};

use crate::cli::command::help_texts::HELP_FOOTER;
use crate::cli::command::{Command, CommandRegistry, GlobalOptions, format_summary};
use crate::cli::parser::parse_command_args;
use crate::context::AppContext;
use crate::error::{Condition, ReturnCode};

/// Displays command help.
#[derive(Debug, Parser)]
#[command(name = "help")]
pub struct HelpArgs {
    /// Command to describe
    pub command: Option<String>,
}

pub struct HelpCommand;

impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn summary(&self) -> &'static str {
        "Displays command line syntax and help menus for individual commands. \
         Example: help login"
    }

    fn usage(&self) -> String {
        super::render_usage::<HelpArgs>()
    }

    fn run(
        &self,
        _ctx: &mut AppContext,
        registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition> {
        let Some(args) = parse_command_args::<HelpArgs>(self.name(), args)? else {
            return Ok(ReturnCode::Success);
        };
        match args.command {
            Some(name) => println!("{}", registry.resolve(&name)?.usage()),
            None => println!("{}", overview(registry)),
        }
        Ok(ReturnCode::Success)
    }
}

/// Global usage plus every command grouped by section.
pub fn overview(registry: &CommandRegistry) -> String {
    let mut out = GlobalOptions::command().render_help().to_string();
    for section in registry.sections() {
        out.push_str(&format!("\n{}\n\n", section.name));
        for command in &section.commands {
            out.push_str(&format_summary(command.name(), command.summary()));
            out.push('\n');
        }
    }
    out.push('\n');
    out.push_str(HELP_FOOTER);
    out
}
