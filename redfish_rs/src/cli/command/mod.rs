//! Command contract and registry.
//!
//! - `global`: GlobalOptions parsed before the command name
//! - `help_texts`: Static usage text and product strings
//!
//! Every command is a [`Command`] trait object registered once at startup
//! into a [`CommandRegistry`] section. Registration order drives the help
//! listing; lookups scan sections in the same order.

mod global;
pub mod help_texts;

pub use global::GlobalOptions;

use strsim::levenshtein;

use crate::context::AppContext;
use crate::error::{Condition, ReturnCode};

/// A named operation runnable from the command line or the shell.
pub trait Command {
    fn name(&self) -> &'static str;

    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// One-line description for the help listing.
    fn summary(&self) -> &'static str;

    /// Full usage text for `help <command>`.
    fn usage(&self) -> String;

    fn is_enabled(&self) -> bool {
        true
    }

    /// Shown instead of running when the command is disabled.
    fn enablement_hint(&self) -> &'static str {
        ""
    }

    /// Parses `args` (everything after the command name) and executes.
    /// `registry` lets composite commands invoke other commands.
    fn run(
        &self,
        ctx: &mut AppContext,
        registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition>;

    fn is_match(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        !wanted.is_empty()
            && (self.name().to_lowercase() == wanted
                || self.aliases().iter().any(|a| a.to_lowercase() == wanted))
    }
}

pub struct CommandSection {
    pub name: String,
    pub commands: Vec<Box<dyn Command>>,
}

#[derive(Default)]
pub struct CommandRegistry {
    sections: Vec<CommandSection>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `command` to `section`, creating the section on first use.
    pub fn register(&mut self, command: Box<dyn Command>, section: &str) {
        match self.sections.iter_mut().find(|s| s.name == section) {
            Some(existing) => existing.commands.push(command),
            None => self.sections.push(CommandSection {
                name: section.to_string(),
                commands: vec![command],
            }),
        }
    }

    /// First command whose name or alias matches, case-insensitively.
    pub fn resolve(&self, name: &str) -> Result<&dyn Command, Condition> {
        let found = self
            .sections
            .iter()
            .flat_map(|s| s.commands.iter())
            .find(|c| c.is_match(name));
        match found {
            Some(command) if command.is_enabled() => Ok(command.as_ref()),
            Some(command) => Err(Condition::CommandDisabled {
                name: command.name().to_string(),
                hint: command.enablement_hint().to_string(),
            }),
            None => Err(Condition::CommandNotFound {
                name: name.to_string(),
                suggestion: self.suggest(name),
            }),
        }
    }

    pub fn sections(&self) -> &[CommandSection] {
        &self.sections
    }

    /// Names of every registered command, in registration order.
    pub fn command_names(&self) -> Vec<&'static str> {
        self.sections
            .iter()
            .flat_map(|s| s.commands.iter().map(|c| c.name()))
            .collect()
    }

    /// Suggest a similar command using Levenshtein distance.
    /// Returns Some(suggestion) if a close match is found (distance <= 2).
    pub fn suggest(&self, input: &str) -> Option<&'static str> {
        let input_lower = input.to_lowercase();
        let mut best_match: Option<(&'static str, usize)> = None;

        for section in &self.sections {
            for command in &section.commands {
                let names = std::iter::once(command.name()).chain(command.aliases().iter().copied());
                for name in names {
                    let distance = levenshtein(&input_lower, name);
                    if distance <= 2 && best_match.is_none_or(|(_, best)| distance < best) {
                        best_match = Some((command.name(), distance));
                    }
                }
            }
        }

        best_match.map(|(name, _)| name)
    }
}

/// `"  name                         - summary"`, summary wrapped at 45
/// columns with continuation lines aligned under the first.
pub fn format_summary(name: &str, summary: &str) -> String {
    const WRAP: usize = 45;
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in summary.split(' ') {
        if !current.is_empty() && current.len() + 1 + word.len() > WRAP {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    lines.push(current);
    let separator = format!("\n{}", " ".repeat(34));
    format!("  {:<28} - {}", name, lines.join(&separator))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub {
        name: &'static str,
        aliases: &'static [&'static str],
        enabled: bool,
    }

    impl Command for Stub {
        fn name(&self) -> &'static str {
            self.name
        }
        fn aliases(&self) -> &'static [&'static str] {
            self.aliases
        }
        fn summary(&self) -> &'static str {
            "stub"
        }
        fn usage(&self) -> String {
            String::new()
        }
        fn is_enabled(&self) -> bool {
            self.enabled
        }
        fn enablement_hint(&self) -> &'static str {
            "Requires a newer controller."
        }
        fn run(
            &self,
            _ctx: &mut AppContext,
            _registry: &CommandRegistry,
            _args: &[String],
        ) -> Result<ReturnCode, Condition> {
            Ok(ReturnCode::Success)
        }
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(
            Box::new(Stub {
                name: "exit",
                aliases: &["quit"],
                enabled: true,
            }),
            "COMMANDS",
        );
        registry.register(
            Box::new(Stub {
                name: "biosdefaults",
                aliases: &[],
                enabled: true,
            }),
            "BIOS COMMANDS",
        );
        registry.register(
            Box::new(Stub {
                name: "legacy",
                aliases: &[],
                enabled: false,
            }),
            "COMMANDS",
        );
        registry
    }

    #[test]
    fn test_resolve_is_case_insensitive_over_aliases() {
        let registry = registry();
        assert_eq!(registry.resolve("QUIT").unwrap().name(), "exit");
        assert_eq!(registry.resolve("BiosDefaults").unwrap().name(), "biosdefaults");
    }

    #[test]
    fn test_resolve_unknown_is_not_found_with_suggestion() {
        let registry = registry();
        match registry.resolve("biosdefault") {
            Err(Condition::CommandNotFound { name, suggestion }) => {
                assert_eq!(name, "biosdefault");
                assert_eq!(suggestion, Some("biosdefaults"));
            }
            _ => panic!("expected CommandNotFound"),
        }
        assert!(matches!(
            registry.resolve(""),
            Err(Condition::CommandNotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_disabled_carries_hint() {
        let registry = registry();
        match registry.resolve("legacy") {
            Err(Condition::CommandDisabled { hint, .. }) => {
                assert_eq!(hint, "Requires a newer controller.");
            }
            _ => panic!("expected CommandDisabled"),
        }
    }

    #[test]
    fn test_sections_keep_registration_order() {
        let registry = registry();
        let names: Vec<_> = registry.sections().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["COMMANDS", "BIOS COMMANDS"]);
        assert_eq!(registry.command_names(), vec!["exit", "legacy", "biosdefaults"]);
    }

    #[test]
    fn test_format_summary_wraps_long_text() {
        let text = format_summary(
            "onebuttonerase",
            "Performs One Button Erase on a system. Erases all BIOS settings, iLO settings and user data.",
        );
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("  onebuttonerase               - Performs"));
        assert!(lines.len() > 1);
        assert!(lines[1].starts_with(&" ".repeat(34)));
        assert!(lines[1..].iter().all(|l| l.trim_start().len() <= 45));
    }
}
