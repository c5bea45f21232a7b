//! Dispatcher between parsed input and the command registry.
//!
//! The dispatcher runs one command line at a time against the shared
//! [`AppContext`]. It is also the single place where a [`Condition`] is
//! turned into a user-facing message and an exit code.

mod refresh;

use std::ops::ControlFlow;

use tracing::{debug, warn};

use crate::cli::command::CommandRegistry;
use crate::commands::help::overview;
use crate::completion::{CompletionOptions, CompletionUpdates};
use crate::context::AppContext;
use crate::error::{Condition, ReturnCode};
use crate::ui;

pub struct Dispatcher {
    registry: CommandRegistry,
    ctx: AppContext,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, ctx: AppContext) -> Self {
        Self { registry, ctx }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut AppContext {
        &mut self.ctx
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Resolves `nargv[0]` and runs it with the remaining tokens.
    pub fn run_command(&mut self, nargv: &[String]) -> Result<ReturnCode, Condition> {
        if !self.ctx.global.nologo && !self.ctx.interactive {
            ui::banner();
        }
        let Some((name, args)) = nargv.split_first() else {
            return Ok(ReturnCode::Success);
        };
        let command = self.registry.resolve(name)?;
        debug!(command = command.name(), args = args.len(), "dispatching");
        command.run(&mut self.ctx, &self.registry, args)
    }

    /// Reports `condition` to the user. `Break` means the caller must stop
    /// and exit with the code.
    pub fn handle_condition(&mut self, condition: Condition) -> ControlFlow<ReturnCode, ReturnCode> {
        let code = condition.return_code();
        match &condition {
            Condition::Exit(code) => return ControlFlow::Break(*code),
            Condition::ConfigurationFile(message) => {
                ui::error(message);
                return ControlFlow::Break(code);
            }
            Condition::CommandNotFound { suggestion, .. } => {
                ui::error(&condition.to_string());
                if let Some(candidate) = suggestion {
                    ui::suggestion(candidate);
                }
                println!("{}", overview(&self.registry));
            }
            Condition::CommandDisabled { name, hint } => {
                ui::error(&format!("The '{}' command is not available: {}", name, hint));
                println!("{}", overview(&self.registry));
            }
            // clap already printed the parse error
            Condition::InvalidCommandLineOptions(kind) => debug!(%kind, "option parsing failed"),
            Condition::SessionExpired => {
                ui::error(&condition.to_string());
                self.ctx.session.logout();
            }
            Condition::General(err) => {
                if self.ctx.global.debug {
                    ui::error(&format!("ERROR: {:?}", err));
                } else {
                    ui::error(&format!("ERROR: {}", err));
                }
            }
            Condition::InvalidCommandLine(_)
            | Condition::CredentialsRequired
            | Condition::InvalidFileFormatting(_)
            | Condition::InvalidFileInput(_)
            | Condition::NoContentsFoundForOperation(_)
            | Condition::NoChangesFoundOrMade(_)
            | Condition::NoDifferencesFound(_)
            | Condition::NoValidInfo(_)
            | Condition::SameSettings(_)
            | Condition::MultipleServerConfig(_)
            | Condition::InvalidMscFileInput(_)
            | Condition::FirmwareUpdate(_)
            | Condition::BootOrderMissingEntries(_)
            | Condition::NicMissingOrConfiguration(_)
            | Condition::NoCurrentSession(_)
            | Condition::FailureDuringCommit(_)
            | Condition::IncompatibleVersion(_)
            | Condition::Encryption(_)
            | Condition::UserNotAdmin
            | Condition::UndefinedClient
            | Condition::InstanceNotFound(_)
            | Condition::NothingSelected
            | Condition::InvalidSelection(_)
            | Condition::RetriesExhausted(_)
            | Condition::InvalidCredentials(_)
            | Condition::ServerUnreachable(_)
            | Condition::ResponseError(_)
            | Condition::MalformedResponse(_) => ui::error(&condition.to_string()),
        }
        ControlFlow::Continue(code)
    }

    /// Completion lists before any command has run: `help` completes
    /// command names, every other command starts empty.
    pub fn initial_completion_options(&self) -> CompletionOptions {
        let names = self.registry.command_names();
        let mut options = CompletionOptions::default();
        for name in &names {
            let list = if *name == "help" {
                names.iter().map(|n| n.to_string()).collect()
            } else {
                Vec::new()
            };
            options.lists.insert(name.to_string(), list);
        }
        options
    }

    /// Fresh completion lists after `nargv` ran.
    pub fn completion_updates(&mut self, nargv: &[String]) -> CompletionUpdates {
        let selected = nargv
            .first()
            .is_some_and(|name| name.eq_ignore_ascii_case("select"));
        refresh::completion_updates(&mut self.ctx, selected)
    }

    /// Keeps or ends the session once the work for `tokens` is done.
    pub fn finish_session(&mut self, tokens: &[String]) {
        let logging_out = tokens
            .iter()
            .any(|t| t.eq_ignore_ascii_case("logout") || t == "--logout");
        if self.ctx.cache_enabled() && !logging_out {
            if let Err(err) = self.ctx.session.save() {
                warn!(error = %err, "unable to save session cache");
            }
        } else {
            self.ctx.session.logout();
        }
    }
}

/// `-h`, `--help` or a `help` word anywhere on the line.
pub fn is_help_request(tokens: &[String]) -> bool {
    tokens
        .iter()
        .any(|t| t.starts_with("-h") || t.starts_with("--h") || t.eq_ignore_ascii_case("help"))
}

/// The line opens a new session: a `login` command or an explicit `--url`.
pub fn requests_fresh_login(tokens: &[String]) -> bool {
    tokens
        .first()
        .is_some_and(|t| t.eq_ignore_ascii_case("login"))
        || tokens.iter().any(|t| t.starts_with("--url"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockState;
    use crate::commands::builtin_registry;
    use crate::commands::fixtures::{args, log_in, server};
    use crate::context::testing::mock_context;

    fn dispatcher(state: &crate::client::mock::SharedState) -> Dispatcher {
        let (ctx, _) = mock_context(state);
        Dispatcher::new(builtin_registry(), ctx)
    }

    #[test]
    fn test_unknown_command_continues_with_code_13() {
        let state = MockState::shared();
        let mut d = dispatcher(&state);
        let err = d.run_command(&args(&["lgoin"])).unwrap_err();
        assert!(matches!(
            &err,
            Condition::CommandNotFound {
                suggestion: Some("login"),
                ..
            }
        ));
        assert_eq!(d.handle_condition(err), ControlFlow::Continue(ReturnCode::CommandNotFound));
    }

    #[test]
    fn test_exit_request_breaks_untranslated() {
        let state = MockState::shared();
        let mut d = dispatcher(&state);
        let err = d.run_command(&args(&["quit"])).unwrap_err();
        assert_eq!(d.handle_condition(err), ControlFlow::Break(ReturnCode::Success));
    }

    #[test]
    fn test_configuration_error_breaks() {
        let state = MockState::shared();
        let mut d = dispatcher(&state);
        let flow = d.handle_condition(Condition::ConfigurationFile("bad".into()));
        assert_eq!(flow, ControlFlow::Break(ReturnCode::ConfigurationFileError));
    }

    #[test]
    fn test_session_expired_logs_out() {
        let state = MockState::shared();
        let mut d = dispatcher(&state);
        log_in(d.context_mut());
        let flow = d.handle_condition(Condition::SessionExpired);
        assert_eq!(flow, ControlFlow::Continue(ReturnCode::SessionExpired));
        assert!(!d.context().session.is_logged_in());
    }

    #[test]
    fn test_general_error_maps_to_255() {
        let state = MockState::shared();
        let mut d = dispatcher(&state);
        let flow = d.handle_condition(Condition::General(anyhow::anyhow!("boom")));
        assert_eq!(flow, ControlFlow::Continue(ReturnCode::GeneralError));
    }

    #[test]
    fn test_initial_options_complete_help_with_command_names() {
        let state = MockState::shared();
        let d = dispatcher(&state);
        let options = d.initial_completion_options();
        assert!(options.lists["help"].contains(&"onebuttonerase".to_string()));
        assert!(options.lists["get"].is_empty());
    }

    #[test]
    fn test_completion_updates_after_select() {
        let state = MockState::shared();
        server(&state, "iLO 5 v2.10");
        let mut d = dispatcher(&state);
        log_in(d.context_mut());
        d.run_command(&args(&["select", "Bios."])).unwrap();
        let updates = d.completion_updates(&args(&["select", "Bios."]));
        assert!(updates.lists["select"].contains(&"Bios.v1_0_0".to_string()));
        assert_eq!(
            updates.lists["set"],
            vec!["AdminName", "BootMode", "RestoreManufacturingDefaults"]
        );
        assert_eq!(updates.val, Some(Vec::new()));
    }

    #[test]
    fn test_finish_session_without_cache_logs_out() {
        let state = MockState::shared();
        let mut d = dispatcher(&state);
        log_in(d.context_mut());
        d.finish_session(&args(&["get"]));
        assert!(!d.context().session.is_logged_in());
        assert_eq!(state.borrow().logouts, 1);
    }

    #[test]
    fn test_line_classification() {
        assert!(is_help_request(&args(&["login", "-h"])));
        assert!(is_help_request(&args(&["help", "login"])));
        assert!(!is_help_request(&args(&["login", "host"])));
        assert!(requests_fresh_login(&args(&["LOGIN", "host"])));
        assert!(requests_fresh_login(&args(&["get", "--url=host"])));
        assert!(!requests_fresh_login(&args(&["get", "BootMode"])));
    }
}
