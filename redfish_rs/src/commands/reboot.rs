use clap::Parser;
use serde_json::json;

use crate::cli::command::help_texts::REBOOT_HELP;
use crate::cli::command::{Command, CommandRegistry};
use crate::cli::parser::parse_command_args;
use crate::context::AppContext;
use crate::error::{Condition, ReturnCode};
use crate::session::CredentialArgs;

use super::{authenticate, first_instance};

const RESET_TYPES: &[&str] = &[
    "On",
    "ForceOff",
    "GracefulShutdown",
    "GracefulRestart",
    "ForceRestart",
    "Nmi",
    "PushPowerButton",
];

#[derive(Debug, Parser)]
#[command(name = "reboot", long_about = REBOOT_HELP)]
pub struct RebootArgs {
    /// Reset type
    #[arg(value_name = "TYPE", default_value = "ForceRestart")]
    pub reset_type: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

pub struct RebootCommand;

impl Command for RebootCommand {
    fn name(&self) -> &'static str {
        "reboot"
    }

    fn summary(&self) -> &'static str {
        "Reboots the server that is currently logged in."
    }

    fn usage(&self) -> String {
        super::render_usage::<RebootArgs>()
    }

    fn run(
        &self,
        ctx: &mut AppContext,
        _registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition> {
        let Some(args) = parse_command_args::<RebootArgs>(self.name(), args)? else {
            return Ok(ReturnCode::Success);
        };
        let reset_type = canonical_reset_type(&args.reset_type)?;
        authenticate(ctx, &args.credentials)?;

        let system = first_instance(ctx, "ComputerSystem.")?;
        let target = system.action_target("#ComputerSystem.Reset").ok_or_else(|| {
            Condition::NoContentsFoundForOperation(
                "The system does not expose a reset action.".to_string(),
            )
        })?;
        ctx.session
            .client_mut()?
            .post(&target, &json!({ "ResetType": reset_type }))?;

        println!(
            "After the server is rebooted the session will be terminated.\n\
             Please wait for the server to boot completely before logging in again."
        );
        ctx.session.logout();
        Ok(ReturnCode::Success)
    }
}

fn canonical_reset_type(input: &str) -> Result<&'static str, Condition> {
    RESET_TYPES
        .iter()
        .copied()
        .find(|t| t.eq_ignore_ascii_case(input))
        .ok_or_else(|| {
            Condition::InvalidCommandLine(format!(
                "Invalid reboot option '{}'. Valid options are: {}",
                input,
                RESET_TYPES.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockState;
    use crate::commands::builtin_registry;
    use crate::commands::fixtures::{RESET_TARGET, args, log_in, server};
    use crate::context::testing::mock_context;

    #[test]
    fn test_reset_type_is_case_insensitive() {
        assert_eq!(canonical_reset_type("gracefulrestart").unwrap(), "GracefulRestart");
        assert!(matches!(
            canonical_reset_type("explode"),
            Err(Condition::InvalidCommandLine(_))
        ));
    }

    #[test]
    fn test_reboot_posts_reset_and_logs_out() {
        let state = MockState::shared();
        server(&state, "iLO 5 v2.10");
        let (mut ctx, _) = mock_context(&state);
        log_in(&mut ctx);
        RebootCommand
            .run(&mut ctx, &builtin_registry(), &args(&["forceoff"]))
            .unwrap();
        assert!(!ctx.session.is_logged_in());
        let state = state.borrow();
        assert_eq!(state.posts, vec![(RESET_TARGET.to_string(), json!({"ResetType": "ForceOff"}))]);
        assert_eq!(state.logouts, 1);
    }
}
