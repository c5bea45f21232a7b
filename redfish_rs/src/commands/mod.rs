//! Built-in commands.
//!
//! Grouped by domain:
//! - [`help`] - command listing and per-command usage
//! - [`session`] - login, logout, exit
//! - [`properties`] - select, get, set, commit
//! - [`reboot`] - system reset
//! - [`bios`] - biosdefaults
//! - [`erase`] - onebuttonerase

pub mod bios;
pub mod erase;
pub mod help;
pub mod properties;
pub mod reboot;
pub mod session;

use clap::CommandFactory;

use crate::cli::command::CommandRegistry;
use crate::client::Resource;
use crate::context::AppContext;
use crate::error::Condition;
use crate::session::{CredentialArgs, LoginPlan, resolve};

pub const COMMANDS_SECTION: &str = "COMMANDS";
pub const BIOS_SECTION: &str = "BIOS COMMANDS";
pub const ILO_SECTION: &str = "ILO COMMANDS";

/// Registry with every built-in command, in help listing order.
pub fn builtin_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(Box::new(help::HelpCommand), COMMANDS_SECTION);
    registry.register(Box::new(session::LoginCommand), COMMANDS_SECTION);
    registry.register(Box::new(session::LogoutCommand), COMMANDS_SECTION);
    registry.register(Box::new(session::ExitCommand), COMMANDS_SECTION);
    registry.register(Box::new(properties::SelectCommand), COMMANDS_SECTION);
    registry.register(Box::new(properties::GetCommand), COMMANDS_SECTION);
    registry.register(Box::new(properties::SetCommand), COMMANDS_SECTION);
    registry.register(Box::new(properties::CommitCommand), COMMANDS_SECTION);
    registry.register(Box::new(reboot::RebootCommand), COMMANDS_SECTION);
    registry.register(Box::new(bios::BiosDefaultsCommand), BIOS_SECTION);
    registry.register(Box::new(erase::OneButtonEraseCommand), ILO_SECTION);
    registry
}

/// Makes sure a usable session exists before a command talks to the
/// server, logging in with the resolved tokens when needed.
pub(crate) fn authenticate(ctx: &mut AppContext, creds: &CredentialArgs) -> Result<(), Condition> {
    match resolve(&mut ctx.session, &ctx.config, creds)? {
        LoginPlan::Reuse => Ok(()),
        LoginPlan::Login(tokens) => session::login_with_tokens(ctx, &tokens),
    }
}

/// Instances of the given type, or of the current selection.
pub(crate) fn selected_instances(
    ctx: &mut AppContext,
    selector: Option<&str>,
) -> Result<Vec<Resource>, Condition> {
    let selector = match selector {
        Some(selector) => selector.to_string(),
        None => ctx
            .session
            .selector()
            .map(String::from)
            .ok_or(Condition::NothingSelected)?,
    };
    let instances = ctx.session.client_mut()?.select(&selector)?;
    if instances.is_empty() {
        return Err(Condition::InstanceNotFound(selector));
    }
    Ok(instances)
}

/// First instance of a type that must exist for the command to proceed.
pub(crate) fn first_instance(ctx: &mut AppContext, selector: &str) -> Result<Resource, Condition> {
    ctx.session
        .client_mut()?
        .select(selector)?
        .into_iter()
        .next()
        .ok_or_else(|| {
            Condition::NoContentsFoundForOperation(format!(
                "Unable to find a {} resource.",
                selector.trim_end_matches('.')
            ))
        })
}

/// Long help rendered from a clap definition.
pub(crate) fn render_usage<T: CommandFactory>() -> String {
    T::command().render_long_help().to_string()
}
