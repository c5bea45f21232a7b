//! Session commands: login, logout, exit.

use clap::Parser;

use crate::cli::command::help_texts::LOGIN_HELP;
use crate::cli::command::{Command, CommandRegistry};
use crate::cli::parser::parse_command_args;
use crate::client::LoginRequest;
use crate::context::AppContext;
use crate::error::{Condition, ReturnCode};
use crate::session::CredentialArgs;
use crate::ui;

use super::properties::select_type;

/// Connects to a server and establishes a secure session.
#[derive(Debug, Parser)]
#[command(name = "login", long_about = LOGIN_HELP)]
pub struct LoginArgs {
    /// URL of the management controller
    #[arg(value_name = "URL")]
    pub target: Option<String>,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Select this type right after logging in
    #[arg(long, value_name = "TYPE")]
    pub selector: Option<String>,
}

pub struct LoginCommand;

impl Command for LoginCommand {
    fn name(&self) -> &'static str {
        "login"
    }

    fn summary(&self) -> &'static str {
        "Connects to a server, establishes a secure session, and discovers data from the server."
    }

    fn usage(&self) -> String {
        super::render_usage::<LoginArgs>()
    }

    fn run(
        &self,
        ctx: &mut AppContext,
        _registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition> {
        let Some(args) = parse_command_args::<LoginArgs>(self.name(), args)? else {
            return Ok(ReturnCode::Success);
        };
        let url = open_session(ctx, &args)?;
        ui::success(&format!("Logged in to {}", url));
        Ok(ReturnCode::Success)
    }
}

/// Runs the login operation with resolver-built tokens.
pub(crate) fn login_with_tokens(ctx: &mut AppContext, tokens: &[String]) -> Result<(), Condition> {
    match parse_command_args::<LoginArgs>("login", tokens)? {
        Some(args) => open_session(ctx, &args).map(|_| ()),
        None => Ok(()),
    }
}

fn open_session(ctx: &mut AppContext, args: &LoginArgs) -> Result<String, Condition> {
    let creds = &args.credentials;
    let mut username = creds.user.clone().filter(|u| !u.is_empty());
    let mut password = creds.password.clone().filter(|p| !p.is_empty());
    if creds.encode {
        let codec = ctx.session.codec();
        username = username.map(|u| codec.decode(&u)).transpose()?;
        password = password.map(|p| codec.decode(&p)).transpose()?;
    }

    let url = args
        .target
        .clone()
        .or_else(|| creds.url.clone())
        .filter(|u| !u.is_empty())
        .or_else(|| ctx.config.url().map(String::from))
        .ok_or_else(|| {
            Condition::InvalidCommandLine(
                "Please provide a URL to login to, either as an argument or in the configuration file."
                    .to_string(),
            )
        })?;
    let username = username.or_else(|| ctx.config.username().map(String::from));
    let password = password.or_else(|| ctx.config.password().map(String::from));

    let spinner = ui::Spinner::new(&format!("Logging in to {}", url));
    let result = ctx.session.login(LoginRequest {
        url: url.clone(),
        username,
        password,
        proxy: ctx.global.proxy.clone(),
    });
    spinner.finish_clear();
    result?;

    if let Some(selector) = &args.selector {
        select_type(ctx, selector)?;
    }
    Ok(url)
}

/// Ends the current session.
#[derive(Debug, Parser)]
#[command(name = "logout")]
pub struct LogoutArgs {}

pub struct LogoutCommand;

impl Command for LogoutCommand {
    fn name(&self) -> &'static str {
        "logout"
    }

    fn summary(&self) -> &'static str {
        "Ends the current session and disconnects from the server."
    }

    fn usage(&self) -> String {
        super::render_usage::<LogoutArgs>()
    }

    fn run(
        &self,
        ctx: &mut AppContext,
        _registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition> {
        if parse_command_args::<LogoutArgs>(self.name(), args)?.is_none() {
            return Ok(ReturnCode::Success);
        }
        ctx.session.logout();
        println!("Logging session out.");
        Ok(ReturnCode::Success)
    }
}

/// Leaves the interactive shell.
#[derive(Debug, Parser)]
#[command(name = "exit")]
pub struct ExitArgs {}

pub struct ExitCommand;

impl Command for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["quit"]
    }

    fn summary(&self) -> &'static str {
        "Exits from the interactive shell."
    }

    fn usage(&self) -> String {
        super::render_usage::<ExitArgs>()
    }

    fn run(
        &self,
        ctx: &mut AppContext,
        _registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition> {
        if parse_command_args::<ExitArgs>(self.name(), args)?.is_none() {
            return Ok(ReturnCode::Success);
        }
        if ctx.cache_enabled() {
            ctx.session.save()?;
        } else {
            ctx.session.logout();
        }
        println!("Bye for now");
        Err(Condition::Exit(ReturnCode::Success))
    }
}
