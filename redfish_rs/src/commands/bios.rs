//! `biosdefaults`: restore BIOS settings to factory, user or manufacturing
//! defaults.

use clap::Parser;
use serde_json::{Value, json};
use tracing::debug;

use crate::cli::command::help_texts::BIOSDEFAULTS_HELP;
use crate::cli::command::{Command, CommandRegistry};
use crate::cli::parser::parse_command_args;
use crate::client::Resource;
use crate::context::AppContext;
use crate::error::{Condition, ReturnCode};
use crate::session::CredentialArgs;

use super::{authenticate, first_instance};

#[derive(Debug, Parser)]
#[command(name = "biosdefaults", long_about = BIOSDEFAULTS_HELP)]
pub struct BiosDefaultsArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Select this flag to input a BIOS password. Include this flag if second-level BIOS
    /// authentication is needed for the command to execute.
    #[arg(long, value_name = "BIOSPASSWORD")]
    pub biospassword: Option<String>,

    /// Reboot the server after the defaults are set
    /// (On, ForceOff, GracefulShutdown, GracefulRestart, ForceRestart, Nmi, PushPowerButton)
    #[arg(long, value_name = "REBOOT")]
    pub reboot: Option<String>,

    /// Sets BIOS to user defaults instead of factory defaults
    #[arg(long)]
    pub userdefaults: bool,

    /// Reset all configuration settings to manufacturing defaults, including boot
    /// order and secure boot
    #[arg(long = "manufacturingdefaults")]
    pub manufacturing_defaults: bool,
}

pub struct BiosDefaultsCommand;

impl Command for BiosDefaultsCommand {
    fn name(&self) -> &'static str {
        "biosdefaults"
    }

    fn summary(&self) -> &'static str {
        "Set the currently logged in server to default BIOS settings."
    }

    fn usage(&self) -> String {
        super::render_usage::<BiosDefaultsArgs>()
    }

    fn run(
        &self,
        ctx: &mut AppContext,
        registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition> {
        let Some(args) = parse_command_args::<BiosDefaultsArgs>(self.name(), args)? else {
            return Ok(ReturnCode::Success);
        };
        authenticate(ctx, &args.credentials)?;

        println!("Resetting the currently logged in server's BIOS settings to defaults.");

        let bios = first_instance(ctx, "Bios.")?;
        let reset_type = if args.userdefaults {
            "default.user"
        } else {
            "default"
        };

        let reset_action = if args.manufacturing_defaults {
            None
        } else {
            reset_bios_action(&bios)
        };

        let sent = match reset_action {
            Some((action, target)) => {
                let body = json!({ "Action": action, "ResetType": reset_type });
                debug!(%target, "resetting BIOS through action");
                ctx.session.client_mut()?.post(&target, &body)?;
                true
            }
            None => {
                let base_config = if args.userdefaults {
                    Some("default.user")
                } else if !args.manufacturing_defaults {
                    Some("default")
                } else {
                    None
                };
                match base_config {
                    Some(base_config) => {
                        let path = bios_settings_path(&bios);
                        debug!(%path, base_config, "resetting BIOS through settings");
                        ctx.session.client_mut()?.put(
                            &path,
                            &json!({ "BaseConfig": base_config }),
                            args.biospassword.as_deref(),
                        )?;
                        true
                    }
                    None => false,
                }
            }
        };

        if !sent && args.manufacturing_defaults {
            let mut tokens = vec![
                "RestoreManufacturingDefaults=Yes".to_string(),
                "--selector=Bios.".to_string(),
                "--commit".to_string(),
            ];
            if let Some(reboot) = &args.reboot {
                tokens.push(format!("--reboot={}", reboot));
            }
            if let Some(password) = &args.biospassword {
                tokens.push(format!("--biospassword={}", password));
            }
            return registry.resolve("set")?.run(ctx, registry, &tokens);
        }

        if let Some(reboot) = &args.reboot {
            return registry
                .resolve("reboot")?
                .run(ctx, registry, std::slice::from_ref(reboot));
        }
        Ok(ReturnCode::Success)
    }
}

/// `(action name, target)` of the BIOS reset action, when exposed.
fn reset_bios_action(bios: &Resource) -> Option<(String, String)> {
    let actions = bios.body.get("Actions")?.as_object()?;
    actions.iter().find_map(|(name, action)| {
        if !name.contains("ResetBios") {
            return None;
        }
        let target = action.get("target").and_then(Value::as_str)?;
        Some((name.trim_start_matches('#').to_string(), target.to_string()))
    })
}

fn bios_settings_path(bios: &Resource) -> String {
    let settings = bios.settings_path();
    if settings != bios.path {
        settings
    } else {
        format!("{}/settings/", bios.path.trim_end_matches('/'))
    }
}
