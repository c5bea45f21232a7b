//! Property commands: select, get, set, commit.
//!
//! `set` only stages changes in the session; `commit` PATCHes every staged
//! body to its settings resource.

use clap::Parser;
use serde_json::{Map, Value};
use tracing::debug;

use crate::cli::command::help_texts::{COMMIT_HELP, GET_HELP, SELECT_HELP, SET_HELP};
use crate::cli::command::{Command, CommandRegistry};
use crate::cli::parser::parse_command_args;
use crate::client::ClientError;
use crate::context::AppContext;
use crate::error::{Condition, ReturnCode};
use crate::session::CredentialArgs;

use super::{authenticate, selected_instances};

/// Makes `selector` the current selection if it matches anything.
pub(crate) fn select_type(ctx: &mut AppContext, selector: &str) -> Result<(), Condition> {
    let instances = ctx.session.client_mut()?.select(selector)?;
    if instances.is_empty() {
        return Err(Condition::InstanceNotFound(selector.to_string()));
    }
    debug!(selector, count = instances.len(), "selected instances");
    ctx.session.set_selector(Some(selector.to_string()));
    Ok(())
}

// ============================================================================
// select
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "select", long_about = SELECT_HELP)]
pub struct SelectArgs {
    /// Type to select, e.g. Bios.
    #[arg(value_name = "TYPE")]
    pub selector: Option<String>,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

pub struct SelectCommand;

impl Command for SelectCommand {
    fn name(&self) -> &'static str {
        "select"
    }

    fn summary(&self) -> &'static str {
        "Selects the object type to be used."
    }

    fn usage(&self) -> String {
        super::render_usage::<SelectArgs>()
    }

    fn run(
        &self,
        ctx: &mut AppContext,
        _registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition> {
        let Some(args) = parse_command_args::<SelectArgs>(self.name(), args)? else {
            return Ok(ReturnCode::Success);
        };
        authenticate(ctx, &args.credentials)?;
        match args.selector {
            Some(selector) => select_type(ctx, &selector)?,
            None => {
                let current = ctx.session.selector().ok_or(Condition::NothingSelected)?;
                println!("Current selection: {}", current);
            }
        }
        Ok(ReturnCode::Success)
    }
}

// ============================================================================
// get
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "get", long_about = GET_HELP)]
pub struct GetArgs {
    /// Properties to show (all when omitted)
    #[arg(value_name = "PROPERTY")]
    pub properties: Vec<String>,

    /// Type to read instead of the current selection
    #[arg(long, value_name = "TYPE")]
    pub selector: Option<String>,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

pub struct GetCommand;

impl Command for GetCommand {
    fn name(&self) -> &'static str {
        "get"
    }

    fn summary(&self) -> &'static str {
        "Displays the current value(s) of a property(ies) within a selected type."
    }

    fn usage(&self) -> String {
        super::render_usage::<GetArgs>()
    }

    fn run(
        &self,
        ctx: &mut AppContext,
        _registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition> {
        let Some(args) = parse_command_args::<GetArgs>(self.name(), args)? else {
            return Ok(ReturnCode::Success);
        };
        authenticate(ctx, &args.credentials)?;
        let instances = selected_instances(ctx, args.selector.as_deref())?;

        let mut printed = false;
        for instance in &instances {
            let mut properties = instance.properties();
            if ctx.global.redfish_only {
                properties.remove("Oem");
            }
            if !args.properties.is_empty() {
                properties.retain(|key, _| {
                    args.properties
                        .iter()
                        .any(|wanted| wanted.eq_ignore_ascii_case(key))
                });
            }
            if properties.is_empty() {
                continue;
            }
            let rendered = serde_json::to_string_pretty(&Value::Object(properties))
                .map_err(anyhow::Error::from)?;
            println!("{}", rendered);
            printed = true;
        }

        if !printed {
            return Err(Condition::NoContentsFoundForOperation(
                "No get contents found for the selected type.".to_string(),
            ));
        }
        Ok(ReturnCode::Success)
    }
}

// ============================================================================
// set
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "set", long_about = SET_HELP)]
pub struct SetArgs {
    #[arg(value_name = "PROPERTY=VALUE", required = true)]
    pub assignments: Vec<String>,

    /// Type to change instead of the current selection
    #[arg(long, value_name = "TYPE")]
    pub selector: Option<String>,

    /// Commit the change immediately
    #[arg(long)]
    pub commit: bool,

    /// Reset the server after committing
    #[arg(long, value_name = "TYPE", requires = "commit")]
    pub reboot: Option<String>,

    /// BIOS password, if one is set
    #[arg(long, value_name = "PASSWORD")]
    pub biospassword: Option<String>,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

pub struct SetCommand;

impl Command for SetCommand {
    fn name(&self) -> &'static str {
        "set"
    }

    fn summary(&self) -> &'static str {
        "Changes the value of a property within the currently selected type."
    }

    fn usage(&self) -> String {
        super::render_usage::<SetArgs>()
    }

    fn run(
        &self,
        ctx: &mut AppContext,
        registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition> {
        let Some(args) = parse_command_args::<SetArgs>(self.name(), args)? else {
            return Ok(ReturnCode::Success);
        };
        let assignments = parse_assignments(&args.assignments)?;
        authenticate(ctx, &args.credentials)?;
        let instances = selected_instances(ctx, args.selector.as_deref())?;

        let mut found = false;
        let mut staged = false;
        for instance in &instances {
            let properties = instance.properties();
            let mut changes = Map::new();
            for (name, raw) in &assignments {
                let Some((key, current)) = properties
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                else {
                    continue;
                };
                found = true;
                let value = coerce_value(raw, current);
                if &value != current {
                    changes.insert(key.clone(), value);
                }
            }
            if changes.is_empty() {
                continue;
            }
            let body = if instance.is_bios() {
                let mut wrapped = Map::new();
                wrapped.insert("Attributes".to_string(), Value::Object(changes));
                wrapped
            } else {
                changes
            };
            println!(
                "Added the following patch:\n{}",
                serde_json::to_string_pretty(&body).map_err(anyhow::Error::from)?
            );
            ctx.session.stage(&instance.settings_path(), body);
            staged = true;
        }

        if !found {
            return Err(Condition::NoContentsFoundForOperation(format!(
                "No entries found for {} in the selected type.",
                assignments
                    .iter()
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        if !staged {
            return Err(Condition::SameSettings(
                "Entered settings are the same as the current settings.".to_string(),
            ));
        }
        if args.commit {
            return commit_pending(
                ctx,
                registry,
                args.biospassword.as_deref(),
                args.reboot.as_deref(),
            );
        }
        Ok(ReturnCode::Success)
    }
}

fn parse_assignments(items: &[String]) -> Result<Vec<(String, String)>, Condition> {
    items
        .iter()
        .map(|item| match item.split_once('=') {
            Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
            _ => Err(Condition::InvalidCommandLine(format!(
                "Invalid format for '{}'. Use PROPERTY=VALUE.",
                item
            ))),
        })
        .collect()
}

/// Converts the typed text to the JSON type of the current value.
fn coerce_value(raw: &str, current: &Value) -> Value {
    match current {
        Value::Bool(_) if raw.eq_ignore_ascii_case("true") => Value::Bool(true),
        Value::Bool(_) if raw.eq_ignore_ascii_case("false") => Value::Bool(false),
        Value::Number(_) => raw
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| raw.parse::<f64>().map(Value::from))
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        _ if raw == "None" => Value::Null,
        _ => Value::String(raw.to_string()),
    }
}

// ============================================================================
// commit
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "commit", long_about = COMMIT_HELP)]
pub struct CommitArgs {
    /// Reset the server after committing
    #[arg(long, value_name = "TYPE")]
    pub reboot: Option<String>,

    /// BIOS password, if one is set
    #[arg(long, value_name = "PASSWORD")]
    pub biospassword: Option<String>,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

pub struct CommitCommand;

impl Command for CommitCommand {
    fn name(&self) -> &'static str {
        "commit"
    }

    fn summary(&self) -> &'static str {
        "Applies all the changes made during the current session."
    }

    fn usage(&self) -> String {
        super::render_usage::<CommitArgs>()
    }

    fn run(
        &self,
        ctx: &mut AppContext,
        registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition> {
        let Some(args) = parse_command_args::<CommitArgs>(self.name(), args)? else {
            return Ok(ReturnCode::Success);
        };
        authenticate(ctx, &args.credentials)?;
        commit_pending(
            ctx,
            registry,
            args.biospassword.as_deref(),
            args.reboot.as_deref(),
        )
    }
}

/// PATCHes every staged body. Staged changes are kept if any PATCH fails.
pub(crate) fn commit_pending(
    ctx: &mut AppContext,
    registry: &CommandRegistry,
    bios_password: Option<&str>,
    reboot: Option<&str>,
) -> Result<ReturnCode, Condition> {
    let pending = ctx.session.pending().clone();
    if pending.is_empty() {
        return Err(Condition::NoChangesFoundOrMade(
            "No changes found or made during commit operation.".to_string(),
        ));
    }

    println!("Committing changes...");
    let client = ctx.session.client_mut()?;
    for (path, body) in pending {
        client
            .patch(&path, &Value::Object(body), bios_password)
            .map_err(|err| match err {
                ClientError::Response { .. } => Condition::FailureDuringCommit(format!(
                    "Failed to commit changes to {}: {}",
                    path, err
                )),
                other => other.into(),
            })?;
    }
    ctx.session.take_pending();
    println!("One or more properties were changed and will not take effect until system is reset.");

    if let Some(reset_type) = reboot {
        return registry
            .resolve("reboot")?
            .run(ctx, registry, &[reset_type.to_string()]);
    }
    Ok(ReturnCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::MockState;
    use crate::commands::builtin_registry;
    use crate::commands::fixtures::{BIOS_SETTINGS, RESET_TARGET, args, log_in, server};
    use crate::context::testing::mock_context;
    use serde_json::json;

    #[test]
    fn test_get_without_selection_is_nothing_selected() {
        let state = MockState::shared();
        server(&state, "iLO 5 v2.10");
        let (mut ctx, _) = mock_context(&state);
        log_in(&mut ctx);
        let err = GetCommand
            .run(&mut ctx, &builtin_registry(), &[])
            .unwrap_err();
        assert!(matches!(err, Condition::NothingSelected));
    }

    #[test]
    fn test_get_unknown_property_has_no_contents() {
        let state = MockState::shared();
        server(&state, "iLO 5 v2.10");
        let (mut ctx, _) = mock_context(&state);
        log_in(&mut ctx);
        let err = GetCommand
            .run(
                &mut ctx,
                &builtin_registry(),
                &args(&["NoSuchThing", "--selector", "Bios."]),
            )
            .unwrap_err();
        assert_eq!(err.return_code(), ReturnCode::NoContentsFoundForOperation);
    }

    #[test]
    fn test_set_stages_bios_attributes_on_settings_object() {
        let state = MockState::shared();
        server(&state, "iLO 5 v2.10");
        let (mut ctx, _) = mock_context(&state);
        log_in(&mut ctx);
        ctx.session.set_selector(Some("Bios.".into()));

        SetCommand
            .run(&mut ctx, &builtin_registry(), &args(&["bootmode=LegacyBios"]))
            .unwrap();
        assert_eq!(
            Value::Object(ctx.session.pending()[BIOS_SETTINGS].clone()),
            json!({"Attributes": {"BootMode": "LegacyBios"}})
        );
    }

    #[test]
    fn test_set_same_value_is_same_settings() {
        let state = MockState::shared();
        server(&state, "iLO 5 v2.10");
        let (mut ctx, _) = mock_context(&state);
        log_in(&mut ctx);
        let err = SetCommand
            .run(
                &mut ctx,
                &builtin_registry(),
                &args(&["BootMode=Uefi", "--selector", "Bios."]),
            )
            .unwrap_err();
        assert_eq!(err.return_code(), ReturnCode::SameSettings);
    }

    #[test]
    fn test_set_rejects_missing_equals() {
        let err = parse_assignments(&args(&["BootMode"])).unwrap_err();
        assert!(matches!(err, Condition::InvalidCommandLine(_)));
    }

    #[test]
    fn test_commit_with_nothing_staged() {
        let state = MockState::shared();
        let (mut ctx, _) = mock_context(&state);
        log_in(&mut ctx);
        let err = CommitCommand
            .run(&mut ctx, &builtin_registry(), &[])
            .unwrap_err();
        assert_eq!(err.return_code(), ReturnCode::NoChangesFoundOrMade);
    }

    #[test]
    fn test_set_commit_and_reboot() {
        let state = MockState::shared();
        server(&state, "iLO 5 v2.10");
        let (mut ctx, _) = mock_context(&state);
        log_in(&mut ctx);
        SetCommand
            .run(
                &mut ctx,
                &builtin_registry(),
                &args(&[
                    "AdminName=ops",
                    "--selector=Bios.",
                    "--commit",
                    "--reboot=ForceRestart",
                    "--biospassword",
                    "secret",
                ]),
            )
            .unwrap();

        let state = state.borrow();
        assert_eq!(state.patches.len(), 1);
        assert_eq!(state.patches[0].0, BIOS_SETTINGS);
        assert_eq!(state.patches[0].2.as_deref(), Some("secret"));
        assert_eq!(state.posts[0].0, RESET_TARGET);
        assert_eq!(state.posts[0].1, json!({"ResetType": "ForceRestart"}));
    }

    #[test]
    fn test_coerce_value_follows_current_type() {
        assert_eq!(coerce_value("True", &json!(false)), json!(true));
        assert_eq!(coerce_value("42", &json!(1)), json!(42));
        assert_eq!(coerce_value("None", &json!("x")), Value::Null);
        assert_eq!(coerce_value("Uefi", &json!("Legacy")), json!("Uefi"));
    }
}
