//! `onebuttonerase`: secure erase of system ROM, controller settings and user
//! data, with live progress.

use clap::Parser;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::cli::command::help_texts::ONEBUTTONERASE_HELP;
use crate::cli::command::{Command, CommandRegistry};
use crate::cli::parser::parse_command_args;
use crate::client::find_action_target;
use crate::context::AppContext;
use crate::error::{Condition, ReturnCode};
use crate::monitor::{ProgressLayout, ProgressMonitor, ProgressSnapshot, StatusSource};
use crate::session::{CredentialArgs, SessionContext};

use super::{authenticate, first_instance};

/// Oldest firmware with One Button Erase, as `generation * 1000 + major * 100 + minor`.
const MIN_ERASE_FIRMWARE: u32 = 5140;

const ERASE_PROMPT: &str = "Please type \"erase\" to begin erase process. Any other input will \
    cancel the operation. If you wish to skip this prompt add the --confirm flag: ";

#[derive(Debug, Parser)]
#[command(name = "onebuttonerase", long_about = ONEBUTTONERASE_HELP)]
pub struct OneButtonEraseArgs {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    /// Do not monitor an erase that is already in progress
    #[arg(long)]
    pub nomonitor: bool,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub confirm: bool,

    #[arg(hide = true)]
    pub extra: Vec<String>,
}

pub struct OneButtonEraseCommand;

impl Command for OneButtonEraseCommand {
    fn name(&self) -> &'static str {
        "onebuttonerase"
    }

    fn summary(&self) -> &'static str {
        "Performs One Button Erase on a system. Erases all BIOS settings, iLO settings \
         and user data, then restarts the system."
    }

    fn usage(&self) -> String {
        super::render_usage::<OneButtonEraseArgs>()
    }

    fn run(
        &self,
        ctx: &mut AppContext,
        _registry: &CommandRegistry,
        args: &[String],
    ) -> Result<ReturnCode, Condition> {
        let Some(args) = parse_command_args::<OneButtonEraseArgs>(self.name(), args)? else {
            return Ok(ReturnCode::Success);
        };
        if !args.extra.is_empty() {
            return Err(Condition::InvalidCommandLine(
                "onebuttonerase command takes no arguments.".to_string(),
            ));
        }
        authenticate(ctx, &args.credentials)?;

        let systems = ctx.session.client_mut()?.select("ComputerSystem.")?;
        let firmware = controller_firmware(ctx)?;
        if firmware.is_none_or(|code| code < MIN_ERASE_FIRMWARE) {
            return Err(Condition::IncompatibleVersion(
                "One Button Erase is only available on iLO 5 1.40 and greater.".to_string(),
            ));
        }
        let system = systems.into_iter().next().ok_or_else(|| {
            Condition::NoContentsFoundForOperation("Unable to find ComputerSystem.".to_string())
        })?;
        let hpe = &system.body["Oem"]["Hpe"];

        let idle = |key: &str| hpe.get(key).and_then(Value::as_str) == Some("Idle");
        if idle("SystemROMAndiLOEraseStatus") && idle("UserDataEraseStatus") {
            let answer = if args.confirm {
                "erase".to_string()
            } else {
                ctx.prompter.ask(ERASE_PROMPT)?
            };
            if answer != "erase" {
                println!("Canceling One Button Erase.");
                return Ok(ReturnCode::Success);
            }

            let erase_target = hpe
                .get("Actions")
                .and_then(|actions| find_action_target(actions, "SecureSystemErase"))
                .ok_or_else(|| {
                    Condition::NoContentsFoundForOperation(
                        "Unable to start One Button Erase.".to_string(),
                    )
                })?;
            let reset_target = system.action_target("#ComputerSystem.Reset").ok_or_else(|| {
                Condition::NoContentsFoundForOperation(
                    "Unable to start One Button Erase.".to_string(),
                )
            })?;

            info!(path = %system.path, "starting One Button Erase");
            let client = ctx.session.client_mut()?;
            client.post(
                &erase_target,
                &json!({ "SystemROMAndiLOErase": true, "UserDataErase": true }),
            )?;
            client.post(
                &reset_target,
                &json!({ "Action": "ComputerSystem.Reset", "ResetType": "ForceRestart" }),
            )?;
            monitor_erase(ctx, &system.path)?;
            return Ok(ReturnCode::Success);
        }

        println!("System is already undergoing a One Button Erase process...");
        if !args.nomonitor {
            monitor_erase(ctx, &system.path)?;
        }
        Ok(ReturnCode::Success)
    }
}

fn monitor_erase(ctx: &mut AppContext, path: &str) -> Result<(), Condition> {
    let mut source = EraseStatusSource {
        session: &mut ctx.session,
        path: path.to_string(),
    };
    let iterations = ProgressMonitor::new(ctx.terminal.as_mut(), ctx.poll_interval)
        .watch(&EraseLayout, &mut source)?;
    debug!(iterations, "erase monitor stopped");
    Ok(())
}

/// Firmware code of the first manager, if it can be read.
fn controller_firmware(ctx: &mut AppContext) -> Result<Option<u32>, Condition> {
    let Ok(manager) = first_instance(ctx, "Manager.") else {
        return Ok(None);
    };
    Ok(manager
        .body
        .get("FirmwareVersion")
        .and_then(Value::as_str)
        .and_then(firmware_code))
}

/// `"iLO 5 v1.40"` -> `5140`.
fn firmware_code(version: &str) -> Option<u32> {
    let mut parts = version.split_whitespace();
    parts.next()?;
    let generation: u32 = parts.next()?.parse().ok()?;
    let release = parts.next()?.trim_start_matches(['v', 'V']);
    let (major, minor) = release.split_once('.')?;
    let major: u32 = major.parse().ok()?;
    let minor: u32 = minor
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .ok()?;
    generation
        .checked_mul(1000)?
        .checked_add(major.checked_mul(100)?)?
        .checked_add(minor)
}

/// Polls the system resource and ends the session once monitoring stops.
struct EraseStatusSource<'a> {
    session: &'a mut SessionContext,
    path: String,
}

impl StatusSource for EraseStatusSource<'_> {
    fn fetch(&mut self) -> Result<Value, Condition> {
        Ok(self.session.client_mut()?.get(&self.path)?.body)
    }

    fn finish(&mut self) -> Result<(), Condition> {
        self.session.logout();
        Ok(())
    }
}

const TIMERS: &[(&str, &str)] = &[
    ("ElapsedEraseTimeInMinutes", "Elapsed Time in Minutes:"),
    (
        "EstimatedEraseTimeInMinutes",
        "Estimated Remaining Time in Minutes:",
    ),
];

/// Roll-up status, its component group and the component fields.
const GROUPS: &[(&str, &str, &str, &[(&str, &str)])] = &[
    (
        "SystemROMAndiLOEraseStatus",
        "Bios and iLO Erase:",
        "SystemROMAndiLOEraseComponentStatus",
        &[
            ("BIOSSettingsEraseStatus", "Bios Settings Erase:"),
            ("iLOSettingsEraseStatus", "iLO Settings Erase:"),
        ],
    ),
    (
        "UserDataEraseStatus",
        "User Data Erase:",
        "UserDataEraseComponentStatus",
        &[
            ("NVDIMMEraseStatus", "NVDIMM Erase:"),
            ("NVMeDrivesEraseStatus", "NVMe Drive Erase:"),
            ("SATADrivesEraseStatus", "SATA Drive Erase:"),
            ("SmartStorageEraseStatus", "Smart Storage Erase:"),
            ("TPMEraseStatus", "TPM Erase:"),
        ],
    ),
];

struct EraseLayout;

impl ProgressLayout for EraseLayout {
    fn title(&self) -> &str {
        "One Button Erase Status"
    }

    fn snapshot(&self, raw: &Value) -> Result<ProgressSnapshot, Condition> {
        let mut snapshot = ProgressSnapshot::default();
        let hpe = raw.pointer("/Oem/Hpe").ok_or_else(|| {
            Condition::MalformedResponse("Erase status is missing from the system.".to_string())
        })?;
        for (key, label) in TIMERS {
            if let Some(value) = hpe.get(*key) {
                snapshot.push(key, label, value, true);
            }
        }
        for (rollup, rollup_label, group, components) in GROUPS {
            let breakdown = hpe
                .get(*group)
                .and_then(Value::as_object)
                .filter(|map| !map.is_empty());
            match breakdown {
                Some(map) => {
                    for (key, label) in components.iter() {
                        if let Some(value) = map.get(*key) {
                            snapshot.push(key, label, value, false);
                        }
                    }
                }
                None => {
                    let value = hpe.get(*rollup).ok_or_else(|| {
                        Condition::MalformedResponse(format!("{} is missing.", rollup))
                    })?;
                    snapshot.push(rollup, rollup_label, value, false);
                }
            }
        }
        Ok(snapshot)
    }
}
