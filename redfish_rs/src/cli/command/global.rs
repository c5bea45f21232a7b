//! Global options shared across all CLI commands.

use std::path::PathBuf;

use clap::Parser;

use super::help_texts::{GLOBAL_USAGE, LONG_NAME, SHORT_NAME};

/// Global options that apply to all commands.
///
/// These come before the command name and control configuration, caching,
/// logging and output.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = SHORT_NAME,
    about = LONG_NAME,
    override_usage = GLOBAL_USAGE,
    disable_version_flag = true
)]
pub struct GlobalOptions {
    /// Use the provided configuration file instead of the default one
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for the session cache
    #[arg(long = "cache-dir", value_name = "PATH")]
    pub cache_dir: Option<PathBuf>,

    /// Display verbose information, including return codes
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Display debug information
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Directory for the debug log file (used with --debug)
    #[arg(long, value_name = "PATH")]
    pub logdir: Option<PathBuf>,

    /// Do not keep the session between invocations
    #[arg(long)]
    pub nocache: bool,

    /// Suppress the startup banner
    #[arg(long)]
    pub nologo: bool,

    /// Restrict responses to standard Redfish data
    #[arg(long = "redfish")]
    pub redfish_only: bool,

    /// Prefer the newest schema version when several are available
    #[arg(long)]
    pub latestschema: bool,

    /// Proxy server for all controller traffic
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,
}
