//! Tracing subscriber setup.
//!
//! Diagnostics go to stderr at `warn` by default, `debug` with `--debug`.
//! With `--debug` and a log directory they go to `<logdir>/redfish.log`
//! instead. `RUST_LOG` always wins.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::cli::command::GlobalOptions;
use crate::config::RedfishConfig;

const LOG_FILE: &str = "redfish.log";

pub fn init(global: &GlobalOptions, config: &RedfishConfig) {
    let level = if global.debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let logdir = global.logdir.as_deref().or(config.logdir.as_deref());
    if global.debug
        && let Some(dir) = logdir
    {
        match open_log_file(dir) {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .try_init();
                return;
            }
            Err(e) => eprintln!(
                "[redfish][warn] Unable to open log file in {}: {}",
                dir.display(),
                e
            ),
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn open_log_file(dir: &Path) -> std::io::Result<File> {
    fs::create_dir_all(dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
}
