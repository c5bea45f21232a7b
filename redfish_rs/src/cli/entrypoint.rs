//! Shared CLI entry point.
//!
//! Splits global options from the command line, builds the application
//! context and either runs a single command or starts the shell.

use std::ops::ControlFlow;

use tracing::debug;

use crate::cli::command::help_texts::{LONG_NAME, SHORT_NAME, VERSION};
use crate::cli::dispatch::{Dispatcher, is_help_request, requests_fresh_login};
use crate::cli::parser::{parse_global_options, split_global_args};
use crate::cli::repl::run_shell;
use crate::client::Connector;
use crate::client::http::HttpConnector;
use crate::codec::Base64Codec;
use crate::commands::builtin_registry;
use crate::config::RedfishConfig;
use crate::context::AppContext;
use crate::error::{Condition, ReturnCode};
use crate::logging;
use crate::session::{SessionCache, SessionContext};
use crate::ui;

/// Runs the CLI over `raw_args` (without argv[0]) and returns the process
/// exit code.
pub fn run(raw_args: &[String]) -> i32 {
    run_with(raw_args, Box::new(HttpConnector::default()))
}

pub fn run_with(raw_args: &[String], connector: Box<dyn Connector>) -> i32 {
    let (global_tokens, nargv) = split_global_args(raw_args);

    if global_tokens.iter().any(|t| t == "--version" || t == "-V") {
        println!("{} {}", LONG_NAME, VERSION);
        return 0;
    }

    let global = match parse_global_options(&global_tokens) {
        Ok(Some(global)) => global,
        Ok(None) => return ReturnCode::Success.code(),
        Err(condition) => return condition.return_code().code(),
    };

    let config = match RedfishConfig::resolve(global.config.as_deref()) {
        Ok(config) => config,
        Err(condition) => {
            ui::error(&condition.to_string());
            return condition.return_code().code();
        }
    };
    logging::init(&global, &config);

    let cache = if !global.nocache && config.cache {
        config
            .cache_root(global.cache_dir.as_deref())
            .map(|root| SessionCache::new(root.join("cache")))
    } else {
        None
    };
    debug!(cache = cache.is_some(), "starting");
    let session = SessionContext::new(connector, Box::new(Base64Codec), cache, global.proxy.clone());
    let verbose = global.verbose;
    let ctx = AppContext::new(global, config, session);
    let mut dispatcher = Dispatcher::new(builtin_registry(), ctx);

    let fresh_login = requests_fresh_login(&nargv) || nargv.is_empty();
    if fresh_login && !is_help_request(&nargv) {
        dispatcher.context_mut().session.logout();
    } else {
        dispatcher.context_mut().session.restore();
    }

    if nargv.is_empty() {
        return run_shell(&mut dispatcher).code();
    }

    let code = match dispatcher.run_command(&nargv) {
        Ok(code) => {
            dispatcher.finish_session(&nargv);
            code
        }
        // `exit` already saved or ended the session
        Err(Condition::Exit(code)) => code,
        Err(condition) => {
            let code = settle(&mut dispatcher, condition);
            dispatcher.finish_session(&nargv);
            code
        }
    };
    if verbose {
        println!("{} return code: {}", SHORT_NAME, code.code());
    }
    code.code()
}

fn settle(dispatcher: &mut Dispatcher, condition: Condition) -> ReturnCode {
    match dispatcher.handle_condition(condition) {
        ControlFlow::Break(code) | ControlFlow::Continue(code) => code,
    }
}
