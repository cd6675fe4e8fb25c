mod actions;
mod cli;
mod client;
mod config;
mod dispatcher;
mod error;
mod follow;
mod logger;
mod shutdown;
#[cfg(test)]
mod test_utils;

use crate::actions::{run_action, validate_action};
use crate::cli::Args;
use crate::client::DispatchClient;
use crate::config::load_tool_config;
use crate::error::QueueToolError;
use crate::logger::{init_tracing, ConsoleLogger, ToolLogger};
use crate::shutdown::spawn_shutdown_handler;
use clap::Parser;
use std::error::Error as _;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    let logger = ConsoleLogger::new(args.verbose);

    let mut config = match load_tool_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            logger.error(&format!("Error: {err:#}"));
            return ExitCode::from(2);
        }
    };
    if let Some(addr) = args.addr {
        config.addr = addr;
    }
    tracing::debug!(addr = %config.addr, backoff = ?config.backoff, "rd-queue starting");
    logger.verbose(&format!("# Using dispatch service at {}", config.addr));

    let dispatcher = DispatchClient::new(config.addr.clone(), config.request_timeout);
    let shutdown = CancellationToken::new();
    spawn_shutdown_handler(shutdown.clone());

    let action = args.action.unwrap_or_default();
    let result = async {
        let validated = validate_action(action, &dispatcher, &logger, &shutdown).await?;
        let mut out = std::io::stdout();
        run_action(validated, &dispatcher, config.backoff, &mut out, &logger, &shutdown).await
    }
    .await;

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            report_error(&err, &logger, args.verbose);
            ExitCode::from(err.exit_code())
        }
    }
}

fn report_error(err: &QueueToolError, logger: &dyn ToolLogger, verbose: bool) {
    logger.error(&format!("Error: {err}"));
    if verbose {
        let mut source = err.source();
        while let Some(cause) = source {
            logger.error(&format!("  caused by: {cause}"));
            source = cause.source();
        }
    }
    if matches!(err, QueueToolError::Validation(_)) {
        logger.error("Run with --help for usage.");
    }
}
