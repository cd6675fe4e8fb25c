mod kill;
mod list;

use dispatch_protocol::PageRequest;
use std::io::Write;
use tokio_util::sync::CancellationToken;

use crate::cli::Action;
use crate::dispatcher::Dispatcher;
use crate::error::{QueueToolError, Result};
use crate::follow::{follow_execution, BackoffPolicy, CompletionPoller, FollowMode, FollowOptions};
use crate::logger::ToolLogger;
use crate::shutdown::until_cancelled;

use kill::kill_execution;
use list::{list_queue, resolve_project};

/// An action whose arguments have been checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ValidatedAction {
    List { project: String, page: PageRequest },
    Kill { id: String },
    Follow { id: String, options: FollowOptions },
}

fn required_eid(eid: Option<String>) -> Result<String> {
    eid.map(|eid| eid.trim().to_string())
        .filter(|eid| !eid.is_empty())
        .ok_or_else(|| QueueToolError::Validation("-e/--eid argument required".to_string()))
}

fn warn_project_ignored(project: &Option<String>, logger: &dyn ToolLogger) {
    if project.is_some() {
        logger.warn("-p argument only valid with list action");
    }
}

/// Checks arguments. Only list may reach the service, to pick a default project.
pub(crate) async fn validate_action(
    action: Action,
    dispatcher: &dyn Dispatcher,
    logger: &dyn ToolLogger,
    shutdown: &CancellationToken,
) -> Result<ValidatedAction> {
    match action {
        Action::List(args) => {
            if args.eid.is_some() {
                logger.warn("-e/--eid argument only valid with kill/follow actions");
            }
            let project =
                until_cancelled(shutdown, resolve_project(dispatcher, args.project, logger))
                    .await
                    .ok_or(QueueToolError::Interrupted("looking up projects"))??;
            Ok(ValidatedAction::List {
                project,
                page: PageRequest {
                    offset: args.offset,
                    max: args.max,
                },
            })
        }
        Action::Kill(args) => {
            let id = required_eid(args.eid)?;
            warn_project_ignored(&args.project, logger);
            Ok(ValidatedAction::Kill { id })
        }
        Action::Follow(args) => {
            let id = required_eid(args.eid)?;
            warn_project_ignored(&args.project, logger);
            Ok(ValidatedAction::Follow {
                id,
                options: FollowOptions {
                    restart: args.restart,
                    mode: FollowMode::from_flags(args.quiet, args.progress),
                },
            })
        }
    }
}

/// Runs a validated action. `Ok(false)` means a followed execution failed or was aborted.
pub(crate) async fn run_action<W: Write + Send>(
    action: ValidatedAction,
    dispatcher: &dyn Dispatcher,
    backoff: BackoffPolicy,
    out: &mut W,
    logger: &dyn ToolLogger,
    shutdown: &CancellationToken,
) -> Result<bool> {
    match action {
        ValidatedAction::List { project, page } => {
            until_cancelled(shutdown, list_queue(dispatcher, &project, page, logger))
                .await
                .ok_or(QueueToolError::Interrupted("listing the queue"))??;
            Ok(true)
        }
        ValidatedAction::Kill { id } => {
            until_cancelled(shutdown, kill_execution(dispatcher, &id, logger))
                .await
                .ok_or(QueueToolError::Interrupted("killing the execution"))??;
            Ok(true)
        }
        ValidatedAction::Follow { id, options } => {
            let poller = CompletionPoller::new(dispatcher, backoff);
            let outcome =
                follow_execution(dispatcher, &poller, &id, options, out, logger, shutdown).await?;
            tracing::debug!(
                execution_id = %id,
                state = %outcome.state,
                successful = outcome.successful,
                "follow finished"
            );
            Ok(outcome.successful)
        }
    }
}
