use dispatch_protocol::{ExecutionState, FollowRequest, FollowResult};
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::poller::CompletionWaiter;
use super::receiver::{lock, ConsoleFollowReceiver, SharedReceiver};
use super::FollowMode;
use crate::dispatcher::Dispatcher;
use crate::error::{DispatchError, QueueToolError, Result};
use crate::logger::ToolLogger;
use crate::shutdown::until_cancelled;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct FollowOptions {
    pub(crate) restart: bool,
    pub(crate) mode: FollowMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FollowOutcome {
    pub(crate) state: ExecutionState,
    pub(crate) successful: bool,
}

impl FollowOutcome {
    fn from_state(state: ExecutionState) -> Self {
        Self {
            state,
            successful: state.is_successful(),
        }
    }
}

/// How the follow stream left the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamEnd {
    /// The service reported a final state; it is authoritative.
    Complete(ExecutionState),
    /// No state, or still `running`: the poller has to resolve it, starting
    /// from the last state seen.
    Unknown(ExecutionState),
    /// Cancelled before the stream ended.
    Interrupted,
}

impl StreamEnd {
    fn from_result(result: FollowResult, last_known: ExecutionState) -> Self {
        match result.final_state {
            Some(state) if state.is_terminal() => StreamEnd::Complete(state),
            reported => StreamEnd::Unknown(reported.unwrap_or(last_known)),
        }
    }
}

fn follow_failed(source: DispatchError) -> QueueToolError {
    QueueToolError::remote("Failed request to follow the execution", source)
}

/// Follows one execution until it reaches a final state, or until `shutdown` fires.
pub(crate) async fn follow_execution<W: Write + Send>(
    dispatcher: &dyn Dispatcher,
    waiter: &dyn CompletionWaiter,
    id: &str,
    options: FollowOptions,
    out: &mut W,
    logger: &dyn ToolLogger,
    shutdown: &CancellationToken,
) -> Result<FollowOutcome> {
    let detail = until_cancelled(shutdown, dispatcher.get_execution(id))
        .await
        .ok_or(QueueToolError::Interrupted("looking up the execution"))?
        .map_err(follow_failed)?;
    let last_known = detail.status;
    let average_duration_ms = detail.average_duration_ms();
    debug!(execution_id = %id, average_duration_ms, state = %last_known, "following execution");

    let request = FollowRequest::from_restart(options.restart);
    let receiver = Mutex::new(ConsoleFollowReceiver::new(
        average_duration_ms,
        options.mode,
        out,
        logger,
    ));
    let mut marks = tokio::time::interval(lock(&receiver).mark_interval());
    marks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut shared = SharedReceiver::new(&receiver);
    let mut stream = dispatcher.follow_execution(id, request, &mut shared);
    let end = loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break StreamEnd::Interrupted,
            result = &mut stream => {
                break StreamEnd::from_result(result.map_err(follow_failed)?, last_known);
            }
            _ = marks.tick(), if options.mode == FollowMode::Progress => {
                lock(&receiver).tick();
            }
        }
    };
    drop(stream);
    receiver
        .into_inner()
        .unwrap_or_else(PoisonError::into_inner)
        .finish()?;

    let state = match end {
        StreamEnd::Complete(state) => state,
        StreamEnd::Unknown(last_seen) => {
            debug!(execution_id = %id, state = %last_seen, "follow stream ended without a final state, polling");
            waiter
                .await_terminal(id, last_seen, shutdown)
                .await
                .map_err(follow_failed)?
        }
        StreamEnd::Interrupted => {
            info!(execution_id = %id, state = %last_known, "follow interrupted");
            last_known
        }
    };

    if options.mode != FollowMode::Quiet {
        logger.warn(&format!("[{id}] execution status: {state}"));
    }
    Ok(FollowOutcome::from_state(state))
}
