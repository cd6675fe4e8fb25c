use async_trait::async_trait;
use dispatch_protocol::ExecutionState;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dispatcher::Dispatcher;
use crate::error::DispatchError;
use crate::shutdown::until_cancelled;

const DEFAULT_WAIT_BASE_DELAY: Duration = Duration::from_millis(1000);
const DEFAULT_WAIT_MAX_DELAY: Duration = Duration::from_millis(5000);

/// Linear backoff bounded above: the k-th delay is `min(base * k, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct BackoffPolicy {
    pub(crate) base: Duration,
    pub(crate) max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_WAIT_BASE_DELAY,
            max: DEFAULT_WAIT_MAX_DELAY,
        }
    }
}

impl BackoffPolicy {
    pub(crate) fn delays(&self) -> LinearBackoff {
        LinearBackoff {
            policy: *self,
            step: 0,
        }
    }
}

pub(crate) struct LinearBackoff {
    policy: BackoffPolicy,
    step: u32,
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        self.step = self.step.saturating_add(1);
        Some(
            self.policy
                .base
                .saturating_mul(self.step)
                .min(self.policy.max),
        )
    }
}

/// Resolves the final state of an execution whose follow stream ended without one.
#[async_trait]
pub(crate) trait CompletionWaiter: Send + Sync {
    /// Returns the first non-running state. When cancelled, returns the most
    /// recent observation, starting from `last_known`.
    async fn await_terminal(
        &self,
        id: &str,
        last_known: ExecutionState,
        shutdown: &CancellationToken,
    ) -> Result<ExecutionState, DispatchError>;
}

pub(crate) struct CompletionPoller<'a> {
    dispatcher: &'a dyn Dispatcher,
    policy: BackoffPolicy,
}

impl<'a> CompletionPoller<'a> {
    pub(crate) fn new(dispatcher: &'a dyn Dispatcher, policy: BackoffPolicy) -> Self {
        Self { dispatcher, policy }
    }

    async fn status(&self, id: &str) -> Result<ExecutionState, DispatchError> {
        Ok(self.dispatcher.get_execution(id).await?.status)
    }
}

#[async_trait]
impl CompletionWaiter for CompletionPoller<'_> {
    async fn await_terminal(
        &self,
        id: &str,
        last_known: ExecutionState,
        shutdown: &CancellationToken,
    ) -> Result<ExecutionState, DispatchError> {
        let mut state = last_known;
        let mut delays = self.policy.delays();
        let mut polls = 0u32;
        loop {
            let Some(observed) = until_cancelled(shutdown, self.status(id)).await else {
                info!(execution_id = %id, state = %state, "wait for completion interrupted");
                return Ok(state);
            };
            state = observed?;
            polls += 1;
            if state != ExecutionState::Running {
                debug!(execution_id = %id, polls, state = %state, "execution reached a final state");
                return Ok(state);
            }

            let delay = delays.next().unwrap_or(self.policy.max);
            debug!(execution_id = %id, polls, delay = ?delay, "execution still running");
            if until_cancelled(shutdown, tokio::time::sleep(delay)).await.is_none() {
                info!(execution_id = %id, state = %state, "wait for completion interrupted");
                return Ok(state);
            }
        }
    }
}
