use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Running,
    Succeeded,
    Failed,
    Aborted,
    TimedOut,
    FailedWithRetry,
    Scheduled,
    Missed,
    #[serde(other)]
    Other,
}

impl ExecutionState {
    /// Only `running` keeps a follow session waiting.
    pub fn is_terminal(self) -> bool {
        self != ExecutionState::Running
    }

    pub fn is_successful(self) -> bool {
        !matches!(self, ExecutionState::Failed | ExecutionState::Aborted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionState::Running => "running",
            ExecutionState::Succeeded => "succeeded",
            ExecutionState::Failed => "failed",
            ExecutionState::Aborted => "aborted",
            ExecutionState::TimedOut => "timed_out",
            ExecutionState::FailedWithRetry => "failed_with_retry",
            ExecutionState::Scheduled => "scheduled",
            ExecutionState::Missed => "missed",
            ExecutionState::Other => "other",
        }
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionJob {
    pub name: String,
    /// Milliseconds, -1 when the service has no history for the job.
    pub average_duration_ms: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExecutionDetail {
    pub id: String,
    pub status: ExecutionState,
    #[serde(default)]
    pub job: Option<ExecutionJob>,
}

impl ExecutionDetail {
    pub fn average_duration_ms(&self) -> i64 {
        self.job
            .as_ref()
            .map(|job| job.average_duration_ms)
            .unwrap_or(-1)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowRequest {
    /// Continue from the server-tracked cursor instead of replaying from the start.
    pub resume: bool,
}

impl FollowRequest {
    pub fn from_restart(restart: bool) -> Self {
        Self { resume: !restart }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FollowResult {
    pub final_state: Option<ExecutionState>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogLine {
    #[serde(default)]
    pub level: Option<String>,
    pub message: String,
}

impl LogLine {
    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            level: None,
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FollowEvent {
    Output {
        lines: Vec<LogLine>,
    },
    Progress {
        offset: u64,
        total_size: u64,
        elapsed_ms: u64,
    },
    Finished {
        #[serde(default)]
        state: Option<ExecutionState>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KillResult {
    pub successful: bool,
    #[serde(default)]
    pub message: String,
}
