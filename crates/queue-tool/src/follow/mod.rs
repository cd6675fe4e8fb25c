mod controller;
mod poller;
mod receiver;

pub(crate) use controller::{follow_execution, FollowOptions};
pub(crate) use poller::{BackoffPolicy, CompletionPoller};

/// How a follow session renders incoming output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum FollowMode {
    #[default]
    Output,
    Quiet,
    Progress,
}

impl FollowMode {
    /// `quiet` takes precedence over `progress`.
    pub(crate) fn from_flags(quiet: bool, progress: bool) -> Self {
        if quiet {
            FollowMode::Quiet
        } else if progress {
            FollowMode::Progress
        } else {
            FollowMode::Output
        }
    }
}
