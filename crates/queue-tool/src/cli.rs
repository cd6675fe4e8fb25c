use clap::{Args as ClapArgs, Parser, Subcommand};
use dispatch_protocol::{DEFAULT_PAGE_MAX, DEFAULT_PAGE_OFFSET};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rd-queue",
    version,
    about = "List the executions running in the queue, kill a running execution, or follow its output"
)]
pub(crate) struct Args {
    /// TOML config; defaults to ~/.rd-queue/config.toml when present.
    #[arg(long, global = true)]
    pub(crate) config: Option<PathBuf>,
    /// Dispatch service address, overrides the config file.
    #[arg(long, global = true)]
    pub(crate) addr: Option<String>,
    #[arg(short = 'v', long, global = true, default_value_t = false)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) action: Option<Action>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    /// List the executions running in the queue [default]
    List(ListArgs),
    /// Kill an execution running in the queue
    Kill(KillArgs),
    /// Follow the output of an execution
    Follow(FollowArgs),
}

impl Default for Action {
    fn default() -> Self {
        Action::List(ListArgs::default())
    }
}

#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListArgs {
    /// Project name
    #[arg(short = 'p', long)]
    pub(crate) project: Option<String>,
    /// First result offset
    #[arg(short = 'o', long, default_value_t = DEFAULT_PAGE_OFFSET)]
    pub(crate) offset: u32,
    /// Maximum result count
    #[arg(
        short = 'm',
        long,
        default_value_t = DEFAULT_PAGE_MAX,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub(crate) max: u32,
    /// Execution ID (ignored by list)
    #[arg(short = 'e', long = "eid", hide = true)]
    pub(crate) eid: Option<String>,
}

impl Default for ListArgs {
    fn default() -> Self {
        Self {
            project: None,
            offset: DEFAULT_PAGE_OFFSET,
            max: DEFAULT_PAGE_MAX,
            eid: None,
        }
    }
}

#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub(crate) struct KillArgs {
    /// Execution ID
    #[arg(short = 'e', long = "eid")]
    pub(crate) eid: Option<String>,
    /// Project name (ignored by kill)
    #[arg(short = 'p', long, hide = true)]
    pub(crate) project: Option<String>,
}

#[derive(ClapArgs, Debug, Clone, PartialEq, Eq)]
pub(crate) struct FollowArgs {
    /// Execution ID
    #[arg(short = 'e', long = "eid")]
    pub(crate) eid: Option<String>,
    /// Restart log output from the beginning
    #[arg(short = 't', long, default_value_t = false)]
    pub(crate) restart: bool,
    /// Just wait until the execution ends
    #[arg(short = 'q', long, default_value_t = false)]
    pub(crate) quiet: bool,
    /// Progress mark output
    #[arg(short = 'r', long, default_value_t = false)]
    pub(crate) progress: bool,
    /// Project name (ignored by follow)
    #[arg(short = 'p', long, hide = true)]
    pub(crate) project: Option<String>,
}
