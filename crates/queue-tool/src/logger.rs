use std::io;
use tracing_subscriber::EnvFilter;

/// Line-oriented, user-facing output of the tool.
pub(crate) trait ToolLogger: Send + Sync {
    fn log(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn verbose(&self, message: &str);
    fn debug(&self, message: &str);
}

pub(crate) struct ConsoleLogger {
    verbose: bool,
}

impl ConsoleLogger {
    pub(crate) fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ToolLogger for ConsoleLogger {
    fn log(&self, message: &str) {
        println!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("{message}");
    }

    fn error(&self, message: &str) {
        eprintln!("{message}");
    }

    fn verbose(&self, message: &str) {
        if self.verbose {
            println!("{message}");
        }
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }
}

pub(crate) fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
