use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Exit status used when the tool stops because of an interrupt.
pub(crate) const INTERRUPTED_EXIT_CODE: u8 = 130;

/// Cancels `shutdown` on the first interrupt or terminate signal and exits
/// the process on the second.
#[cfg(unix)]
pub(crate) fn spawn_shutdown_handler(shutdown: CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(signal) => signal,
            Err(err) => {
                tracing::warn!(error = %err, "failed to register SIGINT handler");
                return;
            }
        };
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                tracing::warn!(error = %err, "failed to register SIGTERM handler");
                return;
            }
        };

        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("received SIGINT, stopping wait");
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, stopping wait");
            }
        }
        shutdown.cancel();

        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
        tracing::info!("received second signal, exiting");
        std::process::exit(i32::from(INTERRUPTED_EXIT_CODE));
    });
}

#[cfg(not(unix))]
pub(crate) fn spawn_shutdown_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to register ctrl-c handler");
            return;
        }
        tracing::info!("received ctrl-c, stopping wait");
        shutdown.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received second ctrl-c, exiting");
            std::process::exit(i32::from(INTERRUPTED_EXIT_CODE));
        }
    });
}

/// Runs `future` unless `shutdown` fires first; `None` means it was cancelled.
pub(crate) async fn until_cancelled<F: Future>(
    shutdown: &CancellationToken,
    future: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = shutdown.cancelled() => None,
        output = future => Some(output),
    }
}
