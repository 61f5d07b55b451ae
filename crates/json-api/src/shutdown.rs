//! Graceful shutdown: stop taking requests, then drain background work.

use std::{io, time::Duration};

use salvo::server::ServerHandle;
use thiserror::Error;
use tokio::{signal, time::timeout};
use tracing::{info, warn};

use shopsync_app::dispatch::Dispatcher;

#[derive(Debug, Error)]
pub(crate) enum ShutdownSignalError {
    #[error("failed to install Ctrl+C handler: {0}")]
    CtrlC(#[source] io::Error),

    #[cfg(unix)]
    #[error("failed to install SIGTERM handler: {0}")]
    SigTerm(#[source] io::Error),
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<&'static str, ShutdownSignalError> {
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(ShutdownSignalError::SigTerm)?;

    tokio::select! {
        result = signal::ctrl_c() => result.map(|()| "ctrl_c").map_err(ShutdownSignalError::CtrlC),
        _ = terminate.recv() => Ok("terminate"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<&'static str, ShutdownSignalError> {
    signal::ctrl_c()
        .await
        .map(|()| "ctrl_c")
        .map_err(ShutdownSignalError::CtrlC)
}

/// Wait for a stop signal, then give in-flight requests `grace` to finish.
pub(crate) async fn listen(handle: ServerHandle, grace: Duration) -> Result<(), ShutdownSignalError> {
    let signal = wait_for_signal().await?;

    info!(signal, grace_seconds = grace.as_secs(), "shutdown signal received");

    handle.stop_graceful(Some(grace));

    Ok(())
}

/// Wait for queued event publishes and marker writes, at most `grace`.
///
/// Returns `false` when work was still pending at the deadline; it is
/// abandoned, consumers recover through the delta feed.
pub(crate) async fn drain(dispatcher: &Dispatcher, grace: Duration) -> bool {
    let drained = timeout(grace, dispatcher.flush()).await.is_ok();
    let stats = dispatcher.stats();

    if drained {
        info!(
            completed = stats.completed,
            failed = stats.failed,
            dropped = stats.dropped,
            "background work drained"
        );
    } else {
        warn!(
            dispatched = stats.dispatched,
            completed = stats.completed,
            "background work still pending at shutdown deadline"
        );
    }

    drained
}
