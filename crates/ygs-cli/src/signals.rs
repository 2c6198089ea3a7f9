//! Termination signals.

use tracing::warn;

/// Resolves on SIGINT, SIGTERM or SIGHUP.
#[cfg(unix)]
pub async fn terminated() {
    use tokio::signal::unix::{SignalKind, signal};

    let (Ok(mut term), Ok(mut hup)) = (
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    ) else {
        warn!("failed to register SIGTERM/SIGHUP handlers, only Ctrl+C stops the bar");
        ctrl_c().await;
        return;
    };

    tokio::select! {
        () = ctrl_c() => {}
        _ = term.recv() => {}
        _ = hup.recv() => {}
    }
}

#[cfg(not(unix))]
pub async fn terminated() {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C: {err}");
        std::future::pending::<()>().await;
    }
}
