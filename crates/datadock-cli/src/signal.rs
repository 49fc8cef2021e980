//! Interrupt handling for long-running commands.

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_COMMAND;

/// Returns a token cancelled on SIGINT (Ctrl+C) or SIGTERM.
pub fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();

    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => return,
            () = interrupted() => {}
        }
        cancel.cancel();
    });

    token
}

/// Waits for SIGINT or SIGTERM.
async fn interrupted() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!(
                target: TRACING_TARGET_COMMAND,
                error = %e,
                "Failed to install Ctrl+C handler"
            );
            std::future::pending::<()>().await;
        } else {
            tracing::debug!(target: TRACING_TARGET_COMMAND, "Received Ctrl+C signal");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::debug!(target: TRACING_TARGET_COMMAND, "Received SIGTERM signal");
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_COMMAND,
                    error = %e,
                    "Failed to install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
