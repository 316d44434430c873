//! Child process supervision with cancellation support.

use std::process::ExitStatus;

use tokio::process::Child;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Wait for `child` to exit, or kill it once `token` is cancelled.
///
/// Returns `Ok(None)` when the process was killed because of cancellation.
/// In both cases the process has been reaped when this returns.
pub async fn wait_or_kill(
    child: &mut Child,
    token: &CancellationToken,
) -> std::io::Result<Option<ExitStatus>> {
    tokio::select! {
        biased;
        _ = token.cancelled() => {
            kill_and_reap(child).await;
            Ok(None)
        }
        status = child.wait() => status.map(Some),
    }
}

/// Kill `child` and wait for it, logging instead of failing.
pub async fn kill_and_reap(child: &mut Child) {
    // `kill` sends the signal and then waits
    match child.kill().await {
        Ok(()) => debug!(pid = ?child.id(), "Killed child process"),
        Err(e) => warn!(error = %e, "Failed to kill child process"),
    }
}
