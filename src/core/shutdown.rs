//! OS termination signal handling.
//!
//! One helper that resolves when the process is asked to stop, so the
//! embedding application can drive teardown from a single await point.

use std::io;

/// Waits for a termination signal from the OS.
///
/// On unix this listens for Ctrl+C together with SIGINT, SIGTERM and
/// SIGQUIT; elsewhere only Ctrl+C is available.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        r = tokio::signal::ctrl_c() => r,
        _ = interrupt.recv() => Ok(()),
        _ = terminate.recv() => Ok(()),
        _ = quit.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}
