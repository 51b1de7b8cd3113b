//! # Exit watcher: one task per supervised child.
//!
//! The watcher exclusively owns the child's OS handle. It observes the
//! readiness window, executes kill requests with graceful-then-forceful
//! escalation, forwards child output to the log, and hands exactly one
//! [`ExitObservation`] to the registry when the child terminates.
//!
//! ```text
//! loop {
//!   ├─► child.wait() resolved      ──► break: classify + observe_exit
//!   ├─► readiness window elapsed   ──► Starting → Running
//!   ├─► kill token cancelled       ──► SIGTERM, arm escalation timer
//!   └─► escalation timer elapsed   ──► SIGKILL
//! }
//! ```
//!
//! ## Rules
//! - Only the watcher knows whether termination was requested; external
//!   signals (OS kill of the child) classify as crashes.
//! - A kill request that races the exit still counts as requested: the
//!   token is re-checked after `wait()` resolves.
//! - The watcher never errors out: an uncollectable exit status becomes an
//!   [`ExitObservation::unknown`], which classifies as a crash unless the
//!   termination was requested.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::classify::ExitObservation;
use crate::core::registry::Registry;
use crate::runtimes::RuntimeId;

/// Placeholder deadline for the not-yet-armed escalation timer.
const UNARMED: Duration = Duration::from_secs(86_400 * 365);

/// Spawns the exit watcher for one child. Armed by the launcher before
/// `launch` returns.
pub(crate) fn spawn_watcher(
    registry: Arc<Registry>,
    child: Child,
    id: RuntimeId,
    kill: CancellationToken,
    ready_after: Duration,
    kill_grace: Duration,
) -> JoinHandle<()> {
    tokio::spawn(watch(registry, child, id, kill, ready_after, kill_grace))
}

async fn watch(
    registry: Arc<Registry>,
    mut child: Child,
    id: RuntimeId,
    kill: CancellationToken,
    ready_after: Duration,
    kill_grace: Duration,
) {
    forward_output(&mut child, id);

    let ready = time::sleep(ready_after);
    tokio::pin!(ready);
    let escalate = time::sleep(UNARMED);
    tokio::pin!(escalate);

    let mut ready_seen = false;
    let mut requested = false;
    let mut forced = false;

    let status = loop {
        tokio::select! {
            res = child.wait() => break res,
            _ = &mut ready, if !ready_seen => {
                ready_seen = true;
                registry.mark_running(id).await;
            }
            _ = kill.cancelled(), if !requested => {
                requested = true;
                terminate(&mut child, id);
                escalate.as_mut().reset(Instant::now() + kill_grace);
            }
            _ = &mut escalate, if requested && !forced => {
                forced = true;
                debug!(runtime = %id, "kill grace elapsed, escalating to forceful kill");
                let _ = child.start_kill();
            }
        }
    };

    // A kill request that landed while wait() was resolving still makes
    // this termination a requested one.
    let requested = requested || kill.is_cancelled();
    let observation = match status {
        Ok(status) => ExitObservation::from_status(status, requested),
        Err(e) => {
            warn!(runtime = %id, error = %e, "failed to collect exit status");
            ExitObservation::unknown(requested)
        }
    };
    registry.observe_exit(id, observation).await;
}

/// Forwards the child's stdout/stderr lines to the log.
fn forward_output(child: &mut Child, id: RuntimeId) {
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(runtime = %id, stream = "stdout", "{line}");
            }
        });
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(runtime = %id, stream = "stderr", "{line}");
            }
        });
    }
}

/// Graceful termination request: SIGTERM on unix, forceful kill elsewhere.
#[cfg(unix)]
fn terminate(child: &mut Child, id: RuntimeId) {
    if let Some(pid) = child.id() {
        debug!(runtime = %id, pid, "sending SIGTERM");
        // Safety: plain kill(2) on a pid we own; no memory involved.
        unsafe {
            libc::kill(pid as libc::pid_t, libc::SIGTERM);
        }
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child, id: RuntimeId) {
    debug!(runtime = %id, "requesting kill");
    let _ = child.start_kill();
}
