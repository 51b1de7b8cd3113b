//! # Supervisor: the command surface and shutdown driver.
//!
//! [`Supervisor`] is what the interactive surface talks to across the trust
//! boundary. It exposes the runtime commands (`list`, `kill`, `attach`,
//! `start_*`, `evict`), a raw bus tap for event consumption, and the
//! teardown driver that kills every live runtime within a grace period.
//!
//! ## High-level architecture
//! ```text
//! commands:                      events:
//!   list_runtimes()                Bus ──► fan-out listener ──► SubscriberSet
//!   kill_runtime(id)                │                        ┌─────┬─────┐
//!   attach_runtime(id)              │                        ▼     ▼     ▼
//!   start_python(venv)              └──► subscribe()       sub1  sub2  subN
//!   start_sync_server(proj)              (raw tap)
//!   start_monitor(proj)
//!        │
//!        ▼
//!   Registry ◄── observe_exit ── watcher (one per child)
//! ```
//!
//! ## Rules
//! - Commands return synchronously; terminations are always reported
//!   asynchronously via the bus, regardless of who is still listening.
//! - `kill_runtime` sends the request and returns; the terminal transition
//!   arrives later as `RuntimeExited` (`reason = killed`).
//! - `shutdown` kills all live instances and waits up to
//!   [`Config::grace`]; stuck instances are reported in the error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::Config;
use crate::core::registry::Registry;
use crate::core::{builder::SupervisorBuilder, shutdown};
use crate::discovery::VenvDiscovery;
use crate::error::{CommandError, LaunchError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::runtimes::{LaunchOptions, RuntimeId, RuntimeInstance, RuntimeKind};
use crate::subscribers::SubscriberSet;

/// Supervises the editor's background runtimes.
///
/// Constructed via [`Supervisor::builder`]; the builder spawns the fan-out
/// listener, so construction must happen inside a tokio runtime.
pub struct Supervisor {
    cfg: Arc<Config>,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    registry: Arc<Registry>,
}

impl Supervisor {
    /// Starts building a supervisor with the given configuration.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Arc<Config>,
        bus: Bus,
        subs: Arc<SubscriberSet>,
        registry: Arc<Registry>,
    ) -> Self {
        Self {
            cfg,
            bus,
            subs,
            registry,
        }
    }

    /// Raw tap on the event bus.
    ///
    /// Receives only events published after the call; use
    /// [`Supervisor::list_runtimes`] to reconstruct current state.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Launches a runtime of the given kind for a target path, or attaches
    /// to an existing live instance (see [`RuntimeKind::is_singleton`]).
    pub async fn launch(
        &self,
        kind: RuntimeKind,
        target: impl Into<PathBuf>,
        opts: LaunchOptions,
    ) -> Result<RuntimeId, LaunchError> {
        self.registry.launch(kind, target.into(), opts).await
    }

    /// Starts a Python kernel for a venv.
    ///
    /// With `force_new = false` this idempotently attaches to an existing
    /// live kernel for the same venv instead of spawning a second one.
    pub async fn start_python(
        &self,
        venv: impl Into<PathBuf>,
        force_new: bool,
    ) -> Result<RuntimeId, LaunchError> {
        self.launch(
            RuntimeKind::PythonKernel,
            venv,
            LaunchOptions {
                force_new,
                ..Default::default()
            },
        )
        .await
    }

    /// Starts a Python kernel for a project, resolving the venv through the
    /// given discovery source (best candidate first).
    pub async fn start_python_for_project(
        &self,
        project: &Path,
        venvs: &dyn VenvDiscovery,
        force_new: bool,
    ) -> Result<RuntimeId, LaunchError> {
        let candidates = venvs
            .interpreters(project)
            .await
            .map_err(|source| LaunchError::Discovery { source })?;
        let venv = candidates
            .iter()
            .find_map(|interp| interpreter_venv(interp))
            .ok_or_else(|| LaunchError::NotFound {
                path: project.to_path_buf(),
            })?;
        self.start_python(venv, force_new).await
    }

    /// Starts (or attaches to) the document-sync server for a project.
    pub async fn start_sync_server(
        &self,
        project: impl Into<PathBuf>,
    ) -> Result<RuntimeId, LaunchError> {
        self.launch(RuntimeKind::SyncServer, project, LaunchOptions::default())
            .await
    }

    /// Starts (or attaches to) the filesystem monitor for a project.
    pub async fn start_monitor(
        &self,
        project: impl Into<PathBuf>,
    ) -> Result<RuntimeId, LaunchError> {
        self.launch(RuntimeKind::Monitor, project, LaunchOptions::default())
            .await
    }

    /// Snapshots of all known instances, ordered by start time ascending.
    pub async fn list_runtimes(&self) -> Vec<RuntimeInstance> {
        self.registry.list().await
    }

    /// Snapshot of one instance.
    pub async fn attach_runtime(&self, id: RuntimeId) -> Result<RuntimeInstance, CommandError> {
        self.registry
            .get(id)
            .await
            .ok_or(CommandError::NotFound { id })
    }

    /// Requests termination of one instance and returns immediately.
    ///
    /// Idempotent: killing an already-terminal instance is a no-op
    /// success. The resulting `RuntimeExited` (`reason = killed`) arrives
    /// via the bus.
    pub async fn kill_runtime(&self, id: RuntimeId) -> Result<(), CommandError> {
        self.registry.request_kill(id).await
    }

    /// Removes a terminal instance from the registry.
    ///
    /// Its terminal event was already delivered, so subscribers observed
    /// the death before the id stops resolving.
    pub async fn evict_runtime(&self, id: RuntimeId) -> Result<(), CommandError> {
        self.registry.evict(id).await
    }

    /// Kills all live runtimes and waits up to [`Config::grace`] for their
    /// terminal transitions.
    ///
    /// Publishes `ShutdownRequested` first and `AllStoppedWithin` or
    /// `GraceExceeded` with the outcome.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        let joins = self.registry.begin_shutdown().await;
        let grace = self.cfg.grace;

        match time::timeout(grace, futures::future::join_all(joins)).await {
            Ok(_) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_) => {
                let stuck = self.registry.live_ids().await;
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Runs until the process receives a termination signal, then tears
    /// all runtimes down.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        if let Err(e) = shutdown::wait_for_shutdown_signal().await {
            warn!(error = %e, "signal listener failed, shutting down");
        }
        self.shutdown().await
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    pub(crate) fn spawn_fanout_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "fan-out listener lagged, events skipped");
                    }
                }
            }
        });
    }

    /// Token cancelled when shutdown begins; cancels every per-instance
    /// kill token with it.
    pub fn runtime_token(&self) -> &CancellationToken {
        &self.registry.runtime_token
    }
}

/// Maps a candidate interpreter path back to its venv root
/// (`<venv>/bin/python` → `<venv>`).
fn interpreter_venv(interpreter: &Path) -> Option<PathBuf> {
    interpreter.parent()?.parent().map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreter_maps_back_to_venv_root() {
        assert_eq!(
            interpreter_venv(Path::new("/p/.venv/bin/python")),
            Some(PathBuf::from("/p/.venv"))
        );
        assert_eq!(interpreter_venv(Path::new("python")), None);
    }
}
