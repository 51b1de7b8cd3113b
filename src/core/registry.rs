//! # Runtime registry: the authoritative table of supervised instances.
//!
//! The registry owns every [`RuntimeInstance`] together with its kill token
//! and the join handle of its exit watcher. It is the sole writer of
//! instance state; consumers get value snapshots via [`Registry::get`] and
//! [`Registry::list`].
//!
//! ## Rules
//! - All mutations go through one `RwLock` write guard; a concurrent exit
//!   observation can never race a launch or kill for the same id.
//! - Terminal states (`Exited`/`Crashed`) are write-once. The transition
//!   into a terminal state publishes `RuntimeExited`/`RuntimeDied` on the
//!   bus **before** the mutating call returns — no state transition is ever
//!   silently un-notified.
//! - Exit observations for unknown or already-terminal ids are idempotent:
//!   logged, not re-emitted.
//! - Eviction removes only terminal instances, so the terminal event always
//!   happens-before the instance disappears from `list()`.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::classify::{ExitObservation, classify};
use crate::config::Config;
use crate::error::CommandError;
use crate::events::{Bus, Event, EventKind};
use crate::runtimes::{ExitInfo, RuntimeId, RuntimeInstance, RuntimeStatus};

/// Handle to one supervised child: snapshot state plus control primitives.
pub(crate) struct Handle {
    /// Current instance state; mutated only under the registry write guard.
    pub(crate) instance: RuntimeInstance,
    /// Per-instance kill request token (child of the runtime token).
    pub(crate) kill: CancellationToken,
    /// Join handle of the exit watcher, taken at shutdown.
    pub(crate) watcher: Option<JoinHandle<()>>,
}

/// Table of supervised runtime instances, owned by the supervisor.
pub(crate) struct Registry {
    pub(crate) cfg: Arc<Config>,
    pub(crate) bus: Bus,
    pub(crate) runtime_token: CancellationToken,
    pub(crate) table: RwLock<HashMap<RuntimeId, Handle>>,
}

impl Registry {
    pub(crate) fn new(cfg: Arc<Config>, bus: Bus, runtime_token: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            cfg,
            bus,
            runtime_token,
            table: RwLock::new(HashMap::new()),
        })
    }

    /// Returns a snapshot of one instance.
    pub(crate) async fn get(&self, id: RuntimeId) -> Option<RuntimeInstance> {
        self.table.read().await.get(&id).map(|h| h.instance.clone())
    }

    /// Returns snapshots of all instances, ordered by `started_at`
    /// ascending (ties broken by id for determinism).
    pub(crate) async fn list(&self) -> Vec<RuntimeInstance> {
        let table = self.table.read().await;
        let mut all: Vec<RuntimeInstance> = table.values().map(|h| h.instance.clone()).collect();
        all.sort_unstable_by(|a, b| (a.started_at, a.id).cmp(&(b.started_at, b.id)));
        all
    }

    /// Ids of instances that have not reached a terminal state.
    pub(crate) async fn live_ids(&self) -> Vec<RuntimeId> {
        let table = self.table.read().await;
        let mut ids: Vec<RuntimeId> = table
            .values()
            .filter(|h| h.instance.status.is_live())
            .map(|h| h.instance.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// `Starting → Running` once the readiness window elapsed.
    ///
    /// A no-op for instances that were killed or terminated in the
    /// meantime — status never moves backwards.
    pub(crate) async fn mark_running(&self, id: RuntimeId) {
        let mut table = self.table.write().await;
        let Some(handle) = table.get_mut(&id) else {
            return;
        };
        if handle.instance.status != RuntimeStatus::Starting {
            return;
        }
        handle.instance.status = RuntimeStatus::Running;
        debug!(runtime = %id, kind = %handle.instance.kind, "runtime ready");
        self.bus.publish(
            Event::new(EventKind::RuntimeReady)
                .with_runtime(id)
                .with_runtime_kind(handle.instance.kind)
                .with_target(handle.instance.target.display().to_string())
                .with_pid(handle.instance.pid),
        );
    }

    /// Records one observed termination: classifies it, moves the instance
    /// into its terminal state, and publishes the terminal event before
    /// returning.
    ///
    /// Idempotent: observations for unknown or already-terminal ids are
    /// logged and dropped, never re-emitted.
    pub(crate) async fn observe_exit(&self, id: RuntimeId, obs: ExitObservation) {
        let mut table = self.table.write().await;
        let Some(handle) = table.get_mut(&id) else {
            debug!(runtime = %id, "exit observed for unknown runtime, ignoring");
            return;
        };
        if handle.instance.status.is_terminal() {
            debug!(runtime = %id, "duplicate exit observation, ignoring");
            return;
        }

        let reason = classify(&obs);
        let exit = ExitInfo {
            code: obs.code,
            signal: obs.signal,
            at: obs.at,
        };
        handle.instance.status = reason.terminal_status();
        handle.instance.last_exit = Some(exit);

        let kind = if reason.is_crash() {
            warn!(
                runtime = %id,
                kind = %handle.instance.kind,
                target = %handle.instance.target.display(),
                code = ?obs.code,
                signal = ?obs.signal,
                "runtime crashed"
            );
            EventKind::RuntimeDied
        } else {
            debug!(runtime = %id, reason = %reason, "runtime exited");
            EventKind::RuntimeExited
        };

        // Published while the write guard is held: the terminal event is on
        // the bus before any later mutation (eviction included) can run.
        self.bus.publish(
            Event::new(kind)
                .with_runtime(id)
                .with_runtime_kind(handle.instance.kind)
                .with_target(handle.instance.target.display().to_string())
                .with_pid(handle.instance.pid)
                .with_exit(&exit)
                .with_reason(reason),
        );
    }

    /// Requests termination of one instance and returns immediately.
    ///
    /// Idempotent: killing an already-terminal instance is a no-op
    /// success. The actual `Exited` transition arrives via the bus once the
    /// watcher observes the exit.
    pub(crate) async fn request_kill(&self, id: RuntimeId) -> Result<(), CommandError> {
        let mut table = self.table.write().await;
        let Some(handle) = table.get_mut(&id) else {
            return Err(CommandError::NotFound { id });
        };
        if handle.instance.status.is_terminal() {
            return Ok(());
        }
        debug!(runtime = %id, "kill requested");
        handle.instance.status = RuntimeStatus::Exiting;
        handle.kill.cancel();
        Ok(())
    }

    /// Removes a terminal instance from the table.
    ///
    /// The terminal event was published under the same lock discipline, so
    /// every subscriber observes the death before the id stops resolving.
    pub(crate) async fn evict(&self, id: RuntimeId) -> Result<(), CommandError> {
        let mut table = self.table.write().await;
        let Some(handle) = table.get(&id) else {
            return Err(CommandError::NotFound { id });
        };
        if handle.instance.status.is_live() {
            return Err(CommandError::NotTerminal { id });
        }
        table.remove(&id);
        debug!(runtime = %id, "runtime evicted");
        Ok(())
    }

    /// Requests termination of every live instance and hands back the
    /// watcher join handles for the shutdown driver to await.
    pub(crate) async fn begin_shutdown(&self) -> Vec<JoinHandle<()>> {
        let mut table = self.table.write().await;
        let mut joins = Vec::new();
        for handle in table.values_mut() {
            if handle.instance.status.is_live() {
                handle.instance.status = RuntimeStatus::Exiting;
                handle.kill.cancel();
            }
            if let Some(join) = handle.watcher.take() {
                joins.push(join);
            }
        }
        joins
    }

    #[cfg(test)]
    pub(crate) async fn insert_for_test(&self, instance: RuntimeInstance) {
        let kill = self.runtime_token.child_token();
        self.table.write().await.insert(
            instance.id,
            Handle {
                instance,
                kill,
                watcher: None,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    use crate::runtimes::RuntimeKind;

    fn registry() -> Arc<Registry> {
        Registry::new(
            Arc::new(Config::default()),
            Bus::new(64),
            CancellationToken::new(),
        )
    }

    fn instance(kind: RuntimeKind, started_at: SystemTime) -> RuntimeInstance {
        RuntimeInstance {
            id: RuntimeId::new(),
            kind,
            target: PathBuf::from("/proj"),
            pid: 100,
            started_at,
            status: RuntimeStatus::Starting,
            last_exit: None,
        }
    }

    fn crash_obs() -> ExitObservation {
        ExitObservation {
            code: Some(3),
            signal: None,
            requested: false,
            at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn terminal_transition_publishes_before_returning() {
        let reg = registry();
        let mut rx = reg.bus.subscribe();
        let inst = instance(RuntimeKind::SyncServer, SystemTime::now());
        let id = inst.id;
        reg.insert_for_test(inst).await;

        reg.observe_exit(id, crash_obs()).await;

        // No awaiting needed: the event is already in the channel.
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::RuntimeDied);
        assert_eq!(ev.runtime, Some(id));
        assert_eq!(ev.target.as_deref(), Some("/proj"));
        assert_eq!(ev.exit_code, Some(3));

        let snap = reg.get(id).await.unwrap();
        assert_eq!(snap.status, RuntimeStatus::Crashed);
        assert_eq!(snap.last_exit.unwrap().code, Some(3));
    }

    #[tokio::test]
    async fn terminal_state_is_write_once() {
        let reg = registry();
        let mut rx = reg.bus.subscribe();
        let inst = instance(RuntimeKind::Monitor, SystemTime::now());
        let id = inst.id;
        reg.insert_for_test(inst).await;

        reg.observe_exit(id, crash_obs()).await;
        // Detector invoked twice: second observation is dropped.
        reg.observe_exit(
            id,
            ExitObservation {
                code: Some(0),
                signal: None,
                requested: false,
                at: SystemTime::now(),
            },
        )
        .await;

        assert_eq!(rx.try_recv().unwrap().kind, EventKind::RuntimeDied);
        assert!(rx.try_recv().is_err(), "exactly one terminal event");
        assert_eq!(
            reg.get(id).await.unwrap().status,
            RuntimeStatus::Crashed,
            "terminal state never overwritten"
        );
    }

    #[tokio::test]
    async fn exit_for_unknown_runtime_is_ignored() {
        let reg = registry();
        let mut rx = reg.bus.subscribe();
        reg.observe_exit(RuntimeId::new(), crash_obs()).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn list_is_ordered_by_start_time() {
        let reg = registry();
        let base = SystemTime::now();
        let c = instance(RuntimeKind::Monitor, base + Duration::from_secs(2));
        let a = instance(RuntimeKind::SyncServer, base);
        let b = instance(RuntimeKind::PythonKernel, base + Duration::from_secs(1));
        let (ida, idb, idc) = (a.id, b.id, c.id);
        reg.insert_for_test(c).await;
        reg.insert_for_test(a).await;
        reg.insert_for_test(b).await;

        let ids: Vec<RuntimeId> = reg.list().await.into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![ida, idb, idc]);
    }

    #[tokio::test]
    async fn kill_is_idempotent_on_terminal_instances() {
        let reg = registry();
        let inst = instance(RuntimeKind::SyncServer, SystemTime::now());
        let id = inst.id;
        reg.insert_for_test(inst).await;
        reg.observe_exit(id, crash_obs()).await;

        assert!(reg.request_kill(id).await.is_ok());
        assert!(matches!(
            reg.request_kill(RuntimeId::new()).await,
            Err(CommandError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn kill_marks_live_instance_exiting() {
        let reg = registry();
        let inst = instance(RuntimeKind::SyncServer, SystemTime::now());
        let id = inst.id;
        reg.insert_for_test(inst).await;

        reg.request_kill(id).await.unwrap();
        assert_eq!(reg.get(id).await.unwrap().status, RuntimeStatus::Exiting);
    }

    #[tokio::test]
    async fn evict_rejects_live_instances() {
        let reg = registry();
        let inst = instance(RuntimeKind::Monitor, SystemTime::now());
        let id = inst.id;
        reg.insert_for_test(inst).await;

        assert!(matches!(
            reg.evict(id).await,
            Err(CommandError::NotTerminal { .. })
        ));

        reg.observe_exit(id, crash_obs()).await;
        reg.evict(id).await.unwrap();
        assert!(reg.get(id).await.is_none());
        assert!(matches!(
            reg.evict(id).await,
            Err(CommandError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn mark_running_only_moves_forward() {
        let reg = registry();
        let inst = instance(RuntimeKind::PythonKernel, SystemTime::now());
        let id = inst.id;
        reg.insert_for_test(inst).await;

        reg.mark_running(id).await;
        assert_eq!(reg.get(id).await.unwrap().status, RuntimeStatus::Running);

        reg.observe_exit(id, crash_obs()).await;
        reg.mark_running(id).await;
        assert_eq!(
            reg.get(id).await.unwrap().status,
            RuntimeStatus::Crashed,
            "readiness never resurrects a terminal instance"
        );
    }
}
