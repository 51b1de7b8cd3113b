//! # Process launcher: attach-or-create semantics over the registry.
//!
//! `launch` turns a `(kind, target)` request into either the id of an
//! existing live instance (idempotent attach) or a freshly spawned child:
//!
//! ```text
//! launch(kind, target, opts)
//!   ├─► live (kind, target) match?  ──► yes: return existing id
//!   ├─► resolve invocation (program, args, cwd, env)
//!   ├─► spawn child (tokio::process)
//!   ├─► arm exit watcher                     ◄─ before returning
//!   ├─► register instance in `Starting`
//!   └─► publish RuntimeStarted
//! ```
//!
//! ## Rules
//! - The registry write guard is held across the duplicate check, the
//!   spawn, and the insert: two concurrent launches can never both spawn a
//!   singleton, and an exit observation serializes behind the insert.
//! - The watcher is armed before `launch` returns, so a crash in the
//!   window between spawn and caller acknowledgment is never missed.
//! - `launch` never blocks on readiness; `Starting → Running` is observed
//!   asynchronously by the watcher.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info};

use crate::core::registry::{Handle, Registry};
use crate::core::watcher;
use crate::error::LaunchError;
use crate::events::{Event, EventKind};
use crate::runtimes::{self, LaunchOptions, RuntimeId, RuntimeInstance, RuntimeKind, RuntimeStatus};

impl Registry {
    /// Launches a runtime or attaches to an existing live one.
    ///
    /// Singleton kinds always attach when a live instance serves the same
    /// target; Python kernels attach unless `opts.force_new`.
    pub(crate) async fn launch(
        self: &Arc<Self>,
        kind: RuntimeKind,
        target: PathBuf,
        opts: LaunchOptions,
    ) -> Result<RuntimeId, LaunchError> {
        let mut table = self.table.write().await;

        if kind.is_singleton() || !opts.force_new {
            if let Some(existing) = table.values().find(|h| {
                h.instance.kind == kind
                    && h.instance.target == target
                    && h.instance.status.is_live()
            }) {
                debug!(runtime = %existing.instance.id, kind = %kind, "attaching to existing runtime");
                return Ok(existing.instance.id);
            }
        }

        let invocation = runtimes::resolve(&self.cfg, kind, &target, &opts);
        let child = invocation.spawn()?;
        let pid = child.id().ok_or_else(|| LaunchError::Spawn {
            source: io::Error::other("child exited before its pid could be read"),
        })?;

        let id = RuntimeId::new();
        let instance = RuntimeInstance {
            id,
            kind,
            target: target.clone(),
            pid,
            started_at: SystemTime::now(),
            status: RuntimeStatus::Starting,
            last_exit: None,
        };

        let kill = self.runtime_token.child_token();
        let watcher = watcher::spawn_watcher(
            Arc::clone(self),
            child,
            id,
            kill.clone(),
            self.cfg.ready_after(kind),
            self.cfg.kill_grace,
        );

        info!(runtime = %id, kind = %kind, target = %target.display(), pid, "runtime launched");
        table.insert(
            id,
            Handle {
                instance,
                kill,
                watcher: Some(watcher),
            },
        );

        self.bus.publish(
            Event::new(EventKind::RuntimeStarted)
                .with_runtime(id)
                .with_runtime_kind(kind)
                .with_target(target.display().to_string())
                .with_pid(pid),
        );
        Ok(id)
    }
}
