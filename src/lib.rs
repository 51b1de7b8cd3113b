//! # procvisor
//!
//! **Procvisor** supervises the background runtimes a desktop editor
//! depends on: Python compute kernels, a document-sync server, and a
//! filesystem monitor. It launches them as child processes, tracks their
//! liveness, classifies how they die, and broadcasts every lifecycle
//! transition to subscribers.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   start_python(venv)   start_sync_server(proj)   start_monitor(proj)
//!          │                      │                       │
//!          ▼                      ▼                       ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (command surface)                                     │
//! │  - Bus (broadcast events)                                         │
//! │  - Registry (instances by id, attach-or-create launch)            │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!   │   watcher    │   │   watcher    │   │   watcher    │
//!   │ (owns Child) │   │ (owns Child) │   │ (owns Child) │
//!   └┬─────────────┘   └┬─────────────┘   └┬─────────────┘
//!    │ Publishes        │ Publishes        │ Publishes
//!    │ - RuntimeStarted │ - RuntimeReady   │ - RuntimeStarted
//!    │ - RuntimeExited  │ - RuntimeDied    │ - ...
//!    ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                      Bus (broadcast channel)                      │
//! │                  (capacity: Config::bus_capacity)                 │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │   fan-out listener     │
//!                       │    (in Supervisor)     │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                       ┌─────────┬─────────┐
//!                       ▼         ▼         ▼
//!                     worker1  worker2   workerN
//!                       ▼         ▼         ▼
//!                    sub1.on   sub2.on   subN.on
//!                    _event()  _event()  _event()
//! ```
//!
//! ### Lifecycle
//! ```text
//! launch(kind, target) ──► Registry ──► spawn child ──► watcher
//!
//! Starting ──(ready window elapses)──► Running
//!     │                                   │
//!     │ kill_runtime / shutdown           │ kill_runtime / shutdown
//!     ▼                                   ▼
//!  Exiting ──(SIGTERM, then SIGKILL after kill_grace)──┐
//!     │                                                │
//!     │ child.wait() resolves                          │
//!     ▼                                                ▼
//!  classify(code, signal, requested):
//!     ├─ requested            ─► Exited  + RuntimeExited{ reason: killed }
//!     ├─ code 0, no signal    ─► Exited  + RuntimeExited{ reason: clean }
//!     └─ anything else        ─► Crashed + RuntimeDied{ code, signal }
//!
//! Terminal instances stay listed (with last_exit) until evict_runtime().
//! The terminal event is published before evict can observe the death.
//! ```
//!
//! ## Features
//! | Area              | Description                                                          | Key types / traits                        |
//! |-------------------|----------------------------------------------------------------------|-------------------------------------------|
//! | **Supervision**   | Launch, attach, kill, and evict editor runtimes.                     | [`Supervisor`], [`RuntimeKind`]           |
//! | **Registry**      | Instance snapshots with live/terminal state and exit details.        | [`RuntimeInstance`], [`RuntimeStatus`]    |
//! | **Classification**| Decide clean exit vs. requested kill vs. crash.                      | [`CrashReason`], [`classify`]             |
//! | **Subscriber API**| Hook into lifecycle events (logging, UI badges, custom subscribers). | [`Subscribe`], [`Event`], [`EventKind`]   |
//! | **Discovery**     | Pluggable venv interpreter and project file discovery.               | [`VenvDiscovery`], [`FileScan`]           |
//! | **Errors**        | Typed errors for launch, commands, and teardown.                     | [`LaunchError`], [`CommandError`]         |
//! | **Configuration** | Centralize grace periods, program specs, and bus capacity.           | [`Config`], [`ProgramSpec`]               |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use procvisor::{Config, LogWriter, Subscribe, Supervisor};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
//!
//!     let sup = Supervisor::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let kernel = sup.start_python("/work/project/.venv", false).await?;
//!     let state = sup.attach_runtime(kernel).await?;
//!     println!("kernel {} pid {}", state.id, state.pid);
//!
//!     // Blocks until SIGINT/SIGTERM, then kills everything within grace.
//!     sup.run_until_signal().await?;
//!     Ok(())
//! }
//! ```

mod classify;
mod config;
mod core;
mod discovery;
mod error;
mod events;
mod runtimes;
mod subscribers;

// ---- Public re-exports ----

pub use classify::{CrashReason, ExitObservation, classify};
pub use config::{Config, ProgramSpec};
pub use core::{Supervisor, SupervisorBuilder};
pub use discovery::{FileScan, VenvDiscovery};
pub use error::{CommandError, LaunchError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use runtimes::{
    ExitInfo, LaunchOptions, RuntimeId, RuntimeInstance, RuntimeKind, RuntimeStatus,
};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
