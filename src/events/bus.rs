//! # Event bus: single producer side, broadcast delivery.
//!
//! [`Bus`] is a thin wrapper over [`tokio::sync::broadcast`]. The registry
//! and watchers publish into it; the supervisor's listener fans events out
//! to user subscribers, and the consuming surface may tap it directly via
//! [`Supervisor::subscribe`](crate::Supervisor::subscribe).
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event
//!   is dropped.
//! - The ring buffer is bounded; receivers that fall behind observe
//!   `RecvError::Lagged(n)` on their next `recv()` and skip `n` items.
//! - Delivery is FIFO per receiver, which (together with serialized
//!   registry mutations) gives the per-runtime `started → exited|died`
//!   ordering guarantee.
//! - Late subscribers receive only events published after they subscribe;
//!   current state is reconstructed via
//!   [`Supervisor::list_runtimes`](crate::Supervisor::list_runtimes).

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for lifecycle events.
///
/// Cheap to clone (holds an `Arc`-backed sender); every receiver gets its
/// own clone of each event.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given ring-buffer capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers. Never blocks.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver observing subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
