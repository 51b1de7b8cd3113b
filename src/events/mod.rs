//! Lifecycle events: data model and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Registry` (terminal transitions, readiness),
//!   the launcher (`RuntimeStarted`), the supervisor (teardown events),
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the supervisor's fan-out listener, and any raw bus tap
//!   taken with [`Supervisor::subscribe`](crate::Supervisor::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
