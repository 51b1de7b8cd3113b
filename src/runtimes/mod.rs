//! Runtime data model: kinds, instances, and child invocations.
//!
//! ## Contents
//! - [`RuntimeKind`] the three supervised runtime kinds and the singleton rule
//! - [`RuntimeId`], [`RuntimeStatus`], [`ExitInfo`], [`RuntimeInstance`]
//!   identity and state snapshots
//! - [`LaunchOptions`] caller-side launch knobs; invocation resolution is
//!   crate-internal

mod instance;
mod invocation;
mod kind;

pub use instance::{ExitInfo, RuntimeId, RuntimeInstance, RuntimeStatus};
pub use invocation::LaunchOptions;
pub use kind::RuntimeKind;

pub(crate) use invocation::resolve;
