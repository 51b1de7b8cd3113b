//! Supervision core: registry, launcher, watchers, and the command surface.

mod builder;
mod launcher;
mod registry;
mod shutdown;
mod supervisor;
mod watcher;

pub use builder::SupervisorBuilder;
pub use supervisor::Supervisor;
