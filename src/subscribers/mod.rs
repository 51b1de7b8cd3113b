//! Event subscribers: the fan-out side of the lifecycle bus.
//!
//! ## Architecture
//! ```text
//! Registry/watchers ── publish(Event) ──► Bus ──► supervisor listener
//!                                                       │
//!                                               SubscriberSet::emit()
//!                                          ┌─────────┬─────────┐
//!                                          ▼         ▼         ▼
//!                                     [queue S1] [queue S2] [queue SN]
//!                                          ▼         ▼         ▼
//!                                     worker S1  worker S2  worker SN
//!                                          ▼         ▼         ▼
//!                                      on_event   on_event  on_event
//! ```
//!
//! ## Contents
//! - [`Subscribe`] — the subscriber contract
//! - [`SubscriberSet`] — bounded, panic-isolated fan-out
//! - [`LogWriter`] — stdout demo subscriber

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
