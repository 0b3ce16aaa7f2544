//! Studio event bus.
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`StudioEvent`] — envelope for every job, conversation and ticket
//!   change.
//! - [`EventLogger`] — background task that writes each event to the
//!   tracing log.

pub mod bus;
pub mod logger;

pub use bus::{EventBus, EventKind, StudioEvent};
pub use logger::EventLogger;
