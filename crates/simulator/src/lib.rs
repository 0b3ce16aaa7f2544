//! Mock generation simulator.
//!
//! Session controllers ([`studio::Studio`], [`qa::QaSession`],
//! [`tickets::TicketDesk`]) over a pluggable
//! [`backend::GenerationBackend`]. [`backend::MockBackend`] fakes all
//! generation with simulated latency and placeholder output.

pub mod backend;
pub mod conversation;
pub mod error;
pub mod history;
pub mod latency;
pub mod qa;
pub mod store;
pub mod studio;
pub mod tickets;

pub use backend::{AnswerMode, GenerationBackend, MockBackend};
pub use error::StudioError;
pub use qa::QaSession;
pub use studio::{JobHandle, Studio};
pub use tickets::TicketDesk;
