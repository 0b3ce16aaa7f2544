//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the session
//! controllers and whatever observes them (the event logger, tests).

use chrono::{DateTime, Utc};
use meranti_core::job::{JobKind, JobStatus};
use meranti_core::ticket::Severity;
use meranti_core::types::EntityId;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A job changed status.
    JobStatusChanged {
        job_id: EntityId,
        kind: JobKind,
        status: JobStatus,
    },

    /// A job finished after another job had become active. The result was
    /// recorded in history but not shown.
    StaleCompletionIgnored {
        job_id: EntityId,
        active_job_id: Option<EntityId>,
    },

    /// A history entry was replayed into the form.
    HistoryReplayed { job_id: EntityId },

    /// A message was appended to a conversation.
    ConversationUpdated {
        conversation_id: EntityId,
        message_count: usize,
    },

    /// A ticket was submitted from the portal.
    TicketSubmitted {
        ticket_id: EntityId,
        severity: Severity,
        sla_minutes: u32,
    },

    /// Persisting a store failed; in-memory state is unaffected.
    PersistenceFailed { store: String, error: String },
}

impl EventKind {
    /// Dot-separated event name, e.g. `"job.status_changed"`.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::JobStatusChanged { .. } => "job.status_changed",
            Self::StaleCompletionIgnored { .. } => "job.stale_completion_ignored",
            Self::HistoryReplayed { .. } => "history.replayed",
            Self::ConversationUpdated { .. } => "conversation.updated",
            Self::TicketSubmitted { .. } => "ticket.submitted",
            Self::PersistenceFailed { .. } => "store.persistence_failed",
        }
    }
}

/// Timestamped event envelope.
#[derive(Debug, Clone, Serialize)]
pub struct StudioEvent {
    pub event: EventKind,
    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl StudioEvent {
    pub fn new(event: EventKind) -> Self {
        Self {
            event,
            timestamp: Utc::now(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use meranti_events::bus::{EventBus, EventKind, StudioEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(StudioEvent::new(EventKind::HistoryReplayed {
///     job_id: "JOB-10101".into(),
/// }));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<StudioEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: StudioEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Shorthand for publishing a bare [`EventKind`].
    pub fn emit(&self, event: EventKind) {
        self.publish(StudioEvent::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StudioEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
