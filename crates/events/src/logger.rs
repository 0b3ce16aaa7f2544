//! Event logging service.
//!
//! [`EventLogger`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! writes every received [`StudioEvent`] to the tracing log. It runs as a
//! long-lived background task and stops when the bus is dropped or the
//! cancellation token fires.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::bus::{EventKind, StudioEvent};

/// Background service that logs studio events.
pub struct EventLogger;

impl EventLogger {
    /// Run the logging loop, returning the number of events logged.
    pub async fn run(
        mut receiver: broadcast::Receiver<StudioEvent>,
        cancel: CancellationToken,
    ) -> u64 {
        let mut logged = 0u64;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(logged, "Event logger cancelled");
                    break;
                }
                received = receiver.recv() => match received {
                    Ok(event) => {
                        Self::log(&event);
                        logged += 1;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Event logger lagged, some events were not logged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!(logged, "Event bus closed, logger shutting down");
                        break;
                    }
                }
            }
        }
        logged
    }

    fn log(event: &StudioEvent) {
        let event_type = event.event_type();
        match &event.event {
            EventKind::JobStatusChanged {
                job_id,
                kind,
                status,
            } => {
                tracing::info!(event_type, job_id = %job_id, ?kind, status = %status, "Job status changed");
            }
            EventKind::StaleCompletionIgnored {
                job_id,
                active_job_id,
            } => {
                tracing::info!(event_type, job_id = %job_id, ?active_job_id, "Stale completion ignored");
            }
            EventKind::HistoryReplayed { job_id } => {
                tracing::info!(event_type, job_id = %job_id, "History entry replayed");
            }
            EventKind::ConversationUpdated {
                conversation_id,
                message_count,
            } => {
                tracing::info!(event_type, conversation_id = %conversation_id, message_count, "Conversation updated");
            }
            EventKind::TicketSubmitted {
                ticket_id,
                severity,
                sla_minutes,
            } => {
                tracing::info!(event_type, ticket_id = %ticket_id, severity = severity.as_str(), sla_minutes, "Ticket submitted");
            }
            EventKind::PersistenceFailed { store, error } => {
                tracing::warn!(event_type, store = %store, error = %error, "Persisting store failed");
            }
        }
    }
}
