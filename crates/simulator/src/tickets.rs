//! Ticket desk: AI-suggested drafts, the inbox and each ticket's
//! "Ask AI" chat.

use std::collections::HashMap;
use std::sync::Arc;

use meranti_core::chat::{Answer, ChatMessage, KnowledgeDomain};
use meranti_core::error::CoreError;
use meranti_core::ticket::{
    filter_tickets, ticket_question, Ticket, TicketDraft, TICKET_CHAT_GREETING,
};
use meranti_core::types::EntityId;
use meranti_events::bus::{EventBus, EventKind};
use tokio::sync::Mutex;

use crate::backend::{AnswerMode, GenerationBackend};
use crate::error::StudioError;
use crate::history::History;

#[derive(Debug, Default)]
struct DeskState {
    tickets: History<Ticket>,
    /// Detail-view chat per ticket, opened with a greeting on submit.
    threads: HashMap<EntityId, Vec<ChatMessage>>,
}

pub struct TicketDesk {
    backend: Arc<dyn GenerationBackend>,
    bus: Arc<EventBus>,
    state: Mutex<DeskState>,
}

impl TicketDesk {
    pub fn new(backend: Arc<dyn GenerationBackend>, bus: Arc<EventBus>) -> Self {
        Self {
            backend,
            bus,
            state: Mutex::new(DeskState::default()),
        }
    }

    /// Ask the backend for a summary and apply it to a copy of `draft`.
    pub async fn suggest(&self, draft: &TicketDraft) -> Result<TicketDraft, StudioError> {
        let summary = self.backend.suggest_ticket(draft).await?;
        let mut suggested = draft.clone();
        suggested.apply_suggestion(&summary);
        Ok(suggested)
    }

    /// Submit a draft. The new ticket goes to the top of the list.
    pub async fn submit(&self, draft: &TicketDraft) -> Result<Ticket, StudioError> {
        let mut ticket = Ticket::from_draft(draft)?;
        let mut state = self.state.lock().await;
        while state.tickets.contains(&ticket.id) {
            ticket = Ticket::from_draft(draft)?;
        }
        state.tickets.append(ticket.clone())?;
        state.threads.insert(
            ticket.id.clone(),
            vec![ChatMessage::assistant_text(TICKET_CHAT_GREETING)],
        );

        tracing::info!(ticket_id = %ticket.id, severity = %ticket.severity, "Ticket submitted");
        self.bus.emit(EventKind::TicketSubmitted {
            ticket_id: ticket.id.clone(),
            severity: ticket.severity,
            sla_minutes: ticket.sla_minutes,
        });
        Ok(ticket)
    }

    /// Submitted tickets, most recent first.
    pub async fn tickets(&self) -> Vec<Ticket> {
        self.state.lock().await.tickets.entries().to_vec()
    }

    /// Inbox search by title, case-insensitive.
    pub async fn search(&self, query: &str) -> Vec<Ticket> {
        let state = self.state.lock().await;
        filter_tickets(state.tickets.entries(), query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// The detail-view chat of a ticket.
    pub async fn thread(&self, ticket_id: &str) -> Option<Vec<ChatMessage>> {
        self.state.lock().await.threads.get(ticket_id).cloned()
    }

    /// Ask AI about a ticket. A blank question asks the default one.
    pub async fn ask_ai(&self, ticket_id: &str, question: &str) -> Result<Answer, StudioError> {
        let question = ticket_question(question).to_string();
        {
            let mut state = self.state.lock().await;
            let thread = state
                .threads
                .get_mut(ticket_id)
                .ok_or_else(|| ticket_not_found(ticket_id))?;
            thread.push(ChatMessage::user(&question));
        }

        let answer = self
            .backend
            .answer(AnswerMode::Ticket, &question, KnowledgeDomain::Net)
            .await?;

        let mut state = self.state.lock().await;
        let thread = state
            .threads
            .get_mut(ticket_id)
            .ok_or_else(|| ticket_not_found(ticket_id))?;
        thread.push(ChatMessage::assistant(&answer));
        tracing::info!(ticket_id, question = %question, "Ticket AI answer delivered");
        Ok(answer)
    }
}

fn ticket_not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Ticket",
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use meranti_core::chat::Role;
    use meranti_core::ticket::{
        Severity, SUGGESTED_SUMMARY, SUGGESTED_TITLE, TICKET_DEFAULT_QUESTION,
    };

    use super::*;
    use crate::backend::MockBackend;

    fn desk() -> TicketDesk {
        TicketDesk::new(Arc::new(MockBackend::default()), Arc::new(EventBus::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn suggest_fills_blank_title_and_summary() {
        let draft = desk().suggest(&TicketDraft::default()).await.unwrap();
        assert_eq!(draft.title, SUGGESTED_TITLE);
        assert_eq!(draft.description, SUGGESTED_SUMMARY);
    }

    #[tokio::test(start_paused = true)]
    async fn suggest_keeps_existing_title() {
        let draft = TicketDraft {
            title: "Packet loss Surabaya".into(),
            ..TicketDraft::default()
        };
        let draft = desk().suggest(&draft).await.unwrap();
        assert_eq!(draft.title, "Packet loss Surabaya");
    }

    #[tokio::test]
    async fn submitted_tickets_are_most_recent_first() {
        let desk = desk();
        let bus_rx = desk.bus.subscribe();
        let first = desk
            .submit(&TicketDraft {
                title: "A".into(),
                severity: "P1".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        let second = desk.submit(&TicketDraft::default()).await.unwrap();

        assert_eq!(first.sla_minutes, 30);
        assert_eq!(second.severity, Severity::P3);
        assert_eq!(second.title, "Untitled");
        let ids: Vec<_> = desk.tickets().await.into_iter().map(|t| t.id).collect();
        assert_eq!(ids, [second.id, first.id]);
        assert_eq!(bus_rx.len(), 2);
    }

    #[tokio::test]
    async fn search_filters_by_title() {
        let desk = desk();
        for title in ["DNS latency spike in Jakarta", "Laptop request for new hire"] {
            desk.submit(&TicketDraft {
                title: title.into(),
                ..TicketDraft::default()
            })
            .await
            .unwrap();
        }
        let hits = desk.search("LAPTOP").await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Laptop request for new hire");
        assert_eq!(desk.search("").await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_ask_ai_uses_default_question_after_delay() {
        let desk = desk();
        let ticket = desk.submit(&TicketDraft::default()).await.unwrap();

        let start = tokio::time::Instant::now();
        let answer = desk.ask_ai(&ticket.id, "  ").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(800));
        assert_eq!(answer.confidence, 0.86);

        let thread = desk.thread(&ticket.id).await.unwrap();
        assert_eq!(thread.len(), 3);
        assert_eq!(thread[0].content, TICKET_CHAT_GREETING);
        assert_eq!(thread[1].role, Role::User);
        assert_eq!(thread[1].content, TICKET_DEFAULT_QUESTION);
        assert_eq!(thread[2].role, Role::Assistant);
        let cites: Vec<_> = thread[2].citations.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(cites, ["SOP-DNS-001", "KB-OPS-1012"]);
    }

    #[tokio::test]
    async fn ask_ai_on_unknown_ticket_is_not_found() {
        assert_matches!(
            desk().ask_ai("TK-2026-00000", "why?").await,
            Err(StudioError::Core(CoreError::NotFound { entity: "Ticket", .. }))
        );
    }

    #[tokio::test]
    async fn invalid_severity_rejected() {
        let draft = TicketDraft {
            severity: "P9".into(),
            ..TicketDraft::default()
        };
        assert_matches!(
            desk().submit(&draft).await,
            Err(StudioError::Core(CoreError::InvalidField { .. }))
        );
    }
}
