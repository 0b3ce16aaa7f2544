//! Ticket drafts: severity, SLA windows and ticket ids.

use std::fmt;
use std::str::FromStr;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::chat::{Answer, Citation};
use crate::error::CoreError;
use crate::naming::short_token;
use crate::types::{EntityId, Timestamp};

/// Title used when a ticket is submitted without one.
pub const UNTITLED_TICKET: &str = "Untitled";

/// Title the AI suggestion fills in when the title is still blank.
pub const SUGGESTED_TITLE: &str = "DNS latency spike in Jakarta";

/// Summary the AI suggestion produces.
pub const SUGGESTED_SUMMARY: &str = "Auto-summary: DNS latency increased after resolver \
     threshold change. Suggested rollback + cache flush; validate P95 < 200ms.";

/// Question asked when "Ask AI" is sent with a blank box.
pub const TICKET_DEFAULT_QUESTION: &str = "DNS SERVFAIL in Jakarta: cause and quick fix?";

/// Assistant turn that opens every ticket's chat.
pub const TICKET_CHAT_GREETING: &str = "Hi, ask AI to analyze context or propose a quick fix.";

/// The question actually asked for the text typed into "Ask AI".
pub fn ticket_question(typed: &str) -> &str {
    let trimmed = typed.trim();
    if trimmed.is_empty() {
        TICKET_DEFAULT_QUESTION
    } else {
        trimmed
    }
}

/// Canned "Ask AI" answer in a ticket's detail view.
pub fn canned_ticket_answer() -> Answer {
    Answer {
        trace_id: "trace-tk-001".to_string(),
        text: "Root cause: upstream resolver threshold tightened, causing cache misses and \
               SERVFAIL.\n\nQuick fix:\n1) Roll back threshold to 60ms.\n2) Flush cache on \
               edge resolvers.\n3) Watch P95 latency < 200ms for 30 min.\n"
            .to_string(),
        citations: ["SOP-DNS-001", "KB-OPS-1012"]
            .into_iter()
            .map(|id| Citation {
                id: id.to_string(),
                title: String::new(),
                page: 1,
                score: 0.0,
            })
            .collect(),
        confidence: 0.86,
        latency_ms: 2200,
    }
}

/// Case-insensitive title search over an inbox.
///
/// An empty query returns every ticket.
pub fn filter_tickets<'a>(tickets: &'a [Ticket], query: &str) -> Vec<&'a Ticket> {
    let needle = query.to_lowercase();
    tickets
        .iter()
        .filter(|t| t.title.to_lowercase().contains(&needle))
        .collect()
}

/// Ticket severity, P1 being the most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    P1,
    P2,
    #[default]
    P3,
    P4,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
        }
    }

    /// Minutes until the SLA is breached.
    pub fn sla_minutes(&self) -> u32 {
        match self {
            Self::P1 => 30,
            Self::P2 => 120,
            Self::P3 => 360,
            Self::P4 => 1440,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    /// Case-insensitive; a blank string means the default (`P3`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "p3" => Ok(Self::P3),
            "p1" => Ok(Self::P1),
            "p2" => Ok(Self::P2),
            "p4" => Ok(Self::P4),
            other => Err(CoreError::invalid_field(
                "severity",
                format!("unknown severity '{other}', expected p1..p4"),
            )),
        }
    }
}

/// Form state of the create-ticket screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketDraft {
    pub title: String,
    pub severity: String,
    pub description: String,
}

impl TicketDraft {
    /// Apply an AI suggestion: replace the description, fill a blank title.
    pub fn apply_suggestion(&mut self, summary: &str) {
        self.description = summary.to_string();
        if self.title.trim().is_empty() {
            self.title = SUGGESTED_TITLE.to_string();
        }
    }
}

/// A submitted ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: EntityId,
    pub title: String,
    pub severity: Severity,
    pub status: String,
    pub queue: String,
    pub assignee: String,
    pub created_at: Timestamp,
    pub summary: String,
    pub sla_minutes: u32,
    pub channel: String,
}

impl Ticket {
    /// Submit a draft from the portal.
    pub fn from_draft(draft: &TicketDraft) -> Result<Self, CoreError> {
        let severity: Severity = draft.severity.parse()?;
        let created_at = chrono::Utc::now();
        let title = if draft.title.trim().is_empty() {
            UNTITLED_TICKET.to_string()
        } else {
            draft.title.clone()
        };
        Ok(Self {
            id: short_token(&format!("TK-{}", created_at.year())),
            title,
            severity,
            status: "Open".to_string(),
            queue: "Auto".to_string(),
            assignee: "Auto".to_string(),
            created_at,
            summary: draft.description.clone(),
            sla_minutes: severity.sla_minutes(),
            channel: "Portal".to_string(),
        })
    }
}
