//! Q&A conversation model and the canned assistant answers.

use serde::{Deserialize, Serialize};

use crate::naming::{opaque_id, truncate_chars};
use crate::types::{EntityId, Timestamp};

/// Title given to a conversation before its first question.
pub const NEW_CHAT_TITLE: &str = "New chat";

/// Title of a fresh ops chat.
pub const OPS_NEW_CHAT_TITLE: &str = "New conversation";

/// Assistant turn that opens every ops chat.
pub const OPS_GREETING: &str = "New chat started. Tell me your ops issue.";

/// A conversation title is the first question, cut to this many characters.
pub const TITLE_MAX_CHARS: usize = 40;

/// Knowledge base a conversation searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeDomain {
    Care,
    Mkt,
    Train,
    #[default]
    Net,
}

impl KnowledgeDomain {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Care => "Customer Care",
            Self::Mkt => "Marketing",
            Self::Train => "Training",
            Self::Net => "Network Tech",
        }
    }
}

/// Which portal a conversation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChatStyle {
    /// Knowledge-base Q&A: starts empty as "New chat".
    #[default]
    KnowledgeBase,
    /// Ops root-cause chat: starts as "New conversation" with a greeting.
    Ops,
}

impl ChatStyle {
    pub fn untitled(&self) -> &'static str {
        match self {
            Self::KnowledgeBase => NEW_CHAT_TITLE,
            Self::Ops => OPS_NEW_CHAT_TITLE,
        }
    }

    pub fn greeting(&self) -> Option<&'static str> {
        match self {
            Self::KnowledgeBase => None,
            Self::Ops => Some(OPS_GREETING),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A knowledge-base document cited by an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,
    pub title: String,
    pub page: u32,
    pub score: f64,
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: EntityId,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: opaque_id(),
            role: Role::User,
            content: content.into(),
            citations: Vec::new(),
            confidence: None,
            latency_ms: None,
            trace_id: None,
        }
    }

    /// A plain assistant turn without answer metadata.
    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            ..Self::user(content)
        }
    }

    /// The assistant turn carrying an [`Answer`].
    pub fn assistant(answer: &Answer) -> Self {
        Self {
            id: opaque_id(),
            role: Role::Assistant,
            content: answer.text.clone(),
            citations: answer.citations.clone(),
            confidence: Some(answer.confidence),
            latency_ms: Some(answer.latency_ms),
            trace_id: Some(answer.trace_id.clone()),
        }
    }
}

/// A titled thread of messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: EntityId,
    pub title: String,
    pub domain: KnowledgeDomain,
    pub created_at: Timestamp,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(domain: KnowledgeDomain) -> Self {
        Self::start(ChatStyle::KnowledgeBase, domain)
    }

    /// A fresh, untitled conversation in the given style.
    pub fn start(style: ChatStyle, domain: KnowledgeDomain) -> Self {
        Self {
            id: opaque_id(),
            title: style.untitled().to_string(),
            domain,
            created_at: chrono::Utc::now(),
            messages: style
                .greeting()
                .map(ChatMessage::assistant_text)
                .into_iter()
                .collect(),
        }
    }

    /// Retitle an untitled conversation after its first question.
    ///
    /// Returns whether the title changed.
    pub fn rename_if_untitled(&mut self, first_question: &str) -> bool {
        let untitled = self.title == NEW_CHAT_TITLE || self.title == OPS_NEW_CHAT_TITLE;
        if !untitled || first_question.trim().is_empty() {
            return false;
        }
        self.title = truncate_chars(first_question, TITLE_MAX_CHARS);
        true
    }
}

/// Assistant reply produced by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub trace_id: String,
    pub text: String,
    pub citations: Vec<Citation>,
    pub confidence: f64,
    pub latency_ms: u64,
}

/// Canned knowledge-base answer for the Q&A portal.
///
/// The query is ignored; every question gets the same DNS answer.
pub fn canned_qa_answer(_query: &str, _domain: KnowledgeDomain) -> Answer {
    Answer {
        trace_id: "trace-qa-001".to_string(),
        text: "The DNS SERVFAIL in Jakarta was triggered by an upstream resolver threshold \
               update.\n\n**Action Plan**\n1) Roll back threshold to 60ms.\n2) Flush cache on \
               edge resolvers.\n3) Watch P95 latency <200ms for 30 minutes."
            .to_string(),
        citations: vec![
            Citation {
                id: "SOP-DNS-001".to_string(),
                title: "SOP—DNS latency troubleshooting".to_string(),
                page: 2,
                score: 0.91,
            },
            Citation {
                id: "KB-OPS-1012".to_string(),
                title: "Case—SERVFAIL spike after config change".to_string(),
                page: 1,
                score: 0.88,
            },
        ],
        confidence: 0.86,
        latency_ms: 2300,
    }
}

/// Canned root-cause answer for the ops chat, echoing the query.
pub fn canned_ops_answer(query: &str) -> Answer {
    let confidence = 0.81;
    let p95_secs = 1.9;
    let body = format!(
        "Likely root cause: resolver upstream timeout after threshold change.\n\n\
         Actions:\n\
         1) Revert threshold to previous value (60ms).\n\
         2) Flush cache on edge resolvers.\n\
         3) Validate with sample domains: ioh.co.id, meranti.id.\n\
         4) Monitor P95 < 200ms for 30 min.\n\n\
         Query: {query}"
    );
    Answer {
        trace_id: format!("trace-ops-{}", &opaque_id()[..8]),
        text: format!(
            "Confidence {}% · P95 {p95_secs}s\n\n{body}",
            (confidence * 100.0_f64).round()
        ),
        citations: ["SOP-DNS-001", "KB-OPS-1012"]
            .into_iter()
            .map(|id| Citation {
                id: id.to_string(),
                title: String::new(),
                page: 1,
                score: 0.0,
            })
            .collect(),
        confidence,
        latency_ms: 1900,
    }
}
