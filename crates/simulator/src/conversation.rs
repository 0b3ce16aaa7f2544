//! Conversation store for the Q&A portal.
//!
//! Conversations live in a most-recent-first [`History`]; exactly one of
//! them is active at a time once the store is non-empty.

use meranti_core::chat::{ChatMessage, ChatStyle, Conversation, KnowledgeDomain};
use meranti_core::error::CoreError;

use crate::history::History;

#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    style: ChatStyle,
    conversations: History<Conversation>,
    active_id: Option<String>,
}

impl ConversationStore {
    /// Store holding one fresh, active "New chat".
    pub fn new(domain: KnowledgeDomain) -> Self {
        Self::with_style(ChatStyle::KnowledgeBase, domain)
    }

    /// Store holding one fresh, active conversation of `style`.
    pub fn with_style(style: ChatStyle, domain: KnowledgeDomain) -> Self {
        let mut store = Self {
            style,
            ..Self::default()
        };
        store.new_chat(domain);
        store
    }

    /// Rebuild from a persisted log; the first entry becomes active.
    ///
    /// An empty log yields a single fresh conversation.
    pub fn from_conversations(
        conversations: Vec<Conversation>,
        style: ChatStyle,
        domain: KnowledgeDomain,
    ) -> Self {
        let conversations = History::from_entries(conversations);
        let active_id = conversations.latest().map(|c| c.id.clone());
        let mut store = Self {
            style,
            conversations,
            active_id,
        };
        if store.active_id.is_none() {
            store.new_chat(domain);
        }
        store
    }

    /// Start a conversation at the front and make it active. Returns its id.
    pub fn new_chat(&mut self, domain: KnowledgeDomain) -> String {
        let mut conversation = Conversation::start(self.style, domain);
        while self.conversations.contains(&conversation.id) {
            conversation = Conversation::start(self.style, domain);
        }
        let id = conversation.id.clone();
        // Ids are unique after the loop above.
        let _ = self.conversations.append(conversation);
        self.active_id = Some(id.clone());
        id
    }

    pub fn select(&mut self, id: &str) -> Result<(), CoreError> {
        if !self.conversations.contains(id) {
            return Err(not_found(id));
        }
        self.active_id = Some(id.to_string());
        Ok(())
    }

    /// Delete a conversation. If it was active, the first remaining one
    /// becomes active, or a fresh chat is started when none remain.
    pub fn delete(&mut self, id: &str, domain: KnowledgeDomain) -> Result<Conversation, CoreError> {
        let removed = self.conversations.remove(id).ok_or_else(|| not_found(id))?;
        if self.active_id.as_deref() == Some(id) {
            self.active_id = self.conversations.latest().map(|c| c.id.clone());
        }
        if self.active_id.is_none() {
            self.new_chat(domain);
        }
        Ok(removed)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active_id
            .as_deref()
            .and_then(|id| self.conversations.replay(id))
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.replay(id)
    }

    /// Append a message to a specific conversation, retitling it on the
    /// first user question. Returns the new message count.
    pub fn push_message(&mut self, id: &str, message: ChatMessage) -> Result<usize, CoreError> {
        let conversation = self
            .conversations
            .get_mut(id)
            .ok_or_else(|| not_found(id))?;
        if message.role == meranti_core::chat::Role::User {
            conversation.rename_if_untitled(&message.content);
        }
        conversation.messages.push(message);
        Ok(conversation.messages.len())
    }

    pub fn set_domain(&mut self, id: &str, domain: KnowledgeDomain) -> Result<(), CoreError> {
        let conversation = self
            .conversations
            .get_mut(id)
            .ok_or_else(|| not_found(id))?;
        conversation.domain = domain;
        Ok(())
    }

    pub fn conversations(&self) -> &[Conversation] {
        self.conversations.entries()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

fn not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "Conversation",
        id: id.to_string(),
    }
}
