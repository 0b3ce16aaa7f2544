//! Q&A chat session.
//!
//! [`QaSession`] wraps a [`ConversationStore`] and a backend. A question is
//! always answered into the conversation it was asked in, even if the user
//! switched to another conversation while the answer was pending.

use std::sync::Arc;

use meranti_core::chat::{Answer, ChatMessage, ChatStyle, Conversation, KnowledgeDomain};
use meranti_core::error::CoreError;
use meranti_events::bus::{EventBus, EventKind};
use tokio::sync::Mutex;

use crate::backend::{AnswerMode, GenerationBackend};
use crate::conversation::ConversationStore;
use crate::error::StudioError;
use crate::store::JsonLogFile;

struct QaInner {
    store: Mutex<ConversationStore>,
    backend: Arc<dyn GenerationBackend>,
    bus: Arc<EventBus>,
    mode: AnswerMode,
    domain: KnowledgeDomain,
    file: Option<JsonLogFile<Conversation>>,
}

/// Cloneable handle to one chat session.
#[derive(Clone)]
pub struct QaSession {
    inner: Arc<QaInner>,
}

impl QaSession {
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        bus: Arc<EventBus>,
        mode: AnswerMode,
        domain: KnowledgeDomain,
    ) -> Self {
        Self::build(backend, bus, mode, domain, None)
    }

    /// A session whose conversations are loaded from and saved to `file`.
    pub fn with_file(
        backend: Arc<dyn GenerationBackend>,
        bus: Arc<EventBus>,
        mode: AnswerMode,
        domain: KnowledgeDomain,
        file: JsonLogFile<Conversation>,
    ) -> Self {
        Self::build(backend, bus, mode, domain, Some(file))
    }

    fn build(
        backend: Arc<dyn GenerationBackend>,
        bus: Arc<EventBus>,
        mode: AnswerMode,
        domain: KnowledgeDomain,
        file: Option<JsonLogFile<Conversation>>,
    ) -> Self {
        let style = match mode {
            AnswerMode::Ops => ChatStyle::Ops,
            AnswerMode::KnowledgeBase | AnswerMode::Ticket => ChatStyle::KnowledgeBase,
        };
        let saved = file.as_ref().map(|f| f.load()).unwrap_or_default();
        let store = ConversationStore::from_conversations(saved, style, domain);
        Self {
            inner: Arc::new(QaInner {
                store: Mutex::new(store),
                backend,
                bus,
                mode,
                domain,
                file,
            }),
        }
    }

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.inner.store.lock().await.conversations().to_vec()
    }

    pub async fn active(&self) -> Option<Conversation> {
        self.inner.store.lock().await.active().cloned()
    }

    pub async fn get(&self, id: &str) -> Option<Conversation> {
        self.inner.store.lock().await.get(id).cloned()
    }

    /// Start a new conversation and make it active.
    pub async fn new_chat(&self) -> String {
        let mut store = self.inner.store.lock().await;
        let id = store.new_chat(self.inner.domain);
        self.persist(&store).await;
        id
    }

    pub async fn select(&self, id: &str) -> Result<(), StudioError> {
        self.inner.store.lock().await.select(id)?;
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), StudioError> {
        let mut store = self.inner.store.lock().await;
        store.delete(id, self.inner.domain)?;
        self.persist(&store).await;
        Ok(())
    }

    pub async fn set_domain(&self, id: &str, domain: KnowledgeDomain) -> Result<(), StudioError> {
        let mut store = self.inner.store.lock().await;
        store.set_domain(id, domain)?;
        self.persist(&store).await;
        Ok(())
    }

    /// Ask a question in the active conversation.
    pub async fn send(&self, question: &str) -> Result<Answer, StudioError> {
        let id = self
            .inner
            .store
            .lock()
            .await
            .active_id()
            .map(str::to_string)
            .ok_or_else(|| CoreError::Validation("No active conversation".to_string()))?;
        self.send_to(&id, question).await
    }

    /// Ask a question in a specific conversation and append the answer to
    /// that same conversation.
    pub async fn send_to(&self, conversation_id: &str, question: &str) -> Result<Answer, StudioError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CoreError::Validation("Question must not be empty".to_string()).into());
        }

        let domain = {
            let mut store = self.inner.store.lock().await;
            let count = store.push_message(conversation_id, ChatMessage::user(question))?;
            self.updated(&store, conversation_id, count).await;
            store
                .get(conversation_id)
                .map_or(self.inner.domain, |c| c.domain)
        };

        let answer = self
            .inner
            .backend
            .answer(self.inner.mode, question, domain)
            .await?;

        let mut store = self.inner.store.lock().await;
        match store.push_message(conversation_id, ChatMessage::assistant(&answer)) {
            Ok(count) => self.updated(&store, conversation_id, count).await,
            Err(e) => {
                tracing::warn!(conversation_id, "Conversation deleted before its answer arrived");
                return Err(e.into());
            }
        }
        tracing::info!(conversation_id, trace_id = %answer.trace_id, "Answer delivered");
        Ok(answer)
    }

    async fn updated(&self, store: &ConversationStore, conversation_id: &str, message_count: usize) {
        self.inner.bus.emit(EventKind::ConversationUpdated {
            conversation_id: conversation_id.to_string(),
            message_count,
        });
        self.persist(store).await;
    }

    async fn persist(&self, store: &ConversationStore) {
        let Some(file) = &self.inner.file else {
            return;
        };
        if let Err(e) = file.save(store.conversations()).await {
            tracing::error!(path = %file.path().display(), error = %e, "Failed to persist conversations");
            self.inner.bus.emit(EventKind::PersistenceFailed {
                store: "conversations".to_string(),
                error: e.to_string(),
            });
        }
    }
}
