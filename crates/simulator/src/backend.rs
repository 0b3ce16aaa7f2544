//! The generation backend seam.
//!
//! Session controllers only talk to a [`GenerationBackend`]. [`MockBackend`]
//! fakes every call with a simulated delay and canned or placeholder
//! output; a real service client can implement the same trait later without
//! touching call sites.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use meranti_core::chat::{canned_ops_answer, canned_qa_answer, Answer, KnowledgeDomain};
use meranti_core::content::{compose_copy, CopyRequest, TemplateKind};
use meranti_core::generation::GenerationRequest;
use meranti_core::inference::{
    diffusion_sample_text, llm_sample_text, InferenceModel, InferenceRequest, InferenceResponse,
    DIFFUSION_SAMPLE_IMAGE, DIFFUSION_SAMPLE_SEED,
};
use meranti_core::naming::{short_token, JOB_ID_PREFIX};
use meranti_core::preset::{copy_placeholder, pick_placeholders};
use meranti_core::ticket::{canned_ticket_answer, TicketDraft, SUGGESTED_SUMMARY};
use tokio_util::sync::CancellationToken;

use crate::latency::{LatencyKind, LatencySimulator};

/// Diffusion ETA the inference call reports.
const DIFFUSION_ETA_SECS: f64 = 9.1;

/// Which assistant answers a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerMode {
    /// Knowledge-base Q&A portal.
    #[default]
    KnowledgeBase,
    /// Ops root-cause chat.
    Ops,
    /// "Ask AI" in a ticket's detail view.
    Ticket,
}

/// Copy text plus its companion image.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyOutput {
    pub text: String,
    pub image_url: String,
}

/// Everything the studio can ask a backend to do.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Render `params.count` images for a preset.
    ///
    /// Fails with [`BackendError::Cancelled`] once `cancel` fires.
    async fn render_images(
        &self,
        preset_id: &str,
        params: &GenerationRequest,
        seed: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, BackendError>;

    /// Produce copy and one image for a template.
    async fn compose_copy(
        &self,
        kind: TemplateKind,
        request: &CopyRequest,
        cancel: &CancellationToken,
    ) -> Result<CopyOutput, BackendError>;

    /// Answer a question.
    async fn answer(
        &self,
        mode: AnswerMode,
        query: &str,
        domain: KnowledgeDomain,
    ) -> Result<Answer, BackendError>;

    /// Suggest a summary for a ticket draft.
    async fn suggest_ticket(&self, draft: &TicketDraft) -> Result<String, BackendError>;

    /// Run a one-off model inference.
    async fn infer(&self, request: &InferenceRequest) -> Result<InferenceResponse, BackendError>;
}

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

/// Backend that only waits and returns placeholders.
#[derive(Debug, Default)]
pub struct MockBackend {
    latency: LatencySimulator,
    /// Rotates through the copy placeholder catalogue.
    copy_cursor: AtomicUsize,
}

impl MockBackend {
    pub fn new(latency: LatencySimulator) -> Self {
        Self {
            latency,
            copy_cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    async fn render_images(
        &self,
        preset_id: &str,
        params: &GenerationRequest,
        seed: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, BackendError> {
        self.latency
            .simulate_until(LatencyKind::ImageBatch, cancel)
            .await?;
        let urls = pick_placeholders(preset_id, params.count);
        tracing::debug!(preset_id, seed, count = urls.len(), "Mock render finished");
        Ok(urls)
    }

    async fn compose_copy(
        &self,
        kind: TemplateKind,
        request: &CopyRequest,
        cancel: &CancellationToken,
    ) -> Result<CopyOutput, BackendError> {
        let latency = match kind {
            TemplateKind::Text => LatencyKind::CopyText,
            TemplateKind::Image => LatencyKind::CopyImage,
        };
        self.latency.simulate_until(latency, cancel).await?;
        let index = self.copy_cursor.fetch_add(1, Ordering::Relaxed);
        Ok(CopyOutput {
            text: compose_copy(kind, request),
            image_url: copy_placeholder(index),
        })
    }

    async fn answer(
        &self,
        mode: AnswerMode,
        query: &str,
        domain: KnowledgeDomain,
    ) -> Result<Answer, BackendError> {
        match mode {
            AnswerMode::KnowledgeBase => {
                self.latency.simulate(LatencyKind::QaAnswer).await;
                Ok(canned_qa_answer(query, domain))
            }
            AnswerMode::Ops => {
                self.latency.simulate(LatencyKind::OpsAnswer).await;
                Ok(canned_ops_answer(query))
            }
            AnswerMode::Ticket => {
                self.latency.simulate(LatencyKind::TicketAnswer).await;
                Ok(canned_ticket_answer())
            }
        }
    }

    async fn suggest_ticket(&self, _draft: &TicketDraft) -> Result<String, BackendError> {
        self.latency.simulate(LatencyKind::TicketSuggest).await;
        Ok(SUGGESTED_SUMMARY.to_string())
    }

    async fn infer(&self, request: &InferenceRequest) -> Result<InferenceResponse, BackendError> {
        let waited = self.latency.simulate(LatencyKind::Inference).await;
        let prompt = request.effective_prompt();
        let response = match request.model {
            InferenceModel::Llama => InferenceResponse::Text {
                text: llm_sample_text(prompt),
                latency_ms: waited.as_millis() as u64,
            },
            InferenceModel::Diffusion => InferenceResponse::Image {
                job_id: short_token(JOB_ID_PREFIX),
                eta_s: DIFFUSION_ETA_SECS,
                seed: DIFFUSION_SAMPLE_SEED,
                image_url: DIFFUSION_SAMPLE_IMAGE.to_string(),
                text: diffusion_sample_text(prompt),
            },
        };
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors a backend call can produce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The caller cancelled the work before it finished.
    #[error("Generation cancelled")]
    Cancelled,
}

impl From<crate::latency::Cancelled> for BackendError {
    fn from(_: crate::latency::Cancelled) -> Self {
        Self::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use meranti_core::content::find_template;
    use meranti_core::generation::GenerationInput;

    use super::*;
    use std::time::Duration;

    use crate::latency::LatencyProfile;

    fn instant_backend() -> MockBackend {
        MockBackend::new(LatencySimulator::new(LatencyProfile::instant()))
    }

    #[tokio::test]
    async fn render_returns_count_placeholders() {
        let params = GenerationInput {
            count: 3.0,
            ..GenerationInput::default()
        }
        .validate_request()
        .unwrap();
        let urls = instant_backend()
            .render_images("banner_land", &params, 1, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(urls, pick_placeholders("banner_land", 3));
    }

    #[tokio::test]
    async fn copy_rotates_images() {
        let backend = instant_backend();
        let template = find_template("post-id").unwrap();
        let req = CopyRequest::defaults_for(template);
        let cancel = CancellationToken::new();
        let a = backend.compose_copy(template.kind, &req, &cancel).await.unwrap();
        let b = backend.compose_copy(template.kind, &req, &cancel).await.unwrap();
        assert_eq!(a.text, b.text);
        assert_ne!(a.image_url, b.image_url);
    }

    #[tokio::test]
    async fn answer_modes() {
        let backend = instant_backend();
        let kb = backend
            .answer(AnswerMode::KnowledgeBase, "q", KnowledgeDomain::Net)
            .await
            .unwrap();
        assert_eq!(kb.trace_id, "trace-qa-001");
        let ops = backend
            .answer(AnswerMode::Ops, "resolver", KnowledgeDomain::Net)
            .await
            .unwrap();
        assert!(ops.text.contains("Query: resolver"));
        let ticket = backend
            .answer(AnswerMode::Ticket, "anything", KnowledgeDomain::Net)
            .await
            .unwrap();
        assert_eq!(ticket.confidence, 0.86);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_render_fails_without_waiting() {
        let params = GenerationInput::default().validate_request().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let start = tokio::time::Instant::now();
        let result = MockBackend::default()
            .render_images("ioh_sunset", &params, 1, &cancel)
            .await;
        assert_eq!(result, Err(BackendError::Cancelled));
        assert!(start.elapsed() < Duration::from_millis(1200));
    }

    #[tokio::test(start_paused = true)]
    async fn llm_inference_reports_simulated_latency() {
        let backend = MockBackend::default();
        let resp = backend
            .infer(&InferenceRequest {
                model: InferenceModel::Llama,
                prompt: String::new(),
            })
            .await
            .unwrap();
        match resp {
            InferenceResponse::Text { text, latency_ms } => {
                assert_eq!(latency_ms, 1000);
                assert!(text.contains(InferenceModel::Llama.default_prompt()));
            }
            other => panic!("expected text response, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn diffusion_inference_returns_job_and_seed() {
        let resp = instant_backend()
            .infer(&InferenceRequest {
                model: InferenceModel::Diffusion,
                prompt: "city".into(),
            })
            .await
            .unwrap();
        match resp {
            InferenceResponse::Image { job_id, seed, .. } => {
                assert!(job_id.starts_with("JOB-"));
                assert_eq!(seed, DIFFUSION_SAMPLE_SEED);
            }
            other => panic!("expected image response, got {other:?}"),
        }
    }
}
