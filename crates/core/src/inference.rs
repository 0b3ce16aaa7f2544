//! Request/response shapes of the model test console (`POST /infer`).
//!
//! Only the in-process types exist; no request is ever sent anywhere.

use serde::{Deserialize, Serialize};

/// Model family under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceModel {
    /// Text LLM.
    #[default]
    Llama,
    /// Image diffusion model.
    Diffusion,
}

impl InferenceModel {
    /// Prompt used when the console's prompt box is blank.
    pub fn default_prompt(&self) -> &'static str {
        match self {
            Self::Llama => "Explain the benefits of AI for telecom operations.",
            Self::Diffusion => "A futuristic digital city skyline at sunset, cyberpunk style",
        }
    }
}

/// `{model, prompt}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub model: InferenceModel,
    pub prompt: String,
}

impl InferenceRequest {
    /// The prompt to run, substituting the model default for blank input.
    pub fn effective_prompt(&self) -> &str {
        let trimmed = self.prompt.trim();
        if trimmed.is_empty() {
            self.model.default_prompt()
        } else {
            trimmed
        }
    }
}

/// Reply of the test console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InferenceResponse {
    /// LLM: `{text, latency_ms}`.
    Text { text: String, latency_ms: u64 },
    /// Diffusion: `{job_id, eta_s, seed}` plus the preview and its summary.
    Image {
        job_id: String,
        eta_s: f64,
        seed: i64,
        image_url: String,
        text: String,
    },
}

/// Seed reported by the diffusion inference.
pub const DIFFUSION_SAMPLE_SEED: i64 = 20_251_029;

/// Preview image returned by the diffusion inference.
pub const DIFFUSION_SAMPLE_IMAGE: &str = "https://picsum.photos/seed/IOH_AI_Diffusion/512/512";

/// Canned LLM completion for a prompt.
pub fn llm_sample_text(prompt: &str) -> String {
    format!(
        "Prompt: {prompt}\n\nGenerated Response:\nArtificial Intelligence greatly enhances \
         telecom operations by automating network monitoring, predicting failures, and \
         optimizing resources in real time. This reduces downtime and improves customer \
         satisfaction."
    )
}

/// Canned diffusion summary for a prompt.
pub fn diffusion_sample_text(prompt: &str) -> String {
    format!(
        "Prompt: {prompt}\n\nGenerated Image Info:\n- Resolution: 512×512\n- Steps: 15  |  \
         CFG: 6.5  |  Seed: {DIFFUSION_SAMPLE_SEED}\n- P95 Latency: 9.1s  |  Fail Rate: 0.6%"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_prompt_uses_model_default() {
        let req = InferenceRequest {
            model: InferenceModel::Diffusion,
            prompt: "   ".into(),
        };
        assert_eq!(req.effective_prompt(), InferenceModel::Diffusion.default_prompt());
    }

    #[test]
    fn text_response_serializes_flat() {
        let resp = InferenceResponse::Text {
            text: "ok".into(),
            latency_ms: 1000,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json, serde_json::json!({"text": "ok", "latency_ms": 1000}));
    }

    #[test]
    fn sample_texts_echo_prompt() {
        assert!(llm_sample_text("hello").starts_with("Prompt: hello"));
        assert!(diffusion_sample_text("city").contains("Seed: 20251029"));
    }
}
