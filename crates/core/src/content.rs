//! Content templates, copy composition and the brand compliance check.
//!
//! Copy is composed deterministically from the template kind, language and
//! tone. The same request always yields the same text.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::naming::truncate_chars;

/* --------------------------------------------------------------------------
   Templates
   -------------------------------------------------------------------------- */

/// Whether a template's primary output is copy or an image.
///
/// Both kinds produce copy and one image; the kind decides which inputs
/// drive the text and how long the simulated job takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Text,
    Image,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output language of generated copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Bahasa Indonesia.
    #[default]
    Id,
    En,
    Zh,
    /// Template serves several languages; copy falls back to English.
    Multi,
}

/// Tone of generated copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Friendly,
    Concise,
    Formal,
}

/// A content template in the gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: TemplateKind,
    pub description: &'static str,
    pub language: Language,
}

/// Built-in templates, in gallery order.
pub const TEMPLATES: &[Template] = &[
    Template {
        id: "post-id",
        name: "Social Post (Bahasa)",
        kind: TemplateKind::Text,
        description: "30–80 words short post",
        language: Language::Id,
    },
    Template {
        id: "poster-ioh",
        name: "Promo Poster (IOH Brand)",
        kind: TemplateKind::Image,
        description: "IOH yellow→red gradient poster style",
        language: Language::Multi,
    },
    Template {
        id: "email-care",
        name: "Care Email Template (EN)",
        kind: TemplateKind::Text,
        description: "Service / Care email copy",
        language: Language::En,
    },
];

/// Look up a template by id.
pub fn find_template(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Case-insensitive substring filter over template names.
///
/// An empty query returns every template.
pub fn filter_templates(query: &str) -> Vec<&'static Template> {
    let needle = query.to_lowercase();
    TEMPLATES
        .iter()
        .filter(|t| t.name.to_lowercase().contains(&needle))
        .collect()
}

/* --------------------------------------------------------------------------
   Copy request
   -------------------------------------------------------------------------- */

/// Default image prompt offered by every template form.
pub const DEFAULT_IMAGE_PROMPT: &str = "IOH yellow-red gradient background, smiling young people \
     holding phones, clean layout, poster style";

/// Default call to action.
pub const DEFAULT_CTA: &str = "Download MyIOH";

/// Parameters of a copy generation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyRequest {
    pub template_id: String,
    pub title: String,
    pub keywords: String,
    pub tone: Tone,
    pub language: Language,
    pub cta: String,
    pub image_prompt: String,
}

impl CopyRequest {
    /// Form defaults for a template. Switching templates resets to these.
    pub fn defaults_for(template: &Template) -> Self {
        Self {
            template_id: template.id.to_string(),
            title: "Bali Roaming 8GB".to_string(),
            keywords: "eSIM, promo".to_string(),
            tone: Tone::Friendly,
            language: template.language,
            cta: DEFAULT_CTA.to_string(),
            image_prompt: DEFAULT_IMAGE_PROMPT.to_string(),
        }
    }
}

/* --------------------------------------------------------------------------
   Composition
   -------------------------------------------------------------------------- */

/// Compose the copy for a request under the given template kind.
pub fn compose_copy(kind: TemplateKind, req: &CopyRequest) -> String {
    match kind {
        TemplateKind::Text => compose_post(req),
        TemplateKind::Image => compose_caption(req),
    }
}

fn compose_post(req: &CopyRequest) -> String {
    let cta = non_empty_or(&req.cta, DEFAULT_CTA);
    let size = non_empty_or(&req.keywords, "8GB");
    match req.language {
        Language::Id => format!(
            "🌴 Nikmati kebebasan lebih! eSIM roaming {size} — promo minggu ini. Unduh MyIOH — {cta}."
        ),
        Language::Zh => {
            format!("🌴 更自由的旅程！eSIM 漫游{size}，本周限时。立刻下载 MyIOH —— {cta}。")
        }
        Language::En | Language::Multi => {
            format!("🌴 Explore more freedom! eSIM roaming {size} — limited this week. {cta}.")
        }
    }
}

fn compose_caption(req: &CopyRequest) -> String {
    let subject = truncate_chars(non_empty_or(&req.image_prompt, "Your perfect poster"), 32);
    let base = format!("Stay connected with MyIOH — {subject}");
    match req.tone {
        Tone::Concise => format!("{base}. Download now."),
        Tone::Friendly | Tone::Formal => format!("{base}. Simple. Fast. Reliable."),
    }
}

/// Job title shown in history for a copy request.
pub fn copy_job_title(kind: TemplateKind, req: &CopyRequest) -> String {
    match kind {
        TemplateKind::Text => non_empty_or(&req.title, "Untitled Post").to_string(),
        TemplateKind::Image => {
            format!("{}…", truncate_chars(non_empty_or(&req.image_prompt, "Poster"), 16))
        }
    }
}

/// Copy shown by the instant demo preview when a template is picked.
pub fn demo_preview_text(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Text => {
            "🌴 Explore Bali with more freedom! eSIM roaming 8GB — limited this week. Download MyIOH now."
        }
        TemplateKind::Image => {
            "Stay connected everywhere — Download MyIOH for quick top-ups and seamless data."
        }
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/* --------------------------------------------------------------------------
   Compliance
   -------------------------------------------------------------------------- */

static EXAGGERATED_CLAIM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)100%|guarantee").expect("static regex"));

static FREE_IPHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)free\s*iphone").expect("static regex"));

/// Brand/compliance issues found in a piece of copy. Empty means clean.
pub fn compliance_issues(text: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();
    if EXAGGERATED_CLAIM.is_match(text) {
        issues.push("Contains exaggerated claim (guarantee)");
    }
    if FREE_IPHONE.is_match(text) {
        issues.push("Possible violation: 'free iPhone'");
    }
    issues
}

/* --------------------------------------------------------------------------
   Tests
   -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    fn request(template_id: &str) -> CopyRequest {
        CopyRequest::defaults_for(find_template(template_id).expect("known template"))
    }

    // -- filter --

    #[test]
    fn filter_is_case_insensitive() {
        let hits = filter_templates("POSTER");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "poster-ioh");
    }

    #[test]
    fn empty_filter_returns_all() {
        assert_eq!(filter_templates("").len(), TEMPLATES.len());
    }

    #[test]
    fn filter_without_match_is_empty() {
        assert!(filter_templates("newsletter").is_empty());
    }

    #[test]
    fn demo_preview_text_by_kind() {
        assert!(demo_preview_text(TemplateKind::Text).contains("eSIM roaming 8GB"));
        assert!(demo_preview_text(TemplateKind::Image).starts_with("Stay connected everywhere"));
    }

    // -- composition --

    #[test]
    fn bahasa_post_uses_keywords_and_cta() {
        let mut req = request("post-id");
        req.keywords = "16GB".into();
        let text = compose_copy(TemplateKind::Text, &req);
        assert!(text.starts_with("🌴 Nikmati"));
        assert!(text.contains("16GB"));
        assert!(text.ends_with("Download MyIOH."));
    }

    #[test]
    fn english_post_falls_back_on_blank_fields() {
        let mut req = request("email-care");
        req.keywords = String::new();
        req.cta = "  ".into();
        let text = compose_copy(TemplateKind::Text, &req);
        assert_eq!(
            text,
            "🌴 Explore more freedom! eSIM roaming 8GB — limited this week. Download MyIOH."
        );
    }

    #[test]
    fn chinese_post() {
        let mut req = request("post-id");
        req.language = Language::Zh;
        assert!(compose_copy(TemplateKind::Text, &req).contains("漫游"));
    }

    #[test]
    fn caption_tone_changes_suffix() {
        let mut req = request("poster-ioh");
        req.image_prompt = "Autumn promo".into();
        assert_eq!(
            compose_copy(TemplateKind::Image, &req),
            "Stay connected with MyIOH — Autumn promo. Simple. Fast. Reliable."
        );
        req.tone = Tone::Concise;
        assert!(compose_copy(TemplateKind::Image, &req).ends_with(". Download now."));
    }

    #[test]
    fn caption_truncates_prompt() {
        let req = request("poster-ioh");
        let text = compose_copy(TemplateKind::Image, &req);
        let subject = text
            .trim_start_matches("Stay connected with MyIOH — ")
            .trim_end_matches(". Simple. Fast. Reliable.");
        assert_eq!(subject.chars().count(), 32);
    }

    // -- titles --

    #[test]
    fn job_titles() {
        let mut req = request("post-id");
        assert_eq!(copy_job_title(TemplateKind::Text, &req), "Bali Roaming 8GB");
        req.title = String::new();
        assert_eq!(copy_job_title(TemplateKind::Text, &req), "Untitled Post");
        req.image_prompt = String::new();
        assert_eq!(copy_job_title(TemplateKind::Image, &req), "Poster…");
    }

    // -- compliance --

    #[test]
    fn compliance_flags_claims() {
        assert_eq!(compliance_issues("100% uptime GUARANTEED").len(), 1);
        assert_eq!(compliance_issues("win a FREE iPhone").len(), 1);
        assert!(compliance_issues("Simple. Fast. Reliable.").is_empty());
    }
}
