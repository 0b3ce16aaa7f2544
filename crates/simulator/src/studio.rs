//! Image and copy studio session.
//!
//! [`Studio`] owns the form state, the active job, the job history and the
//! running background tasks. Every backend call runs in its own Tokio task
//! and finishes through [`Studio::finish`], which uses the job id to tell a
//! current completion from a stale one.

use std::collections::HashMap;
use std::sync::Arc;

use meranti_core::content::{
    compliance_issues, copy_job_title, demo_preview_text, find_template, CopyRequest,
};
use meranti_core::error::CoreError;
use meranti_core::generation::{GenerationInput, GenerationRequest, SeedField};
use meranti_core::job::{Job, JobOutput, JobPayload, JobStatus};
use meranti_core::naming::{short_token, truncate_chars, JOB_ID_PREFIX};
use meranti_core::preset::{copy_placeholder, find_preset, pick_placeholders, COPY_PLACEHOLDERS};
use meranti_core::seed::{random_seed, resolve_seed};
use meranti_core::types::EntityId;
use meranti_events::bus::{EventBus, EventKind};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, GenerationBackend};
use crate::error::StudioError;
use crate::history::History;
use crate::store::JsonLogFile;

/// Characters of the prompt kept in an image job title.
const TITLE_PROMPT_CHARS: usize = 24;

/// Handle to a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    pub job_id: EntityId,
    handle: JoinHandle<Result<Job, StudioError>>,
}

impl JobHandle {
    /// Wait for the job to reach a terminal status.
    pub async fn wait(self) -> Result<Job, StudioError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Default)]
struct StudioState {
    preset_id: Option<String>,
    form: GenerationInput,
    template_id: Option<String>,
    copy_form: Option<CopyRequest>,
    /// Job whose result is currently shown.
    active: Option<Job>,
    /// Cancellation tokens of jobs still generating, by job id.
    running: HashMap<EntityId, CancellationToken>,
    history: History<Job>,
}

impl StudioState {
    /// Give `job` an id no other job in this session holds.
    fn assign_unique_id(&self, job: &mut Job) {
        while self.history.contains(&job.id)
            || self.running.contains_key(&job.id)
            || self.active.as_ref().is_some_and(|a| a.id == job.id)
        {
            job.id = short_token(JOB_ID_PREFIX);
        }
    }
}

struct StudioInner {
    state: Mutex<StudioState>,
    backend: Arc<dyn GenerationBackend>,
    bus: Arc<EventBus>,
    history_file: Option<JsonLogFile<Job>>,
}

/// Cloneable handle to one studio session.
#[derive(Clone)]
pub struct Studio {
    inner: Arc<StudioInner>,
}

impl Studio {
    /// A session with an empty, in-memory history.
    pub fn new(backend: Arc<dyn GenerationBackend>, bus: Arc<EventBus>) -> Self {
        Self::build(backend, bus, None)
    }

    /// A session whose history is loaded from and saved to `file`.
    pub fn with_history_file(
        backend: Arc<dyn GenerationBackend>,
        bus: Arc<EventBus>,
        file: JsonLogFile<Job>,
    ) -> Self {
        Self::build(backend, bus, Some(file))
    }

    fn build(
        backend: Arc<dyn GenerationBackend>,
        bus: Arc<EventBus>,
        history_file: Option<JsonLogFile<Job>>,
    ) -> Self {
        let history = history_file
            .as_ref()
            .map(|f| History::from_entries(f.load()))
            .unwrap_or_default();
        if !history.is_empty() {
            tracing::info!(entries = history.len(), "Loaded studio history");
        }
        let state = StudioState {
            history,
            ..StudioState::default()
        };
        Self {
            inner: Arc::new(StudioInner {
                state: Mutex::new(state),
                backend,
                bus,
                history_file,
            }),
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.inner.bus
    }

    // -----------------------------------------------------------------------
    // Form state
    // -----------------------------------------------------------------------

    pub async fn form(&self) -> GenerationInput {
        self.inner.state.lock().await.form.clone()
    }

    pub async fn set_form(&self, form: GenerationInput) {
        self.inner.state.lock().await.form = form;
    }

    /// Edit the form in place.
    pub async fn update_form(&self, edit: impl FnOnce(&mut GenerationInput)) {
        edit(&mut self.inner.state.lock().await.form);
    }

    pub async fn preset_id(&self) -> Option<String> {
        self.inner.state.lock().await.preset_id.clone()
    }

    pub async fn copy_form(&self) -> Option<CopyRequest> {
        self.inner.state.lock().await.copy_form.clone()
    }

    pub async fn set_copy_form(&self, request: CopyRequest) -> Result<(), StudioError> {
        let mut state = self.inner.state.lock().await;
        if state.template_id.is_none() {
            return Err(StudioError::NoTemplateSelected);
        }
        state.copy_form = Some(request);
        Ok(())
    }

    /// Select a preset: apply its ratio to the form and show an immediate
    /// demo preview. The preview is not recorded in history.
    pub async fn choose_preset(&self, preset_id: &str) -> Result<Job, StudioError> {
        let preset = find_preset(preset_id).ok_or_else(|| CoreError::NotFound {
            entity: "Preset",
            id: preset_id.to_string(),
        })?;

        let mut state = self.inner.state.lock().await;
        state.preset_id = Some(preset.id.to_string());
        state.form.ratio = preset.ratio.as_str().to_string();
        let params = state.form.validate_request()?;
        let seed = resolve_seed(params.lock_seed, params.seed);
        let urls = pick_placeholders(preset.id, params.count);

        let mut job = Job::draft(
            format!("{} — Demo Preview", preset.name),
            JobPayload::Image {
                preset_id: preset.id.to_string(),
                params,
            },
            seed,
        );
        state.assign_unique_id(&mut job);
        job.start()?;
        job.complete(JobOutput {
            result_urls: urls,
            ..JobOutput::default()
        })?;
        self.emit_status(&job);
        state.active = Some(job.clone());
        tracing::info!(job_id = %job.id, preset_id = preset.id, "Preset preview ready");
        Ok(job)
    }

    /// Select a content template: reset the copy form to its defaults and
    /// show an immediate demo preview. The preview is not recorded in
    /// history.
    pub async fn choose_template(&self, template_id: &str) -> Result<Job, StudioError> {
        let template = find_template(template_id).ok_or_else(|| CoreError::NotFound {
            entity: "Template",
            id: template_id.to_string(),
        })?;
        let request = CopyRequest::defaults_for(template);

        let mut state = self.inner.state.lock().await;
        state.template_id = Some(template.id.to_string());
        state.copy_form = Some(request.clone());

        let mut job = Job::draft(
            format!("{} — Demo Preview", template.name),
            JobPayload::Copy {
                kind: template.kind,
                request,
            },
            random_seed(),
        );
        state.assign_unique_id(&mut job);
        job.start()?;
        job.complete(JobOutput {
            result_urls: vec![copy_placeholder(rand::random_range(0..COPY_PLACEHOLDERS.len()))],
            text: Some(demo_preview_text(template.kind).to_string()),
            error: None,
        })?;
        self.emit_status(&job);
        state.active = Some(job.clone());
        tracing::info!(job_id = %job.id, template_id = template.id, "Template preview ready");
        Ok(job)
    }

    // -----------------------------------------------------------------------
    // Submission
    // -----------------------------------------------------------------------

    /// Validate the form and start an image batch for the selected preset.
    pub async fn submit_image(&self) -> Result<JobHandle, StudioError> {
        let mut state = self.inner.state.lock().await;
        let preset_id = state.preset_id.clone().ok_or(StudioError::NoPresetSelected)?;
        let preset_name = find_preset(&preset_id).map_or("Preset", |p| p.name);

        let mut params = state.form.validate_request()?;
        let seed = effective_seed(&state.form, &mut params);

        let subject = if params.prompt.trim().is_empty() {
            "Untitled".to_string()
        } else {
            truncate_chars(&params.prompt, TITLE_PROMPT_CHARS)
        };
        let mut job = Job::draft(
            format!("{preset_name} — {subject}…"),
            JobPayload::Image {
                preset_id: preset_id.clone(),
                params: params.clone(),
            },
            seed,
        );
        let cancel = self.begin(&mut state, &mut job)?;
        drop(state);

        let backend = Arc::clone(&self.inner.backend);
        let studio = self.clone();
        let job_id = job.id.clone();
        let handle = tokio::spawn(async move {
            let outcome = backend
                .render_images(&preset_id, &params, seed, &cancel)
                .await;
            let outcome = outcome.map(|result_urls| JobOutput {
                result_urls,
                ..JobOutput::default()
            });
            studio.finish(job, outcome).await
        });
        Ok(JobHandle { job_id, handle })
    }

    /// Start a copy job for the selected template.
    pub async fn submit_copy(&self) -> Result<JobHandle, StudioError> {
        let mut state = self.inner.state.lock().await;
        let template = state
            .template_id
            .as_deref()
            .and_then(find_template)
            .ok_or(StudioError::NoTemplateSelected)?;
        let request = state
            .copy_form
            .clone()
            .unwrap_or_else(|| CopyRequest::defaults_for(template));
        let kind = template.kind;

        // Copy jobs carry no user seed; record a fresh one.
        let mut job = Job::draft(
            copy_job_title(kind, &request),
            JobPayload::Copy {
                kind,
                request: request.clone(),
            },
            random_seed(),
        );
        let cancel = self.begin(&mut state, &mut job)?;
        drop(state);

        let backend = Arc::clone(&self.inner.backend);
        let studio = self.clone();
        let job_id = job.id.clone();
        let handle = tokio::spawn(async move {
            let outcome = backend.compose_copy(kind, &request, &cancel).await;
            let outcome = outcome.map(|copy| {
                let issues = compliance_issues(&copy.text);
                if !issues.is_empty() {
                    tracing::warn!(issues = ?issues, "Generated copy failed compliance check");
                }
                JobOutput {
                    result_urls: vec![copy.image_url],
                    text: Some(copy.text),
                    error: None,
                }
            });
            studio.finish(job, outcome).await
        });
        Ok(JobHandle { job_id, handle })
    }

    /// Register a draft as the active, generating job.
    fn begin(&self, state: &mut StudioState, job: &mut Job) -> Result<CancellationToken, StudioError> {
        state.assign_unique_id(job);
        job.start()?;
        let cancel = CancellationToken::new();
        state.running.insert(job.id.clone(), cancel.clone());
        state.active = Some(job.clone());
        self.emit_status(job);
        tracing::info!(job_id = %job.id, kind = ?job.kind(), seed = job.effective_seed, "Job submitted");
        Ok(cancel)
    }

    /// Apply a backend outcome to a job.
    ///
    /// Done jobs are always recorded in history. The job only replaces the
    /// active job if it is still the active one.
    async fn finish(
        &self,
        mut job: Job,
        outcome: Result<JobOutput, BackendError>,
    ) -> Result<Job, StudioError> {
        match outcome {
            Ok(output) => {
                if let Err(e) = job.complete(output) {
                    job.fail(e.to_string())?;
                }
            }
            Err(e) => job.fail(e.to_string())?,
        }

        let mut state = self.inner.state.lock().await;
        state.running.remove(&job.id);
        self.emit_status(&job);

        if job.status == JobStatus::Done {
            match state.history.append(job.clone()) {
                Ok(()) => self.persist(&state.history).await,
                Err(e) => tracing::warn!(job_id = %job.id, error = %e, "Job not recorded"),
            }
        }

        let active_id = state.active.as_ref().map(|a| a.id.clone());
        if active_id.as_deref() == Some(job.id.as_str()) {
            state.active = Some(job.clone());
        } else {
            tracing::info!(job_id = %job.id, active_job_id = ?active_id, "Ignoring stale completion");
            self.inner.bus.emit(EventKind::StaleCompletionIgnored {
                job_id: job.id.clone(),
                active_job_id: active_id,
            });
        }

        match job.status {
            JobStatus::Done => tracing::info!(job_id = %job.id, results = job.output.result_urls.len(), "Job done"),
            _ => tracing::warn!(job_id = %job.id, error = ?job.output.error, "Job failed"),
        }
        Ok(job)
    }

    /// Cancel the active job if it is still generating.
    ///
    /// Returns whether a cancellation was requested.
    pub async fn cancel_active(&self) -> bool {
        let state = self.inner.state.lock().await;
        let token = state
            .active
            .as_ref()
            .and_then(|job| state.running.get(&job.id));
        match token {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Results and history
    // -----------------------------------------------------------------------

    pub async fn active_job(&self) -> Option<Job> {
        self.inner.state.lock().await.active.clone()
    }

    /// Whether the active job is still generating.
    pub async fn is_running(&self) -> bool {
        let state = self.inner.state.lock().await;
        state
            .active
            .as_ref()
            .is_some_and(|job| job.status == JobStatus::Generating)
    }

    /// Snapshot of the history, most recent first.
    pub async fn history(&self) -> Vec<Job> {
        self.inner.state.lock().await.history.entries().to_vec()
    }

    /// Restore a past job's parameters into the form and show its result.
    pub async fn replay(&self, job_id: &str) -> Result<Job, StudioError> {
        let mut state = self.inner.state.lock().await;
        let job = state
            .history
            .replay(job_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                entity: "Job",
                id: job_id.to_string(),
            })?;

        match &job.payload {
            JobPayload::Image { preset_id, params } => {
                state.preset_id = Some(preset_id.clone());
                state.form = params.to_input();
            }
            JobPayload::Copy { request, .. } => {
                state.template_id = Some(request.template_id.clone());
                state.copy_form = Some(request.clone());
            }
        }
        state.active = Some(job.clone());
        self.inner.bus.emit(EventKind::HistoryReplayed {
            job_id: job.id.clone(),
        });
        tracing::info!(job_id = %job.id, "Replayed history entry");
        Ok(job)
    }

    fn emit_status(&self, job: &Job) {
        self.inner.bus.emit(EventKind::JobStatusChanged {
            job_id: job.id.clone(),
            kind: job.kind(),
            status: job.status,
        });
    }

    async fn persist(&self, history: &History<Job>) {
        let Some(file) = &self.inner.history_file else {
            return;
        };
        if let Err(e) = file.save(history.entries()).await {
            tracing::error!(path = %file.path().display(), error = %e, "Failed to persist studio history");
            self.inner.bus.emit(EventKind::PersistenceFailed {
                store: "studio_history".to_string(),
                error: e.to_string(),
            });
        }
    }
}

/// Resolve the seed a submission runs with.
///
/// A locked but blank or unparseable seed field falls back to a random
/// seed, which is written into `params` so that replaying the job
/// reproduces it.
fn effective_seed(form: &GenerationInput, params: &mut GenerationRequest) -> i64 {
    let seed = resolve_seed(params.lock_seed, params.seed);
    if params.lock_seed && params.seed.is_none() {
        match form.seed_field() {
            SeedField::Unparseable => {
                tracing::warn!(seed_field = %form.seed, fallback = seed, "Locked seed is not an integer")
            }
            _ => tracing::warn!(fallback = seed, "Locked seed is empty"),
        }
        params.seed = Some(seed);
    }
    seed
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::backend::MockBackend;

    fn studio() -> Studio {
        Studio::new(Arc::new(MockBackend::default()), Arc::new(EventBus::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn submit_requires_preset() {
        let studio = studio();
        assert_matches!(studio.submit_image().await, Err(StudioError::NoPresetSelected));
        assert_matches!(studio.submit_copy().await, Err(StudioError::NoTemplateSelected));
    }

    #[tokio::test(start_paused = true)]
    async fn preset_preview_is_done_but_not_recorded() {
        let studio = studio();
        let preview = studio.choose_preset("banner_land").await.unwrap();
        assert_eq!(preview.status, JobStatus::Done);
        assert_eq!(preview.title, "Landing Banner — Demo Preview");
        assert_eq!(preview.output.result_urls.len(), 4);
        assert_eq!(studio.form().await.ratio, "16:9");
        assert!(studio.history().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn template_preview_is_done_but_not_recorded() {
        let studio = studio();
        let preview = studio.choose_template("poster-ioh").await.unwrap();
        assert_eq!(preview.status, JobStatus::Done);
        assert_eq!(preview.title, "Promo Poster (IOH Brand) — Demo Preview");
        assert_eq!(preview.output.result_urls.len(), 1);
        assert!(COPY_PLACEHOLDERS.contains(&preview.output.result_urls[0].as_str()));
        assert!(preview
            .output
            .text
            .as_deref()
            .unwrap()
            .starts_with("Stay connected everywhere"));
        assert_eq!(studio.active_job().await.unwrap().id, preview.id);
        assert_eq!(
            studio.copy_form().await.unwrap().template_id,
            "poster-ioh"
        );
        assert!(studio.history().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_preset_is_not_found() {
        let studio = studio();
        assert_matches!(
            studio.choose_preset("nope").await,
            Err(StudioError::Core(CoreError::NotFound { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn image_job_runs_to_done_with_count_results() {
        let studio = studio();
        studio.choose_preset("ioh_sunset").await.unwrap();
        studio
            .update_form(|f| {
                f.prompt = "Sunset over Jakarta skyline".into();
                f.count = 3.0;
            })
            .await;

        let handle = studio.submit_image().await.unwrap();
        assert!(studio.is_running().await);
        let job = handle.wait().await.unwrap();

        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.output.result_urls.len(), 3);
        assert_eq!(job.effective_seed, 123_456);
        assert_eq!(job.title, "IOH Sunset Poster — Sunset over Jakarta skyl…");
        assert_eq!(studio.active_job().await.unwrap().id, job.id);
        assert_eq!(studio.history().await[0].id, job.id);
    }

    #[tokio::test(start_paused = true)]
    async fn locked_blank_seed_is_recorded_for_replay() {
        let studio = studio();
        studio.choose_preset("promo_card").await.unwrap();
        studio.update_form(|f| f.seed = "abc".into()).await;

        let job = studio.submit_image().await.unwrap().wait().await.unwrap();
        let params = job.payload.image_params().unwrap();
        assert_eq!(params.seed, Some(job.effective_seed));
    }

    #[tokio::test(start_paused = true)]
    async fn copy_job_records_text_and_image() {
        let studio = studio();
        studio.choose_template("post-id").await.unwrap();
        let job = studio.submit_copy().await.unwrap().wait().await.unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert_eq!(job.output.result_urls.len(), 1);
        assert!(job.output.text.as_deref().unwrap().contains("MyIOH"));
        assert_eq!(job.title, "Bali Roaming 8GB");
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_marks_job_error_and_skips_history() {
        let studio = studio();
        studio.choose_preset("ioh_sunset").await.unwrap();
        let handle = studio.submit_image().await.unwrap();
        assert!(studio.cancel_active().await);

        let job = handle.wait().await.unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.output.error.as_deref(), Some("Generation cancelled"));
        assert!(studio.history().await.is_empty());
        assert!(!studio.cancel_active().await);
    }

    #[tokio::test(start_paused = true)]
    async fn replay_unknown_job_is_not_found() {
        let studio = studio();
        assert_matches!(
            studio.replay("JOB-00000").await,
            Err(StudioError::Core(CoreError::NotFound { entity: "Job", .. }))
        );
    }
}
