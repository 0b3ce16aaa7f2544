//! Simulated generation jobs and their lifecycle.
//!
//! A job moves `Draft -> Generating -> Done`, or `Generating -> Error`.
//! Transitions are checked by [`JobStatus::transition`]; nothing else may
//! mutate a job's status.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::{CopyRequest, TemplateKind};
use crate::error::CoreError;
use crate::generation::GenerationRequest;
use crate::naming::{short_token, JOB_ID_PREFIX};
use crate::types::{EntityId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Created, not yet submitted to the backend.
    Draft,
    /// Backend work in flight.
    Generating,
    /// Finished with output.
    Done,
    /// Failed or cancelled.
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Generating => "generating",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Validate a transition from `self` to `next`.
    pub fn transition(self, next: JobStatus) -> Result<JobStatus, CoreError> {
        match (self, next) {
            (Self::Draft, Self::Generating)
            | (Self::Generating, Self::Done)
            | (Self::Generating, Self::Error) => Ok(next),
            _ => Err(CoreError::Conflict(format!(
                "Invalid job transition {self} -> {next}"
            ))),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payload and output
// ---------------------------------------------------------------------------

/// What a job was asked to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    /// A text-to-image batch from a preset.
    Image {
        preset_id: String,
        params: GenerationRequest,
    },
    /// Copy plus one image from a content template.
    Copy {
        kind: TemplateKind,
        request: CopyRequest,
    },
}

/// Coarse job category, used to pick a latency bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ImageBatch,
    CopyText,
    CopyImage,
}

impl JobPayload {
    pub fn kind(&self) -> JobKind {
        match self {
            Self::Image { .. } => JobKind::ImageBatch,
            Self::Copy {
                kind: TemplateKind::Text,
                ..
            } => JobKind::CopyText,
            Self::Copy {
                kind: TemplateKind::Image,
                ..
            } => JobKind::CopyImage,
        }
    }

    /// Image parameters, for image jobs.
    pub fn image_params(&self) -> Option<&GenerationRequest> {
        match self {
            Self::Image { params, .. } => Some(params),
            Self::Copy { .. } => None,
        }
    }
}

/// Result of a finished job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOutput {
    pub result_urls: Vec<String>,
    pub text: Option<String>,
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One simulated generation request/response cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: EntityId,
    pub title: String,
    pub created_at: Timestamp,
    pub payload: JobPayload,
    /// Seed the job ran with (locked or freshly drawn).
    pub effective_seed: i64,
    pub status: JobStatus,
    pub output: JobOutput,
}

impl Job {
    /// A new draft job with a fresh `JOB-nnnnn` id.
    pub fn draft(title: impl Into<String>, payload: JobPayload, effective_seed: i64) -> Self {
        Self {
            id: short_token(JOB_ID_PREFIX),
            title: title.into(),
            created_at: chrono::Utc::now(),
            payload,
            effective_seed,
            status: JobStatus::Draft,
            output: JobOutput::default(),
        }
    }

    pub fn kind(&self) -> JobKind {
        self.payload.kind()
    }

    /// Move from `Draft` to `Generating`.
    pub fn start(&mut self) -> Result<(), CoreError> {
        self.status = self.status.transition(JobStatus::Generating)?;
        Ok(())
    }

    /// Finish with output.
    ///
    /// Image jobs must return exactly `params.count` URLs.
    pub fn complete(&mut self, output: JobOutput) -> Result<(), CoreError> {
        if let Some(params) = self.payload.image_params() {
            if output.result_urls.len() != usize::from(params.count) {
                return Err(CoreError::Validation(format!(
                    "Job {} expected {} results, got {}",
                    self.id,
                    params.count,
                    output.result_urls.len()
                )));
            }
        }
        self.status = self.status.transition(JobStatus::Done)?;
        self.output = output;
        Ok(())
    }

    /// Finish with an error message.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), CoreError> {
        self.status = self.status.transition(JobStatus::Error)?;
        self.output.error = Some(message.into());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::generation::GenerationInput;

    fn image_job(count: f64) -> Job {
        let params = GenerationInput {
            count,
            ..GenerationInput::default()
        }
        .validate_request()
        .unwrap();
        Job::draft(
            "poster",
            JobPayload::Image {
                preset_id: "ioh_sunset".into(),
                params,
            },
            1,
        )
    }

    #[test]
    fn lifecycle_draft_generating_done() {
        let mut job = image_job(2.0);
        assert_eq!(job.status, JobStatus::Draft);
        job.start().unwrap();
        assert_eq!(job.status, JobStatus::Generating);
        job.complete(JobOutput {
            result_urls: vec!["a".into(), "b".into()],
            ..JobOutput::default()
        })
        .unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert!(job.status.is_terminal());
    }

    #[test]
    fn cannot_complete_a_draft() {
        let mut job = image_job(1.0);
        let err = job
            .complete(JobOutput {
                result_urls: vec!["a".into()],
                ..JobOutput::default()
            })
            .unwrap_err();
        assert_matches!(err, CoreError::Conflict(_));
        assert_eq!(job.status, JobStatus::Draft);
    }

    #[test]
    fn result_count_must_match_params() {
        let mut job = image_job(3.0);
        job.start().unwrap();
        let err = job
            .complete(JobOutput {
                result_urls: vec!["a".into()],
                ..JobOutput::default()
            })
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
        assert_eq!(job.status, JobStatus::Generating);
    }

    #[test]
    fn fail_records_message() {
        let mut job = image_job(1.0);
        job.start().unwrap();
        job.fail("cancelled").unwrap();
        assert_eq!(job.status, JobStatus::Error);
        assert_eq!(job.output.error.as_deref(), Some("cancelled"));
        assert!(job.start().is_err());
    }

    #[test]
    fn job_ids_use_prefix() {
        assert!(image_job(1.0).id.starts_with("JOB-"));
    }

    #[test]
    fn payload_kind_buckets() {
        assert_eq!(image_job(1.0).kind(), JobKind::ImageBatch);
    }

    #[test]
    fn status_display_values() {
        assert_eq!(JobStatus::Draft.to_string(), "draft");
        assert_eq!(JobStatus::Generating.to_string(), "generating");
        assert_eq!(JobStatus::Done.to_string(), "done");
        assert_eq!(JobStatus::Error.to_string(), "error");
    }
}
