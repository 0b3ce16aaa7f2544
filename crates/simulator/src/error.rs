use meranti_core::error::CoreError;

use crate::backend::BackendError;
use crate::store::StoreError;

/// Errors surfaced by the session controllers.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No preset selected")]
    NoPresetSelected,

    #[error("No template selected")]
    NoTemplateSelected,

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for StudioError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed(err.to_string())
    }
}
