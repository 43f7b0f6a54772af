use thiserror::Error;

use crate::gemini::GenerationError;
use crate::models::Stage;

/// Every way a submission can end early. The Display text is shown to the user as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Rate limit exceeded: at most {limit} different prompts per {window_secs} seconds. Please wait and try again.")]
    RateLimited { limit: usize, window_secs: i64 },

    #[error("Duplicate prompt submitted too recently. Please wait {retry_after_secs} seconds before resubmitting.")]
    DuplicateTooSoon { retry_after_secs: i64 },

    #[error("Prompt is too short ({len} characters). It must be between {min} and {max} characters.")]
    PromptTooShort { len: usize, min: usize, max: usize },

    #[error("Prompt is too long ({len} characters). It must be between {min} and {max} characters.")]
    PromptTooLong { len: usize, min: usize, max: usize },

    #[error("Prompt contains a blocked keyword: \"{0}\"")]
    BlockedPhrase(String),

    #[error("The AI declined this request: {0}")]
    RefusedRequest(String),

    #[error("The AI returned an unusable response: {0}")]
    MalformedResponse(String),

    #[error("Generation service error: {0}")]
    TransportError(String),

    #[error("A generation is already in progress")]
    Busy,
}

/// A failed submission together with the step that detected it.
/// `stage` is `None` only when the submission never started (`Busy`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{error}")]
pub struct StageError {
    pub stage: Option<Stage>,
    pub error: PipelineError,
}

impl StageError {
    pub fn busy() -> Self {
        Self { stage: None, error: PipelineError::Busy }
    }
}

impl From<GenerationError> for PipelineError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::RefusedRequest(msg) => PipelineError::RefusedRequest(msg),
            GenerationError::MalformedResponse(msg) => PipelineError::MalformedResponse(msg),
            GenerationError::TransportError(msg) => PipelineError::TransportError(msg),
        }
    }
}
