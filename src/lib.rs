//! Product Copywriter
//!
//! Turns raw product notes into a sanitized marketing description plus SEO keywords.
//! Every submission passes a five-stage pipeline (rate/duplicate check, validation,
//! cache check, Gemini generation, output handling) whose per-stage status is exposed
//! over HTTP for the browser front end.

pub mod cache;
pub mod config;
pub mod error;
pub mod gemini;
pub mod guard;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod sanitize;
pub mod validation;

pub use cache::{MemoryCache, ResultCache};
pub use config::Config;
pub use error::{PipelineError, StageError};
pub use gemini::{GeminiClient, GenerationError, Generator};
pub use models::{GenerateRequest, GenerationResult, PipelineSnapshot, PipelineStep, Stage, StepStatus};
pub use pipeline::{PipelineConfig, PipelineController};
pub use routes::{create_router, AppState};
