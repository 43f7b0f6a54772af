use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub translate: bool,
}

/// Marketing copy produced for one prompt. Only the generation client builds these.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub description: String,
    #[serde(default)]
    pub seo_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLogEntry {
    pub timestamp: DateTime<Utc>,
    pub prompt: String,
}

/// The five checkpoints of a submission, in execution order.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    RateCheck,
    Validate,
    CacheCheck,
    Generate,
    OutputHandle,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::RateCheck,
        Stage::Validate,
        Stage::CacheCheck,
        Stage::Generate,
        Stage::OutputHandle,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::RateCheck => "API Key & Rate Limit",
            Stage::Validate => "Input Validation",
            Stage::CacheCheck => "Cache Check",
            Stage::Generate => "Generate with AI",
            Stage::OutputHandle => "Output Handling",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    pub stage: Stage,
    pub name: &'static str,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PipelineStep {
    pub fn idle(stage: Stage) -> Self {
        Self { stage, name: stage.label(), status: StepStatus::Idle, detail: None }
    }
}

/// What the presentation layer renders: step statuses, loading flag, error and last result.
#[derive(Debug, Serialize, Clone)]
pub struct PipelineSnapshot {
    pub run_id: Option<Uuid>,
    pub steps: Vec<PipelineStep>,
    pub loading: bool,
    pub error: Option<String>,
    pub result: Option<GenerationResult>,
    pub updated_at: DateTime<Utc>,
}
