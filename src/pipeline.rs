//! Five-stage submission pipeline.
//!
//! Each run resets every step to `Idle`, then walks rate check, validation, cache
//! check, generation and output handling in order. Entering a stage marks it
//! `Pending`; the stage ends `Success` or `Error`, and the first error halts the
//! run with the later steps left `Idle`. A cache hit ends the run successfully
//! after the cache check without calling the generator.
//!
//! Only one run is in flight at a time. A second submission while one is running
//! is rejected with [`PipelineError::Busy`] and leaves the visible state alone.
//! A started run is never cancelled: it executes on its own task and finishes
//! even if the caller stops waiting for it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::ResultCache;
use crate::error::{PipelineError, StageError};
use crate::gemini::Generator;
use crate::guard::{self, GuardConfig, RequestLog};
use crate::models::{GenerateRequest, GenerationResult, PipelineSnapshot, PipelineStep, Stage, StepStatus};
use crate::sanitize;
use crate::validation;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub guard: GuardConfig,
    /// Cosmetic pause before surfacing a cached result.
    pub cache_hit_delay: Duration,
    /// Cosmetic pause while output is post-processed.
    pub output_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            guard: GuardConfig::default(),
            cache_hit_delay: Duration::from_millis(500),
            output_delay: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSteps([PipelineStep; 5]);

impl Default for PipelineSteps {
    fn default() -> Self {
        Self(Stage::ALL.map(PipelineStep::idle))
    }
}

impl PipelineSteps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn get(&self, stage: Stage) -> &PipelineStep {
        &self.0[stage.index()]
    }

    pub fn as_slice(&self) -> &[PipelineStep] {
        &self.0
    }

    pub fn begin(&mut self, stage: Stage) {
        let step = &mut self.0[stage.index()];
        debug_assert_eq!(step.status, StepStatus::Idle, "{} entered twice", stage.label());
        step.status = StepStatus::Pending;
        step.detail = None;
    }

    pub fn succeed(&mut self, stage: Stage, note: Option<String>) {
        let step = &mut self.0[stage.index()];
        debug_assert_eq!(step.status, StepStatus::Pending);
        step.status = StepStatus::Success;
        step.detail = note;
    }

    pub fn fail(&mut self, stage: Stage, reason: String) {
        let step = &mut self.0[stage.index()];
        debug_assert_eq!(step.status, StepStatus::Pending);
        step.status = StepStatus::Error;
        step.detail = Some(reason);
    }
}

struct Session {
    log: RequestLog,
    steps: PipelineSteps,
    loading: bool,
    error: Option<String>,
    result: Option<GenerationResult>,
    run_id: Option<Uuid>,
    updated_at: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        Self {
            log: RequestLog::new(),
            steps: PipelineSteps::new(),
            loading: false,
            error: None,
            result: None,
            run_id: None,
            updated_at: Utc::now(),
        }
    }
}

pub struct PipelineController {
    core: Arc<RunCore>,
    in_flight: Arc<tokio::sync::Mutex<()>>,
}

struct RunCore {
    generator: Arc<dyn Generator>,
    cache: Arc<dyn ResultCache>,
    config: PipelineConfig,
    session: RwLock<Session>,
}

impl PipelineController {
    pub fn new(generator: Arc<dyn Generator>, cache: Arc<dyn ResultCache>, config: PipelineConfig) -> Self {
        Self {
            core: Arc::new(RunCore { generator, cache, config, session: RwLock::new(Session::new()) }),
            in_flight: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        let s = self.core.session.read();
        PipelineSnapshot {
            run_id: s.run_id,
            steps: s.steps.as_slice().to_vec(),
            loading: s.loading,
            error: s.error.clone(),
            result: s.result.clone(),
            updated_at: s.updated_at,
        }
    }

    pub fn request_log_len(&self) -> usize {
        self.core.session.read().log.len()
    }

    pub async fn submit(&self, req: &GenerateRequest) -> Result<GenerationResult, StageError> {
        self.submit_at(req, Utc::now()).await
    }

    /// Runs the pipeline as if submitted at `now`. Rate and duplicate decisions use `now`.
    ///
    /// The run executes on its own task, so dropping the returned future does not
    /// cancel it: the run still settles its steps, clears `loading` and fills the cache.
    pub async fn submit_at(&self, req: &GenerateRequest, now: DateTime<Utc>) -> Result<GenerationResult, StageError> {
        let running = self.in_flight.clone().try_lock_owned().map_err(|_| {
            warn!("⏳ Submission rejected, a run is already in flight");
            StageError::busy()
        })?;

        let core = self.core.clone();
        let req = req.clone();
        let handle = tokio::spawn(async move {
            let outcome = core.execute(&req, now).await;
            drop(running);
            outcome
        });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }

    /// Clears the request log, the cache and the visible pipeline state.
    pub async fn reset_session(&self) -> Result<(), PipelineError> {
        let _running = self.in_flight.try_lock().map_err(|_| PipelineError::Busy)?;
        self.core.cache.clear().await;
        *self.core.session.write() = Session::new();
        info!("🧹 Session reset");
        Ok(())
    }
}

impl RunCore {
    async fn execute(&self, req: &GenerateRequest, now: DateTime<Utc>) -> Result<GenerationResult, StageError> {
        let run_id = Uuid::new_v4();
        {
            let mut s = self.session.write();
            s.steps.reset();
            s.loading = true;
            s.error = None;
            s.result = None;
            s.run_id = Some(run_id);
            s.updated_at = Utc::now();
        }
        info!(%run_id, translate = req.translate, "🚀 Pipeline run started");

        let outcome = self.run(req, now).await;

        let mut s = self.session.write();
        s.loading = false;
        s.updated_at = Utc::now();
        match &outcome {
            Ok(result) => {
                s.result = Some(result.clone());
                info!(%run_id, "✅ Pipeline run finished");
            }
            Err(e) => {
                s.error = Some(e.to_string());
                warn!(%run_id, "❌ Pipeline run failed: {}", e);
            }
        }
        outcome
    }

    async fn run(&self, req: &GenerateRequest, now: DateTime<Utc>) -> Result<GenerationResult, StageError> {
        let prompt = req.prompt.as_str();

        self.enter(Stage::RateCheck);
        let checked = {
            let s = self.session.read();
            guard::check(&s.log, prompt, now, &self.config.guard)
        };
        self.settle(Stage::RateCheck, checked, None)?;

        self.enter(Stage::Validate);
        self.settle(Stage::Validate, validation::validate(prompt), None)?;

        self.enter(Stage::CacheCheck);
        if let Some(hit) = self.cache.get(prompt).await {
            // still counts towards the rate limit
            self.session.write().log.record(prompt, now);
            self.settle(Stage::CacheCheck, Ok(()), Some("cache hit".into()))?;
            info!("🗄️ Serving cached result from {} cache", self.cache.name());
            pause(self.config.cache_hit_delay).await;
            return Ok(hit);
        }
        self.settle(Stage::CacheCheck, Ok(()), Some("cache miss".into()))?;

        self.enter(Stage::Generate);
        self.session.write().log.record(prompt, now);
        let generated = self.generator.generate(prompt, req.translate).await.map_err(PipelineError::from);
        let generated = self.settle(Stage::Generate, generated, None)?;

        self.enter(Stage::OutputHandle);
        pause(self.config.output_delay).await;
        let result = match sanitize::sanitize_result(generated) {
            Some(result) => result,
            None => {
                let err = PipelineError::MalformedResponse("the AI returned an empty description".into());
                return self.settle(Stage::OutputHandle, Err(err), None);
            }
        };
        self.cache.put(prompt, result.clone()).await;
        self.settle(Stage::OutputHandle, Ok(result), None)
    }

    fn enter(&self, stage: Stage) {
        let mut s = self.session.write();
        s.steps.begin(stage);
        s.updated_at = Utc::now();
    }

    fn settle<T>(&self, stage: Stage, outcome: Result<T, PipelineError>, note: Option<String>) -> Result<T, StageError> {
        let mut s = self.session.write();
        s.updated_at = Utc::now();
        match outcome {
            Ok(value) => {
                s.steps.succeed(stage, note);
                Ok(value)
            }
            Err(error) => {
                s.steps.fail(stage, error.to_string());
                Err(StageError { stage: Some(stage), error })
            }
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
