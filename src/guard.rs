//! Request log plus the rate-limit and duplicate-cooldown checks derived from it.
//!
//! The log is append-only for the lifetime of a session. Both checks only read it;
//! the controller appends once a submission reaches generation (or a cache hit).

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::error::PipelineError;
use crate::models::RequestLogEntry;

pub const DEFAULT_MAX_DISTINCT_PROMPTS: usize = 5;
pub const DEFAULT_WINDOW_SECS: i64 = 60;
pub const DEFAULT_DUPLICATE_COOLDOWN_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardConfig {
    /// Distinct prompts allowed inside the trailing window.
    pub max_distinct_prompts: usize,
    pub window: Duration,
    pub duplicate_cooldown: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_distinct_prompts: DEFAULT_MAX_DISTINCT_PROMPTS,
            window: Duration::seconds(DEFAULT_WINDOW_SECS),
            duplicate_cooldown: Duration::seconds(DEFAULT_DUPLICATE_COOLDOWN_SECS),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RequestLog {
    entries: Vec<RequestLogEntry>,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, prompt: &str, at: DateTime<Utc>) {
        self.entries.push(RequestLogEntry { timestamp: at, prompt: prompt.to_string() });
    }

    pub fn entries(&self) -> &[RequestLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Distinct prompt texts logged less than `window` before `now`.
    pub fn distinct_prompts_within(&self, now: DateTime<Utc>, window: Duration) -> HashSet<&str> {
        self.entries
            .iter()
            .filter(|e| now - e.timestamp < window)
            .map(|e| e.prompt.as_str())
            .collect()
    }

    pub fn last_submission_of(&self, prompt: &str) -> Option<&RequestLogEntry> {
        self.entries.iter().rev().find(|e| e.prompt == prompt)
    }
}

/// Rate limit first, then duplicate cooldown.
pub fn check(log: &RequestLog, prompt: &str, now: DateTime<Utc>, config: &GuardConfig) -> Result<(), PipelineError> {
    let recent = log.distinct_prompts_within(now, config.window);
    if recent.len() >= config.max_distinct_prompts {
        return Err(PipelineError::RateLimited {
            limit: config.max_distinct_prompts,
            window_secs: config.window.num_seconds(),
        });
    }

    if let Some(last) = log.last_submission_of(prompt) {
        let elapsed = now - last.timestamp;
        if elapsed < config.duplicate_cooldown {
            let remaining = config.duplicate_cooldown - elapsed;
            // round up so "wait 0 seconds" is never shown
            let retry_after_secs = ((remaining.num_milliseconds() + 999) / 1000).max(1);
            return Err(PipelineError::DuplicateTooSoon { retry_after_secs });
        }
    }
    Ok(())
}
