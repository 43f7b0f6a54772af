//! Environment configuration. A `.env` file is honoured for local development.

use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

use crate::gemini::DEMO_KEY;
use crate::guard::{GuardConfig, DEFAULT_DUPLICATE_COOLDOWN_SECS, DEFAULT_MAX_DISTINCT_PROMPTS, DEFAULT_WINDOW_SECS};
use crate::pipeline::PipelineConfig;

pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub rate_limit_max_prompts: usize,
    pub rate_limit_window_secs: i64,
    pub duplicate_cooldown_secs: i64,
    pub cache_hit_delay_ms: u64,
    pub output_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            gemini_api_key: DEMO_KEY.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            rate_limit_max_prompts: DEFAULT_MAX_DISTINCT_PROMPTS,
            rate_limit_window_secs: DEFAULT_WINDOW_SECS,
            duplicate_cooldown_secs: DEFAULT_DUPLICATE_COOLDOWN_SECS,
            cache_hit_delay_ms: 500,
            output_delay_ms: 300,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let defaults = Config::default();

        let config = Config {
            port: parse_var("PORT", defaults.port)?,
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or(defaults.gemini_api_key),
            gemini_api_base: env::var("GEMINI_API_BASE").unwrap_or(defaults.gemini_api_base),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            rate_limit_max_prompts: parse_var("RATE_LIMIT_MAX_PROMPTS", defaults.rate_limit_max_prompts)?,
            rate_limit_window_secs: parse_var("RATE_LIMIT_WINDOW_SECS", defaults.rate_limit_window_secs)?,
            duplicate_cooldown_secs: parse_var("DUPLICATE_COOLDOWN_SECS", defaults.duplicate_cooldown_secs)?,
            cache_hit_delay_ms: parse_var("CACHE_HIT_DELAY_MS", defaults.cache_hit_delay_ms)?,
            output_delay_ms: parse_var("OUTPUT_DELAY_MS", defaults.output_delay_ms)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("PORT must be greater than 0");
        }
        if self.rate_limit_max_prompts == 0 {
            anyhow::bail!("RATE_LIMIT_MAX_PROMPTS must be greater than 0");
        }
        if self.rate_limit_window_secs <= 0 {
            anyhow::bail!("RATE_LIMIT_WINDOW_SECS must be greater than 0");
        }
        if self.duplicate_cooldown_secs < 0 {
            anyhow::bail!("DUPLICATE_COOLDOWN_SECS must not be negative");
        }
        Ok(())
    }

    pub fn is_demo(&self) -> bool {
        self.gemini_api_key == DEMO_KEY
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            guard: GuardConfig {
                max_distinct_prompts: self.rate_limit_max_prompts,
                window: chrono::Duration::seconds(self.rate_limit_window_secs),
                duplicate_cooldown: chrono::Duration::seconds(self.duplicate_cooldown_secs),
            },
            cache_hit_delay: Duration::from_millis(self.cache_hit_delay_ms),
            output_delay: Duration::from_millis(self.output_delay_ms),
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("Invalid {key}: {raw:?}")),
        Err(_) => Ok(default),
    }
}
