//! Result cache keyed by exact prompt text. Entries never expire within a session.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::models::GenerationResult;

#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, prompt: &str) -> Option<GenerationResult>;
    /// Overwrites any earlier result for the same prompt.
    async fn put(&self, prompt: &str, result: GenerationResult);
    async fn clear(&self);
    async fn len(&self) -> usize;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone)]
struct CachedResult {
    result: GenerationResult,
    stored_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CachedResult>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self, prompt: &str) -> Option<GenerationResult> {
        let entries = self.entries.read();
        entries.get(prompt).map(|c| {
            tracing::debug!("🗄️ Cache entry from {} reused", c.stored_at);
            c.result.clone()
        })
    }

    async fn put(&self, prompt: &str, result: GenerationResult) {
        self.entries
            .write()
            .insert(prompt.to_string(), CachedResult { result, stored_at: Utc::now() });
    }

    async fn clear(&self) {
        self.entries.write().clear();
    }

    async fn len(&self) -> usize {
        self.entries.read().len()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
