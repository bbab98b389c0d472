use super::{CacheEntry, Credentials, TranslationCache};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// In-process append-only cache
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<Vec<CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every row, in insertion order
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory cache lock poisoned"))?;
        Ok(entries.clone())
    }
}

#[async_trait]
impl TranslationCache for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn lookup(&self, english_term: &str, _auth: &Credentials) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory cache lock poisoned"))?;

        Ok(entries
            .iter()
            .find(|e| e.english_term == english_term)
            .map(|e| e.chinese_term.clone()))
    }

    async fn insert(&self, entry: &CacheEntry, _auth: &Credentials) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("Memory cache lock poisoned"))?;
        entries.push(entry.clone());
        Ok(())
    }
}
