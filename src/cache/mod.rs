//! Persistent translation cache.
//!
//! The cache is keyed by normalized English term and is append-only: rows are
//! inserted but never updated or deleted. Writers are not coordinated, so the
//! same term may end up with several rows; lookups return the earliest one.
//!
//! # Backends
//!
//! - `postgrest`: Supabase REST API, authenticated per request with the
//!   caller's bearer credential
//! - `postgres`: direct PostgreSQL connection via sqlx
//! - `memory`: in-process store for local runs and tests

mod memory;
mod postgres;
mod postgrest;

pub use memory::MemoryCache;
pub use postgres::PostgresCache;
pub use postgrest::PostgrestCache;

use crate::config::{CacheBackend, Config};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Table holding cached translations in both database backends
pub const CACHE_TABLE: &str = "ingredient_translation_cache";

/// A cached translation row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub english_term: String,
    pub chinese_term: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(english_term: impl Into<String>, chinese_term: impl Into<String>) -> Self {
        Self {
            english_term: english_term.into(),
            chinese_term: chinese_term.into(),
            created_at: Utc::now(),
        }
    }
}

/// Caller credentials passed through to the store.
///
/// Holds the raw `Authorization` header value of the incoming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub authorization: Option<String>,
}

impl Credentials {
    pub fn bearer(authorization: impl Into<String>) -> Self {
        Self {
            authorization: Some(authorization.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait TranslationCache: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Earliest cached Chinese term for a normalized English term
    async fn lookup(&self, english_term: &str, auth: &Credentials) -> Result<Option<String>>;

    /// Append a cache row
    async fn insert(&self, entry: &CacheEntry, auth: &Credentials) -> Result<()>;
}

/// Build the cache backend selected in the configuration
pub async fn connect(config: &Config) -> Result<Arc<dyn TranslationCache>> {
    let timeout = Duration::from_secs(config.cache_timeout_secs);

    let cache: Arc<dyn TranslationCache> = match config.cache_backend {
        CacheBackend::Postgrest => {
            let url = config
                .supabase_url
                .as_deref()
                .context("SUPABASE_URL not set")?;
            let anon_key = config
                .supabase_anon_key
                .as_deref()
                .context("SUPABASE_ANON_KEY not set")?;
            Arc::new(PostgrestCache::new(url, anon_key, timeout)?)
        }
        CacheBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL not set")?;
            Arc::new(PostgresCache::connect(url, timeout).await?)
        }
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
    };

    Ok(cache)
}
