use anyhow::{bail, Context, Result};
use std::str::FromStr;

/// Which persistent store backs the translation cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// Supabase REST API (PostgREST)
    Postgrest,
    /// Direct PostgreSQL connection
    Postgres,
    /// In-process store, lost on restart
    Memory,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgrest" | "supabase" => Ok(Self::Postgrest),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => bail!(
                "Unknown CACHE_BACKEND '{}'. Expected postgrest, postgres or memory",
                other
            ),
        }
    }
}

/// Request bodies above this size are rejected
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub max_body_bytes: usize,

    // Cache store
    pub cache_backend: CacheBackend,
    pub cache_timeout_secs: u64,

    // Supabase (postgrest backend)
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,

    // PostgreSQL (postgres backend)
    pub database_url: Option<String>,

    // Dictionary
    pub dictionary_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let cache_backend: CacheBackend = std::env::var("CACHE_BACKEND")
            .unwrap_or_else(|_| "postgrest".to_string())
            .parse()?;

        let supabase_url = non_empty_var("SUPABASE_URL");
        let supabase_anon_key = non_empty_var("SUPABASE_ANON_KEY");
        let database_url = non_empty_var("DATABASE_URL");

        // Only the selected backend's credentials are required
        match cache_backend {
            CacheBackend::Postgrest => {
                supabase_url.as_ref().context("SUPABASE_URL not set")?;
                supabase_anon_key
                    .as_ref()
                    .context("SUPABASE_ANON_KEY not set")?;
            }
            CacheBackend::Postgres => {
                database_url.as_ref().context("DATABASE_URL not set")?;
            }
            CacheBackend::Memory => {}
        }

        Ok(Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),

            cache_backend,
            cache_timeout_secs: std::env::var("CACHE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),

            supabase_url,
            supabase_anon_key,

            database_url,

            dictionary_path: non_empty_var("DICTIONARY_PATH"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
