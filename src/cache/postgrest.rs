use super::{CacheEntry, Credentials, TranslationCache, CACHE_TABLE};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct CachedRow {
    chinese_term: String,
}

/// Translation cache backed by a Supabase project's REST API
#[derive(Debug, Clone)]
pub struct PostgrestCache {
    client: reqwest::Client,
    table_url: String,
    anon_key: String,
}

impl PostgrestCache {
    pub fn new(supabase_url: &str, anon_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for Supabase")?;

        Ok(Self {
            client,
            table_url: format!(
                "{}/rest/v1/{}",
                supabase_url.trim_end_matches('/'),
                CACHE_TABLE
            ),
            anon_key: anon_key.to_string(),
        })
    }

    /// The caller's Authorization header, or the project key when absent
    fn authorization(&self, auth: &Credentials) -> String {
        auth.authorization
            .clone()
            .unwrap_or_else(|| format!("Bearer {}", self.anon_key))
    }
}

#[async_trait]
impl TranslationCache for PostgrestCache {
    fn name(&self) -> &'static str {
        "postgrest"
    }

    async fn lookup(&self, english_term: &str, auth: &Credentials) -> Result<Option<String>> {
        let response = self
            .client
            .get(&self.table_url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.authorization(auth))
            .query(&[
                ("select", "chinese_term".to_string()),
                ("english_term", format!("eq.{}", english_term)),
                ("order", "created_at.asc".to_string()),
                ("limit", "1".to_string()),
            ])
            .send()
            .await
            .context("Failed to send cache lookup to Supabase")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Supabase cache lookup error ({}): {}", status, body);
        }

        let rows: Vec<CachedRow> = response
            .json()
            .await
            .context("Failed to parse Supabase cache lookup response")?;

        debug!("Cache lookup for '{}' returned {} row(s)", english_term, rows.len());

        Ok(rows.into_iter().next().map(|row| row.chinese_term))
    }

    async fn insert(&self, entry: &CacheEntry, auth: &Credentials) -> Result<()> {
        let response = self
            .client
            .post(&self.table_url)
            .header("apikey", &self.anon_key)
            .header("Authorization", self.authorization(auth))
            .header("Prefer", "return=minimal")
            .json(entry)
            .send()
            .await
            .context("Failed to send cache insert to Supabase")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            anyhow::bail!("Supabase cache insert error ({}): {}", status, body);
        }

        Ok(())
    }
}
