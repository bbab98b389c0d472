use super::{CacheEntry, Credentials, TranslationCache};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Translation cache backed by a direct PostgreSQL connection.
///
/// Caller credentials are not used; access is governed by the connection
/// string.
#[derive(Clone)]
pub struct PostgresCache {
    pool: PgPool,
}

impl PostgresCache {
    /// Connect and create the cache table if needed
    pub async fn connect(database_url: &str, timeout: Duration) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(timeout)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        let cache = Self { pool };
        cache.init_schema().await?;

        info!("✓ Connected to PostgreSQL translation cache");
        Ok(cache)
    }

    /// Create the cache table and lookup index (safe to run always)
    pub async fn init_schema(&self) -> Result<()> {
        // english_term is not UNIQUE; concurrent writers may insert the same
        // term and lookups take the earliest row
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS ingredient_translation_cache (
                id BIGSERIAL PRIMARY KEY,
                english_term TEXT NOT NULL,
                chinese_term TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create ingredient_translation_cache table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_ingredient_translation_cache_english_term
             ON ingredient_translation_cache (english_term)",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create english_term index")?;

        Ok(())
    }
}

#[async_trait]
impl TranslationCache for PostgresCache {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn lookup(&self, english_term: &str, _auth: &Credentials) -> Result<Option<String>> {
        let chinese_term = sqlx::query_scalar::<_, String>(
            "SELECT chinese_term FROM ingredient_translation_cache
             WHERE english_term = $1
             ORDER BY created_at ASC, id ASC
             LIMIT 1",
        )
        .bind(english_term)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to query translation cache")?;

        Ok(chinese_term)
    }

    async fn insert(&self, entry: &CacheEntry, _auth: &Credentials) -> Result<()> {
        sqlx::query(
            "INSERT INTO ingredient_translation_cache (english_term, chinese_term, created_at)
             VALUES ($1, $2, $3)",
        )
        .bind(&entry.english_term)
        .bind(&entry.chinese_term)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert into translation cache")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Connect to TEST_DATABASE_URL with an empty cache table
    async fn create_test_cache() -> PostgresCache {
        let url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set for PostgreSQL tests");
        let cache = PostgresCache::connect(&url, Duration::from_secs(5))
            .await
            .expect("Failed to connect to test database");

        sqlx::query("TRUNCATE ingredient_translation_cache")
            .execute(&cache.pool)
            .await
            .expect("Failed to truncate cache table");

        cache
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_insert_then_lookup() {
        let cache = create_test_cache().await;
        let auth = Credentials::anonymous();

        assert_eq!(cache.lookup("chicken", &auth).await.unwrap(), None);

        cache
            .insert(&CacheEntry::new("chicken", "鸡肉"), &auth)
            .await
            .expect("Should insert");

        assert_eq!(
            cache.lookup("chicken", &auth).await.unwrap().as_deref(),
            Some("鸡肉")
        );
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_duplicate_rows_return_earliest() {
        let cache = create_test_cache().await;
        let auth = Credentials::anonymous();

        let mut first = CacheEntry::new("pepper", "辣椒");
        first.created_at -= chrono::Duration::seconds(60);

        cache
            .insert(&CacheEntry::new("pepper", "胡椒"), &auth)
            .await
            .expect("Should insert");
        cache.insert(&first, &auth).await.expect("Should insert");

        assert_eq!(
            cache.lookup("pepper", &auth).await.unwrap().as_deref(),
            Some("辣椒")
        );
    }

    #[tokio::test]
    #[ignore = "requires TEST_DATABASE_URL"]
    async fn test_init_schema_is_idempotent() {
        let cache = create_test_cache().await;
        cache.init_schema().await.expect("Second init should succeed");
    }
}
