use crate::cache::{CacheEntry, Credentials, TranslationCache};
use crate::dictionary::{normalize, Dictionary};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

/// Which lookup stage produced a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationSource {
    DatabaseCache,
    CommonMapping,
    PartialMatch,
    Placeholder,
}

/// Resolved translation plus provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    /// The ingredient name as the caller sent it
    pub english_name: String,
    pub chinese_term: String,
    pub cached: bool,
    pub source: TranslationSource,
}

/// Marker for a term that needs manual translation
pub fn placeholder(ingredient_name: &str) -> String {
    format!("[需要翻译: {}]", ingredient_name)
}

/// Resolves ingredient names through the cache, then the dictionary, then a
/// placeholder
#[derive(Clone)]
pub struct Translator {
    dictionary: Arc<Dictionary>,
    cache: Arc<dyn TranslationCache>,
}

impl Translator {
    pub fn new(dictionary: Dictionary, cache: Arc<dyn TranslationCache>) -> Self {
        Self {
            dictionary: Arc::new(dictionary),
            cache,
        }
    }

    /// Translate one ingredient name.
    ///
    /// Cache hits return immediately. Anything resolved from the dictionary
    /// or as a placeholder is written back to the cache; a failed write is
    /// logged and the translation is still returned.
    pub async fn translate(
        &self,
        ingredient_name: &str,
        auth: &Credentials,
    ) -> Result<Translation, AppError> {
        let term = normalize(ingredient_name);
        if term.is_empty() {
            return Err(AppError::MissingInput);
        }

        if let Some(chinese_term) = self.cache.lookup(&term, auth).await? {
            debug!("Cache hit for '{}' ({})", term, self.cache.name());
            return Ok(Translation {
                english_name: ingredient_name.to_string(),
                chinese_term,
                cached: true,
                source: TranslationSource::DatabaseCache,
            });
        }

        let (chinese_term, source) = self.resolve(&term, ingredient_name);
        debug!("Resolved '{}' via {:?}", term, source);

        let entry = CacheEntry::new(term.as_str(), chinese_term.as_str());
        if let Err(e) = self.cache.insert(&entry, auth).await {
            error!("Error caching translation for '{}': {:#}", term, e);
        }

        Ok(Translation {
            english_name: ingredient_name.to_string(),
            chinese_term,
            cached: false,
            source,
        })
    }

    /// Dictionary stages only: exact, then partial, then placeholder
    fn resolve(&self, term: &str, ingredient_name: &str) -> (String, TranslationSource) {
        if let Some(chinese) = self.dictionary.exact(term) {
            return (chinese.to_string(), TranslationSource::CommonMapping);
        }

        if let Some(chinese) = self.dictionary.partial(term) {
            return (chinese.to_string(), TranslationSource::PartialMatch);
        }

        (placeholder(ingredient_name), TranslationSource::Placeholder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ==================== Helper Functions ====================

    fn create_translator() -> (Translator, MemoryCache) {
        let cache = MemoryCache::new();
        let translator = Translator::new(Dictionary::builtin(), Arc::new(cache.clone()));
        (translator, cache)
    }

    /// Cache that reads fine but rejects every write
    struct ReadOnlyCache {
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl TranslationCache for ReadOnlyCache {
        fn name(&self) -> &'static str {
            "read-only"
        }

        async fn lookup(&self, _english_term: &str, _auth: &Credentials) -> Result<Option<String>> {
            Ok(None)
        }

        async fn insert(&self, _entry: &CacheEntry, _auth: &Credentials) -> Result<()> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            bail!("permission denied for table ingredient_translation_cache")
        }
    }

    /// Cache whose reads always fail
    struct UnreachableCache;

    #[async_trait]
    impl TranslationCache for UnreachableCache {
        fn name(&self) -> &'static str {
            "unreachable"
        }

        async fn lookup(&self, _english_term: &str, _auth: &Credentials) -> Result<Option<String>> {
            bail!("connection refused")
        }

        async fn insert(&self, _entry: &CacheEntry, _auth: &Credentials) -> Result<()> {
            bail!("connection refused")
        }
    }

    // ==================== Serialization Tests ====================

    #[test]
    fn test_source_serialization() {
        let cases = [
            (TranslationSource::DatabaseCache, "\"database_cache\""),
            (TranslationSource::CommonMapping, "\"common_mapping\""),
            (TranslationSource::PartialMatch, "\"partial_match\""),
            (TranslationSource::Placeholder, "\"placeholder\""),
        ];
        for (source, expected) in cases {
            assert_eq!(serde_json::to_string(&source).unwrap(), expected);
        }
    }

    #[test]
    fn test_placeholder_format() {
        assert_eq!(placeholder("Dragonfruit"), "[需要翻译: Dragonfruit]");
    }

    // ==================== Resolution Order Tests ====================

    #[tokio::test]
    async fn test_exact_match() {
        let (translator, cache) = create_translator();

        let result = translator
            .translate("Chicken", &Credentials::anonymous())
            .await
            .expect("Should translate");

        assert_eq!(
            result,
            Translation {
                english_name: "Chicken".to_string(),
                chinese_term: "鸡肉".to_string(),
                cached: false,
                source: TranslationSource::CommonMapping,
            }
        );

        let entries = cache.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].english_term, "chicken");
        assert_eq!(entries[0].chinese_term, "鸡肉");
    }

    #[tokio::test]
    async fn test_exact_match_beats_partial() {
        let (translator, _cache) = create_translator();

        let result = translator
            .translate("beef ribs", &Credentials::anonymous())
            .await
            .expect("Should translate");

        assert_eq!(result.chinese_term, "牛排骨");
        assert_eq!(result.source, TranslationSource::CommonMapping);
    }

    #[tokio::test]
    async fn test_partial_match() {
        let (translator, cache) = create_translator();

        let result = translator
            .translate("  Smoked Salmon ", &Credentials::anonymous())
            .await
            .expect("Should translate");

        assert_eq!(result.english_name, "  Smoked Salmon ");
        assert_eq!(result.chinese_term, "三文鱼");
        assert_eq!(result.source, TranslationSource::PartialMatch);
        assert!(!result.cached);
        assert_eq!(cache.entries().unwrap()[0].english_term, "smoked salmon");
    }

    #[tokio::test]
    async fn test_placeholder() {
        let (translator, cache) = create_translator();

        let result = translator
            .translate("Dragonfruit", &Credentials::anonymous())
            .await
            .expect("Should translate");

        assert_eq!(result.chinese_term, "[需要翻译: Dragonfruit]");
        assert_eq!(result.source, TranslationSource::Placeholder);

        // Placeholders are cached for later manual correction
        let entries = cache.entries().unwrap();
        assert_eq!(entries[0].english_term, "dragonfruit");
        assert_eq!(entries[0].chinese_term, "[需要翻译: Dragonfruit]");
    }

    #[tokio::test]
    async fn test_every_builtin_key_is_common_mapping() {
        let (translator, cache) = create_translator();
        let dictionary = Dictionary::builtin();
        let auth = Credentials::anonymous();

        for (english, chinese) in dictionary.iter() {
            let input = english.to_uppercase();
            let result = translator.translate(&input, &auth).await.unwrap();

            assert_eq!(result.source, TranslationSource::CommonMapping, "key {}", english);
            assert_eq!(result.chinese_term, chinese, "key {}", english);
            assert_eq!(result.english_name, input);
            assert!(!result.cached);
        }

        assert_eq!(cache.entries().unwrap().len(), dictionary.len());
    }

    // j, x and z appear in no built-in key, so wrapping a key in them never
    // forms another exact key
    proptest! {
        #[test]
        fn prop_term_containing_key_is_partial_match(
            index in 0usize..Dictionary::builtin().len(),
            prefix in "[jxz]{1,5}",
            suffix in "[jxz ]{0,5}",
        ) {
            let dictionary = Dictionary::builtin();
            let (key, _) = dictionary.iter().nth(index).unwrap();
            let input = format!("{} {}{}", prefix, key, suffix);
            let expected = dictionary.partial(&normalize(&input)).unwrap().to_string();

            let runtime = tokio::runtime::Runtime::new().unwrap();
            let result = runtime.block_on(async {
                let (translator, _cache) = create_translator();
                translator.translate(&input, &Credentials::anonymous()).await
            }).unwrap();

            prop_assert_eq!(result.source, TranslationSource::PartialMatch);
            prop_assert_eq!(result.chinese_term, expected);
        }
    }

    // ==================== Cache Behaviour Tests ====================

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let (translator, cache) = create_translator();
        let auth = Credentials::anonymous();

        translator.translate("Chicken", &auth).await.unwrap();
        let second = translator.translate("CHICKEN", &auth).await.unwrap();

        assert_eq!(second.english_name, "CHICKEN");
        assert_eq!(second.chinese_term, "鸡肉");
        assert!(second.cached);
        assert_eq!(second.source, TranslationSource::DatabaseCache);

        // No second write
        assert_eq!(cache.entries().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cached_value_wins_over_dictionary() {
        let cache = MemoryCache::new();
        let auth = Credentials::anonymous();
        cache
            .insert(&CacheEntry::new("chicken", "鸡"), &auth)
            .await
            .unwrap();

        let translator = Translator::new(Dictionary::builtin(), Arc::new(cache));
        let result = translator.translate("chicken", &auth).await.unwrap();

        assert_eq!(result.chinese_term, "鸡");
        assert_eq!(result.source, TranslationSource::DatabaseCache);
    }

    #[tokio::test]
    async fn test_converges_to_first_cached_value() {
        let cache = MemoryCache::new();
        let auth = Credentials::anonymous();

        let before = Translator::new(Dictionary::builtin(), Arc::new(cache.clone()));
        let first = before.translate("tofu", &auth).await.unwrap();
        assert_eq!(first.source, TranslationSource::Placeholder);

        // Dictionary gains the term after the placeholder was cached
        let mut dictionary = Dictionary::builtin();
        dictionary.extend(Dictionary::from_entries([("tofu", "豆腐")]));
        let after = Translator::new(dictionary, Arc::new(cache));

        let second = after.translate("tofu", &auth).await.unwrap();
        assert_eq!(second.chinese_term, first.chinese_term);
        assert_eq!(second.source, TranslationSource::DatabaseCache);
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_not_fatal() {
        let cache = Arc::new(ReadOnlyCache {
            inserts: AtomicUsize::new(0),
        });
        let translator = Translator::new(Dictionary::builtin(), cache.clone());

        let result = translator
            .translate("garlic", &Credentials::anonymous())
            .await
            .expect("Write failure should not fail the translation");

        assert_eq!(result.chinese_term, "大蒜");
        assert!(!result.cached);
        assert_eq!(cache.inserts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_read_failure_is_internal_error() {
        let translator = Translator::new(Dictionary::builtin(), Arc::new(UnreachableCache));

        let err = translator
            .translate("garlic", &Credentials::anonymous())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal(_)));
    }

    // ==================== Validation Tests ====================

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let (translator, cache) = create_translator();

        // Whitespace-only names normalize to "", which every key contains.
        // The Supabase edge function accepted them, partial-matched
        // "chicken" and cached 鸡肉 under an empty key; here they are rejected
        // before touching the cache.
        for input in ["", "   ", "\t\n"] {
            let err = translator
                .translate(input, &Credentials::anonymous())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::MissingInput), "input {:?}", input);
        }

        assert!(cache.entries().unwrap().is_empty());
    }
}
