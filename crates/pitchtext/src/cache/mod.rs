//! Result caching over an injected key-value store.
//!
//! Nothing here is process-wide: callers construct a store, hand it to a
//! [`CachedExtractor`], and decide how long both live. Results are stored as named
//! MessagePack so a store can be backed by anything that holds bytes.

use crate::Result;
use crate::core::config::ExtractionConfig;
use crate::types::ExtractionResult;
use ahash::AHasher;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Cache key hash format width (16 hex digits for u64 hash)
const CACHE_KEY_HASH_WIDTH: usize = 16;

/// Byte store with get/put semantics.
///
/// Implementations decide their own eviction policy.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn put(&self, key: String, value: Vec<u8>) -> Result<()>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory store that evicts the oldest entry once `capacity` is reached.
///
/// Overwriting an existing key keeps its original insertion position.
pub struct MemoryStore {
    capacity: usize,
    entries: Mutex<IndexMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(IndexMap::with_capacity(capacity)),
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.cache_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn put(&self, key: String, value: Vec<u8>) -> Result<()> {
        if self.capacity == 0 {
            return Ok(());
        }

        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get_mut(&key) {
            *existing = value;
            return Ok(());
        }

        while entries.len() >= self.capacity {
            if let Some((evicted, _)) = entries.shift_remove_index(0) {
                tracing::debug!("Evicting cache entry {}", evicted);
            }
        }
        entries.insert(key, value);
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

/// Key for a document: a 64-bit ahash over MIME type, size, content and the serialized
/// config, as hex.
///
/// Any config change yields a different key, since labels, notes, comments and PDF
/// thresholds all shape the output.
///
/// ```rust
/// use pitchtext::ExtractionConfig;
/// use pitchtext::cache::generate_cache_key;
///
/// let config = ExtractionConfig::default();
/// let key = generate_cache_key("text/plain", b"hello", &config).unwrap();
/// assert_eq!(key.len(), 16);
/// assert_ne!(key, generate_cache_key("text/markdown", b"hello", &config).unwrap());
/// ```
pub fn generate_cache_key(mime_type: &str, content: &[u8], config: &ExtractionConfig) -> Result<String> {
    let fingerprint = rmp_serde::to_vec(config)?;

    let mut hasher = AHasher::default();
    mime_type.hash(&mut hasher);
    content.len().hash(&mut hasher);
    content.hash(&mut hasher);
    fingerprint.hash(&mut hasher);
    let hash = hasher.finish();

    Ok(format!("{:0width$x}", hash, width = CACHE_KEY_HASH_WIDTH))
}

/// Extraction front end that consults a [`KvStore`] before extracting.
///
/// Only successful results are stored. With `config.use_cache` off the store is bypassed
/// in both directions.
pub struct CachedExtractor<S: KvStore> {
    store: S,
}

impl<S: KvStore> CachedExtractor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn extract_bytes(
        &self,
        content: &[u8],
        mime_type: &str,
        config: &ExtractionConfig,
    ) -> Result<ExtractionResult> {
        if !config.use_cache {
            return crate::core::extractor::extract_bytes(content, mime_type, config).await;
        }

        crate::core::mime::validate_mime_type(mime_type)?;
        crate::core::io::ensure_within_limit(content.len() as u64, config.max_file_size, "Input")?;

        let key = generate_cache_key(mime_type, content, config)?;
        if let Some(cached) = self.lookup(&key)? {
            return Ok(cached);
        }

        let result = crate::core::extractor::extract_bytes(content, mime_type, config).await?;
        if !result.is_error() {
            let encoded = rmp_serde::to_vec_named(&result)?;
            self.store.put(key, encoded)?;
        }
        Ok(result)
    }

    /// Read `path`, detect its MIME type when not given, and extract through the cache.
    pub async fn extract_file(
        &self,
        path: impl AsRef<Path>,
        mime_type: Option<&str>,
        config: &ExtractionConfig,
    ) -> Result<ExtractionResult> {
        use crate::core::{io, mime};

        let path = path.as_ref();
        io::validate_file_exists(path)?;
        let detected_mime = mime::detect_or_validate(Some(path), mime_type)?;
        io::validate_file_size(path, config.max_file_size).await?;

        let bytes = io::read_file_async(path).await?;
        self.extract_bytes(&bytes, &detected_mime, config).await
    }

    fn lookup(&self, key: &str) -> Result<Option<ExtractionResult>> {
        let Some(bytes) = self.store.get(key)? else {
            return Ok(None);
        };
        match rmp_serde::from_slice(&bytes) {
            Ok(result) => Ok(Some(result)),
            Err(e) => {
                tracing::warn!("Discarding undecodable cache entry {}: {}", key, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;
    use serial_test::serial;

    #[test]
    fn test_memory_store_evicts_oldest() {
        let store = MemoryStore::new(2);
        store.put("a".to_string(), vec![1]).unwrap();
        store.put("b".to_string(), vec![2]).unwrap();
        store.put("c".to_string(), vec![3]).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap(), Some(vec![2]));
        assert_eq!(store.get("c").unwrap(), Some(vec![3]));
    }

    #[test]
    fn test_memory_store_overwrite_keeps_position() {
        let store = MemoryStore::new(2);
        store.put("a".to_string(), vec![1]).unwrap();
        store.put("b".to_string(), vec![2]).unwrap();
        store.put("a".to_string(), vec![9]).unwrap();
        store.put("c".to_string(), vec![3]).unwrap();

        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap(), Some(vec![2]));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let store = MemoryStore::new(0);
        store.put("a".to_string(), vec![1]).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_cache_key_covers_mime_content_and_config() {
        let config = ExtractionConfig::default();
        let key = generate_cache_key("text/plain", b"deck", &config).unwrap();
        assert_eq!(key.len(), 16);
        assert_eq!(key, generate_cache_key("text/plain", b"deck", &config).unwrap());
        assert_ne!(key, generate_cache_key("text/plain", b"deck2", &config).unwrap());
        assert_ne!(key, generate_cache_key("text/csv", b"deck", &config).unwrap());

        let mut relabelled = ExtractionConfig::default();
        relabelled.labels.unknown_sheet = "Orphans".to_string();
        assert_ne!(key, generate_cache_key("text/plain", b"deck", &relabelled).unwrap());
    }

    #[tokio::test]
    #[serial]
    async fn test_cached_extractor_stores_and_reuses() {
        let cached = CachedExtractor::new(MemoryStore::new(4));
        let config = ExtractionConfig::default();

        let first = cached.extract_bytes(b"Team slide", "text/plain", &config).await.unwrap();
        assert_eq!(first.content, "Team slide");
        assert_eq!(cached.store().len(), 1);

        let second = cached.extract_bytes(b"Team slide", "text/plain", &config).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(cached.store().len(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn test_cache_hit_skips_extraction() {
        let store = MemoryStore::new(4);
        let planted = ExtractionResult::from_text("from cache", "text/plain", Metadata::default());
        store
            .put(
                generate_cache_key("text/plain", b"original", &ExtractionConfig::default()).unwrap(),
                rmp_serde::to_vec_named(&planted).unwrap(),
            )
            .unwrap();

        let cached = CachedExtractor::new(store);
        let result = cached
            .extract_bytes(b"original", "text/plain", &ExtractionConfig::default())
            .await
            .unwrap();
        assert_eq!(result.content, "from cache");
    }

    #[tokio::test]
    #[serial]
    async fn test_cache_disabled_bypasses_store() {
        let cached = CachedExtractor::new(MemoryStore::new(4));
        let config = ExtractionConfig {
            use_cache: false,
            ..Default::default()
        };
        cached.extract_bytes(b"x", "text/plain", &config).await.unwrap();
        assert!(cached.store().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_undecodable_entry_is_replaced() {
        let store = MemoryStore::new(4);
        store
            .put(
                generate_cache_key("text/plain", b"y", &ExtractionConfig::default()).unwrap(),
                vec![0xc1],
            )
            .unwrap();
        let cached = CachedExtractor::new(store);

        let result = cached
            .extract_bytes(b"y", "text/plain", &ExtractionConfig::default())
            .await
            .unwrap();
        assert_eq!(result.content, "y");
    }

    #[tokio::test]
    #[serial]
    async fn test_errors_are_not_cached() {
        let cached = CachedExtractor::new(MemoryStore::new(4));
        let result = cached
            .extract_bytes(b"x", "image/png", &ExtractionConfig::default())
            .await;
        assert!(result.is_err());
        assert!(cached.store().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_different_config_misses_cache() {
        let store = MemoryStore::new(8);
        let planted = ExtractionResult::from_text("built with default labels", "text/plain", Metadata::default());
        store
            .put(
                generate_cache_key("text/plain", b"fresh", &ExtractionConfig::default()).unwrap(),
                rmp_serde::to_vec_named(&planted).unwrap(),
            )
            .unwrap();
        let cached = CachedExtractor::new(store);

        let mut config = ExtractionConfig::default();
        config.labels.unknown_sheet = "Orphans".to_string();
        let result = cached.extract_bytes(b"fresh", "text/plain", &config).await.unwrap();

        assert_eq!(result.content, "fresh");
        assert_eq!(cached.store().len(), 2);
    }

    #[tokio::test]
    #[serial]
    async fn test_size_limit_applies_to_cached_entries() {
        let cached = CachedExtractor::new(MemoryStore::new(4));
        let roomy = ExtractionConfig::default();
        cached.extract_bytes(b"oversized", "text/plain", &roomy).await.unwrap();

        let strict = ExtractionConfig {
            max_file_size: 4,
            ..Default::default()
        };
        let result = cached.extract_bytes(b"oversized", "text/plain", &strict).await;
        assert!(matches!(result, Err(crate::PitchtextError::Validation { .. })));
    }
}
