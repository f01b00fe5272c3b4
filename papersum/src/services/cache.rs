use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, RwLock};

use lru::LruCache;
use url::Url;

use crate::error::Result;
use crate::models::{AnalysisResult, CachedAnalysis};
use crate::processing::AnalysisPipeline;
use crate::services::jobs::validate_source_url;

/// Key/value storage behind [`ResultCache`].
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<AnalysisResult>;
    fn put(&self, key: String, value: AnalysisResult);
    /// Every entry, in no particular order.
    fn entries(&self) -> Vec<(String, AnalysisResult)>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Grows without bound; entries are never evicted.
#[derive(Default)]
pub struct UnboundedCacheStore {
    map: RwLock<HashMap<String, AnalysisResult>>,
}

impl UnboundedCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for UnboundedCacheStore {
    fn get(&self, key: &str) -> Option<AnalysisResult> {
        let map = self.map.read().unwrap_or_else(|e| e.into_inner());
        map.get(key).cloned()
    }

    fn put(&self, key: String, value: AnalysisResult) {
        let mut map = self.map.write().unwrap_or_else(|e| e.into_inner());
        map.insert(key, value);
    }

    fn entries(&self) -> Vec<(String, AnalysisResult)> {
        let map = self.map.read().unwrap_or_else(|e| e.into_inner());
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn len(&self) -> usize {
        self.map.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Holds at most `capacity` entries, evicting the least recently used.
pub struct LruCacheStore {
    cache: Mutex<LruCache<String, AnalysisResult>>,
}

impl LruCacheStore {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl CacheStore for LruCacheStore {
    fn get(&self, key: &str) -> Option<AnalysisResult> {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.get(key).cloned()
    }

    fn put(&self, key: String, value: AnalysisResult) {
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.put(key, value);
    }

    fn entries(&self) -> Vec<(String, AnalysisResult)> {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Store for a configured capacity: 0 means unbounded.
pub fn cache_store_for_capacity(capacity: usize) -> Arc<dyn CacheStore> {
    match NonZeroUsize::new(capacity) {
        Some(capacity) => Arc::new(LruCacheStore::new(capacity)),
        None => Arc::new(UnboundedCacheStore::new()),
    }
}

/// Cache key for a source URL: parsed (so scheme and host are lowercased
/// and default ports dropped) with the fragment removed.
pub fn normalize_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// Synchronous analysis with memoization by source URL.
///
/// Two concurrent misses for the same URL both run the pipeline and the
/// later write wins.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    pipeline: AnalysisPipeline,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, pipeline: AnalysisPipeline) -> Self {
        Self { store, pipeline }
    }

    pub async fn analyze(&self, url: &str) -> Result<CachedAnalysis> {
        let key = normalize_url(&validate_source_url(url)?);

        if let Some(result) = self.store.get(&key) {
            tracing::debug!(url = %key, "Analysis cache hit");
            return Ok(CachedAnalysis {
                result,
                cached: true,
            });
        }

        tracing::debug!(url = %key, "Analysis cache miss");
        let result = self.pipeline.analyze(&key).await?;
        self.store.put(key, result.clone());

        Ok(CachedAnalysis {
            result,
            cached: false,
        })
    }

    /// Cached entries sorted by URL.
    pub fn entries(&self) -> Vec<(String, AnalysisResult)> {
        let mut entries = self.store.entries();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
