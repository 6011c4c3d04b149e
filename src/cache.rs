// Tag-aware message cache and the memoizing wrapper around the fetcher

use crate::config::RuntimeMode;
use crate::fetcher::{LoadError, TierSource};
use crate::locale::{Locale, Tier};
use crate::merge::Document;
use crate::metrics::LoadMetrics;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const ALL_MESSAGES_TAG: &str = "i18n:all";

pub fn cache_key(tier: Tier, locale: Locale) -> String {
    format!("i18n-{}:{}", tier, locale)
}

pub fn tier_tag(tier: Tier, locale: Locale) -> String {
    format!("i18n:{}:{}", tier, locale)
}

/**
 * is_known_tag
 * 判断 tag 是否为本服务生成的失效标签（全局标签或某个 tier+locale 标签）。
 */
pub fn is_known_tag(tag: &str) -> bool {
    tag == ALL_MESSAGES_TAG
        || Tier::ALL.iter().any(|tier| {
            Locale::SUPPORTED
                .iter()
                .any(|locale| tier_tag(*tier, *locale) == tag)
        })
}

/// Storage, expiry and tag matching for cached documents.
#[async_trait]
pub trait MessageCache: Send + Sync {
    /// Returns the document only while it is still fresh.
    async fn get(&self, key: &str) -> Option<Document>;
    async fn set(&self, key: &str, document: Document, tags: Vec<String>, ttl: Duration);
    /// Drops every entry carrying `tag`, returning how many were removed.
    async fn invalidate_by_tag(&self, tag: &str) -> usize;
}

struct CacheEntry {
    document: Document,
    tags: Vec<String>,
    /// `None` when `now + ttl` is past what `Instant` can represent: never expires.
    expires_at: Option<Instant>,
}

#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl MessageCache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<Document> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at.map_or(true, |at| Instant::now() < at))
            .map(|entry| entry.document.clone())
    }

    async fn set(&self, key: &str, document: Document, tags: Vec<String>, ttl: Duration) {
        let entry = CacheEntry {
            document,
            tags,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    async fn invalidate_by_tag(&self, tag: &str) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|t| t == tag));
        before - entries.len()
    }
}

/// Memoizes tier loads per (tier, locale); CI runs go straight to the source.
pub struct CachedMessages {
    source: Arc<dyn TierSource>,
    cache: Arc<dyn MessageCache>,
    mode: RuntimeMode,
    ttl: Duration,
    metrics: Arc<LoadMetrics>,
}

impl CachedMessages {
    pub fn new(
        source: Arc<dyn TierSource>,
        cache: Arc<dyn MessageCache>,
        mode: RuntimeMode,
        ttl: Duration,
        metrics: Arc<LoadMetrics>,
    ) -> Self {
        Self {
            source,
            cache,
            mode,
            ttl,
            metrics,
        }
    }

    pub async fn load(&self, locale: Locale, tier: Tier) -> Result<Document, LoadError> {
        if self.mode.bypasses_cache() {
            return self.fetch_timed(locale, tier).await;
        }

        let key = cache_key(tier, locale);
        if let Some(doc) = self.cache.get(&key).await {
            self.metrics.record_cache_hit();
            return Ok(doc);
        }

        self.metrics.record_cache_miss();
        let doc = self.fetch_timed(locale, tier).await?;
        let tags = vec![tier_tag(tier, locale), ALL_MESSAGES_TAG.to_string()];
        self.cache.set(&key, doc.clone(), tags, self.ttl).await;
        Ok(doc)
    }

    pub async fn invalidate_tag(&self, tag: &str) -> usize {
        let removed = self.cache.invalidate_by_tag(tag).await;
        log::info!("Invalidated {} cached message entries for tag {}", removed, tag);
        removed
    }

    async fn fetch_timed(&self, locale: Locale, tier: Tier) -> Result<Document, LoadError> {
        let started = Instant::now();
        let doc = self.source.fetch_tier(locale, tier).await?;
        self.metrics.record_load(started.elapsed());
        Ok(doc)
    }
}
