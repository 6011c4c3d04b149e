// Composite loader: critical + deferred tiers merged into one document

use crate::cache::{CachedMessages, InMemoryCache, MessageCache};
use crate::config::{LoaderConfig, RuntimeMode};
use crate::fetcher::{LoadError, MessageFetcher};
use crate::locale::{Locale, Tier};
use crate::merge::{merge, Document};
use crate::metrics::LoadMetrics;
use std::sync::Arc;
use std::time::Instant;

pub struct MessageLoader {
    mode: RuntimeMode,
    fetcher: Arc<MessageFetcher>,
    cached: CachedMessages,
    metrics: Arc<LoadMetrics>,
}

impl MessageLoader {
    /**
     * new
     * 使用默认的进程内缓存构建加载器。
     */
    pub fn new(config: LoaderConfig) -> anyhow::Result<Self> {
        Self::with_cache(config, Arc::new(InMemoryCache::new()))
    }

    pub fn with_cache(config: LoaderConfig, cache: Arc<dyn MessageCache>) -> anyhow::Result<Self> {
        let metrics = Arc::new(LoadMetrics::new());
        let mode = config.mode;
        let ttl = config.cache_ttl();
        let fetcher = Arc::new(MessageFetcher::new(Arc::new(config), metrics.clone())?);
        let cached = CachedMessages::new(fetcher.clone(), cache, mode, ttl, metrics.clone());

        Ok(Self {
            mode,
            fetcher,
            cached,
            metrics,
        })
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn fetcher(&self) -> &MessageFetcher {
        &self.fetcher
    }

    pub fn metrics(&self) -> &LoadMetrics {
        &self.metrics
    }

    pub async fn load_tier(&self, locale: &str, tier: Tier) -> Result<Document, LoadError> {
        self.cached.load(Locale::sanitize(locale), tier).await
    }

    pub async fn load_critical(&self, locale: &str) -> Result<Document, LoadError> {
        self.load_tier(locale, Tier::Critical).await
    }

    pub async fn load_deferred(&self, locale: &str) -> Result<Document, LoadError> {
        self.load_tier(locale, Tier::Deferred).await
    }

    /**
     * load_complete
     * 并发加载 critical 与 deferred 两个 tier 并深度合并（deferred 优先）。
     * 任一 tier 失败即返回错误，不会用空文档降级。
     */
    pub async fn load_complete(&self, locale: &str) -> Result<Document, LoadError> {
        let locale = Locale::sanitize(locale);

        let (critical, deferred) = if self.mode == RuntimeMode::Build {
            tokio::try_join!(
                self.load_source_timed(locale, Tier::Critical),
                self.load_source_timed(locale, Tier::Deferred),
            )?
        } else {
            tokio::try_join!(
                self.cached.load(locale, Tier::Critical),
                self.cached.load(locale, Tier::Deferred),
            )?
        };

        Ok(merge(&critical, &deferred))
    }

    pub async fn invalidate_tag(&self, tag: &str) -> usize {
        self.cached.invalidate_tag(tag).await
    }

    async fn load_source_timed(&self, locale: Locale, tier: Tier) -> Result<Document, LoadError> {
        let started = Instant::now();
        let doc = self.fetcher.load_from_source(locale, tier).await?;
        self.metrics.record_load(started.elapsed());
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_upstream, write_tier, UpstreamRoute};
    use serde_json::{json, Value};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn loader(mode: RuntimeMode, base_url: &str, root: &Path) -> MessageLoader {
        let mut config = LoaderConfig::new(mode, base_url)
            .with_dirs(root.join("public/messages"), root.join("messages"));
        config.http_timeout = Duration::from_secs(2);
        MessageLoader::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_critical_fails_when_everything_fails() {
        let tmp = TempDir::new().unwrap();
        let loader = loader(RuntimeMode::Production, "http://127.0.0.1:9", tmp.path());

        let err = loader.load_critical("en").await.unwrap_err();
        assert!(err.to_string().contains("Cannot load critical messages for en"));

        let err = loader.load_deferred("en").await.unwrap_err();
        assert!(err.to_string().contains("Cannot load deferred messages for en"));
    }

    #[tokio::test]
    async fn test_invalid_locale_is_sanitized_before_loading() {
        let tmp = TempDir::new().unwrap();
        let loader = loader(RuntimeMode::Production, "http://127.0.0.1:9", tmp.path());

        let err = loader.load_critical("invalid-locale").await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot load critical messages for en");
    }

    #[tokio::test]
    async fn test_complete_merges_network_deferred_over_critical() {
        let tmp = TempDir::new().unwrap();
        let base = spawn_upstream(vec![
            UpstreamRoute::ok("/messages/zh/critical.json", json!({"a": {"b": "y", "c": "z"}})),
            UpstreamRoute::ok("/messages/zh/deferred.json", json!({"a": {"b": "x"}})),
        ]);
        let loader = loader(RuntimeMode::Production, &base, tmp.path());

        let doc = loader.load_complete("zh").await.unwrap();

        assert_eq!(Value::Object(doc), json!({"a": {"b": "x", "c": "z"}}));
    }

    #[tokio::test]
    async fn test_complete_is_fail_fast() {
        let tmp = TempDir::new().unwrap();
        let public = tmp.path().join("public/messages");
        write_tier(&public, Locale::En, Tier::Critical, &json!({"home": {"title": "Hi"}}));
        let loader = loader(RuntimeMode::Development, "http://127.0.0.1:9", tmp.path());

        let err = loader.load_complete("en").await.unwrap_err();

        assert_eq!(err.tier, Tier::Deferred);
        assert_eq!(err.to_string(), "Cannot load deferred messages for en");
    }

    #[tokio::test]
    async fn test_complete_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("messages");
        write_tier(&source, Locale::Zh, Tier::Critical, &json!({"nav": {"home": "首页"}}));
        write_tier(&source, Locale::Zh, Tier::Deferred, &json!({"nav": {"about": "关于"}}));

        for mode in [RuntimeMode::Development, RuntimeMode::Ci] {
            let loader = loader(mode, "http://127.0.0.1:9", tmp.path());
            let first = loader.load_complete("zh").await.unwrap();
            let second = loader.load_complete("zh").await.unwrap();

            assert_eq!(first, second);
            assert_eq!(
                Value::Object(first),
                json!({"nav": {"home": "首页", "about": "关于"}})
            );
        }
    }

    #[tokio::test]
    async fn test_build_mode_reads_source_dir_only() {
        let tmp = TempDir::new().unwrap();
        let public = tmp.path().join("public/messages");
        let source = tmp.path().join("messages");
        write_tier(&public, Locale::En, Tier::Critical, &json!({"from": "public"}));
        write_tier(&public, Locale::En, Tier::Deferred, &json!({"from": "public"}));
        write_tier(&source, Locale::En, Tier::Critical, &json!({"from": "source", "c": 1}));
        write_tier(&source, Locale::En, Tier::Deferred, &json!({"d": 2}));
        let loader = loader(RuntimeMode::Build, "http://127.0.0.1:9", tmp.path());

        let doc = loader.load_complete("en").await.unwrap();

        assert_eq!(Value::Object(doc), json!({"from": "source", "c": 1, "d": 2}));
        let snap = loader.metrics().snapshot();
        assert_eq!(snap.loads, 2);
        assert_eq!(snap.total_errors, 0);
    }

    #[tokio::test]
    async fn test_invalidation_picks_up_new_files() {
        let tmp = TempDir::new().unwrap();
        let public = tmp.path().join("public/messages");
        write_tier(&public, Locale::En, Tier::Critical, &json!({"v": 1}));
        write_tier(&public, Locale::En, Tier::Deferred, &json!({}));
        let loader = loader(RuntimeMode::Production, "http://127.0.0.1:9", tmp.path());

        assert_eq!(loader.load_complete("en").await.unwrap()["v"], json!(1));

        write_tier(&public, Locale::En, Tier::Critical, &json!({"v": 2}));
        assert_eq!(loader.load_complete("en").await.unwrap()["v"], json!(1));

        assert_eq!(loader.invalidate_tag("i18n:critical:en").await, 1);
        assert_eq!(loader.load_complete("en").await.unwrap()["v"], json!(2));

        let snap = loader.metrics().snapshot();
        assert_eq!(snap.cache_hits, 3);
        assert_eq!(snap.cache_misses, 3);
    }
}
