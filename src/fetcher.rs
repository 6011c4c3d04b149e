// Tiered message fetcher: network first in production, then public dir, then source dir

use crate::config::LoaderConfig;
use crate::locale::{Locale, Tier};
use crate::merge::Document;
use crate::metrics::LoadMetrics;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// All sources for one (tier, locale) were exhausted.
#[derive(Debug, Error)]
#[error("Cannot load {tier} messages for {locale}")]
pub struct LoadError {
    pub tier: Tier,
    pub locale: Locale,
    /// One entry per failed source, in the order they were tried.
    pub attempts: Vec<String>,
}

/// A single failed attempt. Logged and absorbed, never returned on its own.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP fetch of {url} failed: {source}")]
    Http {
        url: String,
        source: reqwest::Error,
    },
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON in {origin}: {source}")]
    Parse {
        origin: String,
        source: serde_json::Error,
    },
    #[error("{origin} is not a JSON object")]
    NotAnObject { origin: String },
}

#[async_trait]
pub trait TierSource: Send + Sync {
    async fn fetch_tier(&self, locale: Locale, tier: Tier) -> Result<Document, LoadError>;
}

pub struct MessageFetcher {
    config: Arc<LoaderConfig>,
    client: Client,
    metrics: Arc<LoadMetrics>,
}

impl MessageFetcher {
    pub fn new(config: Arc<LoaderConfig>, metrics: Arc<LoadMetrics>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            config,
            client,
            metrics,
        })
    }

    /**
     * fetch_remote
     * 从站点自身的 /messages/{locale}/{tier}.json 拉取翻译文件，非 2xx 视为失败。
     */
    async fn fetch_remote(&self, locale: Locale, tier: Tier) -> Result<Document, SourceError> {
        let url = format!(
            "{}/messages/{}/{}",
            self.config.base_url,
            locale,
            tier.file_name()
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| SourceError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| SourceError::Http {
                url: url.clone(),
                source,
            })?;
        parse_document(&body, &url)
    }

    /**
     * load_with_fallback
     * 依次读取 public 目录与 source 目录，第一个可读且可解析的文件胜出。
     */
    async fn load_with_fallback(
        &self,
        locale: Locale,
        tier: Tier,
        mut attempts: Vec<String>,
    ) -> Result<Document, LoadError> {
        let roots = [
            ("public", &self.config.public_dir),
            ("source", &self.config.source_dir),
        ];

        for (label, root) in roots {
            match read_tier_file(root, locale, tier).await {
                Ok(doc) => return Ok(doc),
                Err(e) => {
                    log::error!("Failed to read {} from {} for {}: {}", tier, label, locale, e);
                    self.metrics.record_filesystem_failure();
                    attempts.push(e.to_string());
                }
            }
        }

        Err(self.exhausted(locale, tier, attempts))
    }

    /**
     * load_from_source
     * 构建阶段直接读取 source 目录，不经过网络与 public 目录。
     */
    pub async fn load_from_source(&self, locale: Locale, tier: Tier) -> Result<Document, LoadError> {
        match read_tier_file(&self.config.source_dir, locale, tier).await {
            Ok(doc) => Ok(doc),
            Err(e) => {
                log::error!("Failed to read {} from source for {}: {}", tier, locale, e);
                self.metrics.record_filesystem_failure();
                Err(self.exhausted(locale, tier, vec![e.to_string()]))
            }
        }
    }

    /// Reads a tier from the public directory only, as served to clients.
    pub async fn read_public(&self, locale: Locale, tier: Tier) -> Result<Document, SourceError> {
        read_tier_file(&self.config.public_dir, locale, tier).await
    }

    fn exhausted(&self, locale: Locale, tier: Tier, attempts: Vec<String>) -> LoadError {
        self.metrics.record_load_error();
        LoadError {
            tier,
            locale,
            attempts,
        }
    }
}

#[async_trait]
impl TierSource for MessageFetcher {
    async fn fetch_tier(&self, locale: Locale, tier: Tier) -> Result<Document, LoadError> {
        let mut attempts = Vec::new();

        if self.config.mode.uses_network() {
            match self.fetch_remote(locale, tier).await {
                Ok(doc) => return Ok(doc),
                Err(e) => {
                    log::error!("HTTP fetch of {} failed for {}: {}", tier, locale, e);
                    self.metrics.record_network_failure();
                    attempts.push(e.to_string());
                }
            }
        }

        self.load_with_fallback(locale, tier, attempts).await
    }
}

pub fn tier_path(root: &Path, locale: Locale, tier: Tier) -> PathBuf {
    root.join(locale.as_str()).join(tier.file_name())
}

async fn read_tier_file(root: &Path, locale: Locale, tier: Tier) -> Result<Document, SourceError> {
    let path = tier_path(root, locale, tier);
    let content = tokio::fs::read(&path)
        .await
        .map_err(|source| SourceError::Io {
            path: path.clone(),
            source,
        })?;
    parse_document(&content, &path.display().to_string())
}

fn parse_document(bytes: &[u8], origin: &str) -> Result<Document, SourceError> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => Err(SourceError::NotAnObject {
            origin: origin.to_string(),
        }),
        Err(source) => Err(SourceError::Parse {
            origin: origin.to_string(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeMode;
    use crate::test_support::{spawn_upstream, write_raw, write_tier, UpstreamRoute};
    use serde_json::json;
    use tempfile::TempDir;

    struct Dirs {
        _tmp: TempDir,
        public: PathBuf,
        source: PathBuf,
    }

    fn dirs() -> Dirs {
        let tmp = TempDir::new().unwrap();
        let public = tmp.path().join("public/messages");
        let source = tmp.path().join("messages");
        Dirs {
            _tmp: tmp,
            public,
            source,
        }
    }

    fn fetcher(mode: RuntimeMode, base_url: &str, dirs: &Dirs) -> (MessageFetcher, Arc<LoadMetrics>) {
        let mut config = LoaderConfig::new(mode, base_url).with_dirs(&dirs.public, &dirs.source);
        config.http_timeout = std::time::Duration::from_secs(2);
        let metrics = Arc::new(LoadMetrics::new());
        let fetcher = MessageFetcher::new(Arc::new(config), metrics.clone()).unwrap();
        (fetcher, metrics)
    }

    #[tokio::test]
    async fn test_public_dir_wins_over_source() {
        let dirs = dirs();
        write_tier(&dirs.public, Locale::En, Tier::Critical, &json!({"from": "public"}));
        write_tier(&dirs.source, Locale::En, Tier::Critical, &json!({"from": "source"}));
        let (fetcher, _) = fetcher(RuntimeMode::Development, "http://127.0.0.1:9", &dirs);

        let doc = fetcher.fetch_tier(Locale::En, Tier::Critical).await.unwrap();

        assert_eq!(doc["from"], json!("public"));
    }

    #[tokio::test]
    async fn test_falls_back_to_source_when_public_is_invalid() {
        let dirs = dirs();
        write_raw(&dirs.public, Locale::Zh, Tier::Deferred, "{ not json");
        write_tier(&dirs.source, Locale::Zh, Tier::Deferred, &json!({"from": "source"}));
        let (fetcher, metrics) = fetcher(RuntimeMode::Ci, "http://127.0.0.1:9", &dirs);

        let doc = fetcher.fetch_tier(Locale::Zh, Tier::Deferred).await.unwrap();

        assert_eq!(doc["from"], json!("source"));
        assert_eq!(metrics.snapshot().filesystem_failures, 1);
    }

    #[tokio::test]
    async fn test_non_object_document_is_rejected() {
        let dirs = dirs();
        write_raw(&dirs.public, Locale::En, Tier::Critical, "[1, 2, 3]");
        let (fetcher, _) = fetcher(RuntimeMode::Development, "http://127.0.0.1:9", &dirs);

        let err = fetcher.fetch_tier(Locale::En, Tier::Critical).await.unwrap_err();

        assert_eq!(err.attempts.len(), 2);
        assert!(err.attempts[0].contains("is not a JSON object"));
    }

    #[tokio::test]
    async fn test_all_sources_fail() {
        let dirs = dirs();
        let (fetcher, metrics) = fetcher(RuntimeMode::Production, "http://127.0.0.1:9", &dirs);

        let err = fetcher.fetch_tier(Locale::En, Tier::Critical).await.unwrap_err();

        assert!(err.to_string().contains("Cannot load critical messages for en"));
        assert_eq!(err.attempts.len(), 3);
        let snap = metrics.snapshot();
        assert_eq!(snap.network_failures, 1);
        assert_eq!(snap.filesystem_failures, 2);
        assert_eq!(snap.total_errors, 1);
    }

    #[tokio::test]
    async fn test_production_uses_network_first() {
        let dirs = dirs();
        write_tier(&dirs.public, Locale::Zh, Tier::Deferred, &json!({"from": "public"}));
        let base = spawn_upstream(vec![UpstreamRoute::ok(
            "/messages/zh/deferred.json",
            json!({"from": "network"}),
        )]);
        let (fetcher, _) = fetcher(RuntimeMode::Production, &base, &dirs);

        let doc = fetcher.fetch_tier(Locale::Zh, Tier::Deferred).await.unwrap();

        assert_eq!(doc["from"], json!("network"));
    }

    #[tokio::test]
    async fn test_non_2xx_falls_through_to_disk() {
        let dirs = dirs();
        write_tier(&dirs.source, Locale::En, Tier::Deferred, &json!({"from": "source"}));
        let base = spawn_upstream(vec![UpstreamRoute::status(
            "/messages/en/deferred.json",
            500,
            "boom",
        )]);
        let (fetcher, metrics) = fetcher(RuntimeMode::Production, &base, &dirs);

        let doc = fetcher.fetch_tier(Locale::En, Tier::Deferred).await.unwrap();

        assert_eq!(doc["from"], json!("source"));
        assert_eq!(metrics.snapshot().network_failures, 1);
    }

    #[tokio::test]
    async fn test_development_never_touches_network() {
        let dirs = dirs();
        write_tier(&dirs.public, Locale::En, Tier::Critical, &json!({"from": "public"}));
        let base = spawn_upstream(vec![UpstreamRoute::ok(
            "/messages/en/critical.json",
            json!({"from": "network"}),
        )]);
        let (fetcher, metrics) = fetcher(RuntimeMode::Development, &base, &dirs);

        let doc = fetcher.fetch_tier(Locale::En, Tier::Critical).await.unwrap();

        assert_eq!(doc["from"], json!("public"));
        assert_eq!(metrics.snapshot().network_failures, 0);
    }

    #[tokio::test]
    async fn test_load_from_source_ignores_public() {
        let dirs = dirs();
        write_tier(&dirs.public, Locale::En, Tier::Critical, &json!({"from": "public"}));
        let (fetcher, _) = fetcher(RuntimeMode::Build, "http://127.0.0.1:9", &dirs);

        let err = fetcher.load_from_source(Locale::En, Tier::Critical).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot load critical messages for en");

        write_tier(&dirs.source, Locale::En, Tier::Critical, &json!({"from": "source"}));
        let doc = fetcher.load_from_source(Locale::En, Tier::Critical).await.unwrap();
        assert_eq!(doc["from"], json!("source"));
    }
}
