use serde::Serialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use utoipa::ToSchema;

const DEFAULT_PORT: &str = "8080";
const DEFAULT_REVALIDATE_SECS: u64 = 3600;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 4;
const DEVELOPMENT_REVALIDATE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    /// Static build: tier files are read straight from disk, nothing fetched.
    Build,
    Development,
    /// CI / end-to-end runs: disk only, every call bypasses the cache.
    Ci,
    Production,
}

impl RuntimeMode {
    /**
     * detect
     * 根据环境变量判断运行模式，优先级 Build > Ci > Development > Production。
     * 通过 lookup 注入读取方式，测试中无需修改进程环境。
     */
    pub fn detect<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is = |key: &str, expected: &str| {
            lookup(key)
                .map(|v| v.trim().eq_ignore_ascii_case(expected))
                .unwrap_or(false)
        };

        if is("APP_PHASE", "build") {
            RuntimeMode::Build
        } else if is("CI", "true") || is("PLAYWRIGHT_TEST", "true") {
            RuntimeMode::Ci
        } else if is("APP_ENV", "development") {
            RuntimeMode::Development
        } else {
            RuntimeMode::Production
        }
    }

    /// Only production-serving mode goes over the network first.
    pub fn uses_network(self) -> bool {
        self == RuntimeMode::Production
    }

    pub fn bypasses_cache(self) -> bool {
        self == RuntimeMode::Ci
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuntimeMode::Build => "build",
            RuntimeMode::Development => "development",
            RuntimeMode::Ci => "ci",
            RuntimeMode::Production => "production",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub mode: RuntimeMode,
    pub base_url: String,
    pub public_dir: PathBuf,
    pub source_dir: PathBuf,
    pub revalidate: Duration,
    pub http_timeout: Duration,
}

impl LoaderConfig {
    pub fn new(mode: RuntimeMode, base_url: impl Into<String>) -> Self {
        Self {
            mode,
            base_url: normalize_base_url(&base_url.into()),
            public_dir: PathBuf::from("public/messages"),
            source_dir: PathBuf::from("messages"),
            revalidate: Duration::from_secs(DEFAULT_REVALIDATE_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = RuntimeMode::detect(&lookup);
        let port = lookup("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        let base_url = lookup("PUBLIC_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let mut config = Self::new(mode, base_url);
        if let Some(dir) = lookup("MESSAGES_PUBLIC_DIR") {
            config.public_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("MESSAGES_SOURCE_DIR") {
            config.source_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse_secs(lookup("MESSAGES_REVALIDATE_SECS")) {
            config.revalidate = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_secs(lookup("MESSAGES_HTTP_TIMEOUT_SECS")) {
            config.http_timeout = Duration::from_secs(secs);
        }
        config
    }

    pub fn with_dirs(mut self, public_dir: impl Into<PathBuf>, source_dir: impl Into<PathBuf>) -> Self {
        self.public_dir = public_dir.into();
        self.source_dir = source_dir.into();
        self
    }

    /**
     * cache_ttl
     * 缓存重新验证周期：开发模式下几乎总是最新，其余模式使用配置值。
     */
    pub fn cache_ttl(&self) -> Duration {
        if self.mode == RuntimeMode::Development {
            DEVELOPMENT_REVALIDATE
        } else {
            self.revalidate
        }
    }
}

/**
 * normalize_base_url
 * 规范化站点 base url（去掉末尾的 /），便于拼接 path。
 */
fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

fn parse_secs(raw: Option<String>) -> Option<u64> {
    let value = raw?;
    match value.trim().parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            log::warn!("Ignoring invalid duration value: {:?}", value);
            None
        }
    }
}
