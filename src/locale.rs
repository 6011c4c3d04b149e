// Supported locales, message tiers and Accept-Language negotiation

use fluent_langneg::{
    accepted_languages, negotiate_languages, LanguageIdentifier, NegotiationStrategy,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Zh,
}

impl Locale {
    pub const SUPPORTED: [Locale; 2] = [Locale::En, Locale::Zh];
    pub const DEFAULT: Locale = Locale::En;

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
        }
    }

    /**
     * parse_supported
     * 精确匹配受支持的 locale（区分大小写），不做任何归一化。
     */
    pub fn parse_supported(input: &str) -> Option<Self> {
        Self::SUPPORTED
            .iter()
            .copied()
            .find(|locale| locale.as_str() == input)
    }

    /**
     * sanitize
     * 将不可信的 locale 字符串收敛到受支持集合，未命中时返回默认 locale。
     */
    pub fn sanitize(input: &str) -> Self {
        Self::parse_supported(input).unwrap_or(Self::DEFAULT)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Critical,
    Deferred,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Critical, Tier::Deferred];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Critical => "critical",
            Tier::Deferred => "deferred",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Tier::Critical),
            "deferred" => Ok(Tier::Deferred),
            other => Err(format!("unknown message tier: {}", other)),
        }
    }
}

/**
 * negotiate_locale
 * 根据 Accept-Language 请求头协商出受支持的 locale（zh-CN → zh），缺省为默认 locale。
 */
pub fn negotiate_locale(accept_language: Option<&str>) -> Locale {
    let Some(header) = accept_language.map(str::trim).filter(|h| !h.is_empty()) else {
        return Locale::DEFAULT;
    };

    let requested = accepted_languages::parse(header);
    let available: Vec<LanguageIdentifier> = Locale::SUPPORTED
        .iter()
        .filter_map(|l| l.as_str().parse().ok())
        .collect();
    let negotiated = negotiate_languages(
        &requested,
        &available,
        None,
        NegotiationStrategy::Filtering,
    );

    negotiated
        .first()
        .and_then(|langid| Locale::parse_supported(langid.language.as_str()))
        .unwrap_or(Locale::DEFAULT)
}
