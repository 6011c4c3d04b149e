// Key lookup in loaded message documents, plus the API's own response messages

use crate::locale::Locale;
use crate::merge::Document;
use serde_json::Value;
use std::collections::HashMap;

/**
 * lookup
 * 按点分路径（如 "home.hero.title"）在文档中查找字符串叶子节点。
 */
pub fn lookup<'a>(doc: &'a Document, key: &str) -> Option<&'a str> {
    let mut segments = key.split('.');
    let first = segments.next()?;
    let mut current = doc.get(first)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    match current {
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
}

/**
 * translate
 * 先查目标 locale，再回退到默认 locale，最后返回 key 本身。
 */
pub fn translate(docs: &HashMap<Locale, Document>, locale: Locale, key: &str) -> String {
    [locale, Locale::DEFAULT]
        .iter()
        .find_map(|l| docs.get(l).and_then(|doc| lookup(doc, key)))
        .map(str::to_string)
        .unwrap_or_else(|| key.to_string())
}

pub struct ApiMessages {
    messages: HashMap<Locale, HashMap<&'static str, &'static str>>,
}

impl ApiMessages {
    pub fn new() -> Self {
        let mut messages = HashMap::new();

        let en = HashMap::from([
            ("messages_unavailable", "Translations are temporarily unavailable"),
            ("unknown_tier", "Unknown message tier"),
            ("unknown_tag", "Unknown cache tag"),
            ("cache_invalidated", "Cached translations invalidated"),
            ("not_found", "Not found"),
        ]);
        messages.insert(Locale::En, en);

        let zh = HashMap::from([
            ("messages_unavailable", "翻译内容暂时不可用"),
            ("unknown_tier", "未知的翻译分层"),
            ("unknown_tag", "未知的缓存标签"),
            ("cache_invalidated", "翻译缓存已失效"),
            ("not_found", "未找到"),
        ]);
        messages.insert(Locale::Zh, zh);

        Self { messages }
    }

    pub fn get(&self, locale: Locale, key: &str) -> String {
        [locale, Locale::DEFAULT]
            .iter()
            .find_map(|l| self.messages.get(l).and_then(|msgs| msgs.get(key)))
            .map(|s| s.to_string())
            .unwrap_or_else(|| key.to_string())
    }
}

impl Default for ApiMessages {
    fn default() -> Self {
        Self::new()
    }
}
