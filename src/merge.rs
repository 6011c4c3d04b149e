// Deep merge for translation documents

use serde_json::{Map, Value};

pub type Document = Map<String, Value>;

/// Keys that must never be written into a merged document, at any depth.
pub const RESERVED_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/**
 * merge
 * 深度合并两个文档：source 覆盖 target，嵌套对象递归合并，数组整体替换。
 * 不修改入参；source 中的保留键（__proto__ / constructor / prototype）在任意层级都会被丢弃。
 */
pub fn merge(target: &Document, source: &Document) -> Document {
    let mut result = target.clone();

    for (key, source_value) in source {
        if is_reserved_key(key) {
            continue;
        }

        let merged = match (source_value, result.get(key)) {
            (Value::Object(source_obj), Some(Value::Object(target_obj))) => {
                Value::Object(merge(target_obj, source_obj))
            }
            _ => strip_reserved(source_value),
        };
        result.insert(key.clone(), merged);
    }

    result
}

// Copies a value taken from an untrusted document without its reserved keys.
fn strip_reserved(value: &Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .filter(|(key, _)| !is_reserved_key(key))
                .map(|(key, v)| (key.clone(), strip_reserved(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_reserved).collect()),
        other => other.clone(),
    }
}
