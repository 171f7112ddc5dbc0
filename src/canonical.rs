//! Canonicalization and SHA-256 hashing.
//!
//! Every hash in a report is computed over a canonical string: each value is
//! normalized to a token, tokens are joined with a separator in the caller's
//! order, and the UTF-8 bytes are hashed. The token rules are part of the
//! hash contract:
//!
//! | value            | token                                   |
//! |------------------|-----------------------------------------|
//! | unavailable/null | `""`                                    |
//! | `true` / `false` | `"1"` / `"0"`                           |
//! | string           | verbatim                                |
//! | number           | ECMAScript `Number#toString` form       |
//! | list             | items' string forms joined with `,`     |
//!
//! The boolean tokens coincide with the numbers `1` and `0`. Within one
//! dimension the declared type never mixes the two, so the collision is
//! accepted rather than fixed (changing it would change every hash).

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::dimension::{DimensionValue, ListItem};

/// Separator used between tier values.
pub const DEFAULT_SEPARATOR: &str = "|";

/// SHA-256 of the UTF-8 bytes of `text`, lowercase hex.
pub fn sha256(text: &str) -> String {
    hex::encode(sha256_bytes(text.as_bytes()))
}

/// Raw SHA-256 digest.
pub fn sha256_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Canonical token for one dimension value.
pub fn canonical_token(value: &DimensionValue) -> String {
    match value {
        DimensionValue::Unavailable => String::new(),
        DimensionValue::Bool(true) => "1".to_string(),
        DimensionValue::Bool(false) => "0".to_string(),
        DimensionValue::Str(s) => s.clone(),
        DimensionValue::Num(n) => format_number(*n),
        DimensionValue::List(items) => items
            .iter()
            .map(list_item_string)
            .collect::<Vec<_>>()
            .join(","),
    }
}

/// String form of a list item, as `String(array)` renders it.
fn list_item_string(item: &ListItem) -> String {
    match item {
        ListItem::Null => String::new(),
        ListItem::Bool(b) => b.to_string(),
        ListItem::Num(n) => format_number(*n),
        ListItem::Str(s) => s.clone(),
    }
}

/// Join canonical tokens with `separator`, preserving order.
pub fn canonical_join<'a, I>(values: I, separator: &str) -> String
where
    I: IntoIterator<Item = &'a DimensionValue>,
{
    values
        .into_iter()
        .map(canonical_token)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Hash an ordered list of values. Order is significant.
pub fn hash_values<'a, I>(values: I, separator: &str) -> String
where
    I: IntoIterator<Item = &'a DimensionValue>,
{
    sha256(&canonical_join(values, separator))
}

/// Hash a record independently of key insertion order.
///
/// Keys are sorted, each entry becomes `key:token`, and entries are joined
/// with `|`. Nested objects and arrays are rendered as stable JSON.
pub fn hash_object(record: &Value) -> String {
    sha256(&canonical_object(record))
}

/// The canonical string [`hash_object`] hashes.
pub fn canonical_object(record: &Value) -> String {
    match record {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            keys.into_iter()
                .map(|k| format!("{}:{}", k, json_token(&map[k.as_str()])))
                .collect::<Vec<_>>()
                .join(DEFAULT_SEPARATOR)
        }
        other => json_token(other),
    }
}

fn json_token(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => json_number(n),
        Value::Array(_) | Value::Object(_) => stable_json(value),
    }
}

fn json_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        format_number(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// JSON with object keys sorted at every depth and no whitespace.
pub fn stable_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let body = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        Value::String(k.clone()),
                        stable_json(&map[k.as_str()])
                    )
                })
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{}}}", body)
        }
        Value::Array(items) => {
            let body = items.iter().map(stable_json).collect::<Vec<_>>().join(",");
            format!("[{}]", body)
        }
        Value::Number(n) => json_number(n),
        other => other.to_string(),
    }
}

/// Format a number the way ECMAScript `Number#toString` does.
///
/// Rust's `Display` already yields the shortest round-trip digits; this only
/// fixes the spots where the two disagree (non-finite values, negative zero,
/// and the exponent thresholds).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let abs = n.abs();
    if abs >= 1e21 || abs < 1e-6 {
        // `{:e}` gives "1.5e-7" / "1e21"; ECMAScript writes "1e+21".
        let formatted = format!("{:e}", n);
        match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        }
    } else {
        format!("{}", n)
    }
}
