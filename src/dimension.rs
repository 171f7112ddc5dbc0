//! Dimension values and the per-scan fingerprint map.
//!
//! A dimension is one named signal captured from the environment. Its value
//! is always explicit: an API that is missing, blocked or threw is recorded
//! as [`DimensionValue::Unavailable`] (JSON `null`) rather than omitted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One element of a list-valued dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
    Bool(bool),
    Num(f64),
    Str(String),
    Null,
}

impl From<&str> for ListItem {
    fn from(s: &str) -> Self {
        ListItem::Str(s.to_string())
    }
}

impl From<String> for ListItem {
    fn from(s: String) -> Self {
        ListItem::Str(s)
    }
}

impl From<f64> for ListItem {
    fn from(n: f64) -> Self {
        ListItem::Num(n)
    }
}

impl From<bool> for ListItem {
    fn from(b: bool) -> Self {
        ListItem::Bool(b)
    }
}

/// A captured signal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionValue {
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<ListItem>),
    /// Probed but not obtainable (API absent, blocked, threw, timed out).
    Unavailable,
}

impl DimensionValue {
    pub fn is_available(&self) -> bool {
        !matches!(self, DimensionValue::Unavailable)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DimensionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DimensionValue::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DimensionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ListItem]> {
        match self {
            DimensionValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// String items of a list value, skipping non-strings.
    pub fn string_items(&self) -> Vec<&str> {
        self.as_list()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match item {
                        ListItem::Str(s) => Some(s.as_str()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Build a list value from anything that converts into list items.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ListItem>,
    {
        DimensionValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for DimensionValue {
    fn from(s: &str) -> Self {
        DimensionValue::Str(s.to_string())
    }
}

impl From<String> for DimensionValue {
    fn from(s: String) -> Self {
        DimensionValue::Str(s)
    }
}

impl From<f64> for DimensionValue {
    fn from(n: f64) -> Self {
        DimensionValue::Num(n)
    }
}

impl From<u32> for DimensionValue {
    fn from(n: u32) -> Self {
        DimensionValue::Num(n as f64)
    }
}

impl From<i32> for DimensionValue {
    fn from(n: i32) -> Self {
        DimensionValue::Num(n as f64)
    }
}

impl From<bool> for DimensionValue {
    fn from(b: bool) -> Self {
        DimensionValue::Bool(b)
    }
}

impl<T: Into<DimensionValue>> From<Option<T>> for DimensionValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(DimensionValue::Unavailable)
    }
}

/// All dimensions captured during one scan, keyed by dimension name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FingerprintData {
    values: BTreeMap<String, DimensionValue>,
}

impl FingerprintData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value. A dimension is captured once per scan; a second
    /// insert for the same name is ignored and returns `false`.
    pub fn insert(&mut self, name: impl Into<String>, value: DimensionValue) -> bool {
        let name = name.into();
        if self.values.contains_key(&name) {
            log::warn!("Dimension {} captured twice; keeping first value", name);
            return false;
        }
        self.values.insert(name, value);
        true
    }

    pub fn get(&self, name: &str) -> Option<&DimensionValue> {
        self.values.get(name)
    }

    /// Value for `name`, treating a missing entry as unavailable.
    pub fn value_or_unavailable(&self, name: &str) -> &DimensionValue {
        self.values.get(name).unwrap_or(&DimensionValue::Unavailable)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(DimensionValue::as_str)
    }

    pub fn num(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(DimensionValue::as_f64)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of dimensions that were captured with a real value.
    pub fn available_count(&self) -> usize {
        self.values.values().filter(|v| v.is_available()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DimensionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, DimensionValue)> for FingerprintData {
    fn from_iter<I: IntoIterator<Item = (K, DimensionValue)>>(iter: I) -> Self {
        let mut data = FingerprintData::new();
        for (name, value) in iter {
            data.insert(name, value);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_capture_wins() {
        let mut data = FingerprintData::new();
        assert!(data.insert("sys_platform", "MacIntel".into()));
        assert!(!data.insert("sys_platform", "Win32".into()));
        assert_eq!(data.str("sys_platform"), Some("MacIntel"));
    }

    #[test]
    fn test_missing_reads_as_unavailable() {
        let data = FingerprintData::new();
        assert_eq!(
            data.value_or_unavailable("hw_canvas_hash"),
            &DimensionValue::Unavailable
        );
    }

    #[test]
    fn test_json_shape() {
        let data: FingerprintData = vec![
            ("a_str", DimensionValue::from("x")),
            ("b_num", DimensionValue::from(8u32)),
            ("c_bool", DimensionValue::from(true)),
            ("d_list", DimensionValue::list(["en-US", "en"])),
            ("e_none", DimensionValue::Unavailable),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(
            json,
            r#"{"a_str":"x","b_num":8.0,"c_bool":true,"d_list":["en-US","en"],"e_none":null}"#
        );

        let back: FingerprintData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_available_count() {
        let data: FingerprintData = vec![
            ("a", DimensionValue::from("x")),
            ("b", DimensionValue::Unavailable),
        ]
        .into_iter()
        .collect();
        assert_eq!(data.len(), 2);
        assert_eq!(data.available_count(), 1);
    }
}
