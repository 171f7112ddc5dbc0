//! The per-scan report handed to callers.

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::aggregator::ThreeLockHashes;
use crate::dimension::FingerprintData;
use crate::error::Result;
use crate::lies::AllLies;

/// Everything one scan produced. Built once, never mutated after return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullFingerprintReport {
    pub schema_version: u32,
    /// Scan start, epoch milliseconds.
    pub timestamp: u64,
    pub duration_ms: u64,
    pub dimensions: FingerprintData,
    pub hashes: ThreeLockHashes,
    pub lies: AllLies,
}

impl FullFingerprintReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Plain JS object (no `Map`s), ready to `JSON.stringify` or post.
    pub fn to_js(&self) -> Result<JsValue> {
        to_js_value(self)
    }
}

/// Serialize into plain JS objects rather than `Map`s.
pub fn to_js_value<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    Ok(value.serialize(&serializer)?)
}

/// Whole milliseconds from a JS time value. Negative and NaN clamp to zero.
pub(crate) fn whole_ms(ms: f64) -> u64 {
    if ms.is_finite() && ms > 0.0 {
        ms.round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::three_lock_hashes;
    use crate::dimension::DimensionValue;
    use crate::lies::detect_all_lies;

    #[test]
    fn test_json_shape() {
        let dimensions: FingerprintData = vec![
            ("sys_platform", DimensionValue::from("Win32")),
            ("hw_device_memory", DimensionValue::Unavailable),
        ]
        .into_iter()
        .collect();
        let report = FullFingerprintReport {
            schema_version: 1,
            timestamp: 1_700_000_000_000,
            duration_ms: 42,
            hashes: three_lock_hashes(&dimensions),
            lies: detect_all_lies(&dimensions, 1_700_000_000_000.0),
            dimensions,
        };

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["schemaVersion"], 1);
        assert_eq!(json["durationMs"], 42);
        assert_eq!(json["dimensions"]["sys_platform"], "Win32");
        assert!(json["dimensions"]["hw_device_memory"].is_null());
        assert_eq!(json["hashes"]["gold"].as_str().unwrap().len(), 64);
        assert!(json["lies"]["checks"].is_array());
        assert!(json["lies"]["lieScore"].is_number());
    }

    #[test]
    fn test_whole_ms() {
        assert_eq!(whole_ms(12.6), 13);
        assert_eq!(whole_ms(-3.0), 0);
        assert_eq!(whole_ms(f64::NAN), 0);
    }
}
