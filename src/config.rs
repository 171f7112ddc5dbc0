//! Scan configuration.
//!
//! Decoded from the options object passed to the JS entry points; every
//! field is optional and falls back to [`ScanConfig::default`].

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::error::{Result, ScanError};

/// Which SHA-256 implementation the aggregator digests with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashBackend {
    /// Pure-Rust `sha2`. Always available.
    Native,
    /// `crypto.subtle.digest`. Requires a secure context.
    WebCrypto,
}

impl Default for HashBackend {
    fn default() -> Self {
        HashBackend::WebCrypto
    }
}

/// Options for one scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Upper bound on a single collector, in milliseconds. `0` disables it.
    pub collector_timeout_ms: u32,
    /// Collectors polled at once.
    pub max_concurrent_collectors: usize,
    pub hash_backend: HashBackend,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            collector_timeout_ms: 5000,
            max_concurrent_collectors: 8,
            hash_backend: HashBackend::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ScanConfig {
    /// Decode JS options. `undefined`/`null` mean defaults; anything else
    /// must deserialize.
    pub fn from_js(options: JsValue) -> Result<Self> {
        if options.is_undefined() || options.is_null() {
            return Ok(Self::default());
        }
        let config: ScanConfig = serde_wasm_bindgen::from_value(options)
            .map_err(|e| ScanError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_collectors == 0 {
            return Err(ScanError::InvalidConfig(
                "max_concurrent_collectors must be at least 1".into(),
            ));
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<log::LevelFilter> {
        self.log_level
            .parse::<log::LevelFilter>()
            .map_err(|_| ScanError::InvalidConfig(format!("unknown log level {:?}", self.log_level)))
    }

    /// Timeout for one collector, or `None` when disabled.
    pub fn collector_timeout(&self) -> Option<u32> {
        if self.collector_timeout_ms == 0 {
            None
        } else {
            Some(self.collector_timeout_ms)
        }
    }
}
