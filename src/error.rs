//! Error types for the fingerprint engine
//!
//! Two layers:
//! - [`ProbeFault`]: why a single collector produced no value. Always
//!   recovered locally and recorded as an unavailable dimension.
//! - [`ScanError`]: errors that reach the caller. Only hashing failures are
//!   fatal to a scan; the rest come from the JS-facing surface.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Hashing errors (1xx) - FATAL
    HashUnavailable = 100,
    DigestFailed = 101,

    // Environment errors (2xx)
    NoBrowserContext = 200,

    // Configuration errors (3xx)
    ConfigError = 300,

    // Serialization errors (4xx)
    SerializationError = 400,

    // Internal errors (9xx)
    InternalError = 900,
}

/// Main error type for fingerprint scans
#[derive(Error, Debug, Clone)]
pub enum ScanError {
    // ===== Hashing Errors (FATAL) =====
    #[error("Hash primitive unavailable: {0}")]
    HashUnavailable(String),

    #[error("Digest failed: {0}")]
    Digest(String),

    // ===== Environment Errors =====
    #[error("No browser context: {0}")]
    NoBrowserContext(String),

    // ===== Configuration Errors =====
    #[error("Invalid scan options: {0}")]
    InvalidConfig(String),

    // ===== Serialization Errors =====
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ===== Internal Errors =====
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// Get the error code for programmatic handling
    pub fn code(&self) -> ErrorCode {
        match self {
            ScanError::HashUnavailable(_) => ErrorCode::HashUnavailable,
            ScanError::Digest(_) => ErrorCode::DigestFailed,
            ScanError::NoBrowserContext(_) => ErrorCode::NoBrowserContext,
            ScanError::InvalidConfig(_) => ErrorCode::ConfigError,
            ScanError::Serialization(_) => ErrorCode::SerializationError,
            ScanError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Whether this error aborts the scan.
    ///
    /// A report without hashes is not a valid identity record, so any
    /// failure of the hash primitive is fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::HashUnavailable(_) | ScanError::Digest(_))
    }

    /// Whether this error requires user action (configuration change, etc.)
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidConfig(_) | ScanError::HashUnavailable(_)
        )
    }

    /// Get a user-friendly message for display
    pub fn user_message(&self) -> String {
        match self {
            ScanError::HashUnavailable(_) => {
                "This browser does not expose a usable SHA-256 implementation.".into()
            }
            ScanError::Digest(_) => "Computing the fingerprint hashes failed.".into(),
            ScanError::NoBrowserContext(_) => {
                "The fingerprint scan must run inside a browser window.".into()
            }
            ScanError::InvalidConfig(_) => {
                "The scan options could not be read. Please check their format.".into()
            }
            ScanError::Serialization(_) => "The fingerprint report could not be encoded.".into(),
            ScanError::Internal(_) => "An internal error occurred. Please report this bug.".into(),
        }
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> String {
        match self {
            ScanError::HashUnavailable(_) => {
                "Serve the page over HTTPS (WebCrypto needs a secure context) or use the `native` hash backend."
                    .into()
            }
            ScanError::InvalidConfig(_) => {
                "Pass an options object such as `{ collector_timeout_ms: 5000 }`, or omit it for defaults."
                    .into()
            }
            ScanError::NoBrowserContext(_) => {
                "Call the scan from the main window, not from a worker.".into()
            }
            _ => "Please try again. If the problem persists, report a bug.".into(),
        }
    }
}

impl From<ScanError> for JsValue {
    fn from(err: ScanError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

impl From<serde_json::Error> for ScanError {
    fn from(err: serde_json::Error) -> Self {
        ScanError::Serialization(err.to_string())
    }
}

impl From<serde_wasm_bindgen::Error> for ScanError {
    fn from(err: serde_wasm_bindgen::Error) -> Self {
        ScanError::Serialization(err.to_string())
    }
}

/// Error information for JavaScript consumption
#[derive(Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: u32,
    pub message: String,
    pub user_message: String,
    pub recovery_suggestion: String,
    pub is_fatal: bool,
}

impl From<&ScanError> for ErrorInfo {
    fn from(err: &ScanError) -> Self {
        ErrorInfo {
            code: err.code() as u32,
            message: err.to_string(),
            user_message: err.user_message(),
            recovery_suggestion: err.recovery_suggestion(),
            is_fatal: err.is_fatal(),
        }
    }
}

/// Why a collector produced no value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProbeFault {
    /// The API does not exist in this environment.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The platform API threw.
    #[error("threw: {0}")]
    Threw(String),

    /// The probe did not settle within the collector timeout.
    #[error("timed out after {0}ms")]
    TimedOut(u32),

    /// No collector is registered under this name.
    #[error("unknown dimension")]
    UnknownDimension,
}

impl ProbeFault {
    /// Build a `Threw` fault from a JS exception value.
    pub fn from_js(err: &JsValue) -> Self {
        let message = err
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(err, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{:?}", err));
        ProbeFault::Threw(message)
    }
}

impl From<JsValue> for ProbeFault {
    fn from(err: JsValue) -> Self {
        ProbeFault::from_js(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(ScanError::HashUnavailable("no subtle".into()).is_fatal());
        assert!(ScanError::Digest("boom".into()).is_fatal());

        // Non-fatal errors
        assert!(!ScanError::InvalidConfig("bad".into()).is_fatal());
        assert!(!ScanError::NoBrowserContext("worker".into()).is_fatal());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ScanError::HashUnavailable("x".into()).code(),
            ErrorCode::HashUnavailable
        );
        assert_eq!(ScanError::Digest("x".into()).code(), ErrorCode::DigestFailed);
        assert_eq!(
            ScanError::InvalidConfig("x".into()).code(),
            ErrorCode::ConfigError
        );
    }

    #[test]
    fn test_error_info() {
        let err = ScanError::HashUnavailable("crypto.subtle is undefined".into());
        let info = ErrorInfo::from(&err);
        assert_eq!(info.code, 100);
        assert!(info.is_fatal);
        assert!(info.message.contains("crypto.subtle"));
        assert!(info.recovery_suggestion.contains("HTTPS"));
    }

    #[test]
    fn test_probe_fault_display() {
        assert_eq!(ProbeFault::TimedOut(250).to_string(), "timed out after 250ms");
        assert_eq!(
            ProbeFault::Unsupported("navigator.getBattery".into()).to_string(),
            "unsupported: navigator.getBattery"
        );
    }
}
