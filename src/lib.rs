//! # Fingerprint WASM
//!
//! Browser fingerprint engine compiled to WebAssembly.
//!
//! A scan captures about a hundred named signals ("dimensions") from the
//! browser, reduces them to three stability-tiered SHA-256 hashes and runs a
//! set of consistency checks that flag spoofed signals.
//!
//! ## Architecture
//!
//! ```text
//! run_fingerprint_scan (JS)
//!   ↓
//! Scanner ── Environment (BrowserEnvironment | StaticEnvironment)
//!   ↓
//! Three-Lock aggregator ── HashPrimitive (WebCrypto | native)
//!   ↓
//! Lie detector
//!   ↓
//! FullFingerprintReport
//! ```
//!
//! ## Locks
//!
//! - **Gold**: hardware signals only, survives browser and OS changes
//! - **Silver**: system and capability signals, survives hardware changes
//! - **Bronze**: every dimension, changes with the session

use wasm_bindgen::prelude::*;

pub mod aggregator;
pub mod canonical;
pub mod collectors;
pub mod config;
pub mod digest;
pub mod dimension;
pub mod environment;
mod error;
pub mod lies;
pub mod report;
pub mod scanner;
pub mod schema;
pub mod ua;

pub use aggregator::{compute_three_lock_hashes, three_lock_hashes, ThreeLockHashes};
pub use collectors::BrowserEnvironment;
pub use config::{HashBackend, ScanConfig};
pub use digest::{hasher_for, HashPrimitive, NativeSha256, WebCryptoSha256};
pub use dimension::{DimensionValue, FingerprintData, ListItem};
pub use environment::{Environment, StaticEnvironment};
pub use error::{ErrorCode, ErrorInfo, ProbeFault, Result, ScanError};
pub use lies::{detect_all_lies, get_lie_flags, AllLies, LieDetectionResult, Severity};
pub use report::FullFingerprintReport;
pub use scanner::{ProgressObserver, ProgressUpdate, ScanEvent, ScanPhase, Scanner};
pub use schema::{DimensionFamily, LockTier, SCHEMA_VERSION};

use report::to_js_value;

/// Set up console logging. Scans narrow the level to their configured one.
#[wasm_bindgen(start)]
pub fn init() {
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&JsValue::from_str(&format!("logger already set: {}", e)));
    }

    log::info!(
        "Fingerprint engine initialized ({} dimensions, schema v{})",
        schema::dimension_count(),
        SCHEMA_VERSION
    );
}

/// Build a scanner for the live browser from JS options.
fn browser_scanner(options: JsValue) -> Result<Scanner<BrowserEnvironment>> {
    let config = ScanConfig::from_js(options)?;
    log::set_max_level(config.level_filter()?);

    let env = BrowserEnvironment::new()?;
    let hasher = hasher_for(config.hash_backend)?;
    log::info!("🔧 Hashing with {}", hasher.name());
    Ok(Scanner::new(env, hasher, config))
}

/// Run a full scan and resolve to the report object.
///
/// `options` may be `undefined`; see [`ScanConfig`] for the fields.
#[wasm_bindgen]
pub async fn run_fingerprint_scan(options: JsValue) -> std::result::Result<JsValue, JsValue> {
    let scanner = browser_scanner(options)?;
    let report = scanner.scan().await?;
    Ok(report.to_js()?)
}

/// Like [`run_fingerprint_scan`], calling `callback` with
/// `{ phase, completed, total, currentDimension }` as the scan advances.
///
/// A callback that throws is logged and otherwise ignored.
#[wasm_bindgen]
pub async fn run_fingerprint_scan_with_progress(
    options: JsValue,
    callback: js_sys::Function,
) -> std::result::Result<JsValue, JsValue> {
    let scanner = browser_scanner(options)?;

    let mut notify = |event: &ScanEvent| {
        let update = ProgressUpdate::from(event);
        match to_js_value(&update) {
            Ok(value) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    log::warn!("⚠️ Progress callback threw: {:?}", e);
                }
            }
            Err(e) => log::warn!("⚠️ Could not encode progress: {}", e),
        }
    };

    let report = scanner.scan_with_progress(&mut notify).await?;
    Ok(report.to_js()?)
}

/// Lowercase hex SHA-256 of the UTF-8 bytes of `text`.
#[wasm_bindgen]
pub fn sha256_hex(text: &str) -> String {
    canonical::sha256(text)
}

/// Hash an ordered array of primitives. `null`/`undefined` entries hash as
/// empty tokens. The separator defaults to `|`.
#[wasm_bindgen]
pub fn hash_values(values: JsValue, separator: Option<String>) -> std::result::Result<String, JsValue> {
    let values: Vec<DimensionValue> = serde_wasm_bindgen::from_value(values).map_err(ScanError::from)?;
    let separator = separator.as_deref().unwrap_or(canonical::DEFAULT_SEPARATOR);
    Ok(canonical::hash_values(&values, separator))
}

/// Hash a record independently of its key order.
#[wasm_bindgen]
pub fn hash_object(record: JsValue) -> std::result::Result<String, JsValue> {
    let record: serde_json::Value = serde_wasm_bindgen::from_value(record).map_err(ScanError::from)?;
    Ok(canonical::hash_object(&record))
}

/// Run every lie check over a `{ name: value }` record, as found in a
/// report's `dimensions`. DST-sensitive checks evaluate at `observed_at_ms`,
/// defaulting to now.
#[wasm_bindgen]
pub fn detect_lies(
    dimensions: JsValue,
    observed_at_ms: Option<f64>,
) -> std::result::Result<JsValue, JsValue> {
    let data: FingerprintData = serde_wasm_bindgen::from_value(dimensions).map_err(ScanError::from)?;
    let observed_at = observed_at_ms.unwrap_or_else(js_sys::Date::now);
    let lies = detect_all_lies(&data, observed_at);
    Ok(to_js_value(&lies)?)
}

/// Registered dimensions per family and the families each lock covers.
#[wasm_bindgen]
pub fn get_schema_info() -> std::result::Result<JsValue, JsValue> {
    let families: serde_json::Map<String, serde_json::Value> = DimensionFamily::ALL
        .iter()
        .map(|family| (family.name().to_string(), serde_json::json!(family.dimensions())))
        .collect();
    let locks: serde_json::Map<String, serde_json::Value> = LockTier::ALL
        .iter()
        .map(|tier| {
            let covered: Vec<&str> = tier.families().iter().map(|f| f.name()).collect();
            (tier.name().to_string(), serde_json::json!(covered))
        })
        .collect();

    Ok(to_js_value(&serde_json::json!({
        "schemaVersion": SCHEMA_VERSION,
        "dimensionCount": schema::dimension_count(),
        "families": families,
        "locks": locks,
    }))?)
}
