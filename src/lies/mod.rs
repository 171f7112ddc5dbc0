//! Cross-signal consistency checks.
//!
//! Each rule compares signals that should be causally linked and reports
//! whether they disagree. Rules are pure: identical inputs give identical
//! results, and a rule that lacks its inputs reports `detected: false` with
//! evidence starting with [`INSUFFICIENT_DATA`].

use serde::{Deserialize, Serialize};

use crate::dimension::FingerprintData;
use crate::schema::{
    HW_MAX_TOUCH_POINTS, HW_WEBGL_RENDERER, HW_WEBGL_UNMASKED_RENDERER, HW_WEBGL_UNMASKED_VENDOR,
    HW_WEBGL_VENDOR, SYS_INTL_LOCALE, SYS_LANGUAGE, SYS_LANGUAGES, SYS_OSCPU, SYS_PLATFORM,
    SYS_PRODUCT_SUB, SYS_TIMEZONE, SYS_TIMEZONE_OFFSET, SYS_USER_AGENT, SYS_VENDOR,
};

pub mod navigator;
pub mod os;
pub mod screen;
pub mod timezone;
pub mod webgl;

pub use navigator::{detect_browser_mismatch, detect_language_mismatch};
pub use os::{detect_os_mismatch, detect_platform_mismatch};
pub use screen::{detect_resolution_mismatch, ScreenGeometry};
pub use timezone::{detect_timezone_mismatch, detect_timezone_mismatch_at};
pub use webgl::{classify_gpu, detect_webgl_mismatch, GpuClass};

/// Evidence prefix for rules that could not run.
pub const INSUFFICIENT_DATA: &str = "insufficient data";

/// How strongly a detected mismatch indicates spoofing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Contribution of a detected check to the lie score.
    pub fn weight(self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }
}

/// Outcome of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LieDetectionResult {
    pub check: String,
    pub detected: bool,
    pub severity: Severity,
    pub evidence: String,
}

impl LieDetectionResult {
    pub fn consistent(check: &str, severity: Severity, evidence: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            detected: false,
            severity,
            evidence: evidence.into(),
        }
    }

    pub fn mismatch(check: &str, severity: Severity, evidence: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            detected: true,
            severity,
            evidence: evidence.into(),
        }
    }

    pub fn insufficient(check: &str, severity: Severity, missing: &str) -> Self {
        Self::consistent(check, severity, format!("{}: {}", INSUFFICIENT_DATA, missing))
    }

    pub fn is_insufficient(&self) -> bool {
        !self.detected && self.evidence.starts_with(INSUFFICIENT_DATA)
    }
}

/// Every rule's result plus the weighted score of the detected ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllLies {
    pub checks: Vec<LieDetectionResult>,
    pub lie_score: u32,
}

impl AllLies {
    pub fn from_checks(checks: Vec<LieDetectionResult>) -> Self {
        let lie_score = checks
            .iter()
            .filter(|c| c.detected)
            .map(|c| c.severity.weight())
            .sum();
        Self { checks, lie_score }
    }

    pub fn detected_count(&self) -> usize {
        self.checks.iter().filter(|c| c.detected).count()
    }
}

/// Run every rule over one scan's data.
///
/// `observed_at_ms` is the scan's own timestamp; the timezone rule evaluates
/// daylight saving at that instant.
pub fn detect_all_lies(data: &FingerprintData, observed_at_ms: f64) -> AllLies {
    let user_agent = data.str(SYS_USER_AGENT).unwrap_or("");
    let platform = data.str(SYS_PLATFORM).unwrap_or("");

    let timezone = match (data.str(SYS_TIMEZONE), data.num(SYS_TIMEZONE_OFFSET)) {
        (Some(_), Some(offset)) if !offset.is_finite() => LieDetectionResult::mismatch(
            timezone::CHECK,
            timezone::SEVERITY,
            format!("timezone offset {} is not a number of minutes", offset),
        ),
        (Some(zone), Some(offset)) => {
            detect_timezone_mismatch_at(zone, offset.round() as i32, observed_at_ms)
        }
        _ => LieDetectionResult::insufficient(
            timezone::CHECK,
            timezone::SEVERITY,
            "timezone name or offset unavailable",
        ),
    };

    // Prefer the unmasked strings; the masked ones are often just "WebKit".
    let renderer = data
        .str(HW_WEBGL_UNMASKED_RENDERER)
        .or_else(|| data.str(HW_WEBGL_RENDERER))
        .unwrap_or("");
    let vendor = data
        .str(HW_WEBGL_UNMASKED_VENDOR)
        .or_else(|| data.str(HW_WEBGL_VENDOR))
        .unwrap_or("");

    let languages = data
        .get(SYS_LANGUAGES)
        .map(|v| v.string_items())
        .unwrap_or_default();

    let checks = vec![
        detect_os_mismatch(user_agent, platform),
        timezone,
        detect_webgl_mismatch(renderer, vendor, user_agent),
        detect_resolution_mismatch(&ScreenGeometry::from_data(data)),
        detect_browser_mismatch(
            user_agent,
            data.str(SYS_VENDOR),
            data.str(SYS_PRODUCT_SUB),
        ),
        detect_language_mismatch(
            data.str(SYS_LANGUAGE),
            &languages,
            data.str(SYS_INTL_LOCALE),
        ),
        detect_platform_mismatch(
            platform,
            data.num(HW_MAX_TOUCH_POINTS),
            data.str(SYS_OSCPU),
        ),
    ];

    for check in checks.iter().filter(|c| c.detected) {
        log::warn!("🚩 {} ({:?}): {}", check.check, check.severity, check.evidence);
    }

    AllLies::from_checks(checks)
}

/// The detected subset of `lies`.
pub fn get_lie_flags(lies: &AllLies) -> Vec<LieDetectionResult> {
    lies.checks.iter().filter(|c| c.detected).cloned().collect()
}
