//! Navigator self-consistency: engine markers and language lists.

use super::{LieDetectionResult, Severity};
use crate::ua::{browser_from_user_agent, os_from_user_agent, BrowserFamily, OsFamily};

pub const BROWSER_CHECK: &str = "browser_mismatch";
pub const BROWSER_SEVERITY: Severity = Severity::High;

pub const LANGUAGE_CHECK: &str = "language_mismatch";
pub const LANGUAGE_SEVERITY: Severity = Severity::Low;

const GOOGLE_VENDOR: &str = "Google Inc.";
const APPLE_VENDOR: &str = "Apple Computer, Inc.";
const GECKO_PRODUCT_SUB: &str = "20100101";
const WEBKIT_PRODUCT_SUB: &str = "20030107";

/// (vendor, productSub) a genuine browser of this family reports.
fn expected_markers(browser: BrowserFamily, os: Option<OsFamily>) -> (&'static str, &'static str) {
    // Every iOS browser is WebKit underneath.
    if os == Some(OsFamily::Ios) {
        return (APPLE_VENDOR, WEBKIT_PRODUCT_SUB);
    }
    match browser {
        BrowserFamily::Firefox => ("", GECKO_PRODUCT_SUB),
        BrowserFamily::Safari => (APPLE_VENDOR, WEBKIT_PRODUCT_SUB),
        _ => (GOOGLE_VENDOR, WEBKIT_PRODUCT_SUB),
    }
}

/// UA browser family vs `navigator.vendor` and `navigator.productSub`.
pub fn detect_browser_mismatch(
    user_agent: &str,
    vendor: Option<&str>,
    product_sub: Option<&str>,
) -> LieDetectionResult {
    if user_agent.is_empty() || (vendor.is_none() && product_sub.is_none()) {
        return LieDetectionResult::insufficient(
            BROWSER_CHECK,
            BROWSER_SEVERITY,
            "user agent or engine markers unavailable",
        );
    }
    let Some((browser, _)) = browser_from_user_agent(user_agent) else {
        return LieDetectionResult::consistent(BROWSER_CHECK, BROWSER_SEVERITY, "unrecognized browser");
    };

    let (want_vendor, want_sub) = expected_markers(browser, os_from_user_agent(user_agent));
    let mut problems = Vec::new();
    if let Some(vendor) = vendor.filter(|v| *v != want_vendor) {
        problems.push(format!("vendor {:?}, expected {:?}", vendor, want_vendor));
    }
    if let Some(sub) = product_sub.filter(|s| *s != want_sub) {
        problems.push(format!("productSub {:?}, expected {:?}", sub, want_sub));
    }

    if problems.is_empty() {
        LieDetectionResult::consistent(
            BROWSER_CHECK,
            BROWSER_SEVERITY,
            format!("{} engine markers match", browser.name()),
        )
    } else {
        LieDetectionResult::mismatch(
            BROWSER_CHECK,
            BROWSER_SEVERITY,
            format!("user agent claims {}: {}", browser.name(), problems.join("; ")),
        )
    }
}

fn base_language(tag: &str) -> String {
    tag.split(['-', '_'])
        .next()
        .unwrap_or(tag)
        .to_ascii_lowercase()
}

/// `language` must lead `languages`; the Intl locale's base language should
/// be among them.
pub fn detect_language_mismatch(
    language: Option<&str>,
    languages: &[&str],
    intl_locale: Option<&str>,
) -> LieDetectionResult {
    let language = language.filter(|l| !l.is_empty());
    if language.is_none() && languages.is_empty() {
        return LieDetectionResult::insufficient(
            LANGUAGE_CHECK,
            LANGUAGE_SEVERITY,
            "navigator language unavailable",
        );
    }

    if let (Some(lang), Some(first)) = (language, languages.first()) {
        if !lang.eq_ignore_ascii_case(first) {
            return LieDetectionResult::mismatch(
                LANGUAGE_CHECK,
                LANGUAGE_SEVERITY,
                format!("language {:?} but languages[0] {:?}", lang, first),
            );
        }
    }

    if let Some(locale) = intl_locale.filter(|l| !l.is_empty()) {
        let wanted = base_language(locale);
        let known = languages
            .iter()
            .copied()
            .chain(language)
            .any(|tag| base_language(tag) == wanted);
        if !known {
            return LieDetectionResult::mismatch(
                LANGUAGE_CHECK,
                LANGUAGE_SEVERITY,
                format!("Intl locale {:?} not among navigator languages {:?}", locale, languages),
            );
        }
    }

    LieDetectionResult::consistent(LANGUAGE_CHECK, LANGUAGE_SEVERITY, "languages agree")
}
