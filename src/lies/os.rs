//! OS consistency: User-Agent vs `navigator.platform` vs `navigator.oscpu`.

use super::{LieDetectionResult, Severity};
use crate::ua::{os_from_platform, os_from_user_agent, OsFamily};

pub const CHECK: &str = "os_mismatch";
pub const SEVERITY: Severity = Severity::High;

pub const PLATFORM_CHECK: &str = "platform_mismatch";
pub const PLATFORM_SEVERITY: Severity = Severity::Medium;

/// ChromeOS reports a Linux platform string.
fn normalize(os: OsFamily) -> OsFamily {
    match os {
        OsFamily::ChromeOs => OsFamily::Linux,
        other => other,
    }
}

/// Whether a UA OS and a platform OS can come from the same device.
fn compatible(claimed: OsFamily, observed: OsFamily) -> bool {
    let (claimed, observed) = (normalize(claimed), normalize(observed));
    // Android devices report "Linux armv8l" and friends.
    claimed == observed || (claimed == OsFamily::Android && observed == OsFamily::Linux)
}

/// UA OS family vs the OS family implied by `navigator.platform`.
pub fn detect_os_mismatch(user_agent: &str, platform: &str) -> LieDetectionResult {
    if user_agent.is_empty() || platform.is_empty() {
        return LieDetectionResult::insufficient(CHECK, SEVERITY, "user agent or platform unavailable");
    }

    let (claimed, observed) = match (os_from_user_agent(user_agent), os_from_platform(platform)) {
        (Some(c), Some(o)) => (c, o),
        (None, _) => {
            return LieDetectionResult::consistent(CHECK, SEVERITY, "unrecognized user agent OS")
        }
        (_, None) => {
            return LieDetectionResult::consistent(
                CHECK,
                SEVERITY,
                format!("unrecognized platform {:?}", platform),
            )
        }
    };

    if compatible(claimed, observed) {
        LieDetectionResult::consistent(
            CHECK,
            SEVERITY,
            format!("user agent {} matches platform {:?}", claimed.name(), platform),
        )
    } else {
        LieDetectionResult::mismatch(
            CHECK,
            SEVERITY,
            format!(
                "user agent claims {} but platform {:?} implies {}",
                claimed.name(),
                platform,
                observed.name()
            ),
        )
    }
}

/// Platform vs touch support, and platform vs Firefox's `oscpu`.
pub fn detect_platform_mismatch(
    platform: &str,
    max_touch_points: Option<f64>,
    oscpu: Option<&str>,
) -> LieDetectionResult {
    if platform.is_empty() {
        return LieDetectionResult::insufficient(PLATFORM_CHECK, PLATFORM_SEVERITY, "platform unavailable");
    }
    let platform_os = os_from_platform(platform);

    if let (Some(os), Some(points)) = (platform_os, max_touch_points) {
        if os.is_mobile() && points <= 0.0 {
            return LieDetectionResult::mismatch(
                PLATFORM_CHECK,
                PLATFORM_SEVERITY,
                format!("mobile platform {:?} reports no touch points", platform),
            );
        }
    }

    // oscpu is Firefox-only; it reads like the UA's OS token.
    if let Some(oscpu) = oscpu.filter(|s| !s.is_empty()) {
        if let (Some(os), Some(cpu_os)) = (platform_os, os_from_user_agent(oscpu)) {
            if !compatible(cpu_os, os) {
                return LieDetectionResult::mismatch(
                    PLATFORM_CHECK,
                    PLATFORM_SEVERITY,
                    format!(
                        "oscpu {:?} implies {} but platform {:?} implies {}",
                        oscpu,
                        cpu_os.name(),
                        platform,
                        os.name()
                    ),
                );
            }
        }
    }

    if max_touch_points.is_none() && oscpu.is_none() {
        return LieDetectionResult::insufficient(
            PLATFORM_CHECK,
            PLATFORM_SEVERITY,
            "touch points and oscpu unavailable",
        );
    }

    LieDetectionResult::consistent(
        PLATFORM_CHECK,
        PLATFORM_SEVERITY,
        format!("platform {:?} consistent with touch and oscpu", platform),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_ua_on_mac_platform() {
        assert!(detect_os_mismatch("Mozilla/5.0 (Windows NT 10.0; Win64; x64)", "MacIntel").detected);
    }

    #[test]
    fn test_mac_ua_on_mac_platform() {
        assert!(!detect_os_mismatch("Mozilla/5.0 (Macintosh; Intel Mac OS X 13_0)", "MacIntel").detected);
    }

    #[test]
    fn test_android_on_linux_platform() {
        let ua = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36";
        assert!(!detect_os_mismatch(ua, "Linux armv8l").detected);
        assert!(detect_os_mismatch(ua, "Win32").detected);
    }

    #[test]
    fn test_chromeos_reports_linux() {
        let ua = "Mozilla/5.0 (X11; CrOS x86_64 14541.0.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
        assert!(!detect_os_mismatch(ua, "Linux x86_64").detected);
    }

    #[test]
    fn test_unknown_values_are_not_lies() {
        assert!(!detect_os_mismatch("curl/8.0", "Win32").detected);
        assert!(!detect_os_mismatch("Mozilla/5.0 (Windows NT 10.0)", "PlayStation 5").detected);
        assert!(detect_os_mismatch("", "Win32").is_insufficient());
    }

    #[test]
    fn test_mobile_platform_without_touch() {
        assert!(detect_platform_mismatch("iPhone", Some(0.0), None).detected);
        assert!(!detect_platform_mismatch("iPhone", Some(5.0), None).detected);
        assert!(!detect_platform_mismatch("Win32", Some(0.0), None).detected);
    }

    #[test]
    fn test_oscpu_disagrees_with_platform() {
        assert!(detect_platform_mismatch("Win32", None, Some("Linux x86_64")).detected);
        assert!(!detect_platform_mismatch("Linux x86_64", None, Some("Linux x86_64")).detected);
        assert!(!detect_platform_mismatch("MacIntel", Some(0.0), Some("Intel Mac OS X 10.15")).detected);
    }

    #[test]
    fn test_platform_insufficient() {
        assert!(detect_platform_mismatch("", Some(0.0), None).is_insufficient());
        assert!(detect_platform_mismatch("Win32", None, None).is_insufficient());
    }
}
