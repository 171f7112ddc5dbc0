//! GPU class vs device class.

use super::{LieDetectionResult, Severity};
use crate::ua::{is_mobile_user_agent, os_from_user_agent, OsFamily};

pub const CHECK: &str = "webgl_mismatch";
pub const SEVERITY: Severity = Severity::High;

/// Device class a GPU string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuClass {
    Mobile,
    Desktop,
    /// Software rasterizer (headless, VMs, blocklisted drivers).
    Software,
    /// Nothing recognizable, or a string used on both classes ("Apple GPU").
    Unknown,
}

const MOBILE_TOKENS: &[&str] = &[
    "adreno", "mali", "powervr", "tegra", "immortalis", "xclipse", "videocore", "sgx",
];

const DESKTOP_TOKENS: &[&str] = &[
    "geforce", "nvidia", "radeon", "amd", "ati", "intel", "iris", "quadro", "rtx", "gtx",
    "firepro",
];

const SOFTWARE_TOKENS: &[&str] = &["swiftshader", "llvmpipe", "softpipe"];

fn tokens(text: &str) -> Vec<String> {
    text.to_ascii_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn apple_chip(token: &str, series: char) -> bool {
    let mut chars = token.chars();
    chars.next() == Some(series) && chars.next().map_or(false, |c| c.is_ascii_digit())
}

/// Classify a renderer/vendor string by whole-word tokens.
pub fn classify_gpu(text: &str) -> GpuClass {
    let tokens = tokens(text);
    let has = |list: &[&str]| tokens.iter().any(|t| list.contains(&t.as_str()));

    if has(SOFTWARE_TOKENS) || text.contains("Basic Render Driver") {
        return GpuClass::Software;
    }
    if has(MOBILE_TOKENS) {
        return GpuClass::Mobile;
    }
    // "Apple M2" is a Mac; "Apple A15 GPU" is a phone.
    // ANGLE on Metal repeats the vendor: "ANGLE (Apple, ANGLE Metal Renderer: Apple M1 Pro, ...)".
    let apple_series = |series: char| {
        tokens
            .windows(2)
            .any(|w| w[0] == "apple" && apple_chip(&w[1], series))
    };
    if apple_series('m') {
        return GpuClass::Desktop;
    }
    if apple_series('a') {
        return GpuClass::Mobile;
    }
    if has(DESKTOP_TOKENS) {
        return GpuClass::Desktop;
    }
    GpuClass::Unknown
}

/// Mobile UA with a desktop GPU, or desktop UA with a phone GPU.
///
/// A phone-class GPU on a Linux, ChromeOS or Windows UA is not flagged:
/// ARM Chromebooks and Snapdragon laptops ship Mali and Adreno parts.
pub fn detect_webgl_mismatch(renderer: &str, vendor: &str, user_agent: &str) -> LieDetectionResult {
    if user_agent.is_empty() || (renderer.is_empty() && vendor.is_empty()) {
        return LieDetectionResult::insufficient(CHECK, SEVERITY, "user agent or GPU strings unavailable");
    }

    let gpu = match classify_gpu(renderer) {
        GpuClass::Unknown => classify_gpu(vendor),
        class => class,
    };
    let mobile_ua = is_mobile_user_agent(user_agent);
    let device = if mobile_ua { "mobile" } else { "desktop" };

    match gpu {
        GpuClass::Desktop if mobile_ua => LieDetectionResult::mismatch(
            CHECK,
            SEVERITY,
            format!("desktop GPU {:?} on a mobile user agent", renderer),
        ),
        GpuClass::Mobile
            if !mobile_ua
                && matches!(os_from_user_agent(user_agent), Some(OsFamily::Mac) | None) =>
        {
            LieDetectionResult::mismatch(
                CHECK,
                SEVERITY,
                format!("mobile GPU {:?} on a desktop user agent", renderer),
            )
        }
        GpuClass::Software => LieDetectionResult::consistent(
            CHECK,
            SEVERITY,
            format!("software renderer {:?} on {} user agent", renderer, device),
        ),
        GpuClass::Unknown => LieDetectionResult::consistent(
            CHECK,
            SEVERITY,
            format!("unclassified GPU {:?}", renderer),
        ),
        class => LieDetectionResult::consistent(
            CHECK,
            SEVERITY,
            format!("{:?} GPU on {} user agent", class, device),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
    const MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
    const WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

    #[test]
    fn test_classification() {
        assert_eq!(classify_gpu("GeForce GTX 1080"), GpuClass::Desktop);
        assert_eq!(classify_gpu("ANGLE (Qualcomm, Adreno (TM) 640, OpenGL ES 3.2)"), GpuClass::Mobile);
        assert_eq!(classify_gpu("Apple M1 Pro"), GpuClass::Desktop);
        assert_eq!(classify_gpu("Apple A15 GPU"), GpuClass::Mobile);
        assert_eq!(classify_gpu("Apple GPU"), GpuClass::Unknown);
        assert_eq!(
            classify_gpu("ANGLE (Google, Vulkan 1.3.0 (SwiftShader Device (Subzero)), SwiftShader driver)"),
            GpuClass::Software
        );
        // "ati" only as a whole word.
        assert_eq!(classify_gpu("Some Corporation"), GpuClass::Unknown);
    }

    #[test]
    fn test_desktop_gpu_on_iphone() {
        assert!(detect_webgl_mismatch("GeForce GTX 1080", "NVIDIA", IPHONE).detected);
    }

    #[test]
    fn test_angle_metal_renderer() {
        let renderer = "ANGLE (Apple, ANGLE Metal Renderer: Apple M1 Pro, Unspecified Version)";
        assert_eq!(classify_gpu(renderer), GpuClass::Desktop);
        assert!(detect_webgl_mismatch(renderer, "Google Inc. (Apple)", IPHONE).detected);
        assert!(!detect_webgl_mismatch(renderer, "Google Inc. (Apple)", MAC).detected);
    }

    #[test]
    fn test_apple_silicon_on_mac() {
        assert!(!detect_webgl_mismatch("Apple M2", "Apple Inc.", MAC).detected);
        assert!(!detect_webgl_mismatch("Apple GPU", "Apple Inc.", MAC).detected);
    }

    #[test]
    fn test_phone_gpu_on_desktop() {
        assert!(detect_webgl_mismatch("Apple A15 GPU", "Apple Inc.", MAC).detected);
        assert!(!detect_webgl_mismatch("Adreno X1-85", "Qualcomm", WINDOWS).detected);
    }

    #[test]
    fn test_software_renderer_not_flagged() {
        let result = detect_webgl_mismatch("llvmpipe (LLVM 15.0.7, 256 bits)", "Mesa", WINDOWS);
        assert!(!result.detected);
        assert!(result.evidence.contains("software"));
    }

    #[test]
    fn test_insufficient() {
        assert!(detect_webgl_mismatch("", "", IPHONE).is_insufficient());
        assert!(detect_webgl_mismatch("GeForce", "", "").is_insufficient());
    }
}
