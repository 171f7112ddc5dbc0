//! User-Agent classification.
//!
//! Deliberately coarse: it recognizes the OS family, the browser family and
//! its major version, and whether the UA claims a mobile device. Those are
//! the only facts the collectors and the lie detector need.

use serde::{Deserialize, Serialize};

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OsFamily {
    Windows,
    Mac,
    Linux,
    Android,
    Ios,
    ChromeOs,
}

impl OsFamily {
    pub fn name(self) -> &'static str {
        match self {
            OsFamily::Windows => "Windows",
            OsFamily::Mac => "Mac",
            OsFamily::Linux => "Linux",
            OsFamily::Android => "Android",
            OsFamily::Ios => "iOS",
            OsFamily::ChromeOs => "ChromeOS",
        }
    }

    pub fn is_mobile(self) -> bool {
        matches!(self, OsFamily::Android | OsFamily::Ios)
    }
}

/// Browser family, by rendering engine vendor conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowserFamily {
    Chrome,
    Edge,
    Opera,
    Samsung,
    Firefox,
    Safari,
}

impl BrowserFamily {
    pub fn name(self) -> &'static str {
        match self {
            BrowserFamily::Chrome => "Chrome",
            BrowserFamily::Edge => "Edge",
            BrowserFamily::Opera => "Opera",
            BrowserFamily::Samsung => "Samsung Internet",
            BrowserFamily::Firefox => "Firefox",
            BrowserFamily::Safari => "Safari",
        }
    }

    /// Chromium-based browsers report `navigator.vendor == "Google Inc."`.
    pub fn is_chromium(self) -> bool {
        matches!(
            self,
            BrowserFamily::Chrome | BrowserFamily::Edge | BrowserFamily::Opera | BrowserFamily::Samsung
        )
    }
}

/// Facts extracted from a User-Agent string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAgentInfo {
    pub os: Option<OsFamily>,
    pub browser: Option<BrowserFamily>,
    pub browser_version: Option<String>,
    pub mobile: bool,
}

/// Parse the facts we care about from a User-Agent string.
pub fn parse_user_agent(ua: &str) -> UserAgentInfo {
    let (browser, browser_version) = match browser_from_user_agent(ua) {
        Some((family, version)) => (Some(family), version),
        None => (None, None),
    };
    UserAgentInfo {
        os: os_from_user_agent(ua),
        browser,
        browser_version,
        mobile: is_mobile_user_agent(ua),
    }
}

/// OS family named by the UA. iOS and Android are checked before their
/// desktop relatives because their UAs also mention "Mac OS X" / "Linux".
pub fn os_from_user_agent(ua: &str) -> Option<OsFamily> {
    if ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod") {
        Some(OsFamily::Ios)
    } else if ua.contains("Android") {
        Some(OsFamily::Android)
    } else if ua.contains("Windows") {
        Some(OsFamily::Windows)
    } else if ua.contains("CrOS") {
        Some(OsFamily::ChromeOs)
    } else if ua.contains("Macintosh") || ua.contains("Mac OS X") {
        Some(OsFamily::Mac)
    } else if ua.contains("Linux") || ua.contains("X11") {
        Some(OsFamily::Linux)
    } else {
        None
    }
}

/// Browser family and major version. Order matters: every Chromium
/// derivative also says "Chrome/", and Chrome also says "Safari/".
pub fn browser_from_user_agent(ua: &str) -> Option<(BrowserFamily, Option<String>)> {
    const MARKERS: &[(&str, BrowserFamily)] = &[
        ("Edg/", BrowserFamily::Edge),
        ("EdgA/", BrowserFamily::Edge),
        ("EdgiOS/", BrowserFamily::Edge),
        ("OPR/", BrowserFamily::Opera),
        ("SamsungBrowser/", BrowserFamily::Samsung),
        ("Firefox/", BrowserFamily::Firefox),
        ("FxiOS/", BrowserFamily::Firefox),
        ("CriOS/", BrowserFamily::Chrome),
        ("Chrome/", BrowserFamily::Chrome),
        ("Version/", BrowserFamily::Safari),
    ];

    for (marker, family) in MARKERS {
        if let Some(pos) = ua.find(marker) {
            if *family == BrowserFamily::Safari && !ua.contains("Safari/") {
                continue;
            }
            let version = major_version(&ua[pos + marker.len()..]);
            return Some((*family, version));
        }
    }
    None
}

fn major_version(rest: &str) -> Option<String> {
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Whether the UA claims a phone or tablet.
pub fn is_mobile_user_agent(ua: &str) -> bool {
    ["Mobile", "Android", "iPhone", "iPad", "iPod"]
        .iter()
        .any(|token| ua.contains(token))
}

/// OS family implied by `navigator.platform`.
pub fn os_from_platform(platform: &str) -> Option<OsFamily> {
    let p = platform.trim();
    if p.is_empty() {
        return None;
    }
    if p.starts_with("Win") {
        Some(OsFamily::Windows)
    } else if p.starts_with("Mac") {
        Some(OsFamily::Mac)
    } else if p == "iPhone" || p == "iPad" || p == "iPod" || p.starts_with("iPhone") {
        Some(OsFamily::Ios)
    } else if p.eq_ignore_ascii_case("android") {
        Some(OsFamily::Android)
    } else if p.starts_with("CrOS") {
        Some(OsFamily::ChromeOs)
    } else if p.starts_with("Linux") || p.contains("X11") || p.contains("FreeBSD") {
        Some(OsFamily::Linux)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0";
    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.51";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36";

    #[test]
    fn test_os_detection() {
        assert_eq!(os_from_user_agent(CHROME_WIN), Some(OsFamily::Windows));
        assert_eq!(os_from_user_agent(SAFARI_MAC), Some(OsFamily::Mac));
        assert_eq!(os_from_user_agent(SAFARI_IPHONE), Some(OsFamily::Ios));
        assert_eq!(os_from_user_agent(FIREFOX_LINUX), Some(OsFamily::Linux));
        assert_eq!(os_from_user_agent(CHROME_ANDROID), Some(OsFamily::Android));
        assert_eq!(os_from_user_agent("curl/8.0"), None);
    }

    #[test]
    fn test_browser_detection() {
        assert_eq!(
            browser_from_user_agent(CHROME_WIN),
            Some((BrowserFamily::Chrome, Some("124".into())))
        );
        assert_eq!(
            browser_from_user_agent(EDGE_WIN),
            Some((BrowserFamily::Edge, Some("124".into())))
        );
        assert_eq!(
            browser_from_user_agent(SAFARI_MAC),
            Some((BrowserFamily::Safari, Some("17".into())))
        );
        assert_eq!(
            browser_from_user_agent(FIREFOX_LINUX),
            Some((BrowserFamily::Firefox, Some("125".into())))
        );
    }

    #[test]
    fn test_mobile_detection() {
        assert!(parse_user_agent(SAFARI_IPHONE).mobile);
        assert!(parse_user_agent(CHROME_ANDROID).mobile);
        assert!(!parse_user_agent(CHROME_WIN).mobile);
    }

    #[test]
    fn test_platform_detection() {
        assert_eq!(os_from_platform("Win32"), Some(OsFamily::Windows));
        assert_eq!(os_from_platform("MacIntel"), Some(OsFamily::Mac));
        assert_eq!(os_from_platform("iPhone"), Some(OsFamily::Ios));
        assert_eq!(os_from_platform("Linux armv8l"), Some(OsFamily::Linux));
        assert_eq!(os_from_platform("Linux x86_64"), Some(OsFamily::Linux));
        assert_eq!(os_from_platform(""), None);
    }
}
