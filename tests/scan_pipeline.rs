//! End-to-end scans over fixture environments.
//!
//! Run with: cargo test --test scan_pipeline

use async_trait::async_trait;
use futures::executor::block_on;

use fingerprint_wasm::canonical::hash_values;
use fingerprint_wasm::lies::{
    detect_os_mismatch, detect_resolution_mismatch, detect_timezone_mismatch,
    detect_webgl_mismatch, ScreenGeometry,
};
use fingerprint_wasm::schema::{
    all_dimensions, dimension_count, HW_MAX_TOUCH_POINTS, HW_SCREEN_AVAIL_HEIGHT,
    HW_SCREEN_AVAIL_WIDTH, HW_SCREEN_HEIGHT, HW_SCREEN_WIDTH, HW_WEBGL_UNMASKED_RENDERER,
    HW_WEBGL_UNMASKED_VENDOR, NET_OUTER_HEIGHT, NET_OUTER_WIDTH, SYS_INTL_LOCALE, SYS_LANGUAGE,
    SYS_LANGUAGES, SYS_PLATFORM, SYS_PRODUCT_SUB, SYS_TIMEZONE, SYS_TIMEZONE_OFFSET,
    SYS_USER_AGENT, SYS_VENDOR,
};
use fingerprint_wasm::{
    DimensionValue, FingerprintData, HashPrimitive, LockTier, NativeSha256, ProbeFault,
    ScanConfig, ScanError, ScanEvent, ScanPhase, Scanner, StaticEnvironment, SCHEMA_VERSION,
};

const MAC_SAFARI: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";
const WINDOWS_CHROME: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const IPHONE_SAFARI: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

// 2024-01-15T12:00:00Z
const JAN_2024: f64 = 1_705_320_000_000.0;

/// A consistent MacBook running Safari in New York.
fn macbook() -> FingerprintData {
    vec![
        ("hw_canvas_hash", DimensionValue::from("9f2c0d6e")),
        ("hw_hardware_concurrency", DimensionValue::from(8u32)),
        ("hw_device_pixel_ratio", DimensionValue::from(2.0)),
        (HW_WEBGL_UNMASKED_RENDERER, DimensionValue::from("Apple M2")),
        (HW_WEBGL_UNMASKED_VENDOR, DimensionValue::from("Apple Inc.")),
        (HW_MAX_TOUCH_POINTS, DimensionValue::from(0u32)),
        (HW_SCREEN_WIDTH, DimensionValue::from(1512u32)),
        (HW_SCREEN_HEIGHT, DimensionValue::from(982u32)),
        (HW_SCREEN_AVAIL_WIDTH, DimensionValue::from(1512u32)),
        (HW_SCREEN_AVAIL_HEIGHT, DimensionValue::from(944u32)),
        (SYS_USER_AGENT, DimensionValue::from(MAC_SAFARI)),
        (SYS_PLATFORM, DimensionValue::from("MacIntel")),
        (SYS_VENDOR, DimensionValue::from("Apple Computer, Inc.")),
        (SYS_PRODUCT_SUB, DimensionValue::from("20030107")),
        (SYS_LANGUAGE, DimensionValue::from("en-US")),
        (SYS_LANGUAGES, DimensionValue::list(["en-US", "en"])),
        (SYS_INTL_LOCALE, DimensionValue::from("en-US")),
        (SYS_TIMEZONE, DimensionValue::from("America/New_York")),
        (SYS_TIMEZONE_OFFSET, DimensionValue::from(300)),
        ("cap_webassembly", DimensionValue::from(true)),
        ("cap_storage", DimensionValue::list(["localStorage", "indexedDB"])),
        ("media_drm", DimensionValue::list(["com.apple.fps.1_0"])),
        ("net_online", DimensionValue::from(true)),
        (NET_OUTER_WIDTH, DimensionValue::from(1512u32)),
        (NET_OUTER_HEIGHT, DimensionValue::from(944u32)),
    ]
    .into_iter()
    .collect()
}

fn scanner(env: StaticEnvironment) -> Scanner<StaticEnvironment> {
    Scanner::new(env, Box::new(NativeSha256), ScanConfig::default())
}

/// Always refuses to digest.
struct BrokenHasher;

#[async_trait(?Send)]
impl HashPrimitive for BrokenHasher {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn sha256(&self, _data: &[u8]) -> fingerprint_wasm::Result<[u8; 32]> {
        Err(ScanError::HashUnavailable("crypto.subtle missing".into()))
    }
}

#[test]
fn test_identical_environments_hash_identically() {
    let first = block_on(scanner(StaticEnvironment::from_data(JAN_2024, &macbook())).scan())
        .expect("first scan");
    let second = block_on(scanner(StaticEnvironment::from_data(JAN_2024 + 60_000.0, &macbook())).scan())
        .expect("second scan");

    assert_eq!(first.hashes, second.hashes);
    assert_eq!(first.dimensions, second.dimensions);
    assert_ne!(first.timestamp, second.timestamp);
}

#[test]
fn test_report_covers_every_dimension() {
    let report = block_on(scanner(StaticEnvironment::from_data(JAN_2024, &macbook())).scan()).unwrap();

    assert_eq!(report.schema_version, SCHEMA_VERSION);
    assert_eq!(report.timestamp, JAN_2024 as u64);
    assert_eq!(report.dimensions.len(), dimension_count());
    for (name, _) in all_dimensions() {
        assert!(report.dimensions.contains(name), "{} missing", name);
    }
    assert_eq!(report.dimensions.available_count(), macbook().len());
    assert_eq!(
        report.dimensions.get("cap_usb"),
        Some(&DimensionValue::Unavailable)
    );
}

#[test]
fn test_honest_macbook_has_no_lies() {
    let report = block_on(scanner(StaticEnvironment::from_data(JAN_2024, &macbook())).scan()).unwrap();

    assert_eq!(report.lies.checks.len(), 7);
    assert_eq!(report.lies.lie_score, 0, "{:?}", report.lies.checks);
}

#[test]
fn test_volatile_change_only_moves_bronze() {
    let before = block_on(scanner(StaticEnvironment::from_data(JAN_2024, &macbook())).scan()).unwrap();
    let env = StaticEnvironment::from_data(JAN_2024, &macbook()).with_value("net_online", false);
    let after = block_on(scanner(env).scan()).unwrap();

    assert_eq!(before.hashes.gold, after.hashes.gold);
    assert_eq!(before.hashes.silver, after.hashes.silver);
    assert_ne!(before.hashes.bronze, after.hashes.bronze);
}

#[test]
fn test_system_change_keeps_gold() {
    let before = block_on(scanner(StaticEnvironment::from_data(JAN_2024, &macbook())).scan()).unwrap();
    let env = StaticEnvironment::from_data(JAN_2024, &macbook()).with_value(SYS_LANGUAGE, "de-DE");
    let after = block_on(scanner(env).scan()).unwrap();

    assert_eq!(before.hashes.gold, after.hashes.gold);
    assert_ne!(before.hashes.silver, after.hashes.silver);
    assert_ne!(before.hashes.bronze, after.hashes.bronze);
}

#[test]
fn test_faults_and_hangs_still_produce_full_report() {
    let env = StaticEnvironment::from_data(JAN_2024, &macbook())
        .with_fault("hw_canvas_hash", ProbeFault::Threw("SecurityError".into()))
        .with_fault("media_drm", ProbeFault::Unsupported("requestMediaKeySystemAccess".into()))
        .with_hang("hw_audio_hash")
        .with_hang(SYS_TIMEZONE);
    let report = block_on(scanner(env).scan()).unwrap();

    assert_eq!(report.dimensions.len(), dimension_count());
    for name in ["hw_canvas_hash", "media_drm", "hw_audio_hash", SYS_TIMEZONE] {
        assert_eq!(report.dimensions.get(name), Some(&DimensionValue::Unavailable), "{}", name);
    }
    assert_eq!(report.hashes.gold.len(), 64);

    // The hung timezone leaves its lie check without input.
    let timezone = report
        .lies
        .checks
        .iter()
        .find(|c| c.check == "timezone_mismatch")
        .unwrap();
    assert!(!timezone.detected);
    assert!(timezone.is_insufficient());
}

#[test]
fn test_disabled_timeout_passes_values_through() {
    let config = ScanConfig {
        collector_timeout_ms: 0,
        ..ScanConfig::default()
    };
    let s = Scanner::new(
        StaticEnvironment::new(JAN_2024).with_value("cap_usb", true),
        Box::new(NativeSha256),
        config,
    );
    assert_eq!(block_on(s.run_collector("cap_usb")), DimensionValue::Bool(true));
}

#[test]
fn test_failing_hasher_rejects_scan() {
    let s = Scanner::new(
        StaticEnvironment::from_data(JAN_2024, &macbook()),
        Box::new(BrokenHasher),
        ScanConfig::default(),
    );
    let mut events: Vec<ScanEvent> = Vec::new();
    let result = block_on(s.scan_with_progress(&mut events));

    assert!(matches!(result, Err(ScanError::HashUnavailable(_))));
    assert_eq!(
        events.last(),
        Some(&ScanEvent::PhaseChanged {
            phase: ScanPhase::Failed,
            completed: dimension_count(),
            total: dimension_count(),
        })
    );
    assert!(!events.iter().any(|e| matches!(
        e,
        ScanEvent::PhaseChanged { phase: ScanPhase::DetectingLies | ScanPhase::Done, .. }
    )));
}

#[test]
fn test_progress_sequence() {
    let s = scanner(StaticEnvironment::from_data(JAN_2024, &macbook()).with_hang("hw_vr_support"));
    let mut events: Vec<ScanEvent> = Vec::new();
    block_on(s.scan_with_progress(&mut events)).unwrap();

    let total = dimension_count();
    assert_eq!(events.len(), total + 4);

    let phases: Vec<ScanPhase> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::PhaseChanged { phase, .. } => Some(*phase),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            ScanPhase::Collecting,
            ScanPhase::Hashing,
            ScanPhase::DetectingLies,
            ScanPhase::Done
        ]
    );

    let collected: Vec<(usize, String)> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::CollectorCompleted { completed, dimension, .. } => {
                Some((*completed, dimension.clone()))
            }
            _ => None,
        })
        .collect();
    let expected: Vec<(usize, String)> = all_dimensions()
        .enumerate()
        .map(|(i, (name, _))| (i + 1, name.to_string()))
        .collect();
    assert_eq!(collected, expected);
}

#[test]
fn test_closure_observer() {
    let s = scanner(StaticEnvironment::from_data(JAN_2024, &macbook()));
    let mut last_completed = 0;
    let mut done = false;
    block_on(s.scan_with_progress(&mut |event: &ScanEvent| match event {
        ScanEvent::CollectorCompleted { completed, .. } => {
            assert_eq!(*completed, last_completed + 1);
            last_completed = *completed;
        }
        ScanEvent::PhaseChanged { phase: ScanPhase::Done, .. } => done = true,
        _ => {}
    }))
    .unwrap();

    assert_eq!(last_completed, dimension_count());
    assert!(done);
}

#[test]
fn test_duration_follows_clock() {
    let s = scanner(StaticEnvironment::from_data(JAN_2024, &macbook()).with_tick(25.0));
    let report = block_on(s.scan()).unwrap();
    assert_eq!(report.timestamp, JAN_2024 as u64);
    assert_eq!(report.duration_ms, 25);
}

#[test]
fn test_spoofed_user_agent_is_caught() {
    let spoofed: FingerprintData = macbook()
        .iter()
        .map(|(name, value)| {
            let value = if name == SYS_USER_AGENT {
                DimensionValue::from(WINDOWS_CHROME)
            } else {
                value.clone()
            };
            (name.to_string(), value)
        })
        .collect();
    let report = block_on(scanner(StaticEnvironment::from_data(JAN_2024, &spoofed)).scan()).unwrap();

    let flagged: Vec<&str> = report
        .lies
        .checks
        .iter()
        .filter(|c| c.detected)
        .map(|c| c.check.as_str())
        .collect();
    assert!(flagged.contains(&"os_mismatch"), "{:?}", flagged);
    assert!(flagged.contains(&"browser_mismatch"), "{:?}", flagged);
    assert!(report.lies.lie_score > 0);
}

#[test]
fn test_lie_rule_examples() {
    assert!(detect_os_mismatch(WINDOWS_CHROME, "MacIntel").detected);
    assert!(!detect_os_mismatch(MAC_SAFARI, "MacIntel").detected);

    assert!(detect_timezone_mismatch("America/New_York", 0).detected);
    assert!(!detect_timezone_mismatch("America/New_York", 300).detected);

    assert!(detect_webgl_mismatch("NVIDIA GeForce GTX 1080", "NVIDIA", IPHONE_SAFARI).detected);
    assert!(!detect_webgl_mismatch("Apple M1", "Apple", MAC_SAFARI).detected);

    let within = ScreenGeometry {
        width: Some(1920.0),
        height: Some(1080.0),
        avail_width: Some(1920.0),
        avail_height: Some(1040.0),
        outer_width: Some(1280.0),
        outer_height: Some(800.0),
    };
    assert!(!detect_resolution_mismatch(&within).detected);
    let oversized = ScreenGeometry {
        outer_width: Some(3840.0),
        outer_height: Some(2160.0),
        ..within
    };
    assert!(detect_resolution_mismatch(&oversized).detected);
}

#[test]
fn test_unavailable_hashes_as_empty() {
    assert_eq!(
        hash_values(&[DimensionValue::Unavailable], "|"),
        hash_values(&[DimensionValue::from("")], "|")
    );
}

#[test]
fn test_tiers_are_distinct() {
    let report = block_on(scanner(StaticEnvironment::from_data(JAN_2024, &macbook())).scan()).unwrap();
    let hashes = &report.hashes;
    assert_ne!(hashes.get(LockTier::Gold), hashes.get(LockTier::Silver));
    assert_ne!(hashes.get(LockTier::Silver), hashes.get(LockTier::Bronze));
}
