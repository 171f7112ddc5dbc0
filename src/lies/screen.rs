//! Screen geometry plausibility.

use super::{LieDetectionResult, Severity};
use crate::dimension::FingerprintData;
use crate::schema::{
    HW_SCREEN_AVAIL_HEIGHT, HW_SCREEN_AVAIL_WIDTH, HW_SCREEN_HEIGHT, HW_SCREEN_WIDTH,
    NET_OUTER_HEIGHT, NET_OUTER_WIDTH,
};

pub const CHECK: &str = "resolution_mismatch";
pub const SEVERITY: Severity = Severity::High;

/// Maximized windows on Windows overhang the screen by their invisible
/// resize borders (8px per side).
const WINDOW_BORDER_TOLERANCE_PX: f64 = 16.0;

/// Window and screen dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScreenGeometry {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub avail_width: Option<f64>,
    pub avail_height: Option<f64>,
    pub outer_width: Option<f64>,
    pub outer_height: Option<f64>,
}

impl ScreenGeometry {
    pub fn from_data(data: &FingerprintData) -> Self {
        Self {
            width: data.num(HW_SCREEN_WIDTH),
            height: data.num(HW_SCREEN_HEIGHT),
            avail_width: data.num(HW_SCREEN_AVAIL_WIDTH),
            avail_height: data.num(HW_SCREEN_AVAIL_HEIGHT),
            outer_width: data.num(NET_OUTER_WIDTH),
            outer_height: data.num(NET_OUTER_HEIGHT),
        }
    }
}

fn exceeds(inner: Option<f64>, outer: f64, tolerance: f64) -> Option<f64> {
    inner.filter(|v| *v > outer + tolerance)
}

/// Flags geometry no real display can produce: the outer window larger than
/// the screen, the available area larger than the screen, or a zero-size
/// screen.
pub fn detect_resolution_mismatch(geometry: &ScreenGeometry) -> LieDetectionResult {
    let (Some(width), Some(height)) = (geometry.width, geometry.height) else {
        return LieDetectionResult::insufficient(CHECK, SEVERITY, "screen size unavailable");
    };

    if width <= 0.0 || height <= 0.0 {
        return LieDetectionResult::mismatch(
            CHECK,
            SEVERITY,
            format!("zero-size screen {}x{}", width, height),
        );
    }

    let mut problems = Vec::new();
    if let Some(w) = exceeds(geometry.outer_width, width, WINDOW_BORDER_TOLERANCE_PX) {
        problems.push(format!("outerWidth {} > screen.width {}", w, width));
    }
    if let Some(h) = exceeds(geometry.outer_height, height, WINDOW_BORDER_TOLERANCE_PX) {
        problems.push(format!("outerHeight {} > screen.height {}", h, height));
    }
    if let Some(w) = exceeds(geometry.avail_width, width, 0.0) {
        problems.push(format!("availWidth {} > screen.width {}", w, width));
    }
    if let Some(h) = exceeds(geometry.avail_height, height, 0.0) {
        problems.push(format!("availHeight {} > screen.height {}", h, height));
    }

    if problems.is_empty() {
        LieDetectionResult::consistent(
            CHECK,
            SEVERITY,
            format!("window fits {}x{} screen", width, height),
        )
    } else {
        LieDetectionResult::mismatch(CHECK, SEVERITY, problems.join("; "))
    }
}
