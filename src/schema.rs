//! Dimension registry and Three-Lock tier definitions.
//!
//! The order of every list in this file is part of the hash contract. Adding,
//! removing or reordering a dimension changes the hash of an otherwise
//! identical browser, so any such edit must bump [`SCHEMA_VERSION`].

use serde::{Deserialize, Serialize};

/// Version of the tier dimension lists below.
pub const SCHEMA_VERSION: u32 = 1;

/// Capability family a dimension belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionFamily {
    Hardware,
    System,
    Capabilities,
    Media,
    /// Volatile network and behavioural signals.
    Network,
}

impl DimensionFamily {
    pub const ALL: [DimensionFamily; 5] = [
        DimensionFamily::Hardware,
        DimensionFamily::System,
        DimensionFamily::Capabilities,
        DimensionFamily::Media,
        DimensionFamily::Network,
    ];

    /// Ordered dimension names of this family.
    pub fn dimensions(self) -> &'static [&'static str] {
        match self {
            DimensionFamily::Hardware => HARDWARE_DIMENSIONS,
            DimensionFamily::System => SYSTEM_DIMENSIONS,
            DimensionFamily::Capabilities => CAPABILITY_DIMENSIONS,
            DimensionFamily::Media => MEDIA_DIMENSIONS,
            DimensionFamily::Network => NETWORK_DIMENSIONS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DimensionFamily::Hardware => "hardware",
            DimensionFamily::System => "system",
            DimensionFamily::Capabilities => "capabilities",
            DimensionFamily::Media => "media",
            DimensionFamily::Network => "network",
        }
    }
}

/// Hash tier, from most to least stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockTier {
    /// Hardware signals only.
    Gold,
    /// System and capability signals.
    Silver,
    /// Every signal, including volatile ones.
    Bronze,
}

impl LockTier {
    pub const ALL: [LockTier; 3] = [LockTier::Gold, LockTier::Silver, LockTier::Bronze];

    /// Families feeding this tier, in hash order.
    pub fn families(self) -> &'static [DimensionFamily] {
        match self {
            LockTier::Gold => &[DimensionFamily::Hardware],
            LockTier::Silver => &[DimensionFamily::System, DimensionFamily::Capabilities],
            LockTier::Bronze => &DimensionFamily::ALL,
        }
    }

    /// Ordered dimension names hashed for this tier.
    pub fn dimensions(self) -> impl Iterator<Item = &'static str> {
        self.families()
            .iter()
            .flat_map(|family| family.dimensions().iter().copied())
    }

    pub fn contains(self, dimension: &str) -> bool {
        self.dimensions().any(|d| d == dimension)
    }

    pub fn name(self) -> &'static str {
        match self {
            LockTier::Gold => "gold",
            LockTier::Silver => "silver",
            LockTier::Bronze => "bronze",
        }
    }
}

/// Every registered dimension with its family, in collection order.
pub fn all_dimensions() -> impl Iterator<Item = (&'static str, DimensionFamily)> {
    DimensionFamily::ALL
        .into_iter()
        .flat_map(|family| family.dimensions().iter().map(move |d| (*d, family)))
}

/// Number of registered dimensions.
pub fn dimension_count() -> usize {
    DimensionFamily::ALL
        .iter()
        .map(|family| family.dimensions().len())
        .sum()
}

/// Family of a registered dimension.
pub fn family_of(dimension: &str) -> Option<DimensionFamily> {
    all_dimensions()
        .find(|(name, _)| *name == dimension)
        .map(|(_, family)| family)
}

// Dimension names referenced by the lie detector.
pub const SYS_USER_AGENT: &str = "sys_user_agent";
pub const SYS_PLATFORM: &str = "sys_platform";
pub const SYS_VENDOR: &str = "sys_vendor";
pub const SYS_PRODUCT_SUB: &str = "sys_product_sub";
pub const SYS_OSCPU: &str = "sys_oscpu";
pub const SYS_LANGUAGE: &str = "sys_language";
pub const SYS_LANGUAGES: &str = "sys_languages";
pub const SYS_TIMEZONE: &str = "sys_timezone";
pub const SYS_TIMEZONE_OFFSET: &str = "sys_timezone_offset";
pub const SYS_INTL_LOCALE: &str = "sys_intl_locale";
pub const HW_WEBGL_VENDOR: &str = "hw_webgl_vendor";
pub const HW_WEBGL_RENDERER: &str = "hw_webgl_renderer";
pub const HW_WEBGL_UNMASKED_VENDOR: &str = "hw_webgl_unmasked_vendor";
pub const HW_WEBGL_UNMASKED_RENDERER: &str = "hw_webgl_unmasked_renderer";
pub const HW_SCREEN_WIDTH: &str = "hw_screen_width";
pub const HW_SCREEN_HEIGHT: &str = "hw_screen_height";
pub const HW_SCREEN_AVAIL_WIDTH: &str = "hw_screen_avail_width";
pub const HW_SCREEN_AVAIL_HEIGHT: &str = "hw_screen_avail_height";
pub const HW_MAX_TOUCH_POINTS: &str = "hw_max_touch_points";
pub const NET_OUTER_WIDTH: &str = "net_outer_width";
pub const NET_OUTER_HEIGHT: &str = "net_outer_height";

pub const HARDWARE_DIMENSIONS: &[&str] = &[
    "hw_canvas_hash",
    "hw_canvas_geometry_hash",
    "hw_canvas_winding",
    HW_WEBGL_VENDOR,
    HW_WEBGL_RENDERER,
    HW_WEBGL_UNMASKED_VENDOR,
    HW_WEBGL_UNMASKED_RENDERER,
    "hw_webgl_version",
    "hw_webgl_shading_language",
    "hw_webgl_max_texture_size",
    "hw_webgl_max_renderbuffer_size",
    "hw_webgl_max_viewport_dims",
    "hw_webgl_max_vertex_attribs",
    "hw_webgl_extensions",
    "hw_webgl2_supported",
    "hw_audio_hash",
    "hw_audio_sample_rate",
    "hw_audio_max_channels",
    HW_SCREEN_WIDTH,
    HW_SCREEN_HEIGHT,
    HW_SCREEN_AVAIL_WIDTH,
    HW_SCREEN_AVAIL_HEIGHT,
    "hw_screen_color_depth",
    "hw_screen_pixel_depth",
    "hw_device_pixel_ratio",
    "hw_hardware_concurrency",
    "hw_device_memory",
    HW_MAX_TOUCH_POINTS,
    "hw_gamepad_support",
    "hw_vr_support",
    "hw_math_fingerprint",
];

pub const SYSTEM_DIMENSIONS: &[&str] = &[
    SYS_PLATFORM,
    SYS_USER_AGENT,
    "sys_ua_browser",
    "sys_ua_browser_version",
    "sys_ua_os",
    "sys_app_version",
    SYS_VENDOR,
    "sys_product",
    SYS_PRODUCT_SUB,
    "sys_build_id",
    SYS_OSCPU,
    SYS_LANGUAGE,
    SYS_LANGUAGES,
    SYS_TIMEZONE,
    SYS_TIMEZONE_OFFSET,
    SYS_INTL_LOCALE,
    "sys_intl_calendar",
    "sys_intl_numbering_system",
    "sys_intl_number_format",
    "sys_intl_date_format",
    "sys_do_not_track",
    "sys_cookies_enabled",
    "sys_pdf_viewer",
    "sys_webdriver",
    "sys_connection_type",
    "sys_media_devices",
];

pub const CAPABILITY_DIMENSIONS: &[&str] = &[
    "cap_storage",
    "cap_service_worker",
    "cap_web_worker",
    "cap_shared_worker",
    "cap_webassembly",
    "cap_webrtc",
    "cap_websocket",
    "cap_web_share",
    "cap_clipboard",
    "cap_notification",
    "cap_geolocation",
    "cap_bluetooth",
    "cap_usb",
    "cap_serial",
    "cap_hid",
    "cap_webgpu",
    "cap_plugins",
    "cap_mime_types",
    "cap_permission_notifications",
    "cap_permission_geolocation",
    "cap_permission_camera",
    "cap_permission_microphone",
    "cap_battery_api",
];

pub const MEDIA_DIMENSIONS: &[&str] = &[
    "media_audio_codecs",
    "media_video_codecs",
    "media_source_types",
    "media_drm",
    "media_speech_voices",
];

pub const NETWORK_DIMENSIONS: &[&str] = &[
    "net_effective_type",
    "net_downlink",
    "net_rtt",
    "net_save_data",
    "net_online",
    NET_OUTER_WIDTH,
    NET_OUTER_HEIGHT,
    "net_inner_width",
    "net_inner_height",
    "net_screen_x",
    "net_screen_y",
    "net_color_scheme",
    "net_reduced_motion",
    "net_battery_level",
    "net_battery_charging",
    "net_storage_quota",
];
