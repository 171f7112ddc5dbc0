//! Browser collectors.
//!
//! One probe per registered dimension, grouped by family. Probes report
//! absence and exceptions as [`ProbeFault`]s; the scanner turns those into
//! unavailable values.
//!
//! ## Usage
//!
//! ```javascript
//! import init, { run_fingerprint_scan } from './pkg/fingerprint_wasm.js';
//! await init();
//! const report = await run_fingerprint_scan({ collector_timeout_ms: 3000 });
//! console.log(report.hashes.gold);
//! ```

use std::cell::OnceCell;

use async_trait::async_trait;
use wasm_bindgen::JsValue;
use web_sys::Window;

use crate::dimension::DimensionValue;
use crate::environment::Environment;
use crate::error::{ProbeFault, Result, ScanError};
use crate::schema::{family_of, DimensionFamily};

pub mod capabilities;
pub mod hardware;
pub mod js_helpers;
pub mod media;
pub mod network;
pub mod system;

/// The live browser, read through `web-sys`/`js-sys`.
///
/// WebGL parameters and AudioContext properties are read once per
/// environment and shared by every dimension derived from them.
pub struct BrowserEnvironment {
    window: Window,
    webgl: OnceCell<Option<hardware::WebGlInfo>>,
    audio: OnceCell<Option<hardware::AudioInfo>>,
}

impl BrowserEnvironment {
    pub fn new() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| ScanError::NoBrowserContext("no global window".into()))?;
        Ok(Self {
            window,
            webgl: OnceCell::new(),
            audio: OnceCell::new(),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_value(&self) -> JsValue {
        self.window.clone().into()
    }

    pub fn navigator(&self) -> JsValue {
        self.window.navigator().into()
    }

    pub(crate) fn webgl(&self) -> std::result::Result<&hardware::WebGlInfo, ProbeFault> {
        self.webgl
            .get_or_init(|| hardware::WebGlInfo::read(&self.window))
            .as_ref()
            .ok_or_else(|| ProbeFault::Unsupported("WebGL".into()))
    }

    pub(crate) fn audio(&self) -> std::result::Result<&hardware::AudioInfo, ProbeFault> {
        self.audio
            .get_or_init(hardware::AudioInfo::read)
            .as_ref()
            .ok_or_else(|| ProbeFault::Unsupported("AudioContext".into()))
    }
}

#[async_trait(?Send)]
impl Environment for BrowserEnvironment {
    async fn probe(&self, dimension: &str) -> std::result::Result<DimensionValue, ProbeFault> {
        match family_of(dimension) {
            Some(DimensionFamily::Hardware) => hardware::probe(self, dimension).await,
            Some(DimensionFamily::System) => system::probe(self, dimension).await,
            Some(DimensionFamily::Capabilities) => capabilities::probe(self, dimension).await,
            Some(DimensionFamily::Media) => media::probe(self, dimension).await,
            Some(DimensionFamily::Network) => network::probe(self, dimension).await,
            None => Err(ProbeFault::UnknownDimension),
        }
    }

    fn now_ms(&self) -> f64 {
        js_sys::Date::now()
    }

    async fn sleep_ms(&self, ms: u32) {
        gloo_timers::future::TimeoutFuture::new(ms).await
    }
}
