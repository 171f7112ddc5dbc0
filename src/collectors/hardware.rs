//! Hardware family: canvas, WebGL, audio, screen, CPU/memory, peripherals.
//!
//! These are the Gold-lock signals. They depend on the GPU, audio stack and
//! display rather than on browser settings.

use std::collections::HashMap;

use js_sys::Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AudioBuffer, AudioContext, CanvasRenderingContext2d, CanvasWindingRule, HtmlCanvasElement,
    OfflineAudioContext, OscillatorType, WebGlRenderingContext, Window,
};

use super::js_helpers::{self, ProbeResult};
use super::BrowserEnvironment;
use crate::canonical::{sha256, sha256_bytes};
use crate::dimension::DimensionValue;
use crate::error::ProbeFault;
use crate::schema::{
    HW_MAX_TOUCH_POINTS, HW_SCREEN_AVAIL_HEIGHT, HW_SCREEN_AVAIL_WIDTH, HW_SCREEN_HEIGHT,
    HW_SCREEN_WIDTH, HW_WEBGL_RENDERER, HW_WEBGL_UNMASKED_RENDERER, HW_WEBGL_UNMASKED_VENDOR,
    HW_WEBGL_VENDOR,
};

// WEBGL_debug_renderer_info
const UNMASKED_VENDOR_WEBGL: u32 = 0x9245;
const UNMASKED_RENDERER_WEBGL: u32 = 0x9246;

const CANVAS_TEXT: &str = "Cwm fjordbank glyphs vext quiz, \u{1F603}";

pub async fn probe(env: &BrowserEnvironment, dimension: &str) -> ProbeResult {
    let navigator = env.navigator();
    match dimension {
        "hw_canvas_hash" => canvas_text_hash(env.window()),
        "hw_canvas_geometry_hash" => canvas_geometry_hash(env.window()),
        "hw_canvas_winding" => canvas_winding(env.window()),

        "hw_webgl2_supported" => Ok(DimensionValue::Bool(env.webgl()?.webgl2)),
        name if name.starts_with("hw_webgl_") => env.webgl()?.get(name),

        "hw_audio_hash" => audio_render_hash().await,
        "hw_audio_sample_rate" => Ok(DimensionValue::Num(env.audio()?.sample_rate)),
        "hw_audio_max_channels" => Ok(DimensionValue::Num(env.audio()?.max_channels)),

        HW_SCREEN_WIDTH => screen_prop(env.window(), |s| s.width()),
        HW_SCREEN_HEIGHT => screen_prop(env.window(), |s| s.height()),
        HW_SCREEN_AVAIL_WIDTH => screen_prop(env.window(), |s| s.avail_width()),
        HW_SCREEN_AVAIL_HEIGHT => screen_prop(env.window(), |s| s.avail_height()),
        "hw_screen_color_depth" => screen_prop(env.window(), |s| s.color_depth()),
        "hw_screen_pixel_depth" => screen_prop(env.window(), |s| s.pixel_depth()),
        "hw_device_pixel_ratio" => Ok(DimensionValue::Num(env.window().device_pixel_ratio())),

        "hw_hardware_concurrency" => js_helpers::number(&js_helpers::get(&navigator, "hardwareConcurrency")?),
        // Chromium only.
        "hw_device_memory" => js_helpers::number(&js_helpers::get(&navigator, "deviceMemory")?),
        HW_MAX_TOUCH_POINTS => js_helpers::number(&js_helpers::get(&navigator, "maxTouchPoints")?),
        "hw_gamepad_support" => Ok(DimensionValue::Bool(js_helpers::has(&navigator, "getGamepads"))),
        "hw_vr_support" => Ok(DimensionValue::Bool(
            js_helpers::has(&navigator, "xr") || js_helpers::has(&navigator, "getVRDisplays"),
        )),
        "hw_math_fingerprint" => Ok(DimensionValue::Str(math_fingerprint())),

        _ => Err(ProbeFault::UnknownDimension),
    }
}

fn create_canvas(window: &Window, width: u32, height: u32) -> Result<HtmlCanvasElement, ProbeFault> {
    let document = window
        .document()
        .ok_or_else(|| ProbeFault::Unsupported("document".into()))?;
    let canvas: HtmlCanvasElement = document
        .create_element("canvas")?
        .dyn_into()
        .map_err(|_| ProbeFault::Unsupported("HTMLCanvasElement".into()))?;
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(canvas)
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, ProbeFault> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| ProbeFault::Unsupported("canvas 2d context".into()))?
        .dyn_into()
        .map_err(|_| ProbeFault::Unsupported("CanvasRenderingContext2D".into()))
}

/// Text and emoji rendering. Font rasterization and subpixel AA differ per
/// OS, GPU and font set.
#[allow(deprecated)]
fn canvas_text_hash(window: &Window) -> ProbeResult {
    let canvas = create_canvas(window, 240, 60)?;
    let ctx = context_2d(&canvas)?;

    ctx.set_text_baseline("alphabetic");
    ctx.set_fill_style(&JsValue::from_str("#f60"));
    ctx.fill_rect(100.0, 1.0, 62.0, 20.0);
    ctx.set_fill_style(&JsValue::from_str("#069"));
    ctx.set_font("11pt \"Times New Roman\"");
    ctx.fill_text(CANVAS_TEXT, 2.0, 15.0)?;
    ctx.set_fill_style(&JsValue::from_str("rgba(102, 204, 0, 0.2)"));
    ctx.set_font("18pt Arial");
    ctx.fill_text(CANVAS_TEXT, 4.0, 45.0)?;

    Ok(DimensionValue::Str(sha256(&canvas.to_data_url()?)))
}

/// Overlapping blended arcs. Exercises path rasterization and blending.
#[allow(deprecated)]
fn canvas_geometry_hash(window: &Window) -> ProbeResult {
    let canvas = create_canvas(window, 122, 110)?;
    let ctx = context_2d(&canvas)?;

    ctx.set_global_composite_operation("multiply")?;
    for (color, x, y) in [("#f2f", 40.0, 40.0), ("#2ff", 80.0, 40.0), ("#ff2", 60.0, 80.0)] {
        ctx.set_fill_style(&JsValue::from_str(color));
        ctx.begin_path();
        ctx.arc(x, y, 40.0, 0.0, std::f64::consts::PI * 2.0)?;
        ctx.close_path();
        ctx.fill();
    }

    Ok(DimensionValue::Str(sha256(&canvas.to_data_url()?)))
}

/// Whether the even-odd fill rule is honoured.
fn canvas_winding(window: &Window) -> ProbeResult {
    let canvas = create_canvas(window, 10, 10)?;
    let ctx = context_2d(&canvas)?;
    ctx.rect(0.0, 0.0, 10.0, 10.0);
    ctx.rect(2.0, 2.0, 6.0, 6.0);
    let inside = ctx.is_point_in_path_with_f64_and_canvas_winding_rule(5.0, 5.0, CanvasWindingRule::Evenodd);
    Ok(DimensionValue::Bool(!inside))
}

/// WebGL parameters, read from a single context.
pub struct WebGlInfo {
    values: HashMap<&'static str, DimensionValue>,
    pub webgl2: bool,
}

impl WebGlInfo {
    /// `None` when WebGL is unavailable or blocked.
    pub fn read(window: &Window) -> Option<Self> {
        let canvas = create_canvas(window, 1, 1).ok()?;
        let context = canvas
            .get_context("webgl")
            .ok()
            .flatten()
            .or_else(|| canvas.get_context("experimental-webgl").ok().flatten())?;
        let gl: WebGlRenderingContext = context.dyn_into().ok()?;

        let param = |pname: u32| {
            gl.get_parameter(pname)
                .map(|v| js_helpers::to_dimension(&v))
                .unwrap_or(DimensionValue::Unavailable)
        };

        let mut values = HashMap::new();
        values.insert(HW_WEBGL_VENDOR, param(WebGlRenderingContext::VENDOR));
        values.insert(HW_WEBGL_RENDERER, param(WebGlRenderingContext::RENDERER));
        values.insert("hw_webgl_version", param(WebGlRenderingContext::VERSION));
        values.insert(
            "hw_webgl_shading_language",
            param(WebGlRenderingContext::SHADING_LANGUAGE_VERSION),
        );
        values.insert("hw_webgl_max_texture_size", param(WebGlRenderingContext::MAX_TEXTURE_SIZE));
        values.insert(
            "hw_webgl_max_renderbuffer_size",
            param(WebGlRenderingContext::MAX_RENDERBUFFER_SIZE),
        );
        values.insert(
            "hw_webgl_max_vertex_attribs",
            param(WebGlRenderingContext::MAX_VERTEX_ATTRIBS),
        );

        // Int32Array; flatten to "w,h".
        let viewport = gl
            .get_parameter(WebGlRenderingContext::MAX_VIEWPORT_DIMS)
            .ok()
            .filter(|v| !v.is_null())
            .map(|v| {
                let dims: Vec<f64> = js_sys::Int32Array::new(&v)
                    .to_vec()
                    .into_iter()
                    .map(f64::from)
                    .collect();
                DimensionValue::Str(js_helpers::join_numbers(&dims))
            })
            .unwrap_or(DimensionValue::Unavailable);
        values.insert("hw_webgl_max_viewport_dims", viewport);

        let extensions = gl
            .get_supported_extensions()
            .map(|list| {
                let mut names: Vec<String> = list.iter().filter_map(|e| e.as_string()).collect();
                names.sort();
                DimensionValue::list(names)
            })
            .unwrap_or(DimensionValue::Unavailable);
        values.insert("hw_webgl_extensions", extensions);

        let debug_info = gl
            .get_extension("WEBGL_debug_renderer_info")
            .ok()
            .flatten()
            .is_some();
        if debug_info {
            values.insert(HW_WEBGL_UNMASKED_VENDOR, param(UNMASKED_VENDOR_WEBGL));
            values.insert(HW_WEBGL_UNMASKED_RENDERER, param(UNMASKED_RENDERER_WEBGL));
        }

        // Free the context; browsers cap live WebGL contexts per page.
        if let Ok(Some(lose)) = gl.get_extension("WEBGL_lose_context") {
            let _ = js_helpers::call_method(&lose, "loseContext", &Array::new());
        }

        let webgl2 = create_canvas(window, 1, 1)
            .ok()
            .and_then(|c| c.get_context("webgl2").ok().flatten())
            .is_some();

        log::debug!("WebGL parameters read ({} values)", values.len());
        Some(Self { values, webgl2 })
    }

    pub fn get(&self, dimension: &str) -> ProbeResult {
        self.values
            .get(dimension)
            .cloned()
            .ok_or_else(|| ProbeFault::Unsupported(dimension.to_string()))
    }
}

/// Realtime AudioContext properties.
pub struct AudioInfo {
    pub sample_rate: f64,
    pub max_channels: f64,
}

impl AudioInfo {
    pub fn read() -> Option<Self> {
        let ctx = AudioContext::new().ok()?;
        let info = Self {
            sample_rate: ctx.sample_rate() as f64,
            max_channels: ctx.destination().max_channel_count() as f64,
        };
        let _ = ctx.close();
        Some(info)
    }
}

/// Render a compressed triangle wave offline and hash the tail samples.
/// The DSP implementation differs per engine, OS and CPU.
#[allow(deprecated)]
async fn audio_render_hash() -> ProbeResult {
    const LENGTH: u32 = 5000;
    const TAIL: usize = 4500;

    let ctx = OfflineAudioContext::new_with_number_of_channels_and_length_and_sample_rate(
        1, LENGTH, 44100.0,
    )
    .map_err(|_| ProbeFault::Unsupported("OfflineAudioContext".into()))?;

    let oscillator = ctx.create_oscillator()?;
    oscillator.set_type(OscillatorType::Triangle);
    oscillator.frequency().set_value(10000.0);

    let compressor = ctx.create_dynamics_compressor()?;
    compressor.threshold().set_value(-50.0);
    compressor.knee().set_value(40.0);
    compressor.ratio().set_value(12.0);
    compressor.attack().set_value(0.0);
    compressor.release().set_value(0.25);

    oscillator.connect_with_audio_node(&compressor)?;
    compressor.connect_with_audio_node(&ctx.destination())?;
    oscillator.start()?;

    let rendered = JsFuture::from(ctx.start_rendering()?).await?;
    let buffer: AudioBuffer = rendered
        .dyn_into()
        .map_err(|_| ProbeFault::Threw("rendering did not produce an AudioBuffer".into()))?;
    let samples = buffer.get_channel_data(0)?;

    let tail: Vec<u8> = samples
        .iter()
        .skip(TAIL)
        .flat_map(|s| s.to_le_bytes())
        .collect();
    Ok(DimensionValue::Str(hex::encode(sha256_bytes(&tail))))
}

fn screen_prop(
    window: &Window,
    read: impl FnOnce(&web_sys::Screen) -> Result<i32, JsValue>,
) -> ProbeResult {
    let screen = window.screen()?;
    Ok(DimensionValue::Num(read(&screen)? as f64))
}

/// Results of engine math functions at inputs where implementations differ
/// in the last bits.
fn math_fingerprint() -> String {
    use js_sys::Math;

    let results = [
        Math::acos(0.123_124_234_234_234_24),
        Math::acosh(1e308),
        Math::asinh(1.0),
        Math::atanh(0.5),
        Math::atan(2.0),
        Math::sin(-1e300),
        Math::sinh(1.0),
        Math::cos(10.000_000_000_123),
        Math::cosh(1.0),
        Math::tan(-1e300),
        Math::tanh(1.0),
        Math::exp(1.0),
        Math::expm1(1.0),
        Math::log1p(10.0),
        Math::cbrt(100.0),
    ];
    sha256(&js_helpers::join_numbers(&results))
}
