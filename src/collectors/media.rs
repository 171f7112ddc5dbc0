//! Media family: codec support, MediaSource, DRM key systems, speech voices.

use js_sys::Array;
use wasm_bindgen::prelude::*;

use super::js_helpers::{self, ProbeResult};
use super::BrowserEnvironment;
use crate::dimension::DimensionValue;
use crate::error::ProbeFault;
use crate::report::to_js_value;

const AUDIO_CODECS: &[&str] = &[
    "audio/ogg; codecs=\"vorbis\"",
    "audio/ogg; codecs=\"opus\"",
    "audio/mpeg",
    "audio/mp4; codecs=\"mp4a.40.2\"",
    "audio/wav; codecs=\"1\"",
    "audio/webm; codecs=\"opus\"",
    "audio/flac",
    "audio/aac",
];

const VIDEO_CODECS: &[&str] = &[
    "video/ogg; codecs=\"theora\"",
    "video/mp4; codecs=\"avc1.42E01E\"",
    "video/mp4; codecs=\"hvc1.1.6.L93.B0\"",
    "video/mp4; codecs=\"av01.0.05M.08\"",
    "video/webm; codecs=\"vp8, vorbis\"",
    "video/webm; codecs=\"vp9\"",
    "video/x-matroska",
];

const SOURCE_TYPES: &[&str] = &[
    "video/mp4; codecs=\"avc1.42E01E\"",
    "video/webm; codecs=\"vp9\"",
    "video/mp4; codecs=\"av01.0.05M.08\"",
    "audio/mp4; codecs=\"mp4a.40.2\"",
    "audio/webm; codecs=\"opus\"",
];

const KEY_SYSTEMS: &[&str] = &[
    "com.widevine.alpha",
    "com.microsoft.playready",
    "com.apple.fps.1_0",
    "org.w3.clearkey",
];

pub async fn probe(env: &BrowserEnvironment, dimension: &str) -> ProbeResult {
    match dimension {
        "media_audio_codecs" => can_play_types(env, "audio", AUDIO_CODECS),
        "media_video_codecs" => can_play_types(env, "video", VIDEO_CODECS),
        "media_source_types" => media_source_support(),
        "media_drm" => key_systems(&env.navigator()).await,
        "media_speech_voices" => speech_voices(),
        _ => Err(ProbeFault::UnknownDimension),
    }
}

/// `canPlayType` answer per MIME type, as `"<mime>=<answer>"`.
fn can_play_types(env: &BrowserEnvironment, tag: &str, types: &[&str]) -> ProbeResult {
    let document = env
        .window()
        .document()
        .ok_or_else(|| ProbeFault::Unsupported("document".into()))?;
    let element: JsValue = document.create_element(tag)?.into();

    let answers = types
        .iter()
        .map(|mime| -> Result<String, ProbeFault> {
            let answer = js_helpers::call_method(&element, "canPlayType", &Array::of1(&JsValue::from_str(mime)))?
                .as_string()
                .unwrap_or_default();
            Ok(format!("{}={}", mime, answer))
        })
        .collect::<Result<Vec<_>, ProbeFault>>()?;
    Ok(DimensionValue::list(answers))
}

/// `MediaSource.isTypeSupported` per type.
fn media_source_support() -> ProbeResult {
    let media_source = js_helpers::get_global("MediaSource")?;
    let answers = SOURCE_TYPES
        .iter()
        .map(|mime| {
            js_helpers::call_method(
                &media_source,
                "isTypeSupported",
                &Array::of1(&JsValue::from_str(mime)),
            )
            .map(|v| v.as_bool().unwrap_or(false))
        })
        .collect::<Result<Vec<_>, ProbeFault>>()?;
    Ok(DimensionValue::list(answers))
}

/// Key systems `requestMediaKeySystemAccess` grants, in table order.
async fn key_systems(navigator: &JsValue) -> ProbeResult {
    if !js_helpers::has(navigator, "requestMediaKeySystemAccess") {
        return Err(ProbeFault::Unsupported("requestMediaKeySystemAccess".into()));
    }
    let config = to_js_value(&serde_json::json!([{
        "initDataTypes": ["cenc"],
        "videoCapabilities": [{ "contentType": "video/mp4; codecs=\"avc1.42E01E\"" }],
    }]))
    .map_err(|e| ProbeFault::Threw(e.to_string()))?;

    let mut supported = Vec::new();
    for key_system in KEY_SYSTEMS {
        let args = Array::of2(&JsValue::from_str(key_system), &config);
        // Rejection means "not supported", not a fault.
        if js_helpers::call_async(navigator, "requestMediaKeySystemAccess", &args)
            .await
            .is_ok()
        {
            supported.push(*key_system);
        }
    }
    Ok(DimensionValue::list(supported))
}

/// Installed voices as `"<name> (<lang>)"`. Chromium fills the list
/// lazily, so an early scan may see it empty.
fn speech_voices() -> ProbeResult {
    let synthesis = js_helpers::get_global("speechSynthesis")?;
    let voices = js_helpers::call_method(&synthesis, "getVoices", &Array::new())?;
    let names = js_helpers::map_array_like(&voices, |voice| {
        let name = js_helpers::get(voice, "name").ok()?.as_string()?;
        let lang = js_helpers::get(voice, "lang")
            .ok()
            .and_then(|l| l.as_string())
            .unwrap_or_default();
        Some(format!("{} ({})", name, lang))
    });
    Ok(DimensionValue::list(names))
}
