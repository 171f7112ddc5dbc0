//! Capabilities family: which web platform APIs exist and what they allow.

use js_sys::Array;
use wasm_bindgen::prelude::*;

use super::js_helpers::{self, ProbeResult};
use super::BrowserEnvironment;
use crate::dimension::DimensionValue;
use crate::error::ProbeFault;
use crate::report::to_js_value;

/// Storage APIs, in report order. Reading some of them throws in sandboxed
/// frames; that counts as absent.
const STORAGE_APIS: &[&str] = &["localStorage", "sessionStorage", "indexedDB", "caches"];

pub async fn probe(env: &BrowserEnvironment, dimension: &str) -> ProbeResult {
    let navigator = env.navigator();
    let in_navigator = |prop: &str| -> ProbeResult { Ok(DimensionValue::Bool(js_helpers::has(&navigator, prop))) };
    let in_global = |prop: &str| -> ProbeResult { Ok(DimensionValue::Bool(js_helpers::has_global(prop))) };

    match dimension {
        "cap_storage" => {
            let mut present: Vec<&str> = STORAGE_APIS
                .iter()
                .copied()
                .filter(|api| js_helpers::get_global(api).is_ok())
                .collect();
            if js_helpers::has(&navigator, "storage") {
                present.push("navigator.storage");
            }
            Ok(DimensionValue::list(present))
        }
        "cap_service_worker" => in_navigator("serviceWorker"),
        "cap_web_worker" => in_global("Worker"),
        "cap_shared_worker" => in_global("SharedWorker"),
        "cap_webassembly" => in_global("WebAssembly"),
        "cap_webrtc" => in_global("RTCPeerConnection"),
        "cap_websocket" => in_global("WebSocket"),
        "cap_web_share" => in_navigator("share"),
        "cap_clipboard" => in_navigator("clipboard"),
        "cap_notification" => in_global("Notification"),
        "cap_geolocation" => in_navigator("geolocation"),
        "cap_bluetooth" => in_navigator("bluetooth"),
        "cap_usb" => in_navigator("usb"),
        "cap_serial" => in_navigator("serial"),
        "cap_hid" => in_navigator("hid"),
        "cap_webgpu" => in_navigator("gpu"),
        "cap_plugins" => Ok(js_helpers::string_prop_list(
            &js_helpers::get(&navigator, "plugins")?,
            "name",
        )),
        "cap_mime_types" => Ok(js_helpers::string_prop_list(
            &js_helpers::get(&navigator, "mimeTypes")?,
            "type",
        )),
        "cap_permission_notifications" => permission_state(&navigator, "notifications").await,
        "cap_permission_geolocation" => permission_state(&navigator, "geolocation").await,
        "cap_permission_camera" => permission_state(&navigator, "camera").await,
        "cap_permission_microphone" => permission_state(&navigator, "microphone").await,
        "cap_battery_api" => in_navigator("getBattery"),

        _ => Err(ProbeFault::UnknownDimension),
    }
}

/// `navigator.permissions.query({ name }).state`. Browsers that do not know
/// the permission name reject, which reports as unavailable.
async fn permission_state(navigator: &JsValue, name: &str) -> ProbeResult {
    let permissions = js_helpers::get(navigator, "permissions")?;
    let descriptor = to_js_value(&serde_json::json!({ "name": name }))
        .map_err(|e| ProbeFault::Threw(e.to_string()))?;
    let status = js_helpers::call_async(&permissions, "query", &Array::of1(&descriptor)).await?;
    js_helpers::string(&js_helpers::get(&status, "state")?)
}
