//! Network family: connection, window placement, preferences, battery.
//!
//! Volatile signals; they only feed the Bronze lock.

use js_sys::Array;
use wasm_bindgen::prelude::*;

use super::js_helpers::{self, ProbeResult};
use super::BrowserEnvironment;
use crate::dimension::DimensionValue;
use crate::error::ProbeFault;
use crate::schema::{NET_OUTER_HEIGHT, NET_OUTER_WIDTH};

pub async fn probe(env: &BrowserEnvironment, dimension: &str) -> ProbeResult {
    let navigator = env.navigator();
    let window = env.window_value();
    let connection = |prop: &str| -> ProbeResult {
        let value = js_helpers::get_path(&navigator, &format!("connection.{}", prop))?;
        Ok(js_helpers::to_dimension(&value))
    };
    let window_number = |prop: &str| js_helpers::get(&window, prop).and_then(|v| js_helpers::number(&v));

    match dimension {
        "net_effective_type" => connection("effectiveType"),
        "net_downlink" => connection("downlink"),
        "net_rtt" => connection("rtt"),
        "net_save_data" => connection("saveData"),
        "net_online" => js_helpers::get(&navigator, "onLine").and_then(|v| js_helpers::boolean(&v)),
        NET_OUTER_WIDTH => window_number("outerWidth"),
        NET_OUTER_HEIGHT => window_number("outerHeight"),
        "net_inner_width" => window_number("innerWidth"),
        "net_inner_height" => window_number("innerHeight"),
        "net_screen_x" => window_number("screenX"),
        "net_screen_y" => window_number("screenY"),
        "net_color_scheme" => {
            let dark = media_matches(&window, "(prefers-color-scheme: dark)")?;
            Ok(DimensionValue::from(if dark { "dark" } else { "light" }))
        }
        "net_reduced_motion" => {
            media_matches(&window, "(prefers-reduced-motion: reduce)").map(DimensionValue::Bool)
        }
        "net_battery_level" => battery_prop(&navigator, "level").await,
        "net_battery_charging" => battery_prop(&navigator, "charging").await,
        "net_storage_quota" => {
            let storage = js_helpers::get(&navigator, "storage")?;
            let estimate = js_helpers::call_async(&storage, "estimate", &Array::new()).await?;
            js_helpers::number(&js_helpers::get(&estimate, "quota")?)
        }
        _ => Err(ProbeFault::UnknownDimension),
    }
}

/// `matchMedia(query).matches`.
fn media_matches(window: &JsValue, query: &str) -> Result<bool, ProbeFault> {
    let list = js_helpers::call_method(window, "matchMedia", &Array::of1(&JsValue::from_str(query)))?;
    Ok(js_helpers::get(&list, "matches")
        .ok()
        .and_then(|m| m.as_bool())
        .unwrap_or(false))
}

async fn battery_prop(navigator: &JsValue, prop: &str) -> ProbeResult {
    let battery = js_helpers::call_async(navigator, "getBattery", &Array::new()).await?;
    Ok(js_helpers::to_dimension(&js_helpers::get(&battery, prop)?))
}
