//! System family: navigator identity, locale and timezone, privacy flags.

use js_sys::Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use super::js_helpers::{self, ProbeResult};
use super::BrowserEnvironment;
use crate::dimension::DimensionValue;
use crate::error::ProbeFault;
use crate::schema::{
    SYS_INTL_LOCALE, SYS_LANGUAGE, SYS_LANGUAGES, SYS_OSCPU, SYS_PLATFORM, SYS_PRODUCT_SUB,
    SYS_TIMEZONE, SYS_TIMEZONE_OFFSET, SYS_USER_AGENT, SYS_VENDOR,
};
use crate::ua::parse_user_agent;

/// 2001-02-03T04:05:06Z, rendered by the default date formatter.
const SAMPLE_DATE_MS: f64 = 981_173_106_000.0;
const SAMPLE_NUMBER: f64 = 1_234_567.891;

pub async fn probe(env: &BrowserEnvironment, dimension: &str) -> ProbeResult {
    let navigator = env.navigator();
    let nav_string = |prop: &str| js_helpers::get(&navigator, prop).and_then(|v| js_helpers::string(&v));
    let nav_bool = |prop: &str| js_helpers::get(&navigator, prop).and_then(|v| js_helpers::boolean(&v));

    match dimension {
        SYS_PLATFORM => nav_string("platform"),
        SYS_USER_AGENT => nav_string("userAgent"),
        "sys_ua_browser" => {
            let ua = user_agent(&navigator)?;
            Ok(parse_user_agent(&ua).browser.map(|b| b.name()).into())
        }
        "sys_ua_browser_version" => {
            let ua = user_agent(&navigator)?;
            Ok(parse_user_agent(&ua).browser_version.into())
        }
        "sys_ua_os" => {
            let ua = user_agent(&navigator)?;
            Ok(parse_user_agent(&ua).os.map(|os| os.name()).into())
        }
        "sys_app_version" => nav_string("appVersion"),
        SYS_VENDOR => nav_string("vendor"),
        "sys_product" => nav_string("product"),
        SYS_PRODUCT_SUB => nav_string("productSub"),
        // Firefox only.
        "sys_build_id" => nav_string("buildID"),
        SYS_OSCPU => nav_string("oscpu"),
        SYS_LANGUAGE => nav_string("language"),
        SYS_LANGUAGES => Ok(js_helpers::to_dimension(&js_helpers::get(&navigator, "languages")?)),

        SYS_TIMEZONE => resolved_date_option("timeZone"),
        SYS_TIMEZONE_OFFSET => Ok(DimensionValue::Num(js_sys::Date::new_0().get_timezone_offset())),
        SYS_INTL_LOCALE => resolved_date_option("locale"),
        "sys_intl_calendar" => resolved_date_option("calendar"),
        "sys_intl_numbering_system" => resolved_date_option("numberingSystem"),
        "sys_intl_number_format" => intl_format("NumberFormat", &JsValue::from_f64(SAMPLE_NUMBER)),
        "sys_intl_date_format" => intl_format(
            "DateTimeFormat",
            &js_sys::Date::new(&JsValue::from_f64(SAMPLE_DATE_MS)).into(),
        ),

        "sys_do_not_track" => {
            // `null` means the user never chose; that is a value, not an absence.
            let dnt = js_sys::Reflect::get(&navigator, &JsValue::from_str("doNotTrack"))?;
            if dnt.is_undefined() {
                Err(ProbeFault::Unsupported("doNotTrack".into()))
            } else {
                Ok(DimensionValue::Str(dnt.as_string().unwrap_or_else(|| "unspecified".into())))
            }
        }
        "sys_cookies_enabled" => nav_bool("cookieEnabled"),
        "sys_pdf_viewer" => nav_bool("pdfViewerEnabled"),
        "sys_webdriver" => nav_bool("webdriver"),
        "sys_connection_type" => {
            js_helpers::get_path(&navigator, "connection.type").and_then(|v| js_helpers::string(&v))
        }
        "sys_media_devices" => media_device_kinds(&navigator).await,

        _ => Err(ProbeFault::UnknownDimension),
    }
}

fn user_agent(navigator: &JsValue) -> Result<String, ProbeFault> {
    js_helpers::get(navigator, "userAgent")?
        .as_string()
        .ok_or_else(|| ProbeFault::Unsupported("userAgent".into()))
}

/// `new Intl.<ctor>()`.
fn intl_instance(ctor: &str) -> Result<JsValue, ProbeFault> {
    let intl = js_helpers::get_global("Intl")?;
    let constructor: js_sys::Function = js_helpers::get(&intl, ctor)?
        .dyn_into()
        .map_err(|_| ProbeFault::Unsupported(format!("Intl.{}", ctor)))?;
    Ok(js_sys::Reflect::construct(&constructor, &Array::new())?)
}

/// Field of `new Intl.DateTimeFormat().resolvedOptions()`.
fn resolved_date_option(field: &str) -> ProbeResult {
    let format = intl_instance("DateTimeFormat")?;
    let options = js_helpers::call_method(&format, "resolvedOptions", &Array::new())?;
    js_helpers::string(&js_helpers::get(&options, field)?)
}

/// `new Intl.<ctor>().format(value)` in the default locale.
fn intl_format(ctor: &str, value: &JsValue) -> ProbeResult {
    let format = intl_instance(ctor)?;
    let formatted = js_helpers::call_method(&format, "format", &Array::of1(value))?;
    js_helpers::string(&formatted)
}

/// Sorted kinds of the enumerable media devices. Labels need a permission
/// grant, so only kinds are stable.
async fn media_device_kinds(navigator: &JsValue) -> ProbeResult {
    let devices = js_helpers::get(navigator, "mediaDevices")?;
    let list = js_helpers::call_async(&devices, "enumerateDevices", &Array::new()).await?;
    let mut kinds = js_helpers::map_array_like(&list, |device| {
        js_helpers::get(device, "kind").ok().and_then(|k| k.as_string())
    });
    kinds.sort();
    Ok(DimensionValue::list(kinds))
}
