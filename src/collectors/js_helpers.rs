//! Reflect wrappers for reading optional browser APIs.
//!
//! Every helper turns "missing" into [`ProbeFault::Unsupported`] and "threw"
//! into [`ProbeFault::Threw`], so collectors can use `?` throughout.

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::canonical::format_number;
use crate::dimension::{DimensionValue, ListItem};
use crate::error::ProbeFault;

/// What every probe returns.
pub type ProbeResult = Result<DimensionValue, ProbeFault>;

fn is_missing(value: &JsValue) -> bool {
    value.is_undefined() || value.is_null()
}

/// Property of the global scope, or `Unsupported` if absent.
pub fn get_global(prop: &str) -> Result<JsValue, ProbeFault> {
    get(&js_sys::global(), prop).map_err(|_| ProbeFault::Unsupported(prop.to_string()))
}

/// Whether the global scope has `prop`.
pub fn has_global(prop: &str) -> bool {
    has(&js_sys::global(), prop)
}

/// Property of `obj`, or `Unsupported` if `undefined`/`null`.
pub fn get(obj: &JsValue, prop: &str) -> Result<JsValue, ProbeFault> {
    if is_missing(obj) {
        return Err(ProbeFault::Unsupported(prop.to_string()));
    }
    let value = Reflect::get(obj, &JsValue::from_str(prop))?;
    if is_missing(&value) {
        Err(ProbeFault::Unsupported(prop.to_string()))
    } else {
        Ok(value)
    }
}

/// Dotted property path from `root`, e.g. `"connection.effectiveType"`.
pub fn get_path(root: &JsValue, path: &str) -> Result<JsValue, ProbeFault> {
    path.split('.')
        .try_fold(root.clone(), |obj, prop| get(&obj, prop))
        .map_err(|fault| match fault {
            ProbeFault::Unsupported(_) => ProbeFault::Unsupported(path.to_string()),
            other => other,
        })
}

/// `prop in obj`. Never throws.
pub fn has(obj: &JsValue, prop: &str) -> bool {
    if !obj.is_object() && !obj.is_function() {
        return false;
    }
    Reflect::has(obj, &JsValue::from_str(prop)).unwrap_or(false)
}

/// Call `obj[method](...args)`.
pub fn call_method(obj: &JsValue, method: &str, args: &Array) -> Result<JsValue, ProbeFault> {
    let func: Function = get(obj, method)?
        .dyn_into()
        .map_err(|_| ProbeFault::Unsupported(format!("{} is not a function", method)))?;
    Ok(Reflect::apply(&func, obj, args)?)
}

/// Await a promise-like value.
pub async fn await_promise(value: JsValue) -> Result<JsValue, ProbeFault> {
    let promise: js_sys::Promise = value
        .dyn_into()
        .map_err(|_| ProbeFault::Threw("expected a Promise".into()))?;
    Ok(JsFuture::from(promise).await?)
}

/// Call an async method and await its result.
pub async fn call_async(obj: &JsValue, method: &str, args: &Array) -> Result<JsValue, ProbeFault> {
    let promise = call_method(obj, method, args)?;
    await_promise(promise).await
}

pub fn string(value: &JsValue) -> Result<DimensionValue, ProbeFault> {
    value
        .as_string()
        .map(DimensionValue::Str)
        .ok_or_else(|| ProbeFault::Threw(format!("expected string, got {:?}", value)))
}

pub fn number(value: &JsValue) -> Result<DimensionValue, ProbeFault> {
    value
        .as_f64()
        .map(DimensionValue::Num)
        .ok_or_else(|| ProbeFault::Threw(format!("expected number, got {:?}", value)))
}

pub fn boolean(value: &JsValue) -> Result<DimensionValue, ProbeFault> {
    value
        .as_bool()
        .map(DimensionValue::Bool)
        .ok_or_else(|| ProbeFault::Threw(format!("expected boolean, got {:?}", value)))
}

fn list_item(value: &JsValue) -> ListItem {
    if let Some(s) = value.as_string() {
        ListItem::Str(s)
    } else if let Some(n) = value.as_f64() {
        ListItem::Num(n)
    } else if let Some(b) = value.as_bool() {
        ListItem::Bool(b)
    } else {
        ListItem::Null
    }
}

/// Primitive or array of primitives. Objects are captured as their JSON.
pub fn to_dimension(value: &JsValue) -> DimensionValue {
    if is_missing(value) {
        DimensionValue::Unavailable
    } else if let Some(s) = value.as_string() {
        DimensionValue::Str(s)
    } else if let Some(n) = value.as_f64() {
        DimensionValue::Num(n)
    } else if let Some(b) = value.as_bool() {
        DimensionValue::Bool(b)
    } else if Array::is_array(value) {
        DimensionValue::List(Array::from(value).iter().map(|v| list_item(&v)).collect())
    } else {
        js_sys::JSON::stringify(value)
            .ok()
            .and_then(|s| s.as_string())
            .map(DimensionValue::Str)
            .unwrap_or(DimensionValue::Unavailable)
    }
}

/// Array-like (`Array`, `PluginArray`, `FrozenArray`) mapped item by item.
pub fn map_array_like<T>(value: &JsValue, mut f: impl FnMut(&JsValue) -> Option<T>) -> Vec<T> {
    let length = Reflect::get(value, &JsValue::from_str("length"))
        .ok()
        .and_then(|l| l.as_f64())
        .unwrap_or(0.0) as u32;
    (0..length)
        .filter_map(|i| Reflect::get_u32(value, i).ok())
        .filter_map(|item| f(&item))
        .collect()
}

/// String property of every item of an array-like.
pub fn string_prop_list(value: &JsValue, prop: &str) -> DimensionValue {
    DimensionValue::list(map_array_like(value, |item| {
        get(item, prop).ok().and_then(|v| v.as_string())
    }))
}

/// Stable string for a sequence of numbers.
pub fn join_numbers(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format_number(*v))
        .collect::<Vec<_>>()
        .join(",")
}
