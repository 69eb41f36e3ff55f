//! WebAssembly bindings for JavaScript
//!
//! This module provides WASM bindings using wasm-bindgen for use in browsers
//! and Node.js. Enable with the "wasm" feature flag.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use crate::transpiler::{JsRegex, Options, transpile_with};

/// Transpile an Onigmo pattern
///
/// `flags` holds the Ruby option letters; a `g` among them sets the
/// JavaScript global flag. Returns `{ source, flags, warnings }`, ready for
/// `new RegExp(result.source, result.flags)`, or throws the error message.
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub fn transpile(pattern: &str, flags: &str) -> Result<JsValue, JsValue> {
    let onigmo_flags: String = flags.chars().filter(|c| *c != 'g').collect();
    let options = Options::from_flags(&onigmo_flags).global(flags.contains('g'));

    match transpile_with(pattern, &options) {
        Ok(regex) => to_js_object(&regex),
        Err(e) => Err(JsValue::from_str(&e.to_string())),
    }
}

#[cfg(feature = "wasm")]
fn to_js_object(regex: &JsRegex) -> Result<JsValue, JsValue> {
    let warnings = js_sys::Array::new();
    for warning in &regex.warnings {
        warnings.push(&JsValue::from_str(&warning.to_string()));
    }

    let obj = js_sys::Object::new();
    js_sys::Reflect::set(&obj, &"source".into(), &JsValue::from_str(&regex.source))?;
    js_sys::Reflect::set(&obj, &"flags".into(), &JsValue::from_str(&regex.flags))?;
    js_sys::Reflect::set(&obj, &"warnings".into(), &warnings)?;
    Ok(obj.into())
}

/// Initialize panic hook for better error messages in WASM
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}
