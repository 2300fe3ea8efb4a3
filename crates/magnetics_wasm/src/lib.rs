//! Browser bindings for `magnetics_core`.
//!
//! The engine is a JS object whose methods take JSON strings or primitives and
//! return strings (possibly through a promise). Persisted stores live in
//! `localStorage`. Values cross the boundary through `serde-wasm-bindgen` in
//! its JSON-compatible mode so the UI receives plain objects.

mod bridge;
mod dispatcher;
mod forms;
mod history;
mod session;
mod storage;
mod waveforms;

pub use bridge::JsEngineBridge;
pub use dispatcher::WasmTaskQueue;
pub use history::WasmHistory;
pub use storage::LocalStorage;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, Serializer};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    from_value(value).map_err(|e| JsValue::from_str(&format!("Invalid {}: {}", what, e)))
}

/// Like [`from_js`], but `undefined`/`null` give the default.
pub(crate) fn from_js_or_default<T: DeserializeOwned + Default>(
    value: JsValue,
    what: &str,
) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        Ok(T::default())
    } else {
        from_js(value, what)
    }
}
