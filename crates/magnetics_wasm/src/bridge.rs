//! [`EngineBridge`] over the JS engine object.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use js_sys::{Array, Function, Promise, Reflect, JSON};
use magnetics_core::error::BridgeError;
use magnetics_core::traits::{EngineArg, EngineBridge};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// Calls methods of a JS engine object by name. Methods may return a string
/// or a promise of one; other values are passed through `JSON.stringify`.
#[derive(Clone)]
pub struct JsEngineBridge {
    engine: JsValue,
}

impl JsEngineBridge {
    pub fn new(engine: JsValue) -> Self {
        Self { engine }
    }

    async fn call(&self, method: &str, args: &[EngineArg]) -> anyhow::Result<String> {
        let function: Function = Reflect::get(&self.engine, &JsValue::from_str(method))
            .map_err(|e| anyhow!(js_error_text(&e)))?
            .dyn_into()
            .map_err(|_| anyhow!("engine has no method {method}"))?;

        let js_args: Array = args.iter().map(to_js_arg).collect();
        let mut result = function
            .apply(&self.engine, &js_args)
            .map_err(|e| anyhow!(js_error_text(&e)))?;
        if result.has_type::<Promise>() {
            let promise: Promise = result.unchecked_into();
            result = JsFuture::from(promise)
                .await
                .map_err(|e| anyhow!(js_error_text(&e)))?;
        }

        if let Some(text) = result.as_string() {
            return Ok(text);
        }
        if result.is_undefined() || result.is_null() {
            return Ok(String::new());
        }
        JSON::stringify(&result)
            .map(String::from)
            .map_err(|e| anyhow!(js_error_text(&e)))
    }
}

#[async_trait(?Send)]
impl EngineBridge for JsEngineBridge {
    async fn invoke(&self, method: &str, args: &[EngineArg]) -> Result<String, BridgeError> {
        self.call(method, args)
            .await
            .with_context(|| format!("calling {method}"))
            .map_err(BridgeError::from)
    }
}

fn to_js_arg(arg: &EngineArg) -> JsValue {
    match arg {
        EngineArg::Json(text) | EngineArg::Text(text) => JsValue::from_str(text),
        EngineArg::Number(value) => JsValue::from_f64(*value),
        EngineArg::Integer(value) => JsValue::from_f64(*value as f64),
        EngineArg::Bool(value) => JsValue::from_bool(*value),
    }
}

pub(crate) fn js_error_text(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use js_sys::Object;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn engine_with(method: &str, body: &str) -> JsValue {
        let engine = Object::new();
        let function = Function::new_with_args("a, b", body);
        Reflect::set(&engine, &JsValue::from_str(method), &function).expect("set method");
        engine.into()
    }

    #[wasm_bindgen_test]
    async fn string_results_are_returned_as_is() {
        let bridge = JsEngineBridge::new(engine_with("get_material_data", "return '{\"name\":\"' + a + '\"}';"));
        let text = bridge
            .invoke("get_material_data", &[EngineArg::Text("N87".to_string())])
            .await
            .expect("material");
        assert_eq!(text, r#"{"name":"N87"}"#);
    }

    #[wasm_bindgen_test]
    async fn promise_results_are_awaited() {
        let bridge = JsEngineBridge::new(engine_with("calculate_rms_power", "return Promise.resolve(String(a.length));"));
        let text = bridge
            .invoke("calculate_rms_power", &[EngineArg::Json("{}".to_string())])
            .await
            .expect("power");
        assert_eq!(text, "2");
    }

    #[wasm_bindgen_test]
    async fn missing_method_is_a_bridge_error() {
        let bridge = JsEngineBridge::new(Object::new().into());
        let err = bridge.invoke("load_wires", &[]).await.expect_err("missing");
        assert!(err.0.contains("calling load_wires"));
        assert!(err.0.contains("engine has no method load_wires"));
    }
}
