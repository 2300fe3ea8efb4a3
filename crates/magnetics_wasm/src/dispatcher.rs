//! The task queue the UI talks to. Every method returns a promise.

use std::future::Future;
use std::rc::Rc;

use js_sys::{Function, Promise};
use log::warn;
use magnetics_core::dispatch::{
    DispatcherConfig, TaskDispatcher, TaskObserver, TaskOutcome, Topology,
};
use magnetics_core::error::DispatchError;
use magnetics_core::mas::Excitation;
use magnetics_core::traits::EngineArg;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::bridge::{js_error_text, JsEngineBridge};
use crate::{from_js, from_js_or_default, to_js};

/// Forwards task outcomes to a JS callback `(task, success, message)`.
struct JsTaskObserver {
    callback: Function,
}

impl TaskObserver for JsTaskObserver {
    fn task_finished(&self, task: &str, outcome: &TaskOutcome) {
        let (success, message) = match outcome {
            TaskOutcome::Succeeded => (true, ""),
            TaskOutcome::Failed(message) => (false, message.as_str()),
        };
        if let Err(err) = self.callback.call3(
            &JsValue::NULL,
            &JsValue::from_str(task),
            &JsValue::from_bool(success),
            &JsValue::from_str(message),
        ) {
            warn!("task observer for {task} threw: {}", js_error_text(&err));
        }
    }
}

type Dispatcher = TaskDispatcher<JsEngineBridge>;

fn dispatch_error(err: DispatchError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn run<T, F>(task: F) -> Promise
where
    T: Serialize,
    F: Future<Output = Result<T, DispatchError>> + 'static,
{
    future_to_promise(async move {
        let value = task.await.map_err(dispatch_error)?;
        to_js(&value)
    })
}

#[wasm_bindgen]
pub struct WasmTaskQueue {
    dispatcher: Rc<Dispatcher>,
}

#[wasm_bindgen]
impl WasmTaskQueue {
    /// `config` may be omitted; `on_task_finished` receives
    /// `(task, success, message)` after every call.
    #[wasm_bindgen(constructor)]
    pub fn new(
        engine: JsValue,
        config: JsValue,
        on_task_finished: Option<Function>,
    ) -> Result<WasmTaskQueue, JsValue> {
        let config: DispatcherConfig = from_js_or_default(config, "dispatcher config")?;
        let mut dispatcher = TaskDispatcher::with_config(JsEngineBridge::new(engine), config);
        if let Some(callback) = on_task_finished {
            dispatcher.set_observer(Box::new(JsTaskObserver { callback }));
        }
        Ok(WasmTaskQueue {
            dispatcher: Rc::new(dispatcher),
        })
    }

    pub fn is_ready(&self) -> bool {
        self.dispatcher.is_ready()
    }

    /// Loads the base datasets and releases every call waiting on the engine.
    pub fn initialize(&self) -> Promise {
        let d = Rc::clone(&self.dispatcher);
        run(async move { d.initialize().await })
    }

    /// Calls any engine method. `args` is a list of
    /// `{kind: "json" | "text" | "number" | "integer" | "bool", value}`.
    pub fn call(&self, method: String, args: JsValue) -> Result<Promise, JsValue> {
        let args: Vec<EngineArg> = from_js_or_default(args, "engine arguments")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move { d.call_json::<Value>(&method, args).await }))
    }

    pub fn load_cores(
        &self,
        data: String,
        allow_toroidal: bool,
        use_only_in_stock: bool,
    ) -> Promise {
        let d = Rc::clone(&self.dispatcher);
        run(async move { d.load_cores(&data, allow_toroidal, use_only_in_stock).await })
    }

    pub fn calculate_core_data(
        &self,
        core: JsValue,
        resolve_unspecified_dimensions: bool,
    ) -> Result<Promise, JsValue> {
        let core: Value = from_js(core, "core")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move {
            d.calculate_core_data(&core, resolve_unspecified_dimensions)
                .await
        }))
    }

    pub fn get_material_data(&self, material_name: String) -> Promise {
        let d = Rc::clone(&self.dispatcher);
        run(async move { d.get_material_data(&material_name).await })
    }

    pub fn get_core_temperature_dependant_parameters(
        &self,
        core: JsValue,
        temperature: f64,
    ) -> Result<Promise, JsValue> {
        let core: Value = from_js(core, "core")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move {
            d.get_core_temperature_dependant_parameters(&core, temperature)
                .await
        }))
    }

    pub fn mas_autocomplete(
        &self,
        mas: JsValue,
        flag: bool,
        settings: JsValue,
    ) -> Result<Promise, JsValue> {
        let mas: Value = from_js(mas, "mas")?;
        let settings: Value = from_js_or_default(settings, "settings")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move { d.mas_autocomplete(&mas, flag, &settings).await }))
    }

    pub fn get_settings(&self) -> Promise {
        let d = Rc::clone(&self.dispatcher);
        run(async move { d.get_settings().await })
    }

    pub fn set_settings(&self, settings: JsValue) -> Result<Promise, JsValue> {
        let settings: Value = from_js(settings, "settings")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move { d.set_settings(&settings).await }))
    }

    pub fn calculate_advised_cores(
        &self,
        inputs: JsValue,
        weights: JsValue,
        count: u32,
        mode: String,
    ) -> Result<Promise, JsValue> {
        let inputs: Value = from_js(inputs, "inputs")?;
        let weights: Value = from_js_or_default(weights, "weights")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move {
            d.calculate_advised_cores(&inputs, &weights, count, &mode)
                .await
        }))
    }

    pub fn calculate_advised_magnetics(
        &self,
        inputs: JsValue,
        weights: JsValue,
        count: u32,
        mode: String,
    ) -> Result<Promise, JsValue> {
        let inputs: Value = from_js(inputs, "inputs")?;
        let weights: Value = from_js_or_default(weights, "weights")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move {
            d.calculate_advised_magnetics(&inputs, &weights, count, &mode)
                .await
        }))
    }

    pub fn calculate_harmonics(&self, waveform: JsValue, frequency: f64) -> Result<Promise, JsValue> {
        let waveform: Value = from_js(waveform, "waveform")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move { d.calculate_harmonics(&waveform, frequency).await }))
    }

    pub fn calculate_processed(
        &self,
        harmonics: JsValue,
        waveform: JsValue,
    ) -> Result<Promise, JsValue> {
        let harmonics: Value = from_js(harmonics, "harmonics")?;
        let waveform: Value = from_js(waveform, "waveform")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move { d.calculate_processed(&harmonics, &waveform).await }))
    }

    pub fn create_waveform(&self, processed: JsValue, frequency: f64) -> Result<Promise, JsValue> {
        let processed: Value = from_js(processed, "processed data")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move { d.create_waveform(&processed, frequency).await }))
    }

    /// Resolves to `null` whenever the waveforms are incomplete or the engine
    /// rejects them; never rejects.
    pub fn calculate_rms_power(&self, excitation: JsValue) -> Promise {
        let d = Rc::clone(&self.dispatcher);
        future_to_promise(async move {
            let excitation: Option<Excitation> = from_js(excitation, "excitation").ok();
            let power = match excitation {
                Some(excitation) => d.calculate_rms_power(&excitation).await,
                None => None,
            };
            to_js(&power)
        })
    }

    /// See [`WasmTaskQueue::calculate_rms_power`].
    pub fn calculate_instantaneous_power(&self, excitation: JsValue) -> Promise {
        let d = Rc::clone(&self.dispatcher);
        future_to_promise(async move {
            let excitation: Option<Excitation> = from_js(excitation, "excitation").ok();
            let power = match excitation {
                Some(excitation) => d.calculate_instantaneous_power(&excitation).await,
                None => None,
            };
            to_js(&power)
        })
    }

    pub fn resolve_dimension_with_tolerance(&self, dimension: JsValue) -> Result<Promise, JsValue> {
        let dimension: Value = from_js(dimension, "dimension")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move {
            d.resolve_dimension_with_tolerance(&dimension).await
        }))
    }

    pub fn calculate_leakage_inductance(
        &self,
        magnetic: JsValue,
        frequency: f64,
        operating_point_index: usize,
    ) -> Result<Promise, JsValue> {
        let magnetic: Value = from_js(magnetic, "magnetic")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move {
            d.calculate_leakage_inductance(&magnetic, frequency, operating_point_index)
                .await
        }))
    }

    pub fn export_magnetic_as_subcircuit(
        &self,
        magnetic: JsValue,
        temperature: f64,
        format: String,
        extra: String,
    ) -> Result<Promise, JsValue> {
        let magnetic: Value = from_js(magnetic, "magnetic")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move {
            d.export_magnetic_as_subcircuit(&magnetic, temperature, &format, &extra)
                .await
        }))
    }

    pub fn extract_column_names(&self, file: String) -> Promise {
        let d = Rc::clone(&self.dispatcher);
        run(async move { d.extract_column_names(&file).await })
    }

    pub fn extract_operating_point(
        &self,
        file: String,
        number_windings: usize,
        frequency: f64,
        magnetizing_inductance: f64,
        map_column_names: JsValue,
    ) -> Result<Promise, JsValue> {
        let map_column_names: Value = from_js(map_column_names, "column map")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move {
            d.extract_operating_point(
                &file,
                number_windings,
                frequency,
                magnetizing_inductance,
                &map_column_names,
            )
            .await
        }))
    }

    /// `topology` is the wizard name, e.g. `"flyback"` or `"llcResonant"`.
    pub fn calculate_wizard_inputs(
        &self,
        topology: JsValue,
        advanced: bool,
        params: JsValue,
    ) -> Result<Promise, JsValue> {
        let topology: Topology = from_js(topology, "topology")?;
        let params: Value = from_js(params, "wizard parameters")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move {
            d.calculate_wizard_inputs(topology, advanced, &params).await
        }))
    }

    pub fn simulate_ideal_waveforms(
        &self,
        topology: JsValue,
        params: JsValue,
    ) -> Result<Promise, JsValue> {
        let topology: Topology = from_js(topology, "topology")?;
        let params: Value = from_js(params, "wizard parameters")?;
        let d = Rc::clone(&self.dispatcher);
        Ok(run(async move { d.simulate_ideal_waveforms(topology, &params).await }))
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::WasmTaskQueue;
    use js_sys::{Function, Object, Reflect};
    use wasm_bindgen::JsValue;
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn engine() -> JsValue {
        let engine = Object::new();
        for (method, body) in [
            ("load_core_materials", "return '';"),
            ("load_core_shapes", "return '';"),
            ("load_wires", "return '';"),
            ("get_material_data", "return JSON.stringify({name: a});"),
            ("calculate_core_data", "return 'Exception: unknown shape';"),
        ] {
            Reflect::set(
                &engine,
                &JsValue::from_str(method),
                &Function::new_with_args("a, b", body),
            )
            .expect("set method");
        }
        engine.into()
    }

    #[wasm_bindgen_test]
    async fn queued_call_resolves_after_initialize() {
        let queue = WasmTaskQueue::new(engine(), JsValue::UNDEFINED, None).expect("queue");
        let pending = queue.get_material_data("N87".to_string());
        JsFuture::from(queue.initialize()).await.expect("initialize");
        let material = JsFuture::from(pending).await.expect("material");
        let name = Reflect::get(&material, &JsValue::from_str("name")).expect("name");
        assert_eq!(name.as_string().as_deref(), Some("N87"));
    }

    #[wasm_bindgen_test]
    async fn engine_exception_rejects_with_message() {
        let queue = WasmTaskQueue::new(engine(), JsValue::UNDEFINED, None).expect("queue");
        JsFuture::from(queue.initialize()).await.expect("initialize");
        let promise = queue
            .calculate_core_data(Object::new().into(), false)
            .expect("promise");
        let err = JsFuture::from(promise).await.expect_err("exception");
        assert_eq!(err.as_string().as_deref(), Some("Exception: unknown shape"));
    }

    #[wasm_bindgen_test]
    async fn power_with_missing_waveforms_resolves_to_null() {
        let queue = WasmTaskQueue::new(engine(), JsValue::UNDEFINED, None).expect("queue");
        JsFuture::from(queue.initialize()).await.expect("initialize");
        let power = JsFuture::from(queue.calculate_rms_power(Object::new().into()))
            .await
            .expect("power");
        assert!(power.is_null());
    }
}
