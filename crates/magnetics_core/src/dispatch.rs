//! Task dispatcher: one async call per engine capability.
//!
//! Every call waits on the shared [`ReadyGate`], serializes its structured
//! arguments to JSON text, invokes the bridge and checks the reply for the
//! `Exception` sentinel before parsing it. Calls are independent; there is no
//! queue, retry or cancellation on this side of the bridge.

use std::sync::Arc;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

use crate::error::{DispatchError, EngineError};
use crate::mas::Excitation;
use crate::operating_point::power_waveforms_ready;
use crate::traits::{EngineArg, EngineBridge};

/// Opens once, when the engine has booted and loaded its base datasets.
/// Waiting on an open gate returns immediately.
#[derive(Debug, Clone)]
pub struct ReadyGate {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadyGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_open(&self) -> bool {
        *self.tx.borrow()
    }

    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Prefix the engine puts in front of failure messages.
    pub exception_prefix: String,
    /// Whether [`TaskDispatcher::initialize`] loads materials, shapes and
    /// wires before opening the gate.
    pub load_base_datasets: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            exception_prefix: "Exception".to_string(),
            load_base_datasets: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed(String),
}

/// Notified after every dispatched call, once its result is known.
pub trait TaskObserver {
    fn task_finished(&self, task: &str, outcome: &TaskOutcome);
}

/// Converter topologies with wizard entry points in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Topology {
    Buck,
    Boost,
    Flyback,
    IsolatedBuck,
    IsolatedBuckBoost,
    PushPull,
    SingleSwitchForward,
    TwoSwitchForward,
    ActiveClampForward,
    DualActiveBridge,
    LlcResonant,
    CllcResonant,
    PhaseShiftFullBridge,
    CommonModeChoke,
    DifferentialModeChoke,
}

impl Topology {
    fn slug(self) -> &'static str {
        match self {
            Topology::Buck => "buck",
            Topology::Boost => "boost",
            Topology::Flyback => "flyback",
            Topology::IsolatedBuck => "isolated_buck",
            Topology::IsolatedBuckBoost => "isolated_buck_boost",
            Topology::PushPull => "push_pull",
            Topology::SingleSwitchForward => "single_switch_forward",
            Topology::TwoSwitchForward => "two_switch_forward",
            Topology::ActiveClampForward => "active_clamp_forward",
            Topology::DualActiveBridge => "dab",
            Topology::LlcResonant => "llc",
            Topology::CllcResonant => "cllc",
            Topology::PhaseShiftFullBridge => "psfb",
            Topology::CommonModeChoke => "cmc",
            Topology::DifferentialModeChoke => "dmc",
        }
    }

    pub fn has_advanced_inputs(self) -> bool {
        matches!(
            self,
            Topology::Buck
                | Topology::Boost
                | Topology::Flyback
                | Topology::IsolatedBuck
                | Topology::IsolatedBuckBoost
                | Topology::PushPull
                | Topology::SingleSwitchForward
                | Topology::TwoSwitchForward
                | Topology::ActiveClampForward
        )
    }

    /// Engine entry point computing the design inputs of this topology.
    pub fn inputs_method(self, advanced: bool) -> Option<String> {
        if advanced && !self.has_advanced_inputs() {
            return None;
        }
        let prefix = if advanced { "calculate_advanced_" } else { "calculate_" };
        Some(format!("{prefix}{}_inputs", self.slug()))
    }

    /// Engine entry point simulating ideal converter waveforms.
    pub fn ideal_waveforms_method(self) -> Option<&'static str> {
        match self {
            Topology::Buck => Some("simulate_buck_ideal_waveforms"),
            Topology::Boost => Some("simulate_boost_ideal_waveforms"),
            Topology::Flyback => Some("simulate_flyback_ideal_waveforms"),
            Topology::IsolatedBuck => Some("simulate_isolated_buck_ideal_waveforms"),
            Topology::IsolatedBuckBoost => Some("simulate_isolated_buck_boost_ideal_waveforms"),
            Topology::PushPull => Some("simulate_push_pull_ideal_waveforms"),
            Topology::SingleSwitchForward => Some("simulate_forward_ideal_waveforms"),
            Topology::TwoSwitchForward => Some("simulate_two_switch_forward_ideal_waveforms"),
            Topology::ActiveClampForward => Some("simulate_active_clamp_forward_ideal_waveforms"),
            Topology::LlcResonant => Some("simulate_llc_ideal_waveforms"),
            _ => None,
        }
    }
}

fn json_arg<T: Serialize + ?Sized>(method: &str, value: &T) -> Result<EngineArg, DispatchError> {
    serde_json::to_string(value)
        .map(EngineArg::Json)
        .map_err(|source| DispatchError::Serialize {
            method: method.to_string(),
            source,
        })
}

fn text(value: impl Into<String>) -> EngineArg {
    EngineArg::Text(value.into())
}

fn number(value: f64) -> EngineArg {
    EngineArg::Number(value)
}

fn integer(value: i64) -> EngineArg {
    EngineArg::Integer(value)
}

fn flag(value: bool) -> EngineArg {
    EngineArg::Bool(value)
}

pub struct TaskDispatcher<B: EngineBridge> {
    bridge: B,
    gate: ReadyGate,
    config: DispatcherConfig,
    observer: Option<Box<dyn TaskObserver>>,
}

impl<B: EngineBridge> TaskDispatcher<B> {
    pub fn new(bridge: B) -> Self {
        Self::with_config(bridge, DispatcherConfig::default())
    }

    pub fn with_config(bridge: B, config: DispatcherConfig) -> Self {
        Self {
            bridge,
            gate: ReadyGate::new(),
            config,
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn TaskObserver>) {
        self.observer = Some(observer);
    }

    pub fn gate(&self) -> &ReadyGate {
        &self.gate
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_open()
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    fn notify(&self, task: &str, outcome: TaskOutcome) {
        if let Some(observer) = &self.observer {
            observer.task_finished(task, &outcome);
        }
    }

    fn finish<T>(&self, task: &str, result: Result<T, DispatchError>) -> Result<T, DispatchError> {
        match &result {
            Ok(_) => self.notify(task, TaskOutcome::Succeeded),
            Err(err) => self.notify(task, TaskOutcome::Failed(err.to_string())),
        }
        result
    }

    async fn invoke_checked(&self, method: &str, args: &[EngineArg]) -> Result<String, DispatchError> {
        let response = self.bridge.invoke(method, args).await?;
        if response.starts_with(&self.config.exception_prefix) {
            debug!("{method} rejected by engine: {response}");
            return Err(EngineError::new(response).into());
        }
        Ok(response)
    }

    /// Calls `method` once the engine is ready and returns its raw reply.
    pub async fn call_text(&self, method: &str, args: Vec<EngineArg>) -> Result<String, DispatchError> {
        self.gate.wait().await;
        debug!("dispatching {method} ({} args)", args.len());
        let result = self.invoke_checked(method, &args).await;
        self.finish(method, result)
    }

    /// Calls `method` once the engine is ready and parses its JSON reply.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        method: &str,
        args: Vec<EngineArg>,
    ) -> Result<T, DispatchError> {
        self.gate.wait().await;
        debug!("dispatching {method} ({} args)", args.len());
        let result = match self.invoke_checked(method, &args).await {
            Ok(text) => serde_json::from_str(&text).map_err(|source| DispatchError::Parse {
                method: method.to_string(),
                source,
            }),
            Err(err) => Err(err),
        };
        self.finish(method, result)
    }

    async fn call_unit(&self, method: &str, args: Vec<EngineArg>) -> Result<(), DispatchError> {
        self.call_text(method, args).await.map(|_| ())
    }

    /// Power calls run continuously while the user edits; incomplete data and
    /// engine failures both come back as `None`.
    async fn call_power(&self, method: &str, excitation: &Excitation) -> Option<Value> {
        if !power_waveforms_ready(excitation) {
            debug!("{method} skipped: waveforms incomplete");
            return None;
        }
        let args = match json_arg(method, excitation) {
            Ok(arg) => vec![arg],
            Err(err) => {
                warn!("{err}");
                return None;
            }
        };
        match self.call_json::<Value>(method, args).await {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("{method} failed: {err}");
                None
            }
        }
    }

    // Boot and datasets

    /// Loads the base datasets and opens the gate. On failure the gate stays
    /// closed so the caller can retry.
    pub async fn initialize(&self) -> Result<(), DispatchError> {
        if self.config.load_base_datasets {
            info!("loading core materials, core shapes and wires");
            let empty = [text("")];
            let (materials, shapes, wires) = tokio::join!(
                self.invoke_checked("load_core_materials", &empty),
                self.invoke_checked("load_core_shapes", &empty),
                self.invoke_checked("load_wires", &empty),
            );
            materials?;
            shapes?;
            wires?;
        }
        self.gate.open();
        info!("engine ready");
        Ok(())
    }

    pub async fn load_core_materials(&self, data: &str) -> Result<(), DispatchError> {
        self.call_unit("load_core_materials", vec![text(data)]).await
    }

    pub async fn load_core_shapes(&self, data: &str) -> Result<(), DispatchError> {
        self.call_unit("load_core_shapes", vec![text(data)]).await
    }

    pub async fn load_wires(&self, data: &str) -> Result<(), DispatchError> {
        self.call_unit("load_wires", vec![text(data)]).await
    }

    pub async fn load_cores(
        &self,
        data: &str,
        allow_toroidal: bool,
        use_only_in_stock: bool,
    ) -> Result<(), DispatchError> {
        self.call_unit(
            "load_cores",
            vec![text(data), flag(allow_toroidal), flag(use_only_in_stock)],
        )
        .await
    }

    // Core and material data

    pub async fn calculate_core_data(
        &self,
        core: &impl Serialize,
        resolve_unspecified_dimensions: bool,
    ) -> Result<Value, DispatchError> {
        let method = "calculate_core_data";
        let args = vec![json_arg(method, core)?, flag(resolve_unspecified_dimensions)];
        self.call_json(method, args).await
    }

    pub async fn get_material_data(&self, material_name: &str) -> Result<Value, DispatchError> {
        self.call_json("get_material_data", vec![text(material_name)])
            .await
    }

    pub async fn get_core_temperature_dependant_parameters(
        &self,
        core: &impl Serialize,
        temperature: f64,
    ) -> Result<Value, DispatchError> {
        let method = "get_core_temperature_dependant_parameters";
        let args = vec![json_arg(method, core)?, number(temperature)];
        self.call_json(method, args).await
    }

    pub async fn mas_autocomplete(
        &self,
        mas: &impl Serialize,
        flag_value: bool,
        settings: &impl Serialize,
    ) -> Result<Value, DispatchError> {
        let method = "mas_autocomplete";
        let args = vec![
            json_arg(method, mas)?,
            flag(flag_value),
            json_arg(method, settings)?,
        ];
        self.call_json(method, args).await
    }

    // Engine settings

    pub async fn get_settings(&self) -> Result<Value, DispatchError> {
        self.call_json("get_settings", Vec::new()).await
    }

    pub async fn set_settings(&self, settings: &impl Serialize) -> Result<(), DispatchError> {
        let method = "set_settings";
        let args = vec![json_arg(method, settings)?];
        self.call_unit(method, args).await
    }

    // Adviser

    pub async fn calculate_advised_cores(
        &self,
        inputs: &impl Serialize,
        weights: &impl Serialize,
        count: u32,
        mode: &str,
    ) -> Result<Value, DispatchError> {
        let method = "calculate_advised_cores";
        let args = vec![
            json_arg(method, inputs)?,
            json_arg(method, weights)?,
            integer(i64::from(count)),
            text(mode),
        ];
        self.call_json(method, args).await
    }

    pub async fn calculate_advised_magnetics(
        &self,
        inputs: &impl Serialize,
        weights: &impl Serialize,
        count: u32,
        mode: &str,
    ) -> Result<Value, DispatchError> {
        let method = "calculate_advised_magnetics";
        let args = vec![
            json_arg(method, inputs)?,
            json_arg(method, weights)?,
            integer(i64::from(count)),
            text(mode),
        ];
        self.call_json(method, args).await
    }

    // Waveform processing

    pub async fn calculate_harmonics(
        &self,
        waveform: &impl Serialize,
        frequency: f64,
    ) -> Result<Value, DispatchError> {
        let method = "calculate_harmonics";
        let args = vec![json_arg(method, waveform)?, number(frequency)];
        self.call_json(method, args).await
    }

    pub async fn calculate_processed(
        &self,
        harmonics: &impl Serialize,
        waveform: &impl Serialize,
    ) -> Result<Value, DispatchError> {
        let method = "calculate_processed";
        let args = vec![json_arg(method, harmonics)?, json_arg(method, waveform)?];
        self.call_json(method, args).await
    }

    pub async fn calculate_basic_processed_data(
        &self,
        waveform: &impl Serialize,
    ) -> Result<Value, DispatchError> {
        let method = "calculate_basic_processed_data";
        let args = vec![json_arg(method, waveform)?];
        self.call_json(method, args).await
    }

    pub async fn create_waveform(
        &self,
        processed: &impl Serialize,
        frequency: f64,
    ) -> Result<Value, DispatchError> {
        let method = "create_waveform";
        let args = vec![json_arg(method, processed)?, number(frequency)];
        self.call_json(method, args).await
    }

    pub async fn scale_waveform_time_to_frequency(
        &self,
        waveform: &impl Serialize,
        frequency: f64,
    ) -> Result<Value, DispatchError> {
        let method = "scale_waveform_time_to_frequency";
        let args = vec![json_arg(method, waveform)?, number(frequency)];
        self.call_json(method, args).await
    }

    pub async fn scale_excitation_time_to_frequency(
        &self,
        excitation: &impl Serialize,
        frequency: f64,
    ) -> Result<Value, DispatchError> {
        let method = "scale_excitation_time_to_frequency";
        let args = vec![json_arg(method, excitation)?, number(frequency)];
        self.call_json(method, args).await
    }

    pub async fn standardize_signal_descriptor(
        &self,
        signal_descriptor: &impl Serialize,
        frequency: f64,
    ) -> Result<Value, DispatchError> {
        let method = "standardize_signal_descriptor";
        let args = vec![json_arg(method, signal_descriptor)?, number(frequency)];
        self.call_json(method, args).await
    }

    pub async fn get_main_harmonic_indexes(
        &self,
        harmonics: &impl Serialize,
        threshold: f64,
        max_harmonics: u32,
    ) -> Result<Vec<usize>, DispatchError> {
        let method = "get_main_harmonic_indexes";
        let args = vec![
            json_arg(method, harmonics)?,
            number(threshold),
            integer(i64::from(max_harmonics)),
        ];
        self.call_json(method, args).await
    }

    // Power

    pub async fn calculate_rms_power(&self, excitation: &Excitation) -> Option<Value> {
        self.call_power("calculate_rms_power", excitation).await
    }

    pub async fn calculate_instantaneous_power(&self, excitation: &Excitation) -> Option<Value> {
        self.call_power("calculate_instantaneous_power", excitation)
            .await
    }

    // Dimensions

    /// The engine answers with a bare number, passed through as text.
    pub async fn resolve_dimension_with_tolerance(
        &self,
        dimension: &impl Serialize,
    ) -> Result<String, DispatchError> {
        let method = "resolve_dimension_with_tolerance";
        let args = vec![json_arg(method, dimension)?];
        self.call_text(method, args).await
    }

    pub async fn get_maximum_dimensions(
        &self,
        magnetic: &impl Serialize,
    ) -> Result<Value, DispatchError> {
        let method = "get_maximum_dimensions";
        let args = vec![json_arg(method, magnetic)?];
        self.call_json(method, args).await
    }

    // Excitations

    pub async fn calculate_reflected_primary(
        &self,
        excitation: &impl Serialize,
        turns_ratio: f64,
    ) -> Result<Value, DispatchError> {
        let method = "calculate_reflected_primary";
        let args = vec![json_arg(method, excitation)?, number(turns_ratio)];
        self.call_json(method, args).await
    }

    pub async fn calculate_reflected_secondary(
        &self,
        excitation: &impl Serialize,
        turns_ratio: f64,
    ) -> Result<Value, DispatchError> {
        let method = "calculate_reflected_secondary";
        let args = vec![json_arg(method, excitation)?, number(turns_ratio)];
        self.call_json(method, args).await
    }

    pub async fn calculate_induced_voltage(
        &self,
        excitation: &impl Serialize,
        magnetizing_inductance: f64,
    ) -> Result<Value, DispatchError> {
        let method = "calculate_induced_voltage";
        let args = vec![json_arg(method, excitation)?, number(magnetizing_inductance)];
        self.call_json(method, args).await
    }

    pub async fn calculate_induced_current(
        &self,
        excitation: &impl Serialize,
        magnetizing_inductance: f64,
    ) -> Result<Value, DispatchError> {
        let method = "calculate_induced_current";
        let args = vec![json_arg(method, excitation)?, number(magnetizing_inductance)];
        self.call_json(method, args).await
    }

    // Leakage inductance and current density

    pub async fn calculate_leakage_inductance(
        &self,
        magnetic: &impl Serialize,
        frequency: f64,
        operating_point_index: usize,
    ) -> Result<Value, DispatchError> {
        let method = "calculate_leakage_inductance";
        let args = vec![
            json_arg(method, magnetic)?,
            number(frequency),
            integer(operating_point_index as i64),
        ];
        self.call_json(method, args).await
    }

    pub async fn calculate_effective_current_density(
        &self,
        wire: &impl Serialize,
        current: &impl Serialize,
        temperature: f64,
    ) -> Result<String, DispatchError> {
        let method = "calculate_effective_current_density";
        let args = vec![
            json_arg(method, wire)?,
            json_arg(method, current)?,
            number(temperature),
        ];
        self.call_text(method, args).await
    }

    // Exporters

    pub async fn export_magnetic_as_subcircuit(
        &self,
        magnetic: &impl Serialize,
        temperature: f64,
        format: &str,
        extra: &str,
    ) -> Result<String, DispatchError> {
        let method = "export_magnetic_as_subcircuit";
        let args = vec![
            json_arg(method, magnetic)?,
            number(temperature),
            text(format),
            text(extra),
        ];
        self.call_text(method, args).await
    }

    pub async fn export_magnetic_as_symbol(
        &self,
        magnetic: &impl Serialize,
        format: &str,
        extra: &str,
    ) -> Result<String, DispatchError> {
        let method = "export_magnetic_as_symbol";
        let args = vec![json_arg(method, magnetic)?, text(format), text(extra)];
        self.call_text(method, args).await
    }

    // Circuit-simulator import

    pub async fn extract_operating_point(
        &self,
        file: &str,
        number_windings: usize,
        frequency: f64,
        magnetizing_inductance: f64,
        map_column_names: &impl Serialize,
    ) -> Result<Value, DispatchError> {
        let method = "extract_operating_point";
        let args = vec![
            text(file),
            integer(number_windings as i64),
            number(frequency),
            number(magnetizing_inductance),
            json_arg(method, map_column_names)?,
        ];
        self.call_json(method, args).await
    }

    pub async fn extract_map_column_names(
        &self,
        file: &str,
        number_windings: usize,
        frequency: f64,
    ) -> Result<Value, DispatchError> {
        let args = vec![text(file), integer(number_windings as i64), number(frequency)];
        self.call_json("extract_map_column_names", args).await
    }

    pub async fn extract_column_names(&self, file: &str) -> Result<Vec<String>, DispatchError> {
        self.call_json("extract_column_names", vec![text(file)])
            .await
    }

    // Converter wizards

    pub async fn calculate_wizard_inputs(
        &self,
        topology: Topology,
        advanced: bool,
        params: &impl Serialize,
    ) -> Result<Value, DispatchError> {
        let method = topology.inputs_method(advanced).ok_or_else(|| {
            DispatchError::Unsupported(format!("advanced inputs for {topology:?}"))
        })?;
        let args = vec![json_arg(&method, params)?];
        self.call_json(&method, args).await
    }

    pub async fn simulate_ideal_waveforms(
        &self,
        topology: Topology,
        params: &impl Serialize,
    ) -> Result<Value, DispatchError> {
        let method = topology.ideal_waveforms_method().ok_or_else(|| {
            DispatchError::Unsupported(format!("ideal waveforms for {topology:?}"))
        })?;
        let args = vec![json_arg(method, params)?];
        self.call_json(method, args).await
    }

    pub async fn simulate_flyback_with_magnetic(
        &self,
        flyback_params: &impl Serialize,
        magnetic: &impl Serialize,
    ) -> Result<Value, DispatchError> {
        let method = "simulate_flyback_with_magnetic";
        let args = vec![json_arg(method, flyback_params)?, json_arg(method, magnetic)?];
        self.call_json(method, args).await
    }

    pub async fn simulate_cmc_waveforms(
        &self,
        params: &impl Serialize,
        inductance: f64,
    ) -> Result<Value, DispatchError> {
        let method = "simulate_cmc_waveforms";
        let args = vec![json_arg(method, params)?, number(inductance)];
        self.call_json(method, args).await
    }

    pub async fn simulate_dmc_waveforms(
        &self,
        params: &impl Serialize,
        inductance: f64,
    ) -> Result<Value, DispatchError> {
        let method = "simulate_dmc_waveforms";
        let args = vec![json_arg(method, params)?, number(inductance)];
        self.call_json(method, args).await
    }

    pub async fn verify_dmc_attenuation(
        &self,
        params: &impl Serialize,
        inductance: f64,
        capacitance: f64,
    ) -> Result<Value, DispatchError> {
        let method = "verify_dmc_attenuation";
        let args = vec![
            json_arg(method, params)?,
            number(inductance),
            number(capacitance),
        ];
        self.call_json(method, args).await
    }

    pub async fn propose_dmc_design(&self, params: &impl Serialize) -> Result<Value, DispatchError> {
        let method = "propose_dmc_design";
        let args = vec![json_arg(method, params)?];
        self.call_json(method, args).await
    }
}
