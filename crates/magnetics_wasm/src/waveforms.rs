//! Waveform composition exports. Malformed input degrades to empty output,
//! the same as in the core.

use log::debug;
use magnetics_core::mas::OperatingPoint;
use magnetics_core::waveform::{
    self, ConverterOutput, OperatingPointWaveforms, PlotOptions, SimulationData,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{from_js_or_default, to_js};

fn lenient<T: DeserializeOwned + Default>(value: JsValue, what: &str) -> T {
    from_js_or_default(value, what).unwrap_or_else(|err| {
        debug!("ignoring malformed {what}: {:?}", err.as_string());
        T::default()
    })
}

#[derive(Serialize)]
struct RepeatedSamples {
    time: Vec<f64>,
    data: Vec<f64>,
}

#[wasm_bindgen]
pub fn repeat_for_periods(
    time: Vec<f64>,
    data: Vec<f64>,
    periods: usize,
) -> Result<JsValue, JsValue> {
    let (time, data) = waveform::repeat_for_periods(&time, &data, periods);
    to_js(&RepeatedSamples { time, data })
}

#[wasm_bindgen]
pub fn build_magnetic_waveforms(
    operating_points: JsValue,
    number_of_periods: usize,
) -> Result<JsValue, JsValue> {
    let operating_points: Vec<OperatingPoint> = lenient(operating_points, "operating points");
    to_js(&waveform::build_magnetic_waveforms(&operating_points, number_of_periods))
}

#[wasm_bindgen]
pub fn build_converter_waveforms(
    sim_data: JsValue,
    switch_nodes: Vec<String>,
    outputs: JsValue,
    number_of_periods: usize,
    switching_frequency: f64,
) -> Result<JsValue, JsValue> {
    let sim: SimulationData = lenient(sim_data, "simulation data");
    let outputs: Vec<ConverterOutput> = lenient(outputs, "converter outputs");
    to_js(&waveform::build_converter_waveforms(
        &sim,
        &switch_nodes,
        &outputs,
        number_of_periods,
        switching_frequency,
    ))
}

#[wasm_bindgen]
pub fn paired_waveforms(
    waveforms: JsValue,
    operating_point_index: usize,
) -> Result<JsValue, JsValue> {
    let waveforms: Vec<OperatingPointWaveforms> = lenient(waveforms, "waveforms");
    to_js(&waveform::paired_waveforms(&waveforms, operating_point_index))
}

#[wasm_bindgen]
pub fn paired_plot_series(
    waveforms: JsValue,
    operating_point_index: usize,
    pair_index: usize,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    let waveforms: Vec<OperatingPointWaveforms> = lenient(waveforms, "waveforms");
    let options: PlotOptions = lenient(options, "plot options");
    to_js(&waveform::paired_plot_series(
        &waveforms,
        operating_point_index,
        pair_index,
        &options,
    ))
}

#[wasm_bindgen]
pub fn paired_axis_limits(
    waveforms: JsValue,
    operating_point_index: usize,
    pair_index: usize,
) -> Result<JsValue, JsValue> {
    let waveforms: Vec<OperatingPointWaveforms> = lenient(waveforms, "waveforms");
    to_js(&waveform::paired_axis_limits(
        &waveforms,
        operating_point_index,
        pair_index,
    ))
}

#[wasm_bindgen]
pub fn paired_title(waveforms: JsValue, operating_point_index: usize, pair_index: usize) -> String {
    let waveforms: Vec<OperatingPointWaveforms> = lenient(waveforms, "waveforms");
    waveform::paired_title(&waveforms, operating_point_index, pair_index)
}

#[wasm_bindgen]
pub fn clip_outliers(values: Vec<f64>) -> Result<JsValue, JsValue> {
    to_js(&waveform::clip_outliers(&values))
}
