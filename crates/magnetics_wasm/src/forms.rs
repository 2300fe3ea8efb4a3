//! Requirement form helpers: tolerance fields and unit prefixes.

use magnetics_core::tolerance::{self, DimensionWithTolerance, ToleranceField};
use magnetics_core::units;
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{from_js, from_js_or_default, to_js};

#[derive(Serialize)]
struct FieldAdded {
    dimension: DimensionWithTolerance,
    value: f64,
}

/// Adds `field` (`"minimum"`, `"nominal"` or `"maximum"`) to a requirement,
/// returning `{dimension, value}`.
#[wasm_bindgen]
pub fn add_tolerance_field(
    dimension: JsValue,
    field: JsValue,
    defaults: JsValue,
) -> Result<JsValue, JsValue> {
    let mut dimension: DimensionWithTolerance = from_js_or_default(dimension, "dimension")?;
    let field: ToleranceField = from_js(field, "tolerance field")?;
    let defaults: DimensionWithTolerance = from_js_or_default(defaults, "default dimension")?;
    let value = dimension.add_field(field, &defaults);
    to_js(&FieldAdded { dimension, value })
}

/// Newline-terminated messages, empty when the requirement is valid.
#[wasm_bindgen]
pub fn tolerance_errors(dimension: JsValue) -> Result<String, JsValue> {
    let dimension: DimensionWithTolerance = from_js_or_default(dimension, "dimension")?;
    Ok(dimension.error_text())
}

#[wasm_bindgen]
pub fn dimension_errors(value: f64) -> String {
    tolerance::join_messages(&tolerance::dimension_errors(value))
}

#[wasm_bindgen]
pub fn unit_options(unit: &str, min: Option<f64>, max: Option<f64>) -> Vec<String> {
    units::unit_options(unit, min, max)
}

#[wasm_bindgen]
pub fn scale_to_unit(
    value: f64,
    unit: &str,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<JsValue, JsValue> {
    to_js(&units::scale_to_unit(value, unit, min, max))
}

#[wasm_bindgen]
pub fn to_base_unit(value: f64, unit_label: &str, unit: &str) -> Option<f64> {
    units::to_base_unit(value, unit_label, unit)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn empty_requirement_reports_missing_value() {
        let text = tolerance_errors(JsValue::UNDEFINED).expect("errors");
        assert_eq!(
            text,
            "At least one value must be set. Set one or remove the requirement from the menu.\n"
        );
    }

    #[wasm_bindgen_test]
    fn unit_options_for_bounded_range() {
        assert_eq!(unit_options("Alf", Some(1.0), Some(12000.0)), vec!["Alf", "kAlf"]);
    }
}
