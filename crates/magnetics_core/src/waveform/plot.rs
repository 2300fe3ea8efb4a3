//! Plot-ready data for paired waveforms: outlier clipping, axis limits and titles.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::pairing::{paired_waveforms, voltage_base_name};
use super::OperatingPointWaveforms;

const LOW_PERCENTILE: f64 = 0.05;
const HIGH_PERCENTILE: f64 = 0.95;
const MARGIN_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClippedValues {
    pub values: Vec<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Band computed over the finite samples only.
fn percentile_band(values: &[f64]) -> Option<(f64, f64)> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let len = sorted.len() as f64;
    let p5 = sorted[(len * LOW_PERCENTILE).floor() as usize];
    let p95 = sorted[(len * HIGH_PERCENTILE).floor() as usize];
    let margin = (p95 - p5) * MARGIN_FRACTION;
    Some((p5 - margin, p95 + margin))
}

/// Clamps `values` into the 5th–95th percentile band widened by 10 % of its
/// range. NaN samples stay NaN so they plot as gaps. The input is left
/// untouched; input without any real sample comes back as is, with no limits.
pub fn clip_outliers(values: &[f64]) -> ClippedValues {
    match percentile_band(values) {
        Some((low, high)) => ClippedValues {
            values: values
                .iter()
                .map(|&v| if v.is_nan() { v } else { v.clamp(low, high) })
                .collect(),
            min: Some(low),
            max: Some(high),
        },
        None => ClippedValues {
            values: values.to_vec(),
            min: None,
            max: None,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisSide {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesData {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotSeries {
    pub label: String,
    pub data: SeriesData,
    pub color_label: String,
    #[serde(rename = "type")]
    pub axis_type: String,
    pub position: AxisSide,
    pub unit: String,
    pub number_decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlotOptions {
    pub clip_voltage: bool,
    pub voltage_color: String,
    pub current_color: String,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            clip_voltage: true,
            voltage_color: "#b18aea".to_string(),
            current_color: "#4CAF50".to_string(),
        }
    }
}

/// Series for the dual-axis plot of one pair: voltage on the left (clipped
/// when requested), current on the right.
pub fn paired_plot_series(
    waveforms: &[OperatingPointWaveforms],
    operating_point_index: usize,
    pair_index: usize,
    options: &PlotOptions,
) -> Vec<PlotSeries> {
    let pairs = paired_waveforms(waveforms, operating_point_index);
    let Some(pair) = pairs.get(pair_index) else {
        return Vec::new();
    };

    let mut result = Vec::new();
    if let Some(voltage) = pair.voltage {
        let wf = voltage.series;
        let y = if options.clip_voltage && !wf.y.is_empty() {
            clip_outliers(&wf.y).values
        } else {
            wf.y.clone()
        };
        result.push(PlotSeries {
            label: wf.label.clone(),
            data: SeriesData { x: wf.x.clone(), y },
            color_label: options.voltage_color.clone(),
            axis_type: "value".to_string(),
            position: AxisSide::Left,
            unit: "V".to_string(),
            number_decimals: 6,
        });
    }
    if let Some(current) = pair.current {
        let wf = current.series;
        result.push(PlotSeries {
            label: wf.label.clone(),
            data: SeriesData {
                x: wf.x.clone(),
                y: wf.y.clone(),
            },
            color_label: options.current_color.clone(),
            axis_type: "value".to_string(),
            position: AxisSide::Right,
            unit: "A".to_string(),
            number_decimals: 6,
        });
    }
    result
}

/// Axis limits per filled slot of a pair, voltage first. `None` marks a slot
/// whose series has no samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    pub min: Vec<Option<f64>>,
    pub max: Vec<Option<f64>>,
}

pub fn paired_axis_limits(
    waveforms: &[OperatingPointWaveforms],
    operating_point_index: usize,
    pair_index: usize,
) -> AxisLimits {
    let pairs = paired_waveforms(waveforms, operating_point_index);
    let Some(pair) = pairs.get(pair_index) else {
        return AxisLimits::default();
    };

    let mut limits = AxisLimits::default();
    for slot in [pair.voltage, pair.current].into_iter().flatten() {
        let band = percentile_band(&slot.series.y);
        limits.min.push(band.map(|(low, _)| low));
        limits.max.push(band.map(|(_, high)| high));
    }
    limits
}

fn switch_node_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s*\(Switch [Nn]ode\)").expect("static regex"))
}

pub fn paired_title(
    waveforms: &[OperatingPointWaveforms],
    operating_point_index: usize,
    pair_index: usize,
) -> String {
    let pairs = paired_waveforms(waveforms, operating_point_index);
    let Some(pair) = pairs.get(pair_index) else {
        return String::new();
    };

    match (pair.voltage, pair.current) {
        (Some(voltage), Some(_)) => {
            let label = switch_node_marker().replace_all(&voltage.series.label, "");
            let base = voltage_base_name(&label);
            if base.is_empty() {
                "V & I".to_string()
            } else {
                base
            }
        }
        (Some(voltage), None) => switch_node_marker()
            .replace_all(&voltage.series.label, "")
            .into_owned(),
        (None, Some(current)) => current.series.label.clone(),
        (None, None) => String::new(),
    }
}
