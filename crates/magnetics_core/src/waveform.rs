//! Waveform composition for the operating point and converter plots.
//!
//! Series are built from engine inputs or circuit-simulator tables, repeated
//! over several periods for display, then paired voltage/current for the
//! dual-axis plots (see [`pairing`] and [`plot`]). Nothing here fails: absent
//! or malformed input degrades to empty output.

pub mod pairing;
pub mod plot;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::mas::{OperatingPoint, SignalDescriptor, DEFAULT_FREQUENCY};

pub use pairing::{pair_series, paired_waveforms, PairedWaveform, SeriesRef};
pub use plot::{
    clip_outliers, paired_axis_limits, paired_plot_series, paired_title, AxisLimits, AxisSide,
    ClippedValues, PlotOptions, PlotSeries,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Voltage,
    Current,
}

impl SeriesKind {
    pub fn unit(self) -> &'static str {
        match self {
            SeriesKind::Voltage => "V",
            SeriesKind::Current => "A",
        }
    }
}

/// One plotted signal. `x` is time, `y` the sampled values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformSeries {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    #[serde(rename = "type")]
    pub kind: SeriesKind,
    pub unit: String,
}

impl WaveformSeries {
    pub fn new(label: impl Into<String>, x: Vec<f64>, y: Vec<f64>, kind: SeriesKind) -> Self {
        Self {
            label: label.into(),
            x,
            y,
            kind,
            unit: kind.unit().to_string(),
        }
    }

    pub fn is_voltage(&self) -> bool {
        self.unit == "V"
    }

    pub fn is_current(&self) -> bool {
        self.unit == "A"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingPointWaveforms {
    pub frequency: f64,
    pub operating_point_name: String,
    pub waveforms: Vec<WaveformSeries>,
}

/// Repeats one period of samples `periods` times.
///
/// The k-th copy is shifted by `k * (last - first)`. Both sequences are cut
/// to the shorter of the two, so the outputs always have equal length. With
/// `periods <= 1` or empty input the (cut) samples come back unchanged.
pub fn repeat_for_periods(time: &[f64], data: &[f64], periods: usize) -> (Vec<f64>, Vec<f64>) {
    let len = time.len().min(data.len());
    let (time, data) = (&time[..len], &data[..len]);
    if len == 0 || periods <= 1 {
        return (time.to_vec(), data.to_vec());
    }

    let period = time[len - 1] - time[0];
    let mut repeated_time = Vec::with_capacity(len * periods);
    let mut repeated_data = Vec::with_capacity(len * periods);
    for p in 0..periods {
        let offset = p as f64 * period;
        repeated_time.extend(time.iter().map(|t| t + offset));
        repeated_data.extend_from_slice(data);
    }
    (repeated_time, repeated_data)
}

fn winding_label(index: usize) -> String {
    if index == 0 {
        "Primary".to_string()
    } else {
        format!("Secondary {index}")
    }
}

fn signal_series(
    signal: Option<&SignalDescriptor>,
    label: String,
    kind: SeriesKind,
    periods: usize,
) -> Option<WaveformSeries> {
    let waveform = signal?.waveform.as_ref()?;
    let time = waveform.time.as_ref()?;
    let (x, y) = repeat_for_periods(time, &waveform.data, periods);
    Some(WaveformSeries::new(label, x, y, kind))
}

/// Builds the per-winding series of each operating point, voltage before
/// current, skipping signals without both time and data.
pub fn build_magnetic_waveforms(
    operating_points: &[OperatingPoint],
    number_of_periods: usize,
) -> Vec<OperatingPointWaveforms> {
    operating_points
        .iter()
        .enumerate()
        .map(|(op_index, op)| {
            let frequency = op
                .excitations_per_winding
                .first()
                .and_then(|e| e.frequency)
                .filter(|f| *f != 0.0)
                .unwrap_or(DEFAULT_FREQUENCY);
            let operating_point_name = op
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("Operating Point {}", op_index + 1));

            let mut waveforms = Vec::new();
            for (winding_index, excitation) in op.excitations_per_winding.iter().enumerate() {
                let winding = winding_label(winding_index);
                waveforms.extend(signal_series(
                    excitation.voltage.as_ref(),
                    format!("{winding} Voltage"),
                    SeriesKind::Voltage,
                    number_of_periods,
                ));
                waveforms.extend(signal_series(
                    excitation.current.as_ref(),
                    format!("{winding} Current"),
                    SeriesKind::Current,
                    number_of_periods,
                ));
            }

            OperatingPointWaveforms {
                frequency,
                operating_point_name,
                waveforms,
            }
        })
        .collect()
}

/// Columns of a circuit-simulator run keyed by vector name (`time`,
/// `v(node)`, `i(node)`, ...).
pub type SimulationData = HashMap<String, Vec<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterOutput {
    pub node: String,
}

fn node_column<'a>(sim: &'a SimulationData, prefix: char, node: &str) -> Option<&'a Vec<f64>> {
    let lower = prefix.to_ascii_lowercase();
    let upper = prefix.to_ascii_uppercase();
    sim.get(&format!("{lower}({node})"))
        .or_else(|| sim.get(&format!("{upper}({node})")))
}

/// Builds the single "Converter Simulation" entry from a simulator table:
/// switch node voltages first, then each output's voltage and current.
pub fn build_converter_waveforms(
    sim: &SimulationData,
    switch_nodes: &[String],
    outputs: &[ConverterOutput],
    number_of_periods: usize,
    switching_frequency: f64,
) -> Vec<OperatingPointWaveforms> {
    let Some(time) = sim.get("time") else {
        return Vec::new();
    };

    let mut waveforms = Vec::new();
    let mut push = |label: String, values: &[f64], kind: SeriesKind| {
        let (x, y) = repeat_for_periods(time, values, number_of_periods);
        waveforms.push(WaveformSeries::new(label, x, y, kind));
    };

    for (idx, node) in switch_nodes.iter().enumerate() {
        if let Some(values) = node_column(sim, 'v', node) {
            push(format!("Switch Node {}", idx + 1), values, SeriesKind::Voltage);
        }
    }
    for (idx, output) in outputs.iter().enumerate() {
        if let Some(values) = node_column(sim, 'v', &output.node) {
            push(
                format!("Output {} Voltage", idx + 1),
                values,
                SeriesKind::Voltage,
            );
        }
        if let Some(values) = node_column(sim, 'i', &output.node) {
            push(
                format!("Output {} Current", idx + 1),
                values,
                SeriesKind::Current,
            );
        }
    }

    vec![OperatingPointWaveforms {
        frequency: switching_frequency,
        operating_point_name: "Converter Simulation".to_string(),
        waveforms,
    }]
}

/// Waveforms currently shown by a converter wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveformSet {
    pub magnetic: Vec<OperatingPointWaveforms>,
    pub converter: Vec<OperatingPointWaveforms>,
    pub error: String,
    pub simulating: bool,
    /// Bumped on every [`WaveformSet::update`] so views can detect a refresh.
    pub revision: u64,
}

impl WaveformSet {
    pub fn clear(&mut self) {
        self.magnetic.clear();
        self.converter.clear();
        self.error.clear();
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = error.into();
    }

    pub fn set_simulating(&mut self, simulating: bool) {
        self.simulating = simulating;
    }

    pub fn add_magnetic(&mut self, waveforms: OperatingPointWaveforms) {
        self.magnetic.push(waveforms);
    }

    pub fn add_converter(&mut self, waveforms: OperatingPointWaveforms) {
        self.converter.push(waveforms);
    }

    pub fn update(
        &mut self,
        magnetic: Option<Vec<OperatingPointWaveforms>>,
        converter: Option<Vec<OperatingPointWaveforms>>,
    ) {
        self.magnetic = magnetic.unwrap_or_default();
        self.converter = converter.unwrap_or_default();
        self.revision += 1;
    }

    pub fn has_waveforms(&self) -> bool {
        !self.magnetic.is_empty() || !self.converter.is_empty()
    }

    pub fn total_points(&self) -> usize {
        self.magnetic
            .iter()
            .chain(self.converter.iter())
            .flat_map(|op| op.waveforms.iter())
            .map(|wf| wf.x.len())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mas::{Excitation, Waveform};

    fn signal(time: Vec<f64>, data: Vec<f64>) -> Option<SignalDescriptor> {
        Some(SignalDescriptor {
            waveform: Some(Waveform::new(time, data)),
            ..SignalDescriptor::default()
        })
    }

    #[test]
    fn repeat_is_identity_for_single_period_or_empty_input() {
        let time = vec![0.0, 1.0, 2.0];
        let data = vec![5.0, -5.0, 5.0];
        assert_eq!(repeat_for_periods(&time, &data, 1), (time.clone(), data.clone()));
        assert_eq!(repeat_for_periods(&time, &data, 0), (time.clone(), data.clone()));
        assert_eq!(repeat_for_periods(&[], &[], 4), (Vec::new(), Vec::new()));
    }

    #[test]
    fn repeat_shifts_each_copy_by_the_period() {
        let time = vec![1.0, 1.5, 3.0];
        let data = vec![0.0, 2.0, 0.0];
        let (x, y) = repeat_for_periods(&time, &data, 3);
        assert_eq!(x.len(), 9);
        for k in 0..3 {
            for i in 0..3 {
                assert_eq!(x[k * 3 + i], time[i] + 2.0 * k as f64);
                assert_eq!(y[k * 3 + i], data[i]);
            }
        }
    }

    #[test]
    fn magnetic_waveforms_label_windings_and_skip_incomplete_signals() {
        let mut op = OperatingPoint::new("", 25.0);
        op.excitations_per_winding.push(Excitation {
            frequency: Some(200_000.0),
            voltage: signal(vec![0.0, 1.0], vec![1.0, -1.0]),
            current: signal(vec![0.0, 1.0], vec![0.0, 2.0]),
            ..Excitation::default()
        });
        op.excitations_per_winding.push(Excitation {
            voltage: None,
            current: Some(SignalDescriptor {
                waveform: Some(Waveform {
                    time: None,
                    ..Waveform::default()
                }),
                ..SignalDescriptor::default()
            }),
            ..Excitation::default()
        });
        op.excitations_per_winding.push(Excitation {
            current: signal(vec![0.0, 1.0], vec![3.0, 3.0]),
            ..Excitation::default()
        });

        let built = build_magnetic_waveforms(&[op], 2);
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].frequency, 200_000.0);
        assert_eq!(built[0].operating_point_name, "Operating Point 1");
        let labels: Vec<&str> = built[0].waveforms.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Primary Voltage", "Primary Current", "Secondary 2 Current"]
        );
        assert_eq!(built[0].waveforms[0].x, vec![0.0, 1.0, 1.0, 2.0]);
        assert_eq!(built[0].waveforms[0].unit, "V");
        assert_eq!(built[0].waveforms[1].unit, "A");
    }

    #[test]
    fn converter_waveforms_accept_either_column_case() {
        let mut sim = SimulationData::new();
        sim.insert("time".into(), vec![0.0, 1.0]);
        sim.insert("V(sw)".into(), vec![0.0, 12.0]);
        sim.insert("v(out)".into(), vec![5.0, 5.0]);
        sim.insert("I(out)".into(), vec![1.0, 1.2]);

        let built = build_converter_waveforms(
            &sim,
            &["sw".to_string(), "missing".to_string()],
            &[ConverterOutput {
                node: "out".to_string(),
            }],
            1,
            250_000.0,
        );
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].operating_point_name, "Converter Simulation");
        assert_eq!(built[0].frequency, 250_000.0);
        let labels: Vec<&str> = built[0].waveforms.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Switch Node 1", "Output 1 Voltage", "Output 1 Current"]
        );
    }

    #[test]
    fn repeat_cuts_mismatched_samples_to_the_shorter_length() {
        let (x, y) = repeat_for_periods(&[0.0, 1.0, 2.0], &[5.0, 6.0], 3);
        assert_eq!(x, vec![0.0, 1.0, 1.0, 2.0, 2.0, 3.0]);
        assert_eq!(y, vec![5.0, 6.0, 5.0, 6.0, 5.0, 6.0]);

        let (x, y) = repeat_for_periods(&[0.0, 1.0], &[5.0, 6.0, 7.0], 1);
        assert_eq!((x.len(), y.len()), (2, 2));
        assert_eq!(repeat_for_periods(&[0.0, 1.0], &[], 4), (Vec::new(), Vec::new()));
    }

    #[test]
    fn converter_columns_shorter_than_time_keep_series_aligned() {
        let mut sim = SimulationData::new();
        sim.insert("time".into(), vec![0.0, 1.0, 2.0]);
        sim.insert("v(sw)".into(), vec![0.0, 12.0]);
        sim.insert("i(out)".into(), vec![1.0, 1.1, 1.2]);

        let built = build_converter_waveforms(
            &sim,
            &["sw".to_string()],
            &[ConverterOutput {
                node: "out".to_string(),
            }],
            2,
            100_000.0,
        );
        let series = &built[0].waveforms;
        assert_eq!(series.len(), 2);
        for s in series {
            assert_eq!(s.x.len(), s.y.len(), "{} is misaligned", s.label);
        }
        assert_eq!(series[0].x.len(), 4);
        assert_eq!(series[1].x.len(), 6);
    }

    #[test]
    fn converter_waveforms_without_time_are_empty() {
        let mut sim = SimulationData::new();
        sim.insert("v(sw)".into(), vec![0.0, 12.0]);
        assert!(build_converter_waveforms(&sim, &["sw".to_string()], &[], 1, 1.0).is_empty());
    }

    #[test]
    fn waveform_set_counts_points_across_lists() {
        let mut set = WaveformSet::default();
        assert!(!set.has_waveforms());
        set.update(
            Some(vec![OperatingPointWaveforms {
                frequency: 1.0,
                operating_point_name: "a".into(),
                waveforms: vec![WaveformSeries::new(
                    "Primary Voltage",
                    vec![0.0, 1.0, 2.0],
                    vec![0.0; 3],
                    SeriesKind::Voltage,
                )],
            }]),
            None,
        );
        set.add_converter(OperatingPointWaveforms {
            frequency: 1.0,
            operating_point_name: "b".into(),
            waveforms: vec![WaveformSeries::new(
                "Switch Node 1",
                vec![0.0, 1.0],
                vec![0.0; 2],
                SeriesKind::Voltage,
            )],
        });
        assert!(set.has_waveforms());
        assert_eq!(set.total_points(), 5);
        assert_eq!(set.revision, 1);
        set.clear();
        assert!(!set.has_waveforms());
    }
}
