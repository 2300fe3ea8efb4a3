//! Voltage/current pairing by fuzzy label matching.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::{OperatingPointWaveforms, WaveformSeries};

/// A series together with its position in the source list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesRef<'a> {
    #[serde(rename = "wf")]
    pub series: &'a WaveformSeries,
    #[serde(rename = "idx")]
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairedWaveform<'a> {
    pub voltage: Option<SeriesRef<'a>>,
    pub current: Option<SeriesRef<'a>>,
}

fn voltage_keyword() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)voltage").expect("static regex"))
}

fn current_keyword() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)current").expect("static regex"))
}

fn trailing_v() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)V$").expect("static regex"))
}

fn trailing_i() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)I$").expect("static regex"))
}

/// Node name of a voltage label: first "voltage" removed, then a trailing "V".
pub(crate) fn voltage_base_name(label: &str) -> String {
    let without_keyword = voltage_keyword().replacen(label, 1, "");
    trailing_v()
        .replacen(&without_keyword, 1, "")
        .trim()
        .to_string()
}

fn current_base_name(label: &str) -> String {
    let without_keyword = current_keyword().replacen(label, 1, "");
    trailing_i()
        .replacen(&without_keyword, 1, "")
        .trim()
        .to_string()
}

fn labels_match(voltage: &WaveformSeries, current: &WaveformSeries) -> bool {
    let voltage_lower = voltage.label.to_lowercase();
    let current_lower = current.label.to_lowercase();
    voltage_base_name(&voltage.label).to_lowercase()
        == current_base_name(&current.label).to_lowercase()
        || voltage_lower.contains(current_lower.replacen("current", "", 1).trim())
        || current_lower.contains(voltage_lower.replacen("voltage", "", 1).trim())
}

/// Pairs voltage and current series believed to belong to the same node.
///
/// Voltage series are scanned in order; each takes the first unused current
/// series whose label matches. Unmatched voltages become voltage-only pairs.
/// Currents left over are appended afterwards as current-only pairs, in input
/// order. Series with any other unit are ignored.
pub fn pair_series(all: &[WaveformSeries]) -> Vec<PairedWaveform<'_>> {
    let mut pairs = Vec::new();
    let mut used = HashSet::new();

    for (idx, wf) in all.iter().enumerate() {
        if used.contains(&idx) || !wf.is_voltage() {
            continue;
        }

        let matching = all.iter().enumerate().position(|(c_idx, c_wf)| {
            c_idx != idx && !used.contains(&c_idx) && c_wf.is_current() && labels_match(wf, c_wf)
        });

        let voltage = Some(SeriesRef {
            series: wf,
            index: idx,
        });
        used.insert(idx);
        match matching {
            Some(c_idx) => {
                used.insert(c_idx);
                pairs.push(PairedWaveform {
                    voltage,
                    current: Some(SeriesRef {
                        series: &all[c_idx],
                        index: c_idx,
                    }),
                });
            }
            None => pairs.push(PairedWaveform {
                voltage,
                current: None,
            }),
        }
    }

    for (idx, wf) in all.iter().enumerate() {
        if used.contains(&idx) || !wf.is_current() {
            continue;
        }
        used.insert(idx);
        pairs.push(PairedWaveform {
            voltage: None,
            current: Some(SeriesRef {
                series: wf,
                index: idx,
            }),
        });
    }

    pairs
}

/// Pairs of one operating point; an out-of-range index yields no pairs.
pub fn paired_waveforms(
    waveforms: &[OperatingPointWaveforms],
    operating_point_index: usize,
) -> Vec<PairedWaveform<'_>> {
    waveforms
        .get(operating_point_index)
        .map(|op| pair_series(&op.waveforms))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::SeriesKind;

    fn series(label: &str, kind: SeriesKind) -> WaveformSeries {
        WaveformSeries::new(label, vec![0.0, 1.0], vec![1.0, 2.0], kind)
    }

    fn indices(pairs: &[PairedWaveform<'_>]) -> Vec<(Option<usize>, Option<usize>)> {
        pairs
            .iter()
            .map(|p| (p.voltage.map(|v| v.index), p.current.map(|c| c.index)))
            .collect()
    }

    #[test]
    fn primary_voltage_pairs_with_primary_current() {
        let all = vec![
            series("Primary Voltage", SeriesKind::Voltage),
            series("Primary Current", SeriesKind::Current),
        ];
        let pairs = pair_series(&all);
        assert_eq!(indices(&pairs), vec![(Some(0), Some(1))]);
        assert_eq!(pairs[0].voltage.expect("voltage").series.label, "Primary Voltage");
    }

    #[test]
    fn lone_voltage_has_no_current() {
        let all = vec![series("X Voltage", SeriesKind::Voltage)];
        let pairs = pair_series(&all);
        assert_eq!(indices(&pairs), vec![(Some(0), None)]);
    }

    #[test]
    fn leftover_currents_follow_voltage_led_pairs() {
        let all = vec![
            series("Secondary 1 Current", SeriesKind::Current),
            series("Primary Voltage", SeriesKind::Voltage),
            series("Primary Current", SeriesKind::Current),
            series("Switch Node 1", SeriesKind::Voltage),
            series("Aux Current", SeriesKind::Current),
        ];
        let pairs = pair_series(&all);
        assert_eq!(
            indices(&pairs),
            vec![
                (Some(1), Some(2)),
                (Some(3), None),
                (None, Some(0)),
                (None, Some(4)),
            ]
        );
    }

    #[test]
    fn each_current_is_consumed_once() {
        let all = vec![
            series("Output 1 Voltage", SeriesKind::Voltage),
            series("Output 1 Voltage", SeriesKind::Voltage),
            series("Output 1 Current", SeriesKind::Current),
        ];
        let pairs = pair_series(&all);
        assert_eq!(indices(&pairs), vec![(Some(0), Some(2)), (Some(1), None)]);
    }

    #[test]
    fn short_symbol_labels_match_after_suffix_strip() {
        let all = vec![
            series("vout V", SeriesKind::Voltage),
            series("VOUT i", SeriesKind::Current),
        ];
        assert_eq!(indices(&pair_series(&all)), vec![(Some(0), Some(1))]);
    }

    #[test]
    fn unrelated_labels_stay_apart() {
        let all = vec![
            series("Primary Voltage", SeriesKind::Voltage),
            series("Secondary 1 Current", SeriesKind::Current),
        ];
        assert_eq!(
            indices(&pair_series(&all)),
            vec![(Some(0), None), (None, Some(1))]
        );
    }

    #[test]
    fn missing_operating_point_yields_no_pairs() {
        assert!(paired_waveforms(&[], 3).is_empty());
    }
}
