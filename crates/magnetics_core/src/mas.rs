//! Typed view of the MAS (Magnetic Agnostic Structure) document the frontend edits.
//!
//! Only the parts this crate reasons about are typed. Everything else is kept in
//! `extra` maps so a document read from storage or returned by the engine
//! survives a round trip untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

pub const DEFAULT_FREQUENCY: f64 = 100_000.0;
pub const DEFAULT_AMBIENT_TEMPERATURE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mas {
    pub inputs: Inputs,
    #[serde(default)]
    pub magnetic: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inputs {
    #[serde(default)]
    pub design_requirements: DesignRequirements,
    #[serde(default)]
    pub operating_points: Vec<OperatingPoint>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignRequirements {
    #[serde(default)]
    pub turns_ratios: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DesignRequirements {
    /// One winding per turns ratio plus the primary.
    pub fn number_windings(&self) -> usize {
        self.turns_ratios.len() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub conditions: OperatingConditions,
    #[serde(default)]
    pub excitations_per_winding: Vec<Excitation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OperatingPoint {
    pub fn new(name: impl Into<String>, ambient_temperature: f64) -> Self {
        Self {
            name: Some(name.into()),
            conditions: OperatingConditions {
                ambient_temperature,
                extra: Map::new(),
            },
            excitations_per_winding: Vec::new(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingConditions {
    pub ambient_temperature: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for OperatingConditions {
    fn default() -> Self {
        Self {
            ambient_temperature: DEFAULT_AMBIENT_TEMPERATURE,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Excitation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<SignalDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<SignalDescriptor>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waveform: Option<Waveform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub harmonics: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Sampled waveform. While the user is typing, samples may be blank; those
/// are read as NaN instead of rejecting the whole document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waveform {
    #[serde(default, deserialize_with = "lenient_samples")]
    pub data: Vec<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_optional_samples"
    )]
    pub time: Option<Vec<f64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Waveform {
    pub fn new(time: Vec<f64>, data: Vec<f64>) -> Self {
        Self {
            data,
            time: Some(time),
            extra: Map::new(),
        }
    }
}

fn sample_value(value: Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

fn lenient_samples<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(sample_value)
        .collect())
}

fn lenient_optional_samples<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?;
    Ok(raw.map(|samples| samples.into_iter().map(sample_value).collect()))
}

/// Kind of design the MAS document is seeded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MasKind {
    Power,
    Filter,
}

/// Default excitation for a new winding: triangular current over a
/// rectangular voltage at 100 kHz.
pub fn default_excitation() -> Excitation {
    let period = 1.0 / DEFAULT_FREQUENCY;
    Excitation {
        frequency: Some(DEFAULT_FREQUENCY),
        voltage: Some(SignalDescriptor {
            waveform: Some(Waveform::new(
                vec![0.0, 0.0, period / 2.0, period / 2.0, period],
                vec![-20.5, 70.5, 70.5, -20.5, -20.5],
            )),
            ..SignalDescriptor::default()
        }),
        current: Some(SignalDescriptor {
            waveform: Some(Waveform::new(
                vec![0.0, period / 2.0, period],
                vec![-5.0, 5.0, -5.0],
            )),
            ..SignalDescriptor::default()
        }),
        extra: Map::new(),
    }
}

/// Default excitation used when operating points are entered as a list of
/// harmonics instead of sampled waveforms.
pub fn default_excitation_with_harmonics() -> Excitation {
    let harmonics = |amplitudes: Vec<f64>| {
        json!({
            "amplitudes": amplitudes,
            "frequencies": [0.0, DEFAULT_FREQUENCY],
        })
    };
    Excitation {
        frequency: Some(DEFAULT_FREQUENCY),
        voltage: Some(SignalDescriptor {
            harmonics: Some(harmonics(vec![0.0, 50.0])),
            ..SignalDescriptor::default()
        }),
        current: Some(SignalDescriptor {
            harmonics: Some(harmonics(vec![0.0, 5.0])),
            ..SignalDescriptor::default()
        }),
        extra: Map::new(),
    }
}

pub fn default_mas(kind: MasKind) -> Mas {
    let (topology, magnetic) = match kind {
        MasKind::Power => (
            "Flyback Converter",
            json!({
                "core": {
                    "name": "Custom",
                    "functionalDescription": {
                        "type": "two-piece set",
                        "material": "3C97",
                        "shape": "PQ 40/40",
                        "gapping": [{"type": "subtractive", "length": 0.001}],
                        "numberStacks": 1,
                    },
                },
                "coil": {"bobbin": "Dummy", "functionalDescription": []},
            }),
        ),
        MasKind::Filter => (
            "Common Mode Choke",
            json!({
                "core": {
                    "name": "Custom",
                    "functionalDescription": {
                        "type": "toroidal",
                        "material": "3E10",
                        "shape": "T 20/10/7",
                        "gapping": [],
                        "numberStacks": 1,
                    },
                },
                "coil": {"bobbin": "Dummy", "functionalDescription": []},
            }),
        ),
    };

    let mut requirements = Map::new();
    requirements.insert("name".to_string(), json!("My Design Requirements"));
    requirements.insert("topology".to_string(), json!(topology));
    requirements.insert(
        "magnetizingInductance".to_string(),
        json!({"nominal": 0.0001}),
    );

    Mas {
        inputs: Inputs {
            design_requirements: DesignRequirements {
                turns_ratios: Vec::new(),
                extra: requirements,
            },
            operating_points: Vec::new(),
            extra: Map::new(),
        },
        magnetic,
        outputs: Vec::new(),
        extra: Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveform_reads_blank_samples_as_nan() {
        let waveform: Waveform =
            serde_json::from_value(json!({"time": [0, 1, null], "data": [1.5, null, "x"]}))
                .expect("lenient waveform");
        assert_eq!(waveform.data[0], 1.5);
        assert!(waveform.data[1].is_nan());
        assert!(waveform.data[2].is_nan());
        assert!(waveform.time.as_ref().expect("time")[2].is_nan());
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let raw = json!({
            "name": "Op. Point No. 1",
            "conditions": {"ambientTemperature": 25.0, "cooling": null},
            "excitationsPerWinding": [{
                "frequency": 200000.0,
                "current": {"waveform": {"data": [0.0, 1.0], "time": [0.0, 1e-6], "ancillaryLabel": "Triangular"}},
                "magnetizingCurrent": {"processed": {"peak": 1.0}},
            }],
        });
        let op: OperatingPoint = serde_json::from_value(raw.clone()).expect("operating point");
        assert_eq!(op.conditions.ambient_temperature, 25.0);
        assert_eq!(serde_json::to_value(&op).expect("serialize"), raw);
    }

    #[test]
    fn default_mas_has_no_operating_points() {
        let mas = default_mas(MasKind::Power);
        assert!(mas.inputs.operating_points.is_empty());
        assert_eq!(mas.inputs.design_requirements.number_windings(), 1);
        assert_eq!(
            mas.magnetic["core"]["functionalDescription"]["shape"],
            json!("PQ 40/40")
        );
    }
}
