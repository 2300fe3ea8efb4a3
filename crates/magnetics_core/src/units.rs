//! SI prefixes for displaying requirement values.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnitPrefix {
    pub symbol: &'static str,
    pub multiplier: f64,
}

pub const PREFIXES: [UnitPrefix; 8] = [
    UnitPrefix { symbol: "p", multiplier: 1e-12 },
    UnitPrefix { symbol: "n", multiplier: 1e-9 },
    UnitPrefix { symbol: "u", multiplier: 1e-6 },
    UnitPrefix { symbol: "m", multiplier: 1e-3 },
    UnitPrefix { symbol: "", multiplier: 1.0 },
    UnitPrefix { symbol: "k", multiplier: 1e3 },
    UnitPrefix { symbol: "M", multiplier: 1e6 },
    UnitPrefix { symbol: "G", multiplier: 1e9 },
];

const DISPLAY_PRECISION: f64 = 1e9;

/// Prefixes whose multiplier lies within `[min, max]`; all of them when the
/// range is open.
pub fn prefixes_in_range(min: Option<f64>, max: Option<f64>) -> Vec<UnitPrefix> {
    PREFIXES
        .into_iter()
        .filter(|p| min.map_or(true, |min| p.multiplier >= min))
        .filter(|p| max.map_or(true, |max| p.multiplier <= max))
        .collect()
}

/// Unit labels offered in the unit selector, e.g. `["Alf", "kAlf"]`.
pub fn unit_options(unit: &str, min: Option<f64>, max: Option<f64>) -> Vec<String> {
    prefixes_in_range(min, max)
        .into_iter()
        .map(|p| format!("{}{unit}", p.symbol))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledValue {
    pub value: f64,
    pub unit: String,
    pub multiplier: f64,
}

fn round_for_display(value: f64) -> f64 {
    (value * DISPLAY_PRECISION).round() / DISPLAY_PRECISION
}

/// Picks the largest allowed prefix not exceeding `|value|` and rescales the
/// value to it. Zero and values below every allowed prefix use the smallest
/// allowed prefix, or no prefix when it is allowed.
pub fn scale_to_unit(value: f64, unit: &str, min: Option<f64>, max: Option<f64>) -> ScaledValue {
    let allowed = prefixes_in_range(min, max);
    let base = UnitPrefix { symbol: "", multiplier: 1.0 };
    let magnitude = value.abs();

    let prefix = allowed
        .iter()
        .rev()
        .find(|p| magnitude >= p.multiplier)
        .copied()
        .or_else(|| {
            if value == 0.0 && allowed.contains(&base) {
                Some(base)
            } else {
                allowed.first().copied()
            }
        })
        .unwrap_or(base);

    ScaledValue {
        value: round_for_display(value / prefix.multiplier),
        unit: format!("{}{unit}", prefix.symbol),
        multiplier: prefix.multiplier,
    }
}

/// Converts a value typed in `unit_label` back to base units, e.g.
/// `42 kAlf` with base unit `Alf` gives 42000.
pub fn to_base_unit(value: f64, unit_label: &str, unit: &str) -> Option<f64> {
    let symbol = unit_label.strip_suffix(unit)?;
    PREFIXES
        .iter()
        .find(|p| p.symbol == symbol)
        .map(|p| value * p.multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_range_offers_every_prefix() {
        assert_eq!(
            unit_options("Alf", None, None),
            vec!["pAlf", "nAlf", "uAlf", "mAlf", "Alf", "kAlf", "MAlf", "GAlf"]
        );
    }

    #[test]
    fn bounded_range_reduces_options() {
        assert_eq!(unit_options("Alf", Some(1.0), Some(12000.0)), vec!["Alf", "kAlf"]);
    }

    #[test]
    fn large_value_moves_to_kilo() {
        let scaled = scale_to_unit(42000.0, "Alf", Some(1.0), Some(12000.0));
        assert_eq!(scaled.value, 42.0);
        assert_eq!(scaled.unit, "kAlf");
        assert_eq!(to_base_unit(scaled.value, &scaled.unit, "Alf"), Some(42000.0));
    }

    #[test]
    fn small_values_use_sub_unit_prefixes() {
        let scaled = scale_to_unit(0.0024, "H", None, None);
        assert_eq!(scaled.value, 2.4);
        assert_eq!(scaled.unit, "mH");

        let scaled = scale_to_unit(-4.7e-6, "F", None, None);
        assert_eq!(scaled.value, -4.7);
        assert_eq!(scaled.unit, "uF");

        assert_eq!(scale_to_unit(0.0, "V", None, None).unit, "V");
        assert_eq!(scale_to_unit(0.5, "Alf", Some(1.0), Some(12000.0)).unit, "Alf");
    }

    #[test]
    fn unknown_unit_label_is_rejected() {
        assert_eq!(to_base_unit(1.0, "kV", "A"), None);
        assert_eq!(to_base_unit(1.0, "xA", "A"), None);
    }
}
