//! Minimum/nominal/maximum requirement fields.
//!
//! A requirement is edited one field at a time. Adding a field derives its
//! starting value from the fields already present so the requirement stays
//! ordered; validation produces the messages the form shows under the input.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToleranceField {
    Minimum,
    Nominal,
    Maximum,
}

impl ToleranceField {
    pub const ALL: [ToleranceField; 3] = [
        ToleranceField::Minimum,
        ToleranceField::Nominal,
        ToleranceField::Maximum,
    ];

    fn title(self) -> &'static str {
        match self {
            ToleranceField::Minimum => "Minimum",
            ToleranceField::Nominal => "Nominal",
            ToleranceField::Maximum => "Maximum",
        }
    }
}

pub const MISSING_VALUE_MESSAGE: &str =
    "At least one value must be set. Set one or remove the requirement from the menu.";
pub const NOMINAL_ABOVE_MAXIMUM_MESSAGE: &str =
    "Nominal value must be smaller than maximum value. Change or delete one of the fields.";
pub const NOMINAL_BELOW_MINIMUM_MESSAGE: &str =
    "Nominal value must be greater than minimum value. Change or delete one of the fields.";
pub const MAXIMUM_BELOW_MINIMUM_MESSAGE: &str =
    "Maximum value must be greater than minimum value. Change or delete one of the fields.";
pub const NEGATIVE_DIMENSION_MESSAGE: &str = "Value must be greater or equal than 0.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionWithTolerance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl DimensionWithTolerance {
    pub fn get(&self, field: ToleranceField) -> Option<f64> {
        match field {
            ToleranceField::Minimum => self.minimum,
            ToleranceField::Nominal => self.nominal,
            ToleranceField::Maximum => self.maximum,
        }
    }

    pub fn set(&mut self, field: ToleranceField, value: Option<f64>) {
        match field {
            ToleranceField::Minimum => self.minimum = value,
            ToleranceField::Nominal => self.nominal = value,
            ToleranceField::Maximum => self.maximum = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.minimum.is_none() && self.nominal.is_none() && self.maximum.is_none()
    }

    fn derive(&self, field: ToleranceField) -> Option<f64> {
        match field {
            ToleranceField::Nominal => match (self.minimum, self.maximum) {
                (Some(min), Some(max)) => Some((min + max) / 2.0),
                (Some(min), None) => Some(min * 2.0),
                (None, Some(max)) => Some(max / 2.0),
                (None, None) => None,
            },
            ToleranceField::Minimum => self
                .nominal
                .map(|nominal| nominal / 2.0)
                .or_else(|| self.maximum.map(|max| max / 2.0)),
            ToleranceField::Maximum => self
                .nominal
                .map(|nominal| nominal * 2.0)
                .or_else(|| self.minimum.map(|min| min * 2.0)),
        }
    }

    /// Adds `field`, derived from the fields already set or, when none is,
    /// taken from `defaults` (zero if the default lacks it too). A field that
    /// is already set is left as it is. Returns the field's value.
    pub fn add_field(&mut self, field: ToleranceField, defaults: &DimensionWithTolerance) -> f64 {
        if let Some(existing) = self.get(field) {
            return existing;
        }
        let value = self
            .derive(field)
            .or_else(|| defaults.get(field))
            .unwrap_or(0.0);
        self.set(field, Some(value));
        value
    }

    pub fn remove_field(&mut self, field: ToleranceField) {
        self.set(field, None);
    }

    pub fn errors(&self) -> Vec<String> {
        if self.is_empty() {
            return vec![MISSING_VALUE_MESSAGE.to_string()];
        }

        let mut errors: Vec<String> = ToleranceField::ALL
            .into_iter()
            .filter(|&field| matches!(self.get(field), Some(v) if v <= 0.0))
            .map(|field| format!("{} value must be greater than 0.", field.title()))
            .collect();

        if let (Some(nominal), Some(max)) = (self.nominal, self.maximum) {
            if nominal >= max {
                errors.push(NOMINAL_ABOVE_MAXIMUM_MESSAGE.to_string());
            }
        }
        if let (Some(nominal), Some(min)) = (self.nominal, self.minimum) {
            if nominal <= min {
                errors.push(NOMINAL_BELOW_MINIMUM_MESSAGE.to_string());
            }
        }
        if let (Some(max), Some(min)) = (self.maximum, self.minimum) {
            if max <= min {
                errors.push(MAXIMUM_BELOW_MINIMUM_MESSAGE.to_string());
            }
        }
        errors
    }

    /// Errors joined the way the form renders them, one per line.
    pub fn error_text(&self) -> String {
        join_messages(&self.errors())
    }
}

/// Errors of a single-value dimension field.
pub fn dimension_errors(value: f64) -> Vec<String> {
    if value < 0.0 {
        vec![NEGATIVE_DIMENSION_MESSAGE.to_string()]
    } else {
        Vec::new()
    }
}

pub fn join_messages(messages: &[String]) -> String {
    messages.iter().map(|m| format!("{m}\n")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ToleranceField::*;

    fn only(field: ToleranceField, value: f64) -> DimensionWithTolerance {
        let mut dimension = DimensionWithTolerance::default();
        dimension.set(field, Some(value));
        dimension
    }

    #[test]
    fn starting_from_minimum() {
        let defaults = only(Minimum, 0.0024);
        let mut d = only(Minimum, 10.0);
        assert_eq!(d.add_field(Nominal, &defaults), 20.0);
        assert_eq!(d.add_field(Maximum, &defaults), 40.0);
        d.remove_field(Nominal);
        d.remove_field(Maximum);
        assert_eq!(d.add_field(Maximum, &defaults), 20.0);
        assert_eq!(d.add_field(Nominal, &defaults), 15.0);
    }

    #[test]
    fn starting_from_nominal() {
        let defaults = only(Nominal, 0.0024);
        let mut d = only(Nominal, 10.0);
        assert_eq!(d.add_field(Minimum, &defaults), 5.0);
        assert_eq!(d.add_field(Maximum, &defaults), 20.0);
        d.remove_field(Minimum);
        d.remove_field(Maximum);
        assert_eq!(d.add_field(Maximum, &defaults), 20.0);
        assert_eq!(d.add_field(Minimum, &defaults), 5.0);
    }

    #[test]
    fn starting_from_maximum() {
        let defaults = only(Maximum, 0.0024);
        let mut d = only(Maximum, 10.0);
        assert_eq!(d.add_field(Minimum, &defaults), 5.0);
        assert_eq!(d.add_field(Nominal, &defaults), 7.5);
        d.remove_field(Nominal);
        d.remove_field(Minimum);
        assert_eq!(d.add_field(Nominal, &defaults), 5.0);
        assert_eq!(d.add_field(Minimum, &defaults), 2.5);
    }

    #[test]
    fn empty_requirement_takes_default() {
        let defaults = DimensionWithTolerance {
            minimum: Some(1.0),
            nominal: Some(2.0),
            maximum: None,
        };
        let mut d = DimensionWithTolerance::default();
        assert_eq!(d.add_field(Nominal, &defaults), 2.0);

        let mut d = DimensionWithTolerance::default();
        assert_eq!(d.add_field(Maximum, &defaults), 0.0);
    }

    #[test]
    fn error_messages_match_form() {
        let mut d = DimensionWithTolerance::default();
        assert_eq!(
            d.error_text(),
            "At least one value must be set. Set one or remove the requirement from the menu.\n"
        );

        d.nominal = Some(0.0);
        assert_eq!(d.error_text(), "Nominal value must be greater than 0.\n");

        let d = DimensionWithTolerance {
            minimum: None,
            nominal: Some(1.0),
            maximum: Some(1.0),
        };
        assert_eq!(d.errors(), vec![NOMINAL_ABOVE_MAXIMUM_MESSAGE]);

        let d = DimensionWithTolerance {
            minimum: Some(1.0),
            nominal: Some(1.0),
            maximum: Some(1.0),
        };
        assert_eq!(
            d.error_text(),
            "Nominal value must be smaller than maximum value. Change or delete one of the fields.\n\
             Nominal value must be greater than minimum value. Change or delete one of the fields.\n\
             Maximum value must be greater than minimum value. Change or delete one of the fields.\n"
        );

        let d = DimensionWithTolerance {
            minimum: Some(1.0),
            nominal: Some(2.0),
            maximum: Some(3.0),
        };
        assert!(d.errors().is_empty());
    }

    #[test]
    fn serialized_requirement_omits_unset_fields() {
        let d = only(Nominal, 1e-4);
        assert_eq!(
            serde_json::to_value(d).expect("serialize"),
            serde_json::json!({"nominal": 1e-4})
        );
    }

    #[test]
    fn dimension_must_not_be_negative() {
        assert!(dimension_errors(0.0).is_empty());
        assert_eq!(dimension_errors(-0.1), vec![NEGATIVE_DIMENSION_MESSAGE]);
    }
}
