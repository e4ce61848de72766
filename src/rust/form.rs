use std::collections::BTreeMap;

use crate::error::FormError;
use crate::fields::{self, FieldKind, FieldSpec, FIELDS};
use crate::record::{AttributeRecord, AttributeValue};

/// The property questionnaire, validated against the field table.
///
/// A fresh form has every choice on its first option, free text empty and
/// the year at its lower bound.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyForm {
    answers: BTreeMap<&'static str, String>,
}

impl Default for PropertyForm {
    fn default() -> Self {
        let answers = FIELDS
            .iter()
            .map(|spec| {
                let initial = match spec.kind {
                    FieldKind::Text => String::new(),
                    FieldKind::Choice(options) => {
                        options.first().map(|o| o.to_string()).unwrap_or_default()
                    }
                    FieldKind::Integer { min, .. } => min.to_string(),
                };
                (spec.name, initial)
            })
            .collect();
        Self { answers }
    }
}

impl PropertyForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one answer, rejecting unknown fields and values outside a
    /// field's option list. Years are range-checked in [`to_record`](Self::to_record).
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> Result<&mut Self, FormError> {
        let spec = fields::field(field).ok_or_else(|| FormError::UnknownField(field.to_string()))?;
        let value = value.into();
        if let FieldKind::Choice(options) = spec.kind {
            if !options.contains(&value.as_str()) {
                return Err(FormError::InvalidChoice { field: spec.name, value });
            }
        }
        self.answers.insert(spec.name, value);
        Ok(self)
    }

    /// Fluent variant of [`set`](Self::set).
    pub fn with(mut self, field: &str, value: impl Into<String>) -> Result<Self, FormError> {
        self.set(field, value)?;
        Ok(self)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.answers.get(field).map(String::as_str)
    }

    /// Converts the answers into an attribute record.
    pub fn to_record(&self) -> Result<AttributeRecord, FormError> {
        let mut values = BTreeMap::new();
        for spec in FIELDS {
            let Some(answer) = self.answers.get(spec.name) else {
                continue;
            };
            let value = match spec.kind {
                FieldKind::Text | FieldKind::Choice(_) => AttributeValue::Text(answer.clone()),
                FieldKind::Integer { min, max } => {
                    AttributeValue::from(parse_bounded(spec, answer, min, max)?)
                }
            };
            values.insert(spec.name.to_string(), value);
        }
        Ok(AttributeRecord::from_values(values))
    }
}

fn parse_bounded(spec: &FieldSpec, answer: &str, min: i32, max: i32) -> Result<i32, FormError> {
    answer
        .trim()
        .parse::<i32>()
        .ok()
        .filter(|v| (min..=max).contains(v))
        .ok_or_else(|| FormError::OutOfRange {
            field: spec.name,
            value: answer.to_string(),
            min,
            max,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{ROOF_CONSTRUCTION, STRUCTURE_TYPE, VEG_CLEARANCE, YEAR_BUILT};

    #[test]
    fn test_defaults_match_initial_form() {
        let form = PropertyForm::new();
        assert_eq!(form.get(VEG_CLEARANCE), Some("0-30'"));
        assert_eq!(form.get(STRUCTURE_TYPE), Some("Single Family Residence"));
        assert_eq!(form.get(YEAR_BUILT), Some("1800"));
        assert_eq!(form.get("CITY"), Some(""));
    }

    #[test]
    fn test_set_validates_choices() {
        let mut form = PropertyForm::new();
        assert!(form.set(ROOF_CONSTRUCTION, "Metal").is_ok());
        assert_eq!(
            form.set(ROOF_CONSTRUCTION, "Thatch").unwrap_err(),
            FormError::InvalidChoice { field: ROOF_CONSTRUCTION, value: "Thatch".into() }
        );
        assert!(matches!(form.set("ROOF", "Metal"), Err(FormError::UnknownField(_))));
    }

    #[test]
    fn test_year_bounds() {
        for year in ["1800", "2025"] {
            let form = PropertyForm::new().with(YEAR_BUILT, year).unwrap();
            assert!(form.to_record().is_ok());
        }
        for year in ["1799", "2026", "nineteen"] {
            let form = PropertyForm::new().with(YEAR_BUILT, year).unwrap();
            assert!(matches!(form.to_record(), Err(FormError::OutOfRange { .. })));
        }
    }

    #[test]
    fn test_record_contents() {
        let record = PropertyForm::new()
            .with(STRUCTURE_TYPE, "Mobile Home")
            .and_then(|f| f.with(YEAR_BUILT, "1975"))
            .and_then(|f| f.with("CITY", " Paradise "))
            .unwrap()
            .to_record()
            .unwrap();
        assert_eq!(record.len(), FIELDS.len());
        assert_eq!(record.get(STRUCTURE_TYPE), Some(&AttributeValue::Text("Mobile Home".into())));
        assert_eq!(record.get(YEAR_BUILT), Some(&AttributeValue::Number(1975.0)));
        assert_eq!(record.get("CITY"), Some(&AttributeValue::Text(" Paradise ".into())));
    }
}
