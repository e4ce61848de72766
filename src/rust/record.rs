use std::collections::BTreeMap;

use log::debug;
use serde_json::Value;

use crate::error::PredictionError;

/// A single answer: categorical text or a number.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Number(f64::from(value))
    }
}

/// One property submission: field name to answer.
///
/// Immutable once built. Fields with no answer are simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeRecord {
    values: BTreeMap<String, AttributeValue>,
}

impl AttributeRecord {
    /// Builds a record from `(field, value)` pairs. A repeated field keeps
    /// its last value.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self, PredictionError>
    where
        K: Into<String>,
        V: Into<AttributeValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut values = BTreeMap::new();
        for (name, value) in pairs {
            let name = name.into();
            let value = value.into();
            if let AttributeValue::Number(n) = value {
                if !n.is_finite() {
                    return Err(PredictionError::InvalidRecord(format!(
                        "field '{}' is not a finite number",
                        name
                    )));
                }
            }
            if let Some(previous) = values.insert(name.clone(), value) {
                debug!("Field '{}' given more than once, dropping {:?}", name, previous);
            }
        }
        Ok(Self { values })
    }

    /// Builds a record from a JSON object.
    ///
    /// `null` answers are treated as omitted and booleans as 1/0. Anything
    /// that is not a flat object of strings, numbers, booleans or nulls is
    /// rejected.
    pub fn from_json(input: &Value) -> Result<Self, PredictionError> {
        let object = input.as_object().ok_or_else(|| {
            PredictionError::InvalidRecord(format!(
                "expected an object of field -> value, got {}",
                json_kind(input)
            ))
        })?;

        let mut pairs = Vec::with_capacity(object.len());
        for (name, value) in object {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => AttributeValue::Text(s.clone()),
                Value::Bool(b) => AttributeValue::Number(if *b { 1.0 } else { 0.0 }),
                Value::Number(n) => AttributeValue::Number(n.as_f64().ok_or_else(|| {
                    PredictionError::InvalidRecord(format!(
                        "field '{}' is not representable as a number",
                        name
                    ))
                })?),
                other => {
                    return Err(PredictionError::InvalidRecord(format!(
                        "field '{}' holds {}, expected text or a number",
                        name,
                        json_kind(other)
                    )))
                }
            };
            pairs.push((name.clone(), value));
        }
        Self::from_pairs(pairs)
    }

    /// Wraps values already known to be finite.
    pub(crate) fn from_values(values: BTreeMap<String, AttributeValue>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&AttributeValue> {
        self.values.get(field)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Categorical answers, in field name order.
    pub fn categorical(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().filter_map(|(k, v)| match v {
            AttributeValue::Text(s) => Some((k.as_str(), s.as_str())),
            AttributeValue::Number(_) => None,
        })
    }

    /// Numeric answers, in field name order.
    pub fn numeric(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().filter_map(|(k, v)| match v {
            AttributeValue::Number(n) => Some((k.as_str(), *n)),
            AttributeValue::Text(_) => None,
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_partitions_fields() {
        let record = AttributeRecord::from_json(&json!({
            "EAVES": "Enclosed",
            "YEARBUILT": 1975,
            "CITY": null,
            "FLAG": true,
        }))
        .unwrap();

        assert_eq!(record.len(), 3);
        assert_eq!(record.categorical().collect::<Vec<_>>(), vec![("EAVES", "Enclosed")]);
        assert_eq!(
            record.numeric().collect::<Vec<_>>(),
            vec![("FLAG", 1.0), ("YEARBUILT", 1975.0)]
        );
        assert!(record.get("CITY").is_none());
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        for input in [json!(["EAVES", "Enclosed"]), json!("EAVES"), json!(null), json!(3)] {
            let err = AttributeRecord::from_json(&input).unwrap_err();
            assert!(matches!(err, PredictionError::InvalidRecord(_)));
        }
    }

    #[test]
    fn test_from_json_rejects_nested_values() {
        let err = AttributeRecord::from_json(&json!({"EAVES": ["Enclosed"]})).unwrap_err();
        assert!(matches!(err, PredictionError::InvalidRecord(msg) if msg.contains("EAVES")));
        assert!(AttributeRecord::from_json(&json!({"EAVES": {"v": 1}})).is_err());
    }

    #[test]
    fn test_duplicate_fields_keep_last() {
        let record =
            AttributeRecord::from_pairs([("EAVES", "Unknown"), ("EAVES", "Enclosed")]).unwrap();
        assert_eq!(record.get("EAVES"), Some(&AttributeValue::Text("Enclosed".into())));
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let err = AttributeRecord::from_pairs([("YEARBUILT", f64::NAN)]).unwrap_err();
        assert!(matches!(err, PredictionError::InvalidRecord(_)));
    }
}
