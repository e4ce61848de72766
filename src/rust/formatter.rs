use std::collections::HashMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::PredictionError;
use crate::labels::LabelMapping;

/// Per-class probabilities keyed by risk label, in label order.
#[derive(Debug, Clone, PartialEq)]
pub struct Probabilities(Vec<(String, f64)>);

impl Probabilities {
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(l, p)| (l.as_str(), *p))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(l, _)| l.as_str())
    }

    /// Highest probability, or 0 when empty.
    pub fn max(&self) -> f64 {
        self.0.iter().map(|(_, p)| *p).fold(0.0, f64::max)
    }

    pub fn to_map(&self) -> HashMap<String, f64> {
        self.0.iter().cloned().collect()
    }
}

impl Serialize for Probabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, probability) in &self.0 {
            map.serialize_entry(label, probability)?;
        }
        map.end()
    }
}

/// The outcome of one successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub predicted_risk: String,
    pub probabilities: Probabilities,
}

/// Pairs labels with probabilities and names the predicted class.
pub fn format(
    class_index: usize,
    probabilities: &[f64],
    labels: &LabelMapping,
) -> Result<PredictionResult, PredictionError> {
    let mismatch = || PredictionError::LabelCountMismatch {
        labels: labels.len(),
        probabilities: probabilities.len(),
        class_index,
    };
    if probabilities.len() != labels.len() {
        return Err(mismatch());
    }
    let predicted_risk = labels.get(class_index).ok_or_else(mismatch)?.to_string();

    let pairs = labels
        .iter()
        .zip(probabilities)
        .map(|(label, &p)| (label.to_string(), p))
        .collect();

    Ok(PredictionResult { predicted_risk, probabilities: Probabilities(pairs) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> LabelMapping {
        LabelMapping::new(vec!["Destroyed (>50%)".into(), "No Damage".into()]).unwrap()
    }

    #[test]
    fn test_format_zips_in_order() {
        let result = format(1, &[0.3, 0.7], &labels()).unwrap();
        assert_eq!(result.predicted_risk, "No Damage");
        assert_eq!(
            result.probabilities.labels().collect::<Vec<_>>(),
            vec!["Destroyed (>50%)", "No Damage"]
        );
        assert_eq!(result.probabilities.get("Destroyed (>50%)"), Some(0.3));
        assert_eq!(result.probabilities.max(), 0.7);
    }

    #[test]
    fn test_format_count_mismatch() {
        let err = format(0, &[0.2, 0.3, 0.5], &labels()).unwrap_err();
        assert_eq!(
            err,
            PredictionError::LabelCountMismatch { labels: 2, probabilities: 3, class_index: 0 }
        );
    }

    #[test]
    fn test_format_class_out_of_range() {
        let result = format(2, &[0.5, 0.5], &labels());
        assert!(matches!(result, Err(PredictionError::LabelCountMismatch { .. })));
    }

    #[test]
    fn test_serialized_key_order() {
        let result = format(0, &[0.9, 0.1], &labels()).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let expected = concat!(
            r#"{"predicted_risk":"Destroyed (>50%)","#,
            r#""probabilities":{"Destroyed (>50%)":0.9,"No Damage":0.1}}"#
        );
        assert_eq!(json, expected);
    }
}
