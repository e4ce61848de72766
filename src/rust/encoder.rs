use log::debug;
use ndarray::Array1;

use crate::fields::one_hot_column;
use crate::record::AttributeRecord;
use crate::schema::FeatureSchema;

/// A feature vector laid out in schema column order.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedVector(Array1<f32>);

impl EncodedVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_array(&self) -> &Array1<f32> {
        &self.0
    }

    /// Column values as a contiguous slice.
    pub fn values(&self) -> &[f32] {
        self.0.as_slice().unwrap_or(&[])
    }
}

impl From<Vec<f32>> for EncodedVector {
    fn from(values: Vec<f32>) -> Self {
        EncodedVector(Array1::from(values))
    }
}

/// Aligns a record to the schema.
///
/// Categorical answers set their `FIELD_value` column to 1.0, numeric answers
/// are copied into the column named after the field. Answers whose column
/// the model never saw are dropped, exactly as unseen categories vanish when
/// one-hot columns are reindexed to the training columns. The result is
/// always `schema.len()` wide.
pub fn encode(record: &AttributeRecord, schema: &FeatureSchema) -> EncodedVector {
    let mut vector = Array1::<f32>::zeros(schema.len());

    for (field, value) in record.categorical() {
        let column = one_hot_column(field, value);
        match schema.position(&column) {
            Some(i) => vector[i] = 1.0,
            None => {
                debug!("Unseen category {:?} for {}, leaving its columns at zero", value, field)
            }
        }
    }

    for (field, value) in record.numeric() {
        match schema.position(field) {
            Some(i) => vector[i] = value as f32,
            None => debug!("Numeric field {} is not a model feature, ignoring", field),
        }
    }

    EncodedVector(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AttributeValue;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(
            [
                "YEARBUILT",
                "EAVES_Enclosed",
                "EAVES_Unknown",
                "VENTSCREEN_Mesh Screen <= 1/8",
                "CITY_",
                "CITY_Paradise_West",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_encode_sets_one_hot_and_numeric_columns() {
        let record = AttributeRecord::from_pairs([
            ("EAVES", AttributeValue::from("Unknown")),
            ("YEARBUILT", AttributeValue::from(1975)),
        ])
        .unwrap();
        let vector = encode(&record, &schema());
        assert_eq!(vector.values(), &[1975.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_encode_empty_record_is_all_zero() {
        let vector = encode(&AttributeRecord::default(), &schema());
        assert_eq!(vector.len(), 6);
        assert!(vector.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_encode_awkward_values() {
        let record = AttributeRecord::from_pairs([
            ("CITY", "Paradise_West"),
            ("VENTSCREEN", "Mesh Screen <= 1/8"),
        ])
        .unwrap();
        let vector = encode(&record, &schema());
        assert_eq!(vector.values(), &[0.0, 0.0, 0.0, 1.0, 0.0, 1.0]);

        let blank = AttributeRecord::from_pairs([("CITY", "")]).unwrap();
        assert_eq!(encode(&blank, &schema()).values()[4], 1.0);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let record = AttributeRecord::from_pairs([
            ("ROOFCONSTRUCTR", AttributeValue::from("Thatch")),
            ("ACRES", AttributeValue::from(12.0)),
        ])
        .unwrap();
        assert_eq!(encode(&record, &schema()), encode(&AttributeRecord::default(), &schema()));
    }
}
