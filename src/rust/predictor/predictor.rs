use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use super::builder::RiskPredictorBuilder;
use super::PredictorInfo;
use crate::encoder::{encode, EncodedVector};
use crate::engine::InferenceEngine;
use crate::error::PredictionError;
use crate::formatter::{format, PredictionResult};
use crate::labels::LabelMapping;
use crate::record::AttributeRecord;
use crate::schema::FeatureSchema;

/// A thread-safe wildfire damage risk predictor.
///
/// Holds the three startup artifacts (feature schema, label mapping and
/// classifier) and nothing else. Every prediction is a pure function of its
/// input and these artifacts, so one predictor can be shared across threads
/// with `Arc` without locking.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use firerisk::{ArtifactStore, RiskPredictor};
/// use serde_json::json;
///
/// let predictor = RiskPredictor::builder()
///     .with_artifacts(&ArtifactStore::new("artifacts"))?
///     .build()?;
///
/// let result = predictor.predict_risk(&json!({
///     "VEGCLERANCE": "Unknown",
///     "STRUCTURET_STANDARDIZED": "Mobile Home",
///     "YEARBUILT": 1975,
/// }))?;
/// println!("{}: {:?}", result.predicted_risk, result.probabilities);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RiskPredictor {
    artifacts_dir: Option<String>,
    schema: FeatureSchema,
    labels: LabelMapping,
    engine: InferenceEngine,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<RiskPredictor>();
    }
};

/// Result of a prediction at the pipeline boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionOutcome {
    Success(PredictionResult),
    Failure { kind: String, message: String },
}

impl PredictionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PredictionOutcome::Success(_))
    }
}

impl From<Result<PredictionResult, PredictionError>> for PredictionOutcome {
    fn from(result: Result<PredictionResult, PredictionError>) -> Self {
        match result {
            Ok(prediction) => PredictionOutcome::Success(prediction),
            Err(e) => PredictionOutcome::Failure {
                kind: e.kind().to_string(),
                message: e.to_string(),
            },
        }
    }
}

impl RiskPredictor {
    /// Creates a new RiskPredictorBuilder for fluent construction
    pub fn builder() -> RiskPredictorBuilder {
        RiskPredictorBuilder::new()
    }

    pub(super) fn new(
        artifacts_dir: Option<String>,
        schema: FeatureSchema,
        labels: LabelMapping,
        engine: InferenceEngine,
    ) -> Self {
        Self { artifacts_dir, schema, labels, engine }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn labels(&self) -> &LabelMapping {
        &self.labels
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Returns information about the loaded artifacts
    pub fn info(&self) -> PredictorInfo {
        PredictorInfo {
            artifacts_dir: self.artifacts_dir.clone(),
            num_features: self.schema.len(),
            schema_fingerprint: self.schema.fingerprint(),
            labels: self.labels.iter().map(str::to_string).collect(),
            model: self.engine.describe(),
        }
    }

    /// Encodes a record against the loaded schema.
    pub fn encode(&self, record: &AttributeRecord) -> EncodedVector {
        encode(record, &self.schema)
    }

    /// Predicts the risk category for a JSON object of field -> answer.
    ///
    /// Malformed input fails with [`PredictionError::InvalidRecord`] before
    /// anything is encoded. Unseen answers are not errors; they simply do not
    /// contribute to the feature vector.
    pub fn predict_risk(&self, user_input: &Value) -> Result<PredictionResult, PredictionError> {
        let record = AttributeRecord::from_json(user_input)?;
        self.predict_record(&record)
    }

    /// Predicts the risk category for an already built record.
    pub fn predict_record(
        &self,
        record: &AttributeRecord,
    ) -> Result<PredictionResult, PredictionError> {
        let vector = self.encode(record);
        let (class_index, probabilities) = self.engine.predict(&vector)?;
        let result = format(class_index, &probabilities, &self.labels).inspect_err(|e| {
            warn!("Model output does not match the label table: {}", e);
        })?;
        debug!("Predicted '{}' for {} answers", result.predicted_risk, record.len());
        Ok(result)
    }

    /// Like [`predict_risk`](Self::predict_risk), but never fails: errors come
    /// back as a tagged failure outcome.
    pub fn evaluate(&self, user_input: &Value) -> PredictionOutcome {
        let outcome = PredictionOutcome::from(self.predict_risk(user_input));
        if let PredictionOutcome::Failure { kind, message } = &outcome {
            warn!("Prediction failed ({}): {}", kind, message);
        }
        outcome
    }
}
