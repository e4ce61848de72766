mod builder;
mod predictor;

pub use builder::RiskPredictorBuilder;
pub use predictor::{PredictionOutcome, RiskPredictor};

/// Information about a loaded predictor
#[derive(Debug, Clone, serde::Serialize)]
pub struct PredictorInfo {
    /// Directory the artifacts were loaded from, if any
    pub artifacts_dir: Option<String>,
    /// Width of the encoded feature vector
    pub num_features: usize,
    /// Fingerprint of the ordered schema columns
    pub schema_fingerprint: String,
    /// Risk labels in class index order
    pub labels: Vec<String>,
    /// Backend description
    pub model: String,
}
