//! Inference over an encoded feature vector.

mod forest;
#[cfg(feature = "onnx")]
mod onnx;

pub use forest::{ForestModel, TreeExport};
#[cfg(feature = "onnx")]
pub use onnx::{OnnxModel, OnnxOptions};

use crate::encoder::EncodedVector;
use crate::error::PredictionError;

/// A trained classifier that turns a feature row into class probabilities.
///
/// Implementations are loaded once and read-only afterwards, so a shared
/// reference may be used from any number of threads.
pub trait ClassifierBackend: Send + Sync + std::fmt::Debug {
    /// Width of the feature row the model was trained on
    fn n_features(&self) -> usize;

    /// Number of output classes
    fn n_classes(&self) -> usize;

    /// Short description for logs and diagnostics
    fn describe(&self) -> String;

    /// Class probabilities for one row of exactly `n_features()` values.
    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, PredictionError>;
}

/// Stateless wrapper exposing predict-class and predict-probability.
#[derive(Debug)]
pub struct InferenceEngine {
    backend: Box<dyn ClassifierBackend>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<InferenceEngine>();
    }
};

impl InferenceEngine {
    pub fn new(backend: Box<dyn ClassifierBackend>) -> Self {
        Self { backend }
    }

    pub fn n_features(&self) -> usize {
        self.backend.n_features()
    }

    pub fn n_classes(&self) -> usize {
        self.backend.n_classes()
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Predicts the class index and the per-class probabilities.
    ///
    /// The class is the first class with the highest probability. The
    /// probabilities are returned as the backend produced them.
    pub fn predict(&self, vector: &EncodedVector) -> Result<(usize, Vec<f64>), PredictionError> {
        let probabilities = self.predict_proba(vector)?;
        let class_index = argmax(&probabilities).ok_or_else(|| {
            PredictionError::Inference("classifier returned no probabilities".into())
        })?;
        Ok((class_index, probabilities))
    }

    pub fn predict_proba(&self, vector: &EncodedVector) -> Result<Vec<f64>, PredictionError> {
        let expected = self.backend.n_features();
        if vector.len() != expected {
            return Err(PredictionError::DimensionMismatch { expected, found: vector.len() });
        }
        self.backend.predict_proba(vector.values())
    }
}

fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
