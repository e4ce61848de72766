use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use log::{error, info};
use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, ValueType};

use super::ClassifierBackend;
use crate::error::{ModelLoadError, PredictionError};

/// Outcome of the one-time ONNX Runtime environment setup, shared by every load.
static ENVIRONMENT: OnceLock<Result<(), String>> = OnceLock::new();

/// Session settings for the ONNX classifier backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnnxOptions {
    /// Threads used inside one inference call; 0 lets ONNX Runtime decide
    pub intra_threads: usize,
    /// Apply all graph optimizations when the session is created
    pub optimize_graph: bool,
}

impl Default for OnnxOptions {
    fn default() -> Self {
        // One row per call.
        Self { intra_threads: 1, optimize_graph: true }
    }
}

fn environment() -> Result<(), ModelLoadError> {
    ENVIRONMENT
        .get_or_init(|| {
            ort::init()
                .with_name("firerisk")
                .commit()
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(|e| {
            error!("ONNX Runtime environment is unavailable: {}", e);
            ModelLoadError::Backend(e)
        })
}

fn open_session(path: &Path, options: &OnnxOptions) -> Result<Session, ModelLoadError> {
    environment()?;
    let backend = |e: ort::Error| ModelLoadError::Backend(e.to_string());

    let level = if options.optimize_graph {
        GraphOptimizationLevel::Level3
    } else {
        GraphOptimizationLevel::Disable
    };
    let mut builder = Session::builder()
        .map_err(backend)?
        .with_optimization_level(level)
        .map_err(backend)?;
    if options.intra_threads > 0 {
        builder = builder.with_intra_threads(options.intra_threads).map_err(backend)?;
    }
    builder.commit_from_file(path).map_err(|e| {
        error!("Failed to load ONNX model at {:?}: {}", path, e);
        backend(e)
    })
}

/// A classifier exported with `skl2onnx` (`zipmap=False`).
///
/// The graph takes one `f32` input of shape `[batch, n_features]` and emits
/// the predicted label followed by a `[batch, n_classes]` probability tensor.
#[derive(Debug)]
pub struct OnnxModel {
    session: Session,
    input_name: String,
    n_features: usize,
    n_classes: usize,
}

impl OnnxModel {
    /// Loads the model, checking any static input/output dimensions against
    /// the expected feature and class counts.
    pub fn load(
        path: impl AsRef<Path>,
        options: &OnnxOptions,
        n_features: usize,
        n_classes: usize,
    ) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let session = open_session(path, options)?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| ModelLoadError::Backend("model has no inputs".into()))?;
        if session.outputs.len() < 2 {
            return Err(ModelLoadError::Backend(format!(
                "model must expose label and probability outputs, found {}",
                session.outputs.len()
            )));
        }

        if let Some(width) = static_dim(&input.input_type, 1) {
            if width != n_features {
                return Err(ModelLoadError::WidthMismatch { expected: n_features, found: width });
            }
        }
        if let Some(classes) = static_dim(&session.outputs[1].output_type, 1) {
            if classes != n_classes {
                return Err(ModelLoadError::Backend(format!(
                    "model outputs {} classes, expected {}",
                    classes, n_classes
                )));
            }
        }

        let input_name = input.name.clone();
        info!("Loaded ONNX classifier from {:?} (input '{}')", path, input_name);
        Ok(Self { session, input_name, n_features, n_classes })
    }
}

fn static_dim(value_type: &ValueType, axis: usize) -> Option<usize> {
    match value_type {
        ValueType::Tensor { dimensions, .. } => {
            dimensions.get(axis).and_then(|&d| usize::try_from(d).ok())
        }
        _ => None,
    }
}

impl ClassifierBackend for OnnxModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn describe(&self) -> String {
        format!("onnx classifier (input '{}')", self.input_name)
    }

    fn predict_proba(&self, features: &[f32]) -> Result<Vec<f64>, PredictionError> {
        let inference =
            |what: &str, e: String| PredictionError::Inference(format!("{}: {}", what, e));

        let input_array = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| inference("Failed to create input array", e.to_string()))?;
        let input_dyn = input_array.into_dyn();
        let input = input_dyn.as_standard_layout();

        let mut input_tensors = HashMap::new();
        input_tensors.insert(
            self.input_name.as_str(),
            Tensor::from_array(&input)
                .map_err(|e| inference("Failed to create input tensor", e.to_string()))?,
        );

        let outputs = self
            .session
            .run(input_tensors)
            .map_err(|e| inference("Failed to run model", e.to_string()))?;
        let probabilities = outputs[1]
            .try_extract_tensor::<f32>()
            .map_err(|e| inference("Failed to extract probabilities", e.to_string()))?;

        Ok(probabilities.iter().map(|&p| f64::from(p)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_outcome_is_shared() {
        let first = environment().map_err(|e| e.to_string());
        let second = environment().map_err(|e| e.to_string());
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_model_file() {
        let path = std::env::temp_dir().join("firerisk-missing-model.onnx");
        let err = OnnxModel::load(&path, &OnnxOptions::default(), 33, 5).unwrap_err();
        assert!(matches!(err, ModelLoadError::Backend(_)));
    }

    #[test]
    fn test_garbage_model_file() {
        let name = format!("firerisk-garbage-{}.onnx", std::process::id());
        let path = std::env::temp_dir().join(name);
        std::fs::write(&path, b"not an onnx graph").unwrap();
        let options = OnnxOptions { intra_threads: 0, optimize_graph: false };
        let err = OnnxModel::load(&path, &options, 33, 5).unwrap_err();
        assert!(matches!(err, ModelLoadError::Backend(_)));
        let _ = std::fs::remove_file(path);
    }
}
