use log::{error, info};

use super::predictor::RiskPredictor;
use crate::artifacts::ArtifactStore;
use crate::engine::{ClassifierBackend, InferenceEngine};
use crate::error::{InitError, ModelLoadError};
use crate::labels::LabelMapping;
use crate::schema::FeatureSchema;
#[cfg(feature = "onnx")]
use crate::engine::OnnxOptions;

/// A builder for constructing a [`RiskPredictor`] with a fluent interface.
///
/// All artifacts are loaded and cross-checked inside the builder, so a
/// successfully built predictor is ready to serve.
#[derive(Default, Debug)]
pub struct RiskPredictorBuilder {
    artifacts_dir: Option<String>,
    schema: Option<FeatureSchema>,
    labels: Option<LabelMapping>,
    backend: Option<Box<dyn ClassifierBackend>>,
    verify: bool,
    #[cfg(feature = "onnx")]
    onnx_options: OnnxOptions,
}

impl RiskPredictorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the artifact manifest to verify before loading.
    pub fn verify_artifacts(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Sets the ONNX Runtime configuration used when loading an ONNX model.
    #[cfg(feature = "onnx")]
    pub fn with_onnx_options(mut self, options: OnnxOptions) -> Self {
        self.onnx_options = options;
        self
    }

    /// Loads schema, labels and model from an artifact store.
    ///
    /// The JSON forest export is preferred; with the `onnx` feature an
    /// ONNX export is used when no JSON forest is present.
    pub fn with_artifacts(mut self, store: &ArtifactStore) -> Result<Self, InitError> {
        if self.verify && !store.verify()? {
            error!("Artifacts in {:?} failed verification", store.dir());
            return Err(InitError::Unverified(store.dir().to_path_buf()));
        }

        let schema = store.load_schema()?;
        let labels = store.load_labels()?;
        let backend = self.load_backend(store, &schema, &labels)?;

        self.artifacts_dir = Some(store.dir().to_string_lossy().to_string());
        self.schema = Some(schema);
        self.labels = Some(labels);
        self.backend = Some(backend);
        Ok(self)
    }

    #[cfg(not(feature = "onnx"))]
    fn load_backend(
        &self,
        store: &ArtifactStore,
        _schema: &FeatureSchema,
        _labels: &LabelMapping,
    ) -> Result<Box<dyn ClassifierBackend>, InitError> {
        Ok(Box::new(store.load_forest()?))
    }

    #[cfg(feature = "onnx")]
    fn load_backend(
        &self,
        store: &ArtifactStore,
        schema: &FeatureSchema,
        labels: &LabelMapping,
    ) -> Result<Box<dyn ClassifierBackend>, InitError> {
        if store.forest_path().exists() || !store.onnx_path().exists() {
            return Ok(Box::new(store.load_forest()?));
        }
        let model = crate::engine::OnnxModel::load(
            store.onnx_path(),
            &self.onnx_options,
            schema.len(),
            labels.len(),
        )?;
        Ok(Box::new(model))
    }

    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_labels(mut self, labels: LabelMapping) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn with_backend(mut self, backend: Box<dyn ClassifierBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Builds the predictor.
    ///
    /// Fails when an artifact is missing or when the model's input width
    /// differs from the schema. The label count is checked per prediction,
    /// not here.
    pub fn build(self) -> Result<RiskPredictor, InitError> {
        let schema = self.schema.ok_or(InitError::Missing("feature schema"))?;
        let labels = self.labels.ok_or(InitError::Missing("label mapping"))?;
        let backend = self.backend.ok_or(InitError::Missing("classifier model"))?;

        if backend.n_features() != schema.len() {
            error!(
                "Model expects {} features, schema has {}",
                backend.n_features(),
                schema.len()
            );
            return Err(ModelLoadError::WidthMismatch {
                expected: schema.len(),
                found: backend.n_features(),
            }
            .into());
        }

        let engine = InferenceEngine::new(backend);
        info!(
            "Risk predictor ready: {} features, {} labels, {}",
            schema.len(),
            labels.len(),
            engine.describe()
        );
        Ok(RiskPredictor::new(self.artifacts_dir, schema, labels, engine))
    }
}
