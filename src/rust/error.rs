use std::io;
use std::path::PathBuf;

/// Errors raised while loading the ordered feature column list.
#[derive(Debug, thiserror::Error)]
pub enum SchemaLoadError {
    #[error("Failed to read schema file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Schema file {path:?} is not a JSON array of column names: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Feature schema is empty; a trained model has at least one feature")]
    Empty,
    #[error("Duplicate feature column '{0}'")]
    DuplicateColumn(String),
    #[error("Feature column '{0}' does not match any known input field (encoding version {1})")]
    UnrecognizedColumn(String, u8),
}

/// Errors raised while loading the class index to risk label table.
#[derive(Debug, thiserror::Error)]
pub enum LabelLoadError {
    #[error("Failed to read label file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Label file {path:?} is not a JSON array of strings: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Label mapping is empty")]
    Empty,
    #[error("Label at index {0} is blank")]
    BlankLabel(usize),
    #[error("Duplicate label '{0}'")]
    DuplicateLabel(String),
}

/// Errors raised while loading the trained classifier.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Failed to read model file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Model file {path:?} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Model contains no trees")]
    NoTrees,
    #[error("Model declares {0} classes; at least one is required")]
    NoClasses(usize),
    #[error("Tree {tree} is invalid: {reason}")]
    InvalidTree { tree: usize, reason: String },
    #[error("Model expects {found} features but the schema declares {expected}")]
    WidthMismatch { expected: usize, found: usize },
    #[error("Model backend error: {0}")]
    Backend(String),
}

/// Errors raised by the artifact store outside of parsing.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Manifest {path:?} is malformed: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Startup failure: the predictor must not serve without all three artifacts.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Schema(#[from] SchemaLoadError),
    #[error(transparent)]
    Labels(#[from] LabelLoadError),
    #[error(transparent)]
    Model(#[from] ModelLoadError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Artifacts in {0:?} do not match their manifest")]
    Unverified(PathBuf),
    #[error("{0} must be set before building the predictor")]
    Missing(&'static str),
}

/// Per-request failures. Recoverable: the caller gets a failed prediction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictionError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("Encoded vector has {found} columns, the schema declares {expected}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Got {probabilities} probabilities for {labels} labels (class {class_index})")]
    LabelCountMismatch {
        labels: usize,
        probabilities: usize,
        class_index: usize,
    },
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl PredictionError {
    /// Stable tag used in serialized failure outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRecord(_) => "invalid_record",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::LabelCountMismatch { .. } => "label_count_mismatch",
            Self::Inference(_) => "inference",
        }
    }
}

/// Typed form validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),
    #[error("'{value}' is not a valid choice for {field}")]
    InvalidChoice { field: &'static str, value: String },
    #[error("{field} must be a whole number between {min} and {max}, got '{value}'")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: i32,
        max: i32,
    },
}
