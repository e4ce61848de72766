//! A thread-safe wildfire damage risk predictor for residential structures.
//!
//! A property is described by a handful of categorical answers (vegetation
//! clearance, roof construction, eaves, ...) plus the year it was built.
//! Those answers are one-hot encoded against the column list the model was
//! trained on, run through a random forest, and mapped back to a damage
//! category with a probability for every category.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use firerisk::{ArtifactStore, PropertyForm, RiskPredictor};
//!
//! let predictor = RiskPredictor::builder()
//!     .with_artifacts(&ArtifactStore::new_default())?
//!     .build()?;
//!
//! let record = PropertyForm::new()
//!     .with("STRUCTURET_STANDARDIZED", "Mobile Home")?
//!     .with("YEARBUILT", "1975")?
//!     .to_record()?;
//!
//! let result = predictor.predict_record(&record)?;
//! println!("Predicted risk: {}", result.predicted_risk);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! The predictor is immutable after `build()` and can be shared across
//! threads using `Arc`:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use firerisk::{ArtifactStore, RiskPredictor};
//! use serde_json::json;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let predictor = Arc::new(
//!     RiskPredictor::builder()
//!         .with_artifacts(&ArtifactStore::new("artifacts"))?
//!         .build()?,
//! );
//!
//! let mut handles = vec![];
//! for year in [1950, 1990, 2020] {
//!     let predictor = Arc::clone(&predictor);
//!     handles.push(thread::spawn(move || {
//!         predictor.predict_risk(&json!({"YEARBUILT": year})).unwrap();
//!     }));
//! }
//!
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod fields;
pub mod form;
pub mod formatter;
pub mod labels;
pub mod map;
pub mod predictor;
pub mod record;
pub mod schema;
pub mod tracker;

pub use artifacts::ArtifactStore;
pub use encoder::{encode, EncodedVector};
pub use engine::{ClassifierBackend, ForestModel, InferenceEngine};
pub use error::{
    ArtifactError, FormError, InitError, LabelLoadError, ModelLoadError, PredictionError,
    SchemaLoadError,
};
pub use form::PropertyForm;
pub use formatter::{PredictionResult, Probabilities};
pub use labels::LabelMapping;
pub use map::{Coordinates, Geocoder, HeatPoint};
pub use predictor::{PredictionOutcome, PredictorInfo, RiskPredictor, RiskPredictorBuilder};
pub use record::{AttributeRecord, AttributeValue};
#[cfg(feature = "onnx")]
pub use engine::{OnnxModel, OnnxOptions};
pub use schema::FeatureSchema;
pub use tracker::{TrackerEvent, TrackerState, TrackerView};

pub fn init_logger() {
    env_logger::init();
}
