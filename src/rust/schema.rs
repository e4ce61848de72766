use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{error, info};
use sha2::{Digest, Sha256};

use crate::error::SchemaLoadError;
use crate::fields::{self, ENCODING_VERSION};

/// The ordered feature columns the classifier was trained on.
///
/// Built once and never mutated; the column order defines the layout of
/// every vector handed to the inference engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    columns: Vec<String>,
    index: HashMap<String, usize>,
}

impl FeatureSchema {
    /// Compiles a column list into a schema.
    ///
    /// Fails on an empty list, a duplicate column, or a column the field
    /// table cannot explain.
    pub fn new(columns: Vec<String>) -> Result<Self, SchemaLoadError> {
        if columns.is_empty() {
            return Err(SchemaLoadError::Empty);
        }

        let mut index = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if fields::owning_field(column).is_none() {
                return Err(SchemaLoadError::UnrecognizedColumn(column.clone(), ENCODING_VERSION));
            }
            if index.insert(column.clone(), position).is_some() {
                return Err(SchemaLoadError::DuplicateColumn(column.clone()));
            }
        }

        Ok(Self { columns, index })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of a column, if the model was trained with it.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    /// Number of schema columns owned by each field.
    pub fn columns_per_field(&self) -> Vec<(&'static str, usize)> {
        fields::FIELDS
            .iter()
            .map(|spec| {
                let count = self
                    .columns
                    .iter()
                    .filter(|c| fields::owning_field(c).map(|f| f.name) == Some(spec.name))
                    .count();
                (spec.name, count)
            })
            .collect()
    }

    /// SHA-256 over the ordered column names and the encoding version.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update([ENCODING_VERSION]);
        for column in &self.columns {
            hasher.update(column.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Loads the schema from a JSON array of column names.
pub fn load_schema(path: impl AsRef<Path>) -> Result<FeatureSchema, SchemaLoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| {
        error!("Failed to read feature schema at {:?}: {}", path, source);
        SchemaLoadError::Io { path: path.to_path_buf(), source }
    })?;
    let columns: Vec<String> = serde_json::from_slice(&bytes)
        .map_err(|source| SchemaLoadError::Parse { path: path.to_path_buf(), source })?;

    let schema = FeatureSchema::new(columns)?;
    info!("Loaded feature schema with {} columns from {:?}", schema.len(), path);
    Ok(schema)
}
