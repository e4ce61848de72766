use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{error, info};

use crate::error::LabelLoadError;

/// Risk category names, indexed by classifier output class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMapping {
    labels: Vec<String>,
}

impl LabelMapping {
    pub fn new(labels: Vec<String>) -> Result<Self, LabelLoadError> {
        if labels.is_empty() {
            return Err(LabelLoadError::Empty);
        }
        let mut seen = HashSet::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            if label.trim().is_empty() {
                return Err(LabelLoadError::BlankLabel(i));
            }
            if !seen.insert(label.as_str()) {
                return Err(LabelLoadError::DuplicateLabel(label.clone()));
            }
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, class_index: usize) -> Option<&str> {
        self.labels.get(class_index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

/// Loads the label table from a JSON array of strings.
pub fn load_labels(path: impl AsRef<Path>) -> Result<LabelMapping, LabelLoadError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| {
        error!("Failed to read label mapping at {:?}: {}", path, source);
        LabelLoadError::Io { path: path.to_path_buf(), source }
    })?;
    let labels: Vec<String> = serde_json::from_slice(&bytes)
        .map_err(|source| LabelLoadError::Parse { path: path.to_path_buf(), source })?;

    let mapping = LabelMapping::new(labels)?;
    info!("Loaded label mappings: {:?}", mapping.labels);
    Ok(mapping)
}
