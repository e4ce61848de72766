use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::engine::ForestModel;
use crate::error::{ArtifactError, LabelLoadError, ModelLoadError, SchemaLoadError};
use crate::labels::{load_labels, LabelMapping};
use crate::schema::{load_schema, FeatureSchema};

pub const SCHEMA_FILE: &str = "feature_names.json";
pub const LABELS_FILE: &str = "label_mappings.json";
pub const FOREST_FILE: &str = "random_forest_model.json";
pub const ONNX_FILE: &str = "random_forest_model.onnx";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Environment variable overriding the default artifact directory.
pub const ARTIFACTS_ENV: &str = "FIRERISK_ARTIFACTS";

/// Locates the training artifacts on disk and checks them against an
/// optional SHA-256 manifest.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Creates a store over the default artifact directory
    pub fn new_default() -> Self {
        Self::new(Self::default_dir())
    }

    /// Returns the default artifact directory path
    pub fn default_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(ARTIFACTS_ENV) {
            return PathBuf::from(path);
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("firerisk").join("artifacts");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("firerisk").join("artifacts");
        }

        // 4. If all else fails, use system temp directory
        env::temp_dir().join("firerisk").join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn schema_path(&self) -> PathBuf {
        self.dir.join(SCHEMA_FILE)
    }

    pub fn labels_path(&self) -> PathBuf {
        self.dir.join(LABELS_FILE)
    }

    pub fn forest_path(&self) -> PathBuf {
        self.dir.join(FOREST_FILE)
    }

    pub fn onnx_path(&self) -> PathBuf {
        self.dir.join(ONNX_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// True when the schema, the labels and at least one model file exist.
    pub fn is_complete(&self) -> bool {
        let schema = self.schema_path();
        let labels = self.labels_path();
        log::info!("Checking artifacts in {:?}:", self.dir);
        log::info!("  Schema: {:?} (exists: {})", schema, schema.exists());
        log::info!("  Labels: {:?} (exists: {})", labels, labels.exists());
        schema.exists()
            && labels.exists()
            && (self.forest_path().exists() || self.onnx_path().exists())
    }

    pub fn load_schema(&self) -> Result<FeatureSchema, SchemaLoadError> {
        load_schema(self.schema_path())
    }

    pub fn load_labels(&self) -> Result<LabelMapping, LabelLoadError> {
        load_labels(self.labels_path())
    }

    pub fn load_forest(&self) -> Result<ForestModel, ModelLoadError> {
        ForestModel::load(self.forest_path())
    }

    /// Reads the manifest, if any: file name to expected SHA-256 hex digest.
    pub fn manifest(&self) -> Result<Option<BTreeMap<String, String>>, ArtifactError> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        let manifest = serde_json::from_slice(&bytes)
            .map_err(|source| ArtifactError::Manifest { path: path.clone(), source })?;
        Ok(Some(manifest))
    }

    fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ArtifactError> {
        log::info!("Verifying file: {:?}", path);
        let hash = sha256_file(path)?;
        log::debug!("Calculated hash: {}", hash);
        log::debug!("Expected hash:   {}", expected_hash);
        Ok(hash.eq_ignore_ascii_case(expected_hash))
    }

    /// Checks every file listed in the manifest.
    ///
    /// Returns `Ok(false)` when a listed file is missing or its digest
    /// differs. A store without a manifest verifies trivially.
    pub fn verify(&self) -> Result<bool, ArtifactError> {
        let Some(manifest) = self.manifest()? else {
            log::warn!("No {} in {:?}; artifacts are not verified", MANIFEST_FILE, self.dir);
            return Ok(true);
        };

        let mut all_ok = true;
        for (name, expected) in &manifest {
            let path = self.dir.join(name);
            if !path.exists() {
                log::error!("Artifact {:?} listed in manifest does not exist", path);
                all_ok = false;
                continue;
            }
            if !self.verify_file(&path, expected)? {
                log::error!("Artifact {:?} failed hash verification", path);
                all_ok = false;
            }
        }
        log::info!("Artifact verification {}", if all_ok { "passed" } else { "failed" });
        Ok(all_ok)
    }
}

/// Hex-encoded SHA-256 digest of a file.
pub fn sha256_file(path: &Path) -> Result<String, ArtifactError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_artifacts_dir() {
        env::set_var(ARTIFACTS_ENV, "/tmp/test-firerisk-artifacts");
        let path = ArtifactStore::default_dir();
        assert_eq!(path, PathBuf::from("/tmp/test-firerisk-artifacts"));
        env::remove_var(ARTIFACTS_ENV);

        let path = ArtifactStore::default_dir();
        assert!(path.to_string_lossy().contains("firerisk"));
    }

    #[test]
    fn test_artifact_paths() {
        let store = ArtifactStore::new("/srv/models");
        assert!(store.schema_path().ends_with("feature_names.json"));
        assert!(store.labels_path().ends_with("label_mappings.json"));
        assert!(store.forest_path().ends_with("random_forest_model.json"));
        assert!(store.manifest_path().ends_with("manifest.json"));
    }

    #[test]
    fn test_missing_directory_is_incomplete() {
        let store = ArtifactStore::new("/nonexistent/firerisk");
        assert!(!store.is_complete());
        assert!(store.manifest().unwrap().is_none());
        assert!(store.verify().unwrap());
    }
}
