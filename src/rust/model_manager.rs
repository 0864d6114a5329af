use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classifier::{
    feature_fingerprint, Classifier, RandomForest, TfidfVectorizer, STRUCTURAL_FEATURE_COUNT,
};

/// File name of the bundle inside a store directory.
pub const DEFAULT_BUNDLE_NAME: &str = "code_prediction_model.json";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model bundle not found: {0}")]
    NotFound(PathBuf),
    #[error("Model bundle is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("Model bundle is incompatible: expected {expected}, got {actual}")]
    Incompatible { expected: String, actual: String },
    #[error("Failed to serialize model bundle: {0}")]
    SerializeError(#[source] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

#[derive(Serialize)]
struct BundleRef<'a> {
    fingerprint: &'a str,
    vectorizer: &'a TfidfVectorizer,
    forest: &'a RandomForest,
}

#[derive(Deserialize)]
struct Bundle {
    fingerprint: String,
    vectorizer: TfidfVectorizer,
    forest: RandomForest,
}

/// Writes `classifier` to `path` as a single JSON bundle, replacing any existing file.
pub fn save_bundle(classifier: &Classifier, path: &Path) -> Result<(), ModelError> {
    let bundle = BundleRef {
        fingerprint: classifier.fingerprint(),
        vectorizer: classifier.vectorizer(),
        forest: classifier.forest(),
    };
    let bytes = serde_json::to_vec(&bundle).map_err(ModelError::SerializeError)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    log::info!("Writing {} bytes to {:?}", bytes.len(), path);
    fs::write(path, bytes)?;
    Ok(())
}

/// Reads a bundle written by `save_bundle` and checks that its vectorizer and
/// forest belong together: the fingerprint recomputed from the vectorizer must
/// match both the stored one and the one the forest recorded at training time.
pub fn load_bundle(path: &Path) -> Result<Classifier, ModelError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ModelError::NotFound(path.to_path_buf()))
        }
        Err(e) => {
            log::error!("Failed to read model bundle {:?}: {}", path, e);
            return Err(e.into());
        }
    };
    log::info!("Read {} bytes from {:?}", bytes.len(), path);

    let bundle: Bundle = serde_json::from_slice(&bytes).map_err(ModelError::Corrupt)?;

    let actual = feature_fingerprint(&bundle.vectorizer);
    if actual != bundle.fingerprint {
        log::error!("Fingerprint mismatch for {:?}", path);
        return Err(ModelError::Incompatible {
            expected: bundle.fingerprint,
            actual,
        });
    }
    if bundle.forest.fingerprint() != actual {
        log::error!("Forest in {:?} was trained on a different feature layout", path);
        return Err(ModelError::Incompatible {
            expected: actual,
            actual: bundle.forest.fingerprint().to_string(),
        });
    }
    let width = bundle.vectorizer.vocabulary_size() + STRUCTURAL_FEATURE_COUNT;
    if bundle.forest.n_features() != width {
        return Err(ModelError::Incompatible {
            expected: format!("{} input features", width),
            actual: format!("{} input features", bundle.forest.n_features()),
        });
    }

    Ok(Classifier::new(
        Arc::new(bundle.vectorizer),
        Arc::new(bundle.forest),
    ))
}

/// Keeps trained bundles in a directory.
#[derive(Debug, Clone)]
pub struct ModelStore {
    models_dir: PathBuf,
}

impl ModelStore {
    /// Creates a new ModelStore with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var("CODELANG_CACHE") {
            return PathBuf::from(path).join("models");
        }

        // 2. Use platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("codelang").join("models");
        }

        // 3. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".codelang").join("models");
        }

        // 4. If all else fails, use system temp directory (platform agnostic)
        env::temp_dir().join("codelang").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self { models_dir })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn bundle_path(&self) -> PathBuf {
        self.models_dir.join(DEFAULT_BUNDLE_NAME)
    }

    pub fn is_bundle_saved(&self) -> bool {
        let path = self.bundle_path();
        log::info!("Checking for saved bundle at {:?} (exists: {})", path, path.exists());
        path.exists()
    }

    pub fn save(&self, classifier: &Classifier) -> Result<PathBuf, ModelError> {
        let path = self.bundle_path();
        save_bundle(classifier, &path)?;
        log::info!("Model saved to {:?}", path);
        Ok(path)
    }

    pub fn load(&self) -> Result<Classifier, ModelError> {
        let classifier = load_bundle(&self.bundle_path())?;
        log::info!("Model loaded from {:?}", self.bundle_path());
        Ok(classifier)
    }

    pub fn remove_bundle(&self) -> Result<(), ModelError> {
        let path = self.bundle_path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Corpus;

    #[test]
    fn test_missing_bundle_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_bundle(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(ModelError::NotFound(_))));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"not a bundle").unwrap();
        assert!(matches!(load_bundle(&path), Err(ModelError::Corrupt(_))));
    }

    #[test]
    fn test_store_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = ModelStore::new(dir.path().join("models"))?;
        assert!(!store.is_bundle_saved());

        let (classifier, _) = Classifier::builder().with_corpus(Corpus::demo()).build()?;
        let path = store.save(&classifier)?;
        assert!(path.ends_with(DEFAULT_BUNDLE_NAME));
        assert!(store.is_bundle_saved());

        let loaded = store.load()?;
        assert_eq!(loaded.fingerprint(), classifier.fingerprint());

        store.remove_bundle()?;
        assert!(!store.is_bundle_saved());
        Ok(())
    }

    #[test]
    fn test_default_models_dir() {
        env::set_var("CODELANG_CACHE", "/tmp/codelang-test-cache");
        let path = ModelStore::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("/tmp/codelang-test-cache/models"));
        env::remove_var("CODELANG_CACHE");

        let path = ModelStore::get_default_models_dir();
        assert!(path.to_str().unwrap().contains("models"));
    }
}
