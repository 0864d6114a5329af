use std::collections::HashMap;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::error::ClassifierError;
use super::features::{FeatureAssembler, STRUCTURAL_FEATURE_NAMES};
use super::forest::RandomForest;
use super::vectorizer::TfidfVectorizer;

/// A trained source-language classifier: the fitted vectorizer paired with the
/// forest that was trained on its output.
///
/// The classifier is immutable once built, so it is `Send + Sync` and can be
/// shared behind an `Arc`.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use codelang::{Classifier, Corpus};
///
/// let (classifier, _report) = Classifier::builder()
///     .with_corpus(Corpus::demo())
///     .build()?;
///
/// let (label, scores) = classifier.predict("def hello_world():\n    print('Hello, World!')")?;
/// assert_eq!(label, "python");
/// assert_eq!(scores.len(), 4);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    vectorizer: Arc<TfidfVectorizer>,
    forest: Arc<RandomForest>,
    fingerprint: String,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl FeatureAssembler for Classifier {
    fn vectorizer(&self) -> Option<&TfidfVectorizer> {
        Some(self.vectorizer.as_ref())
    }
}

impl Classifier {
    pub(crate) fn new(vectorizer: Arc<TfidfVectorizer>, forest: Arc<RandomForest>) -> Self {
        let fingerprint = feature_fingerprint(&vectorizer);
        Self {
            vectorizer,
            forest,
            fingerprint,
        }
    }

    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Returns information about the classifier's current state
    pub fn info(&self) -> super::ClassifierInfo {
        super::ClassifierInfo {
            num_classes: self.forest.classes().len(),
            class_labels: self.forest.classes().to_vec(),
            vocabulary_size: self.vectorizer.vocabulary_size(),
            feature_width: self.forest.n_features(),
            num_trees: self.forest.n_trees(),
            fingerprint: self.fingerprint.clone(),
        }
    }

    /// Predicts the language of `code`.
    ///
    /// Returns the most probable label and the probability of every known
    /// label; the probabilities sum to 1.
    pub fn predict(&self, code: &str) -> Result<(String, HashMap<String, f32>), ClassifierError> {
        if code.is_empty() {
            return Err(ClassifierError::ValidationError("Input code cannot be empty".into()));
        }

        let features = self.assemble(code)?;
        let proba = self.forest.predict_proba(features.view())?;

        let classes = self.forest.classes();
        let scores: HashMap<String, f32> = classes
            .iter()
            .cloned()
            .zip(proba.iter().map(|&p| p as f32))
            .collect();

        let best_class = super::utils::argmax(&proba)
            .and_then(|i| classes.get(i).cloned())
            .ok_or_else(|| {
                ClassifierError::PredictionError("Forest returned no class probabilities".into())
            })?;

        Ok((best_class, scores))
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    /// SHA-256 over the feature layout this classifier was trained against.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Hashes everything that determines the meaning of each input column: the
/// analyzer settings, every vocabulary entry with its column and IDF weight,
/// and the structural feature names.
pub(crate) fn feature_fingerprint(vectorizer: &TfidfVectorizer) -> String {
    let mut hasher = Sha256::new();
    let config = vectorizer.config();
    hasher.update(format!(
        "ngram={}-{};lowercase={};max_features={}\n",
        config.ngram_range.0, config.ngram_range.1, config.lowercase, config.max_features
    ));
    let idf = vectorizer.idf();
    for (term, &column) in vectorizer.vocabulary() {
        let weight = idf.get(column).map(|w| w.to_bits()).unwrap_or(u32::MAX);
        hasher.update(term.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(column.to_le_bytes());
        hasher.update(weight.to_le_bytes());
    }
    hasher.update(STRUCTURAL_FEATURE_NAMES.join(",").as_bytes());
    format!("{:x}", hasher.finalize())
}
