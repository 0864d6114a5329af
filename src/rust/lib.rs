//! A source-code language classifier built from character n-gram TF-IDF
//! features, keyword/punctuation counts and a random forest.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use codelang::{Classifier, Corpus};
//!
//! let (classifier, report) = Classifier::builder()
//!     .with_corpus(Corpus::demo())
//!     .build()?;
//! println!("Test accuracy: {:.2}%", report.accuracy * 100.0);
//!
//! let (label, scores) = classifier.predict("def f(x):\n    return x * 2")?;
//! println!("Predicted language: {}", label);
//! println!("Confidence scores: {:?}", scores);
//! # Ok(())
//! # }
//! ```
//!
//! # Persistence
//!
//! A trained classifier is saved as one JSON bundle holding the vectorizer,
//! the forest and a fingerprint of the feature layout. Loading rejects a
//! bundle whose parts do not match.
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use codelang::{save_bundle, load_bundle, Classifier, Corpus};
//!
//! let (classifier, _) = Classifier::builder().with_corpus(Corpus::demo()).build()?;
//! let path = std::env::temp_dir().join("codelang-doc-bundle.json");
//! save_bundle(&classifier, &path)?;
//! let loaded = load_bundle(&path)?;
//! assert_eq!(loaded.fingerprint(), classifier.fingerprint());
//! # std::fs::remove_file(&path)?;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod model_manager;
pub mod predictor;

pub use classifier::{
    extract_structural_features, ClassMetrics, Classifier, ClassifierBuilder, ClassifierError,
    ClassifierInfo, EvaluationReport, RandomForest, TfidfVectorizer,
};
pub use config::{ForestConfig, TrainingConfig, VectorizerConfig};
pub use dataset::{Corpus, Sample};
pub use model_manager::{load_bundle, save_bundle, ModelError, ModelStore};
pub use predictor::{ranked_scores, CodePredictor, PredictorError, TestOutcome, TestSummary};

pub fn init_logger() {
    env_logger::init();
}
