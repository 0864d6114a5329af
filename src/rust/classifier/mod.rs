mod builder;
#[allow(clippy::module_inception)]
mod classifier;
mod error;
pub mod evaluation;
pub mod features;
pub mod forest;
mod utils;
pub mod vectorizer;

pub use builder::ClassifierBuilder;
pub use classifier::Classifier;
pub(crate) use classifier::feature_fingerprint;
pub use error::ClassifierError;
pub use evaluation::{ClassMetrics, EvaluationReport};
pub use features::{extract_structural_features, STRUCTURAL_FEATURE_COUNT};
pub use forest::RandomForest;
pub use vectorizer::TfidfVectorizer;

/// Snapshot of a trained classifier's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierInfo {
    pub num_classes: usize,
    /// Known labels in sorted order
    pub class_labels: Vec<String>,
    pub vocabulary_size: usize,
    /// Vocabulary size plus the structural features
    pub feature_width: usize,
    pub num_trees: usize,
    pub fingerprint: String,
}
