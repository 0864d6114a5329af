use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

/// Settings for the character n-gram TF-IDF vectorizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Upper bound on the vocabulary size, keeping the most frequent n-grams
    pub max_features: usize,
    /// Inclusive range of n-gram lengths, in characters
    pub ngram_range: (usize, usize),
    /// Lower-case text before extracting n-grams
    pub lowercase: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 1000,
            ngram_range: (1, 3),
            lowercase: true,
        }
    }
}

/// Hyperparameters of the random forest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    /// Smallest number of rows a tree leaf may hold
    pub min_leaf_size: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 20,
            min_leaf_size: 1,
            seed: 42,
        }
    }
}

/// Everything a training run needs besides the corpus itself.
///
/// The defaults reproduce the reference hyperparameters, so two runs over the
/// same corpus with `TrainingConfig::default()` produce identical bundles.
///
/// # Example
/// ```
/// use codelang::TrainingConfig;
///
/// let mut config = TrainingConfig::default();
/// config.forest.n_estimators = 25;
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub vectorizer: VectorizerConfig,
    pub forest: ForestConfig,
    /// Fraction of each label's samples held out for evaluation
    pub test_size: f32,
    pub split_seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerConfig::default(),
            forest: ForestConfig::default(),
            test_size: 0.2,
            split_seed: 42,
        }
    }
}

impl TrainingConfig {
    /// Checks that every parameter is usable before any fitting starts.
    pub fn validate(&self) -> Result<(), ClassifierError> {
        let (min_n, max_n) = self.vectorizer.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::ValidationError(format!(
                "Invalid n-gram range ({}, {})",
                min_n, max_n
            )));
        }
        if self.vectorizer.max_features == 0 {
            return Err(ClassifierError::ValidationError(
                "max_features must be at least 1".into(),
            ));
        }
        if self.forest.n_estimators == 0 {
            return Err(ClassifierError::ValidationError(
                "n_estimators must be at least 1".into(),
            ));
        }
        if self.forest.max_depth == 0 {
            return Err(ClassifierError::ValidationError(
                "max_depth must be at least 1".into(),
            ));
        }
        if self.forest.min_leaf_size == 0 {
            return Err(ClassifierError::ValidationError(
                "min_leaf_size must be at least 1".into(),
            ));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ClassifierError::ValidationError(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }
}
