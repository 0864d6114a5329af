//! Bagged ensemble of `gbdt` regression trees.
//!
//! Every estimator is fitted on its own seeded bootstrap sample of the
//! training rows. Within an estimator there is one tree per class, trained
//! with squared-error loss against a 0/1 class indicator, so each leaf holds
//! the share of that class among the rows that reached it. An estimator's
//! outputs are normalized into a class distribution, and the forest's
//! probabilities are the mean of those distributions.
//!
//! Note: the gbdt crate works in `f32` (`ValueType`). Distributions are
//! accumulated in `f64`.

use std::fmt;

use gbdt::config::Config;
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;
use log::{debug, info};
use ndarray::{Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::{argmax, average_vectors};
use crate::config::ForestConfig;

/// One bootstrap estimator: a single-tree `GBDT` per class.
#[derive(Serialize, Deserialize)]
struct Estimator {
    per_class: Vec<GBDT>,
}

impl Estimator {
    /// Class distribution for one sample, aligned with the forest's classes.
    fn distribution(&self, sample: &[f32]) -> Vec<f64> {
        let data = vec![Data::new_test_data(sample.to_vec(), None)];
        let mut scores: Vec<f64> = self
            .per_class
            .iter()
            .map(|model| {
                let raw = model.predict(&data).first().copied().unwrap_or(0.0_f32) as f64;
                raw.clamp(0.0, 1.0)
            })
            .collect();

        let total: f64 = scores.iter().sum();
        if total > 0.0 {
            scores.iter_mut().for_each(|s| *s /= total);
        } else {
            let n = scores.len() as f64;
            scores.iter_mut().for_each(|s| *s = 1.0 / n);
        }
        scores
    }
}

fn tree_config(n_features: usize, config: &ForestConfig) -> Config {
    let mut cfg = Config::new();
    cfg.set_feature_size(n_features);
    cfg.set_max_depth(u32::try_from(config.max_depth).unwrap_or(u32::MAX));
    cfg.set_iterations(1);
    cfg.set_shrinkage(1.0);
    cfg.set_loss("SquaredError");
    cfg.set_debug(false);
    cfg.set_training_optimization_level(2);
    cfg.set_min_leaf_size(config.min_leaf_size);
    cfg
}

/// Bootstrap ensemble over a fixed, sorted label set.
///
/// The forest also records the fingerprint of the feature layout it was
/// trained against, so a bundle can tell whether it is paired with the right
/// vectorizer.
#[derive(Serialize, Deserialize)]
pub struct RandomForest {
    classes: Vec<String>,
    n_features: usize,
    fingerprint: String,
    estimators: Vec<Estimator>,
}

impl fmt::Debug for RandomForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomForest")
            .field("classes", &self.classes)
            .field("n_features", &self.n_features)
            .field("fingerprint", &self.fingerprint)
            .field("n_trees", &self.estimators.len())
            .finish()
    }
}

impl RandomForest {
    /// Fits the forest on `features` (one row per sample) and string `labels`.
    ///
    /// # Errors
    /// - `ValidationError` if rows and labels disagree in count or there are no rows
    /// - `ConfigurationError` if fewer than two distinct labels are present
    pub fn fit<S: AsRef<str>>(
        features: &Array2<f32>,
        labels: &[S],
        config: &ForestConfig,
    ) -> Result<Self, ClassifierError> {
        if features.nrows() != labels.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Feature rows ({}) and labels ({}) differ in count",
                features.nrows(),
                labels.len()
            )));
        }
        if features.nrows() == 0 {
            return Err(ClassifierError::ValidationError(
                "Cannot fit a forest on zero samples".into(),
            ));
        }

        let mut classes: Vec<String> = labels.iter().map(|l| l.as_ref().to_string()).collect();
        classes.sort();
        classes.dedup();
        if classes.len() < 2 {
            return Err(ClassifierError::ConfigurationError(format!(
                "Need at least 2 distinct labels to train, found {}",
                classes.len()
            )));
        }

        let targets: Vec<usize> = labels
            .iter()
            .map(|l| {
                classes
                    .binary_search_by(|c| c.as_str().cmp(l.as_ref()))
                    .map_err(|_| ClassifierError::BuildError(format!("Unknown label '{}'", l.as_ref())))
            })
            .collect::<Result<_, _>>()?;

        let n_samples = features.nrows();
        let rows: Vec<Vec<f32>> = features.outer_iter().map(|row| row.to_vec()).collect();
        let cfg = tree_config(features.ncols(), config);

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut estimators = Vec::with_capacity(config.n_estimators);
        for t in 0..config.n_estimators {
            // Bootstrap multiplicities become per-row weights.
            let mut counts = vec![0_u32; n_samples];
            for _ in 0..n_samples {
                counts[rng.random_range(0..n_samples)] += 1;
            }

            let per_class = (0..classes.len())
                .map(|class| {
                    let mut training_data: Vec<Data> = counts
                        .iter()
                        .enumerate()
                        .filter(|(_, count)| **count > 0)
                        .map(|(r, &count)| {
                            let indicator = if targets[r] == class { 1.0_f32 } else { 0.0_f32 };
                            Data::new_training_data(rows[r].clone(), count as f32, indicator, None)
                        })
                        .collect();
                    let mut model = GBDT::new(&cfg);
                    model.fit(&mut training_data);
                    model
                })
                .collect();

            debug!(
                "Estimator {}/{}: {} distinct bootstrap rows",
                t + 1,
                config.n_estimators,
                counts.iter().filter(|&&c| c > 0).count()
            );
            estimators.push(Estimator { per_class });
        }

        info!(
            "Fitted random forest: {} trees over {} samples x {} features, {} classes",
            estimators.len(),
            n_samples,
            features.ncols(),
            classes.len()
        );

        Ok(Self {
            classes,
            n_features: features.ncols(),
            fingerprint: String::new(),
            estimators,
        })
    }

    /// Records the fingerprint of the feature layout the forest was trained on.
    pub(crate) fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    /// Mean estimator distribution, aligned with `classes()`.
    pub fn predict_proba(&self, sample: ArrayView1<f32>) -> Result<Vec<f64>, ClassifierError> {
        if sample.len() != self.n_features {
            return Err(ClassifierError::PredictionError(format!(
                "Expected {} features, got {}",
                self.n_features,
                sample.len()
            )));
        }
        if self.estimators.is_empty() {
            return Err(ClassifierError::PredictionError("Forest has no trees".into()));
        }
        if let Some(bad) = self.estimators.iter().find(|e| e.per_class.len() != self.classes.len()) {
            return Err(ClassifierError::PredictionError(format!(
                "Estimator has {} class trees for {} classes",
                bad.per_class.len(),
                self.classes.len()
            )));
        }

        let sample = sample.to_vec();
        let distributions: Vec<Vec<f64>> = self
            .estimators
            .iter()
            .map(|estimator| estimator.distribution(&sample))
            .collect();
        let refs: Vec<&[f64]> = distributions.iter().map(Vec::as_slice).collect();
        Ok(average_vectors(&refs, self.classes.len()))
    }

    /// Most probable label for `sample`; ties go to the first label in sorted order.
    pub fn predict(&self, sample: ArrayView1<f32>) -> Result<&str, ClassifierError> {
        let proba = self.predict_proba(sample)?;
        argmax(&proba)
            .map(|i| self.classes[i].as_str())
            .ok_or_else(|| ClassifierError::PredictionError("Forest has no classes".into()))
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.estimators.len()
    }

    /// Fingerprint of the feature layout seen at training time; empty if never set.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_estimators: 15,
            max_depth: 5,
            min_leaf_size: 1,
            seed: 7,
        }
    }

    #[test]
    fn test_separable_data() {
        let x = array![[0.0f32, 1.0], [0.1, 1.0], [0.2, 0.0], [5.0, 0.0], [5.1, 1.0], [5.2, 0.0]];
        let y = ["low", "low", "low", "high", "high", "high"];
        let forest = RandomForest::fit(&x, &y, &small_config()).unwrap();
        assert_eq!(forest.classes(), &["high".to_string(), "low".to_string()]);
        assert_eq!(forest.predict(array![0.05f32, 0.5].view()).unwrap(), "low");
        assert_eq!(forest.predict(array![6.0f32, 0.5].view()).unwrap(), "high");
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let x = array![[0.0f32], [1.0], [2.0], [3.0]];
        let y = ["a", "b", "a", "b"];
        let forest = RandomForest::fit(&x, &y, &small_config()).unwrap();
        let proba = forest.predict_proba(array![1.5f32].view()).unwrap();
        assert_eq!(proba.len(), 2);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_adjacent_values_give_valid_distribution() {
        let a = 1.0f32;
        let b = f32::from_bits(a.to_bits() + 1);
        let x = array![[a], [a], [b], [b]];
        let y = ["left", "left", "right", "right"];
        let forest = RandomForest::fit(&x, &y, &small_config()).unwrap();
        for value in [a, b] {
            let proba = forest.predict_proba(array![value].view()).unwrap();
            assert!(proba.iter().all(|p| p.is_finite()));
            assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_single_class_is_rejected() {
        let x = array![[0.0f32], [1.0]];
        let y = ["a", "a"];
        assert!(matches!(
            RandomForest::fit(&x, &y, &small_config()),
            Err(ClassifierError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_same_seed_same_forest() {
        let x = array![[0.0f32, 2.0], [1.0, 0.0], [2.0, 1.0], [3.0, 3.0]];
        let y = ["a", "b", "a", "b"];
        let first = RandomForest::fit(&x, &y, &small_config()).unwrap();
        let second = RandomForest::fit(&x, &y, &small_config()).unwrap();
        for point in [array![0.5f32, 1.0], array![2.5f32, 2.0], array![9.0f32, 0.0]] {
            assert_eq!(
                first.predict_proba(point.view()).unwrap(),
                second.predict_proba(point.view()).unwrap()
            );
        }
    }

    #[test]
    fn test_fingerprint_is_recorded() {
        let x = array![[0.0f32], [1.0]];
        let y = ["a", "b"];
        let forest = RandomForest::fit(&x, &y, &small_config()).unwrap();
        assert_eq!(forest.fingerprint(), "");
        assert_eq!(forest.with_fingerprint("abc").fingerprint(), "abc");
    }

    #[test]
    fn test_wrong_width_is_rejected() {
        let x = array![[0.0f32], [1.0]];
        let y = ["a", "b"];
        let forest = RandomForest::fit(&x, &y, &small_config()).unwrap();
        assert!(forest.predict_proba(array![1.0f32, 2.0].view()).is_err());
    }
}
