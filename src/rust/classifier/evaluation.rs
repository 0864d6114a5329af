use std::collections::BTreeMap;
use std::fmt;

use log::warn;
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::error::ClassifierError;

/// Row indices of a stratified train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StratifiedSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Splits sample indices so that every label lands in both subsets.
///
/// Each label contributes `round(count * test_size)` test rows, clamped to
/// `[1, count - 1]`. Rows are drawn by a seeded shuffle per label, so the
/// partition is reproducible for a given seed.
///
/// The held-out share is therefore not fixed when labels are small: ten labels
/// with two samples each put half the rows in the test set. A warning is
/// logged whenever the realized test size differs from
/// `round(len * test_size)`.
///
/// # Errors
/// - `ConfigurationError` if fewer than two distinct labels are present
/// - `ConfigurationError` if any label has fewer than two samples
pub fn stratified_split<S: AsRef<str>>(
    labels: &[S],
    test_size: f32,
    seed: u64,
) -> Result<StratifiedSplit, ClassifierError> {
    let mut by_label: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_label.entry(label.as_ref()).or_default().push(i);
    }

    if by_label.len() < 2 {
        return Err(ClassifierError::ConfigurationError(format!(
            "Need at least 2 distinct labels for a stratified split, found {}",
            by_label.len()
        )));
    }
    if let Some((label, rows)) = by_label.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(ClassifierError::ConfigurationError(format!(
            "Label '{}' has {} sample(s); at least 2 are needed to appear in both train and test sets",
            label,
            rows.len()
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut split = StratifiedSplit {
        train: Vec::new(),
        test: Vec::new(),
    };
    for rows in by_label.values_mut() {
        rows.shuffle(&mut rng);
        let n = rows.len();
        let n_test = ((n as f32 * test_size).round() as usize).clamp(1, n - 1);
        split.test.extend_from_slice(&rows[..n_test]);
        split.train.extend_from_slice(&rows[n_test..]);
    }
    let requested = (labels.len() as f32 * test_size).round() as usize;
    if split.test.len() != requested {
        warn!(
            "Stratified split holds out {} of {} rows ({} requested by test_size {})",
            split.test.len(),
            labels.len(),
            requested,
            test_size
        );
    }
    split.train.sort_unstable();
    split.test.sort_unstable();
    Ok(split)
}

/// Precision, recall and F1 for one label.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub support: usize,
}

/// Held-out evaluation of a trained classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationReport {
    pub accuracy: f32,
    pub per_class: Vec<ClassMetrics>,
    /// Rows are true labels, columns predicted labels, both in `labels` order
    pub confusion_matrix: Array2<usize>,
    pub labels: Vec<String>,
    pub train_size: usize,
    pub test_size: usize,
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 {
        0.0
    } else {
        num as f32 / den as f32
    }
}

impl EvaluationReport {
    /// Compares `predicted` against `expected`, both over the known `labels`.
    ///
    /// Labels with no true or predicted samples get zero precision/recall.
    pub fn from_predictions<S: AsRef<str>, P: AsRef<str>>(
        labels: &[String],
        expected: &[S],
        predicted: &[P],
        train_size: usize,
    ) -> Result<Self, ClassifierError> {
        if expected.len() != predicted.len() {
            return Err(ClassifierError::ValidationError(format!(
                "Expected {} predictions, got {}",
                expected.len(),
                predicted.len()
            )));
        }
        let index_of = |label: &str| {
            labels.iter().position(|l| l == label).ok_or_else(|| {
                ClassifierError::ValidationError(format!("Label '{}' is not a known class", label))
            })
        };

        let k = labels.len();
        let mut confusion = Array2::<usize>::zeros((k, k));
        let mut correct = 0;
        for (e, p) in expected.iter().zip(predicted) {
            let (e, p) = (e.as_ref(), p.as_ref());
            confusion[[index_of(e)?, index_of(p)?]] += 1;
            if e == p {
                correct += 1;
            }
        }

        let per_class = labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let tp = confusion[[i, i]];
                let support = confusion.row(i).sum();
                let predicted_count = confusion.column(i).sum();
                let precision = ratio(tp, predicted_count);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label: label.clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        Ok(Self {
            accuracy: ratio(correct, expected.len()),
            per_class,
            confusion_matrix: confusion,
            labels: labels.to_vec(),
            train_size,
            test_size: expected.len(),
        })
    }

    /// Unweighted mean of (precision, recall, f1) over labels.
    pub fn macro_average(&self) -> (f32, f32, f32) {
        let n = self.per_class.len().max(1) as f32;
        let sum = self.per_class.iter().fold((0.0, 0.0, 0.0), |acc, m| {
            (acc.0 + m.precision, acc.1 + m.recall, acc.2 + m.f1)
        });
        (sum.0 / n, sum.1 / n, sum.2 / n)
    }

    /// Support-weighted mean of (precision, recall, f1) over labels.
    pub fn weighted_average(&self) -> (f32, f32, f32) {
        let total = self.per_class.iter().map(|m| m.support).sum::<usize>();
        if total == 0 {
            return (0.0, 0.0, 0.0);
        }
        let total = total as f32;
        let sum = self.per_class.iter().fold((0.0, 0.0, 0.0), |acc, m| {
            let w = m.support as f32;
            (acc.0 + w * m.precision, acc.1 + w * m.recall, acc.2 + w * m.f1)
        });
        (sum.0 / total, sum.1 / total, sum.2 / total)
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .labels
            .iter()
            .map(|l| l.len())
            .chain(["weighted avg".len()])
            .max()
            .unwrap_or(12);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.label, m.precision, m.recall, m.f1, m.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.test_size
        )?;
        let (p, r, f1) = self.macro_average();
        writeln!(
            f,
            "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            "macro avg", p, r, f1, self.test_size
        )?;
        let (p, r, f1) = self.weighted_average();
        writeln!(
            f,
            "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            "weighted avg", p, r, f1, self.test_size
        )?;

        writeln!(f)?;
        writeln!(f, "Confusion matrix (rows: true, columns: predicted):")?;
        write!(f, "{:>width$}", "")?;
        for label in &self.labels {
            write!(f, " {:>w$}", label, w = label.len().max(3))?;
        }
        writeln!(f)?;
        for (i, label) in self.labels.iter().enumerate() {
            write!(f, "{:>width$}", label)?;
            for (j, col) in self.labels.iter().enumerate() {
                write!(f, " {:>w$}", self.confusion_matrix[[i, j]], w = col.len().max(3))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_every_label_on_both_sides() {
        let labels = ["a", "a", "a", "a", "a", "b", "b", "b", "b", "c", "c"];
        let split = stratified_split(&labels, 0.2, 42).unwrap();
        for label in ["a", "b", "c"] {
            assert!(split.train.iter().any(|&i| labels[i] == label));
            assert!(split.test.iter().any(|&i| labels[i] == label));
        }
        assert_eq!(split.train.len() + split.test.len(), labels.len());
    }

    #[test]
    fn test_split_is_reproducible() {
        let labels = ["x", "y", "x", "y", "x", "y", "x", "y"];
        assert_eq!(
            stratified_split(&labels, 0.25, 9).unwrap(),
            stratified_split(&labels, 0.25, 9).unwrap()
        );
    }

    #[test]
    fn test_small_labels_inflate_test_share() {
        let labels: Vec<String> = (0..10)
            .flat_map(|i| [format!("l{}", i), format!("l{}", i)])
            .collect();
        let split = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 10);
        assert_eq!(split.train.len(), 10);
    }

    #[test]
    fn test_split_rejects_single_label() {
        assert!(matches!(
            stratified_split(&["a", "a", "a"], 0.2, 1),
            Err(ClassifierError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_split_rejects_singleton_label() {
        assert!(matches!(
            stratified_split(&["a", "a", "b"], 0.2, 1),
            Err(ClassifierError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_metrics() {
        let labels = vec!["cat".to_string(), "dog".to_string()];
        let expected = ["cat", "cat", "dog", "dog"];
        let predicted = ["cat", "dog", "dog", "dog"];
        let report = EvaluationReport::from_predictions(&labels, &expected, &predicted, 10).unwrap();
        assert!((report.accuracy - 0.75).abs() < 1e-6);
        assert_eq!(report.confusion_matrix[[0, 0]], 1);
        assert_eq!(report.confusion_matrix[[0, 1]], 1);
        assert_eq!(report.confusion_matrix[[1, 1]], 2);
        let cat = &report.per_class[0];
        assert!((cat.precision - 1.0).abs() < 1e-6);
        assert!((cat.recall - 0.5).abs() < 1e-6);
        let dog = &report.per_class[1];
        assert!((dog.precision - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(dog.support, 2);
        assert!(report.to_string().contains("weighted avg"));
    }

    #[test]
    fn test_unknown_label_is_an_error() {
        let labels = vec!["a".to_string()];
        assert!(EvaluationReport::from_predictions(&labels, &["a"], &["z"], 1).is_err());
    }
}
