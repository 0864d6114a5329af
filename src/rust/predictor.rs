//! Application-level entry points: train or load a bundle, then predict.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::classifier::{Classifier, ClassifierError, EvaluationReport};
use crate::config::TrainingConfig;
use crate::dataset::Corpus;
use crate::model_manager::{load_bundle, save_bundle, ModelError};

#[derive(Debug, thiserror::Error)]
pub enum PredictorError {
    #[error("Model is not trained. Train or load a model first.")]
    NotTrained,
    #[error("File '{0}' not found")]
    FileNotFound(PathBuf),
    #[error("Error reading file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Snippets with known languages, used as a quick sanity battery.
///
/// The last entry is C#, which is outside the demo label set and is expected
/// to be missed.
pub const TEST_EXAMPLES: &[(&str, &str, &str)] = &[
    (
        "Python Example",
        "python",
        "def factorial(n):\n    if n == 0:\n        return 1\n    return n * factorial(n-1)",
    ),
    (
        "JavaScript Example",
        "javascript",
        "const fetchData = async () => {\n    const response = await fetch(url);\n    return response.json();\n};",
    ),
    (
        "Java Example",
        "java",
        "public class Calculator {\n    public int add(int a, int b) {\n        return a + b;\n    }\n}",
    ),
    (
        "C++ Example",
        "cpp",
        "#include <iostream>\nint main() {\n    std::cout << \"Hello\" << std::endl;\n    return 0;\n}",
    ),
    (
        "C# Example",
        "csharp",
        "public async Task<string> GetDataAsync() {\n    var result = await FetchDataAsync();\n    return result;\n}",
    ),
];

/// Outcome of one battery entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub name: String,
    pub expected: String,
    pub predicted: String,
}

impl TestOutcome {
    pub fn is_correct(&self) -> bool {
        self.expected == self.predicted
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestSummary {
    pub outcomes: Vec<TestOutcome>,
}

impl TestSummary {
    pub fn correct(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_correct()).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

/// Holds at most one classifier and the path it is persisted at.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use codelang::{CodePredictor, Corpus};
///
/// let mut predictor = CodePredictor::new("code_prediction_model.json", Corpus::demo());
/// predictor.load_or_train()?;
/// let (label, _) = predictor.predict("print('hi')")?;
/// println!("{}", label);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct CodePredictor {
    model_path: PathBuf,
    corpus: Corpus,
    config: TrainingConfig,
    classifier: Option<Classifier>,
}

impl CodePredictor {
    pub fn new(model_path: impl Into<PathBuf>, corpus: Corpus) -> Self {
        Self {
            model_path: model_path.into(),
            corpus,
            config: TrainingConfig::default(),
            classifier: None,
        }
    }

    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn is_trained(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn classifier(&self) -> Option<&Classifier> {
        self.classifier.as_ref()
    }

    /// Trains on the corpus, persists the bundle and keeps the new classifier.
    pub fn train_new_model(&mut self) -> Result<EvaluationReport, PredictorError> {
        info!(
            "Training new model on {} samples: {:?}",
            self.corpus.len(),
            self.corpus.distribution()
        );
        let (classifier, report) = Classifier::builder()
            .with_config(self.config.clone())
            .with_corpus(self.corpus.clone())
            .build()?;
        save_bundle(&classifier, &self.model_path)?;
        info!("Model saved to {:?}", self.model_path);
        self.classifier = Some(classifier);
        Ok(report)
    }

    /// Loads the bundle at the model path.
    ///
    /// Returns `Ok(false)` when no bundle exists; corrupt or incompatible
    /// bundles are errors.
    pub fn load_existing_model(&mut self) -> Result<bool, ModelError> {
        match load_bundle(&self.model_path) {
            Ok(classifier) => {
                info!("Model loaded from {:?}", self.model_path);
                self.classifier = Some(classifier);
                Ok(true)
            }
            Err(ModelError::NotFound(path)) => {
                warn!("No trained model found at {:?}", path);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Loads the saved bundle, training a fresh one if none exists.
    ///
    /// Returns the evaluation report when a training run happened.
    pub fn load_or_train(&mut self) -> Result<Option<EvaluationReport>, PredictorError> {
        if self.load_existing_model()? {
            return Ok(None);
        }
        info!("No existing model found. Training new model...");
        self.train_new_model().map(Some)
    }

    pub fn predict(&self, code: &str) -> Result<(String, HashMap<String, f32>), PredictorError> {
        let classifier = self.classifier.as_ref().ok_or(PredictorError::NotTrained)?;
        Ok(classifier.predict(code)?)
    }

    pub fn predict_from_file(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<(String, HashMap<String, f32>), PredictorError> {
        let path = path.as_ref();
        let code = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PredictorError::FileNotFound(path.to_path_buf()),
            _ => PredictorError::FileRead {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        info!("Analyzing file: {:?}", path);
        self.predict(&code)
    }

    /// Runs every entry of `TEST_EXAMPLES` through the classifier.
    pub fn run_test_examples(&self) -> Result<TestSummary, PredictorError> {
        let outcomes = TEST_EXAMPLES
            .iter()
            .map(|&(name, expected, code)| {
                self.predict(code).map(|(predicted, _)| TestOutcome {
                    name: name.to_string(),
                    expected: expected.to_string(),
                    predicted,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TestSummary { outcomes })
    }
}

/// Scores sorted from most to least probable.
pub fn ranked_scores(scores: &HashMap<String, f32>) -> Vec<(&str, f32)> {
    let mut ranked: Vec<(&str, f32)> = scores.iter().map(|(l, &p)| (l.as_str(), p)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_before_training() {
        let predictor = CodePredictor::new("/nonexistent/model.json", Corpus::demo());
        assert!(!predictor.is_trained());
        assert!(matches!(
            predictor.predict("print(1)"),
            Err(PredictorError::NotTrained)
        ));
    }

    #[test]
    fn test_ranked_scores_order() {
        let scores: HashMap<String, f32> = [("a", 0.2), ("b", 0.7), ("c", 0.1)]
            .into_iter()
            .map(|(l, p)| (l.to_string(), p))
            .collect();
        let ranked = ranked_scores(&scores);
        assert_eq!(ranked[0].0, "b");
        assert_eq!(ranked[2].0, "c");
    }

    #[test]
    fn test_outcome_correctness() {
        let hit = TestOutcome {
            name: "x".into(),
            expected: "cpp".into(),
            predicted: "cpp".into(),
        };
        assert!(hit.is_correct());
        let summary = TestSummary {
            outcomes: vec![
                hit.clone(),
                TestOutcome {
                    predicted: "java".into(),
                    ..hit
                },
            ],
        };
        assert_eq!(summary.correct(), 1);
        assert_eq!(summary.total(), 2);
    }
}
