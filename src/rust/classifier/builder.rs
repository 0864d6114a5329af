use std::sync::Arc;

use log::{debug, info};

use super::classifier::{feature_fingerprint, Classifier};
use super::error::ClassifierError;
use super::evaluation::{stratified_split, EvaluationReport};
use super::features::FeatureAssembler;
use super::forest::RandomForest;
use super::vectorizer::TfidfVectorizer;
use crate::config::TrainingConfig;
use crate::dataset::{Corpus, Sample};

/// A builder for training a Classifier with a fluent interface.
#[derive(Default, Debug)]
pub struct ClassifierBuilder {
    corpus: Corpus,
    config: TrainingConfig,
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    ///
    /// # Example
    /// ```
    /// use codelang::ClassifierBuilder;
    ///
    /// let builder = ClassifierBuilder::new();
    /// ```
    pub fn new() -> Self {
        Self {
            corpus: Corpus::new(),
            config: TrainingConfig::default(),
        }
    }

    /// Sets the training configuration (vectorizer, forest and split parameters)
    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    /// Appends every sample of `corpus` to the training data
    ///
    /// # Example
    /// ```
    /// use codelang::{ClassifierBuilder, Corpus};
    ///
    /// let builder = ClassifierBuilder::new().with_corpus(Corpus::demo());
    /// ```
    pub fn with_corpus(mut self, corpus: Corpus) -> Self {
        for sample in corpus.samples() {
            self.corpus.push(sample.clone());
        }
        self
    }

    /// Adds one labeled snippet
    ///
    /// # Returns
    /// * `Result<Self, ClassifierError>` - The builder instance if successful, or an error if:
    ///   - The code is empty
    ///   - The label is empty or only whitespace
    pub fn add_sample(
        mut self,
        code: impl Into<String>,
        label: impl Into<String>,
    ) -> Result<Self, ClassifierError> {
        let sample = Sample::new(code, label);
        Self::validate_sample(&sample, self.corpus.len())?;
        self.corpus.push(sample);
        Ok(self)
    }

    fn validate_sample(sample: &Sample, position: usize) -> Result<(), ClassifierError> {
        if sample.code.is_empty() {
            return Err(ClassifierError::ValidationError(format!(
                "Sample {} has empty code",
                position + 1
            )));
        }
        if sample.label.trim().is_empty() {
            return Err(ClassifierError::ValidationError(format!(
                "Sample {} has an empty label",
                position + 1
            )));
        }
        Ok(())
    }

    /// Fits the vectorizer and forest, then evaluates on a held-out split.
    ///
    /// The vectorizer is fitted on the whole corpus; the forest sees only the
    /// training rows of the stratified split, and the report covers the rest.
    ///
    /// # Returns
    /// * `Result<(Classifier, EvaluationReport), ClassifierError>` - or an error if:
    ///   - The configuration is invalid
    ///   - The corpus is empty or contains an empty sample
    ///   - Fewer than two distinct labels are present
    ///   - Some label has fewer than two samples
    ///
    /// # Example
    /// ```
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// use codelang::{ClassifierBuilder, Corpus};
    ///
    /// let (classifier, report) = ClassifierBuilder::new()
    ///     .with_corpus(Corpus::demo())
    ///     .build()?;
    /// assert_eq!(report.labels, classifier.info().class_labels);
    /// # Ok(())
    /// # }
    /// ```
    pub fn build(self) -> Result<(Classifier, EvaluationReport), ClassifierError> {
        self.config.validate()?;
        if self.corpus.is_empty() {
            return Err(ClassifierError::BuildError(
                "At least one sample must be added".to_string(),
            ));
        }
        for (i, sample) in self.corpus.samples().iter().enumerate() {
            Self::validate_sample(sample, i)?;
        }

        let codes = self.corpus.codes();
        let labels = self.corpus.labels();

        // Fails early on too few labels or per-label samples.
        let split = stratified_split(&labels, self.config.test_size, self.config.split_seed)?;
        info!(
            "Training on {} samples ({} train / {} test) across {} labels",
            self.corpus.len(),
            split.train.len(),
            split.test.len(),
            self.corpus.distribution().len()
        );

        let vectorizer = TfidfVectorizer::fit(&codes, &self.config.vectorizer)?;
        let features = vectorizer.assemble_batch(&codes)?;
        debug!("Feature matrix shape: {:?}", features.shape());

        let train_x = features.select(ndarray::Axis(0), &split.train);
        let train_y: Vec<&str> = split.train.iter().map(|&i| labels[i]).collect();
        let forest = RandomForest::fit(&train_x, &train_y, &self.config.forest)?
            .with_fingerprint(feature_fingerprint(&vectorizer));

        let expected: Vec<&str> = split.test.iter().map(|&i| labels[i]).collect();
        let predicted = split
            .test
            .iter()
            .map(|&i| forest.predict(features.row(i)).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;
        let report = EvaluationReport::from_predictions(
            forest.classes(),
            &expected,
            &predicted,
            split.train.len(),
        )?;
        info!("Test accuracy: {:.2}%", report.accuracy * 100.0);

        Ok((Classifier::new(Arc::new(vectorizer), Arc::new(forest)), report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_validation() {
        assert!(ClassifierBuilder::new().add_sample("", "python").is_err());
        assert!(ClassifierBuilder::new().add_sample("x = 1", " ").is_err());
        assert!(ClassifierBuilder::new().add_sample("x = 1", "python").is_ok());
    }

    #[test]
    fn test_empty_builder_fails() {
        assert!(matches!(
            ClassifierBuilder::new().build(),
            Err(ClassifierError::BuildError(_))
        ));
    }

    #[test]
    fn test_single_label_is_a_configuration_error() -> Result<(), ClassifierError> {
        let result = ClassifierBuilder::new()
            .add_sample("def f(a,b):\n    return a+b", "python")?
            .add_sample("print('hi')", "python")?
            .add_sample("import os", "python")?
            .build();
        assert!(matches!(result, Err(ClassifierError::ConfigurationError(_))));
        Ok(())
    }

    #[test]
    fn test_label_with_one_sample_fails() -> Result<(), ClassifierError> {
        let result = ClassifierBuilder::new()
            .add_sample("print(1)", "python")?
            .add_sample("print(2)", "python")?
            .add_sample("console.log(1);", "javascript")?
            .build();
        assert!(matches!(result, Err(ClassifierError::ConfigurationError(_))));
        Ok(())
    }

    #[test]
    fn test_demo_corpus_report() -> Result<(), ClassifierError> {
        let (classifier, report) = ClassifierBuilder::new()
            .with_corpus(Corpus::demo())
            .build()?;
        assert_eq!(report.train_size + report.test_size, 18);
        assert_eq!(report.test_size, 4);
        assert_eq!(report.labels, vec!["cpp", "java", "javascript", "python"]);
        assert!((0.0..=1.0).contains(&report.accuracy));
        assert_eq!(classifier.info().num_classes, 4);
        Ok(())
    }
}
