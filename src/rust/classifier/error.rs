use std::fmt;

/// Represents the different types of errors that can occur while training or using the classifier.
#[derive(Debug)]
pub enum ClassifierError {
    /// The corpus cannot support training: too few distinct labels, or a label
    /// with too few samples to appear on both sides of the stratified split
    ConfigurationError(String),
    /// Error occurred due to invalid input parameters
    ValidationError(String),
    /// Error occurred during the build phase
    BuildError(String),
    /// Error occurred while making predictions
    PredictionError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::BuildError(msg) => write!(f, "Build error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}

impl From<ndarray::ShapeError> for ClassifierError {
    fn from(err: ndarray::ShapeError) -> Self {
        ClassifierError::BuildError(err.to_string())
    }
}
