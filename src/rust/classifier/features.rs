use ndarray::{concatenate, Array1, Array2, Axis};

use super::error::ClassifierError;
use super::vectorizer::TfidfVectorizer;

const PYTHON_KEYWORDS: &[&str] = &["def", "import", "class", "for", "while", "if", "elif", "else"];
const JAVASCRIPT_KEYWORDS: &[&str] = &["function", "const", "let", "var", "console.log", "=>"];
const JAVA_KEYWORDS: &[&str] = &["public", "private", "static", "void", "class", "System.out"];
const CPP_KEYWORDS: &[&str] = &["#include", "std::", "cout", "cin", "namespace"];

/// Names of the structural features, in column order.
pub const STRUCTURAL_FEATURE_NAMES: [&str; 8] = [
    "python_keywords",
    "js_keywords",
    "java_keywords",
    "cpp_keywords",
    "semicolons",
    "curly_braces",
    "indentation_spaces",
    "hash_symbols",
];

pub const STRUCTURAL_FEATURE_COUNT: usize = STRUCTURAL_FEATURE_NAMES.len();

/// Number of keywords from `keywords` occurring anywhere in `code`.
///
/// Plain substring containment: "defined" counts toward "def".
fn keyword_hits(code: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| code.contains(*kw)).count()
}

/// Hand-crafted keyword and punctuation counts for one snippet.
pub fn extract_structural_features(code: &str) -> Array1<f32> {
    let counts = [
        keyword_hits(code, PYTHON_KEYWORDS),
        keyword_hits(code, JAVASCRIPT_KEYWORDS),
        keyword_hits(code, JAVA_KEYWORDS),
        keyword_hits(code, CPP_KEYWORDS),
        code.matches(';').count(),
        code.matches('{').count() + code.matches('}').count(),
        code.matches("\n    ").count(),
        code.matches('#').count(),
    ];
    counts.iter().map(|&c| c as f32).collect()
}

/// Builds model input vectors from raw code.
///
/// The layout is the TF-IDF vector of the fitted vectorizer followed by the
/// structural features, so the width is `vocabulary_size + 8` for every input.
pub(crate) trait FeatureAssembler {
    /// Returns the fitted vectorizer if available
    fn vectorizer(&self) -> Option<&TfidfVectorizer>;

    fn feature_width(&self) -> Option<usize> {
        self.vectorizer()
            .map(|v| v.vocabulary_size() + STRUCTURAL_FEATURE_COUNT)
    }

    /// Feature vector for a single snippet.
    ///
    /// # Errors
    /// - `BuildError` if no vectorizer has been fitted
    fn assemble(&self, code: &str) -> Result<Array1<f32>, ClassifierError> {
        let vectorizer = self
            .vectorizer()
            .ok_or_else(|| ClassifierError::BuildError("Vectorizer not fitted".into()))?;
        let tfidf = vectorizer.transform(code);
        let structural = extract_structural_features(code);
        Ok(concatenate(Axis(0), &[tfidf.view(), structural.view()])?)
    }

    /// Feature matrix with one row per snippet, built row by row from `assemble`.
    fn assemble_batch<S: AsRef<str>>(&self, codes: &[S]) -> Result<Array2<f32>, ClassifierError> {
        let width = self
            .feature_width()
            .ok_or_else(|| ClassifierError::BuildError("Vectorizer not fitted".into()))?;
        let mut matrix = Array2::zeros((codes.len(), width));
        for (i, code) in codes.iter().enumerate() {
            matrix.row_mut(i).assign(&self.assemble(code.as_ref())?);
        }
        Ok(matrix)
    }
}

impl FeatureAssembler for TfidfVectorizer {
    fn vectorizer(&self) -> Option<&TfidfVectorizer> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorizerConfig;

    #[test]
    fn test_python_snippet_features() {
        let f = extract_structural_features("def f(a,b):\n    return a+b");
        assert_eq!(f.to_vec(), vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_substring_matching_is_preserved() {
        // "undefined" contains "def", "classic" contains "class"
        let f = extract_structural_features("undefined classic");
        assert_eq!(f[0], 2.0);
        assert_eq!(f[2], 1.0);
    }

    #[test]
    fn test_punctuation_counts() {
        let f = extract_structural_features("#include <x>\nint main() {\n    return 0;\n}");
        assert_eq!(f[3], 1.0); // #include
        assert_eq!(f[4], 1.0);
        assert_eq!(f[5], 2.0);
        assert_eq!(f[6], 1.0);
        assert_eq!(f[7], 1.0);
    }

    #[test]
    fn test_deep_indentation_counts_once() {
        let f = extract_structural_features("a\n        b\n    c");
        assert_eq!(f[6], 2.0);
    }

    #[test]
    fn test_extraction_is_pure() {
        let code = "for (let i = 0; i < 3; i++) { console.log(i); }";
        assert_eq!(extract_structural_features(code), extract_structural_features(code));
    }

    #[test]
    fn test_batch_matches_single() {
        let docs = ["print(1)", "console.log(1);", "std::cout << 1;"];
        let v = TfidfVectorizer::fit(&docs, &VectorizerConfig::default()).unwrap();
        let batch = v.assemble_batch(&docs).unwrap();
        assert_eq!(batch.ncols(), v.vocabulary_size() + STRUCTURAL_FEATURE_COUNT);
        for (i, doc) in docs.iter().enumerate() {
            assert_eq!(batch.row(i), v.assemble(doc).unwrap());
        }
    }
}
