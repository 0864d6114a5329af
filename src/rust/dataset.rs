//! Labeled code samples used to train the classifier.

use std::collections::BTreeMap;

/// A single labeled snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub code: String,
    /// Language name, lower-case by convention
    pub label: String,
}

impl Sample {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// An ordered collection of samples.
///
/// # Example
/// ```
/// use codelang::Corpus;
///
/// let corpus = Corpus::new()
///     .with_sample("print('hi')", "python")
///     .with_sample("console.log('hi');", "javascript");
/// assert_eq!(corpus.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    samples: Vec<Sample>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<C, L>(pairs: impl IntoIterator<Item = (C, L)>) -> Self
    where
        C: Into<String>,
        L: Into<String>,
    {
        Self {
            samples: pairs.into_iter().map(|(c, l)| Sample::new(c, l)).collect(),
        }
    }

    pub fn with_sample(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        self.samples.push(Sample::new(code, label));
        self
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.code.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.label.as_str()).collect()
    }

    /// Sample count per label, in sorted label order.
    pub fn distribution(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for s in &self.samples {
            *counts.entry(s.label.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// The built-in demo corpus: python, javascript, java and cpp snippets.
    pub fn demo() -> Self {
        Self::from_pairs([
            ("def calculate_sum(a, b):\n    return a + b", "python"),
            ("import numpy as np\nx = np.array([1, 2, 3])", "python"),
            ("for i in range(10):\n    print(i)", "python"),
            ("class MyClass:\n    def __init__(self):\n        pass", "python"),
            ("if x > 0:\n    print('positive')\nelse:\n    print('negative')", "python"),
            ("function add(a, b) {\n    return a + b;\n}", "javascript"),
            ("const arr = [1, 2, 3];\narr.map(x => x * 2);", "javascript"),
            ("for (let i = 0; i < 10; i++) {\n    console.log(i);\n}", "javascript"),
            ("class MyClass {\n    constructor() {\n    }\n}", "javascript"),
            ("if (x > 0) {\n    console.log('positive');\n}", "javascript"),
            ("public class Main {\n    public static void main(String[] args) {\n    }\n}", "java"),
            ("int[] arr = {1, 2, 3};\nfor (int i : arr) {\n    System.out.println(i);\n}", "java"),
            ("public int add(int a, int b) {\n    return a + b;\n}", "java"),
            ("if (x > 0) {\n    System.out.println(\"positive\");\n}", "java"),
            ("#include <iostream>\nint main() {\n    return 0;\n}", "cpp"),
            ("std::vector<int> v = {1, 2, 3};", "cpp"),
            ("for (int i = 0; i < 10; i++) {\n    std::cout << i;\n}", "cpp"),
            ("class MyClass {\npublic:\n    MyClass() {}\n};", "cpp"),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_distribution() {
        let corpus = Corpus::demo();
        assert_eq!(corpus.len(), 18);
        let dist = corpus.distribution();
        assert_eq!(dist["python"], 5);
        assert_eq!(dist["javascript"], 5);
        assert_eq!(dist["java"], 4);
        assert_eq!(dist["cpp"], 4);
    }

    #[test]
    fn test_codes_and_labels_stay_aligned() {
        let corpus = Corpus::new().with_sample("a", "x").with_sample("b", "y");
        assert_eq!(corpus.codes(), vec!["a", "b"]);
        assert_eq!(corpus.labels(), vec!["x", "y"]);
    }
}
