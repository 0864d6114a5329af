use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, info};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::normalize_vector;
use crate::config::VectorizerConfig;

/// Character n-gram TF-IDF vectorizer.
///
/// N-grams are taken over raw character windows, whitespace included. Columns
/// are ordered lexicographically by n-gram, and the vocabulary is capped at
/// `max_features` most frequent n-grams across the fit corpus.
///
/// Weighting:
/// ```text
/// idf(t)      = ln((1 + n_docs) / (1 + df(t))) + 1
/// tfidf(t, d) = count(t, d) * idf(t), then L2-normalized per document
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Learns the vocabulary and IDF weights from `documents`.
    ///
    /// # Errors
    /// - `ValidationError` if `documents` is empty
    /// - `ValidationError` if the n-gram range is invalid
    pub fn fit<S: AsRef<str>>(
        documents: &[S],
        config: &VectorizerConfig,
    ) -> Result<Self, ClassifierError> {
        if documents.is_empty() {
            return Err(ClassifierError::ValidationError(
                "Cannot fit vectorizer on an empty corpus".into(),
            ));
        }
        let (min_n, max_n) = config.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::ValidationError(format!(
                "Invalid n-gram range ({}, {})",
                min_n, max_n
            )));
        }

        // term -> (corpus frequency, document frequency)
        let mut stats: HashMap<String, (usize, usize)> = HashMap::new();
        for doc in documents {
            let mut seen = HashSet::new();
            for gram in char_ngrams(doc.as_ref(), config) {
                let entry = stats.entry(gram.clone()).or_insert((0, 0));
                entry.0 += 1;
                if seen.insert(gram) {
                    entry.1 += 1;
                }
            }
        }
        let distinct = stats.len();

        let mut ranked: Vec<(String, (usize, usize))> = stats.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(config.max_features);
        ranked.sort_by(|a, b| a.0.cmp(&b.0));

        let n_docs = documents.len() as f32;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(ranked.len());
        for (index, (term, (_, df))) in ranked.into_iter().enumerate() {
            idf.push(((1.0 + n_docs) / (1.0 + df as f32)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        info!(
            "Fitted vectorizer on {} documents: kept {} of {} distinct n-grams",
            documents.len(),
            vocabulary.len(),
            distinct
        );

        Ok(Self {
            config: config.clone(),
            vocabulary,
            idf,
        })
    }

    /// Maps `text` onto the fitted vocabulary. Unknown n-grams are ignored.
    pub fn transform(&self, text: &str) -> Array1<f32> {
        let mut counts = Array1::<f32>::zeros(self.idf.len());
        let mut unknown = 0usize;
        for gram in char_ngrams(text, &self.config) {
            match self.vocabulary.get(&gram) {
                Some(&column) => counts[column] += 1.0,
                None => unknown += 1,
            }
        }
        if unknown > 0 {
            debug!("Ignored {} n-grams outside the fitted vocabulary", unknown);
        }
        let weighted = counts * &Array1::from_vec(self.idf.clone());
        normalize_vector(&weighted)
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }
}

/// All character n-grams of `text` for the configured range, in text order.
pub(crate) fn char_ngrams(text: &str, config: &VectorizerConfig) -> Vec<String> {
    let chars: Vec<char> = if config.lowercase {
        text.to_lowercase().chars().collect()
    } else {
        text.chars().collect()
    };
    let (min_n, max_n) = config.ngram_range;
    let mut grams = Vec::new();
    for n in min_n..=max_n {
        if n == 0 || n > chars.len() {
            continue;
        }
        grams.extend(chars.windows(n).map(|w| w.iter().collect::<String>()));
    }
    grams
}
