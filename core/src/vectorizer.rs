//! TF-IDF vectorization over a fixed, corpus-derived vocabulary.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::matrix::DenseMatrix;
use crate::tokenizer::Tokenizer;
use crate::vector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in.
    pub max_df: f64,
    /// Keep at most this many terms, highest corpus frequency first.
    pub max_features: Option<usize>,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self { min_df: 1, max_df: 1.0, max_features: None }
    }
}

/// Feature index → term, with the smoothed idf of each term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: Vec<String>,
    lookup: HashMap<String, usize>,
    idf: Vec<f32>,
}

impl Vocabulary {
    fn new(terms: Vec<String>, idf: Vec<f32>) -> Self {
        let lookup = terms.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        Self { terms, lookup, idf }
    }

    pub fn len(&self) -> usize { self.terms.len() }
    pub fn is_empty(&self) -> bool { self.terms.is_empty() }

    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.lookup.get(term).copied()
    }

    pub fn terms(&self) -> &[String] { &self.terms }
    pub fn idf(&self) -> &[f32] { &self.idf }

    /// Raw counts → idf-weighted, L2-normalized row. Unknown tokens are ignored.
    pub fn weigh<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<f32> {
        let mut row = vec![0.0f32; self.terms.len()];
        for token in tokens {
            if let Some(i) = self.index_of(token.as_ref()) {
                row[i] += 1.0;
            }
        }
        for (w, idf) in row.iter_mut().zip(&self.idf) {
            *w *= idf;
        }
        vector::normalize(&mut row);
        row
    }
}

/// `ln((1 + n) / (1 + df)) + 1`
pub fn smoothed_idf(num_docs: usize, df: usize) -> f32 {
    (((1 + num_docs) as f64 / (1 + df) as f64).ln() + 1.0) as f32
}

#[derive(Debug, Clone, Default)]
pub struct Vectorizer {
    tokenizer: Tokenizer,
    config: VectorizerConfig,
}

impl Vectorizer {
    pub fn new(tokenizer: Tokenizer, config: VectorizerConfig) -> Self {
        Self { tokenizer, config }
    }

    pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

    /// Learn the vocabulary from `documents` and return it with the
    /// `documents.len() × vocabulary.len()` matrix of normalized rows.
    pub fn fit_transform<S: AsRef<str> + Sync>(&self, documents: &[S]) -> Result<(Vocabulary, DenseMatrix)> {
        if documents.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }
        let n = documents.len();

        let counts: Vec<HashMap<String, u32>> = documents
            .par_iter()
            .map(|doc| {
                let mut tf: HashMap<String, u32> = HashMap::new();
                for token in self.tokenizer.tokenize(doc.as_ref()) {
                    *tf.entry(token).or_insert(0) += 1;
                }
                tf
            })
            .collect();

        let mut df: HashMap<&str, usize> = HashMap::new();
        let mut total: HashMap<&str, u64> = HashMap::new();
        for tf in &counts {
            for (term, c) in tf {
                *df.entry(term.as_str()).or_insert(0) += 1;
                *total.entry(term.as_str()).or_insert(0) += u64::from(*c);
            }
        }

        let max_count = self.config.max_df * n as f64;
        let mut kept: Vec<(&str, u64)> = df
            .iter()
            .filter(|(_, d)| **d >= self.config.min_df && **d as f64 <= max_count)
            .map(|(t, _)| (*t, total[t]))
            .collect();

        if let Some(cap) = self.config.max_features {
            if kept.len() > cap {
                kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
                kept.truncate(cap);
            }
        }
        if kept.is_empty() {
            return Err(PipelineError::EmptyVocabulary);
        }

        let mut terms: Vec<String> = kept.into_iter().map(|(t, _)| t.to_string()).collect();
        terms.sort();
        let idf: Vec<f32> = terms.iter().map(|t| smoothed_idf(n, df[t.as_str()])).collect();
        let vocabulary = Vocabulary::new(terms, idf);

        let rows: Vec<Vec<f32>> = counts
            .par_iter()
            .map(|tf| {
                let mut row = vec![0.0f32; vocabulary.len()];
                for (term, c) in tf {
                    if let Some(i) = vocabulary.index_of(term) {
                        row[i] = *c as f32 * vocabulary.idf[i];
                    }
                }
                vector::normalize(&mut row);
                row
            })
            .collect();
        let matrix = DenseMatrix::from_rows(rows)?;

        info!(documents = n, vocabulary = vocabulary.len(), "vectorized corpus");
        Ok((vocabulary, matrix))
    }

    /// Vectorize unseen text against a fitted vocabulary.
    pub fn transform(&self, vocabulary: &Vocabulary, text: &str) -> Vec<f32> {
        vocabulary.weigh(&self.tokenizer.tokenize(text))
    }
}
