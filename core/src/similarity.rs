//! All-pairs cosine similarity with explicit self and sentinel policy.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::lookup::{DocIndex, IndexLabels};
use crate::matrix::DenseMatrix;
use crate::vector;

/// Marks a pair where either side has no label. Never a real score.
pub const SENTINEL: f32 = -1.0;

/// Dense `N × N` similarity scores over pre-normalized row vectors.
///
/// - `(i, j)` with either index unlabelled: [`SENTINEL`]
/// - `(i, i)` otherwise: `0`
/// - everything else: dot product of rows `i` and `j`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    scores: DenseMatrix,
}

fn check_labels<L: IndexLabels + ?Sized>(n: usize, labels: &L) -> Result<()> {
    match labels.max_index() {
        Some(max) if max >= n => Err(PipelineError::DimensionMismatch { expected: n, found: max + 1 }),
        _ => Ok(()),
    }
}

impl SimilarityMatrix {
    /// Batch build through a single `vectors · vectorsᵗ` product.
    pub fn build<L: IndexLabels + ?Sized>(vectors: &DenseMatrix, labels: &L) -> Result<Self> {
        let n = vectors.n_rows();
        check_labels(n, labels)?;
        let mut scores = vectors.gram();
        let valid: Vec<bool> = (0..n).map(|i| labels.contains_index(i)).collect();
        for i in 0..n {
            for j in 0..n {
                if !valid[i] || !valid[j] {
                    scores.set(i, j, SENTINEL);
                } else if i == j {
                    scores.set(i, j, 0.0);
                }
            }
        }
        info!(size = n, labelled = valid.iter().filter(|v| **v).count(), "built similarity matrix");
        Ok(Self { scores })
    }

    /// Pair-by-pair reference build. Quadratic in rows times the vector
    /// width; only meant for checking [`SimilarityMatrix::build`].
    pub fn build_pairwise<L: IndexLabels + ?Sized>(vectors: &DenseMatrix, labels: &L) -> Result<Self> {
        let n = vectors.n_rows();
        check_labels(n, labels)?;
        let mut scores = DenseMatrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let value = if !labels.contains_index(i) || !labels.contains_index(j) {
                    SENTINEL
                } else if i == j {
                    0.0
                } else {
                    vector::dot(vectors.row(i), vectors.row(j))?
                };
                scores.set(i, j, value);
            }
        }
        Ok(Self { scores })
    }

    pub fn len(&self) -> usize { self.scores.n_rows() }
    pub fn is_empty(&self) -> bool { self.scores.is_empty() }

    pub fn get(&self, i: DocIndex, j: DocIndex) -> f32 { self.scores.get(i, j) }
    pub fn row(&self, i: DocIndex) -> &[f32] { self.scores.row(i) }

    /// Valid comparisons for `index` in ascending index order: labelled,
    /// not `index` itself, not a sentinel.
    pub fn candidates<L: IndexLabels + ?Sized>(&self, index: DocIndex, labels: &L) -> Vec<(DocIndex, f32)> {
        if index >= self.len() {
            return Vec::new();
        }
        self.row(index)
            .iter()
            .enumerate()
            .filter(|(j, s)| *j != index && **s != SENTINEL && labels.contains_index(*j))
            .map(|(j, s)| (j, *s))
            .collect()
    }

    /// Every valid comparison, most similar first. Equal scores keep
    /// ascending index order.
    pub fn ranked<L: IndexLabels + ?Sized>(&self, index: DocIndex, labels: &L) -> Vec<(DocIndex, f32)> {
        let mut entries = self.candidates(index, labels);
        sort_descending(&mut entries);
        entries
    }

    /// The `x` most similar (descending) and `x` least similar (ascending)
    /// valid entries for `index`.
    pub fn extremes<L: IndexLabels + ?Sized>(
        &self,
        index: DocIndex,
        labels: &L,
        x: usize,
    ) -> (Vec<(DocIndex, f32)>, Vec<(DocIndex, f32)>) {
        let entries = self.candidates(index, labels);
        let mut top = entries.clone();
        sort_descending(&mut top);
        top.truncate(x);
        let mut bottom = entries;
        bottom.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        bottom.truncate(x);
        (top, bottom)
    }
}

/// Stable descending sort by score.
pub(crate) fn sort_descending(entries: &mut [(DocIndex, f32)]) {
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
}
