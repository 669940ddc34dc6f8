//! Rocchio relevance feedback and average-precision evaluation.

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::vector;

/// Weights of the original query, the relevant centroid and the
/// irrelevant centroid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RocchioWeights {
    pub alpha: f32,
    pub beta: f32,
    pub gamma: f32,
}

impl Default for RocchioWeights {
    fn default() -> Self {
        Self { alpha: 0.3, beta: 0.3, gamma: 0.8 }
    }
}

/// `q1 = α·q0 + β·mean(relevant) − γ·mean(irrelevant)`
///
/// An empty set contributes nothing. With `clip`, negative components are
/// raised to zero. The result is not renormalized.
pub fn rocchio<R, I>(query: &[f32], relevant: &[R], irrelevant: &[I], weights: RocchioWeights, clip: bool) -> Result<Vec<f32>>
where
    R: AsRef<[f32]>,
    I: AsRef<[f32]>,
{
    let mut q1: Vec<f32> = query.iter().map(|x| weights.alpha * x).collect();

    if !relevant.is_empty() {
        let scale = weights.beta / relevant.len() as f32;
        for r in relevant {
            vector::add_scaled(&mut q1, r.as_ref(), scale)?;
        }
    }
    if !irrelevant.is_empty() {
        let scale = -weights.gamma / irrelevant.len() as f32;
        for i in irrelevant {
            vector::add_scaled(&mut q1, i.as_ref(), scale)?;
        }
    }

    if clip {
        for x in q1.iter_mut() {
            if *x < 0.0 {
                *x = 0.0;
            }
        }
    }
    Ok(q1)
}

/// Mean over the relevant items found in `ranking` of
/// `(position among relevant hits) / (1-based rank)`.
///
/// Relevant items missing from the ranking are skipped; when none is found
/// the precision is `0`. `relevant` must not be empty.
pub fn average_precision<T: PartialEq>(ranking: &[T], relevant: &[T]) -> f64 {
    let mut ranks: Vec<usize> = relevant
        .iter()
        .filter_map(|r| ranking.iter().position(|x| x == r).map(|p| p + 1))
        .collect();
    ranks.sort_unstable();
    ranks.dedup();
    if ranks.is_empty() {
        return 0.0;
    }
    let total: f64 = ranks.iter().enumerate().map(|(k, r)| (k + 1) as f64 / *r as f64).sum();
    total / ranks.len() as f64
}

/// One evaluated query: the full ranking it produced and its ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedQuery<T> {
    pub ranking: Vec<T>,
    pub relevant: Vec<T>,
}

/// Mean of [`average_precision`] across queries. Any query with an empty
/// relevant set is rejected; an empty query list scores `0`.
pub fn mean_average_precision<T: PartialEq>(queries: &[RankedQuery<T>]) -> Result<f64> {
    if let Some(query) = queries.iter().position(|q| q.relevant.is_empty()) {
        return Err(PipelineError::DegenerateRelevanceSet { query });
    }
    if queries.is_empty() {
        return Ok(0.0);
    }
    let sum: f64 = queries.iter().map(|q| average_precision(&q.ranking, &q.relevant)).sum();
    Ok(sum / queries.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[Vec<f32>] = &[];

    #[test]
    fn empty_sets_scale_query_only() {
        let q = rocchio(&[1.0, -2.0], NONE, NONE, RocchioWeights::default(), false).unwrap();
        assert!((q[0] - 0.3).abs() < 1e-6);
        assert!((q[1] + 0.6).abs() < 1e-6);

        let clipped = rocchio(&[1.0, -2.0], NONE, NONE, RocchioWeights::default(), true).unwrap();
        assert_eq!(clipped[1], 0.0);
    }

    #[test]
    fn relevant_feedback_scenario() {
        let q = rocchio(&[1.0, 0.0], &[vec![0.0, 1.0]], NONE, RocchioWeights::default(), true).unwrap();
        assert!((q[0] - 0.3).abs() < 1e-6);
        assert!((q[1] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn irrelevant_feedback_can_go_negative() {
        let raw = rocchio(&[1.0, 0.0], NONE, &[vec![0.0, 1.0]], RocchioWeights::default(), false).unwrap();
        assert!((raw[1] + 0.8).abs() < 1e-6);
        let clipped = rocchio(&[1.0, 0.0], NONE, &[vec![0.0, 1.0]], RocchioWeights::default(), true).unwrap();
        assert!(clipped.iter().all(|x| *x >= 0.0));
    }

    #[test]
    fn mismatched_feedback_vector() {
        let err = rocchio(&[1.0, 0.0], &[vec![1.0]], NONE, RocchioWeights::default(), true).unwrap_err();
        assert_eq!(err, PipelineError::DimensionMismatch { expected: 2, found: 1 });
    }

    #[test]
    fn single_query_precision() {
        let q = RankedQuery { ranking: vec!["B", "A", "C"], relevant: vec!["A"] };
        assert!((mean_average_precision(&[q]).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn multi_hit_precision() {
        // hits at ranks 1 and 3: (1/1 + 2/3) / 2
        let ap = average_precision(&["A", "X", "B", "Y"], &["B", "A"]);
        assert!((ap - (1.0 + 2.0 / 3.0) / 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_relevant_set_is_rejected() {
        let queries = vec![
            RankedQuery { ranking: vec![1, 2], relevant: vec![2] },
            RankedQuery { ranking: vec![1, 2], relevant: vec![] },
        ];
        assert_eq!(mean_average_precision(&queries).unwrap_err(), PipelineError::DegenerateRelevanceSet { query: 1 });
    }
}
