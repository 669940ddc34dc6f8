//! Small dense-vector helpers shared by the similarity engine, Rocchio and
//! the author aggregator.

use crate::error::{PipelineError, Result};

pub fn ensure_len(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(PipelineError::DimensionMismatch { expected, found })
    }
}

/// Dot product of two equally sized vectors.
pub fn dot(a: &[f32], b: &[f32]) -> Result<f32> {
    ensure_len(a.len(), b.len())?;
    Ok(dot_unchecked(a, b))
}

#[inline]
pub(crate) fn dot_unchecked(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Scale `v` to unit length in place. Returns `false` and leaves `v`
/// untouched when it is all zeros.
pub fn normalize(v: &mut [f32]) -> bool {
    let norm = l2_norm(v);
    if norm == 0.0 {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

/// `acc += scale * v`
pub fn add_scaled(acc: &mut [f32], v: &[f32], scale: f32) -> Result<()> {
    ensure_len(acc.len(), v.len())?;
    for (a, x) in acc.iter_mut().zip(v) {
        *a += scale * x;
    }
    Ok(())
}
