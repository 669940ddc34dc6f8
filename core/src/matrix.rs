//! Row-major dense `f32` matrix used for document vectors, author vectors
//! and similarity scores.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::vector;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl DenseMatrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f32) -> Self {
        Self { rows, cols, data: vec![value; rows * cols] }
    }

    /// Build from explicit rows. All rows must have the length of the first.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for row in rows {
            vector::ensure_len(cols, row.len())?;
            data.extend(row);
        }
        Ok(Self { rows: n, cols, data })
    }

    pub fn n_rows(&self) -> usize { self.rows }
    pub fn n_cols(&self) -> usize { self.cols }
    pub fn is_empty(&self) -> bool { self.rows == 0 }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        self.data[i * self.cols + j] = value;
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.rows).map(move |i| self.row(i))
    }

    /// L2-normalize every row in place; all-zero rows stay zero.
    pub fn normalize_rows(&mut self) {
        if self.cols == 0 {
            return;
        }
        self.data.par_chunks_mut(self.cols).for_each(|row| {
            vector::normalize(row);
        });
    }

    /// `self · selfᵗ`, one parallel task per output row.
    pub fn gram(&self) -> DenseMatrix {
        let n = self.rows;
        let mut out = DenseMatrix::zeros(n, n);
        if n == 0 {
            return out;
        }
        out.data.par_chunks_mut(n).enumerate().for_each(|(i, out_row)| {
            let a = self.row(i);
            for (j, cell) in out_row.iter_mut().enumerate() {
                *cell = vector::dot_unchecked(a, self.row(j));
            }
        });
        out
    }

    /// Dot product of `v` with every row.
    pub fn mul_vec(&self, v: &[f32]) -> Result<Vec<f32>> {
        if v.len() != self.cols {
            return Err(PipelineError::DimensionMismatch { expected: self.cols, found: v.len() });
        }
        Ok((0..self.rows)
            .into_par_iter()
            .map(|i| vector::dot_unchecked(self.row(i), v))
            .collect())
    }
}
