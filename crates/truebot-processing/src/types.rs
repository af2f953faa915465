//! Shared data types.

use serde::{Deserialize, Serialize};

/// A sparse feature vector of fixed dimensionality.
///
/// `indices` is strictly increasing and every index is `< dim`; `values[i]`
/// is the weight of feature `indices[i]`. Features not listed are zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseVector {
    /// All-zero vector of dimension `dim`.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Build from `(index, value)` pairs.
    ///
    /// Pairs are sorted by index; zero values and indices `>= dim` are
    /// dropped. Duplicate indices are summed.
    pub fn from_pairs(dim: usize, mut pairs: Vec<(usize, f64)>) -> Self {
        pairs.sort_unstable_by_key(|(idx, _)| *idx);

        let mut indices: Vec<usize> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            if idx >= dim {
                continue;
            }
            match indices.last() {
                Some(&last) if last == idx => {
                    if let Some(v) = values.last_mut() {
                        *v += value;
                    }
                }
                _ => {
                    indices.push(idx);
                    values.push(value);
                }
            }
        }

        let mut vector = Self {
            dim,
            indices,
            values,
        };
        vector.retain_nonzero();
        vector
    }

    /// Dense copy of this vector.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (&idx, &value) in self.indices.iter().zip(&self.values) {
            dense[idx] = value;
        }
        dense
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Iterate over `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `index`, zero when absent.
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Dot product with a dense weight slice of at least `dim` entries.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.iter().map(|(idx, value)| weights[idx] * value).sum()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Scale to unit Euclidean norm. Zero vectors are left untouched.
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.values {
                *value /= norm;
            }
        }
    }

    fn retain_nonzero(&mut self) {
        let mut write = 0;
        for read in 0..self.indices.len() {
            if self.values[read] != 0.0 {
                self.indices[write] = self.indices[read];
                self.values[write] = self.values[read];
                write += 1;
            }
        }
        self.indices.truncate(write);
        self.values.truncate(write);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_sorts_and_merges() {
        let v = SparseVector::from_pairs(5, vec![(3, 1.0), (1, 2.0), (3, 0.5), (9, 4.0)]);
        assert_eq!(v.indices(), &[1, 3]);
        assert_eq!(v.values(), &[2.0, 1.5]);
        assert_eq!(v.dim(), 5);
    }

    #[test]
    fn test_from_pairs_drops_zeros() {
        let v = SparseVector::from_pairs(3, vec![(0, 0.0), (2, 1.0), (1, 1.0), (1, -1.0)]);
        assert_eq!(v.indices(), &[2]);
        assert_eq!(v.nnz(), 1);
    }

    #[test]
    fn test_dense_and_get() {
        let v = SparseVector::from_pairs(4, vec![(1, 0.5), (3, 2.0)]);
        assert_eq!(v.to_dense(), vec![0.0, 0.5, 0.0, 2.0]);
        assert_eq!(v.get(3), 2.0);
        assert_eq!(v.get(0), 0.0);
    }

    #[test]
    fn test_dot_and_normalize() {
        let mut v = SparseVector::from_pairs(3, vec![(0, 3.0), (2, 4.0)]);
        assert_eq!(v.dot(&[1.0, 10.0, 1.0]), 7.0);
        assert_eq!(v.norm(), 5.0);
        v.l2_normalize();
        assert!((v.norm() - 1.0).abs() < 1e-12);

        let mut zero = SparseVector::zeros(3);
        zero.l2_normalize();
        assert_eq!(zero.nnz(), 0);
    }
}
