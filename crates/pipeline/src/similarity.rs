//! Cosine similarity over scored-title feature rows.

use rayon::prelude::*;

/// Cosine similarity of two vectors.
///
/// A zero-length vector is similar to nothing: the result is 0.0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Dense, symmetric pairwise similarity matrix
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Build the full matrix for a set of feature rows
    pub fn from_features(rows: &[[f64; 3]]) -> Self {
        let size = rows.len();
        let values: Vec<f64> = (0..size * size)
            .into_par_iter()
            .map(|cell| cosine_similarity(&rows[cell / size], &rows[cell % size]))
            .collect();

        Self { size, values }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.size || j >= self.size {
            return None;
        }
        Some(self.values[i * self.size + j])
    }

    /// Similarities of row `i` to every row
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if i >= self.size {
            return None;
        }
        Some(&self.values[i * self.size..(i + 1) * self.size])
    }
}
