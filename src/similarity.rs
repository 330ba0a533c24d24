use crate::vectorizer::TokenVector;

/// Symmetric N×N cosine similarity matrix, row-major.
///
/// Symmetry is exact: each off-diagonal pair is computed once and mirrored,
/// never recomputed per side. Zero-norm vectors (tokens that contributed no
/// n-grams) get 0.0 everywhere, including the diagonal, and no entry is ever
/// NaN or infinite: instability is intercepted here, before clustering.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    data: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn cosine(vectors: &[TokenVector]) -> Self {
        let n = vectors.len();
        let norms: Vec<f64> = vectors.iter().map(|v| v.norm()).collect();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            if norms[i] > 0.0 {
                data[i * n + i] = 1.0;
            }
            for j in (i + 1)..n {
                let denom = norms[i] * norms[j];
                let mut s = if denom > 0.0 { vectors[i].dot(&vectors[j]) / denom } else { 0.0 };
                if !s.is_finite() {
                    s = 0.0;
                }
                data[i * n + j] = s;
                data[j * n + i] = s;
            }
        }
        Self { n, data }
    }

    /// Wraps a precomputed square matrix. Non-finite entries are clamped to
    /// 0.0 under the same interception rule as `cosine`.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let n = rows.len();
        if rows.iter().any(|row| row.len() != n) {
            return None;
        }
        let data = rows
            .into_iter()
            .flatten()
            .map(|v| if v.is_finite() { v } else { 0.0 })
            .collect();
        Some(Self { n, data })
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n)
            .map(|i| self.data[i * self.n..(i + 1) * self.n].to_vec())
            .collect()
    }

    /// Median of the strict upper triangle (the diagonal is excluded).
    /// Returns 0.0 when there are no off-diagonal entries.
    pub fn median_off_diagonal(&self) -> f64 {
        let mut values = Vec::with_capacity(self.n * (self.n.saturating_sub(1)) / 2);
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                values.push(self.get(i, j));
            }
        }
        if values.is_empty() {
            return 0.0;
        }
        values.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        }
    }
}
