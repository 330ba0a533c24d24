use ahash::AHashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorizeError {
    #[error("invalid n-gram range {min}..={max}")]
    InvalidRange { min: usize, max: usize },
    #[error("empty n-gram vocabulary (no token reaches {0} characters)")]
    EmptyVocabulary(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NgramConfig {
    /// Inclusive lower bound of the n-gram lengths.
    pub min: usize,
    /// Inclusive upper bound of the n-gram lengths.
    pub max: usize,
    /// Wrap each token in single-space boundary markers before extraction.
    pub pad_boundaries: bool,
}

impl Default for NgramConfig {
    fn default() -> Self {
        Self { min: 2, max: 3, pad_boundaries: false }
    }
}

impl NgramConfig {
    pub fn validate(&self) -> Result<(), VectorizeError> {
        if self.min == 0 || self.max < self.min {
            return Err(VectorizeError::InvalidRange { min: self.min, max: self.max });
        }
        Ok(())
    }
}

/// Sparse n-gram count vector: `(column, count)` pairs sorted by column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenVector {
    pub counts: Vec<(usize, u32)>,
}

impl TokenVector {
    pub fn is_zero(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.counts
            .iter()
            .map(|&(_, c)| {
                let c = c as f64;
                c * c
            })
            .sum::<f64>()
            .sqrt()
    }

    /// Dot product over the shared vocabulary. Both operands must come from
    /// the same vectorization run, so columns are comparable.
    pub fn dot(&self, other: &TokenVector) -> f64 {
        let mut i = 0usize;
        let mut j = 0usize;
        let mut acc = 0.0;
        while i < self.counts.len() && j < other.counts.len() {
            let (ca, va) = self.counts[i];
            let (cb, vb) = other.counts[j];
            if ca == cb {
                acc += (va as f64) * (vb as f64);
                i += 1;
                j += 1;
            } else if ca < cb {
                i += 1;
            } else {
                j += 1;
            }
        }
        acc
    }
}

/// Vectorizes every token of one corpus unit over a shared per-unit
/// vocabulary. Column indices are assigned in first-occurrence order and are
/// stable for the lifetime of the returned vectors.
///
/// Tokens shorter than `cfg.min` contribute no n-grams and come back as the
/// zero vector; if that holds for the whole unit the vocabulary is empty and
/// the unit cannot be vectorized at all.
pub fn vectorize(tokens: &[String], cfg: &NgramConfig) -> Result<Vec<TokenVector>, VectorizeError> {
    cfg.validate()?;
    let mut vocabulary: AHashMap<String, usize> = AHashMap::new();
    let mut vectors = Vec::with_capacity(tokens.len());

    for token in tokens {
        let padded;
        let text: &str = if cfg.pad_boundaries {
            padded = format!(" {} ", token);
            &padded
        } else {
            token
        };
        let chars: Vec<char> = text.chars().collect();
        let mut counts: AHashMap<usize, u32> = AHashMap::new();
        for n in cfg.min..=cfg.max {
            if chars.len() < n {
                break;
            }
            for window in chars.windows(n) {
                let gram: String = window.iter().collect();
                let next = vocabulary.len();
                let column = *vocabulary.entry(gram).or_insert(next);
                *counts.entry(column).or_insert(0) += 1;
            }
        }
        let mut counts: Vec<(usize, u32)> = counts.into_iter().collect();
        counts.sort_unstable_by_key(|&(column, _)| column);
        vectors.push(TokenVector { counts });
    }

    if vocabulary.is_empty() {
        return Err(VectorizeError::EmptyVocabulary(cfg.min));
    }
    Ok(vectors)
}
