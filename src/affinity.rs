use crate::similarity::SimilarityMatrix;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AffinityError {
    #[error("damping must be strictly between 0 and 1, got {0}")]
    InvalidDamping(f64),
    #[error("max_iter and convergence_iter must both be at least 1")]
    InvalidIterations,
    #[error("per-point preference has length {got}, similarity matrix has {expected} points")]
    PreferenceLength { got: usize, expected: usize },
    #[error("cannot cluster an empty similarity matrix")]
    EmptyMatrix,
}

/// Exemplar preference: how likely each point is to become a cluster center.
/// Higher preference means more clusters.
#[derive(Debug, Clone, PartialEq)]
pub enum Preference {
    /// Median of the off-diagonal similarities, computed once per run.
    Median,
    /// One shared value for every point.
    Value(f64),
    /// One value per point.
    PerPoint(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AffinityConfig {
    pub damping: f64,
    pub max_iter: usize,
    pub convergence_iter: usize,
    pub preference: Preference,
}

impl Default for AffinityConfig {
    fn default() -> Self {
        Self { damping: 0.7, max_iter: 1000, convergence_iter: 15, preference: Preference::Median }
    }
}

impl AffinityConfig {
    pub fn validate(&self) -> Result<(), AffinityError> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(AffinityError::InvalidDamping(self.damping));
        }
        if self.max_iter == 0 || self.convergence_iter == 0 {
            return Err(AffinityError::InvalidIterations);
        }
        Ok(())
    }
}

/// Result of one affinity propagation run. `assignment[i]` is the exemplar
/// index for point i; `centers` are the points assigned to themselves, in
/// ascending order. The assignment is always a complete partition, even when
/// `converged` is false (best effort from the final iteration).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffinityOutcome {
    pub assignment: Vec<usize>,
    pub centers: Vec<usize>,
    pub converged: bool,
    pub iterations: usize,
}

/// Exemplar-based clustering by message passing. The cluster count is not an
/// input: each point exchanges responsibilities and availabilities with every
/// candidate exemplar until the set of self-voting points holds still for
/// `convergence_iter` consecutive iterations, or `max_iter` runs out.
pub fn cluster(sim: &SimilarityMatrix, cfg: &AffinityConfig) -> Result<AffinityOutcome, AffinityError> {
    cfg.validate()?;
    let n = sim.len();
    if n == 0 {
        return Err(AffinityError::EmptyMatrix);
    }
    let preferences: Vec<f64> = match &cfg.preference {
        Preference::Median => vec![sim.median_off_diagonal(); n],
        Preference::Value(v) => vec![*v; n],
        Preference::PerPoint(p) => {
            if p.len() != n {
                return Err(AffinityError::PreferenceLength { got: p.len(), expected: n });
            }
            p.clone()
        }
    };
    if n == 1 {
        return Ok(AffinityOutcome { assignment: vec![0], centers: vec![0], converged: true, iterations: 0 });
    }

    // Working similarity matrix with the preference standing in on the
    // diagonal, plus the per-row maximum of the raw off-diagonal
    // similarities (fixed for the whole run, used by the self-responsibility
    // update).
    let mut s = vec![0.0f64; n * n];
    let mut off_diag_max = vec![f64::NEG_INFINITY; n];
    for i in 0..n {
        for k in 0..n {
            if i == k {
                s[i * n + k] = preferences[i];
            } else {
                let v = sim.get(i, k);
                s[i * n + k] = v;
                if v > off_diag_max[i] {
                    off_diag_max[i] = v;
                }
            }
        }
    }

    let keep = cfg.damping;
    let mix = 1.0 - cfg.damping;
    let mut r = vec![0.0f64; n * n];
    let mut a = vec![0.0f64; n * n];
    let mut votes = vec![0usize; n];
    let mut centers: Vec<usize> = Vec::new();
    let mut stable = 0usize;
    let mut converged = false;
    let mut iterations = 0usize;

    for _ in 0..cfg.max_iter {
        iterations += 1;

        // Responsibility update, row-wise. Tracking the two largest a+s
        // terms per row lets every k reuse the row scan.
        for i in 0..n {
            let row = i * n;
            let mut max1 = f64::NEG_INFINITY;
            let mut max2 = f64::NEG_INFINITY;
            let mut arg1 = 0usize;
            for k in 0..n {
                let v = a[row + k] + s[row + k];
                if v > max1 {
                    max2 = max1;
                    max1 = v;
                    arg1 = k;
                } else if v > max2 {
                    max2 = v;
                }
            }
            for k in 0..n {
                let computed = if k == i {
                    preferences[i] - off_diag_max[i]
                } else {
                    let best_other = if k == arg1 { max2 } else { max1 };
                    s[row + k] - best_other
                };
                r[row + k] = keep * r[row + k] + mix * computed;
            }
        }

        // Availability update, column-wise.
        for k in 0..n {
            let mut positive_sum = 0.0;
            for i in 0..n {
                if i != k {
                    positive_sum += r[i * n + k].max(0.0);
                }
            }
            let self_r = r[k * n + k];
            for i in 0..n {
                let computed = if i == k {
                    positive_sum
                } else {
                    let support = positive_sum - r[i * n + k].max(0.0);
                    (self_r + support).min(0.0)
                };
                a[i * n + k] = keep * a[i * n + k] + mix * computed;
            }
        }

        // Current exemplar vote per point: argmax of a+r, lowest index wins
        // on ties.
        for (i, vote) in votes.iter_mut().enumerate() {
            let row = i * n;
            let mut best = 0usize;
            let mut best_value = f64::NEG_INFINITY;
            for k in 0..n {
                let v = a[row + k] + r[row + k];
                if v > best_value {
                    best_value = v;
                    best = k;
                }
            }
            *vote = best;
        }
        let new_centers: Vec<usize> = (0..n).filter(|&i| votes[i] == i).collect();
        if !new_centers.is_empty() && new_centers == centers {
            stable += 1;
        } else {
            stable = 0;
        }
        centers = new_centers;
        if stable >= cfg.convergence_iter {
            converged = true;
            break;
        }
    }

    // A vote may point at a point that does not vote for itself, which can
    // happen before convergence and in degenerate runs. Reattach such points
    // to the most similar center so the result is a complete partition.
    if centers.is_empty() {
        let mut best = 0usize;
        let mut best_value = f64::NEG_INFINITY;
        for i in 0..n {
            let v = a[i * n + i] + r[i * n + i];
            if v > best_value {
                best_value = v;
                best = i;
            }
        }
        centers.push(best);
    }
    let mut is_center = vec![false; n];
    for &c in &centers {
        is_center[c] = true;
    }
    let mut assignment = vec![0usize; n];
    for i in 0..n {
        assignment[i] = if is_center[i] {
            i
        } else if is_center[votes[i]] {
            votes[i]
        } else {
            let mut best = centers[0];
            let mut best_value = f64::NEG_INFINITY;
            for &c in &centers {
                let v = sim.get(i, c);
                if v > best_value {
                    best_value = v;
                    best = c;
                }
            }
            best
        };
    }

    Ok(AffinityOutcome { assignment, centers, converged, iterations })
}
