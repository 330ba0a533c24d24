use crate::affinity::{self, AffinityConfig, AffinityError};
use crate::clusters;
use crate::corpus::CorpusUnit;
use crate::report::ClusteringReport;
use crate::similarity::SimilarityMatrix;
use crate::vectorizer::{self, NgramConfig, VectorizeError};
use ahash::AHashSet;
use chrono::{SecondsFormat, Utc};
use itertools::Itertools;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid clustering configuration: {0}")]
    Config(#[from] AffinityError),
    #[error("invalid vectorizer configuration: {0}")]
    Vectorizer(#[from] VectorizeError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub ngram: NgramConfig,
    /// Keep only the first occurrence of each token within a unit. Off keeps
    /// per-occurrence tokens; both are valid corpus shapes.
    pub dedup: bool,
    /// Drop tokens shorter than this many characters before clustering.
    pub min_token_len: usize,
    /// Units with fewer distinct tokens than this are skipped.
    pub min_tokens: usize,
    pub affinity: AffinityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ngram: NgramConfig::default(),
            dedup: true,
            min_token_len: 1,
            min_tokens: 5,
            affinity: AffinityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitStatus {
    Ok,
    Insufficient,
    VectorizationFailed,
    NonConvergent,
}

impl UnitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Ok => "ok",
            UnitStatus::Insufficient => "insufficient",
            UnitStatus::VectorizationFailed => "vectorization-failed",
            UnitStatus::NonConvergent => "non-convergent",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitOutcome {
    pub unit: String,
    pub status: UnitStatus,
    pub token_count: usize,
    pub cluster_count: usize,
    /// Present for `ok` and `non-convergent` units, absent for skipped ones.
    pub report: Option<ClusteringReport>,
}

/// Runs vectorize → similarity → affinity → assemble for one corpus unit.
/// Undersized and unvectorizable units become skip statuses, never errors;
/// the only error paths are configuration mistakes.
pub fn run_unit(unit: &CorpusUnit, cfg: &PipelineConfig) -> Result<UnitOutcome, PipelineError> {
    let mut tokens: Vec<String> = unit
        .tokens
        .iter()
        .filter(|t| t.chars().count() >= cfg.min_token_len.max(1))
        .cloned()
        .collect();
    if cfg.dedup {
        let mut seen: AHashSet<String> = AHashSet::with_capacity(tokens.len());
        tokens.retain(|t| seen.insert(t.clone()));
    }
    let distinct = if cfg.dedup {
        tokens.len()
    } else {
        tokens.iter().collect::<AHashSet<_>>().len()
    };
    if distinct < cfg.min_tokens.max(1) {
        return Ok(UnitOutcome {
            unit: unit.id.clone(),
            status: UnitStatus::Insufficient,
            token_count: tokens.len(),
            cluster_count: 0,
            report: None,
        });
    }

    let vectors = match vectorizer::vectorize(&tokens, &cfg.ngram) {
        Ok(v) => v,
        Err(VectorizeError::EmptyVocabulary(_)) => {
            return Ok(UnitOutcome {
                unit: unit.id.clone(),
                status: UnitStatus::VectorizationFailed,
                token_count: tokens.len(),
                cluster_count: 0,
                report: None,
            });
        }
        Err(e) => return Err(PipelineError::Vectorizer(e)),
    };

    let sim = SimilarityMatrix::cosine(&vectors);
    let outcome = affinity::cluster(&sim, &cfg.affinity)?;
    let clusters = clusters::assemble(&tokens, &outcome.assignment);
    let cluster_count = clusters.len();
    let report = ClusteringReport {
        file: unit.id.clone(),
        similarity_matrix: sim.to_rows(),
        tokens,
        clusters,
        converged: outcome.converged,
    };
    let status = if outcome.converged { UnitStatus::Ok } else { UnitStatus::NonConvergent };
    Ok(UnitOutcome {
        unit: unit.id.clone(),
        status,
        token_count: report.tokens.len(),
        cluster_count,
        report: Some(report),
    })
}

/// Clusters every unit independently on the rayon pool. Units share no
/// state, so this is a plain parallel map; output order follows input order.
pub fn run_units(units: &[CorpusUnit], cfg: &PipelineConfig) -> Result<Vec<UnitOutcome>, PipelineError> {
    cfg.ngram.validate()?;
    cfg.affinity.validate()?;
    units.par_iter().map(|unit| run_unit(unit, cfg)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitStatusOut {
    pub unit: String,
    pub status: UnitStatus,
    pub token_count: usize,
    pub cluster_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub total_units: usize,
    pub clustered: usize,
    pub insufficient: usize,
    pub vectorization_failed: usize,
    pub non_convergent: usize,
    pub units: Vec<UnitStatusOut>,
}

pub fn summarize(outcomes: &[UnitOutcome]) -> RunSummary {
    let counts = outcomes.iter().map(|o| o.status).counts();
    RunSummary {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        total_units: outcomes.len(),
        clustered: counts.get(&UnitStatus::Ok).copied().unwrap_or(0)
            + counts.get(&UnitStatus::NonConvergent).copied().unwrap_or(0),
        insufficient: counts.get(&UnitStatus::Insufficient).copied().unwrap_or(0),
        vectorization_failed: counts.get(&UnitStatus::VectorizationFailed).copied().unwrap_or(0),
        non_convergent: counts.get(&UnitStatus::NonConvergent).copied().unwrap_or(0),
        units: outcomes
            .iter()
            .map(|o| UnitStatusOut {
                unit: o.unit.clone(),
                status: o.status,
                token_count: o.token_count,
                cluster_count: o.cluster_count,
            })
            .collect(),
    }
}
