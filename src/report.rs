use crate::clusters::Cluster;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("similarity matrix row {row} has {cols} columns, expected {expected}x{expected}")]
    MatrixShape { row: usize, cols: usize, expected: usize },
    #[error("similarity matrix has {rows} rows for {expected} tokens")]
    MatrixRows { rows: usize, expected: usize },
    #[error("cluster {cluster}: token {token:?} is not in the report token list")]
    UnknownToken { cluster: usize, token: String },
    #[error("cluster {cluster}: centroid {centroid:?} is not one of its members")]
    CentroidNotMember { cluster: usize, centroid: String },
}

/// The persisted unit of work: one JSON document per corpus unit, written
/// once and never mutated. Downstream visualization consumes it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteringReport {
    pub file: String,
    /// Exact token order used for vectorization; matrix rows and columns
    /// index into this list.
    pub tokens: Vec<String>,
    pub similarity_matrix: Vec<Vec<f64>>,
    pub clusters: BTreeMap<usize, Cluster>,
    /// False marks a best-effort clustering from a non-convergent run.
    #[serde(default = "default_converged")]
    pub converged: bool,
}

fn default_converged() -> bool {
    true
}

impl ClusteringReport {
    /// Structural validation applied on load. A report that fails here is
    /// rejected alone; other reports are unaffected.
    pub fn validate(&self) -> Result<(), ReportError> {
        let n = self.tokens.len();
        if self.similarity_matrix.len() != n {
            return Err(ReportError::MatrixRows { rows: self.similarity_matrix.len(), expected: n });
        }
        for (row, values) in self.similarity_matrix.iter().enumerate() {
            if values.len() != n {
                return Err(ReportError::MatrixShape { row, cols: values.len(), expected: n });
            }
        }
        let known: HashSet<&str> = self.tokens.iter().map(String::as_str).collect();
        for (&id, cluster) in &self.clusters {
            if !known.contains(cluster.centroid.as_str()) {
                return Err(ReportError::UnknownToken { cluster: id, token: cluster.centroid.clone() });
            }
            for member in &cluster.members {
                if !known.contains(member.as_str()) {
                    return Err(ReportError::UnknownToken { cluster: id, token: member.clone() });
                }
            }
            if !cluster.members.contains(&cluster.centroid) {
                return Err(ReportError::CentroidNotMember { cluster: id, centroid: cluster.centroid.clone() });
            }
        }
        Ok(())
    }
}

pub fn save(report: &ClusteringReport, path: &Path) -> Result<(), ReportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn load(path: &Path) -> Result<ClusteringReport, ReportError> {
    let file = File::open(path)?;
    let report: ClusteringReport = serde_json::from_reader(BufReader::new(file))?;
    report.validate()?;
    Ok(report)
}

/// The statistics view over a persisted report: cluster shape at a glance,
/// without re-running anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStats {
    pub file: String,
    pub tokens: usize,
    pub clusters: usize,
    pub singleton_clusters: usize,
    pub mean_off_diagonal_distance: f64,
    pub converged: bool,
}

pub fn stats(report: &ClusteringReport) -> ReportStats {
    let n = report.tokens.len();
    let mut sum = 0.0;
    let mut pairs = 0usize;
    for i in 0..n {
        for j in (i + 1)..n {
            sum += 1.0 - report.similarity_matrix[i][j];
            pairs += 1;
        }
    }
    ReportStats {
        file: report.file.clone(),
        tokens: n,
        clusters: report.clusters.len(),
        singleton_clusters: report.clusters.values().filter(|c| c.members.len() == 1).count(),
        mean_off_diagonal_distance: if pairs > 0 { sum / pairs as f64 } else { 0.0 },
        converged: report.converged,
    }
}
