use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub centroid: String,
    pub members: Vec<String>,
}

/// Builds the cluster record from an exemplar assignment. Cluster ids are
/// sequential in ascending exemplar-index order and members keep ascending
/// original token order, so the record is byte-reproducible for a given
/// assignment. The centroid is the token at the exemplar's index and is
/// always one of its own members.
///
/// Expects `assignment[e] == e` for every exemplar index `e` appearing in
/// the assignment, which `affinity::cluster` guarantees.
pub fn assemble(tokens: &[String], assignment: &[usize]) -> BTreeMap<usize, Cluster> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, &exemplar) in assignment.iter().enumerate() {
        groups.entry(exemplar).or_default().push(index);
    }
    groups
        .into_iter()
        .enumerate()
        .map(|(id, (exemplar, members))| {
            debug_assert!(members.contains(&exemplar));
            let cluster = Cluster {
                centroid: tokens[exemplar].clone(),
                members: members.into_iter().map(|i| tokens[i].clone()).collect(),
            };
            (id, cluster)
        })
        .collect()
}
