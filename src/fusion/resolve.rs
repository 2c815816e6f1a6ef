use crate::fusion::align::CandidateCut;

/// Picks the row that stands for a cluster of nearby cuts.
///
/// The sheet edges win outright. Otherwise the first cut of the
/// highest-priority detector is used. The result is always a cluster member.
pub fn representative(cluster: &[CandidateCut], height: u32) -> Option<CandidateCut> {
    if let Some(edge) = cluster
        .iter()
        .find(|cut| cut.position == 0 || cut.position == height)
    {
        return Some(*edge);
    }

    cluster
        .iter()
        .min_by_key(|cut| (cut.rank, cut.position))
        .copied()
}

pub fn resolve_clusters(clusters: &[Vec<CandidateCut>], height: u32) -> Vec<CandidateCut> {
    clusters
        .iter()
        .filter_map(|cluster| representative(cluster, height))
        .collect()
}
