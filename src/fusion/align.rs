use crate::fusion::Proposal;

/// A cut row proposed by a detector. Lower `rank` means higher priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateCut {
    pub position: u32,
    pub rank: usize,
    pub detector: &'static str,
}

/// Every band endpoint from every proposal, sorted by position. When two
/// detectors propose the same row, the higher-priority one is kept.
pub fn collect_cuts(proposals: &[Proposal]) -> Vec<CandidateCut> {
    let mut cuts: Vec<CandidateCut> = proposals
        .iter()
        .enumerate()
        .flat_map(|(rank, proposal)| {
            let detector = proposal.detector;
            proposal.bands.iter().flat_map(move |band| {
                [band.start, band.end].map(|position| CandidateCut {
                    position,
                    rank,
                    detector,
                })
            })
        })
        .collect();

    cuts.sort_by_key(|cut| (cut.position, cut.rank));
    cuts.dedup_by_key(|cut| cut.position);
    cuts
}

/// Chains cuts whose gap is at most `tolerance` into clusters.
pub fn cluster_cuts(cuts: &[CandidateCut], tolerance: u32) -> Vec<Vec<CandidateCut>> {
    let mut clusters: Vec<Vec<CandidateCut>> = Vec::new();

    for &cut in cuts {
        let joins = clusters
            .last()
            .and_then(|cluster| cluster.last())
            .is_some_and(|prev| cut.position.saturating_sub(prev.position) <= tolerance);

        if let (true, Some(cluster)) = (joins, clusters.last_mut()) {
            cluster.push(cut);
        } else {
            clusters.push(vec![cut]);
        }
    }

    clusters
}
