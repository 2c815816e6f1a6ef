//! Reconciles the band proposals of several detectors into one band list.

pub mod align;
pub mod finalize;
pub mod resolve;

use tracing::debug;

use crate::core::geometry::Band;

/// Bands proposed by one detector.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub detector: &'static str,
    pub bands: Vec<Band>,
}

pub trait FusionEngine {
    /// `proposals` are ordered by detector priority, highest first.
    fn fuse(&self, proposals: &[Proposal], height: u32) -> Vec<Band>;
}

/// Interval refinement over the union of all proposed cuts.
///
/// Wherever any detector cut, the result may cut. Cuts closer than
/// `snap_tolerance` are treated as the same boundary. Bands no taller than
/// `min_section_height` are dropped.
#[derive(Debug, Clone)]
pub struct SimpleFusionEngine {
    pub min_section_height: u32,
    pub snap_tolerance: u32,
}

impl Default for SimpleFusionEngine {
    fn default() -> Self {
        Self {
            min_section_height: 50,
            snap_tolerance: 10,
        }
    }
}

impl SimpleFusionEngine {
    pub fn new(min_section_height: u32, snap_tolerance: u32) -> Self {
        Self {
            min_section_height,
            snap_tolerance,
        }
    }
}

impl FusionEngine for SimpleFusionEngine {
    fn fuse(&self, proposals: &[Proposal], height: u32) -> Vec<Band> {
        let cuts = align::collect_cuts(proposals);
        let clusters = align::cluster_cuts(&cuts, self.snap_tolerance);
        let resolved = resolve::resolve_clusters(&clusters, height);
        let sources: Vec<(u32, &str)> = resolved.iter().map(|c| (c.position, c.detector)).collect();
        debug!(proposed = cuts.len(), ?sources, "fused cut positions");

        let positions: Vec<u32> = resolved.iter().map(|c| c.position).collect();
        let bands = finalize::bands_between(&positions, self.min_section_height);
        if bands.is_empty() {
            return vec![Band::whole(height)];
        }
        bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn proposal(detector: &'static str, bands: &[(u32, u32)]) -> Proposal {
        Proposal {
            detector,
            bands: bands.iter().map(|&(s, e)| Band::new(s, e)).collect(),
        }
    }

    #[test]
    fn snaps_edge_cuts_onto_ruled_lines() {
        let engine = SimpleFusionEngine::default();
        let lines = proposal("lines", &[(0, 400), (400, 900), (900, 1600)]);
        let density = proposal("density", &[(0, 397), (397, 898), (898, 1600)]);
        assert_eq!(
            engine.fuse(&[lines, density], 1600),
            vec![Band::new(0, 400), Band::new(400, 900), Band::new(900, 1600)]
        );
    }

    #[test]
    fn union_is_finer_than_each_input() {
        let engine = SimpleFusionEngine::default();
        let lines = proposal("lines", &[(0, 600), (600, 1600)]);
        let density = proposal("density", &[(0, 300), (300, 1600)]);
        assert_eq!(
            engine.fuse(&[lines, density], 1600),
            vec![Band::new(0, 300), Band::new(300, 600), Band::new(600, 1600)]
        );
    }

    #[test]
    fn whole_sheet_proposal_defers_to_the_other_detector() {
        let engine = SimpleFusionEngine::default();
        let lines = proposal("lines", &[(0, 1600)]);
        let density = proposal("density", &[(0, 500), (500, 1600)]);
        assert_eq!(
            engine.fuse(&[lines, density], 1600),
            vec![Band::new(0, 500), Band::new(500, 1600)]
        );
    }

    #[test]
    fn nothing_to_fuse_is_the_whole_sheet() {
        let engine = SimpleFusionEngine::default();
        assert_eq!(engine.fuse(&[], 800), vec![Band::whole(800)]);
        assert_eq!(
            engine.fuse(&[proposal("lines", &[]), proposal("density", &[])], 800),
            vec![Band::whole(800)]
        );
    }

    #[test]
    fn resolved_cuts_name_their_detector() {
        let lines = proposal("lines", &[(0, 400), (400, 1600)]);
        let density = proposal("density", &[(0, 396), (396, 1200), (1200, 1600)]);
        let cuts = align::collect_cuts(&[lines, density]);
        let clusters = align::cluster_cuts(&cuts, 10);
        let sources: Vec<(u32, &str)> = resolve::resolve_clusters(&clusters, 1600)
            .iter()
            .map(|c| (c.position, c.detector))
            .collect();
        assert_eq!(
            sources,
            vec![(0, "lines"), (400, "lines"), (1200, "density"), (1600, "lines")]
        );
    }

    /// Small deterministic generator so the property check is reproducible.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: u32) -> u32 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((self.0 >> 33) % u64::from(bound)) as u32
        }
    }

    fn random_proposal(rng: &mut Lcg, height: u32) -> Proposal {
        let mut cuts: Vec<u32> = (0..rng.next(8)).map(|_| rng.next(height + 1)).collect();
        cuts.sort_unstable();
        cuts.dedup();
        let bands = cuts
            .windows(2)
            .filter(|pair| pair[1] > pair[0])
            .map(|pair| Band::new(pair[0], pair[1]))
            .collect();
        Proposal {
            detector: "random",
            bands,
        }
    }

    #[test]
    fn fused_bands_are_ordered_tall_and_proposed() {
        let engine = SimpleFusionEngine::default();
        let mut rng = Lcg(42);

        for _ in 0..500 {
            let height = 100 + rng.next(2000);
            let proposals = vec![
                random_proposal(&mut rng, height),
                random_proposal(&mut rng, height),
            ];
            let proposed: BTreeSet<u32> = proposals
                .iter()
                .flat_map(|p| p.bands.iter().flat_map(|b| [b.start, b.end]))
                .collect();

            let fused = engine.fuse(&proposals, height);
            assert!(!fused.is_empty());

            if fused == vec![Band::whole(height)] {
                continue;
            }
            for band in &fused {
                assert!(band.height() >= engine.min_section_height, "{band:?}");
                assert!(band.end <= height);
                assert!(proposed.contains(&band.start), "{band:?} not proposed");
                assert!(proposed.contains(&band.end), "{band:?} not proposed");
            }
            for pair in fused.windows(2) {
                assert!(pair[0].end <= pair[1].start, "{pair:?}");
                assert!(!pair[0].overlaps(&pair[1]));
            }
        }
    }
}
