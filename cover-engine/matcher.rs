use cover_brief::hamming_distance;
use cover_core::{Descriptor, DescriptorSet};
use rayon::prelude::*;

/// A pairing between a reference feature and a query feature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correspondence {
    pub reference_index: usize,
    pub query_index: usize,
    pub distance: u32,
}

/// Brute-force Hamming matcher with optional mutual-nearest-neighbour check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matcher {
    max_distance: u32,
    cross_check: bool,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            max_distance: 50,
            cross_check: true,
        }
    }
}

impl Matcher {
    pub fn new(max_distance: u32) -> Self {
        Self {
            max_distance,
            ..Self::default()
        }
    }

    pub fn with_cross_check(mut self, cross_check: bool) -> Self {
        self.cross_check = cross_check;
        self
    }

    pub fn max_distance(&self) -> u32 {
        self.max_distance
    }

    pub fn cross_check(&self) -> bool {
        self.cross_check
    }

    /// Nearest query feature for every reference feature, in reference order.
    ///
    /// With cross-checking enabled a pair is kept only when the reference
    /// feature is also the query feature's nearest neighbour, which makes the
    /// result one-to-one. Ties resolve to the lowest index on either side.
    pub fn match_sets(&self, reference: &DescriptorSet, query: &DescriptorSet) -> Vec<Correspondence> {
        if reference.is_empty() || query.is_empty() {
            return Vec::new();
        }

        let ref_desc: Vec<&Descriptor> = reference.descriptors().collect();
        let query_desc: Vec<&Descriptor> = query.descriptors().collect();

        let forward: Vec<(usize, u32)> = ref_desc.par_iter().map(|d| nearest(d, &query_desc)).collect();

        if !self.cross_check {
            return forward
                .into_iter()
                .enumerate()
                .map(|(reference_index, (query_index, distance))| Correspondence {
                    reference_index,
                    query_index,
                    distance,
                })
                .collect();
        }

        let backward: Vec<usize> = query_desc.par_iter().map(|d| nearest(d, &ref_desc).0).collect();

        forward
            .into_iter()
            .enumerate()
            .filter(|&(reference_index, (query_index, _))| backward[query_index] == reference_index)
            .map(|(reference_index, (query_index, distance))| Correspondence {
                reference_index,
                query_index,
                distance,
            })
            .collect()
    }

    pub fn is_good(&self, correspondence: &Correspondence) -> bool {
        correspondence.distance < self.max_distance
    }

    /// Keep correspondences strictly below the distance threshold, preserving order
    pub fn good_matches(&self, correspondences: Vec<Correspondence>) -> Vec<Correspondence> {
        correspondences.into_iter().filter(|c| self.is_good(c)).collect()
    }
}

/// Index and distance of the closest candidate; the first minimum wins
fn nearest(target: &Descriptor, candidates: &[&Descriptor]) -> (usize, u32) {
    let mut best = (0, u32::MAX);
    for (idx, candidate) in candidates.iter().enumerate() {
        let distance = hamming_distance(target, candidate);
        if distance < best.1 {
            best = (idx, distance);
            if distance == 0 {
                break;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use cover_core::{Feature, Keypoint};

    fn set(descriptors: &[Descriptor]) -> DescriptorSet {
        descriptors
            .iter()
            .enumerate()
            .map(|(i, &descriptor)| Feature {
                keypoint: Keypoint { x: i as f32, y: 0.0, angle: 0.0 },
                descriptor,
            })
            .collect()
    }

    /// Descriptor with the first `bits` bits set
    fn bits(bits: usize) -> Descriptor {
        let mut d = [0u8; 32];
        for i in 0..bits {
            d[i / 8] |= 1 << (i % 8);
        }
        d
    }

    #[test]
    fn test_identical_sets_match_one_to_one() {
        let a = set(&[bits(0), bits(100), bits(200)]);
        let matches = Matcher::default().match_sets(&a, &a);
        assert_eq!(matches.len(), 3);
        for (i, m) in matches.iter().enumerate() {
            assert_eq!((m.reference_index, m.query_index, m.distance), (i, i, 0));
        }
    }

    #[test]
    fn test_cross_check_drops_non_mutual() {
        // Both references are closest to query 0, but query 0 prefers reference 0
        let reference = set(&[bits(10), bits(14)]);
        let query = set(&[bits(11), bits(200)]);

        let mutual = Matcher::default().match_sets(&reference, &query);
        assert_eq!(mutual, vec![Correspondence { reference_index: 0, query_index: 0, distance: 1 }]);

        let one_way = Matcher::default().with_cross_check(false).match_sets(&reference, &query);
        assert_eq!(one_way.len(), 2);
        assert_eq!(one_way[1], Correspondence { reference_index: 1, query_index: 0, distance: 3 });
    }

    #[test]
    fn test_ties_resolve_to_lowest_index() {
        let reference = set(&[bits(8)]);
        let query = set(&[bits(4), bits(12)]);
        let matches = Matcher::default().match_sets(&reference, &query);
        assert_eq!(matches, vec![Correspondence { reference_index: 0, query_index: 0, distance: 4 }]);
    }

    #[test]
    fn test_empty_side_yields_nothing() {
        let a = set(&[bits(3)]);
        let empty = DescriptorSet::default();
        assert!(Matcher::default().match_sets(&a, &empty).is_empty());
        assert!(Matcher::default().match_sets(&empty, &a).is_empty());
    }

    #[test]
    fn test_good_threshold_is_strict() {
        let matcher = Matcher::default();
        let at = Correspondence { reference_index: 0, query_index: 0, distance: 50 };
        let below = Correspondence { distance: 49, ..at };
        assert!(!matcher.is_good(&at));
        assert!(matcher.is_good(&below));
        assert_eq!(matcher.good_matches(vec![at, below]), vec![below]);
    }
}
