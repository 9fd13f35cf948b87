use std::cmp::Ordering;

use crate::types::ScoredKeypoint;

/// Keypoint thinning, ranking and orientation
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// 3x3 non-maximum suppression over a response map.
    ///
    /// A candidate survives when its response beats every earlier neighbour (in
    /// raster order) and is not beaten by any later one, so equal plateaus keep
    /// exactly their first pixel.
    pub fn non_maximum_suppression(
        candidates: &[ScoredKeypoint],
        width: usize,
        height: usize,
    ) -> Vec<ScoredKeypoint> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let mut response_map = vec![f32::NEG_INFINITY; width * height];
        for candidate in candidates {
            let idx = candidate.keypoint.y as usize * width + candidate.keypoint.x as usize;
            response_map[idx] = candidate.response;
        }

        candidates
            .iter()
            .filter(|candidate| {
                let x = candidate.keypoint.x as usize;
                let y = candidate.keypoint.y as usize;
                let response = candidate.response;

                for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                    for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                        if nx == x && ny == y {
                            continue;
                        }
                        let neighbour = response_map[ny * width + nx];
                        let earlier = (ny, nx) < (y, x);
                        if neighbour > response || (earlier && neighbour == response) {
                            return false;
                        }
                    }
                }
                true
            })
            .copied()
            .collect()
    }

    /// Strongest-first ordering; ties fall back to row-major position so the order is total
    pub fn rank(a: &ScoredKeypoint, b: &ScoredKeypoint) -> Ordering {
        b.response
            .total_cmp(&a.response)
            .then_with(|| a.keypoint.y.total_cmp(&b.keypoint.y))
            .then_with(|| a.keypoint.x.total_cmp(&b.keypoint.x))
    }

    /// Keep the `limit` strongest keypoints, strongest first
    pub fn retain_best(mut keypoints: Vec<ScoredKeypoint>, limit: usize) -> Vec<ScoredKeypoint> {
        keypoints.sort_by(Self::rank);
        keypoints.truncate(limit);
        keypoints
    }

    /// Intensity-centroid orientation over a circular patch of the given radius
    pub fn compute_orientation(img: &[u8], width: usize, height: usize, x: usize, y: usize, radius: usize) -> f32 {
        let r = radius as i64;
        let (cx, cy) = (x as i64, y as i64);
        let mut m10 = 0i64;
        let mut m01 = 0i64;

        for dy in -r..=r {
            let yy = cy + dy;
            if yy < 0 || yy >= height as i64 {
                continue;
            }
            let span = ((r * r - dy * dy) as f64).sqrt() as i64;
            for dx in -span..=span {
                let xx = cx + dx;
                if xx < 0 || xx >= width as i64 {
                    continue;
                }
                let val = img[yy as usize * width + xx as usize] as i64;
                m10 += dx * val;
                m01 += dy * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cover_core::Keypoint;

    fn scored(x: usize, y: usize, response: f32) -> ScoredKeypoint {
        ScoredKeypoint {
            keypoint: Keypoint { x: x as f32, y: y as f32, angle: 0.0 },
            response,
        }
    }

    #[test]
    fn test_nms_keeps_local_maxima() {
        let candidates = vec![scored(5, 5, 1.0), scored(6, 5, 3.0), scored(7, 6, 2.0), scored(12, 12, 0.5)];
        let kept = KeypointRefinement::non_maximum_suppression(&candidates, 20, 20);
        let positions: Vec<(f32, f32)> = kept.iter().map(|k| (k.keypoint.x, k.keypoint.y)).collect();
        assert_eq!(positions, vec![(6.0, 5.0), (12.0, 12.0)]);
    }

    #[test]
    fn test_nms_plateau_keeps_first() {
        let candidates = vec![scored(3, 3, 1.0), scored(4, 3, 1.0), scored(3, 4, 1.0)];
        let kept = KeypointRefinement::non_maximum_suppression(&candidates, 10, 10);
        assert_eq!(kept.len(), 1);
        assert_eq!((kept[0].keypoint.x, kept[0].keypoint.y), (3.0, 3.0));
    }

    #[test]
    fn test_nms_no_adjacent_survivors() {
        let candidates: Vec<_> = (0..10)
            .flat_map(|y| (0..10).map(move |x| scored(x, y, ((x * 7 + y * 13) % 11) as f32)))
            .collect();
        let kept = KeypointRefinement::non_maximum_suppression(&candidates, 10, 10);
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                let dx = (a.keypoint.x - b.keypoint.x).abs();
                let dy = (a.keypoint.y - b.keypoint.y).abs();
                assert!(dx > 1.0 || dy > 1.0, "adjacent survivors {:?} {:?}", a.keypoint, b.keypoint);
            }
        }
    }

    #[test]
    fn test_retain_best_orders_and_truncates() {
        let kps = vec![scored(1, 1, 0.5), scored(2, 1, 2.0), scored(0, 0, 2.0), scored(3, 3, 1.0)];
        let best = KeypointRefinement::retain_best(kps, 3);
        let order: Vec<(f32, f32)> = best.iter().map(|k| (k.keypoint.x, k.keypoint.y)).collect();
        assert_eq!(order, vec![(0.0, 0.0), (2.0, 1.0), (3.0, 3.0)]);
    }

    #[test]
    fn test_orientation_points_towards_mass() {
        let (w, h) = (21, 21);
        // Bright right half: centroid lies along +x
        let img: Vec<u8> = (0..w * h).map(|i| if i % w > 10 { 200 } else { 0 }).collect();
        let angle = KeypointRefinement::compute_orientation(&img, w, h, 10, 10, 7);
        assert!(angle.abs() < 1e-3, "angle {}", angle);

        // Bright bottom half: centroid lies along +y
        let img: Vec<u8> = (0..w * h).map(|i| if i / w > 10 { 200 } else { 0 }).collect();
        let angle = KeypointRefinement::compute_orientation(&img, w, h, 10, 10, 7);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-3, "angle {}", angle);
    }

    #[test]
    fn test_orientation_uniform_is_finite() {
        let img = vec![90u8; 15 * 15];
        let angle = KeypointRefinement::compute_orientation(&img, 15, 15, 7, 7, 7);
        assert!(angle.is_finite());
        assert_eq!(angle, 0.0);
    }
}
