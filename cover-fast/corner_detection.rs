use cover_core::{Keypoint, ScoreType};
use rayon::prelude::*;
use crate::types::{CornerType, ScoredKeypoint};
use crate::utils::has_consecutive_bits;

/// Corner detection algorithms (FAST segment test and Harris scoring)
pub struct CornerDetector;

impl CornerDetector {
    /// Bresenham circle of radius 3, clockwise from 12 o'clock
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Contiguous arc length required by FAST-9
    pub const ARC_LENGTH: u32 = 9;

    /// Run the segment test over every pixel at least `border` pixels from the edge.
    ///
    /// Rows are processed in parallel; the output is in row-major order.
    pub fn detect(
        img: &[u8],
        width: usize,
        height: usize,
        threshold: u8,
        border: usize,
        score_type: ScoreType,
    ) -> Vec<ScoredKeypoint> {
        let border = border.max(3);
        if width <= 2 * border || height <= 2 * border {
            return Vec::new();
        }

        (border..height - border)
            .into_par_iter()
            .flat_map_iter(|y| {
                let mut row_keypoints = Vec::new();
                for x in border..width - border {
                    if Self::classify(img, width, x, y, threshold) == CornerType::None {
                        continue;
                    }
                    let response = match score_type {
                        ScoreType::Harris => Self::compute_harris_response(img, width, height, x, y),
                        ScoreType::Fast => Self::compute_fast_score(img, width, x, y, threshold),
                    };
                    row_keypoints.push(ScoredKeypoint {
                        keypoint: Keypoint {
                            x: x as f32,
                            y: y as f32,
                            angle: 0.0,
                        },
                        response,
                    });
                }
                row_keypoints
            })
            .collect()
    }

    /// Segment test: 9 contiguous circle pixels all brighter or all darker than the centre
    pub(crate) fn classify(img: &[u8], width: usize, x: usize, y: usize, threshold: u8) -> CornerType {
        let center = img[y * width + x] as i32;
        let threshold = threshold as i32;

        let mut brighter: u16 = 0;
        let mut darker: u16 = 0;
        for (i, &(dx, dy)) in Self::FAST_OFFSETS.iter().enumerate() {
            let px = (x as i32 + dx) as usize;
            let py = (y as i32 + dy) as usize;
            let pixel = img[py * width + px] as i32;

            if pixel > center + threshold {
                brighter |= 1 << i;
            } else if pixel < center - threshold {
                darker |= 1 << i;
            }
        }

        if has_consecutive_bits(brighter, Self::ARC_LENGTH) {
            CornerType::Bright
        } else if has_consecutive_bits(darker, Self::ARC_LENGTH) {
            CornerType::Dark
        } else {
            CornerType::None
        }
    }

    /// Sum of absolute differences beyond the threshold around the circle
    fn compute_fast_score(img: &[u8], width: usize, x: usize, y: usize, threshold: u8) -> f32 {
        let center = img[y * width + x] as f32;
        Self::FAST_OFFSETS
            .iter()
            .map(|&(dx, dy)| {
                let px = (x as i32 + dx) as usize;
                let py = (y as i32 + dy) as usize;
                let diff = (img[py * width + px] as f32 - center).abs();
                (diff - threshold as f32).max(0.0)
            })
            .sum()
    }

    /// Compute Harris corner response at a pixel over a 7x7 window
    pub fn compute_harris_response(img: &[u8], width: usize, height: usize, x: usize, y: usize) -> f32 {
        const RADIUS: usize = 3;
        if x < RADIUS + 1 || y < RADIUS + 1 || x + RADIUS + 1 >= width || y + RADIUS + 1 >= height {
            return 0.0;
        }

        let mut ixx = 0.0f64;
        let mut ixy = 0.0f64;
        let mut iyy = 0.0f64;

        for ny in y - RADIUS..=y + RADIUS {
            for nx in x - RADIUS..=x + RADIUS {
                let (gx, gy) = Self::compute_gradients(img, width, nx, ny);
                ixx += (gx * gx) as f64;
                ixy += (gx * gy) as f64;
                iyy += (gy * gy) as f64;
            }
        }

        // det(M) - k * trace(M)^2
        let k = 0.04f64;
        let det = ixx * iyy - ixy * ixy;
        let trace = ixx + iyy;
        let harris_response = det - k * trace * trace;

        harris_response.max(0.0) as f32
    }

    /// Sobel gradients; caller guarantees a one-pixel margin
    fn compute_gradients(img: &[u8], width: usize, x: usize, y: usize) -> (f32, f32) {
        let at = |xx: usize, yy: usize| img[yy * width + xx] as f32;

        let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
            - at(x - 1, y - 1) - 2.0 * at(x - 1, y) - at(x - 1, y + 1);
        let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
            - at(x - 1, y - 1) - 2.0 * at(x, y - 1) - at(x + 1, y - 1);

        (gx / 8.0, gy / 8.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_image(width: usize, height: usize) -> Vec<u8> {
        let mut img = vec![50; width * height];
        for y in height / 2 - 5..height / 2 + 5 {
            for x in width / 2 - 5..width / 2 + 5 {
                img[y * width + x] = 220;
            }
        }
        img
    }

    #[test]
    fn test_uniform_image_has_no_corners() {
        let img = vec![128; 40 * 40];
        let kps = CornerDetector::detect(&img, 40, 40, 20, 3, ScoreType::Fast);
        assert!(kps.is_empty());
    }

    #[test]
    fn test_square_corners_detected() {
        let img = square_image(40, 40);
        let kps = CornerDetector::detect(&img, 40, 40, 20, 3, ScoreType::Fast);
        assert!(!kps.is_empty());
        // Every detection sits near one of the four square corners
        for kp in &kps {
            let near_x = (kp.keypoint.x - 15.0).abs() <= 3.0 || (kp.keypoint.x - 24.0).abs() <= 3.0;
            let near_y = (kp.keypoint.y - 15.0).abs() <= 3.0 || (kp.keypoint.y - 24.0).abs() <= 3.0;
            assert!(near_x && near_y, "unexpected corner at {:?}", kp.keypoint);
            assert!(kp.response > 0.0);
        }
    }

    #[test]
    fn test_classify_bright_and_dark() {
        // Isolated dark pixel: the whole circle is brighter than the centre
        let mut img = vec![200u8; 15 * 15];
        img[7 * 15 + 7] = 20;
        assert_eq!(CornerDetector::classify(&img, 15, 7, 7, 20), CornerType::Bright);

        let mut img = vec![20u8; 15 * 15];
        img[7 * 15 + 7] = 200;
        assert_eq!(CornerDetector::classify(&img, 15, 7, 7, 20), CornerType::Dark);
    }

    #[test]
    fn test_border_respected() {
        let img = square_image(40, 40);
        let kps = CornerDetector::detect(&img, 40, 40, 20, 18, ScoreType::Harris);
        for kp in &kps {
            assert!(kp.keypoint.x >= 18.0 && kp.keypoint.x < 22.0);
        }
        assert!(CornerDetector::detect(&img, 40, 40, 20, 20, ScoreType::Fast).is_empty());
    }

    #[test]
    fn test_harris_response_on_flat_and_corner() {
        let img = square_image(40, 40);
        assert_eq!(CornerDetector::compute_harris_response(&img, 40, 40, 5, 5), 0.0);
        assert!(CornerDetector::compute_harris_response(&img, 40, 40, 15, 15) > 0.0);
        assert_eq!(CornerDetector::compute_harris_response(&img, 40, 40, 1, 1), 0.0);
    }
}
