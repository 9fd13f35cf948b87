use cover_core::{DESCRIPTOR_BITS, Descriptor, Keypoint};
use image::GrayImage;
use imageproc::filter::gaussian_blur_f32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

const DESCRIPTOR_SIZE: usize = 32;

/// Half-width of the square window the test pairs are drawn from
pub const PATTERN_RADIUS: i8 = 13;

const PATTERN_SEED: u64 = 0x0b12_1ef0_2b5e_ed01;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BriefError {
    #[error("Image data length mismatch: expected {expected_len} for {width}x{height}, got {actual_len}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected_len: usize,
        actual_len: usize,
    },
}

/// Number of differing bits between two descriptors
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Steered BRIEF descriptor generator.
///
/// The 256 intensity-comparison pairs are drawn once from a fixed seed, so two
/// generators always produce identical descriptors for identical input.
#[derive(Debug, Clone)]
pub struct BriefGenerator {
    pairs: Vec<(i8, i8, i8, i8)>,
    blur_sigma: f32,
}

impl Default for BriefGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl BriefGenerator {
    pub fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        let mut pairs = Vec::with_capacity(DESCRIPTOR_BITS as usize);
        while pairs.len() < DESCRIPTOR_BITS as usize {
            let pair = (
                rng.gen_range(-PATTERN_RADIUS..=PATTERN_RADIUS),
                rng.gen_range(-PATTERN_RADIUS..=PATTERN_RADIUS),
                rng.gen_range(-PATTERN_RADIUS..=PATTERN_RADIUS),
                rng.gen_range(-PATTERN_RADIUS..=PATTERN_RADIUS),
            );
            // A point compared with itself carries no information
            if (pair.0, pair.1) != (pair.2, pair.3) {
                pairs.push(pair);
            }
        }
        Self { pairs, blur_sigma: 2.0 }
    }

    pub fn pairs(&self) -> &[(i8, i8, i8, i8)] {
        &self.pairs
    }

    /// Gaussian-smooth the image; BRIEF tests are too noise-sensitive on raw pixels
    pub fn smooth(&self, img: &[u8], width: usize, height: usize) -> Result<Vec<u8>, BriefError> {
        let buffer = GrayImage::from_raw(width as u32, height as u32, img.to_vec()).ok_or(
            BriefError::DimensionMismatch {
                width,
                height,
                expected_len: width * height,
                actual_len: img.len(),
            },
        )?;
        Ok(gaussian_blur_f32(&buffer, self.blur_sigma).into_raw())
    }

    /// Describe keypoints given in the coordinates of `img`.
    ///
    /// Returns exactly one descriptor per keypoint, in the same order.
    pub fn generate_descriptors(
        &self,
        img: &[u8],
        width: usize,
        height: usize,
        kps: &[Keypoint],
    ) -> Result<Vec<Descriptor>, BriefError> {
        let smoothed = self.smooth(img, width, height)?;

        Ok(kps
            .par_iter()
            .map(|kp| {
                let (s, c) = kp.angle.sin_cos();
                let (cx, cy) = (kp.x, kp.y);
                let mut d = [0u8; DESCRIPTOR_SIZE];

                for (i, &(dx1, dy1, dx2, dy2)) in self.pairs.iter().enumerate() {
                    let (dx1, dy1, dx2, dy2) = (dx1 as f32, dy1 as f32, dx2 as f32, dy2 as f32);
                    // Steer the pattern by the keypoint orientation
                    let (rx1, ry1) = (cx + c * dx1 - s * dy1, cy + s * dx1 + c * dy1);
                    let (rx2, ry2) = (cx + c * dx2 - s * dy2, cy + s * dx2 + c * dy2);

                    let val1 = bilinear_sample(&smoothed, width, height, rx1, ry1);
                    let val2 = bilinear_sample(&smoothed, width, height, rx2, ry2);

                    let bit = (val1 < val2) as u8;
                    d[i / 8] |= bit << (i % 8);
                }
                d
            })
            .collect())
    }
}

/// Bilinear interpolation for subpixel sampling, clamped at the borders
fn bilinear_sample(img: &[u8], width: usize, height: usize, x: f32, y: f32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let x1 = x0 + 1.0;
    let y1 = y0 + 1.0;

    if x0 < 0.0 || y0 < 0.0 || x1 >= width as f32 || y1 >= height as f32 {
        let cx = x.round().clamp(0.0, (width - 1) as f32) as usize;
        let cy = y.round().clamp(0.0, (height - 1) as f32) as usize;
        return img[cy * width + cx] as f32;
    }

    let dx = x - x0;
    let dy = y - y0;

    let x0_idx = x0 as usize;
    let y0_idx = y0 as usize;
    let x1_idx = x1 as usize;
    let y1_idx = y1 as usize;

    let p00 = img[y0_idx * width + x0_idx] as f32;
    let p10 = img[y0_idx * width + x1_idx] as f32;
    let p01 = img[y1_idx * width + x0_idx] as f32;
    let p11 = img[y1_idx * width + x1_idx] as f32;

    let top = p00 * (1.0 - dx) + p10 * dx;
    let bottom = p01 * (1.0 - dx) + p11 * dx;

    top * (1.0 - dy) + bottom * dy
}
