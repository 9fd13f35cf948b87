use cover_core::{Frame, Image};
use rayon::prelude::*;
use crate::types::ScaleLevel;

/// Image pyramid operations for multi-scale feature detection
pub struct ImagePyramid;

impl ImagePyramid {
    /// Generate scale levels for image pyramid.
    ///
    /// Level `i` is the base image shrunk by `scale_factor^i`. Generation stops
    /// at `n_levels` or as soon as a level would drop below `min_size` on
    /// either side, so a tiny image yields no levels at all.
    pub fn generate_scale_levels(
        width: usize,
        height: usize,
        scale_factor: f32,
        n_levels: usize,
        min_size: usize,
    ) -> Vec<ScaleLevel> {
        let mut levels = Vec::with_capacity(n_levels);
        let mut current_scale = 1.0f32;

        for level in 0..n_levels {
            let scaled_width = ((width as f32) / current_scale).round() as usize;
            let scaled_height = ((height as f32) / current_scale).round() as usize;

            if scaled_width < min_size || scaled_height < min_size {
                break;
            }

            levels.push(ScaleLevel {
                level,
                scale: current_scale,
                width: scaled_width,
                height: scaled_height,
            });

            current_scale *= scale_factor;
        }

        levels
    }

    /// Build image pyramid from base frame
    pub fn build_image_pyramid(frame: &Frame, scale_levels: &[ScaleLevel]) -> Vec<Image> {
        scale_levels
            .par_iter()
            .map(|scale_level| {
                if scale_level.level == 0 {
                    frame.pixels().clone()
                } else {
                    Self::downsample_image(
                        frame.pixels(),
                        frame.width(),
                        frame.height(),
                        scale_level.width,
                        scale_level.height,
                    )
                }
            })
            .collect()
    }

    /// Downsample image using bilinear interpolation
    fn downsample_image(
        img: &[u8],
        src_width: usize,
        src_height: usize,
        target_width: usize,
        target_height: usize,
    ) -> Image {
        let x_ratio = src_width as f32 / target_width as f32;
        let y_ratio = src_height as f32 / target_height as f32;

        let mut downsampled = vec![0u8; target_width * target_height];
        downsampled
            .par_chunks_mut(target_width)
            .enumerate()
            .for_each(|(y, row)| {
                let src_y = y as f32 * y_ratio;
                for (x, out) in row.iter_mut().enumerate() {
                    let src_x = x as f32 * x_ratio;
                    let value = Self::bilinear_sample(img, src_width, src_height, src_x, src_y);
                    *out = value.round().clamp(0.0, 255.0) as u8;
                }
            });

        downsampled
    }

    /// Sample image at fractional coordinates using bilinear interpolation
    fn bilinear_sample(img: &[u8], width: usize, height: usize, x: f32, y: f32) -> f32 {
        let x1 = (x.floor() as usize).min(width - 1);
        let y1 = (y.floor() as usize).min(height - 1);
        let x2 = (x1 + 1).min(width - 1);
        let y2 = (y1 + 1).min(height - 1);

        let fx = x - x1 as f32;
        let fy = y - y1 as f32;

        let p11 = img[y1 * width + x1] as f32;
        let p12 = img[y1 * width + x2] as f32;
        let p21 = img[y2 * width + x1] as f32;
        let p22 = img[y2 * width + x2] as f32;

        let interpolated_top = p11 * (1.0 - fx) + p12 * fx;
        let interpolated_bottom = p21 * (1.0 - fx) + p22 * fx;

        interpolated_top * (1.0 - fy) + interpolated_bottom * fy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_shrink_geometrically() {
        let levels = ImagePyramid::generate_scale_levels(640, 480, 1.2, 8, 32);
        assert_eq!(levels.len(), 8);
        assert_eq!(levels[0].width, 640);
        assert_eq!(levels[0].height, 480);
        for pair in levels.windows(2) {
            assert!(pair[1].width < pair[0].width);
            assert!((pair[1].scale / pair[0].scale - 1.2).abs() < 1e-4);
        }
    }

    #[test]
    fn test_levels_stop_at_min_size() {
        let levels = ImagePyramid::generate_scale_levels(80, 80, 2.0, 8, 32);
        assert_eq!(levels.len(), 2);
        assert!(ImagePyramid::generate_scale_levels(20, 200, 1.2, 8, 32).is_empty());
    }

    #[test]
    fn test_uniform_pyramid_stays_uniform() {
        let frame = Frame::filled(100, 60, 77).unwrap();
        let levels = ImagePyramid::generate_scale_levels(100, 60, 1.5, 3, 8);
        let pyramid = ImagePyramid::build_image_pyramid(&frame, &levels);
        assert_eq!(pyramid.len(), levels.len());
        for (img, level) in pyramid.iter().zip(&levels) {
            assert_eq!(img.len(), level.width * level.height);
            assert!(img.iter().all(|&p| p == 77));
        }
    }
}
