#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale pixel buffer
pub type Image = Vec<u8>;

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// Number of bits carried by a [`Descriptor`]
pub const DESCRIPTOR_BITS: u32 = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Invalid frame dimensions: {width}x{height} (must be > 0)")]
    InvalidSize { width: usize, height: usize },
    #[error("Frame data length mismatch: expected {expected_len}, got {actual_len}")]
    LengthMismatch { expected_len: usize, actual_len: usize },
}

/// Grayscale frame whose pixel buffer is guaranteed to match its dimensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    pixels: Image,
}

impl Frame {
    pub fn new(width: usize, height: usize, pixels: Image) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidSize { width, height });
        }
        let expected_len = width * height;
        if pixels.len() != expected_len {
            return Err(FrameError::LengthMismatch {
                expected_len,
                actual_len: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Uniform frame, mostly useful as a blank input
    pub fn filled(width: usize, height: usize, value: u8) -> Result<Self, FrameError> {
        Self::new(width, height, vec![value; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &Image {
        &self.pixels
    }

    pub fn into_pixels(self) -> Image {
        self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }
}

/// Key-point ≙ FAST corner + orientation (radians), in base image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// One keypoint together with the descriptor computed around it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    pub keypoint: Keypoint,
    pub descriptor: Descriptor,
}

/// Ordered features extracted from a single image
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorSet {
    features: Vec<Feature>,
}

impl DescriptorSet {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Keeps only the first `len` features, preserving order
    pub fn truncate(&mut self, len: usize) {
        self.features.truncate(len);
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    pub fn keypoints(&self) -> impl Iterator<Item = &Keypoint> + '_ {
        self.features.iter().map(|f| &f.keypoint)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> + '_ {
        self.features.iter().map(|f| &f.descriptor)
    }
}

impl FromIterator<Feature> for DescriptorSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Corner score used to rank FAST candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ScoreType {
    #[default]
    Harris,
    Fast,
}

/// Fixed extraction settings; one instance is used for the whole process
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExtractorConfig {
    pub threshold: u8,
    pub patch_size: usize,
    pub edge_threshold: usize,
    pub max_features: usize,
    pub scale_factor: f32,
    pub n_levels: usize,
    pub score_type: ScoreType,
    pub n_threads: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            threshold: 20,
            patch_size: 31,
            edge_threshold: 16,
            max_features: 8000,
            scale_factor: 1.1,
            n_levels: 8,
            score_type: ScoreType::Harris,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(x: f32, byte: u8) -> Feature {
        Feature {
            keypoint: Keypoint { x, y: 0.0, angle: 0.0 },
            descriptor: [byte; 32],
        }
    }

    #[test]
    fn test_frame_validation() {
        assert!(matches!(Frame::new(0, 10, vec![]), Err(FrameError::InvalidSize { .. })));
        assert!(matches!(
            Frame::new(4, 4, vec![0; 15]),
            Err(FrameError::LengthMismatch { expected_len: 16, actual_len: 15 })
        ));
        let frame = Frame::new(4, 2, (0..8).collect()).unwrap();
        assert_eq!(frame.dimensions(), (4, 2));
        assert_eq!(frame.get(3, 1), Some(7));
        assert_eq!(frame.get(4, 1), None);
    }

    #[test]
    fn test_truncate_keeps_prefix() {
        let mut set: DescriptorSet = (0..5).map(|i| feature(i as f32, i)).collect();
        set.truncate(3);
        assert_eq!(set.len(), 3);
        let xs: Vec<f32> = set.keypoints().map(|k| k.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
        set.truncate(10);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_default_config() {
        let cfg = ExtractorConfig::default();
        assert_eq!(cfg.max_features, 8000);
        assert!(cfg.scale_factor > 1.0);
        assert_eq!(cfg.patch_size % 2, 1);
        assert!(cfg.n_threads >= 1);
    }
}
