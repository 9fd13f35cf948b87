use cover_brief::BriefGenerator;
use cover_core::{DescriptorSet, ExtractorConfig, Feature, Frame, Keypoint};
use cover_fast::FastDetector;
use crate::error::EngineResult;

/// Turns a grayscale frame into an ordered descriptor set
pub trait FeatureExtractor: Send + Sync {
    fn extract(&self, frame: &Frame) -> EngineResult<DescriptorSet>;
}

/// ORB-style extractor that combines multi-scale FAST keypoints with steered BRIEF descriptors
#[derive(Debug, Clone)]
pub struct OrbExtractor {
    detector: FastDetector,
    brief: BriefGenerator,
}

impl OrbExtractor {
    /// Create a new extractor; invalid settings are rejected here rather than per frame
    pub fn new(cfg: ExtractorConfig) -> EngineResult<Self> {
        Ok(Self {
            detector: FastDetector::new(cfg)?,
            brief: BriefGenerator::new(),
        })
    }

    pub fn config(&self) -> &ExtractorConfig {
        self.detector.config()
    }

    pub fn detector(&self) -> &FastDetector {
        &self.detector
    }
}

impl FeatureExtractor for OrbExtractor {
    /// Features come out finest level first, strongest first within a level,
    /// with locations in base frame pixels.
    fn extract(&self, frame: &Frame) -> EngineResult<DescriptorSet> {
        let levels = self.detector.detect(frame)?;

        let mut features = Vec::with_capacity(levels.iter().map(|l| l.keypoints.len()).sum());
        for level in &levels {
            if level.keypoints.is_empty() {
                continue;
            }
            let kps: Vec<Keypoint> = level.keypoints.iter().map(|sk| sk.keypoint).collect();
            let descriptors =
                self.brief
                    .generate_descriptors(&level.image, level.scale.width, level.scale.height, &kps)?;

            features.extend(kps.iter().zip(descriptors).map(|(kp, descriptor)| Feature {
                keypoint: level.to_base(kp),
                descriptor,
            }));
        }

        Ok(DescriptorSet::new(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn small_config() -> ExtractorConfig {
        ExtractorConfig {
            max_features: 600,
            n_levels: 3,
            n_threads: 1,
            ..ExtractorConfig::default()
        }
    }

    fn block_frame(width: usize, height: usize, block: usize, seed: u64) -> Frame {
        let mut rng = StdRng::seed_from_u64(seed);
        let cols = width.div_ceil(block);
        let shades: Vec<u8> = (0..cols * height.div_ceil(block)).map(|_| rng.gen_range(0..=255u8)).collect();
        let pixels = (0..width * height)
            .map(|i| shades[(i / width / block) * cols + (i % width) / block])
            .collect();
        Frame::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_blank_frame_yields_empty_set() {
        let extractor = OrbExtractor::new(small_config()).unwrap();
        let set = extractor.extract(&Frame::filled(160, 120, 90).unwrap()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_tiny_frame_yields_empty_set() {
        let extractor = OrbExtractor::new(small_config()).unwrap();
        let set = extractor.extract(&Frame::filled(12, 12, 0).unwrap()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_textured_frame_yields_features_within_budget() {
        let extractor = OrbExtractor::new(small_config()).unwrap();
        let frame = block_frame(240, 180, 10, 5);
        let set = extractor.extract(&frame).unwrap();
        assert!(!set.is_empty());
        assert!(set.len() <= 600);
        for kp in set.keypoints() {
            assert!(kp.x >= 0.0 && kp.x < 240.0 && kp.y >= 0.0 && kp.y < 180.0);
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = OrbExtractor::new(small_config()).unwrap();
        let frame = block_frame(200, 160, 9, 21);
        let first = extractor.extract(&frame).unwrap();
        let second = OrbExtractor::new(small_config()).unwrap().extract(&frame).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let cfg = ExtractorConfig { patch_size: 30, ..small_config() };
        assert!(OrbExtractor::new(cfg).is_err());
    }
}
