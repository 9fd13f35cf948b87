use cover_core::{ExtractorConfig, Frame, Keypoint};
use log::trace;
use rayon::prelude::*;
use crate::corner_detection::CornerDetector;
use crate::error::{FastError, FastResult};
use crate::pyramid::ImagePyramid;
use crate::refinement::KeypointRefinement;
use crate::types::{PyramidLevel, ScaleLevel, ScoredKeypoint};

/// Main FAST corner detector with multi-scale capability
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: ExtractorConfig,
    border: usize,
}

impl FastDetector {
    /// Creates a new FAST detector with validation
    pub fn new(cfg: ExtractorConfig) -> FastResult<Self> {
        // 0 would detect everything, >127 overflows the signed comparisons
        if cfg.threshold == 0 || cfg.threshold > 127 {
            return Err(FastError::InvalidThreshold(cfg.threshold));
        }
        if cfg.patch_size % 2 == 0 || cfg.patch_size < 3 {
            return Err(FastError::InvalidPatchSize(cfg.patch_size));
        }
        if !(cfg.scale_factor > 1.0) || !cfg.scale_factor.is_finite() {
            return Err(FastError::InvalidScaleFactor(cfg.scale_factor));
        }
        if cfg.n_levels == 0 {
            return Err(FastError::InvalidLevelCount(cfg.n_levels));
        }
        if cfg.max_features == 0 {
            return Err(FastError::InvalidFeatureBudget(cfg.max_features));
        }

        // Orientation patch and Harris window must both fit inside the border
        let border = cfg.edge_threshold.max(cfg.patch_size / 2 + 1).max(4);

        Ok(Self { cfg, border })
    }

    /// Pixels kept free of keypoints along every image edge
    pub fn border(&self) -> usize {
        self.border
    }

    /// Smallest pyramid level side that can still hold a keypoint
    pub fn min_level_size(&self) -> usize {
        2 * self.border + 1
    }

    /// Scale levels the detector would use for an image of the given size
    pub fn scale_levels(&self, width: usize, height: usize) -> Vec<ScaleLevel> {
        ImagePyramid::generate_scale_levels(
            width,
            height,
            self.cfg.scale_factor,
            self.cfg.n_levels,
            self.min_level_size(),
        )
    }

    /// Split the feature budget geometrically over `levels` levels, finer levels first.
    ///
    /// Each level receives `1 / scale_factor` times the share of the level above;
    /// the last level absorbs rounding so the quotas always sum to the budget.
    pub fn features_per_level(&self, levels: usize) -> Vec<usize> {
        if levels == 0 {
            return Vec::new();
        }

        let factor = 1.0 / self.cfg.scale_factor as f64;
        let total = self.cfg.max_features;
        let mut desired = total as f64 * (1.0 - factor) / (1.0 - factor.powi(levels as i32));

        let mut quotas = Vec::with_capacity(levels);
        let mut assigned = 0usize;
        for _ in 0..levels - 1 {
            let quota = (desired.round() as usize).min(total - assigned);
            quotas.push(quota);
            assigned += quota;
            desired *= factor;
        }
        quotas.push(total - assigned);
        quotas
    }

    /// Detect oriented keypoints on every pyramid level.
    ///
    /// Levels are returned finest first; within a level keypoints are ordered
    /// strongest first. Frames too small for a single level yield no levels.
    pub fn detect(&self, frame: &Frame) -> FastResult<Vec<PyramidLevel>> {
        let scale_levels = self.scale_levels(frame.width(), frame.height());
        if scale_levels.is_empty() {
            trace!(
                "frame {}x{} smaller than minimum level size {}",
                frame.width(),
                frame.height(),
                self.min_level_size()
            );
            return Ok(Vec::new());
        }

        let quotas = self.features_per_level(scale_levels.len());
        let pyramid = ImagePyramid::build_image_pyramid(frame, &scale_levels);

        let levels = scale_levels
            .into_par_iter()
            .zip(pyramid)
            .zip(quotas)
            .map(|((scale, image), quota)| {
                let keypoints = self.detect_at_level(&image, &scale, quota);
                PyramidLevel { scale, image, keypoints }
            })
            .collect();

        Ok(levels)
    }

    /// Detect keypoints and flatten them into base image coordinates
    pub fn detect_keypoints(&self, frame: &Frame) -> FastResult<Vec<Keypoint>> {
        let levels = self.detect(frame)?;
        Ok(levels
            .iter()
            .flat_map(|level| level.keypoints.iter().map(move |sk| level.to_base(&sk.keypoint)))
            .collect())
    }

    fn detect_at_level(&self, image: &[u8], scale: &ScaleLevel, quota: usize) -> Vec<ScoredKeypoint> {
        let candidates = CornerDetector::detect(
            image,
            scale.width,
            scale.height,
            self.cfg.threshold,
            self.border,
            self.cfg.score_type,
        );
        let suppressed = KeypointRefinement::non_maximum_suppression(&candidates, scale.width, scale.height);
        let suppressed_len = suppressed.len();
        let mut best = KeypointRefinement::retain_best(suppressed, quota);

        let radius = self.cfg.patch_size / 2;
        for sk in best.iter_mut() {
            sk.keypoint.angle = KeypointRefinement::compute_orientation(
                image,
                scale.width,
                scale.height,
                sk.keypoint.x as usize,
                sk.keypoint.y as usize,
                radius,
            );
        }

        trace!(
            "level {}: {} candidates, {} after nms, kept {}",
            scale.level,
            candidates.len(),
            suppressed_len,
            best.len()
        );
        best
    }

    /// Get detector configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.cfg
    }
}
