use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cover_core::ScoreType;
use crate::config::{BoxPolicy, EngineConfig, LabelPolicy};
use crate::database::ReferenceDatabase;
use crate::error::EngineResult;
use crate::extractor::{FeatureExtractor, OrbExtractor};
use crate::metadata::{MetadataLookup, NoMetadata};
use crate::recognizer::RecognitionEngine;

/// Builder for creating a `RecognitionEngine`
#[derive(Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    metadata: Option<Arc<dyn MetadataLookup>>,
    extractor: Option<Arc<dyn FeatureExtractor>>,
}

impl EngineBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Set the FAST threshold (1-127)
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.config.extractor.threshold = threshold;
        self
    }

    /// Set the feature budget shared by all pyramid levels
    pub fn max_features(mut self, max_features: usize) -> Self {
        self.config.extractor.max_features = max_features;
        self
    }

    pub fn scale_factor(mut self, scale_factor: f32) -> Self {
        self.config.extractor.scale_factor = scale_factor;
        self
    }

    pub fn levels(mut self, n_levels: usize) -> Self {
        self.config.extractor.n_levels = n_levels;
        self
    }

    pub fn score_type(mut self, score_type: ScoreType) -> Self {
        self.config.extractor.score_type = score_type;
        self
    }

    /// Set the number of threads for parallel processing
    pub fn threads(mut self, n_threads: usize) -> Self {
        self.config.extractor.n_threads = n_threads;
        self
    }

    /// Hamming distance below which a correspondence counts as good
    pub fn max_distance(mut self, max_distance: u32) -> Self {
        self.config.matching.max_distance = max_distance;
        self
    }

    pub fn box_policy(mut self, policy: BoxPolicy) -> Self {
        self.config.matching.box_policy = policy;
        self
    }

    pub fn label_policy(mut self, policy: LabelPolicy) -> Self {
        self.config.label_policy = policy;
        self
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.scheduler.cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    pub fn decimation(mut self, every: u64) -> Self {
        self.config.scheduler.decimation = every;
        self
    }

    /// Source of metadata for accepted detections
    pub fn metadata<M: MetadataLookup + 'static>(mut self, lookup: M) -> Self {
        self.metadata = Some(Arc::new(lookup));
        self
    }

    /// Replace the ORB extractor, e.g. with a precomputed one
    pub fn extractor(mut self, extractor: Arc<dyn FeatureExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validated extractor this builder would use
    pub fn build_extractor(&self) -> EngineResult<Arc<dyn FeatureExtractor>> {
        self.config.validate()?;
        match &self.extractor {
            Some(extractor) => Ok(Arc::clone(extractor)),
            None => Ok(Arc::new(OrbExtractor::new(self.config.extractor.clone())?)),
        }
    }

    /// Build an engine over an existing database
    pub fn build(self, database: Arc<ReferenceDatabase>) -> EngineResult<RecognitionEngine> {
        let extractor = self.build_extractor()?;
        Ok(self.assemble(extractor, database))
    }

    /// Build the reference database from `root` and an engine over it
    pub fn build_from_directory(self, root: &Path) -> EngineResult<RecognitionEngine> {
        let extractor = self.build_extractor()?;
        let database = ReferenceDatabase::build(root, extractor.as_ref(), self.config.label_policy)?;
        Ok(self.assemble(extractor, Arc::new(database)))
    }

    fn assemble(self, extractor: Arc<dyn FeatureExtractor>, database: Arc<ReferenceDatabase>) -> RecognitionEngine {
        let metadata = self.metadata.unwrap_or_else(|| Arc::new(NoMetadata));
        RecognitionEngine::new(extractor, database, metadata, self.config.matching)
    }
}
