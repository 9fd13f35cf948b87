use std::time::Duration;

use cover_core::ExtractorConfig;
use cover_fast::FastDetector;
use crate::error::{EngineError, EngineResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Where the reported box is anchored among the winner's good correspondences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BoxPolicy {
    /// Mean query-side location of all good correspondences
    #[default]
    Centroid,
    /// Query-side location of the last good correspondence
    LastMatch,
}

/// How several reference images sharing one label are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LabelPolicy {
    /// Later images replace earlier ones; one view per label
    #[default]
    Overwrite,
    /// Every usable image becomes a view; a label scores as its best view
    Aggregate,
}

/// Matching, scoring and acceptance settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatchingConfig {
    /// Correspondences at or above this Hamming distance are not good
    pub max_distance: u32,
    pub cross_check: bool,
    /// Queries with fewer descriptors are rejected before matching
    pub min_query_descriptors: usize,
    /// Queries are truncated to this many descriptors
    pub max_query_descriptors: usize,
    pub confidence_scale: f32,
    /// Acceptance needs strictly more good matches than this
    pub min_good_matches: usize,
    /// Acceptance needs a strictly higher confidence than this
    pub min_confidence: f32,
    /// Fraction of the reference image size used for the box
    pub box_scale: f32,
    pub box_policy: BoxPolicy,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_distance: 50,
            cross_check: true,
            min_query_descriptors: 100,
            max_query_descriptors: 1000,
            confidence_scale: 1000.0,
            min_good_matches: 50,
            min_confidence: 0.4,
            box_scale: 0.6,
            box_policy: BoxPolicy::Centroid,
        }
    }
}

/// Recognition pacing relative to frame delivery
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SchedulerConfig {
    pub cooldown_ms: u64,
    /// Only every Nth delivered frame is offered for recognition
    pub decimation: u64,
    pub tick_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: 1500,
            decimation: 30,
            tick_ms: 20,
        }
    }
}

impl SchedulerConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Complete engine configuration with all settings
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    pub extractor: ExtractorConfig,
    pub matching: MatchingConfig,
    pub scheduler: SchedulerConfig,
    pub label_policy: LabelPolicy,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub description: Option<String>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fewer features and a coarser pyramid, for slow machines
    pub fn lightweight_preset() -> Self {
        Self {
            extractor: ExtractorConfig {
                max_features: 2000,
                scale_factor: 1.2,
                n_levels: 6,
                ..ExtractorConfig::default()
            },
            name: Some("Lightweight".to_string()),
            description: Some("Reduced feature budget for low-power hosts".to_string()),
            ..Self::default()
        }
    }

    /// Add metadata to configuration
    pub fn with_metadata(mut self, name: &str, description: &str) -> Self {
        self.name = Some(name.to_string());
        self.description = Some(description.to_string());
        self
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "EngineConfig: features={}, scale={:.2}x{}, threshold={}, max_distance={}, query=[{}..{}], accept=[>{} matches, >{:.2} confidence], box={:?}, labels={:?}, cooldown={}ms, every {} frames",
            self.extractor.max_features,
            self.extractor.scale_factor,
            self.extractor.n_levels,
            self.extractor.threshold,
            self.matching.max_distance,
            self.matching.min_query_descriptors,
            self.matching.max_query_descriptors,
            self.matching.min_good_matches,
            self.matching.min_confidence,
            self.matching.box_policy,
            self.label_policy,
            self.scheduler.cooldown_ms,
            self.scheduler.decimation,
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> EngineResult<()> {
        FastDetector::new(self.extractor.clone())?;

        let m = &self.matching;
        if m.max_distance == 0 || m.max_distance > cover_core::DESCRIPTOR_BITS + 1 {
            return Err(EngineError::InvalidConfig(format!(
                "max_distance {} outside 1..={}",
                m.max_distance,
                cover_core::DESCRIPTOR_BITS + 1
            )));
        }
        if m.max_query_descriptors == 0 || m.min_query_descriptors > m.max_query_descriptors {
            return Err(EngineError::InvalidConfig(format!(
                "query descriptor bounds {}..{} are empty",
                m.min_query_descriptors, m.max_query_descriptors
            )));
        }
        if !(m.confidence_scale > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "confidence_scale {} must be positive",
                m.confidence_scale
            )));
        }
        if !(m.box_scale > 0.0) || !m.box_scale.is_finite() {
            return Err(EngineError::InvalidConfig(format!("box_scale {} must be positive", m.box_scale)));
        }
        if self.scheduler.decimation == 0 {
            return Err(EngineError::InvalidConfig("decimation must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load configuration, picking JSON or TOML from the file extension
    #[cfg(feature = "serde")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::load_json(path),
            Some("toml") => Self::load_toml(path),
            _ => Err(EngineError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> EngineResult<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json).map_err(EngineError::io(path.as_ref()))
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(EngineError::io(path.as_ref()))?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> EngineResult<()> {
        let toml = self.to_toml()?;
        std::fs::write(path.as_ref(), toml).map_err(EngineError::io(path.as_ref()))
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(EngineError::io(path.as_ref()))?;
        Self::from_toml(&content)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> EngineResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_recognition_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.matching.max_distance, 50);
        assert_eq!(config.matching.min_query_descriptors, 100);
        assert_eq!(config.matching.max_query_descriptors, 1000);
        assert_eq!(config.matching.min_good_matches, 50);
        assert_eq!(config.scheduler.cooldown(), Duration::from_millis(1500));
        assert_eq!(config.scheduler.decimation, 30);
        assert_eq!(config.label_policy, LabelPolicy::Overwrite);
        assert!(config.validate().is_ok());
        assert!(EngineConfig::lightweight_preset().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.matching.min_query_descriptors = 2000;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.scheduler.decimation = 0;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.matching.box_scale = f32::NAN;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));

        let mut config = EngineConfig::default();
        config.extractor.threshold = 0;
        assert!(matches!(config.validate(), Err(EngineError::Fast(_))));
    }

    #[test]
    fn test_summary_mentions_key_settings() {
        let summary = EngineConfig::default().summary();
        assert!(summary.contains("features=8000"));
        assert!(summary.contains("cooldown=1500ms"));
        assert!(summary.contains("every 30 frames"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_and_toml_round_trip() {
        let config = EngineConfig::lightweight_preset().with_metadata("Desk", "Desk camera");
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
        let toml = config.to_toml().unwrap();
        assert_eq!(EngineConfig::from_toml(&toml).unwrap(), config);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_load_rejects_unknown_extension() {
        let err = EngineConfig::load("settings.yaml").unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedFormat(_)));
    }
}
