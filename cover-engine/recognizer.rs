use std::sync::Arc;

use cover_core::{DescriptorSet, Frame};
use log::{debug, info, warn};
use crate::config::{BoxPolicy, MatchingConfig};
use crate::database::{ReferenceDatabase, ReferenceView};
use crate::extractor::FeatureExtractor;
use crate::matcher::{Correspondence, Matcher};
use crate::metadata::MetadataLookup;
use crate::result::{BoundingBox, MatchResult};

/// Score for `good` matches out of `query_len` query descriptors.
///
/// Rewards both the matched fraction of the query and the absolute number of
/// matches; non-decreasing in `good` for a fixed query length.
pub fn confidence(good: usize, query_len: usize, scale: f32) -> f32 {
    if query_len == 0 {
        return 0.0;
    }
    good as f32 / query_len as f32 + good as f32 / scale
}

/// Best-scoring reference among all labels
struct Candidate<'a> {
    label: &'a str,
    view: &'a ReferenceView,
    good: Vec<Correspondence>,
}

/// Recognises covers in frames against a fixed reference database
#[derive(Clone)]
pub struct RecognitionEngine {
    extractor: Arc<dyn FeatureExtractor>,
    database: Arc<ReferenceDatabase>,
    matcher: Matcher,
    metadata: Arc<dyn MetadataLookup>,
    config: MatchingConfig,
}

impl RecognitionEngine {
    pub fn new(
        extractor: Arc<dyn FeatureExtractor>,
        database: Arc<ReferenceDatabase>,
        metadata: Arc<dyn MetadataLookup>,
        config: MatchingConfig,
    ) -> Self {
        let matcher = Matcher::new(config.max_distance).with_cross_check(config.cross_check);
        Self {
            extractor,
            database,
            matcher,
            metadata,
            config,
        }
    }

    pub fn database(&self) -> &ReferenceDatabase {
        &self.database
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Extract features from `frame` and recognise them.
    ///
    /// Extraction failures are logged and reported as "no detection".
    pub fn recognize(&self, frame: &Frame) -> MatchResult {
        match self.extractor.extract(frame) {
            Ok(query) => self.recognize_descriptors(query),
            Err(e) => {
                warn!("feature extraction failed on {}x{} frame: {}", frame.width(), frame.height(), e);
                MatchResult::none()
            }
        }
    }

    /// Match an already extracted query against every reference label
    pub fn recognize_descriptors(&self, mut query: DescriptorSet) -> MatchResult {
        if query.len() < self.config.min_query_descriptors {
            debug!(
                "query has {} descriptors, need {}",
                query.len(),
                self.config.min_query_descriptors
            );
            return MatchResult::none();
        }
        query.truncate(self.config.max_query_descriptors);

        let Some(best) = self.best_candidate(&query) else {
            debug!("No reliable match found. Matches: 0, Confidence: 0.00");
            return MatchResult::none();
        };

        let count = best.good.len();
        let conf = confidence(count, query.len(), self.config.confidence_scale);
        if count <= self.config.min_good_matches || conf <= self.config.min_confidence {
            debug!(
                "No reliable match found. Matches: {}, Confidence: {:.2} (best {})",
                count, conf, best.label
            );
            return MatchResult::none();
        }

        let bounding_box = self.bounding_box(&best, &query);
        let metadata = match self.metadata.lookup(best.label) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Error fetching book details for {}: {}", best.label, e);
                None
            }
        };

        info!(
            "Recognized Book: {} with {} good matches and confidence {:.2}",
            best.label, count, conf
        );
        MatchResult::detected(best.label, conf, bounding_box, count, metadata)
    }

    /// Highest good-match count over every view; the first label reaching it wins
    fn best_candidate<'a>(&'a self, query: &DescriptorSet) -> Option<Candidate<'a>> {
        let mut best: Option<Candidate<'a>> = None;
        for entry in self.database.entries() {
            for view in entry.views() {
                let good = self
                    .matcher
                    .good_matches(self.matcher.match_sets(&view.descriptors, query));
                let best_count = best.as_ref().map_or(0, |b| b.good.len());
                if good.len() > best_count {
                    best = Some(Candidate {
                        label: entry.label(),
                        view,
                        good,
                    });
                }
            }
        }
        best
    }

    fn bounding_box(&self, best: &Candidate<'_>, query: &DescriptorSet) -> BoundingBox {
        let (ref_w, ref_h) = best.view.dimensions;
        let width = (ref_w as f32 * self.config.box_scale) as u32;
        let height = (ref_h as f32 * self.config.box_scale) as u32;

        let points: Vec<(f32, f32)> = best
            .good
            .iter()
            .filter_map(|c| query.get(c.query_index))
            .map(|f| (f.keypoint.x, f.keypoint.y))
            .collect();
        if points.is_empty() {
            return BoundingBox::EMPTY;
        }

        let (cx, cy) = match self.config.box_policy {
            BoxPolicy::Centroid => {
                let n = points.len() as f32;
                let (sx, sy) = points.iter().fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
                (sx / n, sy / n)
            }
            BoxPolicy::LastMatch => points[points.len() - 1],
        };
        BoundingBox::centered_on(cx, cy, width, height)
    }
}

impl std::fmt::Debug for RecognitionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecognitionEngine")
            .field("labels", &self.database.len())
            .field("matcher", &self.matcher)
            .field("config", &self.config)
            .finish()
    }
}
