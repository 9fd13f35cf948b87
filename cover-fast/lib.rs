//! Multi-scale FAST-9 keypoint detection.
//!
//! Corners are found on every level of a scale pyramid, ranked by a Harris
//! or FAST score, thinned by 3x3 non-maximum suppression and capped with a
//! per-level quota. Each surviving keypoint carries an intensity-centroid
//! orientation so that rotated BRIEF descriptors can be computed on it.

pub mod corner_detection;
pub mod detector;
pub mod error;
pub mod pyramid;
pub mod refinement;
pub mod types;
pub mod utils;

pub use detector::FastDetector;
pub use error::{FastError, FastResult};
pub use types::{PyramidLevel, ScaleLevel, ScoredKeypoint};
