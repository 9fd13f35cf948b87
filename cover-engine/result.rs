use std::fmt;

use crate::metadata::BookMetadata;

/// Axis-aligned box in query frame pixels; zero size means "no box"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub const EMPTY: BoundingBox = BoundingBox { x: 0, y: 0, width: 0, height: 0 };

    /// Box of the given size around a centre point.
    ///
    /// The half extents use integer division and the corner is truncated
    /// towards zero, so it may lie outside the frame.
    pub fn centered_on(cx: f32, cy: f32, width: u32, height: u32) -> Self {
        Self {
            x: (cx - (width / 2) as f32) as i32,
            y: (cy - (height / 2) as f32) as i32,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Outcome of one recognition run.
///
/// A box and metadata can only be present together with a label.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchResult {
    label: Option<String>,
    confidence: f32,
    bounding_box: BoundingBox,
    good_matches: usize,
    metadata: Option<BookMetadata>,
}

impl MatchResult {
    /// The "no detection" result
    pub fn none() -> Self {
        Self::default()
    }

    pub fn detected(
        label: impl Into<String>,
        confidence: f32,
        bounding_box: BoundingBox,
        good_matches: usize,
        metadata: Option<BookMetadata>,
    ) -> Self {
        Self {
            label: Some(label.into()),
            confidence,
            bounding_box,
            good_matches,
            metadata,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn good_matches(&self) -> usize {
        self.good_matches
    }

    pub fn metadata(&self) -> Option<&BookMetadata> {
        self.metadata.as_ref()
    }

    pub fn is_detection(&self) -> bool {
        self.label.is_some()
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => {
                let b = self.bounding_box;
                write!(
                    f,
                    "{} (confidence {:.2}, {} good matches) at ({}, {}) {}x{}",
                    label, self.confidence, self.good_matches, b.x, b.y, b.width, b.height
                )
            }
            None => write!(f, "No book detected"),
        }
    }
}
