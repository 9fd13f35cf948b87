//! Descriptive metadata for recognised labels.
//!
//! Lookups happen only after a detection has been accepted. A lookup that
//! fails is logged by the caller and the detection is reported without
//! metadata.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const UNKNOWN: &str = "Unknown";
const NO_DESCRIPTION: &str = "No description available";

/// Bibliographic details for one cover
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BookMetadata {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub categories: Vec<String>,
    pub published_date: Option<String>,
    pub description: Option<String>,
}

impl BookMetadata {
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    /// Leading year of the publication date, which may be `YYYY`, `YYYY-MM` or `YYYY-MM-DD`
    pub fn year(&self) -> Option<&str> {
        self.published_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .filter(|year| !year.is_empty())
    }

    /// Multi-line text block for display, with placeholders for missing fields
    pub fn summary(&self) -> String {
        let list = |items: &[String]| {
            if items.is_empty() {
                UNKNOWN.to_string()
            } else {
                items.join(", ")
            }
        };
        format!(
            "Title: {}\nAuthor: {}\nGenre: {}\nYear: {}\nDescription: {}",
            self.title.as_deref().unwrap_or(UNKNOWN),
            list(&self.authors),
            list(&self.categories),
            self.year().unwrap_or(UNKNOWN),
            self.description.as_deref().unwrap_or(NO_DESCRIPTION),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    #[error("Metadata service unavailable: {0}")]
    Unavailable(String),
    #[error("Malformed metadata for '{label}': {reason}")]
    Malformed { label: String, reason: String },
}

/// Source of metadata for recognised labels.
///
/// `Ok(None)` means the label is simply unknown to the source.
pub trait MetadataLookup: Send + Sync {
    fn lookup(&self, label: &str) -> Result<Option<BookMetadata>, MetadataError>;
}

/// Lookup that never has anything to say
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataLookup for NoMetadata {
    fn lookup(&self, _label: &str) -> Result<Option<BookMetadata>, MetadataError> {
        Ok(None)
    }
}

/// In-memory catalogue keyed by label
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StaticCatalog {
    entries: HashMap<String, BookMetadata>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, metadata: BookMetadata) -> Option<BookMetadata> {
        self.entries.insert(label.into(), metadata)
    }

    pub fn with_entry(mut self, label: impl Into<String>, metadata: BookMetadata) -> Self {
        self.insert(label, metadata);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a JSON object mapping label to metadata
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> crate::error::EngineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> crate::error::EngineResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(crate::error::EngineError::io(path))?;
        Self::from_json(&content)
    }
}

impl FromIterator<(String, BookMetadata)> for StaticCatalog {
    fn from_iter<I: IntoIterator<Item = (String, BookMetadata)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl MetadataLookup for StaticCatalog {
    fn lookup(&self, label: &str) -> Result<Option<BookMetadata>, MetadataError> {
        Ok(self.entries.get(label).cloned())
    }
}
