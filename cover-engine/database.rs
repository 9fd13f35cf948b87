//! Immutable reference database built from a folder of labelled cover images.
//!
//! The expected layout is one sub-folder per label:
//!
//! ```text
//! covers/
//!   dune/front.jpg
//!   emma/cover.png
//! ```
//!
//! Folders and files are visited in name order so that two builds from the
//! same tree produce identical databases.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cover_core::DescriptorSet;
use log::{debug, info, warn};
use rayon::prelude::*;
use crate::config::LabelPolicy;
use crate::error::{EngineError, EngineResult};
use crate::extractor::FeatureExtractor;
use crate::frame::load_frame;

/// Features of one reference image
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceView {
    pub descriptors: DescriptorSet,
    /// Width and height of the source image in pixels
    pub dimensions: (u32, u32),
    pub source: Option<PathBuf>,
}

/// All stored views for one label
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceEntry {
    label: String,
    views: Vec<ReferenceView>,
}

impl ReferenceEntry {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn views(&self) -> &[ReferenceView] {
        &self.views
    }

    pub fn descriptor_count(&self) -> usize {
        self.views.iter().map(|v| v.descriptors.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceDatabase {
    entries: Vec<ReferenceEntry>,
}

impl ReferenceDatabase {
    /// Build from a directory tree, one sub-folder per label.
    ///
    /// Unreadable, undecodable or featureless images are logged and skipped.
    /// Fails when the root cannot be read or when no label ends up with a
    /// usable view.
    pub fn build<E>(root: &Path, extractor: &E, policy: LabelPolicy) -> EngineResult<Self>
    where
        E: FeatureExtractor + ?Sized,
    {
        let label_dirs = sorted_children(root)?
            .into_iter()
            .filter(|path| path.is_dir())
            .collect::<Vec<_>>();
        debug!("scanning {} label folders under {}", label_dirs.len(), root.display());

        let per_label: Vec<(String, Vec<ReferenceView>)> = label_dirs
            .par_iter()
            .filter_map(|dir| {
                let label = dir.file_name()?.to_string_lossy().into_owned();
                Some((label.clone(), load_label(&label, dir, extractor)))
            })
            .collect();

        let mut builder = DatabaseBuilder::new(policy);
        for (label, views) in per_label {
            for view in views {
                builder.insert(&label, view);
            }
        }

        let database = builder.finish();
        if database.is_empty() {
            return Err(EngineError::EmptyDatabase(root.to_path_buf()));
        }
        info!("Loaded book covers: {:?}", database.labels().collect::<Vec<_>>());
        Ok(database)
    }

    /// Entries in label order
    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn get(&self, label: &str) -> Option<&ReferenceEntry> {
        self.entries
            .binary_search_by(|entry| entry.label.as_str().cmp(label))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|entry| entry.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-memory construction of a [`ReferenceDatabase`]
#[derive(Debug, Clone, Default)]
pub struct DatabaseBuilder {
    policy: LabelPolicy,
    entries: BTreeMap<String, Vec<ReferenceView>>,
}

impl DatabaseBuilder {
    pub fn new(policy: LabelPolicy) -> Self {
        Self {
            policy,
            entries: BTreeMap::new(),
        }
    }

    /// Store a view under `label`. Views without descriptors are ignored and
    /// `false` is returned.
    pub fn insert(&mut self, label: &str, view: ReferenceView) -> bool {
        if view.descriptors.is_empty() {
            return false;
        }
        let views = self.entries.entry(label.to_string()).or_default();
        if self.policy == LabelPolicy::Overwrite {
            views.clear();
        }
        views.push(view);
        true
    }

    pub fn with_view(mut self, label: &str, view: ReferenceView) -> Self {
        self.insert(label, view);
        self
    }

    pub fn finish(self) -> ReferenceDatabase {
        ReferenceDatabase {
            entries: self
                .entries
                .into_iter()
                .map(|(label, views)| ReferenceEntry { label, views })
                .collect(),
        }
    }
}

fn sorted_children(dir: &Path) -> EngineResult<Vec<PathBuf>> {
    let mut children = fs::read_dir(dir)
        .map_err(EngineError::io(dir))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(EngineError::io(dir))?;
    children.sort();
    Ok(children)
}

/// Extract every usable image in one label folder, in name order
fn load_label<E>(label: &str, dir: &Path, extractor: &E) -> Vec<ReferenceView>
where
    E: FeatureExtractor + ?Sized,
{
    let files = match sorted_children(dir) {
        Ok(files) => files,
        Err(e) => {
            warn!("skipping label {}: {}", label, e);
            return Vec::new();
        }
    };

    let mut views = Vec::new();
    for path in files.into_iter().filter(|p| p.is_file()) {
        let frame = match load_frame(&path) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let descriptors = match extractor.extract(&frame) {
            Ok(set) => set,
            Err(e) => {
                warn!("feature extraction failed for {}: {}", path.display(), e);
                continue;
            }
        };
        if descriptors.is_empty() {
            info!("No descriptors found for {} in {}", label, path.display());
            continue;
        }

        info!("Loaded {} descriptors for {} from {}", descriptors.len(), label, path.display());
        views.push(ReferenceView {
            descriptors,
            dimensions: (frame.width() as u32, frame.height() as u32),
            source: Some(path),
        });
    }
    views
}
