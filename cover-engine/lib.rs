//! Book-cover recognition against a fixed set of reference images.
//!
//! A [`ReferenceDatabase`] is built once from a folder of labelled covers.
//! [`RecognitionEngine`] extracts ORB features from a frame, cross-checks
//! them against every label and accepts the best label only when enough
//! good matches support it. [`RecognitionScheduler`] bounds how often that
//! expensive work runs relative to frame delivery and publishes the latest
//! result through a [`ResultCell`].

pub mod builder;
pub mod clock;
pub mod config;
pub mod database;
pub mod display;
pub mod error;
pub mod extractor;
pub mod frame;
pub mod matcher;
pub mod metadata;
pub mod recognizer;
pub mod result;
pub mod scheduler;
pub mod state;

pub use builder::EngineBuilder;
pub use clock::{Clock, Cooldown, ManualClock, MonotonicClock};
pub use config::{BoxPolicy, EngineConfig, LabelPolicy, MatchingConfig, SchedulerConfig};
pub use database::{DatabaseBuilder, ReferenceDatabase, ReferenceEntry, ReferenceView};
pub use display::{DisplayLoop, DisplayStats, FrameSource};
pub use error::{EngineError, EngineResult};
pub use extractor::{FeatureExtractor, OrbExtractor};
pub use frame::{frame_from_image, frame_from_luma, load_frame};
pub use matcher::{Correspondence, Matcher};
pub use metadata::{BookMetadata, MetadataError, MetadataLookup, NoMetadata, StaticCatalog};
pub use recognizer::{confidence, RecognitionEngine};
pub use result::{BoundingBox, MatchResult};
pub use scheduler::{Offer, RecognitionScheduler, Recognize};
pub use state::{ResultCell, Snapshot};
