use std::path::PathBuf;

use cover_brief::BriefError;
use cover_core::FrameError;
use cover_fast::FastError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("FAST error: {0}")]
    Fast(#[from] FastError),
    #[error("BRIEF error: {0}")]
    Brief(#[from] BriefError),
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode image {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("No usable reference images found under {}", .0.display())]
    EmptyDatabase(PathBuf),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Unsupported configuration format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[cfg(feature = "serde")]
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[cfg(feature = "serde")]
    #[error("TOML encode error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl EngineError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| EngineError::Io { path, source }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
