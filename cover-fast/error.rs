#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FastError {
    #[error("Invalid threshold: {0} (must be 1-127)")]
    InvalidThreshold(u8),
    #[error("Invalid patch size: {0} (must be odd and at least 3)")]
    InvalidPatchSize(usize),
    #[error("Invalid scale factor: {0} (must be > 1.0)")]
    InvalidScaleFactor(f32),
    #[error("Invalid pyramid level count: {0} (must be > 0)")]
    InvalidLevelCount(usize),
    #[error("Invalid feature budget: {0} (must be > 0)")]
    InvalidFeatureBudget(usize),
}

pub type FastResult<T> = Result<T, FastError>;
