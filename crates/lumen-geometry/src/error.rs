use lumen_core::CoreError;

/// Errors raised while building geometry types.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("Invalid image size {rows}x{cols}: rows and cols must be non-negative")]
    InvalidShape { rows: i64, cols: i64 },

    #[error("Invalid channel count {0}: must be at least 1")]
    InvalidChannelCount(i64),

    #[error("Image tensor must be 2-D or 3-D, got {0}-D")]
    UnsupportedRank(usize),

    #[error("Image tensor must be contiguous")]
    NonContiguousStorage,

    #[error(transparent)]
    Tensor(#[from] CoreError),

    #[error("Invalid image descriptor: {0}")]
    Config(#[from] serde_json::Error),
}

impl GeometryError {
    /// Whether the caller passed arguments that no image can be built from,
    /// as opposed to a failure in the tensor layer or configuration parsing.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            GeometryError::InvalidShape { .. }
                | GeometryError::InvalidChannelCount(_)
                | GeometryError::UnsupportedRank(_)
                | GeometryError::NonContiguousStorage
        )
    }
}
