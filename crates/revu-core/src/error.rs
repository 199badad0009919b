use thiserror::Error;

/// Failures raised before any scheduling or selection work begins.
///
/// An empty candidate pool or a budget too small for the first candidate is not
/// an error; those outcomes surface as a short (possibly empty) `AllocationResult`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("content '{content_id}' has zero duration")]
    ContentDurationZero { content_id: String },
}

impl CoreError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CoreError::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
