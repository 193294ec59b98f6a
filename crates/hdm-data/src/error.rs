/// Errors from data buffer operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DataError {
    /// Append/extend on a representation that cannot grow.
    #[error("cannot grow data held as '{representation}'")]
    UnsupportedMutation { representation: String },

    /// An element index past the end of the buffer.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A store was asked to grow past its maximum length.
    #[error("cannot resize to {requested}: maximum length is {max}")]
    ResizeBeyondMax { requested: usize, max: usize },

    /// Failure reported by an [`ExternalStore`](crate::ExternalStore)
    /// implementation, such as an I/O error in a file-backed dataset.
    /// The crate's own stores never produce it.
    #[error("store error: {0}")]
    Store(String),
}

/// Result alias for data operations.
pub type DataResult<T> = Result<T, DataError>;
