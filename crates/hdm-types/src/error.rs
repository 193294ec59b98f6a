use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    /// The object name is not usable as a path component.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

/// Convenience alias for type-level results.
pub type TypeResult<T> = Result<T, TypeError>;
