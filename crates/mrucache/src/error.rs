//! Error types for mrucache

use std::fmt;

/// Result type alias for mrucache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Capacity must be at least one slot
    InvalidCapacity(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity(capacity) => {
                write!(f, "Invalid capacity: {} (must be at least 1)", capacity)
            }
        }
    }
}

impl std::error::Error for Error {}
