//! Error types for store operations.

use std::error::Error;
use std::fmt;

/// Errors that can occur during store and vector operations.
///
/// Misuse of already-destroyed internal handles (the double-destroy class)
/// is not represented here: it cannot be reached through the safe public
/// surface, so it is checked with `debug_assert!` inside the crate instead
/// of being reported to callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// A buffer request (construction, growth, reserve, or clone target)
    /// could not be satisfied, including size arithmetic that overflowed.
    AllocationFailed {
        /// Number of bytes requested.
        bytes: usize,
    },
    /// A bounds-checked access received an index past the end.
    OutOfBounds {
        /// The offending index.
        index: usize,
        /// Number of elements in the collection.
        len: usize,
    },
    /// An erase range was inverted or extended past the end.
    InvalidRange {
        /// Start of the half-open range.
        start: usize,
        /// End of the half-open range.
        end: usize,
        /// Number of elements in the collection.
        len: usize,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { bytes } => {
                write!(f, "buffer allocation of {bytes} bytes failed")
            }
            Self::OutOfBounds { index, len } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::InvalidRange { start, end, len } => {
                write!(f, "invalid range {start}..{end} for length {len}")
            }
        }
    }
}

impl Error for StoreError {}
