//! Error types for NNUE codec operations.

use std::fmt;

/// Error type for decode, encode and shape-replacement failures
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NnueError {
    /// Buffer ended before the declared layout was fully read
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// Architecture string length field is negative
    NegativeStringLength { size: i32 },
    /// Architecture string is not valid UTF-8
    ArchitectureNotUtf8 { offset: usize },
    /// Bytes remain after the last network layer
    TrailingBytes { consumed: usize, len: usize },
    /// Replacement container length disagrees with the declared dimensions
    ShapeMismatch { expected: usize, found: usize },
    /// Encode requested before a successful decode
    NotLoaded,
}

impl fmt::Display for NnueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NnueError::UnexpectedEof {
                offset,
                needed,
                available,
            } => {
                write!(
                    f,
                    "Buffer too short: need {needed} bytes at offset {offset}, {available} available"
                )
            }
            NnueError::NegativeStringLength { size } => {
                write!(f, "Architecture string length {size} is negative")
            }
            NnueError::ArchitectureNotUtf8 { offset } => {
                write!(f, "Architecture string at offset {offset} is not valid UTF-8")
            }
            NnueError::TrailingBytes { consumed, len } => {
                write!(
                    f,
                    "Buffer has {len} bytes but the layout ends at {consumed}"
                )
            }
            NnueError::ShapeMismatch { expected, found } => {
                write!(
                    f,
                    "Replacement has {found} elements, declared shape requires {expected}"
                )
            }
            NnueError::NotLoaded => {
                write!(f, "No bytes loaded: call set_bytes before to_bytes")
            }
        }
    }
}

impl std::error::Error for NnueError {}
