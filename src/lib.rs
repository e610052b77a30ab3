//! Byte-exact codec for NNUE weight files.
//!
//! Parses a whole-file byte buffer into typed parameter arrays (biases and
//! weight matrices), lets callers edit them in place, and rebuilds a buffer
//! in which every unedited byte — header, opaque sub-headers included — is
//! reproduced verbatim.
//!
//! # Example
//! ```
//! use nnue_codec::Nnue;
//!
//! let mut nnue = Nnue::new(4, &[4, 2, 1]);
//! assert!(!nnue.is_loaded());
//! assert_eq!(nnue.network().len(), 2);
//! assert_eq!(nnue.feature_transform().output_dimension(), 2);
//! ```

pub mod affine;
pub mod error;
pub mod feature_transform;
pub mod network;

pub use affine::AffineTransform;
pub use error::NnueError;
pub use feature_transform::FeatureTransform;
pub use network::{Nnue, DEFAULT_FEATURE_DIMENSIONS, DEFAULT_NETWORK_DIMENSIONS};
