//! Whole-file NNUE assembly and disassembly.
//!
//! [`Nnue`] owns the decoded layers and, once loaded, the original file bytes
//! plus the recorded section offsets. The header fields (version, hash) and
//! the 4-byte sub-header before each parameter section are opaque: they are
//! read only to advance the offset and are reproduced verbatim on encode from
//! the retained buffer, never reinterpreted.

use crate::affine::AffineTransform;
use crate::error::NnueError;
use crate::feature_transform::FeatureTransform;

/// Feature count of the default (original) configuration
pub const DEFAULT_FEATURE_DIMENSIONS: usize = 125_388;

/// Layer node counts of the default configuration. The first entry counts
/// both perspectives; the feature transform's output dimension is half of it.
pub const DEFAULT_NETWORK_DIMENSIONS: [usize; 4] = [512, 32, 32, 1];

/// Opaque sub-header preceding each parameter section
const SECTION_HEADER_SIZE: usize = 4;

/// State retained by a successful [`Nnue::set_bytes`]
#[derive(Debug, Clone)]
struct Loaded {
    /// The entire original buffer, kept unmodified for verbatim reproduction
    /// of the header, sub-headers and any bytes outside the parameter regions
    bytes: Vec<u8>,
    architecture: String,
    feature_transform_start: usize,
    network_start: usize,
}

/// An NNUE weight file: decoded parameter arrays plus the retained bytes.
///
/// Construction fixes the shape; [`set_bytes`](Self::set_bytes) populates the
/// parameters from a file buffer and [`to_bytes`](Self::to_bytes) rebuilds a
/// buffer reflecting any edits made in between. Unedited regions round-trip
/// byte-for-byte.
///
/// Fully synchronous and single-threaded; concurrent mutation of one instance
/// must be serialized by the caller.
#[derive(Debug, Clone)]
pub struct Nnue {
    feature_dimensions: usize,
    network_dimensions: Vec<usize>,
    feature_transform: FeatureTransform,
    network: Vec<AffineTransform>,
    loaded: Option<Loaded>,
}

impl Nnue {
    /// Create an unloaded instance with zero-valued, correctly-shaped layers.
    ///
    /// `network_dimensions[i]` and `network_dimensions[i + 1]` become layer
    /// *i*'s input and output dimensions. The feature transform maps
    /// `feature_dimensions` inputs to `network_dimensions[0] / 2` outputs
    /// (the first layer dimension counts both perspectives).
    ///
    /// # Panics
    ///
    /// Panics if `network_dimensions` is empty.
    #[must_use]
    pub fn new(feature_dimensions: usize, network_dimensions: &[usize]) -> Self {
        assert!(
            !network_dimensions.is_empty(),
            "network_dimensions must name at least the first layer dimension"
        );
        let transformed = network_dimensions[0] / 2;
        let network = network_dimensions
            .windows(2)
            .map(|pair| AffineTransform::new(pair[0], pair[1]))
            .collect();
        Self {
            feature_dimensions,
            network_dimensions: network_dimensions.to_vec(),
            feature_transform: FeatureTransform::new(feature_dimensions, transformed),
            network,
            loaded: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn feature_dimensions(&self) -> usize {
        self.feature_dimensions
    }

    #[must_use]
    pub fn network_dimensions(&self) -> &[usize] {
        &self.network_dimensions
    }

    #[must_use]
    pub fn feature_transform(&self) -> &FeatureTransform {
        &self.feature_transform
    }

    pub fn feature_transform_mut(&mut self) -> &mut FeatureTransform {
        &mut self.feature_transform
    }

    /// Layers in file order. The slice cannot grow or shrink; layer values
    /// are edited through each [`AffineTransform`].
    #[must_use]
    pub fn network(&self) -> &[AffineTransform] {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut [AffineTransform] {
        &mut self.network
    }

    #[inline]
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Architecture string from the file header, once loaded
    #[must_use]
    pub fn architecture(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.architecture.as_str())
    }

    /// Offset of the feature-transform section (its 4-byte sub-header)
    #[must_use]
    pub fn feature_transform_start(&self) -> Option<usize> {
        self.loaded.as_ref().map(|l| l.feature_transform_start)
    }

    /// Offset of the network section (its 4-byte sub-header)
    #[must_use]
    pub fn network_start(&self) -> Option<usize> {
        self.loaded.as_ref().map(|l| l.network_start)
    }

    /// Decode a whole weight file.
    ///
    /// Parses the header (version, hash, architecture string), then the
    /// feature-transform section and each network layer in declared order,
    /// recording where the two sections start. The buffer is retained so
    /// [`to_bytes`](Self::to_bytes) can reproduce opaque bytes verbatim.
    ///
    /// On failure the instance keeps whatever state it had before the call;
    /// no half-populated load is ever observable. A second successful call
    /// replaces all previous state.
    pub fn set_bytes(&mut self, bytes: Vec<u8>) -> Result<(), NnueError> {
        let mut offset = 0;
        let _version = read_i32(&bytes, offset)?;
        offset += 4;
        let _hash = read_i32(&bytes, offset)?;
        offset += 4;
        let size = read_i32(&bytes, offset)?;
        offset += 4;
        let size = usize::try_from(size).map_err(|_| NnueError::NegativeStringLength { size })?;

        let arch_bytes = bytes
            .get(offset..offset + size)
            .ok_or_else(|| NnueError::UnexpectedEof {
                offset,
                needed: size,
                available: bytes.len().saturating_sub(offset),
            })?;
        let architecture = std::str::from_utf8(arch_bytes)
            .map_err(|_| NnueError::ArchitectureNotUtf8 { offset })?
            .to_owned();
        offset += size;

        let feature_transform_start = offset;
        let _sub_header = read_i32(&bytes, offset)?;
        offset += SECTION_HEADER_SIZE;
        let transformed = self.network_dimensions[0] / 2;
        let (feature_transform, next) =
            FeatureTransform::decode(self.feature_dimensions, transformed, &bytes, offset)?;
        offset = next;

        let network_start = offset;
        let _sub_header = read_i32(&bytes, offset)?;
        offset += SECTION_HEADER_SIZE;
        let mut network = Vec::with_capacity(self.network.len());
        for pair in self.network_dimensions.windows(2) {
            let (layer, next) = AffineTransform::decode(pair[0], pair[1], &bytes, offset)?;
            network.push(layer);
            offset = next;
        }

        if offset != bytes.len() {
            return Err(NnueError::TrailingBytes {
                consumed: offset,
                len: bytes.len(),
            });
        }

        #[cfg(feature = "logging")]
        log::debug!(
            "loaded NNUE: architecture {architecture:?}, feature transform at \
             {feature_transform_start}, network at {network_start}, {} bytes",
            bytes.len()
        );

        self.feature_transform = feature_transform;
        self.network = network;
        self.loaded = Some(Loaded {
            bytes,
            architecture,
            feature_transform_start,
            network_start,
        });
        Ok(())
    }

    /// Encode the current parameter values back into a file buffer.
    ///
    /// Starts from a copy of the retained buffer, then overwrites the two
    /// parameter regions (past each 4-byte sub-header) with fresh encodes.
    /// The result always has the original buffer's length; edits made through
    /// the transform accessors since [`set_bytes`](Self::set_bytes) are
    /// reflected. Idempotent and side-effect-free.
    pub fn to_bytes(&self) -> Result<Vec<u8>, NnueError> {
        let loaded = self.loaded.as_ref().ok_or(NnueError::NotLoaded)?;
        let mut out = loaded.bytes.clone();

        let section = self.feature_transform.encode();
        let start = loaded.feature_transform_start + SECTION_HEADER_SIZE;
        out[start..start + section.len()].copy_from_slice(&section);

        let mut offset = loaded.network_start + SECTION_HEADER_SIZE;
        for layer in &self.network {
            let section = layer.encode();
            out[offset..offset + section.len()].copy_from_slice(&section);
            offset += section.len();
        }
        debug_assert_eq!(offset, out.len());

        Ok(out)
    }
}

impl Default for Nnue {
    /// The original configuration: 125388 features, layers 512-32-32-1
    fn default() -> Self {
        Self::new(DEFAULT_FEATURE_DIMENSIONS, &DEFAULT_NETWORK_DIMENSIONS)
    }
}

/// Read a little-endian i32, failing if the buffer ends first
fn read_i32(bytes: &[u8], offset: usize) -> Result<i32, NnueError> {
    let slice = bytes
        .get(offset..offset + 4)
        .ok_or_else(|| NnueError::UnexpectedEof {
            offset,
            needed: 4,
            available: bytes.len().saturating_sub(offset),
        })?;
    Ok(i32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}
