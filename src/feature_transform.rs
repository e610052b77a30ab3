//! Feature-transform layer codec.
//!
//! The feature transform is the first, widest layer of the network. Its
//! parameters are 16-bit, and its weight matrix is stored in *(input, output)*
//! order — transposed relative to [`AffineTransform`](crate::AffineTransform) —
//! because incremental accumulator updates walk the weights by input index.
//! That index order is part of the file layout and must not be "fixed".

use crate::error::NnueError;

/// Biases and weights of the feature-transform layer.
///
/// Dimensions are fixed at construction. Slice views (`biases_mut`,
/// `weights_mut`) allow element edits but cannot change the shape; wholesale
/// replacement goes through [`set_biases`](Self::set_biases) /
/// [`set_weights`](Self::set_weights), which reject mismatched lengths.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FeatureTransform {
    input_dimension: usize,
    output_dimension: usize,
    /// `output_dimension` entries
    biases: Vec<i16>,
    /// `input_dimension * output_dimension` entries, (input, output) row-major
    weights: Vec<i16>,
}

impl FeatureTransform {
    /// Create a zero-valued transform with the given shape
    #[must_use]
    pub fn new(input_dimension: usize, output_dimension: usize) -> Self {
        Self {
            input_dimension,
            output_dimension,
            biases: vec![0; output_dimension],
            weights: vec![0; input_dimension * output_dimension],
        }
    }

    #[inline]
    #[must_use]
    pub fn input_dimension(&self) -> usize {
        self.input_dimension
    }

    #[inline]
    #[must_use]
    pub fn output_dimension(&self) -> usize {
        self.output_dimension
    }

    /// Encoded size in bytes, excluding the preceding 4-byte sub-header.
    ///
    /// A pure function of the dimensions; `decode` consumes exactly this many
    /// bytes and `encode` produces exactly this many.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        byte_len(self.input_dimension, self.output_dimension)
    }

    #[must_use]
    pub fn biases(&self) -> &[i16] {
        &self.biases
    }

    pub fn biases_mut(&mut self) -> &mut [i16] {
        &mut self.biases
    }

    #[must_use]
    pub fn weights(&self) -> &[i16] {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut [i16] {
        &mut self.weights
    }

    /// Weight for `input` feature feeding `output` node
    #[inline]
    #[must_use]
    pub fn weight(&self, input: usize, output: usize) -> i16 {
        self.weights[input * self.output_dimension + output]
    }

    #[inline]
    pub fn set_weight(&mut self, input: usize, output: usize, value: i16) {
        self.weights[input * self.output_dimension + output] = value;
    }

    /// Replace the whole bias vector, rejecting a length that disagrees with
    /// the declared output dimension
    pub fn set_biases(&mut self, biases: Vec<i16>) -> Result<(), NnueError> {
        if biases.len() != self.output_dimension {
            return Err(NnueError::ShapeMismatch {
                expected: self.output_dimension,
                found: biases.len(),
            });
        }
        self.biases = biases;
        Ok(())
    }

    /// Replace the whole weight matrix (flat, (input, output) row-major),
    /// rejecting a length that disagrees with the declared dimensions
    pub fn set_weights(&mut self, weights: Vec<i16>) -> Result<(), NnueError> {
        let expected = self.input_dimension * self.output_dimension;
        if weights.len() != expected {
            return Err(NnueError::ShapeMismatch {
                expected,
                found: weights.len(),
            });
        }
        self.weights = weights;
        Ok(())
    }

    /// Decode a feature-transform section starting at `offset`.
    ///
    /// Reads `output_dimension` little-endian i16 biases, then
    /// `input_dimension * output_dimension` little-endian i16 weights in
    /// (input, output) row-major order. Returns the transform and the offset
    /// immediately past the last weight byte. The caller consumes the 4-byte
    /// sub-header that precedes the section in the file.
    pub fn decode(
        input_dimension: usize,
        output_dimension: usize,
        bytes: &[u8],
        offset: usize,
    ) -> Result<(Self, usize), NnueError> {
        let needed = byte_len(input_dimension, output_dimension);
        let end = offset
            .checked_add(needed)
            .filter(|&end| end <= bytes.len())
            .ok_or_else(|| NnueError::UnexpectedEof {
                offset,
                needed,
                available: bytes.len().saturating_sub(offset),
            })?;

        let mut transform = Self::new(input_dimension, output_dimension);
        let mut at = offset;
        for bias in &mut transform.biases {
            *bias = i16::from_le_bytes([bytes[at], bytes[at + 1]]);
            at += 2;
        }
        // Weights are flat in (input, output) row-major order, matching the
        // file, so one sequential pass fills them.
        for weight in &mut transform.weights {
            *weight = i16::from_le_bytes([bytes[at], bytes[at + 1]]);
            at += 2;
        }
        debug_assert_eq!(at, end);

        Ok((transform, end))
    }

    /// Encode this section, excluding the 4-byte sub-header
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for &bias in &self.biases {
            out.extend_from_slice(&bias.to_le_bytes());
        }
        for &weight in &self.weights {
            out.extend_from_slice(&weight.to_le_bytes());
        }
        debug_assert_eq!(out.len(), self.byte_len());
        out
    }
}

/// Encoded section size for the given shape, excluding the sub-header
#[must_use]
pub(crate) fn byte_len(input_dimension: usize, output_dimension: usize) -> usize {
    output_dimension * 2 + input_dimension * output_dimension * 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let ft = FeatureTransform::new(4, 3);
        assert_eq!(ft.biases(), &[0; 3]);
        assert_eq!(ft.weights(), &[0; 12]);
        assert_eq!(ft.byte_len(), 3 * 2 + 4 * 3 * 2);
    }

    #[test]
    fn test_encode_is_little_endian() {
        let mut ft = FeatureTransform::new(0, 1);
        ft.biases_mut()[0] = 258;
        assert_eq!(ft.encode(), vec![0x02, 0x01]);
    }

    #[test]
    fn test_weight_index_is_input_major() {
        // 2 inputs x 3 outputs: file order is (input, output) row-major
        let mut ft = FeatureTransform::new(2, 3);
        ft.set_weight(1, 0, 7);
        assert_eq!(ft.weights()[3], 7);
        assert_eq!(ft.weight(1, 0), 7);
    }

    #[test]
    fn test_decode_reads_biases_then_weights() {
        // 1 input x 2 outputs: biases [1, 2], weights [(0,0)=3, (0,1)=4]
        let bytes = [1, 0, 2, 0, 3, 0, 4, 0];
        let (ft, next) = FeatureTransform::decode(1, 2, &bytes, 0).unwrap();
        assert_eq!(next, 8);
        assert_eq!(ft.biases(), &[1, 2]);
        assert_eq!(ft.weight(0, 0), 3);
        assert_eq!(ft.weight(0, 1), 4);
    }

    #[test]
    fn test_decode_respects_offset() {
        let bytes = [0xFF, 0xFF, 5, 0, 6, 0];
        let (ft, next) = FeatureTransform::decode(1, 1, &bytes, 2).unwrap();
        assert_eq!(next, 6);
        assert_eq!(ft.biases(), &[5]);
        assert_eq!(ft.weight(0, 0), 6);
    }

    #[test]
    fn test_length_symmetry() {
        let bytes = vec![0x11u8; 100];
        let (ft, next) = FeatureTransform::decode(3, 4, &bytes, 10).unwrap();
        assert_eq!(ft.encode().len(), next - 10);
    }

    #[test]
    fn test_decode_buffer_too_short() {
        let bytes = [0u8; 7];
        let err = FeatureTransform::decode(1, 2, &bytes, 0).unwrap_err();
        assert_eq!(
            err,
            NnueError::UnexpectedEof {
                offset: 0,
                needed: 8,
                available: 7,
            }
        );
    }

    #[test]
    fn test_decode_offset_past_end() {
        let bytes = [0u8; 4];
        let err = FeatureTransform::decode(1, 1, &bytes, 10).unwrap_err();
        assert!(matches!(err, NnueError::UnexpectedEof { offset: 10, .. }));
    }

    #[test]
    fn test_roundtrip() {
        let mut ft = FeatureTransform::new(2, 2);
        ft.set_biases(vec![-1, 300]).unwrap();
        ft.set_weights(vec![10, -20, 30, -32768]).unwrap();
        let encoded = ft.encode();
        let (decoded, next) = FeatureTransform::decode(2, 2, &encoded, 0).unwrap();
        assert_eq!(next, encoded.len());
        assert_eq!(decoded, ft);
    }

    #[test]
    fn test_set_biases_shape_mismatch() {
        let mut ft = FeatureTransform::new(2, 3);
        let err = ft.set_biases(vec![0; 4]).unwrap_err();
        assert_eq!(
            err,
            NnueError::ShapeMismatch {
                expected: 3,
                found: 4,
            }
        );
        // Original values untouched after a rejected replacement
        assert_eq!(ft.biases(), &[0; 3]);
    }

    #[test]
    fn test_set_weights_shape_mismatch() {
        let mut ft = FeatureTransform::new(2, 3);
        let err = ft.set_weights(vec![0; 5]).unwrap_err();
        assert_eq!(
            err,
            NnueError::ShapeMismatch {
                expected: 6,
                found: 5,
            }
        );
    }
}
