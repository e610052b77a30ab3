//! Downstream affine-layer codec.
//!
//! Each layer of the network stack after the feature transform is a plain
//! affine transform: 32-bit biases followed by 8-bit weights in
//! *(output, input)* row-major order. Parameter-free parts of the network
//! (activations) occupy no bytes in the file and are not modeled here.

use crate::error::NnueError;

/// Biases and weights of one fully-connected layer.
///
/// Same shape contract as [`FeatureTransform`](crate::FeatureTransform):
/// dimensions are fixed at construction, slice views cannot resize, and
/// wholesale replacement is length-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AffineTransform {
    input_dimension: usize,
    output_dimension: usize,
    /// `output_dimension` entries
    biases: Vec<i32>,
    /// `output_dimension * input_dimension` entries, (output, input) row-major
    weights: Vec<i8>,
}

impl AffineTransform {
    /// Create a zero-valued transform with the given shape
    #[must_use]
    pub fn new(input_dimension: usize, output_dimension: usize) -> Self {
        Self {
            input_dimension,
            output_dimension,
            biases: vec![0; output_dimension],
            weights: vec![0; output_dimension * input_dimension],
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

    /// Encoded size in bytes, excluding any preceding sub-header
    #[must_use]
    pub fn byte_len(&self) -> usize {
        byte_len(self.input_dimension, self.output_dimension)
    }

    #[must_use]
    pub fn biases(&self) -> &[i32] {
        &self.biases
    }

    pub fn biases_mut(&mut self) -> &mut [i32] {
        &mut self.biases
    }

    #[must_use]
    pub fn weights(&self) -> &[i8] {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut [i8] {
        &mut self.weights
    }

    /// Weight for `input` feeding `output` node
    #[inline]
    #[must_use]
    pub fn weight(&self, output: usize, input: usize) -> i8 {
        self.weights[output * self.input_dimension + input]
    }

    #[inline]
    pub fn set_weight(&mut self, output: usize, input: usize, value: i8) {
        self.weights[output * self.input_dimension + input] = value;
    }

    /// Replace the whole bias vector, rejecting a length that disagrees with
    /// the declared output dimension
    pub fn set_biases(&mut self, biases: Vec<i32>) -> Result<(), NnueError> {
        if biases.len() != self.output_dimension {
            return Err(NnueError::ShapeMismatch {
                expected: self.output_dimension,
                found: biases.len(),
            });
        }
        self.biases = biases;
        Ok(())
    }

    /// Replace the whole weight matrix (flat, (output, input) row-major),
    /// rejecting a length that disagrees with the declared dimensions
    pub fn set_weights(&mut self, weights: Vec<i8>) -> Result<(), NnueError> {
        let expected = self.output_dimension * self.input_dimension;
        if weights.len() != expected {
            return Err(NnueError::ShapeMismatch {
                expected,
                found: weights.len(),
            });
        }
        self.weights = weights;
        Ok(())
    }

    /// Decode one layer section starting at `offset`.
    ///
    /// Reads `output_dimension` little-endian i32 biases, then
    /// `output_dimension * input_dimension` i8 weights (one byte each) in
    /// (output, input) row-major order. Returns the transform and the offset
    /// of the next layer (equal to the buffer length after the last layer).
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
            *bias = i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
            at += 4;
        }
        for weight in &mut transform.weights {
            *weight = bytes[at] as i8;
            at += 1;
        }
        debug_assert_eq!(at, end);

        Ok((transform, end))
    }

    /// Encode this section, excluding the sub-header
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for &bias in &self.biases {
            out.extend_from_slice(&bias.to_le_bytes());
        }
        for &weight in &self.weights {
            out.push(weight as u8);
        }
        debug_assert_eq!(out.len(), self.byte_len());
        out
    }
}

/// Encoded section size for the given shape, excluding any sub-header
#[must_use]
pub(crate) fn byte_len(input_dimension: usize, output_dimension: usize) -> usize {
    output_dimension * 4 + output_dimension * input_dimension
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let at = AffineTransform::new(4, 2);
        assert_eq!(at.biases(), &[0; 2]);
        assert_eq!(at.weights(), &[0; 8]);
        assert_eq!(at.byte_len(), 2 * 4 + 2 * 4);
    }

    #[test]
    fn test_encode_is_little_endian() {
        let mut at = AffineTransform::new(0, 1);
        at.biases_mut()[0] = 258;
        assert_eq!(at.encode(), vec![0x02, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_weight_index_is_output_major() {
        // 3 inputs x 2 outputs: file order is (output, input) row-major
        let mut at = AffineTransform::new(3, 2);
        at.set_weight(1, 0, 7);
        assert_eq!(at.weights()[3], 7);
        assert_eq!(at.weight(1, 0), 7);
    }

    #[test]
    fn test_decode_reads_biases_then_weights() {
        // 2 inputs x 1 output: bias [-1], weights [(0,0)=2, (0,1)=0x80=-128]
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 2, 0x80];
        let (at, next) = AffineTransform::decode(2, 1, &bytes, 0).unwrap();
        assert_eq!(next, 6);
        assert_eq!(at.biases(), &[-1]);
        assert_eq!(at.weight(0, 0), 2);
        assert_eq!(at.weight(0, 1), -128);
    }

    #[test]
    fn test_length_symmetry() {
        let bytes = vec![0x22u8; 80];
        let (at, next) = AffineTransform::decode(4, 3, &bytes, 5).unwrap();
        assert_eq!(at.encode().len(), next - 5);
    }

    #[test]
    fn test_decode_buffer_too_short() {
        let bytes = [0u8; 5];
        let err = AffineTransform::decode(2, 1, &bytes, 0).unwrap_err();
        assert_eq!(
            err,
            NnueError::UnexpectedEof {
                offset: 0,
                needed: 6,
                available: 5,
            }
        );
    }

    #[test]
    fn test_roundtrip() {
        let mut at = AffineTransform::new(2, 2);
        at.set_biases(vec![i32::MIN, 70_000]).unwrap();
        at.set_weights(vec![-128, 127, 0, -1]).unwrap();
        let encoded = at.encode();
        let (decoded, next) = AffineTransform::decode(2, 2, &encoded, 0).unwrap();
        assert_eq!(next, encoded.len());
        assert_eq!(decoded, at);
    }

    #[test]
    fn test_set_biases_shape_mismatch() {
        let mut at = AffineTransform::new(2, 3);
        let err = at.set_biases(vec![0; 2]).unwrap_err();
        assert_eq!(
            err,
            NnueError::ShapeMismatch {
                expected: 3,
                found: 2,
            }
        );
    }

    #[test]
    fn test_set_weights_shape_mismatch() {
        let mut at = AffineTransform::new(2, 3);
        let err = at.set_weights(vec![0; 7]).unwrap_err();
        assert_eq!(
            err,
            NnueError::ShapeMismatch {
                expected: 6,
                found: 7,
            }
        );
    }
}
