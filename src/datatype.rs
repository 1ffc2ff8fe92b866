//! Storage datatype tags for restart fields.
//!
//! Fields are held in memory as `f64`, but each remembers the type it was
//! stored as on disk. The scatter phase of distribution encodes data at that
//! width, so single-precision fields cost half as much to broadcast.
//!
//! # Supported Types
//!
//! | Tag   | NetCDF Equivalent | Wire width | Tag Value |
//! |-------|-------------------|------------|-----------|
//! | `F32` | `NC_FLOAT`        | 4 bytes    | 0         |
//! | `F64` | `NC_DOUBLE`       | 8 bytes    | 1         |
//! | `I32` | `NC_INT`          | 4 bytes    | 2         |
//! | `I64` | `NC_INT64`        | 8 bytes    | 3         |

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(i32)]
pub enum DType {
    /// 32-bit floating point
    F32 = 0,
    /// 64-bit floating point
    #[default]
    F64 = 1,
    /// 32-bit signed integer
    I32 = 2,
    /// 64-bit signed integer
    I64 = 3,
}

impl DType {
    /// Number of bytes one element occupies on the wire.
    pub fn size_of(self) -> usize {
        match self {
            DType::F32 | DType::I32 => 4,
            DType::F64 | DType::I64 => 8,
        }
    }

    /// Encode `values` at this storage width, little-endian.
    ///
    /// Integer types round to the nearest integer.
    pub fn encode(self, values: impl Iterator<Item = f64>) -> Vec<u8> {
        let (lower, _) = values.size_hint();
        let mut out = Vec::with_capacity(lower * self.size_of());
        for v in values {
            match self {
                DType::F32 => out.extend_from_slice(&(v as f32).to_le_bytes()),
                DType::F64 => out.extend_from_slice(&v.to_le_bytes()),
                DType::I32 => out.extend_from_slice(&(v.round() as i32).to_le_bytes()),
                DType::I64 => out.extend_from_slice(&(v.round() as i64).to_le_bytes()),
            }
        }
        out
    }

    /// Decode bytes produced by [`encode`](Self::encode) back into `f64`.
    pub fn decode(self, bytes: &[u8]) -> Result<Vec<f64>> {
        let width = self.size_of();
        if bytes.len() % width != 0 {
            return Err(Error::TruncatedPayload {
                len: bytes.len(),
                width,
            });
        }
        let values = bytes
            .chunks_exact(width)
            .map(|chunk| match self {
                DType::F32 => f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
                DType::F64 => f64::from_le_bytes(to_array8(chunk)),
                DType::I32 => i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as f64,
                DType::I64 => i64::from_le_bytes(to_array8(chunk)) as f64,
            })
            .collect();
        Ok(values)
    }
}

fn to_array8(chunk: &[u8]) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(chunk);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_values_are_sequential() {
        let tags = [DType::F32, DType::F64, DType::I32, DType::I64];
        for (i, tag) in tags.iter().enumerate() {
            assert_eq!(*tag as i32, i as i32, "Tag {tag:?} should have value {i}");
        }
    }

    #[test]
    fn encoded_width_follows_dtype() {
        let values = [1.0, 2.0, 3.0];
        assert_eq!(DType::F32.encode(values.iter().copied()).len(), 12);
        assert_eq!(DType::F64.encode(values.iter().copied()).len(), 24);
        assert_eq!(DType::I32.encode(values.iter().copied()).len(), 12);
        assert_eq!(DType::I64.encode(values.iter().copied()).len(), 24);
    }

    #[test]
    fn f32_loses_only_precision() {
        let bytes = DType::F32.encode([287.15_f64, -0.5].into_iter());
        let back = DType::F32.decode(&bytes).unwrap();
        assert!((back[0] - 287.15).abs() < 1e-4);
        assert_eq!(back[1], -0.5);
    }

    #[test]
    fn integer_tags_round() {
        let bytes = DType::I32.encode([0.6_f64, 2.0, -1.4].into_iter());
        assert_eq!(DType::I32.decode(&bytes).unwrap(), vec![1.0, 2.0, -1.0]);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        assert!(DType::F64.decode(&[0u8; 12]).is_err());
    }

    #[test]
    fn default_is_double() {
        assert_eq!(DType::default(), DType::F64);
    }
}
