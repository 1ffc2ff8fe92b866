//! Physical fields with units.

use crate::constants::HORIZONTAL_DIMS;
use crate::dataset::DataArray;
use crate::datatype::DType;
use crate::error::{Error, Result};
use ndarray::{ArrayD, Axis, IxDyn, Slice};
use serde::{Deserialize, Serialize};

/// Everything about a [`Quantity`] except its data.
///
/// This is what the metadata phase of distribution broadcasts, so that
/// receiving ranks can size their buffers before the data arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityMetadata {
    /// Dimension names, outermost first
    pub dims: Vec<String>,
    /// Units string
    pub units: String,
    /// Array shape
    pub shape: Vec<usize>,
    /// Storage type
    pub dtype: DType,
}

impl QuantityMetadata {
    /// Number of elements the described array holds.
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether the described array is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bytes the data occupies on the wire.
    pub fn nbytes(&self) -> usize {
        self.len() * self.dtype.size_of()
    }
}

/// A named-dimension array with mandatory units.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    data: ArrayD<f64>,
    dims: Vec<String>,
    units: String,
    dtype: DType,
}

impl Quantity {
    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `dims` does not name every axis.
    pub fn new<S: Into<String>>(
        data: ArrayD<f64>,
        dims: impl IntoIterator<Item = S>,
        units: impl Into<String>,
    ) -> Result<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != data.ndim() {
            return Err(Error::DimensionMismatch {
                expected: dims.len(),
                actual: data.ndim(),
            });
        }
        Ok(Quantity {
            data,
            dims,
            units: units.into(),
            dtype: DType::F64,
        })
    }

    /// Set the storage type.
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Convert a labeled array, taking its `units` attribute.
    ///
    /// `name` is only used in the error.
    pub fn from_data_array(name: &str, array: DataArray) -> Result<Self> {
        let (dims, data, mut attrs, dtype) = array.into_parts();
        let units = attrs
            .swap_remove("units")
            .ok_or_else(|| Error::MissingUnits(name.to_string()))?;
        Ok(Quantity {
            data,
            dims,
            units,
            dtype,
        })
    }

    /// Rebuild a quantity from its metadata and a wire payload.
    pub fn from_bytes(metadata: &QuantityMetadata, bytes: &[u8]) -> Result<Self> {
        let values = metadata.dtype.decode(bytes)?;
        let expected = metadata.len();
        if values.len() != expected {
            return Err(Error::ShapeMismatch {
                shape: metadata.shape.clone(),
                expected,
                actual: values.len(),
            });
        }
        let data = ArrayD::from_shape_vec(IxDyn(&metadata.shape), values).map_err(|_| {
            Error::ShapeMismatch {
                shape: metadata.shape.clone(),
                expected,
                actual: expected,
            }
        })?;
        Ok(Quantity {
            data,
            dims: metadata.dims.clone(),
            units: metadata.units.clone(),
            dtype: metadata.dtype,
        })
    }

    /// Encode the data at its storage width, row-major.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.dtype.encode(self.data.iter().copied())
    }

    /// Metadata describing this quantity.
    pub fn metadata(&self) -> QuantityMetadata {
        QuantityMetadata {
            dims: self.dims.clone(),
            units: self.units.clone(),
            shape: self.data.shape().to_vec(),
            dtype: self.dtype,
        }
    }

    /// Array data.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Dimension names.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// Units string.
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Storage type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Array shape.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Smallest and largest value, or `None` for an empty array.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data.iter().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Drop `n_halo` points from both ends of every horizontal dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if a horizontal dimension is shorter
    /// than two halos.
    pub fn without_halo(&self, n_halo: usize) -> Result<Self> {
        let mut data = self.data.clone();
        for (axis, dim) in self.dims.iter().enumerate() {
            if !HORIZONTAL_DIMS.contains(&dim.as_str()) {
                continue;
            }
            let len = data.len_of(Axis(axis));
            if len < 2 * n_halo {
                return Err(Error::ShapeMismatch {
                    shape: data.shape().to_vec(),
                    expected: 2 * n_halo,
                    actual: len,
                });
            }
            data.slice_axis_inplace(Axis(axis), Slice::from(n_halo..len - n_halo));
        }
        Ok(Quantity {
            data: data.as_standard_layout().into_owned(),
            dims: self.dims.clone(),
            units: self.units.clone(),
            dtype: self.dtype,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(dtype: DType) -> Quantity {
        let data =
            ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        Quantity::new(data, ["y", "x"], "m").unwrap().with_dtype(dtype)
    }

    #[test]
    fn from_data_array_requires_units() {
        let array = DataArray::from_shape_vec(["x"], &[2], vec![1.0, 2.0]).unwrap();
        let err = Quantity::from_data_array("tsea", array.clone()).unwrap_err();
        assert!(matches!(err, Error::MissingUnits(name) if name == "tsea"));

        let q = Quantity::from_data_array("tsea", array.with_attr("units", "K")).unwrap();
        assert_eq!(q.units(), "K");
    }

    #[test]
    fn bytes_rebuild_the_same_quantity() {
        for dtype in [DType::F32, DType::F64, DType::I32, DType::I64] {
            let q = sample(dtype);
            let back = Quantity::from_bytes(&q.metadata(), &q.to_bytes()).unwrap();
            assert_eq!(back, q, "dtype {dtype:?}");
        }
    }

    #[test]
    fn metadata_reports_wire_size() {
        assert_eq!(sample(DType::F32).metadata().nbytes(), 24);
        assert_eq!(sample(DType::F64).metadata().nbytes(), 48);
    }

    #[test]
    fn from_bytes_rejects_wrong_length() {
        let q = sample(DType::F64);
        let mut bytes = q.to_bytes();
        bytes.truncate(40);
        assert!(matches!(
            Quantity::from_bytes(&q.metadata(), &bytes),
            Err(Error::ShapeMismatch { expected: 6, actual: 5, .. })
        ));
    }

    #[test]
    fn halo_is_stripped_from_horizontal_dims_only() {
        let data = ArrayD::from_shape_fn(IxDyn(&[2, 5, 6]), |ix| {
            (ix[0] * 100 + ix[1] * 10 + ix[2]) as f64
        });
        let q = Quantity::new(data, ["z", "y", "x_interface"], "K").unwrap();
        let inner = q.without_halo(1).unwrap();
        assert_eq!(inner.shape(), &[2, 3, 4]);
        assert_eq!(inner.data()[&[0, 0, 0][..]], 11.0);
        assert_eq!(inner.data()[&[1, 2, 3][..]], 134.0);
    }

    #[test]
    fn halo_wider_than_dim_is_an_error() {
        assert!(sample(DType::F64).without_halo(2).is_err());
    }

    #[test]
    fn min_max_spans_values() {
        assert_eq!(sample(DType::F64).min_max(), Some((1.0, 6.0)));
    }
}
