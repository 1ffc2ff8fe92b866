//! Labeled n-dimensional arrays and datasets.
//!
//! A [`Dataset`] is the in-memory content of one restart file: an ordered set
//! of named [`DataArray`]s, each carrying dimension names, string attributes
//! and the storage [`DType`] it was read as.

use crate::datatype::DType;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use ndarray::{ArrayD, Axis, IxDyn};

/// A labeled n-dimensional array.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    dims: Vec<String>,
    data: ArrayD<f64>,
    attrs: IndexMap<String, String>,
    dtype: DType,
}

impl DataArray {
    /// Create an array from dimension names and data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if the number of names differs from
    /// the number of array axes.
    pub fn new<S: Into<String>>(
        dims: impl IntoIterator<Item = S>,
        data: ArrayD<f64>,
    ) -> Result<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != data.ndim() {
            return Err(Error::DimensionMismatch {
                expected: dims.len(),
                actual: data.ndim(),
            });
        }
        Ok(DataArray {
            dims,
            data,
            attrs: IndexMap::new(),
            dtype: DType::F64,
        })
    }

    /// Create an array from a flat row-major buffer and a shape.
    pub fn from_shape_vec<S: Into<String>>(
        dims: impl IntoIterator<Item = S>,
        shape: &[usize],
        values: Vec<f64>,
    ) -> Result<Self> {
        let expected: usize = shape.iter().product();
        let actual = values.len();
        let data = ArrayD::from_shape_vec(IxDyn(shape), values).map_err(|_| Error::ShapeMismatch {
            shape: shape.to_vec(),
            expected,
            actual,
        })?;
        Self::new(dims, data)
    }

    /// Set the storage type.
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    /// Replace all dimension names.
    pub fn with_dims<S: Into<String>>(mut self, dims: impl IntoIterator<Item = S>) -> Result<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != self.data.ndim() {
            return Err(Error::DimensionMismatch {
                expected: dims.len(),
                actual: self.data.ndim(),
            });
        }
        self.dims = dims;
        Ok(self)
    }

    /// Set an attribute, replacing any previous value.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Dimension names, outermost first.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// Array shape.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Array data.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// Storage type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// All attributes.
    pub fn attrs(&self) -> &IndexMap<String, String> {
        &self.attrs
    }

    /// Mutable access to the attributes.
    pub fn attrs_mut(&mut self) -> &mut IndexMap<String, String> {
        &mut self.attrs
    }

    /// The `units` attribute, if set.
    pub fn units(&self) -> Option<&str> {
        self.attrs.get("units").map(String::as_str)
    }

    /// Rename dimensions according to `renames` (old name → new name).
    /// Dimensions not in the map keep their names.
    pub fn rename_dims(mut self, renames: &IndexMap<String, String>) -> Self {
        for dim in &mut self.dims {
            if let Some(new) = renames.get(dim.as_str()) {
                dim.clone_from(new);
            }
        }
        self
    }

    /// Select index 0 along `dim` and drop that dimension.
    ///
    /// Arrays without `dim` are returned unchanged.
    pub fn select_first(self, dim: &str) -> Result<Self> {
        let Some(axis) = self.dims.iter().position(|d| d == dim) else {
            return Ok(self);
        };
        if self.data.len_of(Axis(axis)) == 0 {
            return Err(Error::ShapeMismatch {
                shape: self.shape().to_vec(),
                expected: 1,
                actual: 0,
            });
        }
        let DataArray {
            mut dims,
            data,
            attrs,
            dtype,
        } = self;
        dims.remove(axis);
        Ok(DataArray {
            dims,
            data: data.index_axis_move(Axis(axis), 0),
            attrs,
            dtype,
        })
    }

    /// Split into parts.
    pub fn into_parts(self) -> (Vec<String>, ArrayD<f64>, IndexMap<String, String>, DType) {
        (self.dims, self.data, self.attrs, self.dtype)
    }
}

/// An ordered collection of named arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    variables: IndexMap<String, DataArray>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable, replacing any previous variable of the same name.
    pub fn insert(&mut self, name: impl Into<String>, array: DataArray) {
        self.variables.insert(name.into(), array);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_variable(mut self, name: impl Into<String>, array: DataArray) -> Self {
        self.insert(name, array);
        self
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&DataArray> {
        self.variables.get(name)
    }

    /// Variable names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the dataset has no variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Select index 0 along `dim` in every variable and drop the dimension.
    /// A coordinate variable named `dim` is dropped entirely.
    pub fn select_first(self, dim: &str) -> Result<Self> {
        let mut variables = IndexMap::with_capacity(self.variables.len());
        for (name, array) in self.variables {
            if name == dim {
                continue;
            }
            variables.insert(name, array.select_first(dim)?);
        }
        Ok(Dataset { variables })
    }

    /// Consume the dataset, yielding its variables.
    pub fn into_variables(self) -> IndexMap<String, DataArray> {
        self.variables
    }
}

impl FromIterator<(String, DataArray)> for Dataset {
    fn from_iter<T: IntoIterator<Item = (String, DataArray)>>(iter: T) -> Self {
        Dataset {
            variables: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temperature() -> DataArray {
        DataArray::from_shape_vec(
            ["Time", "zaxis_1", "yaxis_2", "xaxis_1"],
            &[1, 2, 3, 4],
            (0..24).map(|v| 200.0 + v as f64).collect(),
        )
        .unwrap()
        .with_attr("units", "K")
    }

    #[test]
    fn dims_must_match_ndim() {
        let data = ArrayD::zeros(IxDyn(&[2, 3]));
        let err = DataArray::new(["x"], data).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn shape_must_match_length() {
        let err = DataArray::from_shape_vec(["y", "x"], &[2, 2], vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn select_first_drops_time() {
        let t = temperature().select_first("Time").unwrap();
        assert_eq!(t.dims(), ["zaxis_1", "yaxis_2", "xaxis_1"]);
        assert_eq!(t.shape(), &[2, 3, 4]);
        assert_eq!(t.data()[&[1, 2, 3][..]], 223.0);
        assert_eq!(t.units(), Some("K"));
    }

    #[test]
    fn select_first_ignores_arrays_without_dim() {
        let phis =
            DataArray::from_shape_vec(["yaxis_1", "xaxis_1"], &[2, 2], vec![1.0; 4]).unwrap();
        let same = phis.clone().select_first("Time").unwrap();
        assert_eq!(same, phis);
    }

    #[test]
    fn dataset_select_first_drops_coordinate() {
        let time = DataArray::from_shape_vec(["Time"], &[1], vec![1.0]).unwrap();
        let ds = Dataset::new()
            .with_variable("Time", time)
            .with_variable("T", temperature())
            .select_first("Time")
            .unwrap();
        assert_eq!(ds.names().collect::<Vec<_>>(), vec!["T"]);
        assert!(ds.get("Time").is_none());
        assert_eq!(ds.get("T").unwrap().shape(), &[2, 3, 4]);
    }

    #[test]
    fn rename_dims_keeps_unmapped() {
        let mut renames = IndexMap::new();
        renames.insert("xaxis_1".to_string(), "x".to_string());
        let t = temperature().rename_dims(&renames);
        assert_eq!(t.dims(), ["Time", "zaxis_1", "yaxis_2", "x"]);
    }
}
