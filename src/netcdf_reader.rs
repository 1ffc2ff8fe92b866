//! NetCDF reader for restart files.
//!
//! Requires the `netcdf` feature and a system NetCDF library.

use crate::dataset::{DataArray, Dataset};
use crate::datatype::DType;
use crate::error::{Error, Result};
use netcdf::types::{FloatType, IntType, NcVariableType};
use std::path::Path;

/// Read every data variable of a NetCDF file.
///
/// Coordinate variables (one-dimensional variables named after their own
/// dimension) are skipped, matching what a labeled-array library treats as
/// data variables. String attributes are kept; numeric attributes are not.
pub fn read_dataset(path: &Path) -> Result<Dataset> {
    let nc_err = |e: netcdf::Error| Error::NetCdf {
        path: path.to_path_buf(),
        message: e.to_string(),
    };
    let file = netcdf::open(path).map_err(nc_err)?;

    let mut dataset = Dataset::new();
    for var in file.variables() {
        let name = var.name();
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        if dims.len() == 1 && dims[0] == name {
            continue;
        }
        let Some(dtype) = storage_dtype(&var.vartype()) else {
            tracing::debug!(
                variable = %name,
                path = %path.display(),
                "skipping non-numeric variable"
            );
            continue;
        };
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let values: Vec<f64> = var.get_values::<f64, _>(..).map_err(nc_err)?;

        let mut array = DataArray::from_shape_vec(dims, &shape, values)?.with_dtype(dtype);
        for attr in var.attributes() {
            if let Ok(netcdf::AttributeValue::Str(s)) = attr.value() {
                array = array.with_attr(attr.name(), s);
            }
        }
        dataset.insert(name, array);
    }
    tracing::debug!(path = %path.display(), variables = dataset.len(), "read NetCDF dataset");
    Ok(dataset)
}

fn storage_dtype(vartype: &NcVariableType) -> Option<DType> {
    match vartype {
        NcVariableType::Float(FloatType::F32) => Some(DType::F32),
        NcVariableType::Float(FloatType::F64) => Some(DType::F64),
        NcVariableType::Int(IntType::I64 | IntType::U64) => Some(DType::I64),
        NcVariableType::Int(_) => Some(DType::I32),
        _ => None,
    }
}
