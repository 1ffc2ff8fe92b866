//! Renaming of Fortran restart variables and dimensions to standard names.

use crate::dataset::DataArray;
use crate::error::{Error, Result};
use crate::properties::{PropertyTable, RestartProperties};
use indexmap::IndexMap;

/// Rename the last `new_dims.len()` dimensions of `array`.
///
/// Leading dimensions keep their names.
///
/// # Errors
///
/// Returns [`Error::DimensionMismatch`] if the array has fewer dimensions
/// than names supplied.
pub fn apply_dims<S: AsRef<str>>(array: DataArray, new_dims: &[S]) -> Result<DataArray> {
    let ndim = array.dims().len();
    if new_dims.len() > ndim {
        return Err(Error::DimensionMismatch {
            expected: new_dims.len(),
            actual: ndim,
        });
    }
    let split = ndim - new_dims.len();
    let dims: Vec<String> = array.dims()[..split]
        .iter()
        .cloned()
        .chain(new_dims.iter().map(|d| d.as_ref().to_string()))
        .collect();
    array.with_dims(dims)
}

/// Rename keys of `map` according to `old_to_new`.
///
/// Keys without an entry in `old_to_new` pass through unchanged; entries in
/// `old_to_new` whose key is absent are ignored. Order follows `map`.
pub fn map_keys<V>(
    map: IndexMap<String, V>,
    old_to_new: &IndexMap<String, String>,
) -> IndexMap<String, V> {
    map.into_iter()
        .map(|(key, value)| match old_to_new.get(&key) {
            Some(new_key) => (new_key.clone(), value),
            None => (key, value),
        })
        .collect()
}

/// Attach standard dims and units to every array named in `table`.
///
/// Arrays with no entry are returned untouched, keeping any attributes they
/// were read with.
pub fn apply_restart_metadata(
    arrays: IndexMap<String, DataArray>,
    table: &PropertyTable<RestartProperties>,
) -> Result<IndexMap<String, DataArray>> {
    let mut out = IndexMap::with_capacity(arrays.len());
    for (name, array) in arrays {
        let array = match table.get(&name) {
            Some(properties) => {
                let mut array = apply_dims(array, &properties.dims)?;
                array
                    .attrs_mut()
                    .insert("units".to_string(), properties.units.clone());
                array
            }
            None => array,
        };
        out.insert(name, array);
    }
    Ok(out)
}
