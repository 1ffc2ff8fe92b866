//! Synthetic restart directories shared by the integration tests.

#![allow(dead_code)]

use fv3restart::constants::{HORIZONTAL_DIMS, TILE_COUNT};
use fv3restart::properties::restart_properties;
use fv3restart::restart::{coupler_res_filename, prepend_label, RESTART_NAMES};
use fv3restart::{DType, DataArray, Dataset, MemoryFileSystem};
use ndarray::{ArrayD, Dimension, IxDyn};
use std::path::Path;

pub const DIR: &str = "/restart";
pub const N_HALO: usize = 3;
/// Horizontal sizes include `N_HALO` ghost points on each side.
pub const NX: usize = 8 + 2 * N_HALO;
pub const NY: usize = 6 + 2 * N_HALO;
pub const NZ: usize = 5;
pub const N_SOIL: usize = 4;
/// Value of every ghost point, outside any physical range.
pub const HALO_FILL: f64 = 0.0;

pub const COUPLER_RES: &str = "     2        (Calendar: no_calendar=0, thirty_day_months=1, julian=2, gregorian=3, noleap=4)
  2016     8     1     0     0     0        Model start time:   year, month, day, hour, minute, second
  2016     8     1     0    15     0        Current model time: year, month, day, hour, minute, second
";

/// Fortran axis name and length for a standard dimension.
fn fortran_axis(dim: &str) -> (&'static str, usize) {
    match dim {
        "x" => ("xaxis_1", NX),
        "x_interface" => ("xaxis_2", NX + 1),
        "y" => ("yaxis_2", NY),
        "y_interface" => ("yaxis_1", NY + 1),
        "z_soil" => ("zaxis_2", N_SOIL),
        _ => ("zaxis_1", NZ),
    }
}

/// Base value of a field, chosen inside its physical range.
pub fn base_value(name: &str) -> f64 {
    match name {
        "air_temperature" => 250.0,
        "surface_temperature" | "air_temperature_at_2m" | "soil_temperature" => 280.0,
        "surface_geopotential" => 1000.0,
        "pressure_thickness_of_atmospheric_layer" => 500.0,
        "vertical_thickness_of_atmospheric_layer" => -200.0,
        _ => 0.5,
    }
}

/// Value a tile holds at a compute point of field `name`.
///
/// Always in `[base + tile, base + tile + 1)`; multiples of 1/64 survive a
/// round trip through `f32`.
pub fn value(name: &str, tile: usize, index: &[usize]) -> f64 {
    let offset = index.iter().sum::<usize>() % 64;
    base_value(name) + tile as f64 + offset as f64 / 64.0
}

fn variable(name: &str, dims: &[String], tile: usize, dtype: DType) -> DataArray {
    let mut fortran_dims = vec!["Time"];
    let mut shape = vec![1];
    for dim in dims {
        let (axis, len) = fortran_axis(dim);
        fortran_dims.push(axis);
        shape.push(len);
    }
    let data = ArrayD::from_shape_fn(IxDyn(&shape), |ix| {
        let index = &ix.slice()[1..];
        let in_halo = dims.iter().zip(index).any(|(dim, &i)| {
            let len = fortran_axis(dim).1;
            HORIZONTAL_DIMS.contains(&dim.as_str()) && (i < N_HALO || i >= len - N_HALO)
        });
        if in_halo {
            HALO_FILL
        } else {
            value(name, tile, index)
        }
    });
    DataArray::new(fortran_dims, data)
        .unwrap()
        .with_dtype(dtype)
        .with_attr("long_name", name)
}

/// Restart files for one tile, keyed by component.
fn tile_datasets(tile: usize) -> Vec<(String, Dataset)> {
    let components = RESTART_NAMES.iter().copied().chain(["sfc_data"]);
    components
        .map(|component| {
            let dtype = if component == "fv_tracer.res" {
                DType::F32
            } else {
                DType::F64
            };
            let mut dataset = Dataset::new();
            for (name, p) in restart_properties().iter() {
                if p.restart_file == component {
                    let array = variable(name, &p.dims, tile, dtype);
                    dataset.insert(p.restart_name.clone(), array);
                }
            }
            let time = DataArray::from_shape_vec(["Time"], &[1], vec![1.0]).unwrap();
            dataset.insert("Time", time);
            (component.to_string(), dataset)
        })
        .collect()
}

/// A complete restart directory at [`DIR`] for all six tiles.
///
/// `sfc_data` is written only when `with_surface` is set.
pub fn restart_fs(label: Option<&str>, with_surface: bool) -> MemoryFileSystem {
    let fs = MemoryFileSystem::new();
    let dir = Path::new(DIR);
    for tile in 0..TILE_COUNT {
        for (component, dataset) in tile_datasets(tile) {
            if component == "sfc_data" && !with_surface {
                continue;
            }
            let filename = prepend_label(&component, label) + &format!(".tile{}.nc", tile + 1);
            fs.insert_dataset(dir.join(filename), dataset);
        }
    }
    fs.insert_text(coupler_res_filename(dir, label), COUPLER_RES);
    fs
}
