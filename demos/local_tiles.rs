//! Load a synthetic restart directory on twelve thread-backed ranks.
//!
//! Every tile master reads its tile from an in-memory filesystem and the
//! state is broadcast to the second rank of the tile.
//!
//! Run with: RUST_LOG=fv3restart=debug cargo run --example local_tiles

use fv3restart::properties::restart_properties;
use fv3restart::restart::{coupler_res_filename, prepend_label, RESTART_NAMES};
use fv3restart::{
    open_restart, Communicator, DataArray, Dataset, LocalUniverse, MemoryFileSystem, Partitioner,
    Result, RestartOptions, TilePartitioner,
};
use std::path::Path;
use tracing_subscriber::EnvFilter;

const NX: usize = 12;
const NZ: usize = 4;

const COUPLER_RES: &str = "     3        (Calendar: no_calendar=0, thirty_day_months=1, julian=2, gregorian=3, noleap=4)
  2016     8     1     0     0     0        Model start time:   year, month, day, hour, minute, second
  2016     8     1     3     0     0        Current model time: year, month, day, hour, minute, second
";

fn axis(dim: &str) -> (&'static str, usize) {
    match dim {
        "x" => ("xaxis_1", NX),
        "x_interface" => ("xaxis_2", NX + 1),
        "y" => ("yaxis_2", NX),
        "y_interface" => ("yaxis_1", NX + 1),
        _ => ("zaxis_1", NZ),
    }
}

fn build_directory(dir: &Path) -> Result<MemoryFileSystem> {
    let fs = MemoryFileSystem::new();
    for tile in 0..6 {
        for component in RESTART_NAMES {
            let mut dataset = Dataset::new();
            for (name, p) in restart_properties().iter() {
                if p.restart_file != component {
                    continue;
                }
                let (mut dims, mut shape) = (vec!["Time"], vec![1]);
                for dim in &p.dims {
                    let (axis_name, len) = axis(dim);
                    dims.push(axis_name);
                    shape.push(len);
                }
                let len: usize = shape.iter().product();
                let fill = if name == "air_temperature" { 270.0 } else { 1.0 };
                let values = (0..len).map(|i| fill + tile as f64 + (i % 7) as f64).collect();
                let array = DataArray::from_shape_vec(dims, &shape, values)?;
                dataset.insert(p.restart_name.clone(), array);
            }
            let filename = prepend_label(component, None) + &format!(".tile{}.nc", tile + 1);
            fs.insert_dataset(dir.join(filename), dataset);
        }
    }
    fs.insert_text(coupler_res_filename(dir, None), COUPLER_RES);
    Ok(fs)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = Path::new("INPUT");
    let fs = build_directory(dir)?;
    let options = RestartOptions::from_env();

    let reports = LocalUniverse::run(12, |world| -> Result<String> {
        let partitioner = TilePartitioner::for_comm(&world)?;
        let state = open_restart(dir, &partitioner, &world, &fs, &options)?;
        let rank = world.rank();
        let (lo, hi) = state
            .get("air_temperature")
            .and_then(|t| t.min_max())
            .unwrap_or((f64::NAN, f64::NAN));
        Ok(format!(
            "rank {rank:2} tile {}: {} fields, time {:?}, air_temperature in [{lo}, {hi}]",
            partitioner.tile_index(rank) + 1,
            state.len(),
            state.time(),
        ))
    });

    for report in reports {
        println!("{}", report?);
    }
    Ok(())
}
