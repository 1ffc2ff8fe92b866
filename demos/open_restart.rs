//! Load a real FV3 restart directory under MPI.
//!
//! The number of processes must be a multiple of 6. Set `FV3RESTART_LABEL`
//! for labeled restart files and `FV3RESTART_ONLY_NAMES` to load a subset.
//!
//! Run with: mpiexec -n 6 ./target/debug/examples/open_restart INPUT

use fv3restart::{
    open_restart, Communicator, Error, LocalFileSystem, Partitioner, Result, RestartOptions,
    TilePartitioner,
};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let dir = std::env::args().nth(1).unwrap_or_else(|| "INPUT".to_string());
    let universe = mpi::initialize().ok_or_else(|| Error::Comm("MPI already initialized".into()))?;
    let world = universe.world();
    let rank = world.rank();

    let partitioner = TilePartitioner::for_comm(&world)?;
    let state = open_restart(
        &dir,
        &partitioner,
        &world,
        &LocalFileSystem,
        &RestartOptions::from_env(),
    )?;

    if rank == partitioner.tile_master_rank(rank) {
        println!(
            "tile {}: {} fields at {:?}",
            partitioner.tile_index(rank) + 1,
            state.len(),
            state.time()
        );
        for (name, quantity) in state.iter() {
            if let Some((lo, hi)) = quantity.min_max() {
                println!(
                    "  {name:<45} {:>16} {:?} [{lo:.4}, {hi:.4}]",
                    quantity.units(),
                    quantity.shape()
                );
            }
        }
    }

    world.barrier()?;
    Ok(())
}
