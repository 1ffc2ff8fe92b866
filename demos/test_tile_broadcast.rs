//! Integration test for tile-wise state distribution under MPI.
//!
//! Tile masters build a synthetic state, broadcast_state copies it to every
//! rank of the tile, and each rank checks the data it received.
//!
//! Run with: mpiexec -n 12 ./target/debug/examples/test_tile_broadcast

use chrono::NaiveDate;
use fv3restart::{
    broadcast_state, Communicator, DType, Partitioner, Quantity, State, TilePartitioner,
};
use ndarray::{ArrayD, IxDyn};

fn tile_state(tile: usize) -> State {
    let mut state = State::new();
    let t = ArrayD::from_shape_fn(IxDyn(&[3, 4, 5]), |ix| {
        250.0 + tile as f64 + (ix[0] + ix[1] + ix[2]) as f64
    });
    state.insert(
        "air_temperature",
        Quantity::new(t, ["z", "y", "x"], "degK").expect("air_temperature"),
    );
    let q = ArrayD::from_elem(IxDyn(&[3, 4, 5]), 0.25 * tile as f64);
    state.insert(
        "specific_humidity",
        Quantity::new(q, ["z", "y", "x"], "kg/kg")
            .expect("specific_humidity")
            .with_dtype(DType::F32),
    );
    let time = NaiveDate::from_ymd_opt(2016, 8, 1).and_then(|d| d.and_hms_opt(0, 15, 0));
    state.set_time(time);
    state
}

fn main() {
    // Abort the whole job on a failed assertion instead of hanging peers
    std::panic::set_hook(Box::new(|info| {
        eprintln!("{info}");
        std::process::abort();
    }));

    let universe = mpi::initialize().expect("MPI init failed");
    let world = universe.world();
    let rank = world.rank();
    let size = world.size();

    assert!(
        size % 6 == 0,
        "test_tile_broadcast requires a multiple of 6 processes, got {size}"
    );
    let partitioner = TilePartitioner::for_comm(&world).expect("partitioner");
    let tile = partitioner.tile_index(rank);

    // ========================================================================
    // Test 1: Every rank of a tile receives the master's state
    // ========================================================================
    {
        let state = if rank == partitioner.tile_master_rank(rank) {
            tile_state(tile)
        } else {
            State::new()
        };
        let received =
            broadcast_state(state, &partitioner, &world).expect("broadcast_state failed");
        assert_eq!(
            received,
            tile_state(tile),
            "rank {rank}: state differs from tile {tile} master"
        );

        if rank == 0 {
            println!("PASS: tile state broadcast");
        }
    }

    world.barrier().expect("barrier 1 failed");

    // ========================================================================
    // Test 2: Missing time stays missing
    // ========================================================================
    {
        let mut state = tile_state(tile);
        state.set_time(None);
        let received =
            broadcast_state(state, &partitioner, &world).expect("broadcast_state failed");
        assert!(received.time().is_none(), "rank {rank}: unexpected time");
        assert_eq!(received.len(), 2);

        if rank == 0 {
            println!("PASS: broadcast without time");
        }
    }

    world.barrier().expect("barrier 2 failed");

    if rank == 0 {
        println!("\n========================================");
        println!("All tile broadcast tests passed!");
        println!("========================================");
    }
}
