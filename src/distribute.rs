//! Tile-wise distribution of a loaded state.

use crate::comm::{bcast_metadata_list, broadcast_object, Communicator};
use crate::constants::MASTER_RANK;
use crate::error::Result;
use crate::partitioner::Partitioner;
use crate::quantity::Quantity;
use crate::state::State;
use chrono::NaiveDateTime;
use tracing::debug;

/// Copy the state held by each tile master to every rank of its tile.
///
/// Collective over `comm`. `comm` is split by tile index with the world rank
/// as key, so rank 0 of each tile communicator is the lowest world rank of
/// the tile. That rank passes the tile's full state; the state passed on any
/// other rank is discarded.
///
/// The exchange on the tile communicator is, in order: the field names, the
/// field metadata, one [`Partitioner::scatter`] per field, then the model
/// time.
pub fn broadcast_state<C, P>(state: State, partitioner: &P, comm: &C) -> Result<State>
where
    C: Communicator,
    P: Partitioner,
{
    let rank = comm.rank();
    let tile = partitioner.tile_index(rank);
    let tile_comm = comm.split(tile, rank)?;
    if tile_comm.rank() == MASTER_RANK {
        broadcast_master(state, partitioner, &tile_comm, tile)
    } else {
        broadcast_client(partitioner, &tile_comm)
    }
}

fn broadcast_master<C, P>(
    state: State,
    partitioner: &P,
    tile_comm: &C,
    tile: usize,
) -> Result<State>
where
    C: Communicator,
    P: Partitioner,
{
    let names: Vec<String> = state.names().map(str::to_string).collect();
    debug!(
        tile,
        fields = names.len(),
        ranks = tile_comm.size(),
        "broadcasting tile state"
    );
    let names: Vec<String> = broadcast_object(tile_comm, Some(&names), MASTER_RANK)?;

    let quantities: Vec<&Quantity> = names.iter().filter_map(|name| state.get(name)).collect();
    let metadata = bcast_metadata_list(tile_comm, Some(quantities.as_slice()))?;

    let mut out = State::new();
    for ((name, quantity), metadata) in names.iter().zip(quantities).zip(&metadata) {
        let scattered = partitioner.scatter(tile_comm, Some(quantity), metadata)?;
        out.insert(name.clone(), scattered);
    }

    let time: Option<NaiveDateTime> =
        broadcast_object(tile_comm, Some(&state.time()), MASTER_RANK)?;
    out.set_time(time);
    Ok(out)
}

fn broadcast_client<C, P>(partitioner: &P, tile_comm: &C) -> Result<State>
where
    C: Communicator,
    P: Partitioner,
{
    let names: Vec<String> = broadcast_object(tile_comm, None, MASTER_RANK)?;
    let metadata = bcast_metadata_list(tile_comm, None)?;

    let mut out = State::new();
    for (name, metadata) in names.into_iter().zip(&metadata) {
        out.insert(name, partitioner.scatter(tile_comm, None, metadata)?);
    }

    let time: Option<NaiveDateTime> = broadcast_object(tile_comm, None, MASTER_RANK)?;
    out.set_time(time);
    debug!(fields = out.len(), "received tile state");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalUniverse;
    use crate::partitioner::TilePartitioner;
    use chrono::NaiveDate;
    use ndarray::{ArrayD, IxDyn};

    fn tile_state(tile: usize) -> State {
        let mut state = State::new();
        let t = ArrayD::from_shape_fn(IxDyn(&[2, 3, 4]), |ix| {
            250.0 + tile as f64 + (ix[0] * 12 + ix[1] * 4 + ix[2]) as f64
        });
        let phis = ArrayD::from_elem(IxDyn(&[3, 4]), tile as f64);
        state.insert(
            "air_temperature",
            Quantity::new(t, ["z", "y", "x"], "degK").unwrap(),
        );
        state.insert(
            "surface_geopotential",
            Quantity::new(phis, ["y", "x"], "m^2 s^-2").unwrap(),
        );
        let time = NaiveDate::from_ymd_opt(2016, 8, 1)
            .and_then(|d| d.and_hms_opt(0, 15, 0));
        state.set_time(time);
        state
    }

    fn distribute(total_ranks: usize) -> Vec<(usize, State)> {
        LocalUniverse::run(total_ranks, |world| {
            let partitioner = TilePartitioner::for_comm(&world).unwrap();
            let rank = world.rank();
            let tile = partitioner.tile_index(rank);
            let state = if rank == partitioner.tile_master_rank(rank) {
                tile_state(tile)
            } else {
                State::new()
            };
            (tile, broadcast_state(state, &partitioner, &world).unwrap())
        })
    }

    #[test]
    fn one_rank_per_tile_keeps_state() {
        for (tile, state) in distribute(6) {
            assert_eq!(state, tile_state(tile));
        }
    }

    #[test]
    fn every_rank_of_a_tile_gets_the_master_state() {
        let results = distribute(12);
        assert_eq!(results.len(), 12);
        for (tile, state) in results {
            assert_eq!(state, tile_state(tile));
            assert_eq!(
                state.names().collect::<Vec<_>>(),
                vec!["air_temperature", "surface_geopotential"]
            );
        }
    }

    #[test]
    fn missing_time_stays_missing() {
        let results = LocalUniverse::run(12, |world| {
            let partitioner = TilePartitioner::for_comm(&world).unwrap();
            let mut state = tile_state(0);
            state.set_time(None);
            broadcast_state(state, &partitioner, &world).unwrap()
        });
        assert!(results.iter().all(|s| s.time().is_none() && s.len() == 2));
    }

    #[test]
    fn empty_state_distributes() {
        let results = LocalUniverse::run(6, |world| {
            let partitioner = TilePartitioner::for_comm(&world).unwrap();
            broadcast_state(State::new(), &partitioner, &world).unwrap()
        });
        assert!(results.iter().all(State::is_empty));
    }
}
