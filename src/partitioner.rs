//! Assignment of ranks to cubed-sphere tiles.
//!
//! Ranks are laid out tile-major: with `total_ranks` ranks, tile `t` owns the
//! contiguous block `t * ranks_per_tile .. (t + 1) * ranks_per_tile`, and the
//! lowest rank of that block is the tile master.
//!
//! How a tile is cut into per-rank subdomains is the partitioner's business;
//! the restart loader only calls [`Partitioner::scatter`].

use crate::comm::Communicator;
use crate::constants::{MASTER_RANK, TILE_COUNT};
use crate::error::{Error, Result};
use crate::quantity::{Quantity, QuantityMetadata};

/// Number of ranks on each tile.
///
/// # Errors
///
/// Returns [`Error::InvalidRankCount`] unless `total_ranks` is a positive
/// multiple of 6.
pub fn ranks_per_tile(total_ranks: usize) -> Result<usize> {
    if total_ranks == 0 || total_ranks % TILE_COUNT != 0 {
        return Err(Error::InvalidRankCount(total_ranks));
    }
    Ok(total_ranks / TILE_COUNT)
}

/// Zero-based tile index of `rank`.
pub fn get_tile_index(rank: usize, total_ranks: usize) -> Result<usize> {
    let per_tile = ranks_per_tile(total_ranks)?;
    if rank >= total_ranks {
        return Err(Error::InvalidRank {
            rank,
            size: total_ranks,
        });
    }
    Ok(rank / per_tile)
}

/// Domain decomposition seen by the restart loader.
pub trait Partitioner {
    /// Total number of ranks across all tiles.
    fn total_ranks(&self) -> usize;

    /// Zero-based tile index owned by `rank`.
    fn tile_index(&self, rank: usize) -> usize;

    /// Rank that loads and broadcasts the state of `rank`'s tile.
    fn tile_master_rank(&self, rank: usize) -> usize;

    /// Distribute one tile-wide field across `tile_comm`.
    ///
    /// Collective over `tile_comm`. The tile master passes the full field,
    /// other ranks pass `None`; every rank passes the same `metadata` and
    /// receives its own portion.
    fn scatter<C: Communicator>(
        &self,
        tile_comm: &C,
        quantity: Option<&Quantity>,
        metadata: &QuantityMetadata,
    ) -> Result<Quantity>;
}

/// Even tile-major partition where each rank of a tile holds the whole tile.
///
/// [`scatter`](Partitioner::scatter) replicates the field to every rank of
/// the tile, so after distribution all ranks of a tile hold identical state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePartitioner {
    total_ranks: usize,
    ranks_per_tile: usize,
}

impl TilePartitioner {
    /// Partition `total_ranks` ranks over the six tiles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRankCount`] unless `total_ranks` is a positive
    /// multiple of 6.
    pub fn new(total_ranks: usize) -> Result<Self> {
        Ok(TilePartitioner {
            total_ranks,
            ranks_per_tile: ranks_per_tile(total_ranks)?,
        })
    }

    /// Partition matching the size of `comm`.
    pub fn for_comm<C: Communicator>(comm: &C) -> Result<Self> {
        Self::new(comm.size())
    }

    /// Ranks on each tile.
    pub fn ranks_per_tile(&self) -> usize {
        self.ranks_per_tile
    }
}

impl Partitioner for TilePartitioner {
    fn total_ranks(&self) -> usize {
        self.total_ranks
    }

    fn tile_index(&self, rank: usize) -> usize {
        rank / self.ranks_per_tile
    }

    fn tile_master_rank(&self, rank: usize) -> usize {
        self.tile_index(rank) * self.ranks_per_tile
    }

    fn scatter<C: Communicator>(
        &self,
        tile_comm: &C,
        quantity: Option<&Quantity>,
        metadata: &QuantityMetadata,
    ) -> Result<Quantity> {
        let mut bytes = if tile_comm.rank() == MASTER_RANK {
            quantity
                .ok_or(Error::MissingRootValue(MASTER_RANK))?
                .to_bytes()
        } else {
            Vec::with_capacity(metadata.nbytes())
        };
        tile_comm.broadcast_bytes(&mut bytes, MASTER_RANK)?;
        Quantity::from_bytes(metadata, &bytes)
    }
}
