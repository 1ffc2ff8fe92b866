//! [`Communicator`] for rsmpi communicators.
//!
//! Run programs using this backend under `mpiexec`, e.g.
//! `mpiexec -n 6 ./target/debug/examples/open_restart <dir>`.

use crate::comm::{broadcast_length_prefixed, Communicator};
use crate::error::{Error, Result};
use mpi::topology::{Color, SimpleCommunicator};
use mpi::traits::{Communicator as MpiCommunicator, CommunicatorCollectives, Root};

fn to_rank(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::Comm(format!("{value} does not fit an MPI rank")))
}

impl Communicator for SimpleCommunicator {
    fn rank(&self) -> usize {
        MpiCommunicator::rank(self) as usize
    }

    fn size(&self) -> usize {
        MpiCommunicator::size(self) as usize
    }

    fn split(&self, color: usize, key: usize) -> Result<Self> {
        let color = Color::with_value(to_rank(color)?);
        self.split_by_color_with_key(color, to_rank(key)?)
            .ok_or_else(|| Error::Comm("split returned no communicator".into()))
    }

    fn broadcast_bytes(&self, data: &mut Vec<u8>, root: usize) -> Result<()> {
        let size = Communicator::size(self);
        if root >= size {
            return Err(Error::InvalidRank { rank: root, size });
        }
        let root_process = self.process_at_rank(to_rank(root)?);
        broadcast_length_prefixed(
            data,
            |len| root_process.broadcast_into(len),
            |bytes| root_process.broadcast_into(bytes),
        )
    }

    fn barrier(&self) -> Result<()> {
        CommunicatorCollectives::barrier(self);
        Ok(())
    }
}
