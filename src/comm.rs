//! The communicator interface the restart loader distributes over.
//!
//! Only four collectives are needed: split, byte broadcast, barrier and the
//! rank/size queries. Everything richer (broadcasting typed values or
//! metadata lists) is built on top of [`Communicator::broadcast_bytes`] in
//! this module.
//!
//! Implementations:
//! - [`LocalComm`](crate::local::LocalComm): ranks are threads in one process
//! - `mpi::topology::SimpleCommunicator`: real MPI via rsmpi (`mpi` feature)

use crate::constants::MASTER_RANK;
use crate::error::{Error, Result};
use crate::quantity::{Quantity, QuantityMetadata};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// An MPI-like communicator.
///
/// All methods except [`rank`](Self::rank) and [`size`](Self::size) are
/// collective: every rank of the communicator must call them in the same
/// order.
///
/// # Example
///
/// ```
/// use fv3restart::{Communicator, LocalUniverse};
///
/// let results = LocalUniverse::run(4, |world| {
///     let mut data = if world.rank() == 0 { b"hello".to_vec() } else { Vec::new() };
///     world.broadcast_bytes(&mut data, 0).unwrap();
///     data
/// });
/// assert!(results.iter().all(|d| d == b"hello"));
/// ```
pub trait Communicator: Sized {
    /// Rank of the calling process in this communicator.
    fn rank(&self) -> usize;

    /// Number of processes in this communicator.
    fn size(&self) -> usize;

    /// Partition the communicator into disjoint sub-communicators.
    ///
    /// Ranks passing the same `color` end up in the same sub-communicator,
    /// ordered by `key` (ties broken by rank in this communicator).
    fn split(&self, color: usize, key: usize) -> Result<Self>;

    /// Broadcast a byte buffer from `root` to all processes.
    ///
    /// On non-root ranks the buffer is resized to the root's length before
    /// being filled, so any initial contents are discarded.
    fn broadcast_bytes(&self, data: &mut Vec<u8>, root: usize) -> Result<()>;

    /// Barrier synchronization.
    ///
    /// No process returns until all processes have entered the barrier.
    fn barrier(&self) -> Result<()>;
}

/// Broadcast a serializable value from `root`.
///
/// The root passes `Some(value)`, every other rank passes `None`; all ranks
/// return the root's value.
///
/// # Errors
///
/// Returns [`Error::MissingRootValue`] on the root if it passed `None`. The
/// other ranks are then left waiting, as with any unmatched collective.
pub fn broadcast_object<C, T>(comm: &C, value: Option<&T>, root: usize) -> Result<T>
where
    C: Communicator,
    T: Serialize + DeserializeOwned,
{
    let mut buf = if comm.rank() == root {
        let value = value.ok_or(Error::MissingRootValue(root))?;
        bincode::serialize(value)?
    } else {
        Vec::new()
    };
    comm.broadcast_bytes(&mut buf, root)?;
    Ok(bincode::deserialize(&buf)?)
}

/// Broadcast a variable-length buffer with two fixed-size broadcasts.
///
/// `broadcast_len` moves the root's length to every rank, then the buffer is
/// resized and filled by `broadcast_data`. For backends whose broadcast needs
/// the receive size up front.
#[cfg_attr(not(feature = "mpi"), allow(dead_code))]
pub(crate) fn broadcast_length_prefixed(
    data: &mut Vec<u8>,
    broadcast_len: impl FnOnce(&mut u64),
    broadcast_data: impl FnOnce(&mut [u8]),
) -> Result<()> {
    let mut len = data.len() as u64;
    broadcast_len(&mut len);
    let len = usize::try_from(len)
        .map_err(|_| Error::Comm(format!("broadcast of {len} bytes exceeds address space")))?;
    data.resize(len, 0);
    broadcast_data(&mut data[..]);
    Ok(())
}

/// Broadcast the metadata of `quantities` from [`MASTER_RANK`].
///
/// The master passes the quantities whose metadata should be sent; other
/// ranks pass `None`.
pub fn bcast_metadata_list<C: Communicator>(
    comm: &C,
    quantities: Option<&[&Quantity]>,
) -> Result<Vec<QuantityMetadata>> {
    let metadata: Option<Vec<QuantityMetadata>> =
        quantities.map(|list| list.iter().map(|q| q.metadata()).collect());
    broadcast_object(comm, metadata.as_ref(), MASTER_RANK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalUniverse;
    use ndarray::{ArrayD, IxDyn};

    #[test]
    fn broadcast_object_reaches_every_rank() {
        let results = LocalUniverse::run(3, |world| {
            let names = vec!["air_temperature".to_string(), "x_wind".to_string()];
            let value = (world.rank() == 1).then_some(&names);
            broadcast_object(&world, value, 1).unwrap()
        });
        for names in results {
            assert_eq!(names, vec!["air_temperature", "x_wind"]);
        }
    }

    #[test]
    fn root_without_value_is_an_error() {
        let results = LocalUniverse::run(1, |world| broadcast_object::<_, u32>(&world, None, 0));
        assert!(matches!(results[0], Err(Error::MissingRootValue(0))));
    }

    #[test]
    fn length_prefix_resizes_receivers() {
        let root = b"fv_core".to_vec();

        let mut received = vec![9; 2];
        broadcast_length_prefixed(
            &mut received,
            |len| *len = root.len() as u64,
            |bytes| bytes.copy_from_slice(&root),
        )
        .unwrap();
        assert_eq!(received, root);

        let mut shrunk = vec![0; 32];
        broadcast_length_prefixed(&mut shrunk, |len| *len = 3, |bytes| bytes.fill(1)).unwrap();
        assert_eq!(shrunk, vec![1, 1, 1]);
    }

    #[test]
    fn length_prefix_keeps_root_buffer() {
        let mut data = b"coupler".to_vec();
        let mut seen_len = 0;
        broadcast_length_prefixed(
            &mut data,
            |len| seen_len = *len,
            |bytes| assert_eq!(bytes, b"coupler"),
        )
        .unwrap();
        assert_eq!(seen_len, 7);
        assert_eq!(data, b"coupler");
    }

    #[test]
    fn metadata_list_matches_master() {
        let results = LocalUniverse::run(2, |world| {
            let q = Quantity::new(ArrayD::zeros(IxDyn(&[3, 4])), ["y", "x"], "K").unwrap();
            let list = [&q];
            let input = (world.rank() == MASTER_RANK).then_some(&list[..]);
            bcast_metadata_list(&world, input).unwrap()
        });
        assert_eq!(results[0], results[1]);
        assert_eq!(results[1][0].shape, vec![3, 4]);
        assert_eq!(results[1][0].units, "K");
    }
}
