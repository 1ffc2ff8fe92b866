//! In-process communicator whose ranks are threads.
//!
//! Every ordered pair of ranks is joined by its own FIFO channel, so messages
//! between two ranks arrive in the order they were sent and collectives match
//! up the same way they do under MPI. Sends never block; a receive fails with
//! [`Error::Disconnected`] once the peer's communicator has been dropped,
//! which is what happens when a rank's thread returns early with an error.
//!
//! # Example
//!
//! ```
//! use fv3restart::{Communicator, LocalUniverse};
//!
//! let sizes = LocalUniverse::run(6, |world| {
//!     let half = world.split(world.rank() % 2, world.rank()).unwrap();
//!     half.size()
//! });
//! assert_eq!(sizes, vec![3; 6]);
//! ```

use crate::comm::Communicator;
use crate::error::{Error, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::fmt;

enum Packet {
    Bytes(Vec<u8>),
    Split { color: usize, key: usize },
    Group(Box<Endpoints>),
}

struct Endpoints {
    rank: usize,
    /// `senders[j]` carries messages from this rank to rank `j`
    senders: Vec<Sender<Packet>>,
    /// `receivers[i]` carries messages from rank `i` to this rank
    receivers: Vec<Receiver<Packet>>,
}

fn mesh(size: usize) -> Vec<Endpoints> {
    let mut senders: Vec<Vec<Sender<Packet>>> =
        (0..size).map(|_| Vec::with_capacity(size)).collect();
    let mut receivers: Vec<Vec<Option<Receiver<Packet>>>> =
        (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
    for (src, row) in senders.iter_mut().enumerate() {
        for dst_receivers in receivers.iter_mut() {
            let (tx, rx) = unbounded();
            row.push(tx);
            dst_receivers[src] = Some(rx);
        }
    }
    senders
        .into_iter()
        .zip(receivers)
        .enumerate()
        .map(|(rank, (senders, receivers))| Endpoints {
            rank,
            senders,
            receivers: receivers.into_iter().flatten().collect(),
        })
        .collect()
}

/// Entry point for creating thread-backed communicators.
pub struct LocalUniverse;

impl LocalUniverse {
    /// Create the world communicators for `size` ranks, one per rank.
    pub fn world(size: usize) -> Vec<LocalComm> {
        mesh(size).into_iter().map(LocalComm::from_endpoints).collect()
    }

    /// Run `f` on `size` threads, each with its own world communicator.
    ///
    /// Returns the per-rank results in rank order. A panic on any rank is
    /// propagated once all threads have finished.
    pub fn run<F, R>(size: usize, f: F) -> Vec<R>
    where
        F: Fn(LocalComm) -> R + Sync,
        R: Send,
    {
        let f = &f;
        std::thread::scope(|scope| {
            let handles: Vec<_> = Self::world(size)
                .into_iter()
                .map(|comm| scope.spawn(move || f(comm)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
    }
}

/// A thread-backed communicator.
///
/// Not `Clone`: dropping a communicator is what signals its peers that the
/// rank has gone away.
pub struct LocalComm {
    rank: usize,
    senders: Vec<Sender<Packet>>,
    receivers: Vec<Receiver<Packet>>,
}

impl fmt::Debug for LocalComm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalComm")
            .field("rank", &self.rank)
            .field("size", &self.senders.len())
            .finish()
    }
}

impl LocalComm {
    fn from_endpoints(endpoints: Endpoints) -> Self {
        LocalComm {
            rank: endpoints.rank,
            senders: endpoints.senders,
            receivers: endpoints.receivers,
        }
    }

    fn send(&self, dest: usize, packet: Packet) -> Result<()> {
        self.senders[dest]
            .send(packet)
            .map_err(|_| Error::Disconnected(dest))
    }

    fn recv(&self, source: usize) -> Result<Packet> {
        self.receivers[source]
            .recv()
            .map_err(|_| Error::Disconnected(source))
    }

    fn check_rank(&self, rank: usize) -> Result<()> {
        if rank >= self.size() {
            return Err(Error::InvalidRank {
                rank,
                size: self.size(),
            });
        }
        Ok(())
    }

    fn peers(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.size()).filter(move |&r| r != self.rank)
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.senders.len()
    }

    fn split(&self, color: usize, key: usize) -> Result<Self> {
        for peer in self.peers() {
            self.send(peer, Packet::Split { color, key })?;
        }
        let mut entries = Vec::with_capacity(self.size());
        for source in 0..self.size() {
            if source == self.rank {
                entries.push((color, key, source));
                continue;
            }
            match self.recv(source)? {
                Packet::Split { color, key } => entries.push((color, key, source)),
                _ => return Err(Error::Comm(format!("rank {source} is not in split"))),
            }
        }

        let mut members: Vec<(usize, usize)> = entries
            .into_iter()
            .filter(|&(c, _, _)| c == color)
            .map(|(_, k, r)| (k, r))
            .collect();
        members.sort_unstable();
        let leader = members[0].1;

        if leader == self.rank {
            let mut own = None;
            for ((_, member), endpoints) in members.iter().zip(mesh(members.len())) {
                if *member == self.rank {
                    own = Some(endpoints);
                } else {
                    self.send(*member, Packet::Group(Box::new(endpoints)))?;
                }
            }
            own.map(LocalComm::from_endpoints)
                .ok_or_else(|| Error::Comm("split leader missing from its group".into()))
        } else {
            match self.recv(leader)? {
                Packet::Group(endpoints) => Ok(LocalComm::from_endpoints(*endpoints)),
                _ => Err(Error::Comm(format!("expected group from rank {leader}"))),
            }
        }
    }

    fn broadcast_bytes(&self, data: &mut Vec<u8>, root: usize) -> Result<()> {
        self.check_rank(root)?;
        if self.rank == root {
            for peer in self.peers() {
                self.send(peer, Packet::Bytes(data.clone()))?;
            }
            return Ok(());
        }
        match self.recv(root)? {
            Packet::Bytes(bytes) => {
                *data = bytes;
                Ok(())
            }
            _ => Err(Error::Comm(format!("expected broadcast from rank {root}"))),
        }
    }

    fn barrier(&self) -> Result<()> {
        for peer in self.peers() {
            self.send(peer, Packet::Bytes(Vec::new()))?;
        }
        for peer in self.peers() {
            match self.recv(peer)? {
                Packet::Bytes(_) => {}
                _ => return Err(Error::Comm(format!("rank {peer} is not in barrier"))),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_ranks_and_sizes() {
        let seen = LocalUniverse::run(4, |world| (world.rank(), world.size()));
        assert_eq!(seen, vec![(0, 4), (1, 4), (2, 4), (3, 4)]);
    }

    #[test]
    fn broadcast_from_nonzero_root() {
        let results = LocalUniverse::run(4, |world| {
            let mut data = if world.rank() == 2 {
                vec![1, 2, 3]
            } else {
                vec![9; 10]
            };
            world.broadcast_bytes(&mut data, 2).unwrap();
            data
        });
        assert!(results.iter().all(|d| d == &[1, 2, 3]));
    }

    #[test]
    fn broadcast_to_invalid_root_fails() {
        let results = LocalUniverse::run(2, |world| world.broadcast_bytes(&mut Vec::new(), 5));
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(Error::InvalidRank { rank: 5, size: 2 }))));
    }

    #[test]
    fn split_orders_by_key() {
        // Reverse the order within each color by using a descending key
        let results = LocalUniverse::run(6, |world| {
            let color = world.rank() / 3;
            let sub = world.split(color, 100 - world.rank()).unwrap();
            (sub.rank(), sub.size())
        });
        assert_eq!(
            results,
            vec![(2, 3), (1, 3), (0, 3), (2, 3), (1, 3), (0, 3)]
        );
    }

    #[test]
    fn sub_communicators_are_independent() {
        let results = LocalUniverse::run(6, |world| {
            let sub = world.split(world.rank() % 2, world.rank()).unwrap();
            let mut data = if sub.rank() == 0 {
                vec![world.rank() as u8]
            } else {
                Vec::new()
            };
            sub.broadcast_bytes(&mut data, 0).unwrap();
            world.barrier().unwrap();
            data[0]
        });
        assert_eq!(results, vec![0, 1, 0, 1, 0, 1]);
    }

    #[test]
    fn repeated_collectives_stay_matched() {
        let results = LocalUniverse::run(3, |world| {
            let mut got = Vec::new();
            for round in 0..5u8 {
                let root = (round as usize) % 3;
                let mut data = if world.rank() == root { vec![round] } else { Vec::new() };
                world.broadcast_bytes(&mut data, root).unwrap();
                got.push(data[0]);
            }
            got
        });
        assert!(results.iter().all(|g| g == &[0, 1, 2, 3, 4]));
    }

    #[test]
    fn exited_peer_is_reported() {
        let results = LocalUniverse::run(2, |world| {
            if world.rank() == 0 {
                return Ok(Vec::new());
            }
            let mut data = Vec::new();
            world.broadcast_bytes(&mut data, 0).map(|_| data)
        });
        assert!(matches!(results[1], Err(Error::Disconnected(0))));
    }

    #[test]
    fn single_rank_collectives_are_trivial() {
        let results = LocalUniverse::run(1, |world| {
            world.barrier().unwrap();
            let sub = world.split(7, 0).unwrap();
            let mut data = vec![42];
            sub.broadcast_bytes(&mut data, 0).unwrap();
            (sub.size(), data)
        });
        assert_eq!(results, vec![(1, vec![42])]);
    }
}
