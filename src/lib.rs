//! # fv3restart
//!
//! Load FV3 restart files and distribute them across cubed-sphere tile ranks.
//!
//! This crate provides:
//! - Reading of the per-tile restart files written by the Fortran model into a
//!   [`State`] of named [`Quantity`] fields with units
//! - Distribution of each tile's state from its master rank to every rank of
//!   the tile, over any [`Communicator`]
//! - A [`ModelInterface`](model::ModelInterface) and checks for testing field
//!   getters against the bundled property tables
//!
//! ## Quick Start
//!
//! ```no_run
//! use fv3restart::{open_restart, LocalFileSystem, LocalUniverse, RestartOptions, TilePartitioner};
//!
//! let states = LocalUniverse::run(6, |world| {
//!     let partitioner = TilePartitioner::for_comm(&world)?;
//!     open_restart("INPUT", &partitioner, &world, &LocalFileSystem, &RestartOptions::default())
//! });
//! for state in states {
//!     let state = state?;
//!     println!("{} fields at {:?}", state.len(), state.time());
//! }
//! # Ok::<(), fv3restart::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Dependencies |
//! |---------|-------------|--------------|
//! | `mpi`   | [`Communicator`] for rsmpi's `SimpleCommunicator` | `mpi`, a system MPI |
//! | `netcdf` | NetCDF reading in [`LocalFileSystem`] | `netcdf`, libnetcdf |
//!
//! Without features, ranks run as threads via [`LocalUniverse`] and datasets
//! come from a [`MemoryFileSystem`] or another [`FileSystem`] implementation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

mod comm;
mod config;
pub mod constants;
pub mod coupler;
mod dataset;
mod datatype;
mod distribute;
mod error;
mod filesystem;
mod local;
pub mod metadata;
pub mod model;
#[cfg(feature = "mpi")]
mod mpi_comm;
#[cfg(feature = "netcdf")]
mod netcdf_reader;
pub mod partitioner;
pub mod properties;
mod quantity;
pub mod restart;
mod state;

pub use comm::{bcast_metadata_list, broadcast_object, Communicator};
pub use config::{RestartOptions, LABEL_VAR, ONLY_NAMES_VAR};
pub use dataset::{DataArray, Dataset};
pub use datatype::DType;
pub use distribute::broadcast_state;
pub use error::{Error, Result};
pub use filesystem::{FileSystem, LocalFileSystem, MemoryFileSystem};
pub use local::{LocalComm, LocalUniverse};
pub use partitioner::{get_tile_index, Partitioner, TilePartitioner};
pub use quantity::{Quantity, QuantityMetadata};
pub use restart::open_restart;
pub use state::State;
